//! Configuration for reconciliation runs

use crate::similarity::SIMILARITY_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Crossref API endpoint
pub const DEFAULT_REGISTRY_URL: &str = "https://api.crossref.org";

/// Configuration for the Reconciler
///
/// # Examples
///
/// ```
/// use fixbib_reconciler::{ReconcileConfig, SIMILARITY_THRESHOLD};
///
/// let config = ReconcileConfig::default();
/// assert_eq!(config.similarity_threshold, SIMILARITY_THRESHOLD);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Minimum title similarity for accepting a registry record
    /// Governs both the primary search and the DOI fallback
    /// Default: 0.75
    pub similarity_threshold: f64,

    /// Maximum number of entries reconciled concurrently
    /// Default: 8
    pub concurrency: usize,

    /// Number of search results requested from the registry
    /// Only the first one is judged
    /// Default: 5
    pub search_rows: usize,

    /// Timeout for a single registry request (seconds)
    /// Default: 20
    pub request_timeout_secs: u64,

    /// Time budget for reconciling one entry, fallback included (seconds)
    /// Default: 60
    pub entry_timeout_secs: u64,

    /// Registry base URL
    pub registry_url: String,

    /// Contact address sent to the registry's polite pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailto: Option<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: SIMILARITY_THRESHOLD,
            concurrency: 8,
            search_rows: 5,
            request_timeout_secs: 20,
            entry_timeout_secs: 60,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            mailto: None,
        }
    }
}

impl ReconcileConfig {
    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the per-entry timeout as a Duration
    pub fn entry_timeout(&self) -> Duration {
        Duration::from_secs(self.entry_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err("similarity_threshold must be within [0, 1]".to_string());
        }
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }
        if self.search_rows == 0 {
            return Err("search_rows must be greater than 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if self.entry_timeout_secs < self.request_timeout_secs {
            return Err("entry_timeout_secs cannot be shorter than request_timeout_secs".to_string());
        }
        if self.registry_url.trim().is_empty() {
            return Err("registry_url must not be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ReconcileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.similarity_threshold, 0.75);
        assert!(config.mailto.is_none());
    }

    #[test]
    fn test_invalid_threshold() {
        let config = ReconcileConfig {
            similarity_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_concurrency() {
        let config = ReconcileConfig {
            concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_entry_timeout_shorter_than_request() {
        let config = ReconcileConfig {
            request_timeout_secs: 30,
            entry_timeout_secs: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_conversions() {
        let config = ReconcileConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(20));
        assert_eq!(config.entry_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ReconcileConfig::from_toml("concurrency = 2\nmailto = \"me@example.org\"").unwrap();
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.mailto.as_deref(), Some("me@example.org"));
        assert_eq!(config.similarity_threshold, SIMILARITY_THRESHOLD);
        assert_eq!(config.registry_url, DEFAULT_REGISTRY_URL);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ReconcileConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ReconcileConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.similarity_threshold, parsed.similarity_threshold);
        assert_eq!(config.concurrency, parsed.concurrency);
        assert_eq!(config.entry_timeout_secs, parsed.entry_timeout_secs);
    }
}
