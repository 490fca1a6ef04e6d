//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use fixbib_reconciler::ReconcileConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
///
/// ```toml
/// [settings]
/// color = true
///
/// [reconcile]
/// concurrency = 8
/// mailto = "me@example.org"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Reconciliation tuning
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Config {
    /// Get the configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".fixbib").join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        match Self::path() {
            Ok(path) => Self::load_from(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Load configuration from a file, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Apply a contact e-mail given on the command line or in the environment.
    pub fn with_mailto(mut self, mailto: Option<String>) -> Self {
        if let Some(mailto) = mailto.filter(|m| !m.trim().is_empty()) {
            self.reconcile.mailto = Some(mailto);
        }
        self
    }

    /// Check the reconciliation settings.
    pub fn validate(&self) -> Result<()> {
        self.reconcile.validate().map_err(CliError::Config)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self { color: true }
    }
}

fn default_true() -> bool {
    true
}
