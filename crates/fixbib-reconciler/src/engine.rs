//! Reconciliation engine - per-entry query, judge, fallback and merge
//!
//! Each eligible entry goes through a small state machine:
//!
//! ```text
//! Pending -> PrimaryQueried -> Accepted(primary)
//!                           -> NeedsFallback -> Accepted(fallback)
//!                                            -> Rejected
//!                           -> Rejected
//! ```
//!
//! All registry calls for an entry complete before its fields are touched,
//! so a timed out or failed entry is left exactly as parsed.

use crate::bibliography::ReferenceEntry;
use crate::config::ReconcileConfig;
use crate::filter::is_eligible;
use crate::merge::merge_candidate;
use crate::similarity::SimilarityJudge;
use fixbib_domain::{CandidateRecord, MatchDecision, MetadataQuery, Registry, RejectReason};
use futures::stream::{self, StreamExt};

/// Result of reconciling one entry
#[derive(Debug, Clone, PartialEq)]
pub struct EntryOutcome {
    /// Position of the entry in the input file
    pub index: usize,

    /// Citation key
    pub key: String,

    /// Terminal decision
    pub decision: MatchDecision,

    /// Similarity score of the record that decided the outcome, if any
    pub score: Option<f64>,

    /// Fields rewritten by the merge
    pub changed_fields: Vec<String>,
}

impl EntryOutcome {
    /// Whether the entry was corrected
    pub fn is_corrected(&self) -> bool {
        self.decision.is_accepted()
    }
}

struct Resolution {
    decision: MatchDecision,
    score: Option<f64>,
    record: Option<CandidateRecord>,
}

impl Resolution {
    fn rejected(reason: RejectReason, score: Option<f64>) -> Self {
        Self {
            decision: MatchDecision::Rejected(reason),
            score,
            record: None,
        }
    }

    fn accepted(decision: MatchDecision, score: f64, record: CandidateRecord) -> Self {
        Self {
            decision,
            score: Some(score),
            record: Some(record),
        }
    }
}

/// Reconciles bibliography entries against a metadata registry
///
/// # Examples
///
/// ```
/// use fixbib_reconciler::{parse_bibliography, ReconcileConfig, Reconciler};
/// use fixbib_domain::CandidateRecord;
/// use fixbib_registry::MockRegistry;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let registry = MockRegistry::new();
/// registry.add_search_results(
///     "Deep learning",
///     vec![CandidateRecord::titled("Deep learning").with_doi("10.1038/nature14539")],
/// );
///
/// let mut entries = parse_bibliography("@article{lecun2015, title = {Deep learning}}").unwrap();
/// let reconciler = Reconciler::new(registry, ReconcileConfig::default());
/// let outcomes = reconciler.reconcile_all(&mut entries, |_| {}).await;
///
/// assert!(outcomes[0].is_corrected());
/// assert_eq!(entries[0].doi().as_deref(), Some("10.1038/nature14539"));
/// # }
/// ```
pub struct Reconciler<R: Registry> {
    registry: R,
    judge: SimilarityJudge,
    config: ReconcileConfig,
}

impl<R: Registry> Reconciler<R> {
    /// Create a reconciler using the configured similarity threshold
    pub fn new(registry: R, config: ReconcileConfig) -> Self {
        let judge = SimilarityJudge::new(config.similarity_threshold);
        Self {
            registry,
            judge,
            config,
        }
    }

    /// Replace the similarity judge
    pub fn with_judge(mut self, judge: SimilarityJudge) -> Self {
        self.judge = judge;
        self
    }

    /// Reconcile every eligible entry, concurrently
    ///
    /// Non-eligible entries are not visited. `on_outcome` is called as each
    /// entry finishes, in completion order; the returned outcomes are in
    /// file order.
    pub async fn reconcile_all<F>(
        &self,
        entries: &mut [ReferenceEntry],
        mut on_outcome: F,
    ) -> Vec<EntryOutcome>
    where
        F: FnMut(&EntryOutcome),
    {
        let eligible = entries
            .iter_mut()
            .enumerate()
            .filter(|(_, entry)| is_eligible(entry));

        let mut outcomes: Vec<EntryOutcome> = stream::iter(eligible)
            .map(|(index, entry)| self.reconcile_entry(index, entry))
            .buffer_unordered(self.config.concurrency.max(1))
            .inspect(|outcome| on_outcome(outcome))
            .collect()
            .await;

        outcomes.sort_by_key(|outcome| outcome.index);
        outcomes
    }

    /// Reconcile a single entry
    ///
    /// The entry is mutated only when a record is accepted. Eligibility is
    /// the caller's concern.
    pub async fn reconcile_entry(&self, index: usize, entry: &mut ReferenceEntry) -> EntryOutcome {
        let resolution = match tokio::time::timeout(self.config.entry_timeout(), self.resolve(entry)).await {
            Ok(resolution) => resolution,
            Err(_) => {
                tracing::warn!(key = entry.key(), "Reconciliation timed out after {:?}", self.config.entry_timeout());
                Resolution::rejected(RejectReason::TimedOut, None)
            }
        };

        let changed_fields = match &resolution.record {
            Some(record) => merge_candidate(entry, record),
            None => Vec::new(),
        };

        tracing::debug!(
            key = entry.key(),
            decision = ?resolution.decision,
            changed = changed_fields.len(),
            "Entry reconciled"
        );

        EntryOutcome {
            index,
            key: entry.key().to_string(),
            decision: resolution.decision,
            score: resolution.score,
            changed_fields,
        }
    }

    async fn resolve(&self, entry: &ReferenceEntry) -> Resolution {
        let Some(title) = entry.title() else {
            return Resolution::rejected(RejectReason::MissingTitle, None);
        };

        let query = MetadataQuery::new(title.clone())
            .with_authors(entry.surnames())
            .with_issn(entry.field("issn"))
            .with_year(entry.year());

        tracing::debug!(key = entry.key(), title = %query.title, "Searching registry");

        let candidates = match self.registry.search_by_metadata(&query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(key = entry.key(), "Registry search failed: {}", e);
                return Resolution::rejected(RejectReason::RegistryUnavailable(e.to_string()), None);
            }
        };

        let mut primary_score = None;
        let mut candidate_doi = None;

        if let Some(candidate) = candidates.into_iter().next() {
            let score = self.judge.score(&title, candidate.title_or_empty());
            tracing::debug!(key = entry.key(), score, "Top candidate scored");

            if self.judge.accept(score) {
                return Resolution::accepted(MatchDecision::AcceptedPrimary, score, candidate);
            }
            primary_score = Some(score);
            candidate_doi = candidate.doi;
        }

        // The unaccepted candidate is dropped here; only its DOI survives
        let Some(doi) = entry.doi().or(candidate_doi) else {
            return Resolution::rejected(RejectReason::NoMatch, primary_score);
        };

        tracing::debug!(key = entry.key(), doi = %doi, "Falling back to DOI lookup");

        match self.registry.lookup_by_identifier(&doi).await {
            Ok(Some(record)) => {
                let score = self.judge.score(&title, record.title_or_empty());
                if self.judge.accept(score) {
                    Resolution::accepted(MatchDecision::AcceptedFallback, score, record)
                } else {
                    Resolution::rejected(RejectReason::NoMatch, Some(score))
                }
            }
            Ok(None) => Resolution::rejected(RejectReason::NoMatch, primary_score),
            Err(e) => {
                tracing::warn!(key = entry.key(), doi = %doi, "DOI lookup failed: {}", e);
                Resolution::rejected(RejectReason::RegistryUnavailable(e.to_string()), primary_score)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibliography::parse_bibliography;
    use fixbib_registry::MockRegistry;

    fn article(src: &str) -> ReferenceEntry {
        parse_bibliography(src).unwrap().remove(0)
    }

    #[tokio::test]
    async fn test_missing_title_skips_registry() {
        let registry = MockRegistry::new();
        let reconciler = Reconciler::new(registry.clone(), ReconcileConfig::default());
        let mut entry = article("@article{untitled, journal = {Nature}}");

        let outcome = reconciler.reconcile_entry(0, &mut entry).await;

        assert_eq!(outcome.decision, MatchDecision::Rejected(RejectReason::MissingTitle));
        assert_eq!(registry.search_calls(), 0);
    }

    #[tokio::test]
    async fn test_query_carries_surnames_and_filters() {
        let registry = MockRegistry::new();
        let reconciler = Reconciler::new(registry.clone(), ReconcileConfig::default());
        let mut entry = article(
            "@article{k, author = {Watson, J. and Crick, F.}, title = {Nucleic acids}, \
             issn = {0028-0836}, year = {1953}}",
        );

        reconciler.reconcile_entry(0, &mut entry).await;

        let queries = registry.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].title, "Nucleic acids");
        assert_eq!(queries[0].authors, vec!["Watson".to_string(), "Crick".to_string()]);
        assert_eq!(queries[0].issn.as_deref(), Some("0028-0836"));
        assert_eq!(queries[0].year.as_deref(), Some("1953"));
    }

    #[tokio::test]
    async fn test_entry_doi_preferred_for_fallback() {
        let registry = MockRegistry::new();
        registry.add_search_results(
            "Nucleic acids",
            vec![CandidateRecord::titled("Something else entirely").with_doi("10.9999/wrong")],
        );
        let reconciler = Reconciler::new(registry.clone(), ReconcileConfig::default());
        let mut entry = article("@article{k, title = {Nucleic acids}, doi = {10.1038/171737a0}}");

        reconciler.reconcile_entry(0, &mut entry).await;

        assert_eq!(registry.lookups(), vec!["10.1038/171737a0".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_doi_is_no_match() {
        let registry = MockRegistry::new();
        let reconciler = Reconciler::new(registry.clone(), ReconcileConfig::default());
        let mut entry = article("@article{k, title = {Nucleic acids}, doi = {10.1/unknown}}");

        let outcome = reconciler.reconcile_entry(3, &mut entry).await;

        assert_eq!(outcome.index, 3);
        assert_eq!(outcome.decision, MatchDecision::Rejected(RejectReason::NoMatch));
        assert!(outcome.changed_fields.is_empty());
        assert_eq!(registry.lookup_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_registry_unavailable() {
        let registry = MockRegistry::new();
        registry.fail_lookup("10.1/down");
        let reconciler = Reconciler::new(registry, ReconcileConfig::default());
        let mut entry = article("@article{k, title = {Nucleic acids}, doi = {10.1/down}}");

        let outcome = reconciler.reconcile_entry(0, &mut entry).await;

        assert!(matches!(
            outcome.decision,
            MatchDecision::Rejected(RejectReason::RegistryUnavailable(_))
        ));
    }
}
