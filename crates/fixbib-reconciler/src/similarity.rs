//! Title similarity and the acceptance threshold

use std::sync::Arc;

/// Minimum title similarity for accepting a registry record
///
/// The same threshold applies to the primary search result and to the DOI
/// fallback record.
pub const SIMILARITY_THRESHOLD: f64 = 0.75;

/// A string similarity measure over raw titles, in `[0, 1]`
pub trait SimilarityMeasure: Send + Sync {
    /// Similarity of two titles; 1.0 means identical
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Normalized Levenshtein similarity over [`normalize_title`] output
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl SimilarityMeasure for NormalizedLevenshtein {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        title_similarity(a, b)
    }
}

/// Decides whether a registry title describes the same work
///
/// # Examples
///
/// ```
/// use fixbib_reconciler::SimilarityJudge;
///
/// let judge = SimilarityJudge::default();
/// let score = judge.score("The {DNA} double helix", "The DNA double helix");
/// assert_eq!(score, 1.0);
/// assert!(judge.accept(score));
/// ```
#[derive(Clone)]
pub struct SimilarityJudge {
    threshold: f64,
    measure: Arc<dyn SimilarityMeasure>,
}

impl SimilarityJudge {
    /// Create a judge using normalized Levenshtein similarity
    pub fn new(threshold: f64) -> Self {
        Self::with_measure(threshold, Arc::new(NormalizedLevenshtein))
    }

    /// Create a judge with a custom similarity measure
    pub fn with_measure(threshold: f64, measure: Arc<dyn SimilarityMeasure>) -> Self {
        Self { threshold, measure }
    }

    /// Acceptance threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Similarity of two titles, clamped to `[0, 1]`
    pub fn score(&self, a: &str, b: &str) -> f64 {
        self.measure.similarity(a, b).clamp(0.0, 1.0)
    }

    /// Whether a score is high enough to accept the record
    pub fn accept(&self, score: f64) -> bool {
        score >= self.threshold
    }
}

impl Default for SimilarityJudge {
    fn default() -> Self {
        Self::new(SIMILARITY_THRESHOLD)
    }
}

impl std::fmt::Debug for SimilarityJudge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityJudge")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

/// Normalized Levenshtein similarity of two titles after [`normalize_title`]
pub fn title_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_title(a), &normalize_title(b))
}

/// Canonical form of a title for comparison
///
/// Lowercases, drops TeX commands (`\emph`), grouping braces, math
/// delimiters and markup tags (`<i>`), maps `~` to a space and collapses
/// runs of whitespace.
pub fn normalize_title(title: &str) -> String {
    let mut cleaned = String::with_capacity(title.len());
    let mut chars = title.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                // Control word (\emph) or control symbol (\')
                if chars.peek().is_some_and(|n| n.is_ascii_alphabetic()) {
                    while chars.peek().is_some_and(|n| n.is_ascii_alphabetic()) {
                        chars.next();
                    }
                } else {
                    chars.next();
                }
            }
            '<' => {
                let rest: String = chars.clone().take_while(|&n| n != '>').collect();
                let is_tag = rest
                    .trim_start_matches('/')
                    .chars()
                    .next()
                    .is_some_and(|n| n.is_ascii_alphabetic())
                    && chars.clone().nth(rest.chars().count()) == Some('>');
                if is_tag {
                    for _ in 0..=rest.chars().count() {
                        chars.next();
                    }
                    cleaned.push(' ');
                } else {
                    cleaned.push(c);
                }
            }
            '{' | '}' | '$' => {}
            '~' => cleaned.push(' '),
            _ => cleaned.extend(c.to_lowercase()),
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_case_and_whitespace() {
        assert_eq!(normalize_title("  The  Origin\nof Species "), "the origin of species");
    }

    #[test]
    fn test_normalize_tex_markup() {
        assert_eq!(normalize_title("The {DNA} of \\emph{E.~coli}"), "the dna of e. coli");
        assert_eq!(normalize_title("Caf\\'{e} culture"), "cafe culture");
        assert_eq!(normalize_title("$\\alpha$-helix"), "-helix");
    }

    #[test]
    fn test_normalize_markup_tags() {
        assert_eq!(normalize_title("Studies of <i>Drosophila</i>"), "studies of drosophila");
        assert_eq!(normalize_title("a < b and c > d"), "a < b and c > d");
    }

    #[test]
    fn test_identical_titles_score_one() {
        let judge = SimilarityJudge::default();
        assert_eq!(judge.score("A title", "a  TITLE"), 1.0);
    }

    #[test]
    fn test_unrelated_titles_rejected() {
        let judge = SimilarityJudge::default();
        let score = judge.score(
            "Molecular structure of nucleic acids",
            "A survey of reinforcement learning in robotics",
        );
        assert!(score < 0.5);
        assert!(!judge.accept(score));
    }

    #[test]
    fn test_minor_typo_accepted() {
        let judge = SimilarityJudge::default();
        let score = judge.score(
            "Molecular structure of nucleic acids",
            "Molecular structure of nucleic acid",
        );
        assert!(judge.accept(score));
    }

    #[test]
    fn test_threshold_boundary() {
        let judge = SimilarityJudge::new(0.75);
        assert!(judge.accept(0.75));
        assert!(!judge.accept(0.749));
        assert_eq!(judge.threshold(), 0.75);
    }

    struct Constant(f64);

    impl SimilarityMeasure for Constant {
        fn similarity(&self, _a: &str, _b: &str) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_custom_measure_is_clamped() {
        let judge = SimilarityJudge::with_measure(0.75, Arc::new(Constant(1.7)));
        assert_eq!(judge.score("a", "b"), 1.0);
        let judge = SimilarityJudge::with_measure(0.75, Arc::new(Constant(-0.2)));
        assert_eq!(judge.score("a", "b"), 0.0);
    }

    proptest! {
        #[test]
        fn prop_score_is_symmetric(a in ".{0,40}", b in ".{0,40}") {
            let judge = SimilarityJudge::default();
            prop_assert_eq!(judge.score(&a, &b), judge.score(&b, &a));
        }

        #[test]
        fn prop_score_is_reflexive(a in ".{0,60}") {
            let judge = SimilarityJudge::default();
            prop_assert_eq!(judge.score(&a, &a), 1.0);
        }

        #[test]
        fn prop_score_in_unit_interval(a in ".{0,40}", b in ".{0,40}") {
            let score = SimilarityJudge::default().score(&a, &b);
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn prop_accept_is_monotonic(s1 in 0.0f64..=1.0, delta in 0.0f64..=1.0) {
            let judge = SimilarityJudge::default();
            let s2 = s1 + delta;
            if judge.accept(s1) {
                prop_assert!(judge.accept(s2));
            }
        }
    }
}
