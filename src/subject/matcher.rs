//! Decides whether two free-text subject names denote the same subject.

use std::collections::BTreeSet;

use serde::Serialize;

use super::catalog::SubjectCatalog;

/// Tokens this short carry no signal for word overlap ("ms", "of", "it").
const MIN_OVERLAP_TOKEN_CHARS: usize = 3;

/// The decisive signal behind a match decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSignal {
    /// One side is blank after normalization.
    Blank,
    /// Names are identical after normalization.
    Equal,
    /// Names fall into different categories.
    CategoryConflict {
        /// Category of the left name.
        left: String,
        /// Category of the right name.
        right: String,
    },
    /// One normalized name contains the other.
    Containment,
    /// Enough significant words are shared.
    WordOverlap {
        /// Number of shared significant tokens.
        shared: usize,
    },
    /// No rule matched.
    NoMatch,
}

impl MatchSignal {
    /// Returns true when the signal counts as a match.
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(
            self,
            Self::Equal | Self::Containment | Self::WordOverlap { .. }
        )
    }
}

/// Nearest available subject name for a target, used in diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosestSubject {
    /// The candidate name as stored.
    pub name: String,
    /// Normalized Levenshtein similarity in `0.0..=1.0`.
    pub similarity: f64,
}

/// Subject name matcher driven by a [`SubjectCatalog`].
#[derive(Debug, Clone, Default)]
pub struct SubjectMatcher {
    catalog: SubjectCatalog,
}

impl SubjectMatcher {
    /// Creates a matcher over the given catalog.
    #[must_use]
    pub fn new(catalog: SubjectCatalog) -> Self {
        Self { catalog }
    }

    /// Returns the catalog in use.
    #[must_use]
    pub fn catalog(&self) -> &SubjectCatalog {
        &self.catalog
    }

    /// Lower-cases, turns punctuation into spaces, collapses whitespace and applies synonyms.
    #[must_use]
    pub fn normalize(&self, name: &str) -> String {
        let spaced: String = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();

        spaced
            .split_whitespace()
            .map(|token| self.catalog.synonym(token).unwrap_or(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns the first category whose alias occurs in an already-normalized name.
    #[must_use]
    pub fn classify(&self, normalized: &str) -> Option<&str> {
        self.catalog
            .categories
            .iter()
            .find(|category| {
                category
                    .aliases
                    .iter()
                    .any(|alias| normalized.contains(alias.as_str()))
            })
            .map(|category| category.name.as_str())
    }

    /// Returns true when `a` and `b` denote the same subject.
    ///
    /// Symmetric, and reflexive for any name that is not blank after normalization.
    #[must_use]
    pub fn matches(&self, a: &str, b: &str) -> bool {
        self.explain(a, b).is_match()
    }

    /// Runs the matching rules in order and returns the first decisive signal.
    #[must_use]
    pub fn explain(&self, a: &str, b: &str) -> MatchSignal {
        let left = self.normalize(a);
        let right = self.normalize(b);

        if left.is_empty() || right.is_empty() {
            return MatchSignal::Blank;
        }
        if left == right {
            return MatchSignal::Equal;
        }

        // The conflict guard must run before containment and overlap.
        if let (Some(left_category), Some(right_category)) =
            (self.classify(&left), self.classify(&right))
            && left_category != right_category
        {
            return MatchSignal::CategoryConflict {
                left: left_category.to_string(),
                right: right_category.to_string(),
            };
        }

        if left.contains(&right) || right.contains(&left) {
            return MatchSignal::Containment;
        }

        let left_tokens = significant_tokens(&left);
        let right_tokens = significant_tokens(&right);
        let shared = left_tokens.intersection(&right_tokens).count();
        if shared > 0 && (shared * 2 >= left_tokens.len() || shared * 2 >= right_tokens.len()) {
            return MatchSignal::WordOverlap { shared };
        }

        MatchSignal::NoMatch
    }

    /// Finds the candidate most similar to `target` by normalized Levenshtein distance.
    ///
    /// Ties go to the lexicographically smallest candidate.
    pub fn closest<'a, I>(&self, target: &str, candidates: I) -> Option<ClosestSubject>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let target = self.normalize(target);
        if target.is_empty() {
            return None;
        }

        candidates
            .into_iter()
            .map(|candidate| ClosestSubject {
                name: candidate.to_string(),
                similarity: strsim::normalized_levenshtein(&target, &self.normalize(candidate)),
            })
            .min_by(|left, right| {
                right
                    .similarity
                    .total_cmp(&left.similarity)
                    .then_with(|| left.name.cmp(&right.name))
            })
    }
}

fn significant_tokens(normalized: &str) -> BTreeSet<&str> {
    normalized
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_OVERLAP_TOKEN_CHARS)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::subject::catalog::SubjectCategory;

    fn matcher() -> SubjectMatcher {
        SubjectMatcher::default()
    }

    const SAMPLE_NAMES: &[&str] = &[
        "MS Excel",
        "MS Word",
        "MS PowerPoint Essentials",
        "PowerPoint",
        "Computer Fundamental",
        "Computer Fundamentals",
        "computer  fundamentle",
        "Computer Networks",
        "Computer Basics",
        "Internet & Email",
        "Windows 10",
        "Mathematics",
        "Maths",
        "Tally ERP",
        "x",
    ];

    #[test]
    fn test_normalize_collapses_case_space_punctuation_and_synonyms() {
        let m = matcher();
        assert_eq!(m.normalize("  Computer   FUNDAMENTALS "), "computer fundamental");
        assert_eq!(m.normalize("MS-Excel"), "ms excel");
        assert_eq!(m.normalize("Business Mathematics"), "business math");
        assert_eq!(m.normalize(" \t "), "");
    }

    #[test]
    fn test_excel_never_matches_word() {
        let m = matcher();
        assert!(!m.matches("MS Excel", "MS Word"));
        assert_eq!(
            m.explain("MS Excel", "MS Word"),
            MatchSignal::CategoryConflict {
                left: "excel".to_string(),
                right: "word".to_string()
            }
        );
    }

    #[test]
    fn test_conflict_guard_runs_before_overlap() {
        let m = matcher();
        assert!(!m.matches("Computer Fundamentals", "Computer Networks"));
    }

    #[test]
    fn test_synonym_and_typo_normalization() {
        let m = matcher();
        assert_eq!(
            m.explain("Computer Fundamental", "Computer Fundamentle"),
            MatchSignal::Equal
        );
        assert!(m.matches("Mathematics", "maths"));
    }

    #[test]
    fn test_containment_recovers_expansions() {
        let m = matcher();
        assert_eq!(
            m.explain("PowerPoint", "MS PowerPoint Essentials"),
            MatchSignal::Containment
        );
    }

    #[test]
    fn test_word_overlap_needs_half_of_either_side() {
        let m = matcher();
        assert_eq!(
            m.explain("Computer Basics", "Computer Networks"),
            MatchSignal::WordOverlap { shared: 1 }
        );
        assert!(m.matches("Computer Basics", "Computer Fundamental"));
        assert!(!m.matches("Tally ERP", "Computer Basics"));
    }

    #[test]
    fn test_short_tokens_do_not_count_as_overlap() {
        let m = SubjectMatcher::new(SubjectCatalog::empty());
        assert_eq!(m.explain("ms it", "ms os"), MatchSignal::NoMatch);
    }

    #[test]
    fn test_blank_never_matches() {
        let m = matcher();
        assert_eq!(m.explain("", "Excel"), MatchSignal::Blank);
        assert!(!m.matches("  ", "  "));
    }

    #[test]
    fn test_matches_is_symmetric() {
        let m = matcher();
        for a in SAMPLE_NAMES {
            for b in SAMPLE_NAMES {
                assert_eq!(m.matches(a, b), m.matches(b, a), "asymmetric for {a:?} / {b:?}");
            }
        }
    }

    #[test]
    fn test_matches_is_reflexive() {
        let m = matcher();
        for name in SAMPLE_NAMES {
            assert!(m.matches(name, name), "{name:?} should match itself");
        }
    }

    #[test]
    fn test_injected_category_extends_guard() {
        let mut catalog = SubjectCatalog::default();
        catalog.categories.push(SubjectCategory {
            name: "accounting".to_string(),
            aliases: vec!["tally".to_string()],
        });
        let m = SubjectMatcher::new(catalog);

        assert!(!m.matches("Tally Excel Integration", "Tally Basics"));
        assert!(m.matches("Tally ERP", "Tally Prime ERP"));
    }

    #[test]
    fn test_closest_prefers_highest_similarity_then_name() {
        let m = matcher();
        let closest = m
            .closest("Computer Fundamental", ["Computer Networks", "Computer Fundamentle"])
            .unwrap();
        assert_eq!(closest.name, "Computer Fundamentle");
        assert!((closest.similarity - 1.0).abs() < f64::EPSILON);

        let tie = m.closest("zzz", ["bbb", "aaa"]).unwrap();
        assert_eq!(tie.name, "aaa");

        assert!(m.closest("", ["Excel"]).is_none());
        assert!(m.closest("Excel", std::iter::empty()).is_none());
    }
}
