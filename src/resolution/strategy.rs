//! The ordered matching strategies behind the resolution pipeline.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::StrategyKind;
use crate::paper::{ExamPaper, PaperAliasSet};
use crate::store::{QuestionField, QuestionFilter, QuestionRecord, QuestionStore, StoreError};
use crate::subject::SubjectMatcher;

/// A resolution query after identifier expansion and registered-paper lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuery {
    /// Every form the paper may be stored under.
    pub paper_aliases: PaperAliasSet,
    /// Literal paper codes only: the caller's, the registered code and store id.
    pub exact_paper_forms: PaperAliasSet,
    /// Subject ids to try for an exact match, in order.
    pub subject_ids: Vec<String>,
    /// Subject name the name-based strategies look for.
    pub target_subject_name: Option<String>,
    pub exact_match_requested: bool,
    /// Registered paper the identifier resolved to, if any.
    pub registered_paper: Option<ExamPaper>,
}

impl PreparedQuery {
    fn paper_filter(&self) -> QuestionFilter {
        QuestionFilter::for_paper(self.paper_aliases.clone())
    }
}

/// Returns true for identifiers that look like ids rather than names.
///
/// An opaque id has no whitespace and contains a digit (`s1`, `17`, `SUB-004`).
#[must_use]
pub fn looks_opaque(identifier: &str) -> bool {
    let trimmed = identifier.trim();
    !trimmed.contains(char::is_whitespace) && trimmed.chars().any(|c| c.is_ascii_digit())
}

/// One way of locating a subject's questions.
///
/// This trait uses `async_trait` so strategies can live in a
/// `Vec<Box<dyn ResolutionStrategy>>`.
#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    /// Returns which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Returns why the strategy cannot run for this query, if it cannot.
    fn skip_reason(&self, _prepared: &PreparedQuery) -> Option<&'static str> {
        None
    }

    /// Looks for questions; `Ok(None)` means nothing matched.
    async fn attempt(
        &self,
        store: &dyn QuestionStore,
        prepared: &PreparedQuery,
    ) -> Result<Option<Vec<QuestionRecord>>, StoreError>;
}

fn non_empty(records: Vec<QuestionRecord>) -> Option<Vec<QuestionRecord>> {
    if records.is_empty() { None } else { Some(records) }
}

/// Paper alias set and exact subject id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSubjectId;

#[async_trait]
impl ResolutionStrategy for ExactSubjectId {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ExactSubjectId
    }

    fn skip_reason(&self, prepared: &PreparedQuery) -> Option<&'static str> {
        prepared
            .subject_ids
            .is_empty()
            .then_some("no subject id to match")
    }

    async fn attempt(
        &self,
        store: &dyn QuestionStore,
        prepared: &PreparedQuery,
    ) -> Result<Option<Vec<QuestionRecord>>, StoreError> {
        for subject_id in &prepared.subject_ids {
            let filter = prepared.paper_filter().with_subject_id(subject_id.clone());
            if let Some(records) = non_empty(store.find(&filter).await?) {
                return Ok(Some(records));
            }
        }
        Ok(None)
    }
}

/// Paper alias set and trimmed, case-insensitive subject name equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectNameEquality;

#[async_trait]
impl ResolutionStrategy for SubjectNameEquality {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SubjectNameEquality
    }

    fn skip_reason(&self, prepared: &PreparedQuery) -> Option<&'static str> {
        prepared
            .target_subject_name
            .is_none()
            .then_some("no target subject name")
    }

    async fn attempt(
        &self,
        store: &dyn QuestionStore,
        prepared: &PreparedQuery,
    ) -> Result<Option<Vec<QuestionRecord>>, StoreError> {
        let Some(target) = &prepared.target_subject_name else {
            return Ok(None);
        };
        let filter = prepared.paper_filter().with_subject_name(target.clone());
        Ok(non_empty(store.find(&filter).await?))
    }
}

/// Records under the literal paper codes whose subject name matches the target.
///
/// Succeeds only when every candidate carries the same subject name; several
/// distinct names are left for [`BestAvailableSubject`] to rank.
#[derive(Debug, Clone)]
pub struct FuzzySubjectName {
    matcher: Arc<SubjectMatcher>,
}

impl FuzzySubjectName {
    #[must_use]
    pub fn new(matcher: Arc<SubjectMatcher>) -> Self {
        Self { matcher }
    }
}

#[async_trait]
impl ResolutionStrategy for FuzzySubjectName {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FuzzySubjectName
    }

    fn skip_reason(&self, prepared: &PreparedQuery) -> Option<&'static str> {
        if prepared.target_subject_name.is_none() {
            Some("no target subject name")
        } else if prepared.exact_paper_forms.is_empty() {
            Some("no literal paper code")
        } else {
            None
        }
    }

    async fn attempt(
        &self,
        store: &dyn QuestionStore,
        prepared: &PreparedQuery,
    ) -> Result<Option<Vec<QuestionRecord>>, StoreError> {
        let Some(target) = &prepared.target_subject_name else {
            return Ok(None);
        };

        let filter = QuestionFilter::for_paper(prepared.exact_paper_forms.clone());
        let candidates: Vec<QuestionRecord> = store
            .find(&filter)
            .await?
            .into_iter()
            .filter(|record| self.matcher.matches(&record.subject_name, target))
            .collect();

        let names: BTreeSet<String> = candidates
            .iter()
            .map(|record| record.subject_name.trim().to_lowercase())
            .collect();
        if names.len() > 1 {
            debug!(
                distinct_names = names.len(),
                "several subjects match; deferring to best-available ranking"
            );
            return Ok(None);
        }

        Ok(non_empty(candidates))
    }
}

/// The matching subject with the most questions across all paper forms.
///
/// Ties go to the lexicographically smallest subject name.
#[derive(Debug, Clone)]
pub struct BestAvailableSubject {
    matcher: Arc<SubjectMatcher>,
}

impl BestAvailableSubject {
    #[must_use]
    pub fn new(matcher: Arc<SubjectMatcher>) -> Self {
        Self { matcher }
    }
}

#[async_trait]
impl ResolutionStrategy for BestAvailableSubject {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BestAvailableSubject
    }

    fn skip_reason(&self, prepared: &PreparedQuery) -> Option<&'static str> {
        prepared
            .target_subject_name
            .is_none()
            .then_some("no target subject name")
    }

    async fn attempt(
        &self,
        store: &dyn QuestionStore,
        prepared: &PreparedQuery,
    ) -> Result<Option<Vec<QuestionRecord>>, StoreError> {
        let Some(target) = &prepared.target_subject_name else {
            return Ok(None);
        };

        let paper_filter = prepared.paper_filter();
        let names = store
            .distinct(QuestionField::SubjectName, &paper_filter)
            .await?;

        let mut best: Option<(u64, String)> = None;
        for name in names.iter().filter(|name| self.matcher.matches(name, target)) {
            let count = store
                .count(&paper_filter.clone().with_subject_name(name.clone()))
                .await?;
            debug!(subject_name = %name, count, "candidate subject");

            let better = match &best {
                None => count > 0,
                Some((best_count, best_name)) => {
                    count > *best_count || (count == *best_count && name < best_name)
                }
            };
            if better {
                best = Some((count, name.clone()));
            }
        }

        let Some((_, chosen)) = best else {
            return Ok(None);
        };
        debug!(subject_name = %chosen, "best available subject chosen");
        Ok(non_empty(
            store
                .find(&paper_filter.with_subject_name(chosen))
                .await?,
        ))
    }
}
