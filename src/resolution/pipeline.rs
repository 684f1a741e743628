//! Ordered strategy loop with not-found diagnostics.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::strategy::{
    BestAvailableSubject, ExactSubjectId, FuzzySubjectName, PreparedQuery, ResolutionStrategy,
    SubjectNameEquality, looks_opaque,
};
use super::{DiagnosticInfo, ResolutionQuery, ResolutionResult, ResolveError, StrategyKind};
use crate::normalize::normalize_for_display;
use crate::paper::ExamPaper;
use crate::store::{PaperScope, QuestionField, QuestionFilter, QuestionStore};
use crate::subject::SubjectMatcher;

/// Default number of sample questions in a diagnostic.
pub const DEFAULT_SAMPLE_SIZE: u32 = 5;

/// Runs resolution strategies in order until one produces questions.
///
/// Results are never merged across strategies. A strategy whose
/// preconditions are not met is skipped; a store failure aborts the run.
pub struct ResolutionPipeline {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
    matcher: Arc<SubjectMatcher>,
    sample_size: u32,
}

impl ResolutionPipeline {
    /// Creates a pipeline with the standard strategy order.
    #[must_use]
    pub fn new(matcher: SubjectMatcher) -> Self {
        let matcher = Arc::new(matcher);
        let strategies: Vec<Box<dyn ResolutionStrategy>> = vec![
            Box::new(ExactSubjectId),
            Box::new(SubjectNameEquality),
            Box::new(FuzzySubjectName::new(Arc::clone(&matcher))),
            Box::new(BestAvailableSubject::new(Arc::clone(&matcher))),
        ];
        Self {
            strategies,
            matcher,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// Creates a pipeline with a caller-chosen strategy list.
    #[must_use]
    pub fn with_strategies(
        matcher: SubjectMatcher,
        strategies: Vec<Box<dyn ResolutionStrategy>>,
    ) -> Self {
        Self {
            strategies,
            matcher: Arc::new(matcher),
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// Sets how many sample questions a diagnostic carries.
    #[must_use]
    pub fn with_sample_size(mut self, sample_size: u32) -> Self {
        self.sample_size = sample_size.max(1);
        self
    }

    /// Returns the strategy kinds in run order.
    #[must_use]
    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Returns the matcher shared by the fuzzy strategies.
    #[must_use]
    pub fn matcher(&self) -> &SubjectMatcher {
        &self.matcher
    }

    /// Expands identifiers and resolves the target subject name.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidInput`] for a blank paper id, or a blank
    /// subject identifier without a subject name; [`ResolveError::StoreUnavailable`]
    /// if the registered-paper lookup fails.
    #[instrument(skip(self, store, query), fields(paper_id = %query.paper_id))]
    pub async fn prepare(
        &self,
        store: &dyn QuestionStore,
        query: &ResolutionQuery,
    ) -> Result<PreparedQuery, ResolveError> {
        let paper_id = query.paper_id.trim();
        if paper_id.is_empty() {
            return Err(ResolveError::InvalidInput("paper id is blank".to_string()));
        }
        let identifier = query.subject_identifier.trim();
        let supplied_name = query
            .subject_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        if identifier.is_empty() && supplied_name.is_none() {
            return Err(ResolveError::InvalidInput(
                "subject identifier is blank".to_string(),
            ));
        }

        let PaperScope {
            aliases: paper_aliases,
            exact_forms: exact_paper_forms,
            registered: registered_paper,
        } = PaperScope::resolve(store, paper_id).await?;
        if let Some(paper) = &registered_paper {
            debug!(registered = %paper.paper_id, "paper is registered");
        }

        let mut subject_ids = Vec::new();
        if !identifier.is_empty() {
            subject_ids.push(identifier.to_string());
        }
        let by_name = registered_paper
            .as_ref()
            .and_then(|paper| paper.subject_by_name(identifier));
        if let Some(spec) = by_name
            && !subject_ids.contains(&spec.subject_id)
        {
            subject_ids.push(spec.subject_id.clone());
        }

        let target_subject_name = supplied_name
            .map(ToString::to_string)
            .or_else(|| registered_subject_name(registered_paper.as_ref(), identifier))
            .or_else(|| {
                (!identifier.is_empty() && !looks_opaque(identifier))
                    .then(|| identifier.to_string())
            });

        debug!(
            aliases = ?paper_aliases.labels(),
            target = ?target_subject_name,
            "query prepared"
        );

        Ok(PreparedQuery {
            paper_aliases,
            exact_paper_forms,
            subject_ids,
            target_subject_name,
            exact_match_requested: query.exact_match_requested,
            registered_paper,
        })
    }

    /// Resolves a query to a question set or a diagnostic.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidInput`] for missing identifiers and
    /// [`ResolveError::StoreUnavailable`] when the store fails at any point.
    #[instrument(
        skip(self, store, query),
        fields(
            paper_id = %query.paper_id,
            subject = %query.subject_identifier,
            exact = query.exact_match_requested
        )
    )]
    pub async fn resolve(
        &self,
        store: &dyn QuestionStore,
        query: &ResolutionQuery,
    ) -> Result<ResolutionResult, ResolveError> {
        let prepared = self.prepare(store, query).await?;
        let mut attempted = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let kind = strategy.kind();
            if prepared.exact_match_requested && kind.is_fuzzy() {
                debug!(strategy = %kind, "skipping fuzzy strategy; exact match requested");
                continue;
            }
            if let Some(reason) = strategy.skip_reason(&prepared) {
                debug!(strategy = %kind, reason, "strategy skipped");
                continue;
            }

            debug!(strategy = %kind, "trying strategy");
            attempted.push(kind);
            match strategy.attempt(store, &prepared).await {
                Ok(Some(questions)) if !questions.is_empty() => {
                    info!(strategy = %kind, count = questions.len(), "questions resolved");
                    return Ok(ResolutionResult::Found {
                        strategy: kind,
                        questions: normalize_for_display(questions),
                    });
                }
                Ok(_) => {
                    debug!(strategy = %kind, "strategy found nothing, trying next");
                }
                Err(err) if err.is_busy_or_locked() => {
                    warn!(strategy = %kind, error = %err, "question store busy, giving up");
                    return Err(ResolveError::StoreUnavailable(err));
                }
                Err(err) => {
                    warn!(
                        strategy = %kind,
                        db_kind = ?err.database_kind(),
                        error = %err,
                        "question store failed"
                    );
                    return Err(ResolveError::StoreUnavailable(err));
                }
            }
        }

        let diagnostic = self.diagnose(store, &prepared, attempted).await?;
        info!(
            questions_for_paper = diagnostic.questions_for_paper,
            available = diagnostic.available_subject_names.len(),
            "no questions matched"
        );
        Ok(ResolutionResult::NotFound { diagnostic })
    }

    async fn diagnose(
        &self,
        store: &dyn QuestionStore,
        prepared: &PreparedQuery,
        strategies_attempted: Vec<StrategyKind>,
    ) -> Result<DiagnosticInfo, ResolveError> {
        let paper_filter = QuestionFilter::for_paper(prepared.paper_aliases.clone());
        let total_questions_in_store = store.count(&QuestionFilter::all()).await?;
        let questions_for_paper = store.count(&paper_filter).await?;
        let available_subject_names = store
            .distinct(QuestionField::SubjectName, &paper_filter)
            .await?;

        let sample_filter = if questions_for_paper > 0 {
            paper_filter
        } else {
            QuestionFilter::all()
        };
        let sample_questions =
            normalize_for_display(store.find(&sample_filter.with_limit(self.sample_size)).await?);

        let closest_subject = prepared.target_subject_name.as_deref().and_then(|target| {
            self.matcher
                .closest(target, available_subject_names.iter().map(String::as_str))
        });

        Ok(DiagnosticInfo {
            total_questions_in_store,
            questions_for_paper,
            available_subject_names,
            sample_questions,
            paper_aliases: prepared.paper_aliases.labels(),
            target_subject_name: prepared.target_subject_name.clone(),
            strategies_attempted,
            closest_subject,
        })
    }
}

fn registered_subject_name(paper: Option<&ExamPaper>, identifier: &str) -> Option<String> {
    let paper = paper?;
    paper
        .subject_by_id(identifier)
        .or_else(|| paper.subject_by_name(identifier))
        .map(|spec| spec.subject_name.trim().to_string())
        .filter(|name| !name.is_empty())
}

impl std::fmt::Debug for ResolutionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionPipeline")
            .field("strategies", &self.strategy_kinds())
            .field("sample_size", &self.sample_size)
            .finish_non_exhaustive()
    }
}

impl Default for ResolutionPipeline {
    fn default() -> Self {
        Self::new(SubjectMatcher::default())
    }
}
