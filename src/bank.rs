//! Service facade tying the store, resolution pipeline and ingestor together.

use std::sync::Arc;

use tracing::instrument;

use crate::db::Database;
use crate::ingest::{
    BulkReplaceIngestor, IngestError, RepairOutcome, ReplaceOutcome, ReplaceRequest,
};
use crate::paper::{ExamPaper, PaperAliasSet};
use crate::resolution::{ResolutionPipeline, ResolutionQuery, ResolutionResult, ResolveError};
use crate::store::{QuestionStore, SqliteQuestionStore, StoreError};
use crate::subject::SubjectMatcher;

/// Entry point for resolving and uploading exam question banks.
///
/// Cheap to share behind an `Arc`; reads run concurrently, replaces are
/// serialized per (paper, subject).
pub struct QuestionBank {
    store: Arc<dyn QuestionStore>,
    pipeline: ResolutionPipeline,
    ingestor: BulkReplaceIngestor,
}

impl std::fmt::Debug for QuestionBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionBank")
            .field("pipeline", &self.pipeline)
            .field("ingestor", &self.ingestor)
            .finish_non_exhaustive()
    }
}

impl QuestionBank {
    /// Creates a bank over any store with the default subject catalog.
    #[must_use]
    pub fn new(store: Arc<dyn QuestionStore>) -> Self {
        Self::with_pipeline(store, ResolutionPipeline::default())
    }

    /// Creates a bank with a custom resolution pipeline.
    #[must_use]
    pub fn with_pipeline(store: Arc<dyn QuestionStore>, pipeline: ResolutionPipeline) -> Self {
        Self {
            ingestor: BulkReplaceIngestor::new(Arc::clone(&store)),
            store,
            pipeline,
        }
    }

    /// Creates a bank over the `SQLite` store.
    #[must_use]
    pub fn sqlite(db: Database, matcher: SubjectMatcher, sample_size: u32) -> Self {
        Self::with_pipeline(
            Arc::new(SqliteQuestionStore::new(db)),
            ResolutionPipeline::new(matcher).with_sample_size(sample_size),
        )
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn QuestionStore> {
        &self.store
    }

    /// Resolves the questions of one subject of one paper.
    ///
    /// # Errors
    ///
    /// See [`ResolutionPipeline::resolve`].
    pub async fn resolve_questions(
        &self,
        paper_id: &str,
        subject_identifier: &str,
        exact_match_requested: bool,
    ) -> Result<ResolutionResult, ResolveError> {
        let query = ResolutionQuery::new(paper_id, subject_identifier).exact(exact_match_requested);
        self.resolve(&query).await
    }

    /// Resolves a fully specified query.
    ///
    /// # Errors
    ///
    /// See [`ResolutionPipeline::resolve`].
    pub async fn resolve(&self, query: &ResolutionQuery) -> Result<ResolutionResult, ResolveError> {
        self.pipeline.resolve(self.store.as_ref(), query).await
    }

    /// Replaces one subject's question bank.
    ///
    /// # Errors
    ///
    /// See [`BulkReplaceIngestor::replace`].
    pub async fn replace_question_bank(
        &self,
        request: ReplaceRequest,
    ) -> Result<ReplaceOutcome, IngestError> {
        self.ingestor.replace(request).await
    }

    /// Persists write-time defaults into one subject's stored questions.
    ///
    /// # Errors
    ///
    /// See [`BulkReplaceIngestor::repair`].
    pub async fn repair_question_bank(
        &self,
        paper_id: &str,
        subject_id: &str,
    ) -> Result<RepairOutcome, IngestError> {
        self.ingestor.repair(paper_id, subject_id).await
    }

    /// Registers or updates a paper and its subject list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the paper code is blank or the store fails.
    #[instrument(skip(self, paper), fields(paper_id = %paper.paper_id))]
    pub async fn register_paper(&self, paper: &ExamPaper) -> Result<ExamPaper, StoreError> {
        self.store.save_paper(paper).await
    }

    /// Looks up a registered paper by any alias form or by store id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    #[instrument(skip(self))]
    pub async fn find_paper(&self, identifier: &str) -> Result<Option<ExamPaper>, StoreError> {
        if let Some(paper) = self
            .store
            .find_paper(&PaperAliasSet::from_identifier(identifier))
            .await?
        {
            return Ok(Some(paper));
        }
        match identifier.trim().parse::<i64>() {
            Ok(id) => self.store.find_paper_by_id(id).await,
            Err(_) => Ok(None),
        }
    }
}
