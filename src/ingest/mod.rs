//! Bulk replace of one subject's question bank.
//!
//! A replace validates every question before anything is deleted, then swaps
//! the bank for one (paper, subject) pair. Stores with transactions swap it
//! atomically; other stores delete then insert under a per-pair lock, and an
//! insert failure after the delete is reported as
//! [`IngestError::PartialIngestFailure`].
//!
//! The write phase runs on its own task, so a caller that gives up after the
//! delete has started cannot leave the bank half-written.

mod locks;

pub use locks::SubjectLocks;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::normalize::normalize_for_write;
use crate::store::{
    NewQuestion, PaperScope, QuestionFilter, QuestionInput, QuestionStore, StoreError,
};
use crate::text::{decode_text, is_missing_question_text};

/// Errors raised by replace and repair operations.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The request is unusable; nothing was written.
    #[error("invalid question upload: {0}")]
    InvalidInput(String),

    /// The store failed before anything was deleted, or a transaction rolled back.
    #[error("question store unavailable during upload: {0}\n  Suggestion: Retry the upload; the previous bank is intact")]
    StoreUnavailable(#[from] StoreError),

    /// The old bank was deleted but the new one was not fully written.
    #[error(
        "partial upload for paper '{paper_id}' subject '{subject_id}': deleted {deleted}, inserted {inserted} of {expected}\n  Suggestion: Re-run the upload now; the subject bank is incomplete"
    )]
    PartialIngestFailure {
        paper_id: String,
        subject_id: String,
        /// Rows removed before the failure.
        deleted: u64,
        /// Rows that made it in.
        inserted: u64,
        /// Rows that should have been inserted.
        expected: u64,
        /// Store failure, when the insert errored rather than came up short.
        #[source]
        source: Option<StoreError>,
    },

    /// The write task stopped before reporting an outcome.
    #[error("upload task did not complete: {0}\n  Suggestion: Check the subject bank and re-run the upload")]
    Interrupted(String),
}

impl IngestError {
    /// Returns true when persisted state may be degraded.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::PartialIngestFailure { .. } | Self::Interrupted(_))
    }
}

/// A full replacement of one subject's question bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceRequest {
    pub paper_id: String,
    pub subject_id: String,
    /// May be blank when the paper is registered with this subject.
    #[serde(default)]
    pub subject_name: String,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

impl ReplaceRequest {
    #[must_use]
    pub fn new(
        paper_id: impl Into<String>,
        subject_id: impl Into<String>,
        subject_name: impl Into<String>,
        questions: Vec<QuestionInput>,
    ) -> Self {
        Self {
            paper_id: paper_id.into(),
            subject_id: subject_id.into(),
            subject_name: subject_name.into(),
            questions,
        }
    }
}

/// Counts reported by a successful replace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOutcome {
    pub inserted_count: u64,
    pub deleted_count: u64,
    /// Uploaded entries dropped for blank or placeholder text.
    pub skipped_count: u64,
}

/// Counts reported by a repair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairOutcome {
    pub examined: u64,
    pub updated: u64,
    /// Rows left untouched because their correct option is unrecognizable.
    pub invalid: u64,
}

/// Validates uploads and replaces subject banks in a [`QuestionStore`].
#[derive(Clone)]
pub struct BulkReplaceIngestor {
    store: Arc<dyn QuestionStore>,
    locks: Arc<SubjectLocks>,
}

impl BulkReplaceIngestor {
    #[must_use]
    pub fn new(store: Arc<dyn QuestionStore>) -> Self {
        Self {
            store,
            locks: Arc::new(SubjectLocks::new()),
        }
    }

    /// Replaces the bank of one (paper, subject) pair.
    ///
    /// # Errors
    ///
    /// - [`IngestError::InvalidInput`] when ids are blank, the subject name
    ///   cannot be determined, no question has usable text, or a correct
    ///   option is not `A`..`D`. Nothing is written.
    /// - [`IngestError::StoreUnavailable`] when the store fails before the
    ///   delete or the transaction rolls back.
    /// - [`IngestError::PartialIngestFailure`] when the old bank was deleted
    ///   and the new one was not fully inserted.
    #[instrument(
        skip(self, request),
        fields(
            paper_id = %request.paper_id,
            subject_id = %request.subject_id,
            uploaded = request.questions.len()
        )
    )]
    pub async fn replace(&self, request: ReplaceRequest) -> Result<ReplaceOutcome, IngestError> {
        let paper_id = request.paper_id.trim().to_string();
        let subject_id = request.subject_id.trim().to_string();
        if paper_id.is_empty() {
            return Err(IngestError::InvalidInput("paper id is blank".to_string()));
        }
        if subject_id.is_empty() {
            return Err(IngestError::InvalidInput("subject id is blank".to_string()));
        }
        let scope = PaperScope::resolve(self.store.as_ref(), &paper_id).await?;
        let subject_name = subject_name_for(&scope, &paper_id, &subject_id, &request.subject_name)?;
        // New rows go under the registered code so every later lookup form finds them.
        let stored_code = scope.canonical_code(&paper_id).to_string();

        let mut questions = Vec::with_capacity(request.questions.len());
        let mut skipped_count = 0;
        for input in request.questions {
            if is_missing_question_text(&decode_text(&input.question_text)) {
                skipped_count += 1;
                continue;
            }
            let mut question = NewQuestion {
                paper_id: stored_code.clone(),
                subject_id: subject_id.clone(),
                subject_name: subject_name.clone(),
                question_text: input.question_text,
                option_a: input.option_a,
                option_b: input.option_b,
                option_c: input.option_c,
                option_d: input.option_d,
                correct_option: input.correct_option,
            };
            normalize_for_write(&mut question, questions.len() + 1)
                .map_err(|err| IngestError::InvalidInput(err.to_string()))?;
            questions.push(question);
        }

        if questions.is_empty() {
            return Err(IngestError::InvalidInput(format!(
                "no question with usable text ({skipped_count} skipped)"
            )));
        }
        debug!(
            valid = questions.len(),
            skipped = skipped_count,
            "upload validated"
        );

        let filter = bank_filter(&scope, &subject_id);
        let store = Arc::clone(&self.store);
        let locks = Arc::clone(&self.locks);
        let writer = tokio::spawn(async move {
            let _guard = locks.lock(&stored_code, &subject_id).await;
            write_bank(store.as_ref(), &filter, &questions, &stored_code, &subject_id).await
        });

        let (deleted_count, inserted_count) = writer
            .await
            .map_err(|err| IngestError::Interrupted(err.to_string()))??;

        info!(
            inserted = inserted_count,
            deleted = deleted_count,
            skipped = skipped_count,
            "question bank replaced"
        );
        Ok(ReplaceOutcome {
            inserted_count,
            deleted_count,
            skipped_count,
        })
    }

    /// Rewrites the stored bank of one (paper, subject) pair with write-time
    /// defaults. Running it twice changes nothing the second time.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidInput`] for blank ids and
    /// [`IngestError::StoreUnavailable`] when the store fails.
    #[instrument(skip(self))]
    pub async fn repair(
        &self,
        paper_id: &str,
        subject_id: &str,
    ) -> Result<RepairOutcome, IngestError> {
        let paper_id = paper_id.trim();
        let subject_id = subject_id.trim();
        if paper_id.is_empty() || subject_id.is_empty() {
            return Err(IngestError::InvalidInput(
                "paper id and subject id are required".to_string(),
            ));
        }

        let scope = PaperScope::resolve(self.store.as_ref(), paper_id).await?;
        let _guard = self
            .locks
            .lock(scope.canonical_code(paper_id), subject_id)
            .await;
        let records = self.store.find(&bank_filter(&scope, subject_id)).await?;

        let mut outcome = RepairOutcome {
            examined: records.len() as u64,
            ..RepairOutcome::default()
        };
        let mut changed = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            let mut repaired = record.clone();
            match normalize_for_write(&mut repaired, index + 1) {
                Ok(()) if repaired != record => changed.push(repaired),
                Ok(()) => {}
                Err(err) => {
                    warn!(id = record.id, error = %err, "question left as is");
                    outcome.invalid += 1;
                }
            }
        }

        if !changed.is_empty() {
            outcome.updated = self.store.update_many(&changed).await?;
        }
        info!(
            examined = outcome.examined,
            updated = outcome.updated,
            invalid = outcome.invalid,
            "question bank repaired"
        );
        Ok(outcome)
    }
}

impl std::fmt::Debug for BulkReplaceIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkReplaceIngestor")
            .field("transactional", &self.store.supports_transactions())
            .field("locked_pairs", &self.locks.len())
            .finish()
    }
}

/// Uses the supplied subject name, or the registered paper's name for `subject_id`.
fn subject_name_for(
    scope: &PaperScope,
    paper_id: &str,
    subject_id: &str,
    supplied: &str,
) -> Result<String, IngestError> {
    let supplied = supplied.trim();
    if !supplied.is_empty() {
        return Ok(supplied.to_string());
    }

    scope
        .registered
        .as_ref()
        .and_then(|paper| paper.subject_by_id(subject_id))
        .map(|spec| spec.subject_name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            IngestError::InvalidInput(format!(
                "subject name is blank and paper '{paper_id}' has no registered subject '{subject_id}'"
            ))
        })
}

/// Rows owned by one (paper, subject) bank: every stored form of the paper.
fn bank_filter(scope: &PaperScope, subject_id: &str) -> QuestionFilter {
    QuestionFilter::for_paper(scope.aliases.clone()).with_subject_id(subject_id)
}

async fn write_bank(
    store: &dyn QuestionStore,
    filter: &QuestionFilter,
    questions: &[NewQuestion],
    paper_id: &str,
    subject_id: &str,
) -> Result<(u64, u64), IngestError> {
    let expected = questions.len() as u64;

    if store.supports_transactions() {
        let counts = store.replace_all(filter, questions).await?;
        return Ok((counts.deleted, counts.inserted));
    }

    let deleted = store.delete_many(filter).await?;
    match store.insert_many(questions).await {
        Ok(stored) if stored.len() as u64 == expected => Ok((deleted, expected)),
        Ok(stored) => {
            let inserted = stored.len() as u64;
            error!(
                paper_id,
                subject_id, deleted, inserted, expected, "question bank partially written"
            );
            Err(IngestError::PartialIngestFailure {
                paper_id: paper_id.to_string(),
                subject_id: subject_id.to_string(),
                deleted,
                inserted,
                expected,
                source: None,
            })
        }
        Err(source) => {
            error!(
                paper_id,
                subject_id,
                deleted,
                expected,
                db_kind = ?source.database_kind(),
                busy = source.is_busy_or_locked(),
                error = %source,
                "insert failed after delete; question bank is empty"
            );
            Err(IngestError::PartialIngestFailure {
                paper_id: paper_id.to_string(),
                subject_id: subject_id.to_string(),
                deleted,
                inserted: 0,
                expected,
                source: Some(source),
            })
        }
    }
}
