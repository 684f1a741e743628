//! Exam question resolution.
//!
//! Callers ask for the questions of (paper, subject) using identifiers that
//! drift between upload sessions. The [`ResolutionPipeline`] runs an ordered
//! list of [`ResolutionStrategy`] implementations against a
//! [`QuestionStore`](crate::store::QuestionStore) and stops at the first one
//! that produces questions:
//!
//! 1. [`ExactSubjectId`] - paper alias set and exact subject id
//! 2. [`SubjectNameEquality`] - paper alias set and case-insensitive subject name
//! 3. [`FuzzySubjectName`] - literal paper codes and matcher-equivalent names
//! 4. [`BestAvailableSubject`] - the largest matching subject for the paper
//!
//! When nothing matches, the result is [`ResolutionResult::NotFound`] carrying
//! a [`DiagnosticInfo`]. Store failures are errors, never a not-found result.

mod pipeline;
mod strategy;

pub use pipeline::{DEFAULT_SAMPLE_SIZE, ResolutionPipeline};
pub use strategy::{
    BestAvailableSubject, ExactSubjectId, FuzzySubjectName, PreparedQuery, ResolutionStrategy,
    SubjectNameEquality, looks_opaque,
};

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{QuestionRecord, StoreError};
use crate::subject::ClosestSubject;

/// A request for one subject's questions within one paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionQuery {
    /// Paper code, raw store id, or any alias form.
    pub paper_id: String,
    /// Subject id or free-text subject name.
    pub subject_identifier: String,
    /// Explicit target subject name, when the caller knows it.
    #[serde(default)]
    pub subject_name: Option<String>,
    /// Skip the fuzzy strategies.
    #[serde(default)]
    pub exact_match_requested: bool,
}

impl ResolutionQuery {
    #[must_use]
    pub fn new(paper_id: impl Into<String>, subject_identifier: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            subject_identifier: subject_identifier.into(),
            subject_name: None,
            exact_match_requested: false,
        }
    }

    #[must_use]
    pub fn with_subject_name(mut self, subject_name: impl Into<String>) -> Self {
        self.subject_name = Some(subject_name.into());
        self
    }

    #[must_use]
    pub fn exact(mut self, exact_match_requested: bool) -> Self {
        self.exact_match_requested = exact_match_requested;
        self
    }
}

/// Identifies the strategy that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    ExactSubjectId,
    SubjectNameEquality,
    FuzzySubjectName,
    BestAvailableSubject,
}

impl StrategyKind {
    /// Returns the stable string form used in logs and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExactSubjectId => "exact_subject_id",
            Self::SubjectNameEquality => "subject_name_equality",
            Self::FuzzySubjectName => "fuzzy_subject_name",
            Self::BestAvailableSubject => "best_available_subject",
        }
    }

    /// Fuzzy strategies are skipped when an exact match is requested.
    #[must_use]
    pub fn is_fuzzy(self) -> bool {
        matches!(self, Self::FuzzySubjectName | Self::BestAvailableSubject)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Context for an operator when no strategy produced questions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticInfo {
    pub total_questions_in_store: u64,
    pub questions_for_paper: u64,
    /// Subject names stored under any form of the paper, sorted.
    pub available_subject_names: BTreeSet<String>,
    /// A bounded, display-normalized sample.
    pub sample_questions: Vec<QuestionRecord>,
    /// Paper forms that were tried.
    pub paper_aliases: Vec<String>,
    pub target_subject_name: Option<String>,
    pub strategies_attempted: Vec<StrategyKind>,
    /// Nearest available name to the target, if any.
    pub closest_subject: Option<ClosestSubject>,
}

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ResolutionResult {
    /// A non-empty, display-normalized question sequence.
    Found {
        strategy: StrategyKind,
        questions: Vec<QuestionRecord>,
    },
    /// Nothing matched.
    NotFound { diagnostic: DiagnosticInfo },
}

impl ResolutionResult {
    /// Returns true for [`ResolutionResult::Found`].
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// Returns the questions of a found result.
    #[must_use]
    pub fn questions(&self) -> Option<&[QuestionRecord]> {
        match self {
            Self::Found { questions, .. } => Some(questions),
            Self::NotFound { .. } => None,
        }
    }

    /// Returns the strategy of a found result.
    #[must_use]
    pub fn strategy(&self) -> Option<StrategyKind> {
        match self {
            Self::Found { strategy, .. } => Some(*strategy),
            Self::NotFound { .. } => None,
        }
    }

    /// Returns the diagnostic of a not-found result.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&DiagnosticInfo> {
        match self {
            Self::Found { .. } => None,
            Self::NotFound { diagnostic } => Some(diagnostic),
        }
    }
}

/// Errors that abort a resolution.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// A required identifier is missing.
    #[error("invalid resolution request: {0}\n  Suggestion: Provide a paper id and a subject id or name")]
    InvalidInput(String),

    /// The question store failed; results would be unreliable.
    #[error("question store unavailable during resolution: {0}")]
    StoreUnavailable(#[from] StoreError),
}
