//! Exam Question Bank Library
//!
//! This library resolves exam question banks whose paper and subject
//! identifiers drift between upload sessions, and replaces one subject's bank
//! at a time without leaving it silently empty.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`paper`] - Exam papers and paper identifier alias expansion
//! - [`subject`] - Subject name matching and its injectable catalog
//! - [`store`] - Question store trait and its `SQLite` implementation
//! - [`resolution`] - Ordered matching strategies with not-found diagnostics
//! - [`normalize`] - Display and write-time placeholder normalization
//! - [`ingest`] - Validated bulk replace and explicit repair
//! - [`bank`] - Facade over all of the above
//! - [`db`] - Database connection and schema management

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bank;
pub mod db;
pub mod ingest;
pub mod normalize;
pub mod paper;
pub mod resolution;
pub mod store;
pub mod subject;
pub mod text;

// Re-export commonly used types
pub use bank::QuestionBank;
pub use db::{Database, DatabaseOptions, DbError};
pub use ingest::{
    BulkReplaceIngestor, IngestError, RepairOutcome, ReplaceOutcome, ReplaceRequest, SubjectLocks,
};
pub use normalize::{normalize_for_display, normalize_for_write};
pub use paper::{ExamPaper, PaperAliasSet, PaperCondition, SubjectSpec};
pub use resolution::{
    DiagnosticInfo, ResolutionPipeline, ResolutionQuery, ResolutionResult, ResolutionStrategy,
    ResolveError, StrategyKind,
};
pub use store::{
    NewQuestion, PaperScope, QuestionField, QuestionFilter, QuestionInput, QuestionRecord,
    QuestionStore, ReplaceCounts, SqliteQuestionStore, StoreError, StoreErrorKind,
};
pub use subject::{SubjectCatalog, SubjectCategory, SubjectMatcher};
pub use text::decode_text;
