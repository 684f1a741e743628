//! Question store access.
//!
//! The resolution pipeline and the ingestor only ever talk to a
//! [`QuestionStore`]. [`SqliteQuestionStore`] is the shipped implementation;
//! tests substitute in-memory doubles that evaluate [`QuestionFilter`]
//! in-process via [`QuestionFilter::matches`].
//!
//! # Example
//!
//! ```ignore
//! use exambank_core::{Database, PaperAliasSet, QuestionFilter, SqliteQuestionStore};
//!
//! let db = Database::new(Path::new("exambank.db")).await?;
//! let store = SqliteQuestionStore::new(db);
//! let filter = QuestionFilter::for_paper(PaperAliasSet::from_identifier("EXM2024"))
//!     .with_subject_id("s1");
//! let questions = store.find(&filter).await?;
//! ```

mod error;
mod record;
mod sqlite;

pub use error::{StoreError, StoreErrorKind};
pub use record::{NewQuestion, OptionLabel, QuestionInput, QuestionRecord};
pub use sqlite::SqliteQuestionStore;

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;

use crate::paper::{ExamPaper, PaperAliasSet};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Conjunction of optional constraints over the `questions` table.
///
/// An absent constraint matches everything; a present but empty paper alias
/// set matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    /// Paper forms, any of which may match.
    pub paper: Option<PaperAliasSet>,
    /// Exact subject id.
    pub subject_id: Option<String>,
    /// Subject name, compared with surrounding spaces trimmed and ASCII case folded.
    ///
    /// This is the comparison SQLite's `trim()` and `COLLATE NOCASE` perform, so
    /// in-process matching agrees with the database: tabs and newlines are
    /// significant and non-ASCII letters compare by exact case.
    pub subject_name: Option<String>,
    /// Maximum number of rows returned by `find`.
    pub limit: Option<u32>,
}

impl QuestionFilter {
    /// Matches every question.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches questions stored under any form of a paper.
    #[must_use]
    pub fn for_paper(aliases: PaperAliasSet) -> Self {
        Self {
            paper: Some(aliases),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    #[must_use]
    pub fn with_subject_name(mut self, subject_name: impl Into<String>) -> Self {
        self.subject_name = Some(subject_name.into());
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true when neither a paper nor a subject constraint is set.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.paper.is_none() && self.subject_id.is_none() && self.subject_name.is_none()
    }

    /// Evaluates the filter against one record (limit is ignored).
    #[must_use]
    pub fn matches(&self, record: &QuestionRecord) -> bool {
        if let Some(paper) = &self.paper
            && !paper.matches_stored(&record.paper_id)
        {
            return false;
        }
        if let Some(subject_id) = &self.subject_id
            && record.subject_id != *subject_id
        {
            return false;
        }
        if let Some(subject_name) = &self.subject_name
            && !trim_spaces(&record.subject_name).eq_ignore_ascii_case(trim_spaces(subject_name))
        {
            return false;
        }
        true
    }
}

fn trim_spaces(value: &str) -> &str {
    value.trim_matches(' ')
}

/// Columns that `distinct` can project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionField {
    PaperId,
    SubjectId,
    SubjectName,
}

impl QuestionField {
    /// Column name in the `questions` table.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::PaperId => "paper_id",
            Self::SubjectId => "subject_id",
            Self::SubjectName => "subject_name",
        }
    }

    /// Reads the field from a record.
    #[must_use]
    pub fn value(self, record: &QuestionRecord) -> &str {
        match self {
            Self::PaperId => &record.paper_id,
            Self::SubjectId => &record.subject_id,
            Self::SubjectName => &record.subject_name,
        }
    }
}

impl fmt::Display for QuestionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// Row counts of a transactional replace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceCounts {
    pub deleted: u64,
    pub inserted: u64,
}

/// Data-access contract for question banks and registered papers.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Returns matching questions in insertion order.
    async fn find(&self, filter: &QuestionFilter) -> Result<Vec<QuestionRecord>>;

    /// Counts matching questions.
    async fn count(&self, filter: &QuestionFilter) -> Result<u64>;

    /// Returns the distinct values of one field over matching questions.
    async fn distinct(
        &self,
        field: QuestionField,
        filter: &QuestionFilter,
    ) -> Result<BTreeSet<String>>;

    /// Deletes matching questions and returns how many were removed.
    async fn delete_many(&self, filter: &QuestionFilter) -> Result<u64>;

    /// Inserts questions and returns the stored rows.
    async fn insert_many(&self, questions: &[NewQuestion]) -> Result<Vec<QuestionRecord>>;

    /// Rewrites the content columns of existing rows by id.
    async fn update_many(&self, records: &[QuestionRecord]) -> Result<u64>;

    /// Returns true when [`QuestionStore::replace_all`] is atomic.
    fn supports_transactions(&self) -> bool {
        false
    }

    /// Deletes matching questions and inserts replacements in one transaction.
    async fn replace_all(
        &self,
        _filter: &QuestionFilter,
        _questions: &[NewQuestion],
    ) -> Result<ReplaceCounts> {
        Err(StoreError::unsupported("replace_all"))
    }

    /// Looks up a registered paper whose code satisfies the alias set.
    async fn find_paper(&self, aliases: &PaperAliasSet) -> Result<Option<ExamPaper>>;

    /// Looks up a registered paper by store id.
    async fn find_paper_by_id(&self, id: i64) -> Result<Option<ExamPaper>>;

    /// Registers or updates a paper and its subject list.
    async fn save_paper(&self, paper: &ExamPaper) -> Result<ExamPaper>;
}

/// Every stored form of one paper, plus its registration when there is one.
///
/// Resolution reads and bulk replaces both key on [`PaperScope::aliases`],
/// so a replace removes exactly the rows a later exact-subject read returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperScope {
    /// The caller's alias set merged with the registered paper's.
    pub aliases: PaperAliasSet,
    /// Literal paper codes only: the caller's, the registered code and store id.
    pub exact_forms: PaperAliasSet,
    /// The registered paper the identifier resolved to.
    pub registered: Option<ExamPaper>,
}

impl PaperScope {
    /// Expands a paper identifier and merges in its registered paper.
    ///
    /// The registered paper is looked up by alias set, then by numeric store id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a paper lookup fails.
    pub async fn resolve(store: &dyn QuestionStore, paper_id: &str) -> Result<Self> {
        let paper_id = paper_id.trim();
        let mut aliases = PaperAliasSet::from_identifier(paper_id);
        let mut registered = store.find_paper(&aliases).await?;
        if registered.is_none()
            && let Ok(store_id) = paper_id.parse::<i64>()
        {
            registered = store.find_paper_by_id(store_id).await?;
        }

        let mut exact_forms = aliases.exact_forms();
        if let Some(paper) = &registered {
            let registered_aliases = paper.alias_set();
            exact_forms.merge(&registered_aliases.exact_forms());
            aliases.merge(&registered_aliases);
        }

        Ok(Self {
            aliases,
            exact_forms,
            registered,
        })
    }

    /// Returns the registered paper code, or the trimmed identifier when unregistered.
    #[must_use]
    pub fn canonical_code<'a>(&'a self, paper_id: &'a str) -> &'a str {
        self.registered
            .as_ref()
            .map_or(paper_id.trim(), |paper| paper.paper_id.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(paper_id: &str, subject_id: &str, subject_name: &str) -> QuestionRecord {
        QuestionRecord {
            id: 1,
            paper_id: paper_id.to_string(),
            subject_id: subject_id.to_string(),
            subject_name: subject_name.to_string(),
            question_text: "Q".to_string(),
            option_a: String::new(),
            option_b: String::new(),
            option_c: String::new(),
            option_d: String::new(),
            correct_option: String::new(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_filter_all_matches_everything() {
        assert!(QuestionFilter::all().matches(&record("X", "s", "n")));
        assert!(QuestionFilter::all().is_unbounded());
    }

    #[test]
    fn test_filter_paper_uses_alias_forms() {
        let filter = QuestionFilter::for_paper(PaperAliasSet::from_identifier("EXM2024"));
        assert!(filter.matches(&record("EXM2024", "s1", "Excel")));
        assert!(filter.matches(&record("P2024", "s1", "Excel")));
        assert!(filter.matches(&record("exm-2024", "s1", "Excel")));
        assert!(!filter.matches(&record("EXM2025", "s1", "Excel")));
        assert!(!filter.is_unbounded());
    }

    #[test]
    fn test_filter_empty_alias_set_matches_nothing() {
        let filter = QuestionFilter::for_paper(PaperAliasSet::default());
        assert!(!filter.matches(&record("EXM2024", "s1", "Excel")));
    }

    #[test]
    fn test_filter_subject_name_is_trimmed_and_case_insensitive() {
        let filter = QuestionFilter::all().with_subject_name("ms excel");
        assert!(filter.matches(&record("X", "s1", "  MS Excel ")));
        assert!(!filter.matches(&record("X", "s1", "MS Excel 2019")));
    }

    #[test]
    fn test_filter_subject_name_folds_ascii_and_spaces_only() {
        let filter = QuestionFilter::all().with_subject_name("ms excel");
        assert!(filter.matches(&record("X", "s1", " MS EXCEL ")));
        assert!(!filter.matches(&record("X", "s1", "\tMS Excel")));

        let accented = QuestionFilter::all().with_subject_name("économie");
        assert!(accented.matches(&record("X", "s1", "éCONOMIE")));
        assert!(!accented.matches(&record("X", "s1", "ÉCONOMIE")));
    }

    #[test]
    fn test_filter_subject_id_is_exact() {
        let filter = QuestionFilter::all().with_subject_id("s1");
        assert!(filter.matches(&record("X", "s1", "Excel")));
        assert!(!filter.matches(&record("X", "S1", "Excel")));
    }

    #[test]
    fn test_question_field_value() {
        let r = record("EXM2024", "s1", "Excel");
        assert_eq!(QuestionField::PaperId.value(&r), "EXM2024");
        assert_eq!(QuestionField::SubjectName.to_string(), "subject_name");
    }
}
