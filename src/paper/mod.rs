//! Exam papers and their subject lists.
//!
//! - [`ExamPaper`] - A registered paper with its ordered [`SubjectSpec`] list
//! - [`PaperAliasSet`] - The stored forms one paper identifier may take

mod alias;

pub use alias::{CODE_PREFIX_CHARS, PaperAliasSet, PaperCondition, code_suffix, truncated_code};

use serde::{Deserialize, Serialize};

/// A subject examined by a paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSpec {
    /// Opaque subject id (store id or free-form code).
    pub subject_id: String,
    /// Free-text subject name; spelling varies between papers.
    pub subject_name: String,
}

impl SubjectSpec {
    /// Creates a subject spec.
    #[must_use]
    pub fn new(subject_id: impl Into<String>, subject_name: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            subject_name: subject_name.into(),
        }
    }
}

/// A registered exam paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamPaper {
    /// Store id; `0` until the paper is saved.
    #[serde(default)]
    pub id: i64,
    /// Human-readable paper code.
    pub paper_id: String,
    /// Optional display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Subjects in display order.
    #[serde(default)]
    pub subjects: Vec<SubjectSpec>,
}

impl ExamPaper {
    /// Creates an unsaved paper with no subjects.
    #[must_use]
    pub fn new(paper_id: impl Into<String>) -> Self {
        Self {
            id: 0,
            paper_id: paper_id.into(),
            title: None,
            subjects: Vec::new(),
        }
    }

    /// Adds a subject, builder style.
    #[must_use]
    pub fn with_subject(
        mut self,
        subject_id: impl Into<String>,
        subject_name: impl Into<String>,
    ) -> Self {
        self.subjects.push(SubjectSpec::new(subject_id, subject_name));
        self
    }

    /// Sets the title, builder style.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Finds a subject by exact (trimmed) subject id.
    #[must_use]
    pub fn subject_by_id(&self, subject_id: &str) -> Option<&SubjectSpec> {
        let subject_id = subject_id.trim();
        self.subjects
            .iter()
            .find(|spec| spec.subject_id.trim() == subject_id)
    }

    /// Finds a subject whose name equals `name`, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn subject_by_name(&self, name: &str) -> Option<&SubjectSpec> {
        let wanted = name.trim().to_lowercase();
        self.subjects
            .iter()
            .find(|spec| spec.subject_name.trim().to_lowercase() == wanted)
    }

    /// Returns the alias set for this paper's code, plus its store id when saved.
    #[must_use]
    pub fn alias_set(&self) -> PaperAliasSet {
        let mut set = PaperAliasSet::from_identifier(&self.paper_id);
        if self.id > 0 {
            set.merge(&PaperAliasSet::from_identifier(&self.id.to_string()).exact_forms());
        }
        set
    }
}
