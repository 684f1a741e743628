//! Paper identifier normalization.
//!
//! One logical exam paper is stored under several spellings: the raw code
//! (`EXM2024`), the code without its alphabetic prefix (`2024`), and a
//! truncated `P`-prefixed form (`P2024`). [`PaperAliasSet`] expands an
//! identifier into the ordered conditions a store should try.

use std::fmt;

/// Characters stripped from the front of a paper code to obtain its suffix.
///
/// Shared with the SQL `ltrim` charset so store-side and in-process stripping agree.
pub const CODE_PREFIX_CHARS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_/. ";

/// Number of trailing characters kept by the truncated-code convention.
const TRUNCATED_CODE_LEN: usize = 4;

/// Prefix used by the truncated-code convention.
const TRUNCATED_CODE_PREFIX: char = 'P';

/// A single way a stored `paper_id` may equal the requested paper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaperCondition {
    /// Stored paper id equals this value.
    Exact(String),
    /// Stored paper id, with its alphabetic prefix stripped and upper-cased, equals this value.
    Suffix(String),
    /// Stored paper id equals this synthesized `P<last 4>` code.
    Truncated(String),
}

impl PaperCondition {
    /// Returns the value the condition compares against.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Exact(value) | Self::Suffix(value) | Self::Truncated(value) => value,
        }
    }

    /// Returns true for conditions that compare the stored id by equality.
    #[must_use]
    pub fn is_equality(&self) -> bool {
        matches!(self, Self::Exact(_) | Self::Truncated(_))
    }

    /// Returns true when a stored paper id satisfies this condition.
    #[must_use]
    pub fn matches_stored(&self, stored_paper_id: &str) -> bool {
        match self {
            Self::Exact(value) | Self::Truncated(value) => stored_paper_id == value,
            Self::Suffix(value) => code_suffix(stored_paper_id).as_deref() == Some(value),
        }
    }

    fn same_lookup(&self, other: &Self) -> bool {
        self.is_equality() == other.is_equality() && self.value() == other.value()
    }
}

impl fmt::Display for PaperCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(value) => write!(f, "exact:{value}"),
            Self::Suffix(value) => write!(f, "suffix:{value}"),
            Self::Truncated(value) => write!(f, "truncated:{value}"),
        }
    }
}

/// Ordered, duplicate-free set of conditions for one logical paper.
///
/// Order defines precedence downstream: exact first, then suffix, then truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperAliasSet {
    conditions: Vec<PaperCondition>,
}

impl PaperAliasSet {
    /// Expands a paper identifier into its alias conditions.
    ///
    /// A blank identifier yields an empty set. An all-letter identifier has no
    /// suffix form; that condition is left out rather than failing.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Self {
        let mut set = Self::default();
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return set;
        }

        set.push(PaperCondition::Exact(trimmed.to_string()));
        if let Some(suffix) = code_suffix(trimmed) {
            set.push(PaperCondition::Suffix(suffix));
        }
        set.push(PaperCondition::Truncated(truncated_code(trimmed)));
        set
    }

    /// Appends the conditions of `other` that are not already present.
    pub fn merge(&mut self, other: &PaperAliasSet) {
        for condition in &other.conditions {
            self.push(condition.clone());
        }
    }

    /// Returns the conditions in precedence order.
    #[must_use]
    pub fn conditions(&self) -> &[PaperCondition] {
        &self.conditions
    }

    /// Returns only the literal paper codes (no suffix or truncated forms).
    #[must_use]
    pub fn exact_forms(&self) -> PaperAliasSet {
        Self {
            conditions: self
                .conditions
                .iter()
                .filter(|condition| matches!(condition, PaperCondition::Exact(_)))
                .cloned()
                .collect(),
        }
    }

    /// Returns true when a stored paper id satisfies any condition.
    #[must_use]
    pub fn matches_stored(&self, stored_paper_id: &str) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.matches_stored(stored_paper_id))
    }

    /// Returns true when the set holds no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns the number of conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Returns display labels such as `exact:EXM2024` for diagnostics.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.conditions.iter().map(ToString::to_string).collect()
    }

    fn push(&mut self, condition: PaperCondition) {
        if !self
            .conditions
            .iter()
            .any(|existing| existing.same_lookup(&condition))
        {
            self.conditions.push(condition);
        }
    }
}

/// Strips the leading letters and separators of a paper code and upper-cases the rest.
///
/// Returns `None` when nothing remains.
#[must_use]
pub fn code_suffix(code: &str) -> Option<String> {
    let suffix = code
        .trim()
        .trim_start_matches(|c: char| CODE_PREFIX_CHARS.contains(c));
    if suffix.is_empty() {
        None
    } else {
        Some(suffix.to_ascii_uppercase())
    }
}

/// Builds the `P<last 4 chars>` code used by the truncation convention.
#[must_use]
pub fn truncated_code(code: &str) -> String {
    let chars: Vec<char> = code.trim().chars().collect();
    let start = chars.len().saturating_sub(TRUNCATED_CODE_LEN);
    let tail: String = chars[start..].iter().collect();
    format!("{TRUNCATED_CODE_PREFIX}{tail}")
}
