//! Injectable subject vocabulary: synonym table and mutually exclusive categories.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// Errors raised while loading a subject catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("cannot read subject catalog '{path}': {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not valid JSON for a catalog.
    #[error("cannot parse subject catalog '{path}': {source}")]
    Parse {
        /// Path that failed.
        path: String,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },

    /// A category or synonym entry is unusable.
    #[error(
        "invalid subject catalog: {0}\n  Suggestion: category names and aliases must be non-empty lowercase text"
    )]
    Invalid(String),
}

/// A bucket of subject names that never match names from another bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCategory {
    /// Category label, e.g. `excel`.
    pub name: String,
    /// Substrings that place a normalized subject name in this category.
    pub aliases: Vec<String>,
}

impl SubjectCategory {
    fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|alias| (*alias).to_string()).collect(),
        }
    }
}

/// Synonym map plus ordered category table used by the subject matcher.
///
/// Categories are checked in order; the first one with a matching alias wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCatalog {
    /// Token-level rewrites applied during normalization (`fundamentals` -> `fundamental`).
    #[serde(default)]
    pub synonyms: BTreeMap<String, String>,
    /// Mutually exclusive categories, in classification order.
    #[serde(default)]
    pub categories: Vec<SubjectCategory>,
}

impl Default for SubjectCatalog {
    fn default() -> Self {
        let synonyms = [
            ("fundamentals", "fundamental"),
            ("fundamentle", "fundamental"),
            ("fundamantal", "fundamental"),
            ("fundamentel", "fundamental"),
            ("mathematics", "math"),
            ("maths", "math"),
            ("ppt", "powerpoint"),
            ("msexcel", "excel"),
            ("msword", "word"),
            ("networks", "network"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        let categories = vec![
            SubjectCategory::new("powerpoint", &["powerpoint", "power point", "presentation"]),
            SubjectCategory::new("excel", &["excel", "spreadsheet"]),
            SubjectCategory::new("word", &["word"]),
            SubjectCategory::new("fundamental", &["fundamental"]),
            SubjectCategory::new(
                "computer",
                &["network", "hardware", "programming", "architecture"],
            ),
            SubjectCategory::new("internet", &["internet", "email", "web"]),
            SubjectCategory::new("windows", &["windows", "operating system"]),
        ];

        Self {
            synonyms,
            categories,
        }
    }
}

impl SubjectCatalog {
    /// Creates a catalog with no synonyms and no categories.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            synonyms: BTreeMap::new(),
            categories: Vec::new(),
        }
    }

    /// Loads a catalog override from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the file is unreadable, malformed, or fails validation.
    #[instrument(fields(path = %path.display()))]
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog: Self = serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        catalog.validated()
    }

    /// Lower-cases every entry and rejects blank names or aliases.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Invalid`] naming the offending entry.
    pub fn validated(self) -> Result<Self, CatalogError> {
        let mut synonyms = BTreeMap::new();
        for (from, to) in self.synonyms {
            let from = from.trim().to_lowercase();
            let to = to.trim().to_lowercase();
            if from.is_empty() || to.is_empty() || from.contains(char::is_whitespace) {
                return Err(CatalogError::Invalid(format!(
                    "synonym '{from}' -> '{to}' must map one word to a non-empty replacement"
                )));
            }
            synonyms.insert(from, to);
        }

        let mut categories = Vec::with_capacity(self.categories.len());
        for category in self.categories {
            let name = category.name.trim().to_lowercase();
            if name.is_empty() {
                return Err(CatalogError::Invalid("category with blank name".to_string()));
            }
            let aliases: Vec<String> = category
                .aliases
                .iter()
                .map(|alias| alias.trim().to_lowercase())
                .collect();
            if aliases.is_empty() || aliases.iter().any(String::is_empty) {
                return Err(CatalogError::Invalid(format!(
                    "category '{name}' needs at least one non-blank alias"
                )));
            }
            categories.push(SubjectCategory { name, aliases });
        }

        Ok(Self {
            synonyms,
            categories,
        })
    }

    /// Returns the synonym replacement for a normalized token, if any.
    #[must_use]
    pub fn synonym(&self, token: &str) -> Option<&str> {
        self.synonyms.get(token).map(String::as_str)
    }
}
