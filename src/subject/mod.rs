//! Subject name matching.
//!
//! Subject names drift between upload sessions ("Computer Fundamentals",
//! "computer fundamentle", "MS Excel 2019"). [`SubjectMatcher`] decides
//! whether two names denote the same subject using normalization, a
//! category-conflict guard, containment and word overlap. The vocabulary it
//! relies on lives in an injectable [`SubjectCatalog`].

mod catalog;
mod matcher;

pub use catalog::{CatalogError, SubjectCatalog, SubjectCategory};
pub use matcher::{ClosestSubject, MatchSignal, SubjectMatcher};
