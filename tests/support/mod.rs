//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod memory_store;

pub use memory_store::MemoryStore;

use exambank_core::QuestionInput;

/// Builds `count` uploadable questions with distinct texts.
pub fn inputs(prefix: &str, count: usize) -> Vec<QuestionInput> {
    (1..=count)
        .map(|i| QuestionInput::new(&format!("{prefix} question {i}"), ["a", "b", "c", "d"], "C"))
        .collect()
}
