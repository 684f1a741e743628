//! Display and write-time normalization of question content.
//!
//! Display normalization never touches the store; it fills placeholders so a
//! caller always has something to render. Write normalization applies the
//! same placeholders and also canonicalizes the correct option.

use thiserror::Error;

use crate::store::{NewQuestion, OptionLabel, QuestionRecord};
use crate::text::{decode_text, is_missing_question_text};

/// Correct option used when none was supplied.
pub const DEFAULT_CORRECT_OPTION: OptionLabel = OptionLabel::A;

/// A correct option that is not one of `A`..`D`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("question {position}: correct option '{value}' is not one of A, B, C, D")]
pub struct InvalidCorrectOption {
    /// 1-based position of the question.
    pub position: usize,
    /// The value as supplied.
    pub value: String,
}

/// Mutable access to the normalizable fields of a question shape.
pub trait QuestionContent {
    fn question_text_mut(&mut self) -> &mut String;
    fn option_text_mut(&mut self, label: OptionLabel) -> &mut String;
    fn correct_option_mut(&mut self) -> &mut String;
}

impl QuestionContent for QuestionRecord {
    fn question_text_mut(&mut self) -> &mut String {
        &mut self.question_text
    }

    fn option_text_mut(&mut self, label: OptionLabel) -> &mut String {
        self.option_mut(label)
    }

    fn correct_option_mut(&mut self) -> &mut String {
        &mut self.correct_option
    }
}

impl QuestionContent for NewQuestion {
    fn question_text_mut(&mut self) -> &mut String {
        &mut self.question_text
    }

    fn option_text_mut(&mut self, label: OptionLabel) -> &mut String {
        match label {
            OptionLabel::A => &mut self.option_a,
            OptionLabel::B => &mut self.option_b,
            OptionLabel::C => &mut self.option_c,
            OptionLabel::D => &mut self.option_d,
        }
    }

    fn correct_option_mut(&mut self) -> &mut String {
        &mut self.correct_option
    }
}

/// Placeholder text for the question at a 1-based position.
#[must_use]
pub fn question_placeholder(position: usize) -> String {
    format!("Question {position}")
}

/// Decodes text fields and fills placeholders, positions counted from 1.
///
/// Idempotent: normalizing an already normalized list changes nothing.
#[must_use]
pub fn normalize_for_display(records: Vec<QuestionRecord>) -> Vec<QuestionRecord> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, mut record)| {
            decode_fields(&mut record);
            apply_defaults(&mut record, index + 1);
            record
        })
        .collect()
}

/// Decodes, fills placeholders and canonicalizes the correct option in place.
///
/// # Errors
///
/// Returns [`InvalidCorrectOption`] when the correct option is neither blank
/// nor one of `A`..`D`; the item is left decoded but otherwise unchanged.
pub fn normalize_for_write<T: QuestionContent>(
    item: &mut T,
    position: usize,
) -> Result<(), InvalidCorrectOption> {
    decode_fields(item);
    let canonical = canonical_correct_option(item.correct_option_mut(), position)?;
    apply_defaults(item, position);
    *item.correct_option_mut() = canonical.as_str().to_string();
    Ok(())
}

/// Parses a correct option, mapping blank input to the default.
///
/// # Errors
///
/// Returns [`InvalidCorrectOption`] for anything other than blank or `A`..`D`.
pub fn canonical_correct_option(
    raw: &str,
    position: usize,
) -> Result<OptionLabel, InvalidCorrectOption> {
    if raw.trim().is_empty() {
        return Ok(DEFAULT_CORRECT_OPTION);
    }
    OptionLabel::parse(raw).ok_or_else(|| InvalidCorrectOption {
        position,
        value: raw.to_string(),
    })
}

fn decode_fields<T: QuestionContent>(item: &mut T) {
    let text = item.question_text_mut();
    *text = decode_text(text);
    for label in OptionLabel::ALL {
        let option = item.option_text_mut(label);
        *option = decode_text(option);
    }
}

fn apply_defaults<T: QuestionContent>(item: &mut T, position: usize) {
    let text = item.question_text_mut();
    if is_missing_question_text(text) {
        *text = question_placeholder(position);
    }
    for label in OptionLabel::ALL {
        let option = item.option_text_mut(label);
        if option.trim().is_empty() {
            *option = label.placeholder();
        }
    }
    let correct = item.correct_option_mut();
    if correct.trim().is_empty() {
        *correct = DEFAULT_CORRECT_OPTION.as_str().to_string();
    }
}
