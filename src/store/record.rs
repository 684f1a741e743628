//! Question record types: stored rows, insert shapes and upload input.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Labels of the four answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    /// All labels in display order.
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Returns the single-letter form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Returns the placeholder shown when the option text is missing.
    #[must_use]
    pub fn placeholder(self) -> String {
        format!("Option {}", self.as_str())
    }

    /// Parses `a`..`d` (any case, surrounding whitespace ignored).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    /// Store id.
    pub id: i64,
    /// Paper code the question was uploaded under.
    pub paper_id: String,
    /// Subject id the question was uploaded under.
    pub subject_id: String,
    /// Subject name as typed at upload time.
    pub subject_name: String,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    /// Expected `A`..`D`; may be blank in legacy rows.
    pub correct_option: String,
    /// When the row was inserted.
    pub created_at: String,
}

impl QuestionRecord {
    /// Returns the text of one option.
    #[must_use]
    pub fn option(&self, label: OptionLabel) -> &str {
        match label {
            OptionLabel::A => &self.option_a,
            OptionLabel::B => &self.option_b,
            OptionLabel::C => &self.option_c,
            OptionLabel::D => &self.option_d,
        }
    }

    /// Returns a mutable reference to one option.
    pub fn option_mut(&mut self, label: OptionLabel) -> &mut String {
        match label {
            OptionLabel::A => &mut self.option_a,
            OptionLabel::B => &mut self.option_b,
            OptionLabel::C => &mut self.option_c,
            OptionLabel::D => &mut self.option_d,
        }
    }
}

/// Insert shape for a question row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub paper_id: String,
    pub subject_id: String,
    pub subject_name: String,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_option: String,
}

impl NewQuestion {
    /// Creates a question with blank options and no correct option.
    #[must_use]
    pub fn new(
        paper_id: impl Into<String>,
        subject_id: impl Into<String>,
        subject_name: impl Into<String>,
        question_text: impl Into<String>,
    ) -> Self {
        Self {
            paper_id: paper_id.into(),
            subject_id: subject_id.into(),
            subject_name: subject_name.into(),
            question_text: question_text.into(),
            option_a: String::new(),
            option_b: String::new(),
            option_c: String::new(),
            option_d: String::new(),
            correct_option: String::new(),
        }
    }

    /// Sets all four options, builder style.
    #[must_use]
    pub fn with_options(mut self, a: &str, b: &str, c: &str, d: &str) -> Self {
        self.option_a = a.to_string();
        self.option_b = b.to_string();
        self.option_c = c.to_string();
        self.option_d = d.to_string();
        self
    }

    /// Sets the correct option, builder style.
    #[must_use]
    pub fn with_correct(mut self, correct_option: &str) -> Self {
        self.correct_option = correct_option.to_string();
        self
    }
}

/// One question as supplied by an upload.
///
/// Every field is optional; missing fields deserialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionInput {
    #[serde(alias = "question")]
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    #[serde(alias = "answer", alias = "correctAnswer")]
    pub correct_option: String,
}

impl QuestionInput {
    /// Creates an input with the given text and options.
    #[must_use]
    pub fn new(question_text: &str, options: [&str; 4], correct_option: &str) -> Self {
        Self {
            question_text: question_text.to_string(),
            option_a: options[0].to_string(),
            option_b: options[1].to_string(),
            option_c: options[2].to_string(),
            option_d: options[3].to_string(),
            correct_option: correct_option.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_option_label_parse() {
        assert_eq!(OptionLabel::parse(" b "), Some(OptionLabel::B));
        assert_eq!(OptionLabel::parse("D"), Some(OptionLabel::D));
        assert_eq!(OptionLabel::parse("E"), None);
        assert_eq!(OptionLabel::parse(""), None);
    }

    #[test]
    fn test_option_label_placeholder() {
        assert_eq!(OptionLabel::C.placeholder(), "Option C");
    }

    #[test]
    fn test_question_input_accepts_aliases_and_missing_fields() {
        let input: QuestionInput =
            serde_json::from_str(r#"{"question":"What is RAM?","optionA":"Memory","answer":"a"}"#)
                .unwrap();

        assert_eq!(input.question_text, "What is RAM?");
        assert_eq!(input.option_a, "Memory");
        assert_eq!(input.option_b, "");
        assert_eq!(input.correct_option, "a");
    }

    #[test]
    fn test_question_record_serializes_camel_case() {
        let record = QuestionRecord {
            id: 1,
            paper_id: "EXM2024".to_string(),
            subject_id: "s1".to_string(),
            subject_name: "Excel".to_string(),
            question_text: "Q".to_string(),
            option_a: "a".to_string(),
            option_b: "b".to_string(),
            option_c: "c".to_string(),
            option_d: "d".to_string(),
            correct_option: "A".to_string(),
            created_at: "2026-01-01 00:00:00".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["paperId"], "EXM2024");
        assert_eq!(json["correctOption"], "A");
        assert_eq!(record.option(OptionLabel::D), "d");
    }
}
