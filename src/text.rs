//! Text helpers shared by resolution and ingestion: percent decoding and
//! placeholder detection.

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder some upload paths store instead of an empty question.
pub const QUESTION_TEXT_SENTINEL: &str = "Question text not available";

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static PERCENT_SEQUENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"%[0-9A-Fa-f]{2}"));

/// Decodes percent-encoded text, including text that was encoded twice.
///
/// Decodes to a fixed point, so `decode_text(&decode_text(s)) == decode_text(s)`.
/// Decoding stops when no `%XX` sequence remains, when a round changes
/// nothing, or when a round would produce invalid UTF-8 (the last valid
/// form is kept). Every round that changes the text shortens it.
#[must_use]
pub fn decode_text(raw: &str) -> String {
    let mut current = raw.to_string();

    loop {
        if !PERCENT_SEQUENCE_RE.is_match(&current) {
            break;
        }
        match urlencoding::decode(&current) {
            Ok(decoded) if decoded.as_ref() != current.as_str() => {
                current = decoded.into_owned();
            }
            _ => break,
        }
    }

    current
}

/// Returns true when a question's text is blank or the "not available" placeholder.
#[must_use]
pub fn is_missing_question_text(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(QUESTION_TEXT_SENTINEL)
}
