//! Replace command handler: upload one subject's question bank from JSON.

use std::fs;

use anyhow::{Context, Result};
use exambank_core::{QuestionBank, QuestionInput, ReplaceRequest};
use tracing::{error, info};

use super::print_json;
use crate::cli::ReplaceArgs;

pub async fn run_replace_command(bank: &QuestionBank, args: &ReplaceArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read question file '{}'", args.file.display()))?;
    let questions: Vec<QuestionInput> = serde_json::from_str(&raw).with_context(|| {
        format!(
            "Failed to parse question file '{}' as a JSON array of questions",
            args.file.display()
        )
    })?;
    info!(count = questions.len(), file = %args.file.display(), "questions loaded");

    let request = ReplaceRequest::new(
        &args.paper,
        &args.subject_id,
        args.subject_name.clone().unwrap_or_default(),
        questions,
    );
    let outcome = match bank.replace_question_bank(request).await {
        Ok(outcome) => outcome,
        Err(err) => {
            if err.is_partial() {
                error!(
                    paper = %args.paper,
                    subject_id = %args.subject_id,
                    "subject bank left incomplete; re-run this upload"
                );
            }
            return Err(err).context("Question bank replace failed");
        }
    };

    print_json(&outcome)
}
