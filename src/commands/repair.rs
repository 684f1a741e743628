//! Repair command handler.

use anyhow::{Context, Result};
use exambank_core::QuestionBank;

use super::print_json;
use crate::cli::RepairArgs;

pub async fn run_repair_command(bank: &QuestionBank, args: &RepairArgs) -> Result<()> {
    let outcome = bank
        .repair_question_bank(&args.paper, &args.subject_id)
        .await
        .context("Question bank repair failed")?;
    print_json(&outcome)
}
