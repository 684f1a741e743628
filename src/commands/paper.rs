//! Paper command handlers: register and show exam papers.

use anyhow::{Context, Result, bail};
use exambank_core::{ExamPaper, QuestionBank};

use super::print_json;

pub async fn run_paper_add_command(
    bank: &QuestionBank,
    paper_id: &str,
    title: Option<&str>,
    subjects: &[(String, String)],
) -> Result<()> {
    let mut paper = ExamPaper::new(paper_id);
    if let Some(title) = title {
        paper = paper.with_title(title);
    }
    for (subject_id, subject_name) in subjects {
        paper = paper.with_subject(subject_id, subject_name);
    }

    let saved = bank
        .register_paper(&paper)
        .await
        .with_context(|| format!("Failed to register paper '{paper_id}'"))?;
    print_json(&saved)
}

pub async fn run_paper_show_command(bank: &QuestionBank, paper_id: &str) -> Result<()> {
    let Some(paper) = bank
        .find_paper(paper_id)
        .await
        .with_context(|| format!("Failed to look up paper '{paper_id}'"))?
    else {
        bail!("Paper '{paper_id}' is not registered\n  Suggestion: Register it with `exambank paper add`");
    };
    print_json(&paper)
}
