//! Resolve command handler: print the questions of one subject or a diagnostic.

use anyhow::{Context, Result};
use exambank_core::{QuestionBank, ResolutionQuery, ResolutionResult};
use tracing::warn;

use super::print_json;
use crate::cli::ResolveArgs;

/// Runs `exambank resolve`; returns whether questions were found.
pub async fn run_resolve_command(bank: &QuestionBank, args: &ResolveArgs) -> Result<bool> {
    let mut query = ResolutionQuery::new(&args.paper, &args.subject).exact(args.exact);
    if let Some(name) = &args.subject_name {
        query = query.with_subject_name(name);
    }

    let result = bank
        .resolve(&query)
        .await
        .with_context(|| format!("Failed to resolve questions for paper '{}'", args.paper))?;

    if let ResolutionResult::NotFound { diagnostic } = &result {
        warn!(
            paper = %args.paper,
            subject = %args.subject,
            available = ?diagnostic.available_subject_names,
            "no matching questions"
        );
    }
    print_json(&result)?;
    Ok(result.is_found())
}
