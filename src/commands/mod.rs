//! CLI command handlers.

mod paper;
mod repair;
mod replace;
mod resolve;

pub use paper::{run_paper_add_command, run_paper_show_command};
pub use repair::run_repair_command;
pub use replace::run_replace_command;
pub use resolve::run_resolve_command;

use anyhow::{Context, Result};
use serde::Serialize;

/// Prints a value as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON output")?;
    println!("{rendered}");
    Ok(())
}
