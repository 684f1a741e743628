//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Resolve and upload exam question banks.
///
/// Exambank finds the questions of one subject of one exam paper even when
/// paper codes and subject names drift between uploads, and replaces a
/// subject's bank without leaving it silently empty.
#[derive(Parser, Debug)]
#[command(name = "exambank")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: $XDG_CONFIG_HOME/exambank/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides config `database_path`)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Subject catalog JSON (overrides config `subject_catalog`)
    #[arg(long, global = true, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the questions of one subject of one paper
    Resolve(ResolveArgs),

    /// Replace one subject's question bank from a JSON file
    Replace(ReplaceArgs),

    /// Persist placeholder defaults into one subject's stored questions
    Repair(RepairArgs),

    /// Register and inspect exam papers
    Paper {
        #[command(subcommand)]
        command: PaperCommand,
    },
}

/// Arguments for `exambank resolve`.
#[derive(ClapArgs, Debug)]
pub struct ResolveArgs {
    /// Paper code, store id, or alias form
    #[arg(short, long)]
    pub paper: String,

    /// Subject id or subject name
    #[arg(short, long)]
    pub subject: String,

    /// Explicit target subject name
    #[arg(long, value_name = "NAME")]
    pub subject_name: Option<String>,

    /// Only exact id and exact name matches
    #[arg(long)]
    pub exact: bool,
}

/// Arguments for `exambank replace`.
#[derive(ClapArgs, Debug)]
pub struct ReplaceArgs {
    /// Paper code the bank belongs to
    #[arg(short, long)]
    pub paper: String,

    /// Subject id the bank belongs to
    #[arg(long)]
    pub subject_id: String,

    /// Subject name (defaults to the registered paper's subject)
    #[arg(long, value_name = "NAME")]
    pub subject_name: Option<String>,

    /// JSON array of questions (`questionText`, `optionA`..`optionD`, `correctOption`)
    #[arg(short, long, value_name = "PATH")]
    pub file: PathBuf,
}

/// Arguments for `exambank repair`.
#[derive(ClapArgs, Debug)]
pub struct RepairArgs {
    /// Paper code the bank belongs to
    #[arg(short, long)]
    pub paper: String,

    /// Subject id the bank belongs to
    #[arg(long)]
    pub subject_id: String,
}

/// `exambank paper` subcommands.
#[derive(Subcommand, Debug)]
pub enum PaperCommand {
    /// Register a paper or replace its subject list
    Add {
        /// Paper code
        #[arg(short, long)]
        paper: String,

        /// Display title
        #[arg(long)]
        title: Option<String>,

        /// Subject as `id=name`; repeat for each subject
        #[arg(short, long = "subject", value_name = "ID=NAME", value_parser = parse_subject_pair)]
        subjects: Vec<(String, String)>,
    },

    /// Show a registered paper
    Show {
        /// Paper code, store id, or alias form
        #[arg(short, long)]
        paper: String,
    },
}

fn parse_subject_pair(raw: &str) -> Result<(String, String), String> {
    let Some((id, name)) = raw.split_once('=') else {
        return Err(format!("expected ID=NAME, got '{raw}'"));
    };
    let id = id.trim();
    let name = name.trim();
    if id.is_empty() || name.is_empty() {
        return Err(format!("subject id and name must be non-empty in '{raw}'"));
    }
    Ok((id.to_string(), name.to_string()))
}
