//! CLI entry point for the exambank tool.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use exambank_core::resolution::DEFAULT_SAMPLE_SIZE;
use exambank_core::{Database, DatabaseOptions, QuestionBank, SubjectCatalog, SubjectMatcher};
use tracing::{debug, info};

mod cli;
mod commands;
mod config;

use cli::{Args, Command, PaperCommand};
use config::{LoadedConfig, load_config, resolve_default_database_path};

/// Exit status of `resolve` when no strategy found questions.
const EXIT_NOT_FOUND: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let loaded = load_config(args.config.as_deref())?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => loaded
                .config
                .verbosity
                .map_or("info", config::VerbositySetting::level),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "config file loaded");
    }

    let bank = open_bank(&args, &loaded).await?;

    match &args.command {
        Command::Resolve(resolve) => {
            if !commands::run_resolve_command(&bank, resolve).await? {
                return Ok(ExitCode::from(EXIT_NOT_FOUND));
            }
        }
        Command::Replace(replace) => commands::run_replace_command(&bank, replace).await?,
        Command::Repair(repair) => commands::run_repair_command(&bank, repair).await?,
        Command::Paper { command } => match command {
            PaperCommand::Add {
                paper,
                title,
                subjects,
            } => commands::run_paper_add_command(&bank, paper, title.as_deref(), subjects).await?,
            PaperCommand::Show { paper } => commands::run_paper_show_command(&bank, paper).await?,
        },
    }

    Ok(ExitCode::SUCCESS)
}

/// Opens the database and subject catalog named by flags, config or defaults.
async fn open_bank(args: &Args, loaded: &LoadedConfig) -> Result<QuestionBank> {
    let config = &loaded.config;

    let db_path: PathBuf = args
        .db
        .clone()
        .or_else(|| config.database_path.clone())
        .unwrap_or_else(resolve_default_database_path);
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory '{}'", parent.display())
        })?;
    }

    let mut options = DatabaseOptions::default();
    if let Some(max_connections) = config.db_max_connections {
        options.max_connections = max_connections;
    }
    if let Some(busy_timeout_ms) = config.db_busy_timeout_ms {
        options.busy_timeout_ms = busy_timeout_ms;
    }

    let db = Database::new_with_options(&db_path, options)
        .await
        .with_context(|| format!("Failed to open database '{}'", db_path.display()))?;
    info!(path = %db_path.display(), "database ready");

    let catalog = match args.catalog.as_ref().or(config.subject_catalog.as_ref()) {
        Some(path) => SubjectCatalog::from_json_file(path)
            .with_context(|| format!("Failed to load subject catalog '{}'", path.display()))?,
        None => SubjectCatalog::default(),
    };

    Ok(QuestionBank::sqlite(
        db,
        SubjectMatcher::new(catalog),
        config.diagnostic_sample_size.unwrap_or(DEFAULT_SAMPLE_SIZE),
    ))
}
