//! End-to-end CLI tests for the exambank binary.

#![allow(deprecated)]

use std::path::Path;

use assert_cmd::Command;
use exambank_core::resolution::DEFAULT_SAMPLE_SIZE;
use exambank_core::{Database, NewQuestion, QuestionStore, SqliteQuestionStore};
use predicates::prelude::*;
use tempfile::TempDir;

/// Builds a command isolated from the user's config and data directories.
fn exambank(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("exambank").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(home.join("bank.db"));
    cmd
}

fn write_questions(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

const THREE_QUESTIONS: &str = r#"[
  {"questionText": "What is a cell?", "optionA": "box", "optionB": "row", "optionC": "col", "optionD": "sheet", "correctOption": "a"},
  {"question": "What is a formula?", "correctAnswer": "C"},
  {"questionText": "", "optionA": "x"},
  {"questionText": "What is a chart?"}
]"#;

#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("exambank").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolve and upload exam question banks"));
}

#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("exambank").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("exambank"));
}

#[test]
fn test_binary_without_subcommand_fails() {
    let mut cmd = Command::cargo_bin("exambank").unwrap();
    cmd.assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_replace_then_resolve_round_trip() {
    let temp = TempDir::new().unwrap();
    let file = write_questions(temp.path(), "excel.json", THREE_QUESTIONS);

    exambank(temp.path())
        .args(["replace", "--paper", "EXM2024", "--subject-id", "s1"])
        .args(["--subject-name", "MS Excel", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""insertedCount": 3"#))
        .stdout(predicate::str::contains(r#""skippedCount": 1"#));

    exambank(temp.path())
        .args(["resolve", "--paper", "EXM2024", "--subject", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""status": "found""#))
        .stdout(predicate::str::contains(r#""strategy": "exact_subject_id""#))
        .stdout(predicate::str::contains("Option D"));
}

#[test]
fn test_resolve_not_found_exits_with_two_and_prints_diagnostic() {
    let temp = TempDir::new().unwrap();
    let file = write_questions(temp.path(), "excel.json", THREE_QUESTIONS);
    exambank(temp.path())
        .args(["replace", "-p", "EXM2024", "--subject-id", "s1"])
        .args(["--subject-name", "MS Excel", "-f"])
        .arg(&file)
        .assert()
        .success();

    exambank(temp.path())
        .args(["resolve", "-p", "EXM2024", "-s", "s9", "--subject-name", "Tally"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(r#""status": "notFound""#))
        .stdout(predicate::str::contains("MS Excel"));
}

#[test]
fn test_resolve_not_found_samples_default_count_without_config() {
    let temp = TempDir::new().unwrap();
    let body = serde_json::to_string(
        &(0..8)
            .map(|i| serde_json::json!({"questionText": format!("q{i}"), "correctOption": "A"}))
            .collect::<Vec<_>>(),
    )
    .unwrap();
    let file = write_questions(temp.path(), "many.json", &body);
    exambank(temp.path())
        .args(["replace", "-p", "EXM2024", "--subject-id", "s1"])
        .args(["--subject-name", "MS Excel", "-f"])
        .arg(&file)
        .assert()
        .success();

    let output = exambank(temp.path())
        .args(["resolve", "-p", "EXM2024", "-s", "s9", "--subject-name", "Tally"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let samples = report["diagnostic"]["sampleQuestions"].as_array().unwrap();
    assert_eq!(samples.len(), DEFAULT_SAMPLE_SIZE as usize);
}

#[test]
fn test_replace_with_only_blank_questions_fails() {
    let temp = TempDir::new().unwrap();
    let file = write_questions(temp.path(), "blank.json", r#"[{"questionText": "  "}]"#);

    exambank(temp.path())
        .args(["replace", "-p", "EXM2024", "--subject-id", "s1"])
        .args(["--subject-name", "MS Excel", "-f"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid question upload"));
}

#[test]
fn test_replace_with_malformed_file_fails() {
    let temp = TempDir::new().unwrap();
    let file = write_questions(temp.path(), "bad.json", "{not json");

    exambank(temp.path())
        .args(["replace", "-p", "EXM2024", "--subject-id", "s1", "-f"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse question file"));
}

#[test]
fn test_paper_add_then_show_by_alias() {
    let temp = TempDir::new().unwrap();

    exambank(temp.path())
        .args(["paper", "add", "-p", "EXM2024", "--title", "Office Automation"])
        .args(["-s", "s1=MS Excel", "-s", "s2=MS Word"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""paperId": "EXM2024""#));

    exambank(temp.path())
        .args(["paper", "show", "-p", "P2024"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MS Word"));
}

#[test]
fn test_paper_show_unknown_fails() {
    let temp = TempDir::new().unwrap();

    exambank(temp.path())
        .args(["paper", "show", "-p", "NOPE1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not registered"));
}

#[test]
fn test_repair_reports_counts() {
    let temp = TempDir::new().unwrap();
    let file = write_questions(temp.path(), "excel.json", THREE_QUESTIONS);
    exambank(temp.path())
        .args(["replace", "-p", "EXM2024", "--subject-id", "s1"])
        .args(["--subject-name", "MS Excel", "-f"])
        .arg(&file)
        .assert()
        .success();

    exambank(temp.path())
        .args(["repair", "-p", "EXM2024", "--subject-id", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""examined": 3"#))
        .stdout(predicate::str::contains(r#""updated": 0"#));
}

#[test]
fn test_invalid_config_file_fails() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("exambank.toml");
    std::fs::write(&config, "diagnostic_sample_size = 500\n").unwrap();

    exambank(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["paper", "show", "-p", "EXM2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("diagnostic_sample_size"));
}

#[test]
fn test_resolve_finds_legacy_rows_under_aliased_paper_code() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("bank.db");
    tokio_test::block_on(async {
        let db = Database::new(&db_path).await.unwrap();
        let store = SqliteQuestionStore::new(db.clone());
        store
            .insert_many(&[
                NewQuestion::new("P2024", "legacy-7", "Computer Fundamentals", "What is RAM?"),
                NewQuestion::new("P2024", "legacy-7", "Computer Fundamentals", "What is ROM?"),
            ])
            .await
            .unwrap();
        db.close().await;
    });

    exambank(temp.path())
        .args(["resolve", "-p", "EXM2024", "-s", "s1"])
        .args(["--subject-name", "Computer Fundamental"])
        .assert()
        .success()
        .stdout(predicate::str::contains("What is ROM?"))
        .stdout(predicate::str::contains(r#""paperId": "P2024""#));
}
