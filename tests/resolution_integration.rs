//! Integration tests for question resolution across drifting paper codes and subject names.

mod support;

use std::sync::Arc;

use exambank_core::{
    Database, ExamPaper, NewQuestion, QuestionBank, ResolutionQuery, ResolveError, StrategyKind,
    SubjectMatcher,
};
use support::MemoryStore;

async fn sqlite_bank() -> QuestionBank {
    QuestionBank::sqlite(
        Database::new_in_memory().await.unwrap(),
        SubjectMatcher::default(),
        3,
    )
}

async fn seed(bank: &QuestionBank, paper: &str, subject_id: &str, name: &str, count: usize) {
    let questions: Vec<NewQuestion> = (1..=count)
        .map(|i| {
            NewQuestion::new(paper, subject_id, name, format!("{name} {i}"))
                .with_options("a", "b", "c", "d")
                .with_correct("B")
        })
        .collect();
    bank.store().insert_many(&questions).await.unwrap();
}

#[tokio::test]
async fn test_aliased_paper_and_misspelled_subject_reach_best_available() {
    let bank = sqlite_bank().await;
    bank.register_paper(&ExamPaper::new("EXM2024").with_subject("s1", "Computer Fundamental"))
        .await
        .unwrap();
    seed(&bank, "P2024", "legacy-7", "Computer Fundamentle", 9).await;
    // One row with every field blank to check display defaults.
    bank.store()
        .insert_many(&[NewQuestion::new("P2024", "legacy-7", "Computer Fundamentle", "")])
        .await
        .unwrap();

    let result = bank.resolve_questions("EXM2024", "s1", false).await.unwrap();

    assert_eq!(result.strategy(), Some(StrategyKind::BestAvailableSubject));
    let questions = result.questions().unwrap();
    assert_eq!(questions.len(), 10);
    let blank = &questions[9];
    assert_eq!(blank.question_text, "Question 10");
    assert_eq!(blank.option_a, "Option A");
    assert_eq!(blank.option_d, "Option D");
    assert_eq!(blank.correct_option, "A");
    assert_eq!(questions[0].correct_option, "B");
}

#[tokio::test]
async fn test_larger_subject_wins_and_subjects_never_merge() {
    let bank = sqlite_bank().await;
    seed(&bank, "EXM2024", "cf", "Computer Fundamental", 4).await;
    seed(&bank, "EXM2024", "cn", "Computer Networks", 9).await;

    let query = ResolutionQuery::new("EXM2024", "s9").with_subject_name("Computer Basics");
    let result = bank.resolve(&query).await.unwrap();

    assert_eq!(result.strategy(), Some(StrategyKind::BestAvailableSubject));
    let questions = result.questions().unwrap();
    assert_eq!(questions.len(), 9);
    assert!(questions.iter().all(|q| q.subject_name == "Computer Networks"));
}

#[tokio::test]
async fn test_subject_id_takes_precedence_over_fuzzy_name() {
    let bank = sqlite_bank().await;
    bank.register_paper(&ExamPaper::new("EXM2024").with_subject("s1", "MS Excel"))
        .await
        .unwrap();
    seed(&bank, "EXM2024", "s1", "Excel basics", 3).await;
    seed(&bank, "EXM2024", "s7", "MS Excel 2019", 6).await;

    let result = bank.resolve_questions("EXM2024", "s1", false).await.unwrap();

    assert_eq!(result.strategy(), Some(StrategyKind::ExactSubjectId));
    let questions = result.questions().unwrap();
    assert_eq!(questions.len(), 3);
    assert!(questions.iter().all(|q| q.subject_id == "s1"));
}

#[tokio::test]
async fn test_subject_name_equality_ignores_case_and_whitespace() {
    let bank = sqlite_bank().await;
    seed(&bank, "EXM2024", "old-3", "  ms word ", 2).await;

    let query = ResolutionQuery::new("EXM2024", "s2").with_subject_name("MS Word");
    let result = bank.resolve(&query).await.unwrap();

    assert_eq!(result.strategy(), Some(StrategyKind::SubjectNameEquality));
    assert_eq!(result.questions().unwrap().len(), 2);
}

#[tokio::test]
async fn test_exact_request_skips_fuzzy_strategies() {
    let bank = sqlite_bank().await;
    seed(&bank, "EXM2024", "cn", "Computer Networks", 9).await;

    let query = ResolutionQuery::new("EXM2024", "s9")
        .with_subject_name("Computer Network")
        .exact(true);
    let result = bank.resolve(&query).await.unwrap();

    assert!(!result.is_found());
    let diagnostic = result.diagnostic().unwrap();
    assert!(diagnostic.strategies_attempted.iter().all(|kind| !kind.is_fuzzy()));
    assert_eq!(diagnostic.questions_for_paper, 9);
    assert_eq!(
        diagnostic.closest_subject.as_ref().map(|c| c.name.as_str()),
        Some("Computer Networks")
    );
}

#[tokio::test]
async fn test_not_found_diagnostic_lists_available_subjects() {
    let bank = sqlite_bank().await;
    seed(&bank, "EXM2024", "s1", "MS Excel", 4).await;
    seed(&bank, "EXM2024", "s2", "MS Word", 2).await;
    seed(&bank, "EXM2023", "s3", "Tally ERP", 1).await;

    let query = ResolutionQuery::new("EXM2024", "s9").with_subject_name("Photoshop");
    let result = bank.resolve(&query).await.unwrap();

    let diagnostic = result.diagnostic().unwrap();
    assert_eq!(diagnostic.total_questions_in_store, 7);
    assert_eq!(diagnostic.questions_for_paper, 6);
    assert_eq!(
        diagnostic
            .available_subject_names
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>(),
        vec!["MS Excel", "MS Word"]
    );
    assert_eq!(diagnostic.sample_questions.len(), 3);
    assert!(diagnostic.paper_aliases.iter().any(|label| label.contains("EXM2024")));
    assert_eq!(diagnostic.target_subject_name.as_deref(), Some("Photoshop"));
}

#[tokio::test]
async fn test_unknown_paper_samples_whole_store() {
    let bank = sqlite_bank().await;
    seed(&bank, "EXM2023", "s3", "Tally ERP", 2).await;

    let result = bank.resolve_questions("ZZZ9999", "s1", false).await.unwrap();

    let diagnostic = result.diagnostic().unwrap();
    assert_eq!(diagnostic.questions_for_paper, 0);
    assert!(diagnostic.available_subject_names.is_empty());
    assert_eq!(diagnostic.sample_questions.len(), 2);
}

#[tokio::test]
async fn test_blank_paper_id_is_invalid_input() {
    let bank = sqlite_bank().await;
    let err = bank.resolve_questions("  ", "s1", false).await.unwrap_err();
    assert!(matches!(err, ResolveError::InvalidInput(_)));
}

#[tokio::test]
async fn test_store_failure_is_not_reported_as_not_found() {
    let store = Arc::new(MemoryStore::new());
    store.seed_many("EXM2024", "s1", "MS Excel", 3);
    store.fail_reads();
    let bank = QuestionBank::new(store);

    let err = bank.resolve_questions("EXM2024", "s1", false).await.unwrap_err();

    assert!(matches!(err, ResolveError::StoreUnavailable(_)));
}

#[tokio::test]
async fn test_memory_store_resolves_like_sqlite() {
    let store = Arc::new(MemoryStore::new());
    store.seed_many("P2024", "legacy-7", "Computer Fundamentals", 5);
    store.seed_many("EXM2024", "s4", "Tally ERP", 2);
    let bank = QuestionBank::new(store);

    let query = ResolutionQuery::new("EXM2024", "s1").with_subject_name("computer fundamental");
    let result = bank.resolve(&query).await.unwrap();

    assert!(result.strategy().is_some_and(StrategyKind::is_fuzzy));
    assert_eq!(result.questions().unwrap().len(), 5);
}
