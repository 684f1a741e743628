//! In-memory [`QuestionStore`] double with switchable faults.
//!
//! Filters are evaluated in-process through [`QuestionFilter::matches`]. The
//! store is non-transactional, so replaces take the delete-then-insert path.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use exambank_core::{
    ExamPaper, NewQuestion, PaperAliasSet, QuestionField, QuestionFilter, QuestionRecord,
    QuestionStore, StoreError,
};

type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Default)]
struct State {
    questions: Vec<QuestionRecord>,
    papers: Vec<ExamPaper>,
    next_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_reads: AtomicBool,
    fail_inserts: AtomicBool,
    /// Maximum rows one `insert_many` stores; `usize::MAX` when unset.
    insert_limit: AtomicUsize,
    write_delay_ms: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            insert_limit: AtomicUsize::new(usize::MAX),
            ..Self::default()
        }
    }

    /// Makes `find`, `count` and `distinct` fail.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Makes `insert_many` fail outright.
    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    /// Makes `insert_many` silently store at most `limit` rows.
    pub fn limit_inserts(&self, limit: usize) {
        self.insert_limit.store(limit, Ordering::SeqCst);
    }

    /// Sleeps between a delete and the following insert.
    pub fn delay_writes(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Seeds a stored question directly, bypassing normalization.
    pub fn seed(&self, question: NewQuestion) -> QuestionRecord {
        let mut state = self.state.lock().unwrap();
        let record = to_record(&mut state, question);
        state.questions.push(record.clone());
        record
    }

    /// Seeds `count` questions named `text-1`..`text-count`.
    pub fn seed_many(&self, paper_id: &str, subject_id: &str, subject_name: &str, count: usize) {
        for i in 1..=count {
            self.seed(
                NewQuestion::new(paper_id, subject_id, subject_name, &format!("{subject_name} {i}"))
                    .with_options("a", "b", "c", "d")
                    .with_correct("A"),
            );
        }
    }

    /// Returns every stored question in insertion order.
    pub fn snapshot(&self) -> Vec<QuestionRecord> {
        self.state.lock().unwrap().questions.clone()
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::other("database is locked"));
        }
        Ok(())
    }
}

fn to_record(state: &mut State, question: NewQuestion) -> QuestionRecord {
    state.next_id += 1;
    QuestionRecord {
        id: state.next_id,
        paper_id: question.paper_id,
        subject_id: question.subject_id,
        subject_name: question.subject_name,
        question_text: question.question_text,
        option_a: question.option_a,
        option_b: question.option_b,
        option_c: question.option_c,
        option_d: question.option_d,
        correct_option: question.correct_option,
        created_at: "2026-01-01 00:00:00".to_string(),
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn find(&self, filter: &QuestionFilter) -> StoreResult<Vec<QuestionRecord>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        let limit = filter.limit.map_or(usize::MAX, |limit| limit as usize);
        Ok(state
            .questions
            .iter()
            .filter(|record| filter.matches(record))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &QuestionFilter) -> StoreResult<u64> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .questions
            .iter()
            .filter(|record| filter.matches(record))
            .count() as u64)
    }

    async fn distinct(
        &self,
        field: QuestionField,
        filter: &QuestionFilter,
    ) -> StoreResult<BTreeSet<String>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .questions
            .iter()
            .filter(|record| filter.matches(record))
            .map(|record| field.value(record).to_string())
            .collect())
    }

    async fn delete_many(&self, filter: &QuestionFilter) -> StoreResult<u64> {
        if filter.is_unbounded() {
            return Err(StoreError::InvalidFilter {
                operation: "delete_many",
                reason: "filter names no paper or subject".to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        let before = state.questions.len();
        state.questions.retain(|record| !filter.matches(record));
        Ok((before - state.questions.len()) as u64)
    }

    async fn insert_many(&self, questions: &[NewQuestion]) -> StoreResult<Vec<QuestionRecord>> {
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::other("disk I/O error"));
        }
        let limit = self.insert_limit.load(Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let mut stored = Vec::new();
        for question in questions.iter().take(limit) {
            let record = to_record(&mut state, question.clone());
            state.questions.push(record.clone());
            stored.push(record);
        }
        Ok(stored)
    }

    async fn update_many(&self, records: &[QuestionRecord]) -> StoreResult<u64> {
        let mut state = self.state.lock().unwrap();
        let mut updated = 0;
        for record in records {
            if let Some(slot) = state.questions.iter_mut().find(|slot| slot.id == record.id) {
                *slot = record.clone();
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn find_paper(&self, aliases: &PaperAliasSet) -> StoreResult<Option<ExamPaper>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .papers
            .iter()
            .find(|paper| aliases.matches_stored(&paper.paper_id))
            .cloned())
    }

    async fn find_paper_by_id(&self, id: i64) -> StoreResult<Option<ExamPaper>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state.papers.iter().find(|paper| paper.id == id).cloned())
    }

    async fn save_paper(&self, paper: &ExamPaper) -> StoreResult<ExamPaper> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .papers
            .iter_mut()
            .find(|existing| existing.paper_id == paper.paper_id)
        {
            let id = existing.id;
            *existing = ExamPaper {
                id,
                ..paper.clone()
            };
            return Ok(existing.clone());
        }
        state.next_id += 1;
        let saved = ExamPaper {
            id: state.next_id,
            ..paper.clone()
        };
        state.papers.push(saved.clone());
        Ok(saved)
    }
}
