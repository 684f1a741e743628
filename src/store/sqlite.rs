//! `SQLite`-backed question store.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::{debug, instrument};

use super::{
    NewQuestion, QuestionField, QuestionFilter, QuestionRecord, QuestionStore, ReplaceCounts,
    Result, StoreError,
};
use crate::db::Database;
use crate::paper::{CODE_PREFIX_CHARS, ExamPaper, PaperAliasSet, PaperCondition, SubjectSpec};

#[derive(Debug, FromRow)]
struct PaperRow {
    id: i64,
    paper_id: String,
    title: Option<String>,
}

/// Question store over the crate's `SQLite` database.
#[derive(Debug, Clone)]
pub struct SqliteQuestionStore {
    db: Database,
}

impl SqliteQuestionStore {
    /// Creates a store over an opened database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns the underlying database handle.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Returns matching questions ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self, filter))]
    pub async fn find(&self, filter: &QuestionFilter) -> Result<Vec<QuestionRecord>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM questions");
        push_where(&mut builder, filter);
        builder.push(" ORDER BY id ASC");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let records = builder
            .build_query_as::<QuestionRecord>()
            .fetch_all(self.db.pool())
            .await?;
        debug!(count = records.len(), "questions fetched");
        Ok(records)
    }

    /// Counts matching questions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self, filter))]
    pub async fn count(&self, filter: &QuestionFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM questions");
        push_where(&mut builder, filter);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(self.db.pool())
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Returns distinct values of one column, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self, filter), fields(field = %field))]
    pub async fn distinct(
        &self,
        field: QuestionField,
        filter: &QuestionFilter,
    ) -> Result<BTreeSet<String>> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT DISTINCT {} FROM questions", field.column()));
        push_where(&mut builder, filter);

        let values = builder
            .build_query_scalar::<String>()
            .fetch_all(self.db.pool())
            .await?;
        Ok(values.into_iter().collect())
    }

    /// Deletes matching questions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidFilter`] for a filter without paper or
    /// subject constraints, or [`StoreError::Database`] if the delete fails.
    #[instrument(skip(self, filter))]
    pub async fn delete_many(&self, filter: &QuestionFilter) -> Result<u64> {
        let mut conn = self.db.pool().acquire().await?;
        let deleted = delete_matching(&mut *conn, filter).await?;
        debug!(deleted, "questions deleted");
        Ok(deleted)
    }

    /// Inserts questions in one transaction and returns the stored rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if any insert fails; nothing is kept then.
    #[instrument(skip(self, questions), fields(count = questions.len()))]
    pub async fn insert_many(&self, questions: &[NewQuestion]) -> Result<Vec<QuestionRecord>> {
        let mut tx = self.db.pool().begin().await?;
        let mut stored = Vec::with_capacity(questions.len());
        for question in questions {
            stored.push(insert_one(&mut *tx, question).await?);
        }
        tx.commit().await?;
        Ok(stored)
    }

    /// Rewrites content columns of existing rows in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if any update fails.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn update_many(&self, records: &[QuestionRecord]) -> Result<u64> {
        let mut tx = self.db.pool().begin().await?;
        let mut updated = 0;
        for record in records {
            let result = sqlx::query(
                r"UPDATE questions
                  SET subject_name = ?,
                      question_text = ?,
                      option_a = ?,
                      option_b = ?,
                      option_c = ?,
                      option_d = ?,
                      correct_option = ?
                  WHERE id = ?",
            )
            .bind(&record.subject_name)
            .bind(&record.question_text)
            .bind(&record.option_a)
            .bind(&record.option_b)
            .bind(&record.option_c)
            .bind(&record.option_d)
            .bind(&record.correct_option)
            .bind(record.id)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }
        tx.commit().await?;
        Ok(updated)
    }

    /// Deletes matching questions and inserts replacements atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if any statement fails; the transaction is rolled back.
    #[instrument(skip(self, filter, questions), fields(count = questions.len()))]
    pub async fn replace_all(
        &self,
        filter: &QuestionFilter,
        questions: &[NewQuestion],
    ) -> Result<ReplaceCounts> {
        let mut tx = self.db.pool().begin().await?;
        let deleted = delete_matching(&mut *tx, filter).await?;
        for question in questions {
            insert_one(&mut *tx, question).await?;
        }
        tx.commit().await?;

        let counts = ReplaceCounts {
            deleted,
            inserted: questions.len() as u64,
        };
        debug!(deleted = counts.deleted, inserted = counts.inserted, "bank replaced");
        Ok(counts)
    }

    /// Finds the first registered paper whose code satisfies the alias set.
    ///
    /// Conditions are tried in precedence order; within one condition the
    /// oldest paper wins.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a query fails.
    #[instrument(skip(self, aliases))]
    pub async fn find_paper(&self, aliases: &PaperAliasSet) -> Result<Option<ExamPaper>> {
        for condition in aliases.conditions() {
            let mut builder =
                QueryBuilder::<Sqlite>::new("SELECT id, paper_id, title FROM exam_papers WHERE ");
            push_paper_condition(&mut builder, condition);
            builder.push(" ORDER BY id ASC LIMIT 1");

            let row = builder
                .build_query_as::<PaperRow>()
                .fetch_optional(self.db.pool())
                .await?;
            if let Some(row) = row {
                debug!(condition = %condition, paper_id = %row.paper_id, "registered paper found");
                return self.load_paper(row).await.map(Some);
            }
        }
        Ok(None)
    }

    /// Finds a registered paper by store id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a query fails.
    #[instrument(skip(self))]
    pub async fn find_paper_by_id(&self, id: i64) -> Result<Option<ExamPaper>> {
        let row = sqlx::query_as::<_, PaperRow>(
            "SELECT id, paper_id, title FROM exam_papers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => self.load_paper(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Upserts a paper by code and replaces its subject list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if any statement fails.
    #[instrument(skip(self, paper), fields(paper_id = %paper.paper_id))]
    pub async fn save_paper(&self, paper: &ExamPaper) -> Result<ExamPaper> {
        let paper_id = paper.paper_id.trim();
        if paper_id.is_empty() {
            return Err(StoreError::InvalidFilter {
                operation: "save_paper",
                reason: "paper code is blank".to_string(),
            });
        }

        let mut tx = self.db.pool().begin().await?;
        let id: i64 = sqlx::query_scalar(
            r"INSERT INTO exam_papers (paper_id, title)
              VALUES (?, ?)
              ON CONFLICT(paper_id) DO UPDATE SET title = excluded.title
              RETURNING id",
        )
        .bind(paper_id)
        .bind(paper.title.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM paper_subjects WHERE paper_ref = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for (position, subject) in paper.subjects.iter().enumerate() {
            sqlx::query(
                r"INSERT INTO paper_subjects (paper_ref, subject_id, subject_name, position)
                  VALUES (?, ?, ?, ?)",
            )
            .bind(id)
            .bind(subject.subject_id.trim())
            .bind(subject.subject_name.trim())
            .bind(i64::try_from(position).unwrap_or(i64::MAX))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!(id, subjects = paper.subjects.len(), "paper saved");
        Ok(ExamPaper {
            id,
            paper_id: paper_id.to_string(),
            title: paper.title.clone(),
            subjects: paper
                .subjects
                .iter()
                .map(|s| SubjectSpec::new(s.subject_id.trim(), s.subject_name.trim()))
                .collect(),
        })
    }

    async fn load_paper(&self, row: PaperRow) -> Result<ExamPaper> {
        let subjects: Vec<(String, String)> = sqlx::query_as(
            r"SELECT subject_id, subject_name FROM paper_subjects
              WHERE paper_ref = ?
              ORDER BY position ASC, id ASC",
        )
        .bind(row.id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(ExamPaper {
            id: row.id,
            paper_id: row.paper_id,
            title: row.title,
            subjects: subjects
                .into_iter()
                .map(|(subject_id, subject_name)| SubjectSpec::new(subject_id, subject_name))
                .collect(),
        })
    }
}

#[async_trait]
impl QuestionStore for SqliteQuestionStore {
    async fn find(&self, filter: &QuestionFilter) -> Result<Vec<QuestionRecord>> {
        SqliteQuestionStore::find(self, filter).await
    }

    async fn count(&self, filter: &QuestionFilter) -> Result<u64> {
        SqliteQuestionStore::count(self, filter).await
    }

    async fn distinct(
        &self,
        field: QuestionField,
        filter: &QuestionFilter,
    ) -> Result<BTreeSet<String>> {
        SqliteQuestionStore::distinct(self, field, filter).await
    }

    async fn delete_many(&self, filter: &QuestionFilter) -> Result<u64> {
        SqliteQuestionStore::delete_many(self, filter).await
    }

    async fn insert_many(&self, questions: &[NewQuestion]) -> Result<Vec<QuestionRecord>> {
        SqliteQuestionStore::insert_many(self, questions).await
    }

    async fn update_many(&self, records: &[QuestionRecord]) -> Result<u64> {
        SqliteQuestionStore::update_many(self, records).await
    }

    fn supports_transactions(&self) -> bool {
        true
    }

    async fn replace_all(
        &self,
        filter: &QuestionFilter,
        questions: &[NewQuestion],
    ) -> Result<ReplaceCounts> {
        SqliteQuestionStore::replace_all(self, filter, questions).await
    }

    async fn find_paper(&self, aliases: &PaperAliasSet) -> Result<Option<ExamPaper>> {
        SqliteQuestionStore::find_paper(self, aliases).await
    }

    async fn find_paper_by_id(&self, id: i64) -> Result<Option<ExamPaper>> {
        SqliteQuestionStore::find_paper_by_id(self, id).await
    }

    async fn save_paper(&self, paper: &ExamPaper) -> Result<ExamPaper> {
        SqliteQuestionStore::save_paper(self, paper).await
    }
}

async fn insert_one(conn: &mut SqliteConnection, question: &NewQuestion) -> Result<QuestionRecord> {
    let record = sqlx::query_as::<_, QuestionRecord>(
        r"INSERT INTO questions (
            paper_id,
            subject_id,
            subject_name,
            question_text,
            option_a,
            option_b,
            option_c,
            option_d,
            correct_option
          )
          VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
          RETURNING *",
    )
    .bind(&question.paper_id)
    .bind(&question.subject_id)
    .bind(&question.subject_name)
    .bind(&question.question_text)
    .bind(&question.option_a)
    .bind(&question.option_b)
    .bind(&question.option_c)
    .bind(&question.option_d)
    .bind(&question.correct_option)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

async fn delete_matching(conn: &mut SqliteConnection, filter: &QuestionFilter) -> Result<u64> {
    if filter.is_unbounded() {
        return Err(StoreError::InvalidFilter {
            operation: "delete",
            reason: "no paper or subject constraint".to_string(),
        });
    }

    let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM questions");
    push_where(&mut builder, filter);
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}

fn push_where(builder: &mut QueryBuilder<'_, Sqlite>, filter: &QuestionFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(paper) = &filter.paper {
        builder.push(" AND (");
        if paper.is_empty() {
            builder.push("0 = 1");
        }
        for (index, condition) in paper.conditions().iter().enumerate() {
            if index > 0 {
                builder.push(" OR ");
            }
            push_paper_condition(builder, condition);
        }
        builder.push(")");
    }

    if let Some(subject_id) = &filter.subject_id {
        builder.push(" AND subject_id = ").push_bind(subject_id.clone());
    }

    if let Some(subject_name) = &filter.subject_name {
        builder
            .push(" AND trim(subject_name) = ")
            .push_bind(subject_name.trim_matches(' ').to_string())
            .push(" COLLATE NOCASE");
    }
}

fn push_paper_condition(builder: &mut QueryBuilder<'_, Sqlite>, condition: &PaperCondition) {
    match condition {
        PaperCondition::Exact(code) | PaperCondition::Truncated(code) => {
            builder.push("paper_id = ").push_bind(code.clone());
        }
        PaperCondition::Suffix(suffix) => {
            builder
                .push("upper(ltrim(trim(paper_id), ")
                .push_bind(CODE_PREFIX_CHARS)
                .push(")) = ")
                .push_bind(suffix.clone());
        }
    }
}
