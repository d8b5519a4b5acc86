use onboard_core::model::{EmployeeId, QuizAttempt};

use super::SqliteRepository;
use super::mapping::map_attempt_row;
use crate::repository::{QuizAttemptRecord, QuizAttemptRepository, StorageError};

#[async_trait::async_trait]
impl QuizAttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    employee_id, quiz_type, score, total_questions, attempt_date
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(attempt.employee_id().as_str())
        .bind(attempt.quiz_type().as_str())
        .bind(i64::from(attempt.score()))
        .bind(i64::from(attempt.total_questions()))
        .bind(attempt.attempt_date())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
            _ => StorageError::Connection(e.to_string()),
        })?;

        Ok(res.last_insert_rowid())
    }

    async fn attempts_for(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<QuizAttemptRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, employee_id, quiz_type, score, total_questions, attempt_date
                FROM quiz_attempts
                WHERE employee_id = ?1
                ORDER BY attempt_date DESC, id DESC
            ",
        )
        .bind(employee_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }
}
