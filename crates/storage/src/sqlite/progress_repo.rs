use onboard_core::model::{EmployeeId, EmployeeProgress, UserId};
use sqlx::SqliteConnection;

use super::SqliteRepository;
use super::mapping::{PROGRESS_COLUMNS, map_progress_row};
use crate::repository::{
    ClearedRecords, ProgressEdit, ProgressRepository, ProgressUpdate, StorageError,
};

fn connection(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn insert_progress(&self, progress: &EmployeeProgress) -> Result<(), StorageError> {
        let facts = progress.facts();
        sqlx::query(
            r"
            INSERT INTO onboarding_progress (
                employee_id, user_id, employee_name, start_date, current_step,
                step_1_github, step_2_environment, step_3_history_quiz, step_4_product_quiz,
                step_5_team_integration, step_6_technical_setup, step_7_app_testing,
                step_8_first_contribution, completion_percentage, completed_date, last_activity
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ",
        )
        .bind(progress.employee_id().as_str())
        .bind(progress.user_id().as_str())
        .bind(progress.name())
        .bind(progress.start_date())
        .bind(i64::from(progress.current_step()))
        .bind(facts.github_account)
        .bind(facts.environment)
        .bind(i64::from(facts.history_quiz))
        .bind(i64::from(facts.product_quiz))
        .bind(facts.team_integration)
        .bind(facts.technical_setup)
        .bind(facts.app_testing)
        .bind(facts.first_contribution)
        .bind(progress.completion_percentage())
        .bind(progress.completed_date())
        .bind(progress.last_activity())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::Conflict
            } else {
                connection(e)
            }
        })?;

        Ok(())
    }

    async fn update_progress(
        &self,
        user_id: &UserId,
        edit: ProgressEdit<'_>,
    ) -> Result<ProgressUpdate, StorageError> {
        let mut conn = self.pool.acquire().await.map_err(connection)?;

        // Take the write lock before reading so writers from other processes
        // queue behind us instead of overwriting each other.
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(connection)?;

        match edit_locked(&mut conn, user_id, edit).await {
            Ok(update) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(connection)?;
                Ok(update)
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(e)
            }
        }
    }

    async fn progress_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<EmployeeProgress>, StorageError> {
        let sql = format!("SELECT {PROGRESS_COLUMNS} FROM onboarding_progress WHERE user_id = ?1");
        let row = sqlx::query(&sql)
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(connection)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn progress_for_employee(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Option<EmployeeProgress>, StorageError> {
        let sql =
            format!("SELECT {PROGRESS_COLUMNS} FROM onboarding_progress WHERE employee_id = ?1");
        let row = sqlx::query(&sql)
            .bind(employee_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(connection)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(&self) -> Result<Vec<EmployeeProgress>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM onboarding_progress ORDER BY start_date DESC, employee_id ASC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(connection)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }

    async fn clear_by_user_prefix(&self, prefix: &str) -> Result<ClearedRecords, StorageError> {
        let mut tx = self.pool.begin().await.map_err(connection)?;

        // substr comparison keeps `%` and `_` in the prefix literal.
        let attempts = sqlx::query(
            r"
            DELETE FROM quiz_attempts
            WHERE employee_id IN (
                SELECT employee_id FROM onboarding_progress
                WHERE substr(user_id, 1, length(?1)) = ?1
            )
            ",
        )
        .bind(prefix)
        .execute(&mut *tx)
        .await
        .map_err(connection)?
        .rows_affected();

        let progress = sqlx::query(
            r"
            DELETE FROM onboarding_progress
            WHERE substr(user_id, 1, length(?1)) = ?1
            ",
        )
        .bind(prefix)
        .execute(&mut *tx)
        .await
        .map_err(connection)?
        .rows_affected();

        tx.commit().await.map_err(connection)?;

        Ok(ClearedRecords { progress, attempts })
    }
}

async fn edit_locked(
    conn: &mut SqliteConnection,
    user_id: &UserId,
    edit: ProgressEdit<'_>,
) -> Result<ProgressUpdate, StorageError> {
    let sql = format!("SELECT {PROGRESS_COLUMNS} FROM onboarding_progress WHERE user_id = ?1");
    let row = sqlx::query(&sql)
        .bind(user_id.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(connection)?;
    let previous = row
        .as_ref()
        .map(map_progress_row)
        .transpose()?
        .ok_or(StorageError::NotFound)?;

    let mut progress = previous.clone();
    let applied = edit(&mut progress);
    if applied {
        write_progress(conn, &progress).await?;
    }

    tracing::debug!(user_id = %user_id, applied, "progress row updated");
    Ok(ProgressUpdate {
        previous,
        progress,
        applied,
    })
}

async fn write_progress(
    conn: &mut SqliteConnection,
    progress: &EmployeeProgress,
) -> Result<(), StorageError> {
    let facts = progress.facts();
    let res = sqlx::query(
        r"
        UPDATE onboarding_progress SET
            current_step = ?2,
            step_1_github = ?3,
            step_2_environment = ?4,
            step_3_history_quiz = ?5,
            step_4_product_quiz = ?6,
            step_5_team_integration = ?7,
            step_6_technical_setup = ?8,
            step_7_app_testing = ?9,
            step_8_first_contribution = ?10,
            completion_percentage = ?11,
            -- never clear a completion date once written
            completed_date = COALESCE(completed_date, ?12),
            last_activity = ?13
        WHERE employee_id = ?1
        ",
    )
    .bind(progress.employee_id().as_str())
    .bind(i64::from(progress.current_step()))
    .bind(facts.github_account)
    .bind(facts.environment)
    .bind(i64::from(facts.history_quiz))
    .bind(i64::from(facts.product_quiz))
    .bind(facts.team_integration)
    .bind(facts.technical_setup)
    .bind(facts.app_testing)
    .bind(facts.first_contribution)
    .bind(progress.completion_percentage())
    .bind(progress.completed_date())
    .bind(progress.last_activity())
    .execute(&mut *conn)
    .await
    .map_err(connection)?;

    if res.rows_affected() == 0 {
        return Err(StorageError::NotFound);
    }
    Ok(())
}
