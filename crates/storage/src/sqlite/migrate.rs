use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Applies pending schema versions in order.
///
/// Version 1 creates `onboarding_progress`, `quiz_attempts` and their indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS onboarding_progress (
                    employee_id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL UNIQUE,
                    employee_name TEXT NOT NULL,
                    start_date TEXT NOT NULL,
                    current_step INTEGER NOT NULL DEFAULT 1
                        CHECK (current_step BETWEEN 1 AND 9),
                    step_1_github INTEGER NOT NULL DEFAULT 0,
                    step_2_environment INTEGER NOT NULL DEFAULT 0,
                    step_3_history_quiz INTEGER NOT NULL DEFAULT 0
                        CHECK (step_3_history_quiz BETWEEN 0 AND 4),
                    step_4_product_quiz INTEGER NOT NULL DEFAULT 0
                        CHECK (step_4_product_quiz BETWEEN 0 AND 3),
                    step_5_team_integration INTEGER NOT NULL DEFAULT 0,
                    step_6_technical_setup INTEGER NOT NULL DEFAULT 0,
                    step_7_app_testing INTEGER NOT NULL DEFAULT 0,
                    step_8_first_contribution INTEGER NOT NULL DEFAULT 0,
                    completion_percentage REAL NOT NULL DEFAULT 0
                        CHECK (completion_percentage BETWEEN 0 AND 100),
                    completed_date TEXT,
                    last_activity TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quiz_attempts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    employee_id TEXT NOT NULL,
                    quiz_type TEXT NOT NULL CHECK (quiz_type IN ('history', 'product')),
                    score INTEGER NOT NULL CHECK (score >= 0),
                    total_questions INTEGER NOT NULL CHECK (total_questions > 0),
                    attempt_date TEXT NOT NULL,
                    FOREIGN KEY (employee_id) REFERENCES onboarding_progress(employee_id)
                        ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_progress_start_date
                    ON onboarding_progress(start_date);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_quiz_attempts_employee_date
                    ON quiz_attempts(employee_id, attempt_date);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied onboarding schema migration");
    }

    Ok(())
}
