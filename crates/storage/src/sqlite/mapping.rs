use onboard_core::model::{EmployeeId, EmployeeProgress, QuizAttempt, QuizType, StepFacts, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{QuizAttemptRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn flag(row: &SqliteRow, column: &'static str) -> Result<bool, StorageError> {
    Ok(row.try_get::<i64, _>(column).map_err(ser)? != 0)
}

fn small(row: &SqliteRow, column: &'static str) -> Result<u8, StorageError> {
    let v: i64 = row.try_get(column).map_err(ser)?;
    u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {column}: {v}")))
}

fn count(row: &SqliteRow, column: &'static str) -> Result<u32, StorageError> {
    let v: i64 = row.try_get(column).map_err(ser)?;
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {column}: {v}")))
}

pub(crate) fn parse_quiz_type(s: &str) -> Result<QuizType, StorageError> {
    s.parse().map_err(ser)
}

pub(crate) const PROGRESS_COLUMNS: &str = r"
    employee_id, user_id, employee_name, start_date, current_step,
    step_1_github, step_2_environment, step_3_history_quiz, step_4_product_quiz,
    step_5_team_integration, step_6_technical_setup, step_7_app_testing,
    step_8_first_contribution, completion_percentage, completed_date, last_activity
";

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<EmployeeProgress, StorageError> {
    let facts = StepFacts {
        github_account: flag(row, "step_1_github")?,
        environment: flag(row, "step_2_environment")?,
        history_quiz: small(row, "step_3_history_quiz")?,
        product_quiz: small(row, "step_4_product_quiz")?,
        team_integration: flag(row, "step_5_team_integration")?,
        technical_setup: flag(row, "step_6_technical_setup")?,
        app_testing: flag(row, "step_7_app_testing")?,
        first_contribution: flag(row, "step_8_first_contribution")?,
    };

    Ok(EmployeeProgress::from_persisted(
        EmployeeId::new(row.try_get::<String, _>("employee_id").map_err(ser)?),
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        row.try_get("employee_name").map_err(ser)?,
        row.try_get("start_date").map_err(ser)?,
        facts,
        small(row, "current_step")?,
        row.try_get("completion_percentage").map_err(ser)?,
        row.try_get("completed_date").map_err(ser)?,
        row.try_get("last_activity").map_err(ser)?,
    ))
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<QuizAttemptRecord, StorageError> {
    let quiz_type: String = row.try_get("quiz_type").map_err(ser)?;
    let attempt = QuizAttempt::new(
        EmployeeId::new(row.try_get::<String, _>("employee_id").map_err(ser)?),
        parse_quiz_type(&quiz_type)?,
        count(row, "score")?,
        count(row, "total_questions")?,
        row.try_get("attempt_date").map_err(ser)?,
    )
    .map_err(ser)?;

    Ok(QuizAttemptRecord {
        id: row.try_get("id").map_err(ser)?,
        attempt,
    })
}
