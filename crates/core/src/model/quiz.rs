use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProgressError;
use crate::model::ids::EmployeeId;
use crate::model::step::QuizType;

/// One entry in the append-only quiz attempt log.
///
/// Attempts are history only; progress derivation never reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttempt {
    employee_id: EmployeeId,
    quiz_type: QuizType,
    score: u32,
    total_questions: u32,
    attempt_date: DateTime<Utc>,
}

impl QuizAttempt {
    /// Creates a validated attempt.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidQuizAttempt` when there are no questions
    /// or the score exceeds the number of questions.
    pub fn new(
        employee_id: EmployeeId,
        quiz_type: QuizType,
        score: u32,
        total_questions: u32,
        attempt_date: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        if total_questions == 0 || score > total_questions {
            return Err(ProgressError::InvalidQuizAttempt {
                score,
                total: total_questions,
            });
        }
        Ok(Self {
            employee_id,
            quiz_type,
            score,
            total_questions,
            attempt_date,
        })
    }

    #[must_use]
    pub fn employee_id(&self) -> &EmployeeId {
        &self.employee_id
    }

    #[must_use]
    pub fn quiz_type(&self) -> QuizType {
        self.quiz_type
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn attempt_date(&self) -> DateTime<Utc> {
        self.attempt_date
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        f64::from(self.score) / f64::from(self.total_questions) * 100.0
    }
}
