use onboard_core::catalog::{self, AnswerFeedback};
use onboard_core::model::{EmployeeProgress, QuizType, StepUpdate, UserId};
use serde::Serialize;
use tracing::info;

use crate::error::TrackerError;
use crate::tracker::ProgressTracker;

/// Feedback for one answered question.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub feedback: AnswerFeedback,
    /// Set when the answer moved the employee past the quiz step.
    pub advanced: Option<EmployeeProgress>,
}

/// Result of grading a full answer sheet.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSubmission {
    pub attempt_id: i64,
    pub quiz: QuizType,
    pub score: u32,
    pub total: u32,
    pub passed: bool,
    pub progress: EmployeeProgress,
}

/// Grades quiz answers and feeds the results into the tracker.
#[derive(Clone)]
pub struct QuizService {
    tracker: ProgressTracker,
}

impl QuizService {
    #[must_use]
    pub fn new(tracker: ProgressTracker) -> Self {
        Self { tracker }
    }

    /// Grade a single answer.
    ///
    /// Answering while the employee sits on that quiz's step passes the quiz:
    /// the step is recorded with the maximum score, whether or not this
    /// particular answer was right. No attempt is logged, since no sheet was
    /// graded. Users without a record just get the feedback.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Validation` for an out-of-range question or
    /// option, and `TrackerError::Storage` if persistence fails.
    pub async fn answer(
        &self,
        user_id: &UserId,
        quiz: QuizType,
        question: usize,
        option: usize,
    ) -> Result<AnswerOutcome, TrackerError> {
        let feedback = catalog::grade_answer(quiz, question, option)?;

        let update = StepUpdate::Score {
            quiz,
            score: quiz.max_score(),
        };
        let on_quiz_step = move |record: &EmployeeProgress| record.current() == Some(quiz.step());
        let result = match self.tracker.apply_if(user_id, update, on_quiz_step).await {
            Ok(result) => result,
            Err(TrackerError::NotFound(_)) => {
                return Ok(AnswerOutcome {
                    feedback,
                    advanced: None,
                });
            }
            Err(e) => return Err(e),
        };

        if result.applied {
            info!(user_id = %user_id, quiz = %quiz, "quiz passed");
        }
        Ok(AnswerOutcome {
            feedback,
            advanced: result.applied.then_some(result.progress),
        })
    }

    /// Grade a full answer sheet, log the attempt and record the score.
    ///
    /// The step keeps the best score seen so far, so a weaker retake never
    /// un-satisfies a passed quiz.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Validation` for a malformed sheet,
    /// `TrackerError::NotFound` if the user has no record, and
    /// `TrackerError::Storage` if persistence fails.
    pub async fn submit(
        &self,
        user_id: &UserId,
        quiz: QuizType,
        answers: &[usize],
    ) -> Result<QuizSubmission, TrackerError> {
        let score = catalog::grade_sheet(quiz, answers)?;
        let total = total_questions(quiz);

        let record = self
            .tracker
            .get(user_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(user_id.to_string()))?;

        let attempt_id = self
            .tracker
            .record_quiz_attempt(record.employee_id(), quiz, score, total)
            .await?;

        let progress = self
            .tracker
            .apply(user_id, StepUpdate::best_score(quiz, score)?)
            .await?;

        let passed = score >= u32::from(quiz.pass_threshold());
        info!(user_id = %user_id, quiz = %quiz, score, total, passed, "quiz submitted");

        Ok(QuizSubmission {
            attempt_id,
            quiz,
            score,
            total,
            passed,
            progress,
        })
    }
}

fn total_questions(quiz: QuizType) -> u32 {
    u32::try_from(catalog::questions(quiz).len()).unwrap_or(u32::MAX)
}
