use thiserror::Error;

use crate::model::QuizType;

/// Validation failures raised at the domain boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("step number must be between 1 and 8, got {0}")]
    InvalidStep(u8),

    #[error("score {score} for step {step} is outside 0..={max}")]
    ScoreOutOfRange { step: u8, score: u32, max: u8 },

    #[error("quiz attempt score {score} exceeds {total} questions")]
    InvalidQuizAttempt { score: u32, total: u32 },

    #[error("unknown quiz type: {0}")]
    UnknownQuizType(String),

    #[error("{quiz} quiz has no question {index}")]
    InvalidQuestion { quiz: QuizType, index: usize },

    #[error("{quiz} quiz question {question} has no option {option}")]
    InvalidOption {
        quiz: QuizType,
        question: usize,
        option: usize,
    },

    #[error("expected {expected} answers for the {quiz} quiz, got {actual}")]
    AnswerCount {
        quiz: QuizType,
        expected: usize,
        actual: usize,
    },
}
