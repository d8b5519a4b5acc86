use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProgressError;

//
// ─── QUIZ TYPE ────────────────────────────────────────────────────────────────
//

/// The two knowledge quizzes that gate onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizType {
    History,
    Product,
}

impl QuizType {
    pub const ALL: [QuizType; 2] = [QuizType::History, QuizType::Product];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizType::History => "history",
            QuizType::Product => "product",
        }
    }

    /// The step this quiz is scored on.
    #[must_use]
    pub fn step(self) -> Step {
        match self {
            QuizType::History => Step::HistoryQuiz,
            QuizType::Product => Step::ProductQuiz,
        }
    }

    /// Minimum score that satisfies the quiz step.
    #[must_use]
    pub fn pass_threshold(self) -> u8 {
        match self {
            QuizType::History => 3,
            QuizType::Product => 2,
        }
    }

    /// Highest storable score, equal to the number of questions.
    #[must_use]
    pub fn max_score(self) -> u8 {
        match self {
            QuizType::History => 4,
            QuizType::Product => 3,
        }
    }
}

impl fmt::Display for QuizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizType {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "history" => Ok(QuizType::History),
            "product" => Ok(QuizType::Product),
            other => Err(ProgressError::UnknownQuizType(other.to_owned())),
        }
    }
}

//
// ─── STEP ─────────────────────────────────────────────────────────────────────
//

/// How a step is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Done when the boolean fact is true.
    Checkbox,
    /// Done when the stored score reaches the quiz threshold.
    Quiz(QuizType),
}

/// The eight onboarding steps in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    GithubAccount,
    Environment,
    HistoryQuiz,
    ProductQuiz,
    TeamIntegration,
    TechnicalSetup,
    AppTesting,
    FirstContribution,
}

impl Step {
    pub const COUNT: usize = 8;

    pub const ALL: [Step; Step::COUNT] = [
        Step::GithubAccount,
        Step::Environment,
        Step::HistoryQuiz,
        Step::ProductQuiz,
        Step::TeamIntegration,
        Step::TechnicalSetup,
        Step::AppTesting,
        Step::FirstContribution,
    ];

    /// 1-indexed position in the checklist.
    #[must_use]
    pub fn number(self) -> StepNumber {
        StepNumber(self.index() as u8 + 1)
    }

    /// 0-indexed position in the checklist.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn kind(self) -> StepKind {
        match self {
            Step::HistoryQuiz => StepKind::Quiz(QuizType::History),
            Step::ProductQuiz => StepKind::Quiz(QuizType::Product),
            _ => StepKind::Checkbox,
        }
    }

    /// Short label used by reports and progress listings.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Step::GithubAccount => "GitHub Account",
            Step::Environment => "Dev Environment",
            Step::HistoryQuiz => "History Quiz",
            Step::ProductQuiz => "Product Quiz",
            Step::TeamIntegration => "Team Integration",
            Step::TechnicalSetup => "Technical Setup",
            Step::AppTesting => "App Testing",
            Step::FirstContribution => "First Contribution",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── STEP NUMBER ──────────────────────────────────────────────────────────────
//

/// A validated step number in `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct StepNumber(u8);

impl StepNumber {
    pub const FIRST: u8 = 1;
    pub const LAST: u8 = Step::COUNT as u8;

    /// Validates a raw step number at the boundary.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidStep` if `value` is outside `1..=8`.
    pub fn new(value: u8) -> Result<Self, ProgressError> {
        if (Self::FIRST..=Self::LAST).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ProgressError::InvalidStep(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn step(self) -> Step {
        Step::ALL[usize::from(self.0 - 1)]
    }
}

impl TryFrom<u8> for StepNumber {
    type Error = ProgressError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StepNumber> for u8 {
    fn from(value: StepNumber) -> Self {
        value.0
    }
}

impl fmt::Display for StepNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
