use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProgressError;
use crate::model::ids::{EmployeeId, UserId};
use crate::model::step::{QuizType, Step, StepKind, StepNumber};

/// Value written to `current_step` once every step is satisfied.
pub const ALL_STEPS_DONE: u8 = 9;

//
// ─── STEP FACTS ───────────────────────────────────────────────────────────────
//

/// The raw per-step facts an employee has accumulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFacts {
    pub github_account: bool,
    pub environment: bool,
    pub history_quiz: u8,
    pub product_quiz: u8,
    pub team_integration: bool,
    pub technical_setup: bool,
    pub app_testing: bool,
    pub first_contribution: bool,
}

/// A single validated change to one step fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepUpdate {
    Checkbox { step: Step, done: bool },
    Score { quiz: QuizType, score: u8 },
    /// Like `Score`, but never lowers the stored score.
    BestScore { quiz: QuizType, score: u8 },
}

fn checked_score(quiz: QuizType, raw: u32) -> Result<u8, ProgressError> {
    let max = quiz.max_score();
    u8::try_from(raw)
        .ok()
        .filter(|s| *s <= max)
        .ok_or(ProgressError::ScoreOutOfRange {
            step: quiz.step().number().value(),
            score: raw,
            max,
        })
}

impl StepUpdate {
    /// Builds an update from the loose `(step, completed, score)` triple.
    ///
    /// Quiz steps take `score` (defaulting to 0) and ignore `completed`;
    /// every other step takes `completed`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidStep` for a step outside `1..=8` and
    /// `ProgressError::ScoreOutOfRange` when a quiz score exceeds its maximum.
    pub fn from_raw(step: u8, completed: bool, score: Option<u32>) -> Result<Self, ProgressError> {
        let step = StepNumber::new(step)?.step();
        match step.kind() {
            StepKind::Checkbox => Ok(Self::Checkbox {
                step,
                done: completed,
            }),
            StepKind::Quiz(quiz) => Ok(Self::Score {
                quiz,
                score: checked_score(quiz, score.unwrap_or(0))?,
            }),
        }
    }

    /// A quiz result that only raises the stored score.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ScoreOutOfRange` when `score` exceeds the
    /// quiz maximum.
    pub fn best_score(quiz: QuizType, score: u32) -> Result<Self, ProgressError> {
        Ok(Self::BestScore {
            quiz,
            score: checked_score(quiz, score)?,
        })
    }

    #[must_use]
    pub fn step(self) -> Step {
        match self {
            StepUpdate::Checkbox { step, .. } => step,
            StepUpdate::Score { quiz, .. } | StepUpdate::BestScore { quiz, .. } => quiz.step(),
        }
    }
}

impl StepFacts {
    fn checkbox_mut(&mut self, step: Step) -> Option<&mut bool> {
        match step {
            Step::GithubAccount => Some(&mut self.github_account),
            Step::Environment => Some(&mut self.environment),
            Step::TeamIntegration => Some(&mut self.team_integration),
            Step::TechnicalSetup => Some(&mut self.technical_setup),
            Step::AppTesting => Some(&mut self.app_testing),
            Step::FirstContribution => Some(&mut self.first_contribution),
            Step::HistoryQuiz | Step::ProductQuiz => None,
        }
    }

    /// Stored score for a quiz.
    #[must_use]
    pub fn score(&self, quiz: QuizType) -> u8 {
        match quiz {
            QuizType::History => self.history_quiz,
            QuizType::Product => self.product_quiz,
        }
    }

    fn score_mut(&mut self, quiz: QuizType) -> &mut u8 {
        match quiz {
            QuizType::History => &mut self.history_quiz,
            QuizType::Product => &mut self.product_quiz,
        }
    }

    pub fn apply(&mut self, update: StepUpdate) {
        match update {
            StepUpdate::Checkbox { step, done } => {
                if let Some(slot) = self.checkbox_mut(step) {
                    *slot = done;
                }
            }
            StepUpdate::Score { quiz, score } => *self.score_mut(quiz) = score,
            StepUpdate::BestScore { quiz, score } => {
                let slot = self.score_mut(quiz);
                *slot = (*slot).max(score);
            }
        }
    }

    #[must_use]
    pub fn is_satisfied(&self, step: Step) -> bool {
        match step {
            Step::GithubAccount => self.github_account,
            Step::Environment => self.environment,
            Step::HistoryQuiz => self.history_quiz >= QuizType::History.pass_threshold(),
            Step::ProductQuiz => self.product_quiz >= QuizType::Product.pass_threshold(),
            Step::TeamIntegration => self.team_integration,
            Step::TechnicalSetup => self.technical_setup,
            Step::AppTesting => self.app_testing,
            Step::FirstContribution => self.first_contribution,
        }
    }

    /// Satisfaction of each step, in checklist order.
    #[must_use]
    pub fn satisfaction(&self) -> [bool; Step::COUNT] {
        Step::ALL.map(|step| self.is_satisfied(step))
    }

    /// First unsatisfied step (1-indexed), or 9 when none remain.
    #[must_use]
    pub fn current_step(&self) -> u8 {
        Step::ALL
            .iter()
            .find(|step| !self.is_satisfied(**step))
            .map_or(ALL_STEPS_DONE, |step| step.number().value())
    }

    #[must_use]
    pub fn satisfied_count(&self) -> usize {
        self.satisfaction().iter().filter(|s| **s).count()
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn completion_percentage(&self) -> f64 {
        self.satisfied_count() as f64 / Step::COUNT as f64 * 100.0
    }

    #[must_use]
    pub fn all_satisfied(&self) -> bool {
        self.satisfied_count() == Step::COUNT
    }
}

//
// ─── EMPLOYEE PROGRESS ────────────────────────────────────────────────────────
//

/// One employee's onboarding record with its derived fields.
///
/// `current_step` and `completion_percentage` are only ever produced by
/// [`EmployeeProgress::record`] (or restored verbatim from storage), so they
/// always agree with `facts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeProgress {
    employee_id: EmployeeId,
    user_id: UserId,
    name: String,
    start_date: DateTime<Utc>,
    facts: StepFacts,
    current_step: u8,
    completion_percentage: f64,
    completed_date: Option<DateTime<Utc>>,
    last_activity: DateTime<Utc>,
}

impl EmployeeProgress {
    /// A fresh record with every step at its zero value.
    #[must_use]
    pub fn new(
        employee_id: EmployeeId,
        user_id: UserId,
        name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            employee_id,
            user_id,
            name: name.into(),
            start_date: now,
            facts: StepFacts::default(),
            current_step: 1,
            completion_percentage: 0.0,
            completed_date: None,
            last_activity: now,
        }
    }

    /// Rehydrate a record from persisted storage.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        employee_id: EmployeeId,
        user_id: UserId,
        name: String,
        start_date: DateTime<Utc>,
        facts: StepFacts,
        current_step: u8,
        completion_percentage: f64,
        completed_date: Option<DateTime<Utc>>,
        last_activity: DateTime<Utc>,
    ) -> Self {
        Self {
            employee_id,
            user_id,
            name,
            start_date,
            facts,
            current_step,
            completion_percentage,
            completed_date,
            last_activity,
        }
    }

    /// Applies one step update and recomputes the derived fields.
    ///
    /// `completed_date` is stamped with `now` only on the first call that
    /// leaves every step satisfied.
    pub fn record(&mut self, update: StepUpdate, now: DateTime<Utc>) {
        self.facts.apply(update);
        self.last_activity = now;
        self.recompute(now);
    }

    fn recompute(&mut self, now: DateTime<Utc>) {
        self.current_step = self.facts.current_step();
        self.completion_percentage = self.facts.completion_percentage();
        if self.facts.all_satisfied() && self.completed_date.is_none() {
            self.completed_date = Some(now);
        }
    }

    #[must_use]
    pub fn employee_id(&self) -> &EmployeeId {
        &self.employee_id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    #[must_use]
    pub fn facts(&self) -> &StepFacts {
        &self.facts
    }

    #[must_use]
    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    /// The step the employee is working on, or `None` once finished.
    #[must_use]
    pub fn current(&self) -> Option<Step> {
        StepNumber::new(self.current_step).ok().map(StepNumber::step)
    }

    #[must_use]
    pub fn completion_percentage(&self) -> f64 {
        self.completion_percentage
    }

    #[must_use]
    pub fn completed_date(&self) -> Option<DateTime<Utc>> {
        self.completed_date
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current_step == ALL_STEPS_DONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn fresh() -> EmployeeProgress {
        let user = UserId::new("U1");
        EmployeeProgress::new(
            EmployeeId::generate(&user, fixed_now()),
            user,
            "Avery",
            fixed_now(),
        )
    }

    fn check(step: u8) -> StepUpdate {
        StepUpdate::from_raw(step, true, None).unwrap()
    }

    fn score(step: u8, score: u32) -> StepUpdate {
        StepUpdate::from_raw(step, false, Some(score)).unwrap()
    }

    fn facts_from(bools: u8, history: u8, product: u8) -> StepFacts {
        let bit = |i: u8| bools & (1 << i) != 0;
        StepFacts {
            github_account: bit(0),
            environment: bit(1),
            history_quiz: history,
            product_quiz: product,
            team_integration: bit(2),
            technical_setup: bit(3),
            app_testing: bit(4),
            first_contribution: bit(5),
        }
    }

    #[test]
    fn new_record_starts_at_step_one() {
        let p = fresh();
        assert_eq!(p.current_step(), 1);
        assert!(p.completion_percentage().abs() < f64::EPSILON);
        assert_eq!(p.completed_date(), None);
        assert_eq!(p.last_activity(), p.start_date());
    }

    #[test]
    fn walkthrough_matches_expected_progression() {
        let mut p = fresh();
        let now = fixed_now();

        p.record(check(1), now);
        p.record(check(2), now);
        assert_eq!(p.current_step(), 3);
        assert!((p.completion_percentage() - 25.0).abs() < f64::EPSILON);

        p.record(score(3, 4), now);
        assert_eq!(p.current_step(), 4);
        assert!((p.completion_percentage() - 37.5).abs() < f64::EPSILON);

        p.record(score(4, 1), now);
        assert_eq!(p.current_step(), 4);
        assert!((p.completion_percentage() - 37.5).abs() < f64::EPSILON);
    }

    #[test]
    fn quiz_steps_ignore_completed_flag() {
        let update = StepUpdate::from_raw(3, true, None).unwrap();
        assert_eq!(
            update,
            StepUpdate::Score {
                quiz: QuizType::History,
                score: 0
            }
        );
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        assert_eq!(
            StepUpdate::from_raw(3, false, Some(5)),
            Err(ProgressError::ScoreOutOfRange {
                step: 3,
                score: 5,
                max: 4
            })
        );
        assert!(StepUpdate::from_raw(4, false, Some(4)).is_err());
        assert!(StepUpdate::from_raw(4, false, Some(u32::MAX)).is_err());
        assert!(StepUpdate::from_raw(4, false, Some(3)).is_ok());
    }

    #[test]
    fn best_score_never_lowers_a_pass() {
        let mut p = fresh();
        let now = fixed_now();
        p.record(check(1), now);
        p.record(check(2), now);

        p.record(StepUpdate::best_score(QuizType::History, 4).unwrap(), now);
        assert_eq!(p.current_step(), 4);

        p.record(StepUpdate::best_score(QuizType::History, 1).unwrap(), now);
        assert_eq!(p.facts().history_quiz, 4);
        assert_eq!(p.current_step(), 4);

        // a plain score still overwrites
        p.record(score(3, 1), now);
        assert_eq!(p.current_step(), 3);

        assert_eq!(
            StepUpdate::best_score(QuizType::Product, 4),
            Err(ProgressError::ScoreOutOfRange {
                step: 4,
                score: 4,
                max: 3
            })
        );
    }

    #[test]
    fn exhaustive_derivation_matches_invariants() {
        for bools in 0u8..64 {
            for history in 0..=QuizType::History.max_score() {
                for product in 0..=QuizType::Product.max_score() {
                    let facts = facts_from(bools, history, product);
                    let satisfied = [
                        bools & 1 != 0,
                        bools & 2 != 0,
                        history >= 3,
                        product >= 2,
                        bools & 4 != 0,
                        bools & 8 != 0,
                        bools & 16 != 0,
                        bools & 32 != 0,
                    ];
                    assert_eq!(facts.satisfaction(), satisfied);

                    let expected_step = satisfied
                        .iter()
                        .position(|s| !s)
                        .map_or(9, |i| i as u8 + 1);
                    assert_eq!(facts.current_step(), expected_step);

                    let count = satisfied.iter().filter(|s| **s).count();
                    let expected_pct = count as f64 / 8.0 * 100.0;
                    assert!((facts.completion_percentage() - expected_pct).abs() < 1e-9);

                    let full = (facts.completion_percentage() - 100.0).abs() < 1e-9;
                    assert_eq!(full, satisfied.iter().all(|s| *s));
                }
            }
        }
    }

    #[test]
    fn completed_date_is_set_once() {
        let mut p = fresh();
        let first = fixed_now() + Duration::hours(1);
        for step in [1, 2, 5, 6, 7, 8] {
            p.record(check(step), first);
        }
        p.record(score(3, 3), first);
        assert_eq!(p.completed_date(), None);
        p.record(score(4, 2), first);
        assert_eq!(p.current_step(), ALL_STEPS_DONE);
        assert!((p.completion_percentage() - 100.0).abs() < f64::EPSILON);
        assert_eq!(p.completed_date(), Some(first));
        assert!(p.is_complete());
        assert_eq!(p.current(), None);

        let later = first + Duration::days(2);
        p.record(check(1), later);
        assert_eq!(p.completed_date(), Some(first));
        assert_eq!(p.last_activity(), later);

        // Un-marking and re-completing keeps the original completion time.
        p.record(StepUpdate::from_raw(8, false, None).unwrap(), later);
        assert_eq!(p.current_step(), 8);
        p.record(check(8), later);
        assert_eq!(p.completed_date(), Some(first));
    }

    #[test]
    fn out_of_order_updates_are_recomputed_not_rejected() {
        let mut p = fresh();
        p.record(check(8), fixed_now());
        assert_eq!(p.current_step(), 1);
        assert!((p.completion_percentage() - 12.5).abs() < f64::EPSILON);
    }
}
