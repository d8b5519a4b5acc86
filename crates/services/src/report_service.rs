use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use onboard_core::model::{EmployeeId, EmployeeProgress, QuizType, Step};
use storage::repository::{ProgressRepository, QuizAttemptRepository, Storage};

use crate::error::ReportError;

/// Window for the daily-starts series, counted back from today.
pub const DAILY_STARTS_WINDOW_DAYS: i64 = 30;

/// How many employees have satisfied one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepCompletion {
    pub step: u8,
    pub label: &'static str,
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

/// Aggregate numbers across every onboarding record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub total_employees: usize,
    pub completed_employees: usize,
    pub avg_completion: f64,
    pub completion_rate: f64,
    pub step_completion: Vec<StepCompletion>,
    pub daily_starts: BTreeMap<NaiveDate, usize>,
    pub avg_completion_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptView {
    pub quiz_type: QuizType,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: f64,
    pub attempt_date: DateTime<Utc>,
}

/// One record with its quiz history, newest attempt first.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeDetails {
    pub progress: EmployeeProgress,
    pub quiz_attempts: Vec<AttemptView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamLine {
    pub name: String,
    pub completion_percentage: f64,
    pub current_step: u8,
    pub complete: bool,
}

/// The per-employee listing shown on the team dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    pub lines: Vec<TeamLine>,
    pub total_employees: usize,
    pub completed_employees: usize,
    pub avg_completion: f64,
}

/// Read-only reporting over stored records.
#[derive(Clone)]
pub struct ReportService {
    progress: Arc<dyn ProgressRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
}

impl ReportService {
    #[must_use]
    pub fn new(
        progress: Arc<dyn ProgressRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
    ) -> Self {
        Self { progress, attempts }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(
            Arc::clone(&storage.progress),
            Arc::clone(&storage.quiz_attempts),
        )
    }

    /// Compute dashboard analytics as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if records cannot be loaded.
    pub async fn analytics(&self, now: DateTime<Utc>) -> Result<Analytics, ReportError> {
        let records = self.progress.list_progress().await?;
        Ok(compute_analytics(&records, now))
    }

    /// A record and its quiz attempts, or `None` for an unknown employee.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if records cannot be loaded.
    pub async fn employee_details(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Option<EmployeeDetails>, ReportError> {
        let Some(progress) = self.progress.progress_for_employee(employee_id).await? else {
            return Ok(None);
        };

        let quiz_attempts = self
            .attempts
            .attempts_for(employee_id)
            .await?
            .into_iter()
            .map(|r| AttemptView {
                quiz_type: r.attempt.quiz_type(),
                score: r.attempt.score(),
                total_questions: r.attempt.total_questions(),
                percentage: r.attempt.percentage(),
                attempt_date: r.attempt.attempt_date(),
            })
            .collect();

        Ok(Some(EmployeeDetails {
            progress,
            quiz_attempts,
        }))
    }

    /// # Errors
    ///
    /// Returns `ReportError::Storage` if records cannot be loaded.
    pub async fn team_summary(&self) -> Result<TeamSummary, ReportError> {
        let records = self.progress.list_progress().await?;
        let lines = records
            .iter()
            .map(|p| TeamLine {
                name: p.name().to_owned(),
                completion_percentage: p.completion_percentage(),
                current_step: p.current_step(),
                complete: p.is_complete(),
            })
            .collect();

        Ok(TeamSummary {
            lines,
            total_employees: records.len(),
            completed_employees: records.iter().filter(|p| p.is_complete()).count(),
            avg_completion: average(records.iter().map(EmployeeProgress::completion_percentage)),
        })
    }
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0_u32), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum / f64::from(n) }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = part as f64 / whole as f64 * 100.0;
    pct
}

pub(crate) fn compute_analytics(records: &[EmployeeProgress], now: DateTime<Utc>) -> Analytics {
    let total = records.len();
    let completed = records.iter().filter(|p| p.is_complete()).count();

    let step_completion = Step::ALL
        .iter()
        .map(|&step| {
            let done = records
                .iter()
                .filter(|p| p.facts().is_satisfied(step))
                .count();
            StepCompletion {
                step: step.number().value(),
                label: step.label(),
                completed: done,
                total,
                percentage: ratio(done, total),
            }
        })
        .collect();

    let cutoff = (now - Duration::days(DAILY_STARTS_WINDOW_DAYS)).date_naive();
    let mut daily_starts = BTreeMap::new();
    for p in records {
        let day = p.start_date().date_naive();
        if day >= cutoff {
            *daily_starts.entry(day).or_insert(0) += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let avg_completion_days = average(records.iter().filter_map(|p| {
        p.completed_date()
            .map(|done| (done - p.start_date()).num_seconds() as f64 / 86_400.0)
    }));

    Analytics {
        total_employees: total,
        completed_employees: completed,
        avg_completion: average(records.iter().map(EmployeeProgress::completion_percentage)),
        completion_rate: ratio(completed, total),
        step_completion,
        daily_starts,
        avg_completion_days,
    }
}
