use std::sync::Arc;

use tracing::{debug, info, warn};

use onboard_core::model::{
    EmployeeId, EmployeeProgress, QuizAttempt, QuizType, StepUpdate, UserId,
};
use storage::repository::{
    ClearedRecords, ProgressEdit, ProgressRepository, ProgressUpdate, QuizAttemptRepository,
    Storage, StorageError,
};

use crate::Clock;
use crate::error::TrackerError;

/// Result of `ProgressTracker::create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(EmployeeId),
    /// The user already had a record; it was left untouched.
    AlreadyExists(EmployeeId),
}

impl CreateOutcome {
    #[must_use]
    pub fn employee_id(&self) -> &EmployeeId {
        match self {
            Self::Created(id) | Self::AlreadyExists(id) => id,
        }
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Owns the onboarding records and keeps their derived fields consistent.
///
/// Every step update reads, recomputes and writes inside one storage
/// transaction, so concurrent updates for the same employee cannot lose a
/// step, even across processes sharing one database.
#[derive(Clone)]
pub struct ProgressTracker {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Arc<dyn ProgressRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
    ) -> Self {
        Self {
            clock,
            progress,
            attempts,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.progress),
            Arc::clone(&storage.quiz_attempts),
        )
    }

    /// A tracker over the same records, reading time from `clock`.
    #[must_use]
    pub fn with_clock(&self, clock: Clock) -> Self {
        Self {
            clock,
            ..self.clone()
        }
    }

    /// Create a zeroed record for `user_id`, or report the existing one.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if persistence fails.
    pub async fn create(
        &self,
        user_id: &UserId,
        name: &str,
    ) -> Result<CreateOutcome, TrackerError> {
        if let Some(existing) = self.progress.progress_for_user(user_id).await? {
            debug!(user_id = %user_id, employee_id = %existing.employee_id(), "onboarding already started");
            return Ok(CreateOutcome::AlreadyExists(existing.employee_id().clone()));
        }

        let now = self.clock.now();
        let employee_id = EmployeeId::generate(user_id, now);
        let record = EmployeeProgress::new(employee_id.clone(), user_id.clone(), name, now);
        match self.progress.insert_progress(&record).await {
            Ok(()) => {}
            Err(StorageError::Conflict) => {
                // Someone else created the record after our lookup.
                let Some(existing) = self.progress.progress_for_user(user_id).await? else {
                    return Err(TrackerError::Storage(StorageError::Conflict));
                };
                debug!(user_id = %user_id, employee_id = %existing.employee_id(), "onboarding started concurrently");
                return Ok(CreateOutcome::AlreadyExists(existing.employee_id().clone()));
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user_id, employee_id = %employee_id, employee_name = name, "onboarding started");
        Ok(CreateOutcome::Created(employee_id))
    }

    /// Fetch the record for `user_id`. `None` means no record exists.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if the lookup fails.
    pub async fn get(&self, user_id: &UserId) -> Result<Option<EmployeeProgress>, TrackerError> {
        Ok(self.progress.progress_for_user(user_id).await?)
    }

    /// Record one step fact and recompute the derived fields.
    ///
    /// Quiz steps (3 and 4) store `score`, treating a missing score as 0, and
    /// ignore `completed`. Every other step stores `completed`.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Validation` for a step outside 1..=8 or a score
    /// outside the quiz range, `TrackerError::NotFound` if the user has no
    /// record, and `TrackerError::Storage` if persistence fails.
    pub async fn record_step(
        &self,
        user_id: &UserId,
        step: u8,
        completed: bool,
        score: Option<u32>,
    ) -> Result<EmployeeProgress, TrackerError> {
        let update = StepUpdate::from_raw(step, completed, score)?;
        self.apply(user_id, update).await
    }

    /// Apply an already validated update.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the user has no record and
    /// `TrackerError::Storage` if persistence fails.
    pub async fn apply(
        &self,
        user_id: &UserId,
        update: StepUpdate,
    ) -> Result<EmployeeProgress, TrackerError> {
        Ok(self.apply_if(user_id, update, |_| true).await?.progress)
    }

    /// Apply `update` only if `when` holds for the stored record. The check
    /// and the write happen in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the user has no record and
    /// `TrackerError::Storage` if persistence fails.
    pub async fn apply_if<F>(
        &self,
        user_id: &UserId,
        update: StepUpdate,
        when: F,
    ) -> Result<ProgressUpdate, TrackerError>
    where
        F: FnOnce(&EmployeeProgress) -> bool + Send + 'static,
    {
        let now = self.clock.now();
        let edit: ProgressEdit<'static> = Box::new(move |record: &mut EmployeeProgress| {
            if !when(&*record) {
                return false;
            }
            record.record(update, now);
            true
        });

        let result = self
            .progress
            .update_progress(user_id, edit)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => {
                    warn!(user_id = %user_id, step = %update.step(), "step update for unknown user");
                    TrackerError::NotFound(user_id.to_string())
                }
                other => TrackerError::Storage(other),
            })?;

        let record = &result.progress;
        debug!(
            user_id = %user_id,
            step = %update.step(),
            applied = result.applied,
            current_step = record.current_step(),
            completion = record.completion_percentage(),
            "progress recomputed"
        );
        if result.previous.completed_date().is_none() && record.completed_date().is_some() {
            info!(user_id = %user_id, employee_id = %record.employee_id(), "onboarding completed");
        }
        Ok(result)
    }

    /// Append a quiz attempt to the log. The progress record is not touched.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Validation` if `total_questions` is 0 or
    /// `score` exceeds it, `TrackerError::NotFound` if the employee is unknown,
    /// and `TrackerError::Storage` if persistence fails.
    pub async fn record_quiz_attempt(
        &self,
        employee_id: &EmployeeId,
        quiz: QuizType,
        score: u32,
        total_questions: u32,
    ) -> Result<i64, TrackerError> {
        let attempt = QuizAttempt::new(
            employee_id.clone(),
            quiz,
            score,
            total_questions,
            self.clock.now(),
        )?;

        let id = self
            .attempts
            .append_attempt(&attempt)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => TrackerError::NotFound(employee_id.to_string()),
                other => TrackerError::Storage(other),
            })?;

        debug!(employee_id = %employee_id, quiz = %quiz, score, total_questions, "quiz attempt logged");
        Ok(id)
    }

    /// Delete every record whose user id starts with `prefix`, along with the
    /// quiz attempts of those employees.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if the deletion fails.
    pub async fn clear_all(&self, prefix: &str) -> Result<ClearedRecords, TrackerError> {
        let cleared = self.progress.clear_by_user_prefix(prefix).await?;
        info!(
            prefix,
            progress = cleared.progress,
            attempts = cleared.attempts,
            "onboarding records cleared"
        );
        Ok(cleared)
    }

    /// All records, newest `start_date` first.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if the query fails.
    pub async fn list(&self) -> Result<Vec<EmployeeProgress>, TrackerError> {
        Ok(self.progress.list_progress().await?)
    }
}
