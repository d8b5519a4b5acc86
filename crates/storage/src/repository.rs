use async_trait::async_trait;
use onboard_core::model::{EmployeeId, EmployeeProgress, QuizAttempt, UserId};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Row counts removed by a bulk clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearedRecords {
    pub progress: u64,
    pub attempts: u64,
}

/// Quiz attempt as read back from storage, with its surrogate row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttemptRecord {
    pub id: i64,
    pub attempt: QuizAttempt,
}

/// Change applied to a stored record inside `ProgressRepository::update_progress`.
///
/// Returns `false` to leave the record as it is.
pub type ProgressEdit<'a> = Box<dyn FnOnce(&mut EmployeeProgress) -> bool + Send + 'a>;

/// Outcome of `ProgressRepository::update_progress`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// The record as read, before the edit.
    pub previous: EmployeeProgress,
    /// The record as stored afterwards.
    pub progress: EmployeeProgress,
    /// Whether the edit asked for a write.
    pub applied: bool,
}

/// Repository contract for onboarding progress records.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Insert a brand-new record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user id or employee id is taken.
    async fn insert_progress(&self, progress: &EmployeeProgress) -> Result<(), StorageError>;

    /// Read the record for `user_id`, run `edit` on it and write it back, all
    /// under one write transaction. Concurrent writers, in this process or
    /// another one sharing the database, wait for each other.
    ///
    /// `start_date`, `user_id` and `name` are left as first inserted, and a
    /// stored `completed_date` is never cleared.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user has no record; nothing is
    /// written then.
    async fn update_progress(
        &self,
        user_id: &UserId,
        edit: ProgressEdit<'_>,
    ) -> Result<ProgressUpdate, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn progress_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<EmployeeProgress>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn progress_for_employee(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Option<EmployeeProgress>, StorageError>;

    /// All records, most recent `start_date` first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_progress(&self) -> Result<Vec<EmployeeProgress>, StorageError>;

    /// Delete every record whose user id starts with `prefix`, together with
    /// those employees' quiz attempts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the deletion fails; nothing is deleted then.
    async fn clear_by_user_prefix(&self, prefix: &str) -> Result<ClearedRecords, StorageError>;
}

/// Repository contract for the append-only quiz attempt log.
#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    /// Append an attempt and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the employee has no progress record.
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<i64, StorageError>;

    /// Attempts for one employee, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn attempts_for(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<QuizAttemptRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<EmployeeId, EmployeeProgress>>>,
    attempts: Arc<Mutex<Vec<QuizAttemptRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn insert_progress(&self, progress: &EmployeeProgress) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        let taken = guard.contains_key(progress.employee_id())
            || guard.values().any(|p| p.user_id() == progress.user_id());
        if taken {
            return Err(StorageError::Conflict);
        }
        guard.insert(progress.employee_id().clone(), progress.clone());
        Ok(())
    }

    async fn update_progress(
        &self,
        user_id: &UserId,
        edit: ProgressEdit<'_>,
    ) -> Result<ProgressUpdate, StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        let existing = guard
            .values_mut()
            .find(|p| p.user_id() == user_id)
            .ok_or(StorageError::NotFound)?;

        let previous = existing.clone();
        let mut progress = previous.clone();
        let applied = edit(&mut progress);
        if applied {
            *existing = EmployeeProgress::from_persisted(
                previous.employee_id().clone(),
                previous.user_id().clone(),
                previous.name().to_owned(),
                previous.start_date(),
                *progress.facts(),
                progress.current_step(),
                progress.completion_percentage(),
                previous.completed_date().or(progress.completed_date()),
                progress.last_activity(),
            );
        }
        Ok(ProgressUpdate {
            previous,
            progress: existing.clone(),
            applied,
        })
    }

    async fn progress_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<EmployeeProgress>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.values().find(|p| p.user_id() == user_id).cloned())
    }

    async fn progress_for_employee(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Option<EmployeeProgress>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.get(employee_id).cloned())
    }

    async fn list_progress(&self) -> Result<Vec<EmployeeProgress>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        let mut all: Vec<_> = guard.values().cloned().collect();
        all.sort_by(|a, b| {
            b.start_date()
                .cmp(&a.start_date())
                .then_with(|| a.employee_id().cmp(b.employee_id()))
        });
        Ok(all)
    }

    async fn clear_by_user_prefix(&self, prefix: &str) -> Result<ClearedRecords, StorageError> {
        let mut progress = self.progress.lock().map_err(poisoned)?;
        let mut attempts = self.attempts.lock().map_err(poisoned)?;

        let doomed: Vec<EmployeeId> = progress
            .values()
            .filter(|p| p.user_id().as_str().starts_with(prefix))
            .map(|p| p.employee_id().clone())
            .collect();

        let before = attempts.len();
        attempts.retain(|r| !doomed.contains(r.attempt.employee_id()));
        let removed_attempts = before - attempts.len();

        for id in &doomed {
            progress.remove(id);
        }

        Ok(ClearedRecords {
            progress: doomed.len() as u64,
            attempts: removed_attempts as u64,
        })
    }
}

#[async_trait]
impl QuizAttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<i64, StorageError> {
        {
            let progress = self.progress.lock().map_err(poisoned)?;
            if !progress.contains_key(attempt.employee_id()) {
                return Err(StorageError::NotFound);
            }
        }
        let mut guard = self.attempts.lock().map_err(poisoned)?;
        let id = guard.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        guard.push(QuizAttemptRecord {
            id,
            attempt: attempt.clone(),
        });
        Ok(id)
    }

    async fn attempts_for(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<QuizAttemptRecord>, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        let mut found: Vec<_> = guard
            .iter()
            .filter(|r| r.attempt.employee_id() == employee_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.attempt
                .attempt_date()
                .cmp(&a.attempt.attempt_date())
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(found)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub quiz_attempts: Arc<dyn QuizAttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let quiz_attempts: Arc<dyn QuizAttemptRepository> = Arc::new(repo);
        Self {
            progress,
            quiz_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use onboard_core::model::{QuizType, StepUpdate};
    use onboard_core::time::fixed_now;

    fn record(user: &str, offset_days: i64) -> EmployeeProgress {
        let user = UserId::new(user);
        let at = fixed_now() + Duration::days(offset_days);
        EmployeeProgress::new(EmployeeId::generate(&user, at), user, "Test", at)
    }

    #[tokio::test]
    async fn duplicate_user_is_a_conflict() {
        let repo = InMemoryRepository::new();
        repo.insert_progress(&record("U1", 0)).await.unwrap();
        let err = repo.insert_progress(&record("U1", 1)).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    fn check(step: u8) -> ProgressEdit<'static> {
        Box::new(move |p: &mut EmployeeProgress| {
            p.record(
                StepUpdate::from_raw(step, true, None).unwrap(),
                fixed_now() + Duration::hours(3),
            );
            true
        })
    }

    #[tokio::test]
    async fn update_keeps_start_date_and_updates_facts() {
        let repo = InMemoryRepository::new();
        repo.insert_progress(&record("U1", 0)).await.unwrap();

        let update = repo
            .update_progress(&UserId::new("U1"), check(1))
            .await
            .unwrap();
        assert!(update.applied);
        assert_eq!(update.previous.current_step(), 1);
        assert_eq!(update.progress.current_step(), 2);

        let loaded = repo
            .progress_for_user(&UserId::new("U1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, update.progress);
        assert_eq!(loaded.start_date(), fixed_now());
        assert_eq!(loaded.last_activity(), fixed_now() + Duration::hours(3));
    }

    #[tokio::test]
    async fn declined_update_writes_nothing() {
        let repo = InMemoryRepository::new();
        repo.insert_progress(&record("U1", 0)).await.unwrap();

        let update = repo
            .update_progress(&UserId::new("U1"), Box::new(|_: &mut EmployeeProgress| false))
            .await
            .unwrap();
        assert!(!update.applied);
        assert_eq!(update.progress, update.previous);

        let missing = repo
            .update_progress(&UserId::new("U2"), check(1))
            .await
            .unwrap_err();
        assert!(matches!(missing, StorageError::NotFound));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let repo = InMemoryRepository::new();
        repo.insert_progress(&record("U1", 0)).await.unwrap();
        repo.insert_progress(&record("U2", 2)).await.unwrap();
        repo.insert_progress(&record("U3", 1)).await.unwrap();

        let users: Vec<_> = repo
            .list_progress()
            .await
            .unwrap()
            .iter()
            .map(|p| p.user_id().to_string())
            .collect();
        assert_eq!(users, vec!["U2", "U3", "U1"]);
    }

    #[tokio::test]
    async fn attempts_require_existing_employee() {
        let repo = InMemoryRepository::new();
        let attempt = QuizAttempt::new(
            EmployeeId::new("emp_missing"),
            QuizType::History,
            1,
            4,
            fixed_now(),
        )
        .unwrap();
        assert!(matches!(
            repo.append_attempt(&attempt).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn clear_removes_matching_users_and_their_attempts() {
        let repo = InMemoryRepository::new();
        let demo = record("U001A", 0);
        let real = record("W9", 0);
        repo.insert_progress(&demo).await.unwrap();
        repo.insert_progress(&real).await.unwrap();
        for p in [&demo, &real] {
            let attempt = QuizAttempt::new(
                p.employee_id().clone(),
                QuizType::Product,
                2,
                3,
                fixed_now(),
            )
            .unwrap();
            repo.append_attempt(&attempt).await.unwrap();
        }

        let cleared = repo.clear_by_user_prefix("U00").await.unwrap();
        assert_eq!(
            cleared,
            ClearedRecords {
                progress: 1,
                attempts: 1
            }
        );
        assert_eq!(repo.list_progress().await.unwrap().len(), 1);
        assert_eq!(
            repo.attempts_for(real.employee_id()).await.unwrap().len(),
            1
        );
    }
}
