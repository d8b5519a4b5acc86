use chrono::Duration;
use onboard_core::model::{
    EmployeeId, EmployeeProgress, QuizAttempt, QuizType, StepUpdate, UserId,
};
use onboard_core::time::fixed_now;
use storage::repository::{
    ClearedRecords, ProgressEdit, ProgressRepository, QuizAttemptRepository, StorageError,
};
use storage::sqlite::SqliteRepository;

async fn repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn record_steps(
    steps: Vec<(u8, Option<u32>)>,
    at: chrono::DateTime<chrono::Utc>,
) -> ProgressEdit<'static> {
    Box::new(move |p: &mut EmployeeProgress| {
        for (step, score) in steps {
            p.record(StepUpdate::from_raw(step, true, score).unwrap(), at);
        }
        true
    })
}

fn employee(user: &str, days: i64) -> EmployeeProgress {
    let user = UserId::new(user);
    let at = fixed_now() + Duration::days(days);
    EmployeeProgress::new(EmployeeId::generate(&user, at), user, format!("Name {days}"), at)
}

#[tokio::test]
async fn sqlite_roundtrips_progress_and_derived_fields() {
    let repo = repo("memdb_progress_roundtrip").await;
    let p = employee("U1", 0);
    repo.insert_progress(&p).await.unwrap();

    let later = fixed_now() + Duration::hours(5);
    let update = repo
        .update_progress(
            &UserId::new("U1"),
            record_steps(vec![(1, None), (2, None), (3, Some(4)), (4, Some(1))], later),
        )
        .await
        .unwrap();
    assert!(update.applied);
    assert_eq!(update.previous, p);
    let p = update.progress;

    let loaded = repo
        .progress_for_user(&UserId::new("U1"))
        .await
        .unwrap()
        .expect("present");
    assert_eq!(loaded, p);
    assert_eq!(loaded.current_step(), 4);
    assert!((loaded.completion_percentage() - 37.5).abs() < f64::EPSILON);
    assert_eq!(loaded.facts().history_quiz, 4);
    assert_eq!(loaded.facts().product_quiz, 1);
    assert_eq!(loaded.last_activity(), later);

    let by_employee = repo
        .progress_for_employee(p.employee_id())
        .await
        .unwrap()
        .expect("present");
    assert_eq!(by_employee.user_id(), &UserId::new("U1"));
}

#[tokio::test]
async fn sqlite_rejects_duplicate_user_and_unknown_update() {
    let repo = repo("memdb_progress_conflict").await;
    repo.insert_progress(&employee("U1", 0)).await.unwrap();

    let dup = repo.insert_progress(&employee("U1", 1)).await.unwrap_err();
    assert!(matches!(dup, StorageError::Conflict));

    let missing = repo
        .update_progress(&UserId::new("U2"), record_steps(vec![(1, None)], fixed_now()))
        .await
        .unwrap_err();
    assert!(matches!(missing, StorageError::NotFound));

    assert!(
        repo.progress_for_user(&UserId::new("U2"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn sqlite_never_clears_completed_date() {
    let repo = repo("memdb_completed_date").await;
    let p = employee("U1", 0);
    repo.insert_progress(&p).await.unwrap();
    let user = UserId::new("U1");

    let done_at = fixed_now() + Duration::days(3);
    let steps = (1..=8)
        .map(|step| {
            let score = match step {
                3 => Some(4),
                4 => Some(3),
                _ => None,
            };
            (step, score)
        })
        .collect();
    let done = repo
        .update_progress(&user, record_steps(steps, done_at))
        .await
        .unwrap()
        .progress;
    assert_eq!(done.completed_date(), Some(done_at));

    // An edit that drops the completion date must not erase the stored one.
    repo.update_progress(
        &user,
        Box::new(move |p: &mut EmployeeProgress| {
            *p = EmployeeProgress::from_persisted(
                p.employee_id().clone(),
                p.user_id().clone(),
                p.name().to_owned(),
                p.start_date(),
                *p.facts(),
                p.current_step(),
                p.completion_percentage(),
                None,
                done_at + Duration::days(1),
            );
            true
        }),
    )
    .await
    .unwrap();

    let loaded = repo
        .progress_for_employee(p.employee_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.completed_date(), Some(done_at));
    assert_eq!(loaded.current_step(), 9);
}

#[tokio::test]
async fn sqlite_lists_newest_first_and_logs_attempts() {
    let repo = repo("memdb_list_attempts").await;
    let first = employee("U1", 0);
    let second = employee("U2", 4);
    repo.insert_progress(&first).await.unwrap();
    repo.insert_progress(&second).await.unwrap();

    let listed = repo.list_progress().await.unwrap();
    assert_eq!(listed[0].user_id(), second.user_id());
    assert_eq!(listed[1].user_id(), first.user_id());

    let older =
        QuizAttempt::new(first.employee_id().clone(), QuizType::History, 2, 4, fixed_now())
            .unwrap();
    let newer = QuizAttempt::new(
        first.employee_id().clone(),
        QuizType::Product,
        3,
        3,
        fixed_now() + Duration::minutes(10),
    )
    .unwrap();
    let id1 = repo.append_attempt(&older).await.unwrap();
    let id2 = repo.append_attempt(&newer).await.unwrap();
    assert!(id2 > id1);

    let attempts = repo.attempts_for(first.employee_id()).await.unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].attempt, newer);
    assert_eq!(attempts[1].attempt, older);

    let orphan =
        QuizAttempt::new(EmployeeId::new("emp_ghost_1"), QuizType::History, 1, 4, fixed_now())
            .unwrap();
    assert!(matches!(
        repo.append_attempt(&orphan).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_clear_matches_literal_prefix() {
    let repo = repo("memdb_clear_prefix").await;
    let demo = employee("U001TEMPEST", 0);
    let other = employee("U1X", 0);
    let percent = employee("U%9", 0);
    for p in [&demo, &other, &percent] {
        repo.insert_progress(p).await.unwrap();
        let attempt =
            QuizAttempt::new(p.employee_id().clone(), QuizType::History, 4, 4, fixed_now())
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

    let cleared = repo.clear_by_user_prefix("U%").await.unwrap();
    assert_eq!(cleared.progress, 1);

    let remaining = repo.list_progress().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_id(), other.user_id());
    assert!(repo.attempts_for(demo.employee_id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn declined_edit_leaves_the_row_alone() {
    let repo = repo("memdb_declined_edit").await;
    let p = employee("U1", 0);
    repo.insert_progress(&p).await.unwrap();

    let update = repo
        .update_progress(&UserId::new("U1"), Box::new(|_: &mut EmployeeProgress| false))
        .await
        .unwrap();
    assert!(!update.applied);

    // the transaction was released, so a later write still goes through
    repo.update_progress(&UserId::new("U1"), record_steps(vec![(1, None)], fixed_now()))
        .await
        .unwrap();
    let loaded = repo.progress_for_employee(p.employee_id()).await.unwrap().unwrap();
    assert_eq!(loaded.current_step(), 2);
}

/// Two pools on one database file stand in for two separate processes.
async fn file_repos(dir: &tempfile::TempDir) -> (SqliteRepository, SqliteRepository) {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("onboard.sqlite3").display());
    let first = SqliteRepository::connect(&url).await.expect("connect first");
    first.migrate().await.expect("migrate");
    let second = SqliteRepository::connect(&url).await.expect("connect second");
    second.migrate().await.expect("migrate again");
    (first, second)
}

#[tokio::test]
async fn updates_from_separate_pools_do_not_lose_steps() {
    let dir = tempfile::tempdir().unwrap();
    let (first, second) = file_repos(&dir).await;
    first.insert_progress(&employee("U1", 0)).await.unwrap();

    let mut handles = Vec::new();
    for (i, step) in [1u8, 2, 5, 6, 7, 8].into_iter().enumerate() {
        let repo = if i % 2 == 0 { first.clone() } else { second.clone() };
        handles.push(tokio::spawn(async move {
            repo.update_progress(&UserId::new("U1"), record_steps(vec![(step, None)], fixed_now()))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for repo in [&first, &second] {
        let loaded = repo
            .progress_for_user(&UserId::new("U1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.current_step(), 3);
        assert!((loaded.completion_percentage() - 75.0).abs() < f64::EPSILON);
    }
}

#[tokio::test]
async fn second_pool_sees_duplicate_insert_as_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let (first, second) = file_repos(&dir).await;

    first.insert_progress(&employee("U1", 0)).await.unwrap();
    let err = second.insert_progress(&employee("U1", 1)).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = repo("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    assert!(repo.list_progress().await.unwrap().is_empty());
}
