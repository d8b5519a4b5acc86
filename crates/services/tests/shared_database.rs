use onboard_core::model::{QuizType, UserId};
use onboard_core::time::fixed_clock;
use services::OnboardingServices;

/// Two independently opened service stacks over one database file, the way
/// two CLI invocations would see it.
async fn two_processes(dir: &tempfile::TempDir) -> (OnboardingServices, OnboardingServices) {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("onboard.sqlite3").display());
    let first = OnboardingServices::sqlite(&url, fixed_clock()).await.unwrap();
    let second = OnboardingServices::sqlite(&url, fixed_clock()).await.unwrap();
    (first, second)
}

#[tokio::test]
async fn concurrent_starts_create_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = two_processes(&dir).await;
    let user = UserId::new("U1");

    let (left, right) = tokio::join!(
        a.tracker().create(&user, "Avery"),
        b.tracker().create(&user, "Avery")
    );
    let (left, right) = (left.unwrap(), right.unwrap());

    assert_eq!(left.is_new() as u8 + right.is_new() as u8, 1);
    assert_eq!(left.employee_id(), right.employee_id());
    assert_eq!(a.tracker().list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn step_updates_from_both_sides_are_all_kept() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = two_processes(&dir).await;
    let user = UserId::new("U1");
    a.tracker().create(&user, "Avery").await.unwrap();

    let (r1, r2, r5, r6) = tokio::join!(
        a.tracker().record_step(&user, 1, true, None),
        b.tracker().record_step(&user, 2, true, None),
        a.tracker().record_step(&user, 5, true, None),
        b.tracker().record_step(&user, 6, true, None)
    );
    for result in [r1, r2, r5, r6] {
        result.unwrap();
    }

    let seen_by_b = b.tracker().get(&user).await.unwrap().unwrap();
    assert_eq!(seen_by_b.current_step(), 3);
    assert!((seen_by_b.completion_percentage() - 50.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn weaker_retake_elsewhere_keeps_the_pass() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = two_processes(&dir).await;
    let user = UserId::new("U1");
    a.tracker().create(&user, "Avery").await.unwrap();
    a.tracker().record_step(&user, 1, true, None).await.unwrap();
    a.tracker().record_step(&user, 2, true, None).await.unwrap();

    let (strong, weak) = tokio::join!(
        a.quizzes().submit(&user, QuizType::History, &[1, 1, 3, 0]),
        b.quizzes().submit(&user, QuizType::History, &[0, 0, 0, 0])
    );
    assert!(strong.unwrap().passed);
    assert!(!weak.unwrap().passed);

    let record = b.tracker().get(&user).await.unwrap().unwrap();
    assert_eq!(record.facts().history_quiz, 3);
    assert_eq!(record.current_step(), 4);
}
