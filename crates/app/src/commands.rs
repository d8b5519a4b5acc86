//! Handlers behind each subcommand. Text goes to stdout, logs to stderr.

use anyhow::{Context, bail};
use serde::Serialize;

use onboard_core::model::{EmployeeId, QuizType, StepKind, StepNumber, UserId};
use services::{OnboardingServices, TrackerError, prompts};

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn not_started(user: &UserId) -> anyhow::Error {
    anyhow::anyhow!("{user} has not started onboarding; run `onboard start {user} <name>` first")
}

pub async fn start(
    services: &OnboardingServices,
    user: &UserId,
    name: &str,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = services.tracker().create(user, name).await?;
    let progress = services
        .tracker()
        .get(user)
        .await?
        .with_context(|| format!("record for {user} vanished after create"))?;

    if json {
        return print_json(&progress);
    }
    if outcome.is_new() {
        println!("{}\n", prompts::welcome(progress.name()));
    } else {
        println!("Welcome back, {}!\n", progress.name());
    }
    println!("{}", prompts::current_step(&progress));
    Ok(())
}

pub async fn step(services: &OnboardingServices, user: &UserId, json: bool) -> anyhow::Result<()> {
    let progress = services
        .tracker()
        .get(user)
        .await?
        .ok_or_else(|| not_started(user))?;
    if json {
        return print_json(&progress);
    }
    println!("{}", prompts::current_step(&progress));
    Ok(())
}

pub async fn progress(
    services: &OnboardingServices,
    user: &UserId,
    json: bool,
) -> anyhow::Result<()> {
    let progress = services
        .tracker()
        .get(user)
        .await?
        .ok_or_else(|| not_started(user))?;
    if json {
        return print_json(&progress);
    }
    println!("{}", prompts::progress_report(&progress));
    Ok(())
}

pub async fn complete(
    services: &OnboardingServices,
    user: &UserId,
    step: u8,
    json: bool,
) -> anyhow::Result<()> {
    if let StepKind::Quiz(quiz) = StepNumber::new(step)?.step().kind() {
        bail!("step {step} is the {quiz} quiz; use `answer` or `submit`");
    }
    let progress = match services.tracker().record_step(user, step, true, None).await {
        Err(TrackerError::NotFound(_)) => return Err(not_started(user)),
        other => other?,
    };

    if json {
        return print_json(&progress);
    }
    println!("{}\n\nStep {step} completed!\n", prompts::celebration());
    println!("{}", prompts::current_step(&progress));
    Ok(())
}

pub async fn record(
    services: &OnboardingServices,
    user: &UserId,
    step: u8,
    done: bool,
    score: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let progress = services
        .tracker()
        .record_step(user, step, done, score)
        .await?;
    if json {
        return print_json(&progress);
    }
    println!("{}", prompts::progress_report(&progress));
    Ok(())
}

pub async fn answer(
    services: &OnboardingServices,
    user: &UserId,
    quiz: QuizType,
    question: usize,
    option: usize,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = services
        .quizzes()
        .answer(user, quiz, question, option)
        .await?;

    if json {
        return print_json(&serde_json::json!({
            "correct": outcome.feedback.correct,
            "correct_option": outcome.feedback.correct_option,
            "explanation": outcome.feedback.explanation,
            "progress": outcome.advanced,
        }));
    }

    let feedback = &outcome.feedback;
    if feedback.correct {
        println!("Correct! {}", feedback.explanation);
    } else {
        println!(
            "Not quite. The correct answer is: {}\n{}",
            feedback.correct_option, feedback.explanation
        );
    }
    if let Some(progress) = outcome.advanced {
        println!(
            "\n{} completed! Moving to the next step...\n",
            quiz.step().label()
        );
        println!("{}", prompts::current_step(&progress));
    }
    Ok(())
}

pub async fn submit(
    services: &OnboardingServices,
    user: &UserId,
    quiz: QuizType,
    answers: &[usize],
    json: bool,
) -> anyhow::Result<()> {
    let submission = match services.quizzes().submit(user, quiz, answers).await {
        Err(TrackerError::NotFound(_)) => return Err(not_started(user)),
        other => other?,
    };

    if json {
        return print_json(&submission);
    }
    println!(
        "{}: {}/{} correct.",
        quiz.step().label(),
        submission.score,
        submission.total
    );
    if submission.passed {
        println!("{}\n", prompts::celebration());
    } else {
        println!(
            "You need {} to pass. Give it another go!\n",
            quiz.pass_threshold()
        );
    }
    println!("{}", prompts::current_step(&submission.progress));
    Ok(())
}

pub async fn dashboard(services: &OnboardingServices, json: bool) -> anyhow::Result<()> {
    let summary = services.reports().team_summary().await?;
    if json {
        return print_json(&summary);
    }
    println!("{}", prompts::dashboard(&summary));
    Ok(())
}

pub async fn analytics(services: &OnboardingServices, json: bool) -> anyhow::Result<()> {
    let now = services.clock().now();
    let analytics = services.reports().analytics(now).await?;
    if json {
        return print_json(&analytics);
    }

    println!("Total employees:     {}", analytics.total_employees);
    println!("Completed:           {}", analytics.completed_employees);
    println!("Average completion:  {:.1}%", analytics.avg_completion);
    println!("Completion rate:     {:.1}%", analytics.completion_rate);
    println!("Avg days to finish:  {:.1}", analytics.avg_completion_days);
    println!("\nStep completion:");
    for s in &analytics.step_completion {
        println!(
            "  {}. {:<20} {}/{} ({:.0}%)",
            s.step, s.label, s.completed, s.total, s.percentage
        );
    }
    println!("\nStarts in the last {} days:", services::report_service::DAILY_STARTS_WINDOW_DAYS);
    for (day, count) in &analytics.daily_starts {
        println!("  {day}: {count}");
    }
    Ok(())
}

pub async fn employee(
    services: &OnboardingServices,
    employee_id: &EmployeeId,
    json: bool,
) -> anyhow::Result<()> {
    let details = services
        .reports()
        .employee_details(employee_id)
        .await?
        .with_context(|| format!("no onboarding record for employee {employee_id}"))?;
    if json {
        return print_json(&details);
    }

    println!("{}", prompts::progress_report(&details.progress));
    println!("Started: {}", details.progress.start_date().format("%Y-%m-%d %H:%M"));
    if let Some(done) = details.progress.completed_date() {
        println!("Completed: {}", done.format("%Y-%m-%d %H:%M"));
    }
    if details.quiz_attempts.is_empty() {
        println!("No quiz attempts yet.");
    } else {
        println!("\nQuiz attempts:");
        for a in &details.quiz_attempts {
            println!(
                "  {} {}: {}/{} ({:.0}%)",
                a.attempt_date.format("%Y-%m-%d %H:%M"),
                a.quiz_type,
                a.score,
                a.total_questions,
                a.percentage
            );
        }
    }
    Ok(())
}

pub async fn demo_seed(services: &OnboardingServices, json: bool) -> anyhow::Result<()> {
    let report = services.demo().seed().await?;
    if json {
        return print_json(&report);
    }
    for name in &report.created {
        println!("Created {name}");
    }
    for name in &report.skipped {
        println!("{name} already exists, skipping");
    }
    println!("\nDemo data ready. Run `onboard dashboard` to see it.");
    Ok(())
}

pub async fn demo_clear(services: &OnboardingServices, json: bool) -> anyhow::Result<()> {
    let cleared = services.demo().clear().await?;
    if json {
        return print_json(&cleared);
    }
    println!(
        "Demo data cleared: {} records, {} quiz attempts.",
        cleared.progress, cleared.attempts
    );
    Ok(())
}
