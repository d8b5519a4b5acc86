//! Plain-text renderings of onboarding records for chat-style front ends.

use std::fmt::Write;

use rand::seq::IndexedRandom;

use onboard_core::catalog::{self, Validation};
use onboard_core::model::{EmployeeProgress, QuizType, Step, StepKind};

use crate::report_service::TeamSummary;

const CELEBRATIONS: [&str; 5] = [
    "Awesome job! You're making great progress!",
    "Fantastic! You're one step closer to joining the team!",
    "Well done! Keep up the amazing work!",
    "Excellent! You're crushing this onboarding!",
    "Great work! The team is excited to have you!",
];

/// A randomly chosen line to print after a step is marked done.
#[must_use]
pub fn celebration() -> &'static str {
    CELEBRATIONS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(CELEBRATIONS[0])
}

#[must_use]
pub fn welcome(name: &str) -> String {
    format!(
        "Welcome to Katbus, {name}!\n\n\
         I'll guide you through our {} step onboarding: set up your environment, \
         learn our history and product, meet the team and make your first contribution.\n\
         Your progress is tracked as you go.",
        Step::COUNT
    )
}

/// Instructions for the employee's current step, or the completion message.
#[must_use]
pub fn current_step(progress: &EmployeeProgress) -> String {
    let Some(step) = progress.current() else {
        return completion(progress);
    };
    let guide = catalog::guide(step);

    let mut out = String::new();
    let _ = writeln!(out, "Step {}: {}", step.number(), guide.title);
    let _ = writeln!(
        out,
        "Progress: {:.0}% complete\n\n{}\n\nInstructions:",
        progress.completion_percentage(),
        guide.description
    );
    for line in guide.instructions {
        let _ = writeln!(out, "  - {line}");
    }

    match guide.validation {
        Validation::Quiz(quiz) => out.push_str(&quiz_sheet(quiz)),
        Validation::Manual | Validation::Screenshot => {
            let _ = write!(out, "\nMark it done with `complete <user> {}`.", step.number());
        }
    }
    out
}

/// Questions with lettered options, numbered from 0 for answering.
#[must_use]
pub fn quiz_sheet(quiz: QuizType) -> String {
    let mut out = String::new();
    for (i, q) in catalog::questions(quiz).iter().enumerate() {
        let _ = writeln!(out, "\nQuestion {i}: {}", q.question);
        for (j, option) in q.options.iter().enumerate() {
            let _ = writeln!(out, "  {j}) {option}");
        }
    }
    out
}

#[must_use]
pub fn completion(progress: &EmployeeProgress) -> String {
    format!(
        "Congratulations! Onboarding complete!\n\n\
         Amazing work, {}! You've completed all {} steps of the Katbus onboarding process. \
         Welcome to the team!\n\n\
         What's next?\n  - Join our team channels\n  - Start contributing to projects\n  \
         - Attend team meetings\n  - Keep learning and growing with us!",
        progress.name(),
        Step::COUNT
    )
}

/// Per-step checklist for one employee.
#[must_use]
pub fn progress_report(progress: &EmployeeProgress) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Onboarding Progress: {:.0}%\n{}\n",
        progress.completion_percentage(),
        progress.name()
    );
    let facts = progress.facts();
    for step in Step::ALL {
        let status = match step.kind() {
            _ if facts.is_satisfied(step) => "done".to_owned(),
            StepKind::Quiz(quiz) => format!("{}/{}", facts.score(quiz), quiz.max_score()),
            StepKind::Checkbox => "pending".to_owned(),
        };
        let _ = writeln!(out, "{}. {}: {status}", step.number(), step.label());
    }
    out
}

/// The team listing followed by summary totals.
#[must_use]
pub fn dashboard(summary: &TeamSummary) -> String {
    if summary.lines.is_empty() {
        return "No onboarding records found.".to_owned();
    }

    let mut out = String::from("Team Onboarding Dashboard\n\n");
    for line in &summary.lines {
        let status = if line.complete {
            "Complete".to_owned()
        } else {
            format!("Step {}/{}", line.current_step, Step::COUNT)
        };
        let _ = writeln!(
            out,
            "  - {}: {:.0}% - {status}",
            line.name, line.completion_percentage
        );
    }
    let _ = write!(
        out,
        "\nSummary:\n  - Total Employees: {}\n  - Completed: {}\n  - Average Progress: {:.1}%",
        summary.total_employees, summary.completed_employees, summary.avg_completion
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report_service::TeamLine;
    use onboard_core::model::{EmployeeId, StepUpdate, UserId};
    use onboard_core::time::fixed_now;

    fn record() -> EmployeeProgress {
        let user = UserId::new("U1");
        EmployeeProgress::new(EmployeeId::generate(&user, fixed_now()), user, "Avery", fixed_now())
    }

    #[test]
    fn celebration_is_one_of_the_known_lines() {
        for _ in 0..20 {
            assert!(CELEBRATIONS.contains(&celebration()));
        }
    }

    #[test]
    fn current_step_renders_quiz_for_quiz_steps() {
        let mut p = record();
        let text = current_step(&p);
        assert!(text.starts_with("Step 1: Create GitHub Account"));
        assert!(text.contains("complete <user> 1"));

        for step in 1..=2 {
            p.record(StepUpdate::from_raw(step, true, None).unwrap(), fixed_now());
        }
        let text = current_step(&p);
        assert!(text.starts_with("Step 3:"));
        assert!(text.contains("Progress: 25% complete"));
        assert!(text.contains("Question 0: What year was Katbus founded?"));
    }

    #[test]
    fn progress_report_shows_partial_quiz_scores() {
        let mut p = record();
        p.record(StepUpdate::from_raw(4, true, Some(1)).unwrap(), fixed_now());
        let text = progress_report(&p);
        assert!(text.contains("4. Product Quiz: 1/3"));
        assert!(text.contains("1. GitHub Account: pending"));
    }

    #[test]
    fn dashboard_lists_lines_and_totals() {
        let summary = TeamSummary {
            lines: vec![
                TeamLine {
                    name: "Alex".into(),
                    completion_percentage: 100.0,
                    current_step: 9,
                    complete: true,
                },
                TeamLine {
                    name: "Riley".into(),
                    completion_percentage: 12.5,
                    current_step: 2,
                    complete: false,
                },
            ],
            total_employees: 2,
            completed_employees: 1,
            avg_completion: 56.25,
        };
        let text = dashboard(&summary);
        assert!(text.contains("Alex: 100% - Complete"));
        assert!(text.contains("Riley: 12% - Step 2/8") || text.contains("Riley: 13% - Step 2/8"));
        assert!(text.contains("Average Progress: 56.2%") || text.contains("Average Progress: 56.3%"));
    }
}
