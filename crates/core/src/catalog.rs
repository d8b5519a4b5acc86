//! Static onboarding content: step instructions and quiz banks.
//!
//! Nothing here is persisted. Front ends render it around the progress
//! record; only quiz grading feeds back into the tracker.

use crate::error::ProgressError;
use crate::model::{QuizType, Step};

//
// ─── STEP GUIDES ──────────────────────────────────────────────────────────────
//

/// How the front end asks the employee to prove a step is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Manual,
    Screenshot,
    Quiz(QuizType),
}

/// Human-facing description of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepGuide {
    pub step: Step,
    pub title: &'static str,
    pub description: &'static str,
    pub instructions: &'static [&'static str],
    pub validation: Validation,
}

static GUIDES: [StepGuide; Step::COUNT] = [
    StepGuide {
        step: Step::GithubAccount,
        title: "Create GitHub Account",
        description: "Set up your GitHub account for code collaboration",
        instructions: &[
            "Go to GitHub.com and click 'Sign Up'",
            "Choose a fun username (K-pop themed encouraged!)",
            "Use your email address and create a strong password",
            "Verify your email address",
            "Share your GitHub username with me!",
        ],
        validation: Validation::Manual,
    },
    StepGuide {
        step: Step::Environment,
        title: "Development Environment Setup",
        description: "Install and configure your coding environment",
        instructions: &[
            "Download Visual Studio Code from code.visualstudio.com",
            "Install VS Code following the setup wizard",
            "Clone the repository using Git",
            "Take a screenshot of VS Code with the project open",
            "Share the screenshot to confirm setup!",
        ],
        validation: Validation::Screenshot,
    },
    StepGuide {
        step: Step::HistoryQuiz,
        title: "Learn Katbus History",
        description: "Test your knowledge of our company background",
        instructions: &[
            "Read through the history.md file in the repository",
            "Take the interactive quiz below",
            "Score at least 75% to proceed to the next step",
        ],
        validation: Validation::Quiz(QuizType::History),
    },
    StepGuide {
        step: Step::ProductQuiz,
        title: "Understand Our Product",
        description: "Learn about Katlib and our educational mission",
        instructions: &[
            "Read through the product.md file",
            "Take the product knowledge quiz",
            "Score at least 67% to proceed",
        ],
        validation: Validation::Quiz(QuizType::Product),
    },
    StepGuide {
        step: Step::TeamIntegration,
        title: "Join the Team",
        description: "Add yourself to our team structure",
        instructions: &[
            "Open team_structure.md in VS Code",
            "Add your information to the New Team Member section",
            "Include your name, role, bio, and Slack handle",
            "Save the file and confirm completion",
        ],
        validation: Validation::Manual,
    },
    StepGuide {
        step: Step::TechnicalSetup,
        title: "Install Requirements",
        description: "Set up the technical dependencies",
        instructions: &[
            "Open Terminal in VS Code",
            "Run: pip install -r requirements.txt",
            "Wait for installation to complete",
            "Confirm successful installation",
        ],
        validation: Validation::Manual,
    },
    StepGuide {
        step: Step::AppTesting,
        title: "Run Katlib",
        description: "Test the application and play the game",
        instructions: &[
            "Open katlib_gui.py in VS Code",
            "Click the Run button (play icon)",
            "Play through the Mad Libs game",
            "Take a screenshot of the completed story",
            "Share your experience!",
        ],
        validation: Validation::Screenshot,
    },
    StepGuide {
        step: Step::FirstContribution,
        title: "First Contribution",
        description: "Make your first code contribution",
        instructions: &[
            "Make a small change to the game (add a word, change a color)",
            "Use VS Code's Source Control to stage changes",
            "Write a commit message describing your changes",
            "Commit and sync changes to GitHub",
            "Share your contribution details!",
        ],
        validation: Validation::Manual,
    },
];

#[must_use]
pub fn guide(step: Step) -> &'static StepGuide {
    &GUIDES[step.index()]
}

//
// ─── QUIZZES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question: &'static str,
    pub options: &'static [&'static str],
    pub correct: usize,
    pub explanation: &'static str,
}

static HISTORY_QUIZ: [QuizQuestion; 4] = [
    QuizQuestion {
        question: "What year was Katbus founded?",
        options: &["2020", "2021", "2022", "2023"],
        correct: 1,
        explanation: "Katbus was founded in 2021 by Shay as a passion project!",
    },
    QuizQuestion {
        question: "What inspired the name 'Katbus'?",
        options: &[
            "A cat riding a bus",
            "KATSEYE and Catbus from Studio Ghibli",
            "A keyboard shortcut",
            "A type of computer",
        ],
        correct: 1,
        explanation: "The name combines KATSEYE (K-pop group) and Catbus (Studio Ghibli character)!",
    },
    QuizQuestion {
        question: "How many team members does Katbus have today?",
        options: &["4", "5", "6", "7"],
        correct: 3,
        explanation: "Katbus has grown to a team of 7 passionate individuals!",
    },
    QuizQuestion {
        question: "What was the first version of Katlib?",
        options: &[
            "A web app",
            "A mobile game",
            "A Python Mad Libs game",
            "A board game",
        ],
        correct: 2,
        explanation: "Katlib started as a simple Python Mad Libs game!",
    },
];

static PRODUCT_QUIZ: [QuizQuestion; 3] = [
    QuizQuestion {
        question: "What is the main goal of Katlib?",
        options: &[
            "To teach math",
            "To make coding fun through storytelling",
            "To create music",
            "To design websites",
        ],
        correct: 1,
        explanation: "Katlib makes coding education engaging through K-pop storytelling!",
    },
    QuizQuestion {
        question: "What programming language is Katlib written in?",
        options: &["JavaScript", "Python", "Java", "C++"],
        correct: 1,
        explanation: "Katlib is built with Python for educational accessibility!",
    },
    QuizQuestion {
        question: "What makes Katlib special?",
        options: &[
            "It's free",
            "It combines K-pop with coding",
            "It's only for kids",
            "It's very fast",
        ],
        correct: 1,
        explanation: "The unique combination of K-pop culture and coding education makes Katlib special!",
    },
];

/// Question bank for a quiz. Its length equals `quiz.max_score()`.
#[must_use]
pub fn questions(quiz: QuizType) -> &'static [QuizQuestion] {
    match quiz {
        QuizType::History => &HISTORY_QUIZ,
        QuizType::Product => &PRODUCT_QUIZ,
    }
}

/// Result of grading a single answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_option: &'static str,
    pub explanation: &'static str,
}

/// Grades one answer by question and option index.
///
/// # Errors
///
/// Returns `ProgressError::InvalidQuestion` or `ProgressError::InvalidOption`
/// when either index is out of range.
pub fn grade_answer(
    quiz: QuizType,
    question: usize,
    option: usize,
) -> Result<AnswerFeedback, ProgressError> {
    let q = questions(quiz)
        .get(question)
        .ok_or(ProgressError::InvalidQuestion {
            quiz,
            index: question,
        })?;
    if option >= q.options.len() {
        return Err(ProgressError::InvalidOption {
            quiz,
            question,
            option,
        });
    }
    Ok(AnswerFeedback {
        correct: option == q.correct,
        correct_option: q.options[q.correct],
        explanation: q.explanation,
    })
}

/// Grades a full answer sheet and returns the number of correct answers.
///
/// # Errors
///
/// Returns `ProgressError::AnswerCount` if the sheet does not answer every
/// question exactly once, or an option error for an out-of-range answer.
pub fn grade_sheet(quiz: QuizType, answers: &[usize]) -> Result<u32, ProgressError> {
    let bank = questions(quiz);
    if answers.len() != bank.len() {
        return Err(ProgressError::AnswerCount {
            quiz,
            expected: bank.len(),
            actual: answers.len(),
        });
    }
    let mut score = 0;
    for (i, option) in answers.iter().enumerate() {
        if grade_answer(quiz, i, *option)?.correct {
            score += 1;
        }
    }
    Ok(score)
}
