#![forbid(unsafe_code)]

pub mod demo_service;
pub mod error;
pub mod onboarding_services;
pub mod prompts;
pub mod quiz_service;
pub mod report_service;
pub mod tracker;

pub use onboard_core::Clock;

pub use demo_service::{DemoDataService, SeedReport};
pub use error::{ReportError, ServicesError, TrackerError};
pub use onboarding_services::OnboardingServices;
pub use quiz_service::{AnswerOutcome, QuizService, QuizSubmission};
pub use report_service::{Analytics, EmployeeDetails, ReportService, TeamSummary};
pub use tracker::{CreateOutcome, ProgressTracker};
