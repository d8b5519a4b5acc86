//! Domain model for onboarding progress: steps, derived progress, quiz
//! attempts, and the static checklist content.

#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod model;
pub mod time;

pub use error::ProgressError;
pub use time::Clock;
