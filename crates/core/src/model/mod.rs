mod ids;
mod progress;
mod quiz;
mod step;

pub use ids::{EmployeeId, UserId};
pub use progress::{ALL_STEPS_DONE, EmployeeProgress, StepFacts, StepUpdate};
pub use quiz::QuizAttempt;
pub use step::{QuizType, Step, StepKind, StepNumber};
