use serde::Serialize;
use tracing::info;

use onboard_core::model::{QuizType, Step, StepKind, UserId};
use storage::repository::ClearedRecords;

use crate::error::TrackerError;
use crate::tracker::{CreateOutcome, ProgressTracker};

/// User id prefix shared by every demo employee.
pub const DEMO_USER_PREFIX: &str = "U00";

struct DemoEmployee {
    user_id: &'static str,
    name: &'static str,
    /// Steps 1 through this one are recorded as done.
    progress: u8,
    history: u8,
    product: u8,
}

const DEMO_EMPLOYEES: [DemoEmployee; 5] = [
    DemoEmployee {
        user_id: "U001TEMPEST",
        name: "Tempest Storm",
        progress: 3,
        history: 3,
        product: 0,
    },
    DemoEmployee {
        user_id: "U002ALEX",
        name: "Alex Chen",
        progress: 8,
        history: 4,
        product: 3,
    },
    DemoEmployee {
        user_id: "U003JORDAN",
        name: "Jordan Kim",
        progress: 5,
        history: 4,
        product: 2,
    },
    DemoEmployee {
        user_id: "U004RILEY",
        name: "Riley Martinez",
        progress: 1,
        history: 0,
        product: 0,
    },
    DemoEmployee {
        user_id: "U005SAGE",
        name: "Sage Thompson",
        progress: 6,
        history: 3,
        product: 3,
    },
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

/// Populates and removes the sample employees used to demo the dashboard.
#[derive(Clone)]
pub struct DemoDataService {
    tracker: ProgressTracker,
}

impl DemoDataService {
    #[must_use]
    pub fn new(tracker: ProgressTracker) -> Self {
        Self { tracker }
    }

    /// Create each demo employee at its preset progress, skipping any that
    /// already exist.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError` if a record cannot be created or updated.
    pub async fn seed(&self) -> Result<SeedReport, TrackerError> {
        let mut report = SeedReport::default();

        for demo in &DEMO_EMPLOYEES {
            let user = UserId::new(demo.user_id);
            if let CreateOutcome::AlreadyExists(_) = self.tracker.create(&user, demo.name).await? {
                report.skipped.push(demo.name.to_owned());
                continue;
            }

            for step in Step::ALL.iter().take(usize::from(demo.progress)) {
                let score = match step.kind() {
                    StepKind::Quiz(QuizType::History) => Some(u32::from(demo.history)),
                    StepKind::Quiz(QuizType::Product) => Some(u32::from(demo.product)),
                    StepKind::Checkbox => None,
                };
                self.tracker
                    .record_step(&user, step.number().value(), true, score)
                    .await?;
            }
            report.created.push(demo.name.to_owned());
        }

        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            "demo employees seeded"
        );
        Ok(report)
    }

    /// Remove every demo employee and their quiz attempts.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if the deletion fails.
    pub async fn clear(&self) -> Result<ClearedRecords, TrackerError> {
        self.tracker.clear_all(DEMO_USER_PREFIX).await
    }
}
