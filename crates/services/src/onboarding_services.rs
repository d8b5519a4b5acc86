use storage::repository::Storage;

use crate::Clock;
use crate::demo_service::DemoDataService;
use crate::error::ServicesError;
use crate::quiz_service::QuizService;
use crate::report_service::ReportService;
use crate::tracker::ProgressTracker;

/// Assembles the onboarding services over one shared store.
#[derive(Clone)]
pub struct OnboardingServices {
    clock: Clock,
    tracker: ProgressTracker,
    quizzes: QuizService,
    reports: ReportService,
    demo: DemoDataService,
}

impl OnboardingServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock) -> Self {
        let tracker = ProgressTracker::from_storage(clock, storage);
        Self {
            clock,
            quizzes: QuizService::new(tracker.clone()),
            reports: ReportService::from_storage(storage),
            demo: DemoDataService::new(tracker.clone()),
            tracker,
        }
    }

    /// Build services backed by `SQLite` storage, running migrations first.
    ///
    /// # Errors
    ///
    /// Returns `ServicesError::Sqlite` if the database cannot be opened or migrated.
    pub async fn sqlite(db_url: &str, clock: Clock) -> Result<Self, ServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock))
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    #[must_use]
    pub fn quizzes(&self) -> &QuizService {
        &self.quizzes
    }

    #[must_use]
    pub fn reports(&self) -> &ReportService {
        &self.reports
    }

    #[must_use]
    pub fn demo(&self) -> &DemoDataService {
        &self.demo
    }
}
