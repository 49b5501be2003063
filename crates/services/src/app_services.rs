use std::sync::Arc;

use storage::repository::{Storage, UserRepository};
use storage::seed::{SeedReport, ensure_seed_data};
use tracing::info;

use crate::Clock;
use crate::attempt_service::AttemptService;
use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::import::ImportWizard;
use crate::lesson_service::LessonService;
use crate::session::Session;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    lessons: Arc<LessonService>,
    attempts: Arc<AttemptService>,
    dashboard: Arc<DashboardService>,
    seed_report: SeedReport,
}

impl AppServices {
    /// Build services over a fresh in-memory store holding the demo data.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if seeding fails.
    pub async fn new_in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        Self::from_storage(Storage::in_memory(), clock).await
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or seeding fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, clock).await
    }

    /// Seed an empty store with the demo data and wire the services.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if seeding fails.
    pub async fn from_storage(storage: Storage, clock: Clock) -> Result<Self, AppServicesError> {
        let seed_report = ensure_seed_data(&storage, clock.now()).await?;

        let lessons = Arc::new(LessonService::new(clock, Arc::clone(&storage.lessons)));
        let attempts = Arc::new(AttemptService::new(
            clock,
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.attempts),
        ));
        let dashboard = Arc::new(DashboardService::new(
            Arc::clone(&lessons),
            Arc::clone(&attempts),
        ));
        info!(
            users_seeded = seed_report.users_added,
            lessons_seeded = seed_report.lessons_added,
            "services ready"
        );

        Ok(Self {
            clock,
            users: storage.users,
            lessons,
            attempts,
            dashboard,
            seed_report,
        })
    }

    /// Start a session on the first user of the directory.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Session` if the directory cannot be read or is empty.
    pub async fn session(&self) -> Result<Session, AppServicesError> {
        Ok(Session::load(self.users.as_ref()).await?)
    }

    #[must_use]
    pub fn import_wizard(&self) -> ImportWizard {
        ImportWizard::new(self.clock, Arc::clone(&self.lessons))
    }

    #[must_use]
    pub fn seed_report(&self) -> SeedReport {
        self.seed_report
    }

    #[must_use]
    pub fn users(&self) -> Arc<dyn UserRepository> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn attempts(&self) -> Arc<AttemptService> {
        Arc::clone(&self.attempts)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }
}
