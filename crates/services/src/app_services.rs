use std::sync::Arc;

use storage::repository::Storage;
use workshop_core::model::WorkshopSettings;

use crate::Clock;
use crate::error::AppServicesError;
use crate::leaderboard_service::LeaderboardService;
use crate::sessions::WorkshopService;

/// Assembles the services the binary talks to.
#[derive(Clone)]
pub struct AppServices {
    workshop: Arc<WorkshopService>,
    leaderboard: Arc<LeaderboardService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: WorkshopSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    /// Build services over volatile in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: WorkshopSettings) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings)
    }

    fn from_storage(storage: &Storage, clock: Clock, settings: WorkshopSettings) -> Self {
        let workshop = Arc::new(
            WorkshopService::new(clock, Arc::clone(&storage.completions)).with_settings(settings),
        );
        let leaderboard = Arc::new(LeaderboardService::new(
            clock,
            Arc::clone(&storage.leaderboard),
        ));
        Self {
            workshop,
            leaderboard,
        }
    }

    #[must_use]
    pub fn workshop(&self) -> Arc<WorkshopService> {
        Arc::clone(&self.workshop)
    }

    #[must_use]
    pub fn leaderboard(&self) -> Arc<LeaderboardService> {
        Arc::clone(&self.leaderboard)
    }
}
