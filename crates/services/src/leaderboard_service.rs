use std::sync::Arc;

use tracing::info;

use storage::repository::LeaderboardRepository;
use workshop_core::model::{LeaderboardEntry, LeaderboardEntryDraft};

use crate::Clock;
use crate::error::LeaderboardError;

/// Validates and records leaderboard submissions.
#[derive(Clone)]
pub struct LeaderboardService {
    clock: Clock,
    entries: Arc<dyn LeaderboardRepository>,
}

impl LeaderboardService {
    pub const DEFAULT_LIMIT: u32 = 100;

    #[must_use]
    pub fn new(clock: Clock, entries: Arc<dyn LeaderboardRepository>) -> Self {
        Self { clock, entries }
    }

    /// Validate `draft` and append it, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Entry` for invalid input and
    /// `LeaderboardError::Storage` if the append fails.
    pub async fn submit(
        &self,
        draft: LeaderboardEntryDraft,
    ) -> Result<LeaderboardEntry, LeaderboardError> {
        let entry = draft.validate()?;
        let stored = self.entries.add_entry(&entry, self.clock.now()).await?;
        info!(entry_id = %stored.id, score = stored.score, "leaderboard entry added");
        Ok(stored)
    }

    /// Entries in submission order, earliest first.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` on repository failures.
    pub async fn list(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        Ok(self.entries.list_entries(limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use storage::repository::InMemoryRepository;
    use workshop_core::model::LeaderboardEntryError;
    use workshop_core::time::fixed_clock;

    #[tokio::test]
    async fn rejects_invalid_drafts_without_storing() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = LeaderboardService::new(fixed_clock(), repo);

        let err = service
            .submit(LeaderboardEntryDraft::new("Ada", "not-an-email", "3"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LeaderboardError::Entry(LeaderboardEntryError::InvalidEmail)
        ));
        let err = service
            .submit(LeaderboardEntryDraft::new("", "ada@example.org", "3"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LeaderboardError::Entry(LeaderboardEntryError::EmptyName)
        ));
        assert!(service.list(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lists_in_submission_order() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut clock = fixed_clock();
        for (name, score) in [("Ada", "7"), ("Linus", "2"), ("Grace", "11")] {
            let service = LeaderboardService::new(clock, repo.clone());
            service
                .submit(LeaderboardEntryDraft::new(name, format!("{name}@example.org"), score))
                .await
                .unwrap();
            clock.advance(Duration::minutes(1));
        }

        let service = LeaderboardService::new(clock, repo);
        let names: Vec<String> = service
            .list(LeaderboardService::DEFAULT_LIMIT)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["Ada", "Linus", "Grace"]);
    }
}
