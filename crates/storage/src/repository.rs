use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use workshop_core::model::{
    CompletionEvent, EntryId, LeaderboardEntry, NewLeaderboardEntry, RunId, SessionRecord,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Record store for section completions and finished runs.
///
/// The workshop hands events over and never retries on the store's behalf.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// Append a per-section completion event.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the event cannot be stored.
    async fn append_completion(&self, event: &CompletionEvent) -> Result<i64, StorageError>;

    /// All completion events of one run, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn completions_for_run(
        &self,
        run_id: RunId,
    ) -> Result<Vec<CompletionEvent>, StorageError>;

    /// Append the aggregate record of a completed run.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a record for the same run already exists.
    async fn append_session_record(&self, record: &SessionRecord) -> Result<i64, StorageError>;

    /// Fetch a session record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_session_record(&self, id: i64) -> Result<SessionRecord, StorageError>;
}

/// Leaderboard entries, listed in submission order.
#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    /// Store a validated entry and return it with its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn add_entry(
        &self,
        entry: &NewLeaderboardEntry,
        created_at: DateTime<Utc>,
    ) -> Result<LeaderboardEntry, StorageError>;

    /// Up to `limit` entries, earliest `created_at` first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_entries(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, StorageError>;
}

#[derive(Default)]
struct InMemoryState {
    completions: Vec<CompletionEvent>,
    records: Vec<(i64, SessionRecord)>,
    entries: Vec<LeaderboardEntry>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn next_id(len: usize) -> Result<i64, StorageError> {
    i64::try_from(len + 1).map_err(|_| StorageError::Serialization("id overflow".into()))
}

#[async_trait]
impl CompletionRepository for InMemoryRepository {
    async fn append_completion(&self, event: &CompletionEvent) -> Result<i64, StorageError> {
        let mut guard = self.lock()?;
        let id = next_id(guard.completions.len())?;
        guard.completions.push(event.clone());
        Ok(id)
    }

    async fn completions_for_run(
        &self,
        run_id: RunId,
    ) -> Result<Vec<CompletionEvent>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .completions
            .iter()
            .filter(|e| e.run_id == run_id)
            .cloned()
            .collect())
    }

    async fn append_session_record(&self, record: &SessionRecord) -> Result<i64, StorageError> {
        let mut guard = self.lock()?;
        if guard.records.iter().any(|(_, r)| r.run_id() == record.run_id()) {
            return Err(StorageError::Conflict);
        }
        let id = next_id(guard.records.len())?;
        guard.records.push((id, record.clone()));
        Ok(id)
    }

    async fn get_session_record(&self, id: i64) -> Result<SessionRecord, StorageError> {
        let guard = self.lock()?;
        guard
            .records
            .iter()
            .find(|(rid, _)| *rid == id)
            .map(|(_, r)| r.clone())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl LeaderboardRepository for InMemoryRepository {
    async fn add_entry(
        &self,
        entry: &NewLeaderboardEntry,
        created_at: DateTime<Utc>,
    ) -> Result<LeaderboardEntry, StorageError> {
        let mut guard = self.lock()?;
        let id = u64::try_from(guard.entries.len() + 1)
            .map_err(|_| StorageError::Serialization("entry id overflow".into()))?;
        let stored = LeaderboardEntry::from_new(EntryId::new(id), entry.clone(), created_at);
        guard.entries.push(stored.clone());
        Ok(stored)
    }

    async fn list_entries(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let guard = self.lock()?;
        let mut out = guard.entries.clone();
        out.sort_by_key(|e| (e.created_at, e.id));
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub completions: Arc<dyn CompletionRepository>,
    pub leaderboard: Arc<dyn LeaderboardRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let completions: Arc<dyn CompletionRepository> = Arc::new(repo.clone());
        let leaderboard: Arc<dyn LeaderboardRepository> = Arc::new(repo);
        Self {
            completions,
            leaderboard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workshop_core::model::{LeaderboardEntryDraft, RecordedSecret, SectionId};
    use workshop_core::time::fixed_now;

    fn record(run_id: RunId) -> SessionRecord {
        SessionRecord::new(
            run_id,
            fixed_now(),
            fixed_now(),
            vec![RecordedSecret {
                section_id: SectionId::new("hearing"),
                secret: "banana".into(),
            }],
            2,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn completions_are_grouped_by_run() {
        let repo = InMemoryRepository::new();
        let (run_a, run_b) = (RunId::generate(), RunId::generate());
        for (run, section) in [(run_a, "hearing"), (run_b, "hearing"), (run_a, "vision")] {
            let event = CompletionEvent {
                run_id: run,
                section_id: SectionId::new(section),
                captured_secret: "x".into(),
                distraction_score: None,
                completed_at: fixed_now(),
            };
            repo.append_completion(&event).await.unwrap();
        }

        let events = repo.completions_for_run(run_a).await.unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.section_id.as_str()).collect();
        assert_eq!(ids, ["hearing", "vision"]);
    }

    #[tokio::test]
    async fn duplicate_session_record_conflicts() {
        let repo = InMemoryRepository::new();
        let run = RunId::generate();
        let id = repo.append_session_record(&record(run)).await.unwrap();
        assert_eq!(repo.get_session_record(id).await.unwrap().run_id(), run);
        assert!(matches!(
            repo.append_session_record(&record(run)).await,
            Err(StorageError::Conflict)
        ));
        assert!(matches!(
            repo.get_session_record(id + 10).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn leaderboard_lists_first_submission_first() {
        let repo = InMemoryRepository::new();
        let later = fixed_now() + chrono::Duration::minutes(5);
        let b = LeaderboardEntryDraft::new("Bo", "bo@example.org", "9").validate().unwrap();
        let a = LeaderboardEntryDraft::new("Al", "al@example.org", "1").validate().unwrap();
        repo.add_entry(&b, later).await.unwrap();
        repo.add_entry(&a, fixed_now()).await.unwrap();

        let names: Vec<String> = repo
            .list_entries(10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["Al", "Bo"]);
        assert_eq!(repo.list_entries(1).await.unwrap().len(), 1);
    }
}
