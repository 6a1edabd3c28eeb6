//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use workshop_core::model::{LeaderboardEntryError, RecordError, SectionId, SessionStateError};

/// Errors emitted by `DistractionScheduler`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchedulerError {
    #[error("distraction scheduler needs a running tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// Caller errors from the session controller and workflow.
///
/// `Rejected`, `Blocked` and wrong distraction answers are outcomes, not errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,
    #[error("session already completed")]
    Completed,
    #[error("session is not complete yet")]
    Incomplete,
    #[error("section `{0}` has no distraction")]
    NoDistraction(SectionId),
    #[error("unknown section `{0}`")]
    UnknownSection(SectionId),
    #[error("section `{got}` is not the current section (`{expected}` is)")]
    NotCurrent { expected: SectionId, got: SectionId },
    #[error(transparent)]
    State(#[from] SessionStateError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LeaderboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LeaderboardError {
    #[error(transparent)]
    Entry(#[from] LeaderboardEntryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
