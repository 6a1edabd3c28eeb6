use thiserror::Error;

use crate::model::{
    LeaderboardEntryError, PlanError, ProblemError, RecordError, SectionError, SessionStateError,
    SettingsError,
};
use crate::pools::PoolError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Section(#[from] SectionError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Session(#[from] SessionStateError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Leaderboard(#[from] LeaderboardEntryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
