#![forbid(unsafe_code)]

pub mod app_services;
pub mod distraction;
pub mod error;
pub mod leaderboard_service;
pub mod sessions;

pub use sessions as session;
pub use workshop_core::Clock;

pub use app_services::AppServices;
pub use distraction::DistractionScheduler;
pub use error::{AppServicesError, LeaderboardError, SchedulerError, SessionError};
pub use leaderboard_service::LeaderboardService;

pub use sessions::{
    AdvanceOutcome, PersistenceStatus, Progress, SessionController, SubmitResult, WorkshopService,
};
