#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    CompletionRepository, InMemoryRepository, LeaderboardRepository, Storage, StorageError,
};
