use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{RunId, SectionId};
use crate::model::session::CapturedSecret;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("a session record needs at least one captured secret")]
    NoSecrets,
}

/// Emitted once per section when its passphrase is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub run_id: RunId,
    pub section_id: SectionId,
    pub captured_secret: String,
    /// Only set for the distraction-gated section.
    pub distraction_score: Option<u32>,
    pub completed_at: DateTime<Utc>,
}

/// One captured secret inside a [`SessionRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedSecret {
    pub section_id: SectionId,
    pub secret: String,
}

impl From<&CapturedSecret> for RecordedSecret {
    fn from(c: &CapturedSecret) -> Self {
        Self {
            section_id: c.section_id.clone(),
            secret: c.secret.clone(),
        }
    }
}

/// Aggregate for a fully completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    run_id: RunId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    secrets: Vec<RecordedSecret>,
    distraction_score: u32,
}

impl SessionRecord {
    /// # Errors
    ///
    /// Returns `RecordError` if the time range is inverted or no secrets were captured.
    pub fn new(
        run_id: RunId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        secrets: Vec<RecordedSecret>,
        distraction_score: u32,
    ) -> Result<Self, RecordError> {
        if completed_at < started_at {
            return Err(RecordError::InvalidTimeRange);
        }
        if secrets.is_empty() {
            return Err(RecordError::NoSecrets);
        }
        Ok(Self {
            run_id,
            started_at,
            completed_at,
            secrets,
            distraction_score,
        })
    }

    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn secrets(&self) -> &[RecordedSecret] {
        &self.secrets
    }

    #[must_use]
    pub fn distraction_score(&self) -> u32 {
        self.distraction_score
    }

    #[must_use]
    pub fn secret_for(&self, section_id: &SectionId) -> Option<&str> {
        self.secrets
            .iter()
            .find(|s| &s.section_id == section_id)
            .map(|s| s.secret.as_str())
    }
}
