use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::EntryId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LeaderboardEntryError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("email cannot be empty")]
    EmptyEmail,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("score is required")]
    MissingScore,

    #[error("score must be a non-negative whole number, got {raw:?}")]
    InvalidScore { raw: String },
}

/// Unvalidated leaderboard submission, as typed into a form.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardEntryDraft {
    pub name: String,
    pub email: String,
    pub score: String,
}

/// Validated submission, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLeaderboardEntry {
    name: String,
    email: String,
    score: u32,
}

impl LeaderboardEntryDraft {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        score: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            score: score.into(),
        }
    }

    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardEntryError` if a field is missing or malformed.
    pub fn validate(self) -> Result<NewLeaderboardEntry, LeaderboardEntryError> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let score_raw = self.score.trim();

        if name.is_empty() {
            return Err(LeaderboardEntryError::EmptyName);
        }
        if email.is_empty() {
            return Err(LeaderboardEntryError::EmptyEmail);
        }
        if !looks_like_email(&email) {
            return Err(LeaderboardEntryError::InvalidEmail);
        }
        if score_raw.is_empty() {
            return Err(LeaderboardEntryError::MissingScore);
        }
        let score = score_raw
            .parse::<u32>()
            .map_err(|_| LeaderboardEntryError::InvalidScore {
                raw: score_raw.to_string(),
            })?;

        Ok(NewLeaderboardEntry { name, email, score })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

impl NewLeaderboardEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }
}

/// A stored leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: EntryId,
    pub name: String,
    pub email: String,
    pub score: u32,
    pub created_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    #[must_use]
    pub fn from_new(id: EntryId, entry: NewLeaderboardEntry, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: entry.name,
            email: entry.email,
            score: entry.score,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_parses() {
        let entry = LeaderboardEntryDraft::new("  Ada ", " ada@example.org", " 4 ")
            .validate()
            .unwrap();
        assert_eq!(entry.name(), "Ada");
        assert_eq!(entry.email(), "ada@example.org");
        assert_eq!(entry.score(), 4);
    }

    #[test]
    fn rejects_missing_fields() {
        assert_eq!(
            LeaderboardEntryDraft::new(" ", "a@b.c", "1").validate().unwrap_err(),
            LeaderboardEntryError::EmptyName
        );
        assert_eq!(
            LeaderboardEntryDraft::new("a", "", "1").validate().unwrap_err(),
            LeaderboardEntryError::EmptyEmail
        );
        assert_eq!(
            LeaderboardEntryDraft::new("a", "a@b.c", "").validate().unwrap_err(),
            LeaderboardEntryError::MissingScore
        );
    }

    #[test]
    fn rejects_malformed_email_and_score() {
        assert_eq!(
            LeaderboardEntryDraft::new("a", "nope", "1").validate().unwrap_err(),
            LeaderboardEntryError::InvalidEmail
        );
        assert!(matches!(
            LeaderboardEntryDraft::new("a", "a@b.c", "-3").validate(),
            Err(LeaderboardEntryError::InvalidScore { .. })
        ));
    }
}
