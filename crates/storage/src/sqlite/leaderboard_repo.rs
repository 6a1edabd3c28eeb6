use chrono::{DateTime, Utc};
use workshop_core::model::{EntryId, LeaderboardEntry, NewLeaderboardEntry};

use super::SqliteRepository;
use super::mapping::{conn, map_entry_row};
use crate::repository::{LeaderboardRepository, StorageError};

#[async_trait::async_trait]
impl LeaderboardRepository for SqliteRepository {
    async fn add_entry(
        &self,
        entry: &NewLeaderboardEntry,
        created_at: DateTime<Utc>,
    ) -> Result<LeaderboardEntry, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO leaderboard (name, email, score, created_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(entry.name())
        .bind(entry.email())
        .bind(i64::from(entry.score()))
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("entry id sign overflow".into()))?;
        Ok(LeaderboardEntry::from_new(
            EntryId::new(id),
            entry.clone(),
            created_at,
        ))
    }

    async fn list_entries(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, name, email, score, created_at
                FROM leaderboard
                ORDER BY created_at ASC, id ASC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(map_entry_row(row)?);
        }
        Ok(out)
    }
}
