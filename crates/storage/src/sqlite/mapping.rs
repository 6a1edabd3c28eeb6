use sqlx::Row;
use workshop_core::model::{CompletionEvent, EntryId, LeaderboardEntry, RunId, SectionId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    let unique = e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        StorageError::Conflict
    } else {
        StorageError::Connection(e.to_string())
    }
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn run_id_from_str(raw: &str) -> Result<RunId, StorageError> {
    raw.parse::<RunId>().map_err(ser)
}

pub(crate) fn section_id_from_str(raw: &str) -> Result<SectionId, StorageError> {
    raw.parse::<SectionId>().map_err(ser)
}

pub(crate) fn map_completion_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<CompletionEvent, StorageError> {
    let run_id = run_id_from_str(&row.try_get::<String, _>("run_id").map_err(ser)?)?;
    let section_id = section_id_from_str(&row.try_get::<String, _>("section_id").map_err(ser)?)?;
    let distraction_score = row
        .try_get::<Option<i64>, _>("distraction_score")
        .map_err(ser)?
        .map(|v| u32_from_i64("distraction_score", v))
        .transpose()?;

    Ok(CompletionEvent {
        run_id,
        section_id,
        captured_secret: row.try_get("captured_secret").map_err(ser)?,
        distraction_score,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

pub(crate) fn map_entry_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<LeaderboardEntry, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let id = u64::try_from(id)
        .map_err(|_| StorageError::Serialization(format!("invalid entry id: {id}")))?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;

    Ok(LeaderboardEntry {
        id: EntryId::new(id),
        name: row.try_get("name").map_err(ser)?,
        email: row.try_get("email").map_err(ser)?,
        score,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
