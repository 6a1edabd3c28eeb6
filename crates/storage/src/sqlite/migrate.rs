use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS section_completions (
            id INTEGER PRIMARY KEY,
            run_id TEXT NOT NULL,
            section_id TEXT NOT NULL,
            captured_secret TEXT NOT NULL,
            distraction_score INTEGER CHECK (distraction_score IS NULL OR distraction_score >= 0),
            completed_at TEXT NOT NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_section_completions_run
            ON section_completions (run_id, id);
    ",
    r"
        CREATE TABLE IF NOT EXISTS session_records (
            id INTEGER PRIMARY KEY,
            run_id TEXT NOT NULL UNIQUE,
            started_at TEXT NOT NULL,
            completed_at TEXT NOT NULL,
            distraction_score INTEGER NOT NULL CHECK (distraction_score >= 0)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS session_record_secrets (
            record_id INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            section_id TEXT NOT NULL,
            secret TEXT NOT NULL,
            PRIMARY KEY (record_id, position),
            FOREIGN KEY (record_id) REFERENCES session_records(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS leaderboard (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            score INTEGER NOT NULL CHECK (score >= 0),
            created_at TEXT NOT NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_leaderboard_created
            ON leaderboard (created_at, id);
    ",
];

/// Runs pending schema migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
        ",
    )
    .execute(pool)
    .await?;

    // Version 1: completions, session records, leaderboard.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(version = 1, "applied schema migration");
    }

    Ok(())
}
