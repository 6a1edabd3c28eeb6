use sqlx::Row;
use tracing::debug;
use workshop_core::model::{CompletionEvent, RecordedSecret, RunId, SessionRecord};

use super::SqliteRepository;
use super::mapping::{
    conn, map_completion_row, run_id_from_str, section_id_from_str, ser, u32_from_i64,
};
use crate::repository::{CompletionRepository, StorageError};

#[async_trait::async_trait]
impl CompletionRepository for SqliteRepository {
    async fn append_completion(&self, event: &CompletionEvent) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO section_completions (
                    run_id, section_id, captured_secret, distraction_score, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(event.run_id.to_string())
        .bind(event.section_id.as_str())
        .bind(event.captured_secret.as_str())
        .bind(event.distraction_score.map(i64::from))
        .bind(event.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        debug!(run_id = %event.run_id, section = %event.section_id, "stored completion");
        Ok(res.last_insert_rowid())
    }

    async fn completions_for_run(
        &self,
        run_id: RunId,
    ) -> Result<Vec<CompletionEvent>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT run_id, section_id, captured_secret, distraction_score, completed_at
                FROM section_completions
                WHERE run_id = ?1
                ORDER BY id ASC
            ",
        )
        .bind(run_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(map_completion_row(row)?);
        }
        Ok(out)
    }

    async fn append_session_record(&self, record: &SessionRecord) -> Result<i64, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
                INSERT INTO session_records (run_id, started_at, completed_at, distraction_score)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(record.run_id().to_string())
        .bind(record.started_at())
        .bind(record.completed_at())
        .bind(i64::from(record.distraction_score()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let record_id = res.last_insert_rowid();

        for (position, secret) in record.secrets().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO session_record_secrets (record_id, position, section_id, secret)
                    VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(record_id)
            .bind(position)
            .bind(secret.section_id.as_str())
            .bind(secret.secret.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        debug!(run_id = %record.run_id(), record_id, "stored session record");
        Ok(record_id)
    }

    async fn get_session_record(&self, id: i64) -> Result<SessionRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT run_id, started_at, completed_at, distraction_score
                FROM session_records
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let secret_rows = sqlx::query(
            r"
                SELECT section_id, secret
                FROM session_record_secrets
                WHERE record_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut secrets = Vec::with_capacity(secret_rows.len());
        for r in &secret_rows {
            secrets.push(RecordedSecret {
                section_id: section_id_from_str(
                    &r.try_get::<String, _>("section_id").map_err(ser)?,
                )?,
                secret: r.try_get("secret").map_err(ser)?,
            });
        }

        SessionRecord::new(
            run_id_from_str(&row.try_get::<String, _>("run_id").map_err(ser)?)?,
            row.try_get("started_at").map_err(ser)?,
            row.try_get("completed_at").map_err(ser)?,
            secrets,
            u32_from_i64(
                "distraction_score",
                row.try_get::<i64, _>("distraction_score").map_err(ser)?,
            )?,
        )
        .map_err(ser)
    }
}
