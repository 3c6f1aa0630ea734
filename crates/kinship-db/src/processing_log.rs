//! Processing ledger repository implementation.
//!
//! One row per contact per calendar day, unique on
//! `(contact_id, processing_date)`. The unique index is what makes racing
//! runs safe: a second run either sees the first run's row or loses the
//! insert race and re-reads it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use kinship_core::{
    Error, ProcessingLogEntry, ProcessingLogRepository, ProcessingStatus, Result,
};

/// PostgreSQL implementation of ProcessingLogRepository.
#[derive(Clone)]
pub struct PgProcessingLogRepository {
    pool: Pool<Postgres>,
}

impl PgProcessingLogRepository {
    /// Create a new PgProcessingLogRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_entry_row(row: &PgRow) -> ProcessingLogEntry {
        let status: String = row.get("status");
        ProcessingLogEntry {
            contact_id: row.get("contact_id"),
            processing_date: row.get("processing_date"),
            batch_id: row.get("batch_id"),
            // Unknown status strings cannot appear through this repository;
            // fall back to pending rather than failing the whole run.
            status: ProcessingStatus::parse(&status).unwrap_or(ProcessingStatus::Pending),
            retry_count: row.get("retry_count"),
            last_error: row.get("last_error"),
        }
    }

    async fn set_status(
        &self,
        contact_id: Uuid,
        date: NaiveDate,
        status: ProcessingStatus,
        message: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE contact_processing_log \
             SET status = $3, last_error = COALESCE($4, last_error), updated_at = $5 \
             WHERE contact_id = $1 AND processing_date = $2",
        )
        .bind(contact_id)
        .bind(date)
        .bind(status.as_str())
        .bind(message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "processing log entry for contact {} on {}",
                contact_id, date
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ProcessingLogRepository for PgProcessingLogRepository {
    async fn get_or_create(
        &self,
        contact_id: Uuid,
        date: NaiveDate,
    ) -> Result<ProcessingLogEntry> {
        let now = Utc::now();

        // Upsert-then-read: losing the insert race to a concurrent run is
        // fine, the follow-up read observes the winner's row.
        sqlx::query(
            "INSERT INTO contact_processing_log \
                 (id, contact_id, processing_date, status, retry_count, created_at, updated_at) \
             VALUES ($1, $2, $3, 'pending', 0, $4, $4) \
             ON CONFLICT (contact_id, processing_date) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(contact_id)
        .bind(date)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        let row = sqlx::query(
            "SELECT contact_id, processing_date, batch_id, status, retry_count, last_error \
             FROM contact_processing_log \
             WHERE contact_id = $1 AND processing_date = $2",
        )
        .bind(contact_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_entry_row(&row))
    }

    async fn mark_pending(
        &self,
        contact_id: Uuid,
        date: NaiveDate,
        batch_id: Uuid,
        retry_count: i32,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE contact_processing_log \
             SET status = 'pending', batch_id = $3, retry_count = $4, updated_at = $5 \
             WHERE contact_id = $1 AND processing_date = $2",
        )
        .bind(contact_id)
        .bind(date)
        .bind(batch_id)
        .bind(retry_count)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "processing log entry for contact {} on {}",
                contact_id, date
            )));
        }
        Ok(())
    }

    async fn mark_success(&self, contact_id: Uuid, date: NaiveDate) -> Result<()> {
        self.set_status(contact_id, date, ProcessingStatus::Success, None)
            .await
    }

    async fn mark_error(&self, contact_id: Uuid, date: NaiveDate, message: &str) -> Result<()> {
        self.set_status(contact_id, date, ProcessingStatus::Error, Some(message))
            .await
    }

    async fn mark_exhausted(
        &self,
        contact_id: Uuid,
        date: NaiveDate,
        message: &str,
    ) -> Result<()> {
        self.set_status(
            contact_id,
            date,
            ProcessingStatus::MaxRetriesExceeded,
            Some(message),
        )
        .await
    }

    async fn statuses_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<HashMap<Uuid, ProcessingStatus>> {
        let rows = sqlx::query(
            "SELECT contact_id, status FROM contact_processing_log WHERE processing_date = $1",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let status: String = row.get("status");
                ProcessingStatus::parse(&status).map(|s| (row.get("contact_id"), s))
            })
            .collect())
    }
}
