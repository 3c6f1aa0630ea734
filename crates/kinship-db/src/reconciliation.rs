//! Reconciliation write path: the miss outcome as one transaction.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use kinship_core::{ApplyMissRequest, Error, ReconciliationRepository, Result};

/// PostgreSQL implementation of ReconciliationRepository.
///
/// The contact update and the reminder replacement span two tables, so they
/// run inside a single transaction; a failure on any statement rolls back
/// the whole miss outcome.
#[derive(Clone)]
pub struct PgReconciliationRepository {
    pool: Pool<Postgres>,
}

impl PgReconciliationRepository {
    /// Create a new PgReconciliationRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReconciliationRepository for PgReconciliationRepository {
    async fn apply_miss(&self, req: ApplyMissRequest) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let updated = sqlx::query(
            "UPDATE contacts \
             SET missed_interactions = $2, next_contact_due = $3, updated_at = $4 \
             WHERE id = $1",
        )
        .bind(req.contact_id)
        .bind(req.missed_interactions)
        .bind(req.next_contact_due)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            return Err(Error::ContactNotFound(req.contact_id));
        }

        // Replace, not append: at most one live reminder per contact.
        sqlx::query("DELETE FROM reminders WHERE contact_id = $1")
            .bind(req.contact_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO reminders (id, contact_id, user_id, kind, due_date, description, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(req.reminder.contact_id)
        .bind(req.reminder.user_id)
        .bind(req.reminder.kind.as_str())
        .bind(req.reminder.due_date)
        .bind(&req.reminder.description)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "reconciliation",
            op = "apply_miss",
            contact_id = %req.contact_id,
            missed_interactions = req.missed_interactions,
            "Applied miss outcome"
        );
        Ok(())
    }
}
