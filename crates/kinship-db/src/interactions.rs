//! Interaction log repository implementation.
//!
//! Interactions are created by the user-facing logging flow; the pipeline
//! only ever reads them, so this repository is read-only.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use kinship_core::{Error, Interaction, InteractionRepository, Result, Sentiment};

/// PostgreSQL implementation of InteractionRepository.
#[derive(Clone)]
pub struct PgInteractionRepository {
    pool: Pool<Postgres>,
}

impl PgInteractionRepository {
    /// Create a new PgInteractionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_interaction_row(row: &PgRow) -> Interaction {
        let sentiment: Option<String> = row.get("sentiment");
        Interaction {
            id: row.get("id"),
            contact_id: row.get("contact_id"),
            kind: row.get("kind"),
            date: row.get("date"),
            sentiment: sentiment.as_deref().and_then(Sentiment::parse),
        }
    }
}

#[async_trait]
impl InteractionRepository for PgInteractionRepository {
    async fn latest_for_contact(&self, contact_id: Uuid) -> Result<Option<Interaction>> {
        let row = sqlx::query(
            "SELECT id, contact_id, kind, date, sentiment FROM interactions \
             WHERE contact_id = $1 ORDER BY date DESC LIMIT 1",
        )
        .bind(contact_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::parse_interaction_row(&r)))
    }

    async fn recent_for_contact(&self, contact_id: Uuid, limit: i64) -> Result<Vec<Interaction>> {
        let rows = sqlx::query(
            "SELECT id, contact_id, kind, date, sentiment FROM interactions \
             WHERE contact_id = $1 ORDER BY date DESC LIMIT $2",
        )
        .bind(contact_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::parse_interaction_row).collect())
    }
}
