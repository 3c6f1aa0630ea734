//! Contact repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use kinship_core::{
    Contact, ContactFrequency, ContactMethod, ContactRepository, Error, Result,
};

/// PostgreSQL implementation of ContactRepository.
#[derive(Clone)]
pub struct PgContactRepository {
    pool: Pool<Postgres>,
}

const CONTACT_COLUMNS: &str = "id, user_id, name, notes, relationship_level, contact_frequency, \
     preferred_contact_method, missed_interactions, last_contacted, next_contact_due, \
     ai_last_suggestion, ai_last_suggestion_date";

impl PgContactRepository {
    /// Create a new PgContactRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse a contact row into a Contact struct.
    pub(crate) fn parse_contact_row(row: &PgRow) -> Contact {
        let frequency: Option<String> = row.get("contact_frequency");
        let method: Option<String> = row.get("preferred_contact_method");
        Contact {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            notes: row.get("notes"),
            relationship_level: row.get("relationship_level"),
            contact_frequency: frequency.as_deref().and_then(ContactFrequency::parse),
            preferred_contact_method: method.as_deref().and_then(ContactMethod::parse),
            missed_interactions: row.get("missed_interactions"),
            last_contacted: row.get("last_contacted"),
            next_contact_due: row.get("next_contact_due"),
            ai_last_suggestion: row.get("ai_last_suggestion"),
            ai_last_suggestion_date: row.get("ai_last_suggestion_date"),
        }
    }
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn fetch(&self, id: Uuid) -> Result<Contact> {
        let row = sqlx::query(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| Self::parse_contact_row(&r))
            .ok_or(Error::ContactNotFound(id))
    }

    async fn due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Contact>> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts \
             WHERE next_contact_due >= $1 AND next_contact_due < $2 \
             ORDER BY next_contact_due"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::parse_contact_row).collect())
    }

    async fn set_suggestion(
        &self,
        id: Uuid,
        suggestion: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE contacts \
             SET ai_last_suggestion = $2, ai_last_suggestion_date = $3, updated_at = $3 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(suggestion)
        .bind(generated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::ContactNotFound(id));
        }
        Ok(())
    }
}
