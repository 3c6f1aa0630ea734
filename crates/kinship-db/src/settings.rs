//! User settings repository: AI preferences and subscriptions.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use kinship_core::{
    AiPreferences, Error, PlanTier, Result, SettingsRepository, Subscription,
};

/// PostgreSQL implementation of SettingsRepository.
#[derive(Clone)]
pub struct PgSettingsRepository {
    pool: Pool<Postgres>,
}

impl PgSettingsRepository {
    /// Create a new PgSettingsRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn ai_preferences(&self, user_id: Uuid) -> Result<AiPreferences> {
        let row = sqlx::query(
            "SELECT ai_suggestions_enabled, timezone FROM user_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row
            .map(|r| AiPreferences {
                ai_suggestions_enabled: r.get("ai_suggestions_enabled"),
                timezone: r.get("timezone"),
            })
            .unwrap_or_default())
    }

    async fn subscription(&self, user_id: Uuid) -> Result<Option<Subscription>> {
        let row = sqlx::query("SELECT plan, valid_until FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| {
            let plan: String = r.get("plan");
            Subscription {
                plan: PlanTier::parse(&plan).unwrap_or(PlanTier::Free),
                valid_until: r.get("valid_until"),
            }
        }))
    }

    async fn timezones(&self) -> Result<HashMap<Uuid, String>> {
        let rows =
            sqlx::query("SELECT user_id, timezone FROM user_settings WHERE timezone IS NOT NULL")
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|r| (r.get("user_id"), r.get("timezone")))
            .collect())
    }
}
