//! # kinship-db
//!
//! PostgreSQL database layer for kinship.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for contacts, interactions, the
//!   reconciliation write path, the processing ledger, and user settings
//! - A combined [`Database`] aggregate the pipeline is wired from
//!
//! ## Example
//!
//! ```rust,ignore
//! use kinship_db::Database;
//! use kinship_core::ContactRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/kinship").await?;
//!     let contact = db.contacts.fetch(some_id).await?;
//!     println!("{} is due {}", contact.name, contact.next_contact_due);
//!     Ok(())
//! }
//! ```

pub mod contacts;
pub mod interactions;
pub mod pool;
pub mod processing_log;
pub mod reconciliation;
pub mod settings;

// Re-export core types
pub use kinship_core::*;

// Re-export repository implementations
pub use contacts::PgContactRepository;
pub use interactions::PgInteractionRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use processing_log::PgProcessingLogRepository;
pub use reconciliation::PgReconciliationRepository;
pub use settings::PgSettingsRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Contact repository.
    pub contacts: PgContactRepository,
    /// Interaction log repository (read-only).
    pub interactions: PgInteractionRepository,
    /// Transactional miss-outcome writer.
    pub reconciliation: PgReconciliationRepository,
    /// Per-contact-per-day processing ledger.
    pub processing_log: PgProcessingLogRepository,
    /// User preferences and subscriptions.
    pub settings: PgSettingsRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            contacts: PgContactRepository::new(pool.clone()),
            interactions: PgInteractionRepository::new(pool.clone()),
            reconciliation: PgReconciliationRepository::new(pool.clone()),
            processing_log: PgProcessingLogRepository::new(pool.clone()),
            settings: PgSettingsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
