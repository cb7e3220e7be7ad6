//! # jotter-db
//!
//! PostgreSQL persistence and blob storage for the jotter enrichment pipeline.
//!
//! This crate provides:
//! - Connection pool management
//! - The enrichment repository (candidate selection and result writes)
//! - Blob storage backends (local filesystem and cloud bucket)
//!
//! ## Example
//!
//! ```rust,ignore
//! use jotter_db::{Database, EnrichmentRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/jotter").await?;
//!
//!     for image in db.enrichment.list_images_missing_text().await? {
//!         println!("pending OCR: {}", image.id);
//!     }
//!     Ok(())
//! }
//! ```

pub mod enrichment;
pub mod pool;
pub mod storage;

// Re-export core types
pub use jotter_core::*;

pub use enrichment::PgEnrichmentRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use storage::{blob_store_for_bucket, BucketBlobStore, FilesystemBlobStore};

/// Pool plus the repositories built on it.
#[derive(Clone)]
pub struct Database {
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub enrichment: PgEnrichmentRepository,
}

impl Database {
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        let enrichment = PgEnrichmentRepository::new(pool.clone());
        Self { pool, enrichment }
    }

    /// Connect using [`PoolConfig::default`].
    pub async fn connect(url: &str) -> Result<Self> {
        create_pool(url).await.map(Self::new)
    }

    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        create_pool_with_config(url, config).await.map(Self::new)
    }

    /// Apply the enrichment schema migration.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))
    }

    /// Close every connection; called once the run is over.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
