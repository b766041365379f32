//! SQLite persistence for VidVault.
//!
//! One table, one repository. The schema is created on startup if it
//! does not exist, mirroring how the service has always bootstrapped
//! its database.

pub mod error;
pub mod repo;

pub use error::{StoreError, StoreResult};
pub use repo::VideoRepository;

use sqlx::sqlite::SqlitePoolOptions;

/// Connection pool type used across the workspace.
pub type DbPool = sqlx::SqlitePool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> StoreResult<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create the `videos` table if it is missing.
pub async fn init_schema(pool: &DbPool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS videos (
            id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            original_filename TEXT NOT NULL,
            path TEXT NOT NULL,
            duration_ms INTEGER NOT NULL DEFAULT 0,
            size_bytes INTEGER NOT NULL DEFAULT 0,
            share_token TEXT,
            share_expiry_ms INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
