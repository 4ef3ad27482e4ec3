use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use questlist_domain::shared::DomainError;

/// Handle to the local SQLite store behind the repositories.
///
/// The pool is kept small: the engine is a single-user local cache, and
/// the observe streams hold connections only briefly. WAL mode lets the
/// watch-channel refreshes read while a toggle writes.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the local store at `db_path`.
    pub async fn open(db_path: &Path) -> Result<Self, DomainError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::Infrastructure(format!(
                    "Cannot create data directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| {
                DomainError::Infrastructure(format!(
                    "Cannot open local cache at {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), DomainError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::Infrastructure(format!("Schema migration failed: {}", e)))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
