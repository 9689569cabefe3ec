#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `SQLite` storage for geotagged incident reports.
//!
//! Stores report rows in a single `reports` table; uploaded photos live
//! on disk in the image directory and are referenced by file name.
//! Uses `switchy_database` for all database operations. Timestamps are
//! stored as RFC 3339 text.

pub mod queries;

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;
use thiserror::Error;

/// Default path for the reports database, overridable via
/// `DATABASE_PATH`.
pub const DEFAULT_DB_PATH: &str = "data/reports.db";

/// Errors from report storage operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be converted to its row type.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Opens (or creates) the reports `SQLite` database and ensures the
/// schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or schema
/// creation fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Database(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;
    log::info!("Opened reports database at {}", path.display());

    Ok(db)
}

/// Creates the reports table if it doesn't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS reports (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            file_name   TEXT NOT NULL,
            latitude    REAL NOT NULL,
            longitude   REAL NOT NULL,
            timestamp   TEXT NOT NULL
        )",
    )
    .await
    .map_err(|e| DbError::Database(e.to_string()))?;

    Ok(())
}
