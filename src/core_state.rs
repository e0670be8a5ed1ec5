//! Shared application state.
//!
//! `CoreState` is built once at startup and shared behind an `Arc` by
//! every request handler. It owns the database location and the clinic
//! clock; connections are opened per unit of work.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::clock::{ClinicClock, Clock};
use crate::config::Settings;
use crate::db;

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Cannot create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub struct CoreState {
    db_path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl CoreState {
    pub fn new(db_path: PathBuf, clock: Arc<dyn Clock>) -> Self {
        Self { db_path, clock }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.db_path.clone(),
            Arc::new(ClinicClock::new(settings.utc_offset)),
        )
    }

    /// Create the data directory and bring the schema up to date.
    pub fn initialize(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CoreError::DataDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = self.open_db()?;
        let tables = db::count_tables(&conn)?;
        tracing::info!(path = %self.db_path.display(), tables, "Database ready");
        Ok(())
    }

    /// Open a database connection. Most common operation in handlers.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
