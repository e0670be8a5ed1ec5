//! Shared types for the HTTP layer.

use std::sync::Arc;

use uuid::Uuid;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::db::SqliteDirectory;
use crate::scheduling::{SchedulingEngine, SchedulingError};

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    /// Run one engine operation on a blocking thread with its own
    /// connection. SQLite calls may wait on the write lock, so they stay
    /// off the async workers.
    pub async fn run_engine<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&SchedulingEngine<'_>) -> Result<T, SchedulingError> + Send + 'static,
    {
        let core = Arc::clone(&self.core);
        tokio::task::spawn_blocking(move || -> Result<T, ApiError> {
            let conn = core.open_db()?;
            let directory = SqliteDirectory::new(&conn);
            let engine = SchedulingEngine::new(&conn, core.clock(), &directory);
            Ok(op(&engine)?)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Blocking task failed: {e}")))?
    }
}

/// Parse a path identifier.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid ID format: {raw}")))
}
