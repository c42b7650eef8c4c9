//! Shared application state: the store location plus the in-memory
//! session registry. Connections are short-lived, opened per request.

use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::auth::SessionRegistry;
use crate::config;
use crate::db;

pub struct CoreState {
    db_path: PathBuf,
    sessions: RwLock<SessionRegistry>,
}

impl CoreState {
    /// Create state pointing at the configured database location.
    pub fn new() -> Self {
        Self::with_db_path(config::db_path())
    }

    pub fn with_db_path(db_path: PathBuf) -> Self {
        Self {
            db_path,
            sessions: RwLock::new(SessionRegistry::new()),
        }
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    /// Open a connection to the store. Most common operation in handlers;
    /// the connection is dropped when the request completes.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Store)
    }

    pub fn read_sessions(
        &self,
    ) -> Result<RwLockReadGuard<'_, SessionRegistry>, CoreError> {
        self.sessions.read().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn write_sessions(
        &self,
    ) -> Result<RwLockWriteGuard<'_, SessionRegistry>, CoreError> {
        self.sessions.write().map_err(|_| CoreError::LockPoisoned)
    }
}

impl Default for CoreState {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Store unavailable: {0}")]
    Store(#[from] db::DatabaseError),
}
