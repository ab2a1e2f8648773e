//! Shared server state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::db::Db;

/// One request the server answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandledRequest {
    pub method: String,
    /// Path relative to the base URL, query included.
    pub path: String,
    pub status: u16,
    pub handled_at: DateTime<Utc>,
}

/// Everything a request can read or change.
///
/// Wrapped in `Arc<RwLock<_>>`; dispatch holds the write lock for the whole
/// request so effects land in issue order.
#[derive(Debug)]
pub struct ServerState {
    pub db: Db,
    pub handled: Vec<HandledRequest>,
}

impl ServerState {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            handled: Vec::new(),
        }
    }

    /// Wrap for sharing between server clones.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }
}
