//! Per-handle registry of open sessions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::kind::SessionKind;

/// Session metadata tracked by the owning repository handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Unique session ID.
    pub id: String,
    /// Common or dedicated.
    pub kind: SessionKind,
    /// When the session was opened.
    pub opened_at: DateTime<Utc>,
}

/// Open sessions of one repository handle, tracked by ID.
#[derive(Debug, Default)]
pub(crate) struct SessionRegistry {
    open: RwLock<HashMap<String, SessionInfo>>,
}

impl SessionRegistry {
    pub(crate) fn register(&self, info: SessionInfo) {
        self.open.write().insert(info.id.clone(), info);
    }

    pub(crate) fn unregister(&self, id: &str) -> Option<SessionInfo> {
        self.open.write().remove(id)
    }

    pub(crate) fn count(&self) -> usize {
        self.open.read().len()
    }

    /// Open sessions, oldest first.
    pub(crate) fn list(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<_> = self.open.read().values().cloned().collect();
        sessions.sort_by(|a, b| a.opened_at.cmp(&b.opened_at).then_with(|| a.id.cmp(&b.id)));
        sessions
    }
}
