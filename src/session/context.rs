//! Session context.
//!
//! A session is a logical connection to a repository handle. Common sessions
//! forward every call to the store. Dedicated sessions keep an [`Overlay`]
//! of pending writes that only they can see:
//! - Reads merge the committed store with the overlay
//! - `commit` publishes the overlay as one batch
//! - `rollback` throws it away
//!
//! Closing never commits or rolls back on the caller's behalf.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use ulid::Ulid;

use super::kind::SessionKind;
use super::overlay::Overlay;
use super::registry::SessionInfo;
use crate::catalog::{Bindings, Change, QueryLanguage, ResultSet, Store, Triple, TriplePattern};
use crate::repository::{Repository, RepositoryError, RepositoryResult};

/// A session on a repository handle.
pub struct Session {
    info: SessionInfo,
    repo: Repository,
    overlay: Overlay,
    closed: bool,
}

impl Session {
    /// Open a session and register it with the handle.
    pub(crate) fn open(repo: Repository, kind: SessionKind) -> Self {
        let info = SessionInfo {
            id: Ulid::new().to_string().to_lowercase(),
            kind,
            opened_at: Utc::now(),
        };
        repo.sessions().register(info.clone());
        debug!(store = %repo.name(), session = %info.id, %kind, "opened session");

        Self {
            info,
            repo,
            overlay: Overlay::new(),
            closed: false,
        }
    }

    /// Get the session ID.
    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn kind(&self) -> SessionKind {
        self.info.kind
    }

    pub fn is_dedicated(&self) -> bool {
        self.info.kind.is_isolated()
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.info.opened_at
    }

    /// The handle this session is attached to.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of buffered changes not yet committed. Always zero for a
    /// common session.
    pub fn pending_changes(&self) -> usize {
        self.overlay.len()
    }

    fn ensure_open(&self) -> RepositoryResult<()> {
        if self.closed {
            return Err(RepositoryError::SessionClosed {
                session: self.info.id.clone(),
            });
        }
        Ok(())
    }

    fn read_store(&self) -> RepositoryResult<Arc<dyn Store>> {
        self.ensure_open()?;
        self.repo.store()
    }

    fn write_store(&self, operation: &'static str) -> RepositoryResult<Arc<dyn Store>> {
        self.ensure_open()?;
        self.repo.writable_store(operation)
    }

    fn wrap(&self, operation: &'static str) -> impl FnOnce(crate::catalog::CatalogError) -> RepositoryError + '_ {
        move |e| RepositoryError::catalog(operation, self.repo.name(), e)
    }

    // ==================== Writes ====================

    /// Add a statement.
    pub fn add(&mut self, triple: Triple) -> RepositoryResult<()> {
        let store = self.write_store("add")?;
        if self.is_dedicated() {
            self.overlay.add(triple);
            return Ok(());
        }
        store.add(&triple).map_err(self.wrap("add"))
    }

    /// Add several statements. A common session sends them as one batch.
    pub fn add_all<I>(&mut self, triples: I) -> RepositoryResult<()>
    where
        I: IntoIterator<Item = Triple>,
    {
        let store = self.write_store("add")?;
        if self.is_dedicated() {
            for triple in triples {
                self.overlay.add(triple);
            }
            return Ok(());
        }
        let changes: Vec<Change> = triples.into_iter().map(Change::Add).collect();
        store.apply(&changes).map_err(self.wrap("add"))
    }

    /// Remove every statement matching `pattern`.
    pub fn remove(&mut self, pattern: TriplePattern) -> RepositoryResult<()> {
        let store = self.write_store("remove")?;
        if self.is_dedicated() {
            self.overlay.remove(pattern);
            return Ok(());
        }
        store.remove(&pattern).map(|_| ()).map_err(self.wrap("remove"))
    }

    /// Remove every statement.
    pub fn clear(&mut self) -> RepositoryResult<()> {
        self.remove(TriplePattern::any())
    }

    // ==================== Reads ====================

    /// Statements matching `pattern` as this session sees them.
    pub fn get_statements(&self, pattern: &TriplePattern) -> RepositoryResult<Vec<Triple>> {
        let store = self.read_store()?;
        let base = store.get_statements(pattern).map_err(self.wrap("get_statements"))?;
        if self.overlay.is_empty() {
            return Ok(base);
        }
        Ok(self.overlay.view(base, pattern))
    }

    /// Check if any statement matches `pattern`.
    pub fn contains(&self, pattern: &TriplePattern) -> RepositoryResult<bool> {
        Ok(!self.get_statements(pattern)?.is_empty())
    }

    /// Number of statements visible to this session.
    pub fn size(&self) -> RepositoryResult<usize> {
        if self.overlay.is_empty() {
            let store = self.read_store()?;
            return store.size().map_err(self.wrap("size"));
        }
        Ok(self.get_statements(&TriplePattern::any())?.len())
    }

    /// Evaluate a query on the server.
    ///
    /// The server only knows committed state, so a dedicated session with
    /// pending changes refuses to query rather than return results that
    /// ignore its own writes.
    pub fn query(
        &self,
        language: QueryLanguage,
        text: &str,
        bindings: &Bindings,
    ) -> RepositoryResult<ResultSet> {
        let store = self.read_store()?;
        if !self.overlay.is_empty() {
            return Err(RepositoryError::unsupported(
                "query",
                self.repo.name(),
                format!(
                    "session {} has {} pending change(s) the server cannot see; commit or roll back first",
                    self.info.id,
                    self.overlay.len()
                ),
            ));
        }
        store.query(language, text, bindings).map_err(self.wrap("query"))
    }

    // ==================== Transaction Control ====================

    /// Publish pending changes to every session.
    ///
    /// The overlay is applied as a single batch while holding the handle's
    /// commit lock, then cleared. If the store rejects the batch the overlay
    /// is kept so the caller can retry or roll back. A no-op on a common
    /// session or an empty overlay, closed or not.
    pub fn commit(&mut self) -> RepositoryResult<()> {
        if !self.is_dedicated() || self.overlay.is_empty() {
            return Ok(());
        }
        self.ensure_open()?;

        let store = self.repo.store()?;
        {
            let _guard = self.repo.lock_commits();
            store.apply(self.overlay.changes()).map_err(self.wrap("commit"))?;
        }

        let published = self.overlay.len();
        self.overlay.clear();
        info!(store = %self.repo.name(), session = %self.info.id, changes = published, "committed session");
        Ok(())
    }

    /// Discard pending changes. A no-op on a common session or an empty
    /// overlay.
    pub fn rollback(&mut self) -> RepositoryResult<()> {
        if !self.is_dedicated() || self.overlay.is_empty() {
            return Ok(());
        }
        self.ensure_open()?;
        debug!(store = %self.repo.name(), session = %self.info.id, changes = self.overlay.len(), "rolled back session");
        self.overlay.clear();
        Ok(())
    }

    /// Close the session.
    ///
    /// Fails with `UncommittedWrites` if a dedicated session still holds
    /// pending changes; the session then stays open. Closing twice is fine.
    pub fn close(&mut self) -> RepositoryResult<()> {
        if self.closed {
            return Ok(());
        }
        if !self.overlay.is_empty() {
            return Err(RepositoryError::UncommittedWrites {
                session: self.info.id.clone(),
                pending: self.overlay.len(),
            });
        }
        self.closed = true;
        self.repo.sessions().unregister(&self.info.id);
        debug!(store = %self.repo.name(), session = %self.info.id, "closed session");
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if !self.overlay.is_empty() {
            warn!(
                store = %self.repo.name(),
                session = %self.info.id,
                pending = self.overlay.len(),
                "session dropped with uncommitted changes; they were never published"
            );
        }
        self.repo.sessions().unregister(&self.info.id);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.info.id)
            .field("kind", &self.info.kind)
            .field("store", self.repo.name())
            .field("pending", &self.overlay.len())
            .field("closed", &self.closed)
            .finish()
    }
}
