//! Repository handle - attaches to one named store and hands out sessions.
//!
//! The handle is built in two phases: construct it with a configuration,
//! then call [`Repository::initialize`] to run the access-mode state machine
//! against the catalog. It handles:
//! - Creating, renewing, opening or federating the store
//! - Guarding every operation against use before init or after shutdown
//! - Opening sessions and tracking which ones are still open
//! - Serializing commits from dedicated sessions

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use super::access::AccessMode;
use super::config::{InlinedType, RepositoryConfig};
use super::error::{RepositoryError, RepositoryResult};
use crate::catalog::{Catalog, Store, StoreName};
use crate::session::{Session, SessionInfo, SessionKind, SessionRegistry};

/// Lifecycle state of a repository handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryState {
    /// Configured, not yet initialized.
    Unattached,
    /// `initialize` is talking to the catalog.
    Attaching,
    /// Attached to the store.
    Attached,
    /// Shut down. Terminal.
    ShutDown,
}

impl fmt::Display for RepositoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryState::Unattached => write!(f, "unattached"),
            RepositoryState::Attaching => write!(f, "attaching"),
            RepositoryState::Attached => write!(f, "attached"),
            RepositoryState::ShutDown => write!(f, "shut down"),
        }
    }
}

enum HandleState {
    Unattached {
        catalog: Arc<dyn Catalog>,
        config: RepositoryConfig,
    },
    Attaching {
        config: RepositoryConfig,
    },
    Attached {
        config: RepositoryConfig,
        store: Arc<dyn Store>,
        /// Whether the server accepted writes when the store was attached.
        writable: bool,
    },
    ShutDown {
        config: RepositoryConfig,
    },
}

impl HandleState {
    fn config(&self) -> &RepositoryConfig {
        match self {
            HandleState::Unattached { config, .. }
            | HandleState::Attaching { config }
            | HandleState::Attached { config, .. }
            | HandleState::ShutDown { config } => config,
        }
    }

    fn kind(&self) -> RepositoryState {
        match self {
            HandleState::Unattached { .. } => RepositoryState::Unattached,
            HandleState::Attaching { .. } => RepositoryState::Attaching,
            HandleState::Attached { .. } => RepositoryState::Attached,
            HandleState::ShutDown { .. } => RepositoryState::ShutDown,
        }
    }
}

/// A handle on one named store.
///
/// Thread-safe: can be shared across threads via Clone (uses Arc internally).
/// Clones refer to the same attachment.
#[derive(Clone)]
pub struct Repository {
    inner: Arc<RepositoryInner>,
}

struct RepositoryInner {
    name: StoreName,
    access_mode: AccessMode,
    state: RwLock<HandleState>,
    /// Set once the first `initialize` succeeds.
    initialized: AtomicBool,
    /// Serializes commits from dedicated sessions.
    commit_lock: Mutex<()>,
    sessions: SessionRegistry,
}

impl Repository {
    /// Create an unattached handle for `name`.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        name: &str,
        access_mode: AccessMode,
    ) -> RepositoryResult<Self> {
        let config = RepositoryConfig::new(StoreName::new(name)?, access_mode);
        Self::with_config(catalog, config)
    }

    /// Create an unattached handle from a full configuration.
    pub fn with_config(
        catalog: Arc<dyn Catalog>,
        config: RepositoryConfig,
    ) -> RepositoryResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(RepositoryInner {
                name: config.name.clone(),
                access_mode: config.access_mode,
                state: RwLock::new(HandleState::Unattached { catalog, config }),
                initialized: AtomicBool::new(false),
                commit_lock: Mutex::new(()),
                sessions: SessionRegistry::default(),
            }),
        })
    }

    pub fn name(&self) -> &StoreName {
        &self.inner.name
    }

    pub fn access_mode(&self) -> AccessMode {
        self.inner.access_mode
    }

    pub fn state(&self) -> RepositoryState {
        self.inner.state.read().kind()
    }

    /// Check if `initialize` has succeeded. Stays true after shutdown.
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    pub fn federated_sources(&self) -> BTreeSet<StoreName> {
        self.inner.state.read().config().federated_sources.clone()
    }

    pub fn is_federated(&self) -> bool {
        self.inner.state.read().config().is_federated()
    }

    pub fn inlined_predicates(&self) -> BTreeMap<String, InlinedType> {
        self.inner.state.read().config().inlined_predicates.clone()
    }

    pub fn inlined_datatypes(&self) -> BTreeMap<String, InlinedType> {
        self.inner.state.read().config().inlined_datatypes.clone()
    }

    /// Add members to a federated store.
    ///
    /// Must precede `initialize` and requires a CREATE or RENEW access mode.
    /// May be called several times; the members form a set.
    pub fn add_federated_sources<I>(&self, names: I) -> RepositoryResult<&Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let names = names
            .into_iter()
            .map(StoreName::new)
            .collect::<Result<Vec<_>, _>>()?;
        if names.is_empty() {
            return Err(RepositoryError::InvalidConfiguration(format!(
                "federation of {} needs at least one source store",
                self.inner.name
            )));
        }

        let mut state = self.inner.state.write();
        let config = match &mut *state {
            HandleState::Unattached { config, .. } => config,
            HandleState::ShutDown { .. } => return Err(self.closed()),
            HandleState::Attaching { .. } | HandleState::Attached { .. } => {
                return Err(RepositoryError::InvalidConfiguration(format!(
                    "federated stores must be added to {} before calling initialize",
                    self.inner.name
                )));
            }
        };

        if !config.access_mode.allows_federation() {
            return Err(RepositoryError::InvalidConfiguration(format!(
                "adding federated stores requires a CREATE or RENEW access mode; {} is set to {}",
                self.inner.name, config.access_mode
            )));
        }
        if names.contains(&config.name) {
            return Err(RepositoryError::InvalidConfiguration(format!(
                "store {} cannot federate itself",
                config.name
            )));
        }

        config.federated_sources.extend(names);
        debug!(store = %self.inner.name, sources = config.federated_sources.len(), "federated sources updated");
        Ok(self)
    }

    /// Attach to the store according to the access mode.
    ///
    /// Runs at most once. On failure the handle returns to the unattached
    /// state and may be initialized again.
    pub fn initialize(&self) -> RepositoryResult<()> {
        let (catalog, config) = {
            let mut state = self.inner.state.write();
            let (catalog, config) = match &*state {
                HandleState::Unattached { catalog, config } => (catalog.clone(), config.clone()),
                HandleState::Attaching { .. } | HandleState::Attached { .. } => {
                    return Err(RepositoryError::AlreadyInitialized {
                        name: self.inner.name.clone(),
                    });
                }
                HandleState::ShutDown { .. } => return Err(self.closed()),
            };
            *state = HandleState::Attaching {
                config: config.clone(),
            };
            (catalog, config)
        };

        info!(store = %config.name, mode = %config.access_mode, "initializing repository");
        let attached = attach(catalog.as_ref(), &config);

        let mut state = self.inner.state.write();
        if !matches!(&*state, HandleState::Attaching { .. }) {
            // shut down while attaching
            return Err(self.closed());
        }
        match attached {
            Ok((store, writable)) => {
                *state = HandleState::Attached {
                    config,
                    store,
                    writable,
                };
                self.inner.initialized.store(true, Ordering::SeqCst);
                info!(store = %self.inner.name, "repository attached");
                Ok(())
            }
            Err(e) => {
                *state = HandleState::Unattached { catalog, config };
                Err(e)
            }
        }
    }

    /// Chainable version of [`initialize`](Self::initialize).
    pub fn init(self) -> RepositoryResult<Self> {
        self.initialize()?;
        Ok(self)
    }

    /// Release the store and the catalog.
    ///
    /// Sessions still open keep their handle but every further call on them
    /// fails with `Closed`. Close sessions before shutting down.
    /// A no-op on a handle that was never initialized or is already shut down.
    pub fn shut_down(&self) {
        {
            let mut state = self.inner.state.write();
            let config = match &*state {
                HandleState::Attaching { config } | HandleState::Attached { config, .. } => {
                    config.clone()
                }
                HandleState::Unattached { .. } | HandleState::ShutDown { .. } => return,
            };
            *state = HandleState::ShutDown { config };
        }

        let open = self.inner.sessions.count();
        if open > 0 {
            warn!(store = %self.inner.name, sessions = open, "repository shut down with open sessions");
        }
        info!(store = %self.inner.name, "repository shut down");
    }

    /// The attached store, or why there is none.
    pub(crate) fn store(&self) -> RepositoryResult<Arc<dyn Store>> {
        match &*self.inner.state.read() {
            HandleState::Attached { store, .. } => Ok(store.clone()),
            HandleState::Unattached { .. } | HandleState::Attaching { .. } => {
                Err(RepositoryError::NotInitialized {
                    name: self.inner.name.clone(),
                })
            }
            HandleState::ShutDown { .. } => Err(self.closed()),
        }
    }

    /// The attached store, refusing federated ones.
    pub(crate) fn writable_store(&self, operation: &'static str) -> RepositoryResult<Arc<dyn Store>> {
        match &*self.inner.state.read() {
            HandleState::Attached {
                writable: false, ..
            } => Err(RepositoryError::unsupported(
                operation,
                &self.inner.name,
                "the store is read-only; federated stores take writes through their member stores",
            )),
            HandleState::Attached { store, .. } => Ok(store.clone()),
            HandleState::Unattached { .. } | HandleState::Attaching { .. } => {
                Err(RepositoryError::NotInitialized {
                    name: self.inner.name.clone(),
                })
            }
            HandleState::ShutDown { .. } => Err(self.closed()),
        }
    }

    pub(crate) fn lock_commits(&self) -> MutexGuard<'_, ()> {
        self.inner.commit_lock.lock()
    }

    pub(crate) fn sessions(&self) -> &SessionRegistry {
        &self.inner.sessions
    }

    fn closed(&self) -> RepositoryError {
        RepositoryError::Closed {
            name: self.inner.name.clone(),
        }
    }

    fn wrap(&self, operation: &'static str) -> impl FnOnce(crate::catalog::CatalogError) -> RepositoryError + '_ {
        move |e| RepositoryError::catalog(operation, &self.inner.name, e)
    }

    // ==================== Store Operations ====================

    /// Check if the server accepts writes to the store.
    pub fn is_writable(&self) -> RepositoryResult<bool> {
        self.store()?.is_writable().map_err(self.wrap("is_writable"))
    }

    /// Index newly added statements, or all of them.
    ///
    /// Worth calling after every sizeable load.
    pub fn index_triples(&self, all: bool) -> RepositoryResult<()> {
        self.store()?.index_triples(all).map_err(self.wrap("index_triples"))
    }

    /// Index literal objects of `uri` for free-text matching.
    pub fn register_free_text_predicate(&self, uri: &str) -> RepositoryResult<()> {
        let predicate = format!("<{}>", uri.trim_start_matches('<').trim_end_matches('>'));
        self.store()?
            .register_free_text_predicate(&predicate)
            .map_err(self.wrap("register_free_text_predicate"))
    }

    // ==================== Sessions ====================

    /// Open a session of the given kind.
    pub fn open_session(&self, kind: SessionKind) -> RepositoryResult<Session> {
        self.store()?;
        Ok(Session::open(self.clone(), kind))
    }

    /// Open a common session.
    pub fn connection(&self) -> RepositoryResult<Session> {
        self.open_session(SessionKind::Common)
    }

    /// Open a dedicated session.
    pub fn dedicated_session(&self) -> RepositoryResult<Session> {
        self.open_session(SessionKind::Dedicated)
    }

    /// Run `f` in a fresh session, committing if it returns Ok and rolling
    /// back otherwise. The session is closed on every exit path.
    pub fn with_session<F, T>(&self, kind: SessionKind, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut Session) -> RepositoryResult<T>,
    {
        let mut session = self.open_session(kind)?;

        let result = f(&mut session).and_then(|value| {
            session.commit()?;
            Ok(value)
        });
        if let Err(ref e) = result {
            debug!(store = %self.inner.name, session = %session.id(), error = %e, "rolling back session");
            // A closed session holds no pending changes, so this cannot fail.
            let _ = session.rollback();
        }

        let closed = session.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    /// Number of sessions opened on this handle and not yet closed.
    pub fn active_session_count(&self) -> usize {
        self.inner.sessions.count()
    }

    /// Sessions opened on this handle and not yet closed, oldest first.
    pub fn active_sessions(&self) -> Vec<SessionInfo> {
        self.inner.sessions.list()
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("name", &self.inner.name)
            .field("access_mode", &self.inner.access_mode)
            .field("state", &self.state())
            .field("active_sessions", &self.active_session_count())
            .finish()
    }
}

/// Make sure the store exists as the access mode demands, then open it.
///
/// Also returns whether the server accepts writes to the opened store.
fn attach(
    catalog: &dyn Catalog,
    config: &RepositoryConfig,
) -> RepositoryResult<(Arc<dyn Store>, bool)> {
    let name = &config.name;
    let exists = catalog
        .list_stores()
        .map_err(|e| RepositoryError::catalog("list_stores", name, e))?
        .contains(name);

    match (config.access_mode, exists) {
        (AccessMode::Renew, true) => {
            // Not atomic: anyone else using the store sees it disappear.
            warn!(store = %name, "renewing store; deleting existing contents");
            catalog
                .delete_store(name)
                .map_err(|e| RepositoryError::catalog("delete_store", name, e))?;
            create_store(catalog, config)?;
        }
        (AccessMode::Create, true) => {
            return Err(RepositoryError::StoreAlreadyExists { name: name.clone() });
        }
        (AccessMode::Open, false) => {
            return Err(RepositoryError::StoreNotFound { name: name.clone() });
        }
        (AccessMode::Renew | AccessMode::Create | AccessMode::Access, false) => {
            create_store(catalog, config)?;
        }
        (AccessMode::Open | AccessMode::Access, true) => {}
    }

    let store = catalog
        .open_store(name)
        .map_err(|e| RepositoryError::catalog("open_store", name, e))?;
    let writable = store
        .is_writable()
        .map_err(|e| RepositoryError::catalog("is_writable", name, e))?;
    Ok((store, writable))
}

fn create_store(catalog: &dyn Catalog, config: &RepositoryConfig) -> RepositoryResult<()> {
    let name = &config.name;
    if config.is_federated() {
        catalog
            .federate_stores(name, &config.federated_sources)
            .map_err(|e| RepositoryError::catalog("federate_stores", name, e))?;
        info!(store = %name, members = config.federated_sources.len(), "created federated store");
    } else {
        catalog
            .create_store(name)
            .map_err(|e| RepositoryError::catalog("create_store", name, e))?;
        info!(store = %name, "created store");
    }
    Ok(())
}
