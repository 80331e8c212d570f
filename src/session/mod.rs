//! Sessions and transaction isolation.
//!
//! Sessions are opened on a [`Repository`](crate::repository::Repository)
//! handle. Any number of them may share one handle.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Repository                           │
//! │      (attached store, session registry, commit lock)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │   Common    │       │  Dedicated  │       │  Dedicated  │
//!  │  (direct)   │       │  + Overlay  │       │  + Overlay  │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//! ```
//!
//! Writes in a dedicated session are invisible to every other session until
//! the session commits; rollback discards them. There is one pending
//! generation per dedicated session, not a version chain.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use tripleproxy::catalog::{MemoryCatalog, Triple, TriplePattern};
//! use tripleproxy::repository::{AccessMode, Repository};
//! use tripleproxy::session::SessionKind;
//!
//! let repo = Repository::new(Arc::new(MemoryCatalog::new()), "people", AccessMode::Access)?.init()?;
//! let common = repo.connection()?;
//!
//! repo.with_session(SessionKind::Dedicated, |tx| {
//!     tx.add(Triple::new("ex:alice", "ex:name", "\"Alice\""))?;
//!     assert!(!common.contains(&TriplePattern::any().subject("ex:alice"))?);
//!     Ok(())
//! })?;
//!
//! assert!(common.contains(&TriplePattern::any().subject("ex:alice"))?);
//! # Ok::<(), tripleproxy::repository::RepositoryError>(())
//! ```

mod context;
mod kind;
mod overlay;
mod registry;

pub use context::Session;
pub use kind::SessionKind;
pub use overlay::Overlay;
pub use registry::SessionInfo;

pub(crate) use registry::SessionRegistry;
