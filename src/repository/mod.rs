//! Repository handles.
//!
//! A [`Repository`] maps the repository abstraction onto one named store in a
//! remote catalog. It is configured first and attached later:
//!
//! ```text
//!   Unattached ──initialize──▶ Attaching ──▶ Attached ──shut_down──▶ ShutDown
//!        ▲                          │
//!        └────────── failure ───────┘
//! ```
//!
//! What `initialize` does depends on the [`AccessMode`]:
//!
//! | mode   | store exists              | store absent          |
//! |--------|---------------------------|-----------------------|
//! | RENEW  | delete, then create empty | create                |
//! | CREATE | `StoreAlreadyExists`      | create                |
//! | OPEN   | attach                    | `StoreNotFound`       |
//! | ACCESS | attach                    | create, then attach   |
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use tripleproxy::catalog::{MemoryCatalog, Triple};
//! use tripleproxy::repository::{AccessMode, Repository};
//!
//! let catalog = Arc::new(MemoryCatalog::new());
//! let repo = Repository::new(catalog, "scratch", AccessMode::Create)?.init()?;
//!
//! let mut conn = repo.connection()?;
//! conn.add(Triple::new("ex:alice", "ex:knows", "ex:bob"))?;
//! assert_eq!(conn.size()?, 1);
//! conn.close()?;
//!
//! repo.shut_down();
//! # Ok::<(), tripleproxy::repository::RepositoryError>(())
//! ```

mod access;
mod config;
mod error;
mod handle;

pub use access::AccessMode;
pub use config::{InlinedType, RepositoryConfig};
pub use error::{RepositoryError, RepositoryResult};
pub use handle::{Repository, RepositoryState};
