//! tripleproxy - a client-side repository proxy for remote RDF triple stores
//!
//! This crate maps a repository abstraction onto a named store hosted by a
//! remote triple-store server. It decides how the store is created, attached
//! and destroyed, optionally federates several stores into one read-only
//! view, and layers common and dedicated sessions on top of the server's
//! stateless catalog API.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tripleproxy::catalog::{MemoryCatalog, Triple};
//! use tripleproxy::repository::{AccessMode, Repository};
//!
//! let catalog = Arc::new(MemoryCatalog::new());
//! let repo = Repository::new(catalog, "scratch", AccessMode::Renew).unwrap().init().unwrap();
//! let mut tx = repo.dedicated_session().unwrap();
//! tx.add(Triple::new("ex:alice", "ex:knows", "ex:bob")).unwrap();
//! tx.commit().unwrap();
//! ```

pub mod catalog;
pub mod repository;
pub mod session;
