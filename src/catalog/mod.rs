//! Catalog client layer.
//!
//! This module defines the contract the repository layer expects from the
//! remote triple-store server: a catalog that lists, creates, deletes and
//! federates named stores, and the store handle it hands out. The upper
//! layers (repository handle, sessions) only ever talk to these traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Catalog                               │
//! │     (list / create / delete / federate / open by name)      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ open_store
//!                              ▼
//!                       ┌─────────────┐
//!                       │    Store    │
//!                       │ (statements,│
//!                       │   queries)  │
//!                       └─────────────┘
//! ```
//!
//! [`MemoryCatalog`] is an in-process implementation of the whole contract.

mod client;
mod error;
mod memory;
mod result;
mod types;

pub use client::{Catalog, Store};
pub use error::{CatalogError, CatalogResult};
pub use memory::MemoryCatalog;
pub use result::{Bindings, ResultSet, Row};
pub use types::{
    Change, ContextFilter, InvalidNameError, QueryLanguage, StoreName, Triple, TriplePattern,
};
