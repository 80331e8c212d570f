//! Catalog and store client interfaces
//!
//! These traits describe the remote service the repository layer talks to.
//! Implementations own the transport; every call is blocking and may fail
//! independently of the others.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::catalog::error::CatalogResult;
use crate::catalog::result::{Bindings, ResultSet};
use crate::catalog::types::{Change, QueryLanguage, StoreName, Triple, TriplePattern};

/// Registry of named stores on a server.
pub trait Catalog: Send + Sync {
    /// Names of every store in the catalog.
    fn list_stores(&self) -> CatalogResult<BTreeSet<StoreName>>;

    /// Create an empty store.
    fn create_store(&self, name: &StoreName) -> CatalogResult<()>;

    /// Delete a store and everything in it.
    fn delete_store(&self, name: &StoreName) -> CatalogResult<()>;

    /// Create a read-only store presenting the union of `sources`.
    fn federate_stores(&self, name: &StoreName, sources: &BTreeSet<StoreName>)
        -> CatalogResult<()>;

    /// Attach to an existing store.
    fn open_store(&self, name: &StoreName) -> CatalogResult<Arc<dyn Store>>;

    /// Check if a store exists
    fn store_exists(&self, name: &StoreName) -> CatalogResult<bool> {
        Ok(self.list_stores()?.contains(name))
    }
}

/// An attached store.
pub trait Store: Send + Sync {
    /// Name the store was opened under.
    fn name(&self) -> &StoreName;

    /// Whether the server accepts writes to this store.
    fn is_writable(&self) -> CatalogResult<bool>;

    /// Add a statement. Adding a statement that is already present is a no-op.
    fn add(&self, triple: &Triple) -> CatalogResult<()>;

    /// Remove every statement matching `pattern`, returning how many went away.
    fn remove(&self, pattern: &TriplePattern) -> CatalogResult<usize>;

    /// Statements matching `pattern`.
    fn get_statements(&self, pattern: &TriplePattern) -> CatalogResult<Vec<Triple>>;

    /// Number of statements in the store.
    fn size(&self) -> CatalogResult<usize> {
        Ok(self.get_statements(&TriplePattern::any())?.len())
    }

    /// Apply a batch of changes in order.
    ///
    /// The default sends the changes one by one and is not atomic;
    /// implementations backed by a transactional endpoint should override it.
    fn apply(&self, changes: &[Change]) -> CatalogResult<()> {
        for change in changes {
            match change {
                Change::Add(triple) => self.add(triple)?,
                Change::Remove(pattern) => {
                    self.remove(pattern)?;
                }
            }
        }
        Ok(())
    }

    /// Evaluate a query on the server.
    fn query(
        &self,
        language: QueryLanguage,
        text: &str,
        bindings: &Bindings,
    ) -> CatalogResult<ResultSet>;

    /// Index newly added statements, or everything when `all` is set.
    fn index_triples(&self, all: bool) -> CatalogResult<()>;

    /// Index literal objects of `predicate` for free-text matching.
    /// The predicate is passed in `<uri>` form.
    fn register_free_text_predicate(&self, predicate: &str) -> CatalogResult<()>;
}
