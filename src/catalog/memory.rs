//! In-process catalog.
//!
//! Implements the catalog contract entirely in memory. Used by the test suite
//! and the demo binary; behaves like a remote server with a single client:
//! stores are looked up by name on every call, so a handle to a deleted store
//! starts failing with `NotFound` and a renewed store is seen fresh.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::catalog::client::{Catalog, Store};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::result::{Bindings, ResultSet};
use crate::catalog::types::{Change, QueryLanguage, StoreName, Triple, TriplePattern};

#[derive(Debug, Default)]
struct StoreData {
    triples: BTreeSet<Triple>,
    free_text_predicates: BTreeSet<String>,
    index_requests: usize,
}

impl StoreData {
    fn apply(&mut self, change: &Change) -> usize {
        match change {
            Change::Add(triple) => usize::from(self.triples.insert(triple.clone())),
            Change::Remove(pattern) => {
                let before = self.triples.len();
                self.triples.retain(|t| !pattern.matches(t));
                before - self.triples.len()
            }
        }
    }
}

#[derive(Debug, Clone)]
enum StoreEntry {
    Plain(Arc<RwLock<StoreData>>),
    /// Member names, fixed when the federation was created.
    Federated(Vec<StoreName>),
}

#[derive(Debug, Default)]
struct MemoryCatalogInner {
    /// Keyed by the encoded name, the way the server addresses stores.
    stores: RwLock<BTreeMap<String, StoreEntry>>,
    offline: AtomicBool,
}

impl MemoryCatalogInner {
    fn ensure_online(&self) -> CatalogResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CatalogError::Connectivity("catalog is offline".into()))
        } else {
            Ok(())
        }
    }

    fn entry(&self, name: &StoreName) -> CatalogResult<StoreEntry> {
        self.ensure_online()?;
        self.stores
            .read()
            .get(&name.encoded())
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    fn plain(&self, name: &StoreName) -> CatalogResult<Arc<RwLock<StoreData>>> {
        match self.entry(name)? {
            StoreEntry::Plain(data) => Ok(data),
            StoreEntry::Federated(_) => Err(CatalogError::Unsupported(format!(
                "store {} is federated and read-only",
                name
            ))),
        }
    }

    /// Data of every store a read on `name` should see.
    fn readable(&self, name: &StoreName) -> CatalogResult<Vec<Arc<RwLock<StoreData>>>> {
        match self.entry(name)? {
            StoreEntry::Plain(data) => Ok(vec![data]),
            StoreEntry::Federated(members) => {
                let stores = self.stores.read();
                members
                    .iter()
                    .map(|member| match stores.get(&member.encoded()) {
                        Some(StoreEntry::Plain(data)) => Ok(data.clone()),
                        Some(StoreEntry::Federated(_)) => Err(CatalogError::InvalidRequest(
                            format!("federation member {} is itself federated", member),
                        )),
                        None => Err(CatalogError::NotFound(member.to_string())),
                    })
                    .collect()
            }
        }
    }
}

/// A catalog whose stores live in process memory.
///
/// Cheap to clone; clones share the same stores.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    inner: Arc<MemoryCatalogInner>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing the connection: every catalog and store call fails
    /// with `Connectivity` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Create `name` if missing and add `triples` to it.
    pub fn seed<I>(&self, name: &StoreName, triples: I) -> CatalogResult<()>
    where
        I: IntoIterator<Item = Triple>,
    {
        if !self.store_exists(name)? {
            self.create_store(name)?;
        }
        let data = self.inner.plain(name)?;
        let mut data = data.write();
        for triple in triples {
            data.triples.insert(triple);
        }
        Ok(())
    }

    /// Predicates registered for free-text indexing on a store.
    pub fn free_text_predicates(&self, name: &StoreName) -> CatalogResult<BTreeSet<String>> {
        Ok(self.inner.plain(name)?.read().free_text_predicates.clone())
    }

    /// How many times indexing was requested on a store.
    pub fn index_requests(&self, name: &StoreName) -> CatalogResult<usize> {
        Ok(self.inner.plain(name)?.read().index_requests)
    }

    /// Federation members of a store, `None` for a plain store.
    pub fn federation_members(&self, name: &StoreName) -> CatalogResult<Option<Vec<StoreName>>> {
        match self.inner.entry(name)? {
            StoreEntry::Plain(_) => Ok(None),
            StoreEntry::Federated(members) => Ok(Some(members)),
        }
    }
}

impl Catalog for MemoryCatalog {
    fn list_stores(&self) -> CatalogResult<BTreeSet<StoreName>> {
        self.inner.ensure_online()?;
        self.inner
            .stores
            .read()
            .keys()
            .map(|key| StoreName::from_encoded(key).map_err(CatalogError::from))
            .collect()
    }

    fn create_store(&self, name: &StoreName) -> CatalogResult<()> {
        self.inner.ensure_online()?;
        let mut stores = self.inner.stores.write();
        if stores.contains_key(&name.encoded()) {
            return Err(CatalogError::AlreadyExists(name.to_string()));
        }
        stores.insert(name.encoded(), StoreEntry::Plain(Arc::default()));
        debug!(store = %name, "created store");
        Ok(())
    }

    fn delete_store(&self, name: &StoreName) -> CatalogResult<()> {
        self.inner.ensure_online()?;
        if self.inner.stores.write().remove(&name.encoded()).is_none() {
            return Err(CatalogError::NotFound(name.to_string()));
        }
        debug!(store = %name, "deleted store");
        Ok(())
    }

    fn federate_stores(
        &self,
        name: &StoreName,
        sources: &BTreeSet<StoreName>,
    ) -> CatalogResult<()> {
        self.inner.ensure_online()?;
        if sources.is_empty() {
            return Err(CatalogError::InvalidRequest(format!(
                "federation {} needs at least one member store",
                name
            )));
        }

        let mut stores = self.inner.stores.write();
        if stores.contains_key(&name.encoded()) {
            return Err(CatalogError::AlreadyExists(name.to_string()));
        }
        for source in sources {
            match stores.get(&source.encoded()) {
                Some(StoreEntry::Plain(_)) => {}
                Some(StoreEntry::Federated(_)) => {
                    return Err(CatalogError::InvalidRequest(format!(
                        "cannot federate {}: it is itself federated",
                        source
                    )));
                }
                None => return Err(CatalogError::NotFound(source.to_string())),
            }
        }

        stores.insert(
            name.encoded(),
            StoreEntry::Federated(sources.iter().cloned().collect()),
        );
        debug!(store = %name, members = sources.len(), "created federated store");
        Ok(())
    }

    fn open_store(&self, name: &StoreName) -> CatalogResult<Arc<dyn Store>> {
        self.inner.entry(name)?;
        Ok(Arc::new(MemoryStore {
            name: name.clone(),
            catalog: self.inner.clone(),
        }))
    }
}

/// Store handle returned by [`MemoryCatalog::open_store`].
struct MemoryStore {
    name: StoreName,
    catalog: Arc<MemoryCatalogInner>,
}

impl Store for MemoryStore {
    fn name(&self) -> &StoreName {
        &self.name
    }

    fn is_writable(&self) -> CatalogResult<bool> {
        Ok(matches!(self.catalog.entry(&self.name)?, StoreEntry::Plain(_)))
    }

    fn add(&self, triple: &Triple) -> CatalogResult<()> {
        self.catalog.plain(&self.name)?.write().triples.insert(triple.clone());
        Ok(())
    }

    fn remove(&self, pattern: &TriplePattern) -> CatalogResult<usize> {
        let data = self.catalog.plain(&self.name)?;
        let removed = data.write().apply(&Change::Remove(pattern.clone()));
        Ok(removed)
    }

    fn get_statements(&self, pattern: &TriplePattern) -> CatalogResult<Vec<Triple>> {
        let mut seen = BTreeSet::new();
        for data in self.catalog.readable(&self.name)? {
            let data = data.read();
            seen.extend(data.triples.iter().filter(|t| pattern.matches(t)).cloned());
        }
        Ok(seen.into_iter().collect())
    }

    /// Applies the whole batch under one write lock.
    fn apply(&self, changes: &[Change]) -> CatalogResult<()> {
        let data = self.catalog.plain(&self.name)?;
        let mut data = data.write();
        for change in changes {
            data.apply(change);
        }
        Ok(())
    }

    fn query(
        &self,
        language: QueryLanguage,
        _text: &str,
        _bindings: &Bindings,
    ) -> CatalogResult<ResultSet> {
        self.catalog.entry(&self.name)?;
        Err(CatalogError::Unsupported(format!(
            "{} queries need a query engine; the in-memory catalog has none",
            language
        )))
    }

    fn index_triples(&self, _all: bool) -> CatalogResult<()> {
        self.catalog.plain(&self.name)?.write().index_requests += 1;
        Ok(())
    }

    fn register_free_text_predicate(&self, predicate: &str) -> CatalogResult<()> {
        self.catalog
            .plain(&self.name)?
            .write()
            .free_text_predicates
            .insert(predicate.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> StoreName {
        StoreName::new(s).unwrap()
    }

    fn triple(s: &str, o: &str) -> Triple {
        Triple::new(s, "ex:p", o)
    }

    #[test]
    fn test_create_list_delete() {
        let catalog = MemoryCatalog::new();
        assert!(catalog.list_stores().unwrap().is_empty());

        catalog.create_store(&name("red")).unwrap();
        assert!(catalog.store_exists(&name("red")).unwrap());

        let result = catalog.create_store(&name("red"));
        assert!(matches!(result, Err(CatalogError::AlreadyExists(_))));

        catalog.delete_store(&name("red")).unwrap();
        assert!(!catalog.store_exists(&name("red")).unwrap());

        let result = catalog.delete_store(&name("red"));
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_names_cross_in_encoded_form() {
        let catalog = MemoryCatalog::new();
        catalog.create_store(&name("my store/v1")).unwrap();

        assert!(catalog.inner.stores.read().contains_key("my+store%2Fv1"));
        let listed = catalog.list_stores().unwrap();
        assert!(listed.contains(&name("my store/v1")));
        assert!(catalog.store_exists(&name("my store/v1")).unwrap());
    }

    #[test]
    fn test_list_rejects_undecodable_name() {
        let catalog = MemoryCatalog::new();
        catalog
            .inner
            .stores
            .write()
            .insert("+bad".to_string(), StoreEntry::Plain(Arc::default()));

        assert!(matches!(catalog.list_stores(), Err(CatalogError::InvalidName(_))));
    }

    #[test]
    fn test_open_missing_store() {
        let catalog = MemoryCatalog::new();
        let result = catalog.open_store(&name("missing"));
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_store_add_remove() {
        let catalog = MemoryCatalog::new();
        catalog.create_store(&name("red")).unwrap();
        let store = catalog.open_store(&name("red")).unwrap();

        store.add(&triple("ex:a", "1")).unwrap();
        store.add(&triple("ex:a", "1")).unwrap();
        store.add(&triple("ex:b", "2")).unwrap();
        assert_eq!(store.size().unwrap(), 2);

        let removed = store.remove(&TriplePattern::any().subject("ex:a")).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.size().unwrap(), 1);
    }

    #[test]
    fn test_handle_follows_store_by_name() {
        let catalog = MemoryCatalog::new();
        catalog.seed(&name("red"), [triple("ex:a", "1")]).unwrap();
        let store = catalog.open_store(&name("red")).unwrap();

        catalog.delete_store(&name("red")).unwrap();
        assert!(matches!(store.size(), Err(CatalogError::NotFound(_))));

        catalog.create_store(&name("red")).unwrap();
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn test_federation_reads_union() {
        let catalog = MemoryCatalog::new();
        catalog
            .seed(&name("red"), [triple("ex:r1", "1"), triple("ex:r2", "2")])
            .unwrap();
        catalog
            .seed(&name("green"), [triple("ex:g1", "1"), triple("ex:g2", "2")])
            .unwrap();

        let sources: BTreeSet<_> = [name("red"), name("green")].into_iter().collect();
        catalog.federate_stores(&name("rainbow"), &sources).unwrap();

        let rainbow = catalog.open_store(&name("rainbow")).unwrap();
        assert_eq!(rainbow.size().unwrap(), 4);
        assert!(!rainbow.is_writable().unwrap());
        assert!(matches!(
            rainbow.add(&triple("ex:x", "1")),
            Err(CatalogError::Unsupported(_))
        ));

        // Member contents are read live.
        catalog.seed(&name("red"), [triple("ex:r3", "3")]).unwrap();
        assert_eq!(rainbow.size().unwrap(), 5);
    }

    #[test]
    fn test_federation_rejects_bad_members() {
        let catalog = MemoryCatalog::new();
        let empty = BTreeSet::new();
        assert!(matches!(
            catalog.federate_stores(&name("f"), &empty),
            Err(CatalogError::InvalidRequest(_))
        ));

        let missing: BTreeSet<_> = [name("nope")].into_iter().collect();
        assert!(matches!(
            catalog.federate_stores(&name("f"), &missing),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_apply_batch() {
        let catalog = MemoryCatalog::new();
        catalog.seed(&name("red"), [triple("ex:a", "1")]).unwrap();
        let store = catalog.open_store(&name("red")).unwrap();

        store
            .apply(&[
                Change::Remove(TriplePattern::any()),
                Change::Add(triple("ex:b", "2")),
            ])
            .unwrap();
        assert_eq!(store.get_statements(&TriplePattern::any()).unwrap(), vec![triple("ex:b", "2")]);
    }

    #[test]
    fn test_offline_fails_everything() {
        let catalog = MemoryCatalog::new();
        catalog.create_store(&name("red")).unwrap();
        let store = catalog.open_store(&name("red")).unwrap();

        catalog.set_offline(true);
        assert!(catalog.list_stores().unwrap_err().is_connectivity());
        assert!(store.size().unwrap_err().is_connectivity());

        catalog.set_offline(false);
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn test_index_and_free_text() {
        let catalog = MemoryCatalog::new();
        catalog.create_store(&name("red")).unwrap();
        let store = catalog.open_store(&name("red")).unwrap();

        store.index_triples(false).unwrap();
        store.register_free_text_predicate("<ex:label>").unwrap();
        assert_eq!(catalog.index_requests(&name("red")).unwrap(), 1);
        assert!(catalog
            .free_text_predicates(&name("red"))
            .unwrap()
            .contains("<ex:label>"));
    }

    #[test]
    fn test_query_unsupported() {
        let catalog = MemoryCatalog::new();
        catalog.create_store(&name("red")).unwrap();
        let store = catalog.open_store(&name("red")).unwrap();
        let result = store.query(QueryLanguage::Sparql, "SELECT * WHERE {?s ?p ?o}", &Bindings::new());
        assert!(matches!(result, Err(CatalogError::Unsupported(_))));
    }
}
