//! Parsed-document cache keyed by URI
//!
//! Entries hold `Weak` references: a cached document stays reusable only
//! while some caller still owns an `Arc` to it, and the cache never keeps a
//! tree alive on its own. The map is bounded (least recently used entries
//! fall out first) and dead entries are dropped on lookup or by `purge`.

use crate::dom::XmlDocument;
use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

pub const DEFAULT_CAPACITY: usize = 64;

static GLOBAL: Lazy<DocumentCache> = Lazy::new(|| DocumentCache::with_capacity(DEFAULT_CAPACITY));

fn non_zero(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

pub struct DocumentCache {
    entries: Mutex<LruCache<String, Weak<XmlDocument>>>,
}

impl DocumentCache {
    pub fn with_capacity(capacity: usize) -> Self {
        DocumentCache {
            entries: Mutex::new(LruCache::new(non_zero(capacity))),
        }
    }

    /// Process-wide cache used by `XPointerReader`
    pub fn global() -> &'static DocumentCache {
        &GLOBAL
    }

    /// Live document cached for `uri`
    pub fn get(&self, uri: &str) -> Option<Arc<XmlDocument>> {
        let mut entries = self.entries.lock();
        Self::lookup(&mut entries, uri)
    }

    fn lookup(entries: &mut LruCache<String, Weak<XmlDocument>>, uri: &str) -> Option<Arc<XmlDocument>> {
        let weak = entries.get(uri)?;
        match weak.upgrade() {
            Some(doc) => {
                trace!(uri, "document cache hit");
                Some(doc)
            }
            None => {
                trace!(uri, "document cache entry expired");
                entries.pop(uri);
                None
            }
        }
    }

    pub fn insert(&self, uri: impl Into<String>, doc: &Arc<XmlDocument>) {
        let uri = uri.into();
        debug!(uri = %uri, "caching parsed document");
        self.entries.lock().put(uri, Arc::downgrade(doc));
    }

    /// Cached document for `uri`, or the result of `load` (cached on
    /// success). The lock is held across `load` so concurrent callers do
    /// not parse the same document twice.
    pub fn get_or_load<E>(
        &self,
        uri: &str,
        load: impl FnOnce() -> Result<Arc<XmlDocument>, E>,
    ) -> Result<Arc<XmlDocument>, E> {
        let mut entries = self.entries.lock();
        if let Some(doc) = Self::lookup(&mut entries, uri) {
            return Ok(doc);
        }
        let doc = load()?;
        debug!(uri, "caching parsed document");
        entries.put(uri.to_string(), Arc::downgrade(&doc));
        Ok(doc)
    }

    /// Forget `uri`; true when an entry was present
    pub fn evict(&self, uri: &str) -> bool {
        let removed = self.entries.lock().pop(uri).is_some();
        if removed {
            debug!(uri, "evicted cached document");
        }
        removed
    }

    /// Drop entries whose documents are no longer owned anywhere
    pub fn purge(&self) -> usize {
        let mut entries = self.entries.lock();
        let dead: Vec<String> = entries
            .iter()
            .filter(|(_, weak)| weak.strong_count() == 0)
            .map(|(uri, _)| uri.clone())
            .collect();
        for uri in &dead {
            entries.pop(uri);
        }
        if !dead.is_empty() {
            debug!(count = dead.len(), "purged expired documents");
        }
        dead.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn resize(&self, capacity: usize) {
        self.entries.lock().resize(non_zero(capacity));
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Number of entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(xml: &str) -> Arc<XmlDocument> {
        Arc::new(XmlDocument::parse(xml.as_bytes()))
    }

    #[test]
    fn test_reuse_while_owned() {
        let cache = DocumentCache::default();
        let owned = doc("<a/>");
        cache.insert("file:///a.xml", &owned);
        let again = cache.get("file:///a.xml").unwrap();
        assert!(Arc::ptr_eq(&owned, &again));
    }

    #[test]
    fn test_entry_expires_with_last_owner() {
        let cache = DocumentCache::default();
        let owned = doc("<a/>");
        cache.insert("u", &owned);
        drop(owned);
        assert!(cache.get("u").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_or_load_loads_once() {
        let cache = DocumentCache::default();
        let mut loads = 0;
        let first = cache
            .get_or_load("u", || -> Result<_, ()> {
                loads += 1;
                Ok(doc("<a/>"))
            })
            .unwrap();
        let second = cache
            .get_or_load("u", || -> Result<_, ()> {
                loads += 1;
                Ok(doc("<b/>"))
            })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads, 1);
        assert!(cache.get_or_load("v", || Err("boom")).is_err());
        assert!(cache.get("v").is_none());
    }

    #[test]
    fn test_evict_purge_and_bound() {
        let cache = DocumentCache::with_capacity(2);
        let a = doc("<a/>");
        let b = doc("<b/>");
        cache.insert("a", &a);
        cache.insert("b", &b);
        drop(b);
        assert_eq!(cache.purge(), 1);
        assert!(cache.evict("a"));
        assert!(!cache.evict("a"));

        let docs: Vec<_> = (0..3).map(|_| doc("<x/>")).collect();
        for (i, d) in docs.iter().enumerate() {
            cache.insert(i.to_string(), d);
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get("0").is_none());

        cache.resize(0);
        assert_eq!(cache.capacity(), 1);
    }
}
