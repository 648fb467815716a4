use crate::document::Document;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parsed external documents keyed by resolved absolute path.
///
/// Shared by concurrent runs. Entries are inserted once and never
/// invalidated, so a file edited between runs keeps its first parsed form
/// for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct ExternalCache {
    documents: DashMap<PathBuf, Arc<Document>>,
}

impl ExternalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<Document>> {
        self.documents.get(path).map(|entry| Arc::clone(entry.value()))
    }

    /// Pre-seed the cache, keeping an existing entry if one is present.
    pub fn insert(&self, path: impl Into<PathBuf>, document: Document) -> Arc<Document> {
        let entry = self
            .documents
            .entry(path.into())
            .or_insert_with(|| Arc::new(document));
        Arc::clone(entry.value())
    }

    /// Return the cached document for `path`, loading it with `load` if absent.
    ///
    /// The load runs without holding a shard lock. If two runs race on the
    /// same path, the first insert wins and both observe the same document.
    /// Failures are not cached.
    pub fn get_or_try_load<E>(
        &self,
        path: &Path,
        load: impl FnOnce() -> Result<Document, E>,
    ) -> Result<Arc<Document>, E> {
        if let Some(document) = self.get(path) {
            tracing::trace!("External cache hit: {}", path.display());
            return Ok(document);
        }
        let document = load()?;
        Ok(self.insert(path.to_path_buf(), document))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Mapping, Node};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn doc(key: &str) -> Document {
        let mut m = Mapping::new();
        m.push(key, Node::Mapping(Mapping::new()));
        Document::new(Node::Mapping(m))
    }

    #[test]
    fn test_loads_once() {
        let cache = ExternalCache::new();
        let calls = AtomicUsize::new(0);
        let path = Path::new("/p/a.md");

        for _ in 0..3 {
            let loaded: Result<_, ()> = cache.get_or_try_load(path, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(doc("a"))
            });
            assert!(loaded.unwrap().root_mapping().unwrap().contains_key("a"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache = ExternalCache::new();
        let path = Path::new("/p/a.md");
        let failed: Result<Arc<Document>, &str> = cache.get_or_try_load(path, || Err("boom"));
        assert!(failed.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = ExternalCache::new();
        cache.insert("/p/a.md", doc("first"));
        let second = cache.insert("/p/a.md", doc("second"));
        assert!(second.root_mapping().unwrap().contains_key("first"));
    }
}
