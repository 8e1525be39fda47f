//! In-process cache, mainly for tests and short-lived embedding runs.
use std::sync::RwLock;

use super::{CacheError, IndexCache};
use crate::models::Index;

#[derive(Default)]
pub struct MemoryCache {
    entry: RwLock<Option<(String, Index)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of the stored entry, if any.
    pub fn stored_key(&self) -> Option<String> {
        self.entry
            .read()
            .ok()
            .and_then(|entry| entry.as_ref().map(|(key, _)| key.clone()))
    }
}

impl IndexCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Index>, CacheError> {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        Ok(entry
            .as_ref()
            .filter(|(stored, _)| stored == key)
            .map(|(_, index)| index.clone()))
    }

    fn put(&self, key: &str, index: &Index) -> Result<(), CacheError> {
        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        *entry = Some((key.to_string(), index.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_doc;

    #[test]
    fn test_memory_cache_keyed_lookup() {
        let cache = MemoryCache::new();
        let index = Index::new(vec![test_doc("a", "x")], vec![vec![1.0]], "m").unwrap();

        assert!(cache.get("k").unwrap().is_none());
        cache.put("k", &index).unwrap();
        assert_eq!(cache.get("k").unwrap(), Some(index));
        assert!(cache.get("other").unwrap().is_none());
        assert_eq!(cache.stored_key().as_deref(), Some("k"));
    }
}
