//! Bounded, read-mostly path-fragment cache (spec.md §5, §9).
//!
//! The source this core is modeled on uses a process-wide LRU behind a lock;
//! here the cache is an object owned by the parser and injectable for tests
//! (spec.md §9 "Global path-fragment cache").

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

use super::MediaPathFragments;

/// Default capacity, per SPEC_FULL.md §C.3.
pub const DEFAULT_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    path: String,
    system_id: String,
    no_ext: bool,
    strip_leading_numbers: bool,
    filename_tags_enabled: bool,
}

/// A shared, thread-safe cache of previously parsed [`MediaPathFragments`].
pub struct FragmentCache {
    inner: Mutex<LruCache<CacheKey, MediaPathFragments>>,
}

impl FragmentCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).expect("1 != 0"));
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub(super) fn get_or_insert_with(
        &self,
        path: &str,
        system_id: &str,
        no_ext: bool,
        strip_leading_numbers: bool,
        filename_tags_enabled: bool,
        compute: impl FnOnce() -> MediaPathFragments,
    ) -> MediaPathFragments {
        let key = CacheKey {
            path: path.to_string(),
            system_id: system_id.to_string(),
            no_ext,
            strip_leading_numbers,
            filename_tags_enabled,
        };

        if let Some(hit) = self.inner.lock().get(&key) {
            return hit.clone();
        }

        let fragments = compute();
        self.inner.lock().put(key, fragments.clone());
        fragments
    }

    /// Number of entries currently cached; used by tests to assert eviction.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FragmentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_repeated_computation() {
        let cache = FragmentCache::new(2);
        let mut calls = 0;
        let mut compute = || {
            calls += 1;
            MediaPathFragments {
                path: "p".into(),
                file_name: "f".into(),
                title: "t".into(),
                slug: "s".into(),
                ext: String::new(),
                tags: vec![],
            }
        };

        let _ = cache.get_or_insert_with("p", "sys", false, false, false, &mut compute);
        let _ = cache.get_or_insert_with("p", "sys", false, false, false, &mut compute);
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_beyond_capacity() {
        let cache = FragmentCache::new(1);
        let make = |p: &str| MediaPathFragments {
            path: p.into(),
            file_name: p.into(),
            title: p.into(),
            slug: p.into(),
            ext: String::new(),
            tags: vec![],
        };
        let _ = cache.get_or_insert_with("a", "sys", false, false, false, || make("a"));
        let _ = cache.get_or_insert_with("b", "sys", false, false, false, || make("b"));
        assert_eq!(cache.len(), 1);
    }
}
