//! Per-kind resolution cache.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::foundation::{DispatchError, DispatchResult};

type CacheEntry = Arc<dyn Any + Send + Sync>;

/// Maps a concrete message type to the prepared wrapper built for it.
///
/// Entries are created on first use and live as long as the cache. Concurrent
/// first uses may each build a wrapper, but only the first one inserted is
/// ever handed out.
pub(crate) struct ResolutionCache {
    kind: &'static str,
    entries: RwLock<HashMap<TypeId, CacheEntry>>,
}

impl ResolutionCache {
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the entry for `key`, building it with `build` on a miss.
    ///
    /// A failing `build` leaves the cache untouched, so the next call retries.
    pub(crate) fn get_or_try_insert<T, F>(&self, key: TypeId, build: F) -> DispatchResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> DispatchResult<T>,
    {
        if let Some(hit) = self.entries.read().get(&key).cloned() {
            trace!(cache = self.kind, entry = type_name::<T>(), "Resolution cache hit");
            return Self::typed(hit);
        }

        // Built outside the lock; providers may be slow or re-entrant.
        let built: CacheEntry = Arc::new(build()?);
        let entry = self.entries.write().entry(key).or_insert(built).clone();
        debug!(cache = self.kind, entry = type_name::<T>(), "Resolution cache populated");

        Self::typed(entry)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn typed<T: Send + Sync + 'static>(entry: CacheEntry) -> DispatchResult<Arc<T>> {
        entry.downcast::<T>().map_err(|_| {
            DispatchError::invalid_argument(
                type_name::<T>(),
                "resolution cache entry holds a different wrapper type",
            )
        })
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_builds_once_per_key() {
        let cache = ResolutionCache::new("test");
        let builds = AtomicUsize::new(0);
        let build = || {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(String::from("wrapper"))
        };

        let a = cache.get_or_try_insert(TypeId::of::<u8>(), build).unwrap();
        let b = cache
            .get_or_try_insert::<String, _>(TypeId::of::<u8>(), || unreachable!())
            .unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let cache = ResolutionCache::new("test");

        let err = cache
            .get_or_try_insert::<String, _>(TypeId::of::<u8>(), || {
                Err(DispatchError::not_found::<u8>())
            })
            .unwrap_err();
        assert!(matches!(err, DispatchError::HandlerNotFound { .. }));
        assert_eq!(cache.len(), 0);

        let ok = cache
            .get_or_try_insert(TypeId::of::<u8>(), || Ok(7u32))
            .unwrap();
        assert_eq!(*ok, 7);
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = ResolutionCache::new("test");
        let key = TypeId::of::<u8>();

        // A build that observes another caller finishing first.
        let winner = cache
            .get_or_try_insert(key, || {
                let _ = cache.entries.write().insert(key, Arc::new(1u32));
                Ok(2u32)
            })
            .unwrap();

        assert_eq!(*winner, 1);
    }
}
