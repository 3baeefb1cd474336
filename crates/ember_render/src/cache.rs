//! # Resource Cache
//!
//! Named resources stored in a slot map, handed out as [`SmartHandle`]s.
//!
//! ```text
//!  names: "cube" ──weak──┐
//!                        ▼
//!  SmartHandle ──▶ HandleCore ── last drop ──▶ forget name, erase value
//!                        │
//!  storage: SlotMap<T> ◀─┘
//! ```
//!
//! The cache only holds weak handles, so a resource lives exactly as long
//! as somebody outside the cache holds a strong one. [`ResourceCache::unload`]
//! destroys a resource early; handles still pointing at it then resolve to
//! nothing.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use ember_core::{shared, SharedSlotMap, SlotMap, SlotMapHandle, SmartHandle, WeakHandle};
use parking_lot::Mutex;

type NameMap = Mutex<HashMap<String, WeakHandle>>;

/// A name-keyed cache of shared resources.
///
/// Clones share the same storage. Never drop the last handle to a resource
/// from inside [`with`](Self::with): the deleter locks the storage again.
pub struct ResourceCache<T> {
    storage: SharedSlotMap<T>,
    names: Arc<NameMap>,
    kind: &'static str,
}

impl<T: Send + 'static> ResourceCache<T> {
    /// Creates an empty cache. `kind` labels log output.
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            storage: shared(SlotMap::new()),
            names: Arc::new(Mutex::new(HashMap::new())),
            kind,
        }
    }

    /// Stores `value` under `name` and returns the first strong handle.
    ///
    /// If a live resource already has this name, `value` is discarded and a
    /// handle to the existing resource is returned instead.
    pub fn load(&self, name: impl Into<String>, value: T) -> SmartHandle {
        let name = name.into();

        // Held across the lookup and the insert so concurrent loads of one
        // name agree on a single slot. Lock order is names, then storage.
        let mut names = self.names.lock();
        if let Some(existing) = names.get(&name).and_then(|weak| weak.upgrade().ok()) {
            drop(names);
            tracing::debug!(kind = self.kind, %name, "resource already loaded");
            return existing;
        }

        let handle = self.storage.lock().insert(value);
        let strong = SmartHandle::new(handle, self.deleter(name.clone(), handle));

        // A dead entry under the same name is replaced; dropping a weak
        // handle never runs a deleter.
        names.insert(name.clone(), strong.downgrade());
        drop(names);

        tracing::debug!(kind = self.kind, %name, handle = handle.raw(), "resource loaded");
        strong
    }

    fn deleter(&self, name: String, handle: SlotMapHandle) -> impl FnOnce() + Send + Sync {
        let storage = Arc::downgrade(&self.storage);
        let names: Weak<NameMap> = Arc::downgrade(&self.names);
        let kind = self.kind;

        move || {
            if let Some(names) = names.upgrade() {
                let mut names = names.lock();
                // The name may have been unloaded and reused since.
                if names.get(&name).is_some_and(|weak| weak.handle() == handle) {
                    names.remove(&name);
                }
            }
            if let Some(storage) = storage.upgrade() {
                let removed = storage.lock().erase(handle);
                if removed.is_some() {
                    tracing::debug!(kind, %name, "last handle dropped, resource destroyed");
                }
                drop(removed);
            }
        }
    }

    /// Returns a new strong handle to the resource called `name`.
    ///
    /// Entries whose resource has already been destroyed are pruned.
    pub fn get(&self, name: &str) -> Option<SmartHandle> {
        let mut names = self.names.lock();
        let weak = names.get(name)?;
        match weak.upgrade() {
            Ok(strong) => Some(strong),
            Err(_) => {
                names.remove(name);
                None
            }
        }
    }

    /// Destroys the resource called `name` now, whoever still holds it.
    ///
    /// # Returns
    ///
    /// `true` if a resource was destroyed.
    pub fn unload(&self, name: &str) -> bool {
        let Some(weak) = self.names.lock().remove(name) else {
            return false;
        };
        let removed = self.storage.lock().erase(weak.handle());
        let destroyed = removed.is_some();
        drop(removed);

        if destroyed {
            tracing::debug!(kind = self.kind, name, "resource unloaded");
        }
        destroyed
    }

    /// Checks whether a live resource is called `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names
            .lock()
            .get(name)
            .is_some_and(WeakHandle::valid)
    }

    /// Checks whether the resource behind `handle` still exists.
    #[must_use]
    pub fn is_loaded(&self, handle: &SmartHandle) -> bool {
        self.storage.lock().has(handle.handle())
    }

    /// Runs `f` on the resource behind `handle`, if it still exists.
    pub fn with<R>(&self, handle: &SmartHandle, f: impl FnOnce(&T) -> R) -> Option<R> {
        let storage = self.storage.lock();
        storage.get(handle.handle()).map(f)
    }

    /// Returns the number of stored resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.lock().len()
    }

    /// Checks if the cache holds no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compacts the backing storage. Handles stay valid.
    pub fn pack(&self) {
        self.storage.lock().pack();
    }
}

impl<T> Clone for ResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            names: Arc::clone(&self.names),
            kind: self.kind,
        }
    }
}

impl<T> std::fmt::Debug for ResourceCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("kind", &self.kind)
            .field("len", &self.storage.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_and_get() {
        let cache = ResourceCache::new("text");
        let handle = cache.load("greeting", String::from("hello"));

        let again = cache.get("greeting").unwrap();
        assert!(again.ptr_eq(&handle));
        assert_eq!(cache.with(&handle, String::len), Some(5));
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn test_load_deduplicates_live_names() {
        let cache = ResourceCache::new("num");
        let first = cache.load("n", 1);
        let second = cache.load("n", 2);

        assert!(first.ptr_eq(&second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.with(&second, |n| *n), Some(1));
    }

    #[test]
    fn test_concurrent_loads_share_one_slot() {
        use std::sync::Barrier;
        use std::thread;

        for round in 0..32 {
            let cache = ResourceCache::new("num");
            let barrier = Barrier::new(4);

            let handles: Vec<SmartHandle> = thread::scope(|scope| {
                let workers: Vec<_> = (0..4)
                    .map(|worker| {
                        let cache = cache.clone();
                        let barrier = &barrier;
                        scope.spawn(move || {
                            barrier.wait();
                            cache.load("shared", round * 10 + worker)
                        })
                    })
                    .collect();
                workers.into_iter().map(|w| w.join().unwrap()).collect()
            });

            assert_eq!(cache.len(), 1);
            for handle in &handles[1..] {
                assert!(handle.ptr_eq(&handles[0]));
            }
            drop(handles);
            assert!(cache.is_empty());
        }
    }

    #[test]
    fn test_last_drop_destroys_and_forgets() {
        let cache = ResourceCache::new("num");
        let handle = cache.load("n", 7);
        let copy = handle.clone();

        drop(handle);
        assert!(cache.contains("n"));
        drop(copy);

        assert!(cache.is_empty());
        assert!(!cache.contains("n"));
        assert!(cache.get("n").is_none());
    }

    #[test]
    fn test_unload_while_held() {
        let cache = ResourceCache::new("num");
        let handle = cache.load("n", 7);

        assert!(cache.unload("n"));
        assert!(!cache.unload("n"));
        assert!(!cache.is_loaded(&handle));
        assert_eq!(cache.with(&handle, |n| *n), None);

        // The name is free again; the stale handle must not touch the reload.
        let reloaded = cache.load("n", 8);
        drop(handle);
        assert!(cache.contains("n"));
        assert_eq!(cache.with(&reloaded, |n| *n), Some(8));
    }

    #[test]
    fn test_handles_outlive_cache() {
        let cache = ResourceCache::new("num");
        let handle = cache.load("n", 1);
        drop(cache);
        drop(handle);
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = ResourceCache::new("num");
        let view = cache.clone();
        let _handle = cache.load("n", 3);
        assert!(view.contains("n"));
        assert_eq!(view.len(), 1);
    }
}
