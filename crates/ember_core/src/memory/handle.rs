//! # Shared Handles
//!
//! Strong and weak ownership of a slot map entry's *presence*.
//!
//! ```text
//!   SmartHandle ──┐
//!   SmartHandle ──┼──▶ Arc<HandleCore { handle, deleter }>
//!   WeakHandle ───┘          │
//!                            └── last strong drop ──▶ deleter()
//!                                                   (e.g. erase from map)
//! ```
//!
//! The strong/weak counters are the `Arc` control block. The deleter runs
//! from `HandleCore::drop`, which the standard library guarantees to run
//! exactly once, on whichever thread releases the last strong reference.
//! The control block is released once strong and weak counts both reach
//! zero.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::slot_map::{SlotMap, SlotMapHandle};
use crate::error::{HandleError, HandleResult};

/// A slot map shared between its owner and the deleters of its handles.
///
/// Deleters capture a [`Weak`] reference to the map, so moving the owner
/// around never leaves a deleter pointing at stale memory. If the map is
/// dropped first, deleters simply do nothing.
///
/// Never drop the last [`SmartHandle`] for an entry while holding this
/// map's lock: the deleter locks it too.
pub type SharedSlotMap<T> = Arc<Mutex<SlotMap<T>>>;

/// Wraps a slot map for sharing with handle deleters.
#[must_use]
pub fn shared<T>(map: SlotMap<T>) -> SharedSlotMap<T> {
    Arc::new(Mutex::new(map))
}

type Deleter = Box<dyn FnOnce() + Send + Sync>;

/// The shared block every handle copy points at.
struct HandleCore {
    handle: SlotMapHandle,
    deleter: Option<Deleter>,
}

impl Drop for HandleCore {
    fn drop(&mut self) {
        if let Some(deleter) = self.deleter.take() {
            tracing::trace!(handle = self.handle.raw(), "last strong handle dropped");
            deleter();
        }
    }
}

/// Snapshot of a handle's reference counts.
///
/// Counts may change immediately after the snapshot is taken if other
/// threads hold copies. Once the strong count reaches zero the weak count
/// also reads as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefCounts {
    /// Number of live [`SmartHandle`]s.
    pub strong: usize,
    /// Number of live [`WeakHandle`]s.
    pub weak: usize,
}

/// Owning reference to a slot map entry.
///
/// Cloning adds a strong reference. Dropping the last one invokes the
/// deleter the handle was created with.
///
/// # Example
///
/// ```rust
/// use ember_core::{shared, SlotMap, SmartHandle};
///
/// let meshes = shared(SlotMap::new());
/// let handle = SmartHandle::insert_into(&meshes, "cube");
/// let copy = handle.clone();
///
/// drop(handle);
/// assert_eq!(meshes.lock().len(), 1);
/// drop(copy);
/// assert!(meshes.lock().is_empty());
/// ```
#[derive(Clone)]
pub struct SmartHandle {
    core: Arc<HandleCore>,
}

impl SmartHandle {
    /// Creates the first strong reference to `handle`.
    ///
    /// # Arguments
    ///
    /// * `handle` - The slot map handle being owned
    /// * `deleter` - Called once, when the last strong reference drops
    pub fn new<F>(handle: SlotMapHandle, deleter: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            core: Arc::new(HandleCore {
                handle,
                deleter: Some(Box::new(deleter)),
            }),
        }
    }

    /// Creates a strong reference whose deleter erases `handle` from `map`.
    pub fn in_map<T>(handle: SlotMapHandle, map: &SharedSlotMap<T>) -> Self
    where
        T: Send + 'static,
    {
        let map = Arc::downgrade(map);
        Self::new(handle, move || {
            if let Some(map) = map.upgrade() {
                // Value is dropped after the guard so its own handles may
                // lock the map again.
                let removed = map.lock().erase(handle);
                drop(removed);
            }
        })
    }

    /// Inserts `value` into `map` and returns the owning handle.
    ///
    /// The map lock is released before the handle is built.
    pub fn insert_into<T>(map: &SharedSlotMap<T>, value: T) -> Self
    where
        T: Send + 'static,
    {
        let handle = map.lock().insert(value);
        Self::in_map(handle, map)
    }

    /// Returns the slot map handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> SlotMapHandle {
        self.core.handle
    }

    /// Creates a weak reference to the same entry.
    #[must_use]
    pub fn downgrade(&self) -> WeakHandle {
        WeakHandle {
            handle: self.core.handle,
            core: Arc::downgrade(&self.core),
        }
    }

    /// Returns the current reference counts.
    #[must_use]
    pub fn ref_counts(&self) -> RefCounts {
        RefCounts {
            strong: Arc::strong_count(&self.core),
            weak: Arc::weak_count(&self.core),
        }
    }

    /// Checks whether two handles share the same reference block.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

impl From<&SmartHandle> for SlotMapHandle {
    fn from(handle: &SmartHandle) -> Self {
        handle.handle()
    }
}

impl fmt::Debug for SmartHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartHandle")
            .field("handle", &self.core.handle)
            .field("refs", &self.ref_counts())
            .finish()
    }
}

/// Non-owning reference to a slot map entry.
///
/// Does not keep the entry alive. Promote with [`WeakHandle::upgrade`].
#[derive(Clone)]
pub struct WeakHandle {
    handle: SlotMapHandle,
    core: Weak<HandleCore>,
}

impl WeakHandle {
    /// Creates a weak handle that was never backed by a strong one.
    ///
    /// It is never valid and can never be promoted.
    #[must_use]
    pub fn detached(handle: SlotMapHandle) -> Self {
        Self {
            handle,
            core: Weak::new(),
        }
    }

    /// Returns the slot map handle. Still readable after expiry.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> SlotMapHandle {
        self.handle
    }

    /// Checks whether strong references still exist.
    ///
    /// Advisory only: another thread may drop the last strong reference
    /// right after this returns `true`. Use [`upgrade`](Self::upgrade) to
    /// get a guarantee.
    #[inline]
    #[must_use]
    pub fn valid(&self) -> bool {
        self.core.strong_count() > 0
    }

    /// Promotes to a strong reference.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::Expired`] if every strong reference is gone,
    /// i.e. the resource has already been destroyed.
    pub fn upgrade(&self) -> HandleResult<SmartHandle> {
        self.core
            .upgrade()
            .map(|core| SmartHandle { core })
            .ok_or(HandleError::Expired {
                handle: self.handle,
            })
    }

    /// Returns the current reference counts.
    #[must_use]
    pub fn ref_counts(&self) -> RefCounts {
        RefCounts {
            strong: self.core.strong_count(),
            weak: self.core.weak_count(),
        }
    }
}

impl From<&WeakHandle> for SlotMapHandle {
    fn from(handle: &WeakHandle) -> Self {
        handle.handle()
    }
}

impl fmt::Debug for WeakHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakHandle")
            .field("handle", &self.handle)
            .field("valid", &self.valid())
            .finish()
    }
}
