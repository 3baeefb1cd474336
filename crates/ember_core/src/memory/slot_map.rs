//! # Slot Map
//!
//! Stable-handle storage. Values live in a dense vector of optional slots,
//! clients hold opaque [`SlotMapHandle`]s, and an index map translates one
//! into the other.
//!
//! ```text
//!  handles        index_map         data
//!  ┌────┐        ┌────────┐       ┌─────────────┐
//!  │ h1 │ ─────▶ │ h1 → 0 │ ────▶ │ 0: Some(5)  │
//!  │ h3 │ ─────▶ │ h3 → 2 │ ──┐   │ 1: None     │ ◀── next_free
//!  └────┘        └────────┘   └─▶ │ 2: Some(15) │
//!                                 └─────────────┘
//! ```
//!
//! Because of the indirection, values can be relocated (see [`SlotMap::pack`])
//! without invalidating any handle. Only [`SlotMap::reset`] does that.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Opaque identifier for a slot map entry.
///
/// Handles are issued from a monotonically increasing counter and are never
/// reused while the map is alive, so a stale handle can never alias a newer
/// value. The raw value `0` is never issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SlotMapHandle(u64);

impl SlotMapHandle {
    /// A handle value that no slot map ever issues.
    pub const NULL: Self = Self(0);

    /// Creates a handle from its raw value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value of this handle.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Checks whether this is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Default for SlotMapHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for SlotMapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotMapHandle({})", self.0)
    }
}

/// An occupied slot. The owning handle is stored next to the value so that
/// relocations can rewrite the index map without a reverse lookup.
#[derive(Clone, Debug)]
struct Slot<T> {
    handle: SlotMapHandle,
    value: T,
}

/// Generic stable-handle container.
///
/// | Operation | Cost |
/// |-----------|------|
/// | [`insert`](Self::insert) | O(1) amortized |
/// | [`erase`](Self::erase) | O(1) |
/// | [`get`](Self::get) | O(1) |
/// | [`pack`](Self::pack) | O(n) |
///
/// # Thread Safety
///
/// The map itself is NOT synchronised. Whoever owns it mutates it; share it
/// across threads through [`SharedSlotMap`](crate::memory::SharedSlotMap).
///
/// # Example
///
/// ```rust
/// use ember_core::SlotMap;
///
/// let mut map = SlotMap::new();
/// let h = map.insert(5);
/// assert_eq!(map.get(h), Some(&5));
/// assert_eq!(map.erase(h), Some(5));
/// assert_eq!(map.get(h), None);
/// ```
#[derive(Clone, Debug)]
pub struct SlotMap<T> {
    /// Backing slots, `None` marks a hole.
    data: Vec<Option<Slot<T>>>,
    /// Handle to slot index.
    index_map: HashMap<SlotMapHandle, usize>,
    /// Lower bound for the next free slot. Every slot below it is occupied.
    next_free: usize,
    /// Last handle value issued.
    next_handle: u64,
}

impl<T> SlotMap<T> {
    /// Creates an empty slot map.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty slot map with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            index_map: HashMap::with_capacity(capacity),
            next_free: 0,
            next_handle: 0,
        }
    }

    /// Returns the number of stored values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.index_map.len()
    }

    /// Checks if the map holds no values.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index_map.is_empty()
    }

    /// Returns the number of backing slots, occupied or not.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.data.len()
    }

    /// Returns the backing slot index currently used by `handle`.
    #[inline]
    #[must_use]
    pub fn slot_of(&self, handle: SlotMapHandle) -> Option<usize> {
        self.index_map.get(&handle).copied()
    }

    /// Stores a value and returns a fresh handle for it.
    ///
    /// The value goes into the first hole at or after the cached free
    /// position, or is appended when there is none. A stale cached position
    /// is tolerated by scanning forward.
    ///
    /// # Returns
    ///
    /// A handle that has never been issued by this map before.
    pub fn insert(&mut self, value: T) -> SlotMapHandle {
        let mut index = self.next_free;
        while index < self.data.len() && self.data[index].is_some() {
            index += 1;
        }

        self.next_handle += 1;
        let handle = SlotMapHandle(self.next_handle);
        let slot = Some(Slot { handle, value });

        if index < self.data.len() {
            self.data[index] = slot;
        } else {
            index = self.data.len();
            self.data.push(slot);
        }

        self.next_free = index + 1;
        self.index_map.insert(handle, index);
        handle
    }

    /// Removes a value and returns it.
    ///
    /// The freed slot becomes the preferred target for the next insert.
    ///
    /// # Returns
    ///
    /// The removed value, or `None` if the handle is not present (already
    /// erased, never issued, or issued by another map).
    pub fn erase(&mut self, handle: SlotMapHandle) -> Option<T> {
        let index = self.index_map.remove(&handle)?;
        let slot = self.data[index].take()?;

        if index < self.next_free {
            self.next_free = index;
        }

        Some(slot.value)
    }

    /// Removes a value and compacts by moving the last occupied slot into
    /// the hole.
    ///
    /// The moved value keeps its handle; only its slot index changes.
    /// Trailing holes are trimmed off the backing vector.
    pub fn erase_swap_end(&mut self, handle: SlotMapHandle) -> Option<T> {
        let index = self.index_map.remove(&handle)?;
        let removed = self.data[index].take()?;

        if let Some(last) = self.data.iter().rposition(Option::is_some) {
            if last > index {
                let moved = self.data[last].take();
                if let Some(slot) = &moved {
                    self.index_map.insert(slot.handle, index);
                }
                self.data[index] = moved;
            }
        }

        let occupied = self.data.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
        self.data.truncate(occupied);
        self.next_free = self.next_free.min(index).min(self.data.len());

        Some(removed.value)
    }

    /// Checks if `handle` refers to a stored value.
    #[inline]
    #[must_use]
    pub fn has(&self, handle: SlotMapHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Gets a reference to a value, or `None` if the handle is absent.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: SlotMapHandle) -> Option<&T> {
        let index = *self.index_map.get(&handle)?;
        self.data.get(index)?.as_ref().map(|slot| &slot.value)
    }

    /// Gets a mutable reference to a value, or `None` if the handle is absent.
    #[inline]
    pub fn get_mut(&mut self, handle: SlotMapHandle) -> Option<&mut T> {
        let index = *self.index_map.get(&handle)?;
        self.data.get_mut(index)?.as_mut().map(|slot| &mut slot.value)
    }

    /// Moves every value toward index 0, preserving relative order, and
    /// rewrites the index map so every surviving handle still resolves.
    ///
    /// Raw slot indices obtained before the call are meaningless after it.
    pub fn pack(&mut self) {
        let before = self.data.len();
        self.data.retain(Option::is_some);

        for (index, slot) in self.data.iter().enumerate() {
            if let Some(slot) = slot {
                self.index_map.insert(slot.handle, index);
            }
        }

        self.next_free = self.data.len();
        tracing::debug!(
            before,
            after = self.data.len(),
            "packed slot map"
        );
    }

    /// Drops every value and restarts handle numbering.
    ///
    /// **Dangerous**: a handle issued before the reset may later resolve to
    /// an unrelated value. Only call this when every outstanding handle is
    /// known to be gone.
    pub fn reset(&mut self) {
        tracing::warn!(
            dropped = self.index_map.len(),
            "slot map reset, all outstanding handles are invalidated"
        );
        self.data.clear();
        self.index_map.clear();
        self.next_free = 0;
        self.next_handle = 0;
    }

    /// Returns every handle currently stored, in no particular order.
    #[must_use]
    pub fn handles(&self) -> Vec<SlotMapHandle> {
        self.index_map.keys().copied().collect()
    }

    /// Iterates over all stored values in slot order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter().flatten().map(|slot| &slot.value)
    }

    /// Iterates mutably over all stored values in slot order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.data.iter_mut().flatten().map(|slot| &mut slot.value)
    }

    /// Iterates over `(handle, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotMapHandle, &T)> {
        self.data
            .iter()
            .flatten()
            .map(|slot| (slot.handle, &slot.value))
    }

    #[cfg(test)]
    fn check_invariants(&self) {
        assert!(self.next_free <= self.data.len());
        assert!(self.data[..self.next_free].iter().all(Option::is_some));
        for (handle, &index) in &self.index_map {
            let slot = self.data[index].as_ref().expect("mapped slot is empty");
            assert_eq!(slot.handle, *handle);
        }
        assert_eq!(self.data.iter().flatten().count(), self.index_map.len());
    }
}

impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<SlotMapHandle> for SlotMap<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if the handle is not present.
    fn index(&self, handle: SlotMapHandle) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("{handle} is not present in the slot map"),
        }
    }
}

impl<T> IndexMut<SlotMapHandle> for SlotMap<T> {
    fn index_mut(&mut self, handle: SlotMapHandle) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("{handle} is not present in the slot map"),
        }
    }
}
