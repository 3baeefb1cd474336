//! # Memory Management
//!
//! Stable-handle storage and the shared ownership wrappers around it.
//!
//! ## Design Philosophy
//!
//! - Storage is owned by exactly one subsystem (e.g. the renderer)
//! - Handles are freely copied across subsystems and threads
//! - Relocating values never invalidates handles; only a reset does

mod handle;
mod slot_map;

pub use handle::{shared, RefCounts, SharedSlotMap, SmartHandle, WeakHandle};
pub use slot_map::{SlotMap, SlotMapHandle};
