//! # EMBER Core
//!
//! Resource storage for the EMBER engine:
//! - [`SlotMap`]: O(1) insert/erase/lookup behind stable handles
//! - [`SmartHandle`] / [`WeakHandle`]: strong and weak ownership of an entry,
//!   with a deleter that runs when the last strong reference drops
//!
//! ## Example
//!
//! ```rust
//! use ember_core::{shared, SlotMap, SmartHandle};
//!
//! let textures = shared(SlotMap::new());
//! let albedo = SmartHandle::insert_into(&textures, "albedo.png");
//! let observer = albedo.downgrade();
//!
//! assert!(observer.valid());
//! drop(albedo);
//! assert!(!observer.valid());
//! assert!(textures.lock().is_empty());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod memory;

pub use error::{HandleError, HandleResult};
pub use memory::{shared, RefCounts, SharedSlotMap, SlotMap, SlotMapHandle, SmartHandle, WeakHandle};
