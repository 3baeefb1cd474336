//! # EMBER ECS
//!
//! Entity Component System with signature-matched systems:
//! - [`EntityManager`]: fixed-capacity handles, recycled oldest-first
//! - [`ComponentManager`]: one dense array per component type
//! - [`SystemManager`]: routes entities to systems whose required
//!   [`Signature`] they satisfy, and drives the per-frame phases
//! - [`World`]: the facade keeping all three consistent
//!
//! ## Contract Violations
//!
//! Creating past capacity, adding a component twice, removing one that is
//! absent, or touching a dead entity panics. Every such operation has a
//! `try_` twin returning [`EcsError`] instead. Plain lookups return `Option`.
//!
//! ## Example
//!
//! ```rust
//! use ember_ecs::World;
//!
//! struct Health(u32);
//!
//! let mut world = World::new();
//! let orc = world.create_entity("orc");
//! world.add_component(orc, Health(30));
//!
//! world.destroy_entity(orc);
//! assert!(world.component::<Health>(orc).is_none());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod component;
pub mod config;
pub mod entity;
pub mod error;
pub mod signature;
pub mod system;
pub mod world;

pub use component::{Component, ComponentArray, ComponentManager, ComponentSet};
pub use config::EcsConfig;
pub use entity::{Entity, EntityHandle, EntityManager, INVALID_ENTITY, MAX_ENTITIES};
pub use error::{ConfigError, ConfigResult, EcsError, EcsResult};
pub use signature::{ComponentType, Signature, MAX_COMPONENTS};
pub use system::{EntitySet, FrameData, System, SystemContext, SystemManager};
pub use world::World;
