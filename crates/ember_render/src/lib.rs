//! # EMBER Render
//!
//! Named render resources with shared ownership, and the ECS system that
//! turns drawable entities into a per-frame draw list.
//!
//! Meshes and materials live in [`ResourceCache`]s. A resource stays alive
//! while any [`SmartHandle`](ember_core::SmartHandle) to it exists, which
//! usually means while some entity's [`RenderObject`] refers to it.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cache;
pub mod components;
pub mod error;
pub mod material;
pub mod mesh;
pub mod queue;
pub mod renderer;

pub use cache::ResourceCache;
pub use components::{Mat4, RenderObject, Transform};
pub use error::{RenderError, RenderResult};
pub use material::{Material, Stage};
pub use mesh::{Mesh, MeshData, Submesh, Vertex};
pub use queue::{DrawItem, RenderQueueSystem};
pub use renderer::Renderer;
