//! # Render Error Types

use thiserror::Error;

/// Errors that can occur while building render resources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The mesh has no vertices.
    #[error("mesh '{name}' has no vertices")]
    EmptyMesh {
        /// The mesh name.
        name: String,
    },

    /// An index points past the end of the vertex buffer.
    #[error("mesh '{name}' index {index} is out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds {
        /// The mesh name.
        name: String,
        /// The offending index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A submesh range runs past the end of the index (or vertex) buffer.
    #[error("mesh '{name}' submesh {submesh} ends at {end}, past {available} elements")]
    SubmeshOutOfRange {
        /// The mesh name.
        name: String,
        /// Position of the submesh in the list.
        submesh: usize,
        /// One past the last element the submesh draws.
        end: u64,
        /// Number of drawable elements.
        available: usize,
    },
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
