//! # Meshes
//!
//! CPU-side mesh data, validated once before it is stored.
//!
//! The vertex layout interleaves UV coordinates into the padding after the
//! position and normal so the struct packs to 64 bytes with no holes:
//!
//! ```text
//! | position (12) | uv_x (4) | normal (12) | uv_y (4) | color (16) | tangent (16) |
//! ```

use bytemuck::{Pod, Zeroable};

use crate::error::{RenderError, RenderResult};

/// A GPU-ready vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Texture U coordinate.
    pub uv_x: f32,
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Texture V coordinate.
    pub uv_y: f32,
    /// Vertex color (RGBA).
    pub color: [f32; 4],
    /// Tangent, with handedness in `w`.
    pub tangent: [f32; 4],
}

impl Vertex {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a vertex with a zero tangent.
    #[inline]
    #[must_use]
    pub const fn new(position: [f32; 3], uv: [f32; 2], normal: [f32; 3], color: [f32; 4]) -> Self {
        Self {
            position,
            uv_x: uv[0],
            normal,
            uv_y: uv[1],
            color,
            tangent: [0.0; 4],
        }
    }

    /// Sets the tangent.
    #[inline]
    #[must_use]
    pub fn with_tangent(mut self, tangent: [f32; 4]) -> Self {
        self.tangent = tangent;
        self
    }

    /// Returns the UV coordinates.
    #[inline]
    #[must_use]
    pub const fn uv(&self) -> [f32; 2] {
        [self.uv_x, self.uv_y]
    }
}

/// A contiguous range of indices drawn with one call.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Submesh {
    /// Number of indices (or vertices, for non-indexed meshes).
    pub index_count: u32,
    /// First index of the range.
    pub index_offset: u32,
}

impl Submesh {
    /// Creates a submesh.
    #[inline]
    #[must_use]
    pub const fn new(index_count: u32, index_offset: u32) -> Self {
        Self {
            index_count,
            index_offset,
        }
    }

    /// One past the last element drawn.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.index_count as u64 + self.index_offset as u64
    }
}

/// Unvalidated mesh input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Asset name, used as the cache key.
    pub name: String,
    /// Vertex buffer contents.
    pub vertices: Vec<Vertex>,
    /// Index buffer contents; empty for non-indexed meshes.
    pub indices: Vec<u32>,
    /// Draw ranges; empty means one range covering the whole mesh.
    pub submeshes: Vec<Submesh>,
}

impl MeshData {
    /// Creates indexed mesh data with a single implicit submesh.
    #[must_use]
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            submeshes: Vec::new(),
        }
    }

    /// Sets explicit draw ranges.
    #[must_use]
    pub fn with_submeshes(mut self, submeshes: Vec<Submesh>) -> Self {
        self.submeshes = submeshes;
        self
    }
}

/// A validated mesh.
///
/// Every index is in bounds and every submesh range fits the buffer it
/// draws from. There is always at least one submesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    submeshes: Vec<Submesh>,
}

impl Mesh {
    /// Validates mesh data.
    ///
    /// With no submeshes given, one submesh covering every index (or every
    /// vertex, if there are no indices) is created.
    ///
    /// # Errors
    ///
    /// - [`RenderError::EmptyMesh`] if there are no vertices
    /// - [`RenderError::IndexOutOfBounds`] if an index exceeds the vertex count
    /// - [`RenderError::SubmeshOutOfRange`] if a submesh runs past the buffer
    pub fn from_data(data: MeshData) -> RenderResult<Self> {
        let MeshData {
            name,
            vertices,
            indices,
            mut submeshes,
        } = data;

        if vertices.is_empty() {
            return Err(RenderError::EmptyMesh { name });
        }

        if let Some(&index) = indices
            .iter()
            .find(|&&index| index as usize >= vertices.len())
        {
            return Err(RenderError::IndexOutOfBounds {
                name,
                index,
                vertex_count: vertices.len(),
            });
        }

        let available = if indices.is_empty() {
            vertices.len()
        } else {
            indices.len()
        };

        if submeshes.is_empty() {
            let Ok(count) = u32::try_from(available) else {
                return Err(RenderError::SubmeshOutOfRange {
                    name,
                    submesh: 0,
                    end: available as u64,
                    available,
                });
            };
            submeshes.push(Submesh::new(count, 0));
        }

        if let Some((submesh, range)) = submeshes
            .iter()
            .enumerate()
            .find(|(_, range)| range.end() > available as u64)
        {
            return Err(RenderError::SubmeshOutOfRange {
                name,
                submesh,
                end: range.end(),
                available,
            });
        }

        Ok(Self {
            name,
            vertices,
            indices,
            submeshes,
        })
    }

    /// Returns the asset name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the vertices.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Returns the indices; empty for non-indexed meshes.
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the draw ranges.
    #[inline]
    #[must_use]
    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes
    }

    /// Checks whether the mesh draws through an index buffer.
    #[inline]
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Vertex buffer bytes, ready for upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer bytes, ready for upload.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<Vertex> {
        vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0], [0.0, 0.0, 1.0], [1.0; 4]),
            Vertex::new([1.0, 0.0, 0.0], [1.0, 0.0], [0.0, 0.0, 1.0], [1.0; 4]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 1.0], [0.0, 0.0, 1.0], [1.0; 4]),
        ]
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(Vertex::SIZE, 64);
        let vertex = Vertex::new([1.0, 2.0, 3.0], [0.25, 0.75], [0.0; 3], [0.0; 4]);
        assert_eq!(vertex.uv(), [0.25, 0.75]);

        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&vertex));
        assert_eq!(&floats[..4], &[1.0, 2.0, 3.0, 0.25]);
        assert_eq!(floats[7], 0.75);
    }

    #[test]
    fn test_default_submesh_indexed() {
        let mesh = Mesh::from_data(MeshData::new("tri", triangle(), vec![0, 1, 2, 2, 1, 0])).unwrap();
        assert_eq!(mesh.submeshes(), &[Submesh::new(6, 0)]);
        assert!(mesh.is_indexed());
        assert_eq!(mesh.index_bytes().len(), 24);
        assert_eq!(mesh.vertex_bytes().len(), 3 * Vertex::SIZE);
    }

    #[test]
    fn test_default_submesh_non_indexed() {
        let mesh = Mesh::from_data(MeshData::new("tri", triangle(), Vec::new())).unwrap();
        assert_eq!(mesh.submeshes(), &[Submesh::new(3, 0)]);
        assert!(!mesh.is_indexed());
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let err = Mesh::from_data(MeshData::new("void", Vec::new(), Vec::new())).unwrap_err();
        assert_eq!(
            err,
            RenderError::EmptyMesh {
                name: "void".into()
            }
        );
    }

    #[test]
    fn test_index_out_of_bounds() {
        let err = Mesh::from_data(MeshData::new("bad", triangle(), vec![0, 1, 3])).unwrap_err();
        assert!(matches!(
            err,
            RenderError::IndexOutOfBounds {
                index: 3,
                vertex_count: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_submesh_out_of_range() {
        let data = MeshData::new("split", triangle(), vec![0, 1, 2, 0, 2, 1])
            .with_submeshes(vec![Submesh::new(3, 0), Submesh::new(4, 3)]);
        let err = Mesh::from_data(data).unwrap_err();
        assert!(matches!(
            err,
            RenderError::SubmeshOutOfRange {
                submesh: 1,
                end: 7,
                available: 6,
                ..
            }
        ));
    }
}
