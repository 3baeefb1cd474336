//! # Render Components
//!
//! ECS components attached to drawable entities.

use bytemuck::{Pod, Zeroable};
use ember_core::SmartHandle;

/// Column-major 4x4 matrix.
pub type Mat4 = [[f32; 4]; 4];

/// Position, orientation and scale of an entity.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Transform {
    /// Translation.
    pub translation: [f32; 3],
    /// Rotation quaternion `(x, y, z, w)`, expected to be normalized.
    pub rotation: [f32; 4],
    /// Per-axis scale.
    pub scale: [f32; 3],
}

impl Transform {
    /// No translation, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        translation: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0; 3],
    };

    /// Creates a pure translation.
    #[inline]
    #[must_use]
    pub const fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Builds the scale-rotate-translate matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        let [x, y, z, w] = self.rotation;
        let [sx, sy, sz] = self.scale;
        let [tx, ty, tz] = self.translation;

        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        [
            [
                (1.0 - 2.0 * (yy + zz)) * sx,
                2.0 * (xy + wz) * sx,
                2.0 * (xz - wy) * sx,
                0.0,
            ],
            [
                2.0 * (xy - wz) * sy,
                (1.0 - 2.0 * (xx + zz)) * sy,
                2.0 * (yz + wx) * sy,
                0.0,
            ],
            [
                2.0 * (xz + wy) * sz,
                2.0 * (yz - wx) * sz,
                (1.0 - 2.0 * (xx + yy)) * sz,
                0.0,
            ],
            [tx, ty, tz, 1.0],
        ]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// The mesh and material an entity is drawn with.
///
/// Holding the component keeps both resources alive, unless they are
/// explicitly unloaded.
#[derive(Debug, Clone)]
pub struct RenderObject {
    /// Strong handle into the mesh cache.
    pub mesh: SmartHandle,
    /// Strong handle into the material cache.
    pub material: SmartHandle,
}

impl RenderObject {
    /// Pairs a mesh with a material.
    #[must_use]
    pub fn new(mesh: SmartHandle, material: SmartHandle) -> Self {
        Self { mesh, material }
    }
}
