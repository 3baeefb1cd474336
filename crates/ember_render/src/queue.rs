//! # Render Queue
//!
//! Each frame, collects every entity with a [`Transform`] and a
//! [`RenderObject`] into draw items ordered by material stage. Entities whose
//! mesh or material was unloaded are skipped, not drawn with stale data.

use ember_core::SlotMapHandle;
use ember_ecs::{EntityHandle, FrameData, System, SystemContext};

use crate::cache::ResourceCache;
use crate::components::{Mat4, RenderObject, Transform};
use crate::material::{Material, Stage};
use crate::mesh::Mesh;

/// One entity ready to be drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    /// The entity being drawn.
    pub entity: EntityHandle,
    /// Pass the item belongs to.
    pub stage: Stage,
    /// Mesh slot.
    pub mesh: SlotMapHandle,
    /// Material slot.
    pub material: SlotMapHandle,
    /// Number of draw ranges in the mesh.
    pub submeshes: usize,
    /// World matrix.
    pub transform: Mat4,
}

/// Builds the per-frame draw list.
///
/// Register with the signature of `(Transform, RenderObject)`.
#[derive(Debug)]
pub struct RenderQueueSystem {
    meshes: ResourceCache<Mesh>,
    materials: ResourceCache<Material>,
    items: Vec<DrawItem>,
    skipped: usize,
}

impl RenderQueueSystem {
    /// Creates a queue reading from the given caches.
    #[must_use]
    pub fn new(meshes: ResourceCache<Mesh>, materials: ResourceCache<Material>) -> Self {
        Self {
            meshes,
            materials,
            items: Vec::new(),
            skipped: 0,
        }
    }

    /// The draw items of the last update, in stage order.
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    /// The draw items of one stage.
    pub fn stage_items(&self, stage: Stage) -> impl Iterator<Item = &DrawItem> {
        self.items.iter().filter(move |item| item.stage == stage)
    }

    /// Number of entities skipped in the last update.
    #[inline]
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn build_item(&self, ctx: &SystemContext<'_>, entity: EntityHandle) -> Option<DrawItem> {
        let transform = ctx.component::<Transform>(entity)?;
        let object = ctx.component::<RenderObject>(entity)?;

        let Some(submeshes) = self.meshes.with(&object.mesh, |mesh| mesh.submeshes().len()) else {
            tracing::warn!(entity, "render object has an unloaded mesh, skipping");
            return None;
        };
        let Some(stage) = self.materials.with(&object.material, |material| material.stage) else {
            tracing::warn!(entity, "render object has an unloaded material, skipping");
            return None;
        };

        Some(DrawItem {
            entity,
            stage,
            mesh: object.mesh.handle(),
            material: object.material.handle(),
            submeshes,
            transform: transform.matrix(),
        })
    }
}

impl System for RenderQueueSystem {
    fn update(&mut self, ctx: &mut SystemContext<'_>, _frame: &FrameData) {
        self.items.clear();
        self.skipped = 0;

        for &entity in ctx.entities() {
            match self.build_item(ctx, entity) {
                Some(item) => self.items.push(item),
                None => self.skipped += 1,
            }
        }

        // Stable: entities keep handle order within a stage.
        self.items.sort_by_key(|item| item.stage);
    }
}
