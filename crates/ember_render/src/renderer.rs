//! # Renderer
//!
//! Owns the mesh and material caches and wires the render queue into a
//! [`World`].

use ember_core::SmartHandle;
use ember_ecs::{EcsResult, World};

use crate::cache::ResourceCache;
use crate::components::{RenderObject, Transform};
use crate::error::RenderResult;
use crate::material::{Material, Stage};
use crate::mesh::{Mesh, MeshData};
use crate::queue::RenderQueueSystem;

/// Resource owner for everything drawable.
///
/// # Example
///
/// ```rust
/// use ember_render::{MeshData, Renderer, Stage, Vertex};
///
/// let renderer = Renderer::new();
/// let vertices = vec![Vertex::default(); 3];
/// let mesh = renderer.load_mesh(MeshData::new("tri", vertices, vec![0, 1, 2])).unwrap();
/// let material = renderer.create_material("flat", Stage::Forward);
///
/// assert!(renderer.mesh("tri").is_some());
/// drop((mesh, material));
/// assert!(renderer.mesh("tri").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Renderer {
    meshes: ResourceCache<Mesh>,
    materials: ResourceCache<Material>,
}

impl Renderer {
    /// Creates a renderer with empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meshes: ResourceCache::new("mesh"),
            materials: ResourceCache::new("material"),
        }
    }

    /// Validates and stores a mesh under its name.
    ///
    /// # Errors
    ///
    /// Returns the validation error from [`Mesh::from_data`].
    pub fn load_mesh(&self, data: MeshData) -> RenderResult<SmartHandle> {
        let name = data.name.clone();
        let mesh = Mesh::from_data(data)?;
        Ok(self.meshes.load(name, mesh))
    }

    /// Returns a handle to a loaded mesh.
    pub fn mesh(&self, name: &str) -> Option<SmartHandle> {
        self.meshes.get(name)
    }

    /// Destroys a mesh now. Returns `true` if it existed.
    pub fn unload_mesh(&self, name: &str) -> bool {
        self.meshes.unload(name)
    }

    /// Stores a material under `name`.
    pub fn create_material(&self, name: impl Into<String>, stage: Stage) -> SmartHandle {
        let name = name.into();
        let material = Material::new(name.clone(), stage);
        self.materials.load(name, material)
    }

    /// Returns a handle to a loaded material.
    pub fn material(&self, name: &str) -> Option<SmartHandle> {
        self.materials.get(name)
    }

    /// Destroys a material now. Returns `true` if it existed.
    pub fn unload_material(&self, name: &str) -> bool {
        self.materials.unload(name)
    }

    /// The mesh cache.
    #[must_use]
    pub fn meshes(&self) -> &ResourceCache<Mesh> {
        &self.meshes
    }

    /// The material cache.
    #[must_use]
    pub fn materials(&self) -> &ResourceCache<Material> {
        &self.materials
    }

    /// Looks up both resources by name and pairs them.
    pub fn render_object(&self, mesh: &str, material: &str) -> Option<RenderObject> {
        Some(RenderObject::new(self.mesh(mesh)?, self.material(material)?))
    }

    /// Creates a render queue reading from this renderer's caches.
    #[must_use]
    pub fn queue_system(&self) -> RenderQueueSystem {
        RenderQueueSystem::new(self.meshes.clone(), self.materials.clone())
    }

    /// Registers a render queue in `world` for `(Transform, RenderObject)`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateSystem`](ember_ecs::EcsError::DuplicateSystem)
    /// if a queue is already registered, or
    /// [`EcsError::TooManyComponentTypes`](ember_ecs::EcsError::TooManyComponentTypes)
    /// if the component types cannot be registered.
    pub fn register_queue(&self, world: &mut World) -> EcsResult<()> {
        let signature = world.try_signature_of::<(Transform, RenderObject)>()?;
        world.try_register_system(signature, self.queue_system())?;
        Ok(())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
