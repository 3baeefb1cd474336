//! # Entity Management
//!
//! Entities are small integer handles plus a display name and the signature
//! of the components attached to them. Destroyed handles are recycled in
//! FIFO order.

use std::collections::VecDeque;

use crate::error::{EcsError, EcsResult};
use crate::signature::Signature;

/// Identifier of an entity.
pub type EntityHandle = u16;

/// Reference capacity of an [`EntityManager`].
pub const MAX_ENTITIES: usize = 5000;

/// Sentinel handle carried by destroyed or never-created entity slots.
pub const INVALID_ENTITY: EntityHandle = EntityHandle::MAX;

const DESTROYED_NAME: &str = "Destroyed";

/// An entity slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    handle: EntityHandle,
    name: String,
    signature: Signature,
}

impl Entity {
    /// Creates a live entity with an empty signature.
    #[must_use]
    pub fn new(handle: EntityHandle, name: impl Into<String>) -> Self {
        Self {
            handle,
            name: name.into(),
            signature: Signature::EMPTY,
        }
    }

    /// Returns the entity's handle, or [`INVALID_ENTITY`] once destroyed.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Returns the display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the signature of the attached components.
    #[inline]
    #[must_use]
    pub fn signature(&self) -> Signature {
        self.signature
    }

    #[inline]
    pub(crate) fn signature_mut(&mut self) -> &mut Signature {
        &mut self.signature
    }

    /// Checks whether this slot holds a live entity.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.handle != INVALID_ENTITY
    }

    fn on_destroy(&mut self) {
        self.handle = INVALID_ENTITY;
        DESTROYED_NAME.clone_into(&mut self.name);
        self.signature.clear();
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new(INVALID_ENTITY, "Unnamed")
    }
}

impl From<&Entity> for EntityHandle {
    fn from(entity: &Entity) -> Self {
        entity.handle
    }
}

/// Recycling allocator of entity handles with a fixed capacity.
///
/// Handles are issued sequentially until a destroyed handle is available;
/// freed handles are then reused oldest-first.
#[derive(Debug)]
pub struct EntityManager {
    /// Entity slots for every handle issued so far.
    entities: Vec<Entity>,
    /// Destroyed handles awaiting reuse.
    freed: VecDeque<EntityHandle>,
    /// Maximum number of handles.
    capacity: usize,
}

impl EntityManager {
    /// Creates a manager with the reference capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_ENTITIES)
    }

    /// Creates a manager that can hold at most `capacity` entities.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds [`MAX_ENTITIES`].
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            capacity <= MAX_ENTITIES,
            "Capacity cannot exceed MAX_ENTITIES"
        );

        Self {
            entities: Vec::new(),
            freed: VecDeque::new(),
            capacity,
        }
    }

    /// Returns the maximum number of entities.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of live entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len() - self.freed.len()
    }

    /// Checks if no entity is alive.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates an entity, reusing the oldest destroyed handle if any.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TooManyEntities`] if no handle is free and the
    /// capacity is reached. Nothing is modified in that case.
    pub fn try_create(&mut self, name: impl Into<String>) -> EcsResult<&mut Entity> {
        let handle = if let Some(handle) = self.freed.pop_front() {
            self.entities[usize::from(handle)] = Entity::new(handle, name);
            handle
        } else {
            let next = self.entities.len();
            if next >= self.capacity {
                return Err(EcsError::TooManyEntities {
                    capacity: self.capacity,
                });
            }
            // Capacity is at most MAX_ENTITIES, far below INVALID_ENTITY.
            let handle = EntityHandle::try_from(next)
                .map_err(|_| EcsError::TooManyEntities {
                    capacity: self.capacity,
                })?;
            self.entities.push(Entity::new(handle, name));
            handle
        };

        tracing::trace!(entity = handle, "created entity");
        Ok(&mut self.entities[usize::from(handle)])
    }

    /// Creates an entity.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is exhausted.
    pub fn create(&mut self, name: impl Into<String>) -> &mut Entity {
        match self.try_create(name) {
            Ok(entity) => entity,
            Err(err) => panic!("{err}"),
        }
    }

    /// Destroys an entity: resets its slot and queues the handle for reuse.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityOutOfRange`] for a handle never issued and
    /// [`EcsError::EntityNotAlive`] for a handle already destroyed.
    pub fn try_destroy(&mut self, handle: EntityHandle) -> EcsResult<()> {
        let entity = self
            .entities
            .get_mut(usize::from(handle))
            .ok_or(EcsError::EntityOutOfRange(handle))?;
        if !entity.is_valid() {
            return Err(EcsError::EntityNotAlive(handle));
        }

        entity.on_destroy();
        self.freed.push_back(handle);
        tracing::trace!(entity = handle, "destroyed entity");
        Ok(())
    }

    /// Destroys an entity.
    ///
    /// # Panics
    ///
    /// Panics on an out-of-range handle or a double destroy.
    pub fn destroy(&mut self, handle: EntityHandle) {
        if let Err(err) = self.try_destroy(handle) {
            panic!("{err}");
        }
    }

    /// Gets a live entity, or `None` if the handle is out of range or the
    /// entity has been destroyed.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities
            .get(usize::from(handle))
            .filter(|entity| entity.is_valid())
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.entities
            .get_mut(usize::from(handle))
            .filter(|entity| entity.is_valid())
    }

    /// Gets a live entity, reporting why it is unavailable.
    ///
    /// # Errors
    ///
    /// Same as [`try_destroy`](Self::try_destroy).
    pub fn try_at(&self, handle: EntityHandle) -> EcsResult<&Entity> {
        let entity = self
            .entities
            .get(usize::from(handle))
            .ok_or(EcsError::EntityOutOfRange(handle))?;
        if entity.is_valid() {
            Ok(entity)
        } else {
            Err(EcsError::EntityNotAlive(handle))
        }
    }

    /// Gets a live entity.
    ///
    /// # Panics
    ///
    /// Panics if the handle is out of range or destroyed.
    #[must_use]
    pub fn at(&self, handle: EntityHandle) -> &Entity {
        match self.try_at(handle) {
            Ok(entity) => entity,
            Err(err) => panic!("{err}"),
        }
    }

    /// Checks whether `handle` refers to a live entity.
    #[inline]
    #[must_use]
    pub fn has(&self, handle: EntityHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Iterates over live entities in handle order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|entity| entity.is_valid())
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
