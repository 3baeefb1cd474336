//! # ECS World
//!
//! The facade tying entities, components and systems together. Every
//! structural change goes through here so entity signatures and system
//! working sets never drift apart.

use crate::component::{Component, ComponentManager, ComponentSet};
use crate::config::EcsConfig;
use crate::entity::{Entity, EntityHandle, EntityManager};
use crate::error::{ConfigResult, EcsError, EcsResult};
use crate::signature::{ComponentType, Signature};
use crate::system::{EntitySet, FrameData, System, SystemManager};

/// The ECS World - container for all entities, components and systems.
///
/// # Example
///
/// ```rust
/// use ember_ecs::{FrameData, System, SystemContext, World};
///
/// struct Position(f32);
/// struct Velocity(f32);
///
/// struct Movement;
///
/// impl System for Movement {
///     fn update(&mut self, ctx: &mut SystemContext<'_>, frame: &FrameData) {
///         let entities: Vec<_> = ctx.entities().iter().copied().collect();
///         for entity in entities {
///             let v = ctx.component::<Velocity>(entity).map_or(0.0, |v| v.0);
///             if let Some(p) = ctx.component_mut::<Position>(entity) {
///                 p.0 += v * frame.dt;
///             }
///         }
///     }
/// }
///
/// let mut world = World::new();
/// let signature = world.signature_of::<(Position, Velocity)>();
/// world.register_system(signature, Movement);
///
/// let ship = world.create_entity("ship");
/// world.add_component(ship, Position(0.0));
/// world.add_component(ship, Velocity(2.0));
///
/// world.run_frame(&FrameData::new(0.5));
/// assert_eq!(world.component::<Position>(ship).map(|p| p.0), Some(1.0));
/// ```
#[derive(Debug)]
pub struct World {
    entities: EntityManager,
    components: ComponentManager,
    systems: SystemManager,
    config: EcsConfig,
}

impl World {
    /// Creates a world with the default capacity limits.
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(EcsConfig::default())
    }

    /// Creates a world with the given capacity limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`](crate::ConfigError::Invalid) if a
    /// limit is out of range.
    pub fn with_config(config: EcsConfig) -> ConfigResult<Self> {
        config.validate()?;
        tracing::info!(
            max_entities = config.max_entities,
            max_component_types = config.max_component_types,
            "creating world"
        );
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: EcsConfig) -> Self {
        Self {
            entities: EntityManager::with_capacity(config.max_entities),
            components: ComponentManager::with_limit(config.max_component_types),
            systems: SystemManager::new(),
            config,
        }
    }

    /// Returns the capacity limits of this world.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EcsConfig {
        &self.config
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TooManyEntities`] if the capacity is exhausted.
    pub fn try_create_entity(&mut self, name: impl Into<String>) -> EcsResult<EntityHandle> {
        self.entities.try_create(name).map(|entity| entity.handle())
    }

    /// Creates an entity and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is exhausted.
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityHandle {
        self.entities.create(name).handle()
    }

    /// Destroys an entity, purging its components and leaving every system.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityOutOfRange`] or [`EcsError::EntityNotAlive`];
    /// nothing is modified in either case.
    pub fn try_destroy_entity(&mut self, entity: EntityHandle) -> EcsResult<()> {
        self.entities.try_destroy(entity)?;
        self.components.on_entity_destroyed(entity);
        self.systems.on_entity_destroyed(entity);
        Ok(())
    }

    /// Destroys an entity.
    ///
    /// # Panics
    ///
    /// Panics if the handle is out of range or already destroyed.
    pub fn destroy_entity(&mut self, entity: EntityHandle) {
        if let Err(err) = self.try_destroy_entity(entity) {
            panic!("{err}");
        }
    }

    /// Checks whether `entity` is alive.
    #[inline]
    #[must_use]
    pub fn has_entity(&self, entity: EntityHandle) -> bool {
        self.entities.has(entity)
    }

    /// Gets a live entity.
    #[inline]
    #[must_use]
    pub fn entity(&self, entity: EntityHandle) -> Option<&Entity> {
        self.entities.get(entity)
    }

    /// Returns the number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The entity manager.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attaches a component and routes the new signature to the systems.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityOutOfRange`] or [`EcsError::EntityNotAlive`]
    /// for a dead entity, [`EcsError::DuplicateComponent`] if it already has
    /// a `T`, and [`EcsError::TooManyComponentTypes`] if `T` cannot be
    /// registered.
    pub fn try_add_component<T: Component>(
        &mut self,
        entity: EntityHandle,
        component: T,
    ) -> EcsResult<()> {
        self.entities.try_at(entity)?;
        let id = self.components.try_add(entity, component)?;
        self.update_signature(entity, id, true)
    }

    /// Attaches a component.
    ///
    /// # Panics
    ///
    /// Panics on a dead entity, a duplicate component or when the component
    /// type limit is reached.
    pub fn add_component<T: Component>(&mut self, entity: EntityHandle, component: T) {
        if let Err(err) = self.try_add_component(entity, component) {
            panic!("{err}");
        }
    }

    /// Detaches and returns a component, routing the new signature to the
    /// systems.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityOutOfRange`] or [`EcsError::EntityNotAlive`]
    /// for a dead entity and [`EcsError::MissingComponent`] if it has no `T`.
    pub fn try_remove_component<T: Component>(&mut self, entity: EntityHandle) -> EcsResult<T> {
        self.entities.try_at(entity)?;
        let (id, component) = self.components.try_remove::<T>(entity)?;
        self.update_signature(entity, id, false)?;
        Ok(component)
    }

    /// Detaches and returns a component.
    ///
    /// # Panics
    ///
    /// Panics on a dead entity or if it has no `T`.
    pub fn remove_component<T: Component>(&mut self, entity: EntityHandle) -> T {
        match self.try_remove_component(entity) {
            Ok(component) => component,
            Err(err) => panic!("{err}"),
        }
    }

    fn update_signature(
        &mut self,
        entity: EntityHandle,
        component: ComponentType,
        present: bool,
    ) -> EcsResult<()> {
        let record = self
            .entities
            .get_mut(entity)
            .ok_or(EcsError::EntityNotAlive(entity))?;
        record.signature_mut().set(component, present);
        let signature = record.signature();
        self.systems.on_entity_signature_changed(entity, signature);
        Ok(())
    }

    /// Checks whether `entity` has a `T`.
    #[inline]
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: EntityHandle) -> bool {
        self.components.has::<T>(entity)
    }

    /// Gets the `T` of `entity`.
    #[inline]
    #[must_use]
    pub fn component<T: Component>(&self, entity: EntityHandle) -> Option<&T> {
        self.components.get(entity)
    }

    /// Gets the `T` of `entity` mutably.
    #[inline]
    pub fn component_mut<T: Component>(&mut self, entity: EntityHandle) -> Option<&mut T> {
        self.components.get_mut(entity)
    }

    /// Returns the type id of `T`, registering it on first use.
    ///
    /// # Panics
    ///
    /// Panics if the component type limit is reached.
    pub fn component_type<T: Component>(&mut self) -> ComponentType {
        self.components.component_type::<T>()
    }

    /// Builds the signature of a tuple of component types.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TooManyComponentTypes`] if registration overflows.
    pub fn try_signature_of<S: ComponentSet>(&mut self) -> EcsResult<Signature> {
        S::signature(&mut self.components)
    }

    /// Builds the signature of a tuple of component types.
    ///
    /// # Panics
    ///
    /// Panics if the component type limit is reached.
    pub fn signature_of<S: ComponentSet>(&mut self) -> Signature {
        match self.try_signature_of::<S>() {
            Ok(signature) => signature,
            Err(err) => panic!("{err}"),
        }
    }

    /// The component storage.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Registers a system with its required signature.
    ///
    /// Entities that already exist are not scanned; register systems before
    /// populating the world.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateSystem`] if `S` is already registered.
    pub fn try_register_system<S: System>(
        &mut self,
        signature: Signature,
        system: S,
    ) -> EcsResult<&mut S> {
        if !self.entities.is_empty() {
            tracing::warn!(
                system = std::any::type_name::<S>(),
                existing = self.entities.len(),
                "system registered after entities were created; they are not scanned"
            );
        }
        self.systems.try_register(signature, system)
    }

    /// Registers a system with its required signature.
    ///
    /// # Panics
    ///
    /// Panics if `S` is already registered.
    pub fn register_system<S: System>(&mut self, signature: Signature, system: S) -> &mut S {
        match self.try_register_system(signature, system) {
            Ok(system) => system,
            Err(err) => panic!("{err}"),
        }
    }

    /// Checks whether a system of type `S` is registered.
    #[inline]
    #[must_use]
    pub fn has_system<S: System>(&self) -> bool {
        self.systems.has::<S>()
    }

    /// Gets the registered system of type `S`.
    #[inline]
    #[must_use]
    pub fn system<S: System>(&self) -> Option<&S> {
        self.systems.get()
    }

    /// Gets the registered system of type `S` mutably.
    #[inline]
    pub fn system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.systems.get_mut()
    }

    /// Replaces the required signature of `S` without rescanning entities.
    ///
    /// # Panics
    ///
    /// Panics if `S` is not registered.
    pub fn set_system_signature<S: System>(&mut self, signature: Signature) {
        self.systems.set_signature::<S>(signature);
    }

    /// Returns the working set of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownSystem`] if `S` is not registered.
    pub fn system_entities<S: System>(&self) -> EcsResult<&EntitySet> {
        self.systems.entities_of::<S>()
    }

    /// The system registry.
    #[inline]
    #[must_use]
    pub fn systems(&self) -> &SystemManager {
        &self.systems
    }

    /// Runs the pre-update phase of every system.
    pub fn pre_update_all_systems(&mut self, frame: &FrameData) {
        self.systems
            .pre_update_all(&self.entities, &mut self.components, frame);
    }

    /// Runs the update phase of every system.
    pub fn update_all_systems(&mut self, frame: &FrameData) {
        self.systems
            .update_all(&self.entities, &mut self.components, frame);
    }

    /// Runs the post-update phase of every system.
    pub fn post_update_all_systems(&mut self, frame: &FrameData) {
        self.systems
            .post_update_all(&self.entities, &mut self.components, frame);
    }

    /// Runs all three phases, each across every system, in order.
    pub fn run_frame(&mut self, frame: &FrameData) {
        tracing::trace!(frame = frame.frame_index, dt = frame.dt, "running frame");
        self.pre_update_all_systems(frame);
        self.update_all_systems(frame);
        self.post_update_all_systems(frame);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
