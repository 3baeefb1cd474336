//! # Systems
//!
//! Systems are registered once with a required [`Signature`]. The
//! [`SystemManager`] keeps each system's working set in step with entity
//! signature changes and drives the three per-frame phases.
//!
//! ```text
//! entity signature ──▶ (sig & required) == required ? ──▶ insert into set
//!                                                   └──▶ remove from set
//! ```
//!
//! Changing a system's signature after registration does not rescan the
//! entities that already exist. Only later signature changes are routed
//! against the new signature.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeSet, HashMap};

use crate::component::{Component, ComponentManager};
use crate::entity::{EntityHandle, EntityManager};
use crate::error::{EcsError, EcsResult};
use crate::signature::Signature;

/// The working set of a system, ordered by handle.
pub type EntitySet = BTreeSet<EntityHandle>;

/// Per-frame data passed to every system hook.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameData {
    /// Seconds elapsed since the previous frame.
    pub dt: f32,
    /// Sequential frame number, starting at zero.
    pub frame_index: u64,
}

impl FrameData {
    /// Creates frame data for the first frame.
    #[must_use]
    pub const fn new(dt: f32) -> Self {
        Self { dt, frame_index: 0 }
    }

    /// Returns the data for the frame after this one.
    #[must_use]
    pub const fn next(self, dt: f32) -> Self {
        Self {
            dt,
            frame_index: self.frame_index + 1,
        }
    }
}

/// What a system sees while one of its phase hooks runs.
///
/// Component *data* may be read and written. Structural changes (creating or
/// destroying entities, adding or removing components) happen outside the
/// dispatch pass, through the [`World`](crate::World).
pub struct SystemContext<'a> {
    entities: &'a EntitySet,
    registry: &'a EntityManager,
    components: &'a mut ComponentManager,
}

impl<'a> SystemContext<'a> {
    /// Bundles the borrows for one hook call.
    pub fn new(
        entities: &'a EntitySet,
        registry: &'a EntityManager,
        components: &'a mut ComponentManager,
    ) -> Self {
        Self {
            entities,
            registry,
            components,
        }
    }

    /// The entities currently matching the system's signature.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &EntitySet {
        self.entities
    }

    /// The entity manager, for names and signatures.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &EntityManager {
        self.registry
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

    /// Read-only access to the component storage.
    ///
    /// Adding or removing components is not possible from here, so entity
    /// signatures cannot drift from the stored components mid-frame.
    ///
    /// ```compile_fail
    /// use ember_ecs::{FrameData, System, SystemContext};
    ///
    /// struct Sneaky;
    ///
    /// impl System for Sneaky {
    ///     fn update(&mut self, ctx: &mut SystemContext<'_>, _frame: &FrameData) {
    ///         ctx.components().add(0, 1u32);
    ///     }
    /// }
    /// ```
    #[inline]
    #[must_use]
    pub fn components(&self) -> &ComponentManager {
        self.components
    }
}

/// Upcast to [`Any`] for typed access to registered systems.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of per-frame logic over the entities matching its signature.
///
/// Every hook defaults to a no-op; override only the ones you need.
pub trait System: AsAny + Send {
    /// Name of this system for debugging.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Called before any system's [`update`](Self::update).
    fn pre_update(&mut self, _ctx: &mut SystemContext<'_>, _frame: &FrameData) {}

    /// The main per-frame hook.
    fn update(&mut self, _ctx: &mut SystemContext<'_>, _frame: &FrameData) {}

    /// Called after every system's [`update`](Self::update).
    fn post_update(&mut self, _ctx: &mut SystemContext<'_>, _frame: &FrameData) {}

    /// An entity entered the working set.
    fn on_entity_added(&mut self, _entity: EntityHandle) {}

    /// An entity left the working set.
    fn on_entity_removed(&mut self, _entity: EntityHandle) {}
}

/// One registered system and its subscription state.
struct SystemSlot {
    name: &'static str,
    signature: Signature,
    entities: EntitySet,
    system: Box<dyn System>,
}

#[derive(Clone, Copy)]
enum Phase {
    Pre,
    Update,
    Post,
}

/// Registry of systems, keyed by type, run in registration order.
#[derive(Default)]
pub struct SystemManager {
    slots: Vec<SystemSlot>,
    indices: HashMap<TypeId, usize>,
}

impl SystemManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered systems.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Checks if no system is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registers `system` with its required signature.
    ///
    /// The working set starts empty.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateSystem`] if a system of type `S` is
    /// already registered.
    pub fn try_register<S: System>(&mut self, signature: Signature, system: S) -> EcsResult<&mut S> {
        let key = TypeId::of::<S>();
        if self.indices.contains_key(&key) {
            return Err(EcsError::DuplicateSystem(type_name::<S>()));
        }

        let index = self.slots.len();
        self.slots.push(SystemSlot {
            name: type_name::<S>(),
            signature,
            entities: EntitySet::new(),
            system: Box::new(system),
        });
        self.indices.insert(key, index);

        tracing::debug!(system = type_name::<S>(), %signature, "registered system");
        self.get_mut::<S>()
            .ok_or(EcsError::UnknownSystem(type_name::<S>()))
    }

    /// Registers `system` with its required signature.
    ///
    /// # Panics
    ///
    /// Panics if a system of type `S` is already registered.
    pub fn register<S: System>(&mut self, signature: Signature, system: S) -> &mut S {
        match self.try_register(signature, system) {
            Ok(system) => system,
            Err(err) => panic!("{err}"),
        }
    }

    /// Checks if a system of type `S` is registered.
    #[must_use]
    pub fn has<S: System>(&self) -> bool {
        self.indices.contains_key(&TypeId::of::<S>())
    }

    fn slot<S: System>(&self) -> EcsResult<&SystemSlot> {
        self.indices
            .get(&TypeId::of::<S>())
            .map(|&index| &self.slots[index])
            .ok_or(EcsError::UnknownSystem(type_name::<S>()))
    }

    fn slot_mut<S: System>(&mut self) -> EcsResult<&mut SystemSlot> {
        let index = *self
            .indices
            .get(&TypeId::of::<S>())
            .ok_or(EcsError::UnknownSystem(type_name::<S>()))?;
        Ok(&mut self.slots[index])
    }

    /// Gets the registered system of type `S`.
    #[must_use]
    pub fn get<S: System>(&self) -> Option<&S> {
        let slot = self.slot::<S>().ok()?;
        (*slot.system).as_any().downcast_ref()
    }

    /// Gets the registered system of type `S` mutably.
    pub fn get_mut<S: System>(&mut self) -> Option<&mut S> {
        let slot = self.slot_mut::<S>().ok()?;
        (*slot.system).as_any_mut().downcast_mut()
    }

    /// Returns the required signature of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownSystem`] if `S` is not registered.
    pub fn signature_of<S: System>(&self) -> EcsResult<Signature> {
        self.slot::<S>().map(|slot| slot.signature)
    }

    /// Returns the working set of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownSystem`] if `S` is not registered.
    pub fn entities_of<S: System>(&self) -> EcsResult<&EntitySet> {
        self.slot::<S>().map(|slot| &slot.entities)
    }

    /// Replaces the required signature of `S`.
    ///
    /// The current working set is kept as is; existing entities are not
    /// rescanned.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownSystem`] if `S` is not registered.
    pub fn try_set_signature<S: System>(&mut self, signature: Signature) -> EcsResult<()> {
        let slot = self.slot_mut::<S>()?;
        if slot.signature != signature {
            tracing::warn!(
                system = slot.name,
                old = %slot.signature,
                new = %signature,
                "system signature changed; existing entities are not rescanned"
            );
        }
        slot.signature = signature;
        Ok(())
    }

    /// Replaces the required signature of `S`.
    ///
    /// # Panics
    ///
    /// Panics if `S` is not registered.
    pub fn set_signature<S: System>(&mut self, signature: Signature) {
        if let Err(err) = self.try_set_signature::<S>(signature) {
            panic!("{err}");
        }
    }

    /// Routes a new entity signature to every system.
    ///
    /// Entities whose signature contains a system's required signature join
    /// its working set; all others leave it. Both directions are idempotent.
    pub fn on_entity_signature_changed(&mut self, entity: EntityHandle, signature: Signature) {
        for slot in &mut self.slots {
            if signature.contains_all(slot.signature) {
                if slot.entities.insert(entity) {
                    tracing::trace!(system = slot.name, entity, "entity joined system");
                    slot.system.on_entity_added(entity);
                }
            } else if slot.entities.remove(&entity) {
                tracing::trace!(system = slot.name, entity, "entity left system");
                slot.system.on_entity_removed(entity);
            }
        }
    }

    /// Removes a destroyed entity from every working set.
    pub fn on_entity_destroyed(&mut self, entity: EntityHandle) {
        for slot in &mut self.slots {
            if slot.entities.remove(&entity) {
                slot.system.on_entity_removed(entity);
            }
        }
    }

    fn run_phase(
        &mut self,
        phase: Phase,
        registry: &EntityManager,
        components: &mut ComponentManager,
        frame: &FrameData,
    ) {
        for slot in &mut self.slots {
            let SystemSlot {
                entities, system, ..
            } = slot;
            let mut ctx = SystemContext::new(entities, registry, components);
            match phase {
                Phase::Pre => system.pre_update(&mut ctx, frame),
                Phase::Update => system.update(&mut ctx, frame),
                Phase::Post => system.post_update(&mut ctx, frame),
            }
        }
    }

    /// Runs every system's [`System::pre_update`] in registration order.
    pub fn pre_update_all(
        &mut self,
        registry: &EntityManager,
        components: &mut ComponentManager,
        frame: &FrameData,
    ) {
        self.run_phase(Phase::Pre, registry, components, frame);
    }

    /// Runs every system's [`System::update`] in registration order.
    pub fn update_all(
        &mut self,
        registry: &EntityManager,
        components: &mut ComponentManager,
        frame: &FrameData,
    ) {
        self.run_phase(Phase::Update, registry, components, frame);
    }

    /// Runs every system's [`System::post_update`] in registration order.
    pub fn post_update_all(
        &mut self,
        registry: &EntityManager,
        components: &mut ComponentManager,
        frame: &FrameData,
    ) {
        self.run_phase(Phase::Post, registry, components, frame);
    }

    /// Names of the registered systems, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.iter().map(|slot| slot.name)
    }
}

impl std::fmt::Debug for SystemManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        added: Vec<EntityHandle>,
        removed: Vec<EntityHandle>,
        updates: u32,
    }

    impl System for Counter {
        fn update(&mut self, ctx: &mut SystemContext<'_>, _frame: &FrameData) {
            self.updates += u32::try_from(ctx.entities().len()).unwrap_or(u32::MAX);
        }

        fn on_entity_added(&mut self, entity: EntityHandle) {
            self.added.push(entity);
        }

        fn on_entity_removed(&mut self, entity: EntityHandle) {
            self.removed.push(entity);
        }
    }

    #[derive(Default)]
    struct Idle;

    impl System for Idle {}

    fn sig(bits: &[u8]) -> Signature {
        bits.iter().copied().collect()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut manager = SystemManager::new();
        manager.register(sig(&[0, 1]), Counter::default());

        assert!(manager.has::<Counter>());
        assert!(!manager.has::<Idle>());
        assert_eq!(manager.signature_of::<Counter>().unwrap(), sig(&[0, 1]));
        assert!(manager.entities_of::<Counter>().unwrap().is_empty());
        assert!(manager.get::<Counter>().is_some());
        assert!(manager.get::<Idle>().is_none());
    }

    #[test]
    #[should_panic(expected = "registered more than once")]
    fn test_duplicate_register_panics() {
        let mut manager = SystemManager::new();
        manager.register(Signature::EMPTY, Idle);
        manager.register(Signature::EMPTY, Idle);
    }

    #[test]
    fn test_unknown_system() {
        let mut manager = SystemManager::new();
        assert!(matches!(
            manager.try_set_signature::<Idle>(Signature::EMPTY),
            Err(EcsError::UnknownSystem(_))
        ));
        assert!(manager.entities_of::<Idle>().is_err());
    }

    #[test]
    fn test_signature_gating() {
        let mut manager = SystemManager::new();
        manager.register(sig(&[0, 1]), Counter::default());

        manager.on_entity_signature_changed(7, sig(&[0]));
        assert!(manager.entities_of::<Counter>().unwrap().is_empty());

        manager.on_entity_signature_changed(7, sig(&[0, 1, 5]));
        manager.on_entity_signature_changed(7, sig(&[0, 1]));
        assert!(manager.entities_of::<Counter>().unwrap().contains(&7));

        manager.on_entity_signature_changed(7, sig(&[1]));
        manager.on_entity_signature_changed(7, sig(&[1]));
        assert!(manager.entities_of::<Counter>().unwrap().is_empty());

        let counter = manager.get::<Counter>().unwrap();
        assert_eq!(counter.added, vec![7]);
        assert_eq!(counter.removed, vec![7]);
    }

    #[test]
    fn test_empty_signature_matches_everything() {
        let mut manager = SystemManager::new();
        manager.register(Signature::EMPTY, Counter::default());
        manager.on_entity_signature_changed(3, Signature::EMPTY);
        assert!(manager.entities_of::<Counter>().unwrap().contains(&3));
    }

    #[test]
    fn test_destroyed_leaves_every_set() {
        let mut manager = SystemManager::new();
        manager.register(sig(&[0]), Counter::default());
        manager.register(Signature::EMPTY, Idle);

        manager.on_entity_signature_changed(2, sig(&[0]));
        manager.on_entity_destroyed(2);

        assert!(manager.entities_of::<Counter>().unwrap().is_empty());
        assert!(manager.entities_of::<Idle>().unwrap().is_empty());
        assert_eq!(manager.get::<Counter>().unwrap().removed, vec![2]);
    }

    #[test]
    fn test_set_signature_does_not_rescan() {
        let mut manager = SystemManager::new();
        manager.register(sig(&[0]), Counter::default());
        manager.on_entity_signature_changed(1, sig(&[0]));
        manager.on_entity_signature_changed(2, sig(&[1]));

        manager.set_signature::<Counter>(sig(&[1]));
        let set = manager.entities_of::<Counter>().unwrap();
        assert!(set.contains(&1));
        assert!(!set.contains(&2));

        manager.on_entity_signature_changed(2, sig(&[1]));
        assert!(manager.entities_of::<Counter>().unwrap().contains(&2));
    }

    #[test]
    fn test_update_sees_working_set() {
        let mut manager = SystemManager::new();
        let registry = EntityManager::new();
        let mut components = ComponentManager::new();
        manager.register(Signature::EMPTY, Counter::default());

        manager.on_entity_signature_changed(0, Signature::EMPTY);
        manager.on_entity_signature_changed(1, Signature::EMPTY);
        manager.update_all(&registry, &mut components, &FrameData::new(0.016));

        assert_eq!(manager.get::<Counter>().unwrap().updates, 2);
    }

    #[test]
    fn test_frame_data_next() {
        let frame = FrameData::new(0.5).next(0.25);
        assert_eq!(frame.frame_index, 1);
        assert!((frame.dt - 0.25).abs() < f32::EPSILON);
    }
}
