//! # Component Storage
//!
//! One dense [`ComponentArray`] per component type, owned by the
//! [`ComponentManager`] behind a type-erased boundary.
//!
//! ```text
//! entity_to_index   components      index_to_entity
//!   7 → 0          [ Transform ]      0 → 7
//!   2 → 1          [ Transform ]      1 → 2
//!   9 → 2          [ Transform ]      2 → 9
//! ```
//!
//! Removal swaps the last element into the hole so the array never has gaps.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use crate::entity::EntityHandle;
use crate::error::{EcsError, EcsResult};
use crate::signature::{ComponentType, Signature, MAX_COMPONENTS};

/// Marker trait for ECS components.
///
/// Implemented for every `Send + Sync + 'static` type; components may own
/// heap data and shared handles.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Dense storage for a single component type.
#[derive(Debug)]
pub struct ComponentArray<T: Component> {
    /// Packed component values.
    components: Vec<T>,
    /// Entity to position in `components`.
    entity_to_index: HashMap<EntityHandle, usize>,
    /// Position in `components` to entity.
    index_to_entity: Vec<EntityHandle>,
}

impl<T: Component> ComponentArray<T> {
    /// Creates an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
            entity_to_index: HashMap::new(),
            index_to_entity: Vec::new(),
        }
    }

    /// Returns the number of stored components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Checks if the array is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Appends a component for `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateComponent`] if the entity already has one.
    pub fn try_insert(&mut self, entity: EntityHandle, component: T) -> EcsResult<()> {
        if self.entity_to_index.contains_key(&entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: type_name::<T>(),
            });
        }

        let index = self.components.len();
        self.components.push(component);
        self.entity_to_index.insert(entity, index);
        self.index_to_entity.push(entity);

        debug_assert_eq!(self.entity_to_index.len(), self.index_to_entity.len());
        Ok(())
    }

    /// Appends a component for `entity`.
    ///
    /// # Panics
    ///
    /// Panics if the entity already has one.
    pub fn insert(&mut self, entity: EntityHandle, component: T) {
        if let Err(err) = self.try_insert(entity, component) {
            panic!("{err}");
        }
    }

    /// Removes and returns the component of `entity`, moving the last
    /// component into its place.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingComponent`] if the entity has none.
    pub fn try_erase(&mut self, entity: EntityHandle) -> EcsResult<T> {
        let index = self
            .entity_to_index
            .remove(&entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: type_name::<T>(),
            })?;

        let removed = self.components.swap_remove(index);
        self.index_to_entity.swap_remove(index);

        // Fix up the entity that moved into the hole
        if let Some(&moved) = self.index_to_entity.get(index) {
            self.entity_to_index.insert(moved, index);
        }

        debug_assert_eq!(self.entity_to_index.len(), self.index_to_entity.len());
        debug_assert_eq!(self.entity_to_index.len(), self.components.len());
        Ok(removed)
    }

    /// Removes and returns the component of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if the entity has none.
    pub fn erase(&mut self, entity: EntityHandle) -> T {
        match self.try_erase(entity) {
            Ok(component) => component,
            Err(err) => panic!("{err}"),
        }
    }

    /// Checks if `entity` has a component here.
    #[inline]
    #[must_use]
    pub fn has(&self, entity: EntityHandle) -> bool {
        self.entity_to_index.contains_key(&entity)
    }

    /// Gets the component of `entity`.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: EntityHandle) -> Option<&T> {
        let index = *self.entity_to_index.get(&entity)?;
        self.components.get(index)
    }

    /// Gets the component of `entity` mutably.
    #[inline]
    pub fn get_mut(&mut self, entity: EntityHandle) -> Option<&mut T> {
        let index = *self.entity_to_index.get(&entity)?;
        self.components.get_mut(index)
    }

    /// Gets the component of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if the entity has none.
    #[must_use]
    pub fn at(&self, entity: EntityHandle) -> &T {
        match self.get(entity) {
            Some(component) => component,
            None => panic!(
                "{}",
                EcsError::MissingComponent {
                    entity,
                    component: type_name::<T>(),
                }
            ),
        }
    }

    /// Returns the packed components.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.components
    }

    /// Iterates over `(entity, component)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &T)> {
        self.index_to_entity.iter().copied().zip(self.components.iter())
    }

    /// Iterates over the entities that have a component here.
    pub fn entities(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.index_to_entity.iter().copied()
    }
}

impl<T: Component> Default for ComponentArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The type-erased face of a [`ComponentArray`].
trait ErasedArray: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Drops the entity's component, if it has one.
    fn on_entity_destroyed(&mut self, entity: EntityHandle) -> bool;
}

impl<T: Component> ErasedArray for ComponentArray<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_entity_destroyed(&mut self, entity: EntityHandle) -> bool {
        self.try_erase(entity).is_ok()
    }
}

/// Owner of every component array.
///
/// Component types get a sequential [`ComponentType`] id the first time they
/// are used, keyed by their compile-time [`TypeId`].
pub struct ComponentManager {
    /// Type to sequential id.
    types: HashMap<TypeId, ComponentType>,
    /// Arrays indexed by component type id.
    arrays: Vec<Box<dyn ErasedArray>>,
    /// Type names indexed by component type id.
    names: Vec<&'static str>,
    /// Maximum number of component types.
    limit: usize,
}

impl ComponentManager {
    /// Creates a manager accepting up to [`MAX_COMPONENTS`] types.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(MAX_COMPONENTS)
    }

    /// Creates a manager accepting up to `limit` component types.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero or exceeds [`MAX_COMPONENTS`].
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        assert!(limit > 0, "Component type limit must be greater than zero");
        assert!(
            limit <= MAX_COMPONENTS,
            "Component type limit cannot exceed MAX_COMPONENTS"
        );

        Self {
            types: HashMap::new(),
            arrays: Vec::new(),
            names: Vec::new(),
            limit,
        }
    }

    /// Returns the number of registered component types.
    #[inline]
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.arrays.len()
    }

    /// Returns the id of `T`, if it has been registered.
    #[inline]
    #[must_use]
    pub fn registered_type<T: Component>(&self) -> Option<ComponentType> {
        self.types.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the type name registered under `component`.
    #[must_use]
    pub fn type_name(&self, component: ComponentType) -> Option<&'static str> {
        self.names.get(usize::from(component)).copied()
    }

    /// Returns the id of `T`, registering it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TooManyComponentTypes`] if `T` is new and the
    /// limit is reached.
    pub fn try_component_type<T: Component>(&mut self) -> EcsResult<ComponentType> {
        if let Some(id) = self.registered_type::<T>() {
            return Ok(id);
        }
        self.register::<T>()
    }

    /// Returns the id of `T`, registering it on first use.
    ///
    /// # Panics
    ///
    /// Panics if the component type limit is reached.
    pub fn component_type<T: Component>(&mut self) -> ComponentType {
        match self.try_component_type::<T>() {
            Ok(id) => id,
            Err(err) => panic!("{err}"),
        }
    }

    /// Checks that registering every type in `types` stays within the limit.
    ///
    /// Types already registered and repeats are not counted.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TooManyComponentTypes`] if they would not fit.
    pub fn check_room(&self, types: &[TypeId]) -> EcsResult<()> {
        let mut new: Vec<TypeId> = types
            .iter()
            .copied()
            .filter(|ty| !self.types.contains_key(ty))
            .collect();
        new.sort_unstable();
        new.dedup();

        if self.arrays.len() + new.len() > self.limit {
            return Err(EcsError::TooManyComponentTypes { limit: self.limit });
        }
        Ok(())
    }

    fn register<T: Component>(&mut self) -> EcsResult<ComponentType> {
        let next = self.arrays.len();
        if next >= self.limit {
            return Err(EcsError::TooManyComponentTypes { limit: self.limit });
        }
        let id = ComponentType::try_from(next)
            .map_err(|_| EcsError::TooManyComponentTypes { limit: self.limit })?;

        self.types.insert(TypeId::of::<T>(), id);
        self.arrays.push(Box::new(ComponentArray::<T>::new()));
        self.names.push(type_name::<T>());

        tracing::debug!(component = type_name::<T>(), id, "registered component type");
        Ok(id)
    }

    /// Returns the array for `T`, if registered.
    #[must_use]
    pub fn array<T: Component>(&self) -> Option<&ComponentArray<T>> {
        let id = self.registered_type::<T>()?;
        self.arrays[usize::from(id)].as_any().downcast_ref()
    }

    /// Returns the array for `T` mutably, if registered.
    pub fn array_mut<T: Component>(&mut self) -> Option<&mut ComponentArray<T>> {
        let id = self.registered_type::<T>()?;
        self.arrays[usize::from(id)].as_any_mut().downcast_mut()
    }

    /// Adds a component to `entity`, registering `T` on first use.
    ///
    /// # Returns
    ///
    /// The component type id, for updating the entity's signature.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TooManyComponentTypes`] or
    /// [`EcsError::DuplicateComponent`]; nothing is stored in either case.
    pub fn try_add<T: Component>(
        &mut self,
        entity: EntityHandle,
        component: T,
    ) -> EcsResult<ComponentType> {
        let id = self.try_component_type::<T>()?;
        self.array_mut::<T>()
            .ok_or(EcsError::UnregisteredComponent(type_name::<T>()))?
            .try_insert(entity, component)?;
        Ok(id)
    }

    /// Adds a component to `entity`.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate component or when the type limit is reached.
    pub fn add<T: Component>(&mut self, entity: EntityHandle, component: T) -> ComponentType {
        match self.try_add(entity, component) {
            Ok(id) => id,
            Err(err) => panic!("{err}"),
        }
    }

    /// Removes and returns the `T` of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingComponent`] if the entity has none.
    pub fn try_remove<T: Component>(
        &mut self,
        entity: EntityHandle,
    ) -> EcsResult<(ComponentType, T)> {
        let missing = EcsError::MissingComponent {
            entity,
            component: type_name::<T>(),
        };
        let id = self.registered_type::<T>().ok_or_else(|| missing.clone())?;
        let array = self.array_mut::<T>().ok_or(missing)?;
        let component = array.try_erase(entity)?;
        Ok((id, component))
    }

    /// Removes and returns the `T` of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if the entity has none.
    pub fn remove<T: Component>(&mut self, entity: EntityHandle) -> T {
        match self.try_remove::<T>(entity) {
            Ok((_, component)) => component,
            Err(err) => panic!("{err}"),
        }
    }

    /// Checks if `entity` has a `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: EntityHandle) -> bool {
        self.array::<T>().is_some_and(|array| array.has(entity))
    }

    /// Gets the `T` of `entity`.
    #[must_use]
    pub fn get<T: Component>(&self, entity: EntityHandle) -> Option<&T> {
        self.array::<T>()?.get(entity)
    }

    /// Gets the `T` of `entity` mutably.
    pub fn get_mut<T: Component>(&mut self, entity: EntityHandle) -> Option<&mut T> {
        self.array_mut::<T>()?.get_mut(entity)
    }

    /// Purges every component of a destroyed entity, whatever its type.
    ///
    /// # Returns
    ///
    /// The signature of the components that were removed.
    pub fn on_entity_destroyed(&mut self, entity: EntityHandle) -> Signature {
        let mut removed = Signature::EMPTY;
        for (id, array) in self.arrays.iter_mut().enumerate() {
            if array.on_entity_destroyed(entity) {
                // `id` is bounded by `limit`, itself at most MAX_COMPONENTS.
                removed.set(id as ComponentType, true);
            }
        }
        removed
    }
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentManager")
            .field("types", &self.names)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

/// A set of component types, used to build signatures from tuples.
///
/// Implemented for tuples of one to eight components; a single component
/// is written `(T,)`.
pub trait ComponentSet {
    /// Builds the signature of the set, registering types on first use.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TooManyComponentTypes`] if the new types do not
    /// all fit. Nothing is registered in that case.
    fn signature(components: &mut ComponentManager) -> EcsResult<Signature>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn signature(components: &mut ComponentManager) -> EcsResult<Signature> {
                components.check_room(&[$(TypeId::of::<$name>()),+])?;
                let mut signature = Signature::EMPTY;
                $(signature.set(components.try_component_type::<$name>()?, true);)+
                Ok(signature)
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);
