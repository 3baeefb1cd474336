//! # ECS Error Types
//!
//! Contract violations reported by the `try_` family of operations. The
//! plain operations panic with the same messages.

use thiserror::Error;

use crate::entity::EntityHandle;

/// Errors that can occur in the ECS.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Every entity slot up to the configured capacity is in use.
    #[error("too many entities in existence: capacity {capacity}")]
    TooManyEntities {
        /// The configured entity capacity.
        capacity: usize,
    },

    /// A new component type would exceed the signature width.
    #[error("too many component types registered: limit {limit}")]
    TooManyComponentTypes {
        /// The configured component type limit.
        limit: usize,
    },

    /// The entity already has a component of this type.
    #[error("component {component} added to entity {entity} more than once")]
    DuplicateComponent {
        /// The entity.
        entity: EntityHandle,
        /// The component type name.
        component: &'static str,
    },

    /// The entity has no component of this type.
    #[error("entity {entity} has no component {component}")]
    MissingComponent {
        /// The entity.
        entity: EntityHandle,
        /// The component type name.
        component: &'static str,
    },

    /// No storage exists for this component type.
    #[error("component type {0} is not registered")]
    UnregisteredComponent(&'static str),

    /// The handle was never issued by this entity manager.
    #[error("entity {0} out of range")]
    EntityOutOfRange(EntityHandle),

    /// The handle was issued but the entity has been destroyed.
    #[error("entity {0} is not alive")]
    EntityNotAlive(EntityHandle),

    /// A system of this type is already registered.
    #[error("system {0} registered more than once")]
    DuplicateSystem(&'static str),

    /// No system of this type is registered.
    #[error("system {0} used before being registered")]
    UnknownSystem(&'static str),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// Errors that can occur while loading an [`EcsConfig`](crate::EcsConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values are out of the supported range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for config loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
