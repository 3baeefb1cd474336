//! # ECS Configuration
//!
//! Capacity limits, loaded once at startup.
//!
//! ```toml
//! max_entities = 2048
//! max_component_types = 32
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::MAX_ENTITIES;
use crate::error::{ConfigError, ConfigResult};
use crate::signature::MAX_COMPONENTS;

/// Capacity limits for a [`World`](crate::World).
///
/// Both limits are hard: exceeding them is a contract violation, never a
/// silent truncation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EcsConfig {
    /// Maximum number of simultaneously allocated entity handles.
    pub max_entities: usize,
    /// Maximum number of distinct component types.
    pub max_component_types: usize,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            max_entities: MAX_ENTITIES,
            max_component_types: MAX_COMPONENTS,
        }
    }
}

impl EcsConfig {
    /// Parses and validates a config from TOML text.
    ///
    /// Missing keys fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys,
    /// and [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), ?config, "loaded ECS config");
        Ok(config)
    }

    /// Checks the limits against what the handle and signature types can
    /// represent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_entities == 0 || self.max_entities > MAX_ENTITIES {
            return Err(ConfigError::Invalid(format!(
                "max_entities must be in 1..={MAX_ENTITIES}, got {}",
                self.max_entities
            )));
        }
        if self.max_component_types == 0 || self.max_component_types > MAX_COMPONENTS {
            return Err(ConfigError::Invalid(format!(
                "max_component_types must be in 1..={MAX_COMPONENTS}, got {}",
                self.max_component_types
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_constants() {
        let config = EcsConfig::default();
        assert_eq!(config.max_entities, 5000);
        assert_eq!(config.max_component_types, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial() {
        let config = EcsConfig::from_toml_str("max_entities = 128").unwrap();
        assert_eq!(config.max_entities, 128);
        assert_eq!(config.max_component_types, MAX_COMPONENTS);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let err = EcsConfig::from_toml_str("max_entities = 6000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EcsConfig::from_toml_str("max_component_types = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EcsConfig::from_toml_str("max_component_types = 65").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = EcsConfig::from_toml_str("max_systems = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EcsConfig::from_file("/nonexistent/ember/ecs.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_from_file_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "ember_ecs_config_{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "max_entities = 10\nmax_component_types = 4\n").unwrap();

        let config = EcsConfig::from_file(&path).unwrap();
        assert_eq!(
            config,
            EcsConfig {
                max_entities: 10,
                max_component_types: 4
            }
        );

        std::fs::remove_file(&path).ok();
    }
}
