//! # Materials

/// The pass a material is drawn in.
///
/// Declaration order is draw order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Opaque geometry written to the G-buffer.
    #[default]
    Deferred,
    /// Opaque geometry shaded directly.
    Forward,
    /// Blended geometry, drawn last.
    Transparent,
}

impl Stage {
    /// All stages, in draw order.
    pub const ALL: [Self; 3] = [Self::Deferred, Self::Forward, Self::Transparent];
}

/// A named material bound to a render stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    /// Asset name, used as the cache key.
    pub name: String,
    /// The pass this material is drawn in.
    pub stage: Stage,
}

impl Material {
    /// Creates a material.
    #[must_use]
    pub fn new(name: impl Into<String>, stage: Stage) -> Self {
        Self {
            name: name.into(),
            stage,
        }
    }
}
