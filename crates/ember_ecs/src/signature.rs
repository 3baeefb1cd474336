//! # Component Signatures
//!
//! A fixed-width bitset with one bit per registered component type. Entities
//! carry the signature of the components they have; systems carry the
//! signature of the components they require.

use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Sequential id of a registered component type (0-63).
pub type ComponentType = u8;

/// Width of a [`Signature`], and so the maximum number of component types.
pub const MAX_COMPONENTS: usize = 64;

/// Bitset over component types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Signature(u64);

impl Signature {
    /// The signature with no bits set.
    pub const EMPTY: Self = Self(0);

    /// Creates a signature from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns a copy with `component` set.
    #[inline]
    #[must_use]
    pub const fn with(self, component: ComponentType) -> Self {
        Self(self.0 | Self::bit(component))
    }

    /// Sets or clears the bit for `component`.
    #[inline]
    pub fn set(&mut self, component: ComponentType, present: bool) {
        if present {
            self.0 |= Self::bit(component);
        } else {
            self.0 &= !Self::bit(component);
        }
    }

    /// Checks whether the bit for `component` is set.
    #[inline]
    #[must_use]
    pub const fn has(self, component: ComponentType) -> bool {
        self.0 & Self::bit(component) != 0
    }

    /// Checks whether every bit of `required` is also set here.
    ///
    /// This is the system subscription rule:
    /// `(entity & required) == required`.
    #[inline]
    #[must_use]
    pub const fn contains_all(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// Clears every bit.
    #[inline]
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Checks whether no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the number of set bits.
    #[inline]
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    const fn bit(component: ComponentType) -> u64 {
        assert!((component as usize) < MAX_COMPONENTS, "component type out of range");
        1 << component
    }
}

impl BitAnd for Signature {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for Signature {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl FromIterator<ComponentType> for Signature {
    fn from_iter<I: IntoIterator<Item = ComponentType>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#b}", self.0)
    }
}
