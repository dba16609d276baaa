//! Unique identifiers for entities and registered types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a persisted entity.
///
/// Entity identifiers are allocated by the store when an entity is first
/// saved; an entity constructed in memory has no `EntityId` yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Create a new `EntityId` from a raw u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a registered entity type.
///
/// Unlike [`EntityId`], a `TypeId` is not a counter: it is derived
/// deterministically from the type's declared name and attribute schema,
/// so re-registering an identical schema always yields the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(u64);

impl TypeId {
    /// Create a new `TypeId` from a raw u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for TypeId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hex, to match the identity-name suffix of registered types.
        write!(f, "{:016x}", self.0)
    }
}
