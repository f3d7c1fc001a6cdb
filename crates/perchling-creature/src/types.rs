//! Common entity types for creatures and effects

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for creatures, effects and particles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

impl EntityId {
    /// Generate a new unique entity ID
    pub fn new() -> Self {
        EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value (useful for debugging/serialization)
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Create an EntityId from a raw u64 (for deserialization)
    pub fn from_raw(id: u64) -> Self {
        // Update the counter if this ID is higher than current
        NEXT_ENTITY_ID.fetch_max(id + 1, Ordering::Relaxed);
        EntityId(id)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Visual/behavioral family of a creature
///
/// One creature type with a kind discriminant rather than separate bird and
/// butterfly types; kind-specific animation parameters live on the species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatureKind {
    Bird,
    Butterfly,
}

/// Creature lifecycle state
///
/// `FlyingAway` is absorbing: a creature never re-enters `FlyingIn` or
/// `Perched` once it has been scared off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Steering toward the resolved perch point
    FlyingIn,
    /// Attached to the perch curve, running idle actions
    Perched,
    /// Escaping toward the off-screen origin (terminal)
    FlyingAway,
}

/// Idle action a perched creature can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdleAction {
    Idle,
    Peck,
    Hop,
    LookBack,
    Fluff,
    /// Butterfly wing-flex while hovering at the perch
    Flutter,
}
