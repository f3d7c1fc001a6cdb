//! Creature and effect entities for Perchling
//!
//! This crate implements:
//! - The FlyingIn/Perched/FlyingAway creature lifecycle engine
//! - Species profiles with spawn-time validation
//! - Capacity- and rate-limited population control
//! - Ephemeral anchor-attached effects with independent lifecycles
//!
//! Anchor state and media assets are owned elsewhere and reached through the
//! `AnchorLookup` / `AssetRegistry` traits.

use glam::Vec2;

pub mod config;
pub mod creature;
pub mod effects;
pub mod spawning;
pub mod species;
pub mod traits;
pub mod types;

// Re-export main types for convenience
pub use config::{EffectConfig, MotionConfig, SpawnConfig};
pub use creature::Creature;
pub use effects::{BurstParticle, EffectKind, EffectPhase, EffectPipeline, EphemeralEffect, Interactor};
pub use spawning::{CreatureManager, DropRequest, SpawnError, SpawnThrottle};
pub use species::{SpeciesCatalog, SpeciesError, SpeciesProfile};
pub use traits::{AlwaysReady, AnchorLookup, AssetRef, AssetRegistry};
pub use types::{CreatureKind, EntityId, IdleAction, Lifecycle};

/// Public per-creature state consumed by the external renderer
#[derive(Debug, Clone)]
pub struct CreatureView {
    pub id: EntityId,
    pub species: String,
    pub kind: CreatureKind,
    pub position: Vec2,
    pub size: f32,
    pub facing: f32,
    pub flap_phase: f32,
    pub lifecycle: Lifecycle,
    pub idle: IdleAction,
    pub asset: Option<AssetRef>,
}

impl From<&Creature> for CreatureView {
    fn from(c: &Creature) -> Self {
        Self {
            id: c.id,
            species: c.species.name.clone(),
            kind: c.kind(),
            position: c.position,
            size: c.size,
            facing: c.facing,
            flap_phase: c.flap_phase,
            lifecycle: c.lifecycle,
            idle: c.idle,
            asset: c.species.asset.clone(),
        }
    }
}

/// Public per-effect state consumed by the external renderer
#[derive(Debug, Clone)]
pub struct EffectView {
    pub id: EntityId,
    pub kind: EffectKind,
    pub position: Vec2,
    pub scale: f32,
    pub opacity: f32,
}

impl From<&EphemeralEffect> for EffectView {
    fn from(e: &EphemeralEffect) -> Self {
        Self {
            id: e.id,
            kind: e.kind,
            position: e.position,
            scale: e.scale,
            opacity: e.opacity,
        }
    }
}

/// Public burst-particle state consumed by the external renderer
#[derive(Debug, Clone)]
pub struct ParticleView {
    pub position: Vec2,
    pub size: f32,
}

impl From<&BurstParticle> for ParticleView {
    fn from(p: &BurstParticle) -> Self {
        Self {
            position: p.position,
            size: p.size,
        }
    }
}
