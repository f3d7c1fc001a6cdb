//! Species profiles - immutable, externally authored visual/behavioral parameters
//!
//! A profile is authored outside the core (editor UI, presets) and shared
//! read-only by many creatures. The core validates a profile once at spawn
//! time; an invalid profile never reaches per-tick update code.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::traits::AssetRef;
use crate::types::CreatureKind;

/// Validation failure for an authored species profile
#[derive(Debug, Error, PartialEq)]
pub enum SpeciesError {
    #[error("species name is empty")]
    EmptyName,
    #[error("base size {0} is not a positive finite number")]
    InvalidBaseSize(f32),
    #[error("size variance {0} must be within 0.0..=1.0")]
    InvalidSizeVariance(f32),
    #[error("flap speed {0} is not a positive finite number")]
    InvalidFlapSpeed(f32),
}

/// Immutable visual/behavioral parameter set shared by many creatures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesProfile {
    pub name: String,
    pub kind: CreatureKind,
    /// Nominal body size in pixels before anchor scaling
    pub base_size: f32,
    /// Random size spread as a fraction of base size (0.0..=1.0)
    pub size_variance: f32,
    /// Wing-flap rate in radians per second for a nominal-size creature
    pub flap_speed: f32,
    /// Relative weight this species receives during random selection
    pub weight: f32,
    /// Sprite asset, `None` for procedurally drawn species
    pub asset: Option<AssetRef>,
}

impl SpeciesProfile {
    /// Procedural sparrow-sized bird
    pub fn bird(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CreatureKind::Bird,
            base_size: 16.0,
            size_variance: 0.3,
            flap_speed: 10.0,
            weight: 1.0,
            asset: None,
        }
    }

    /// Procedural butterfly
    pub fn butterfly(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CreatureKind::Butterfly,
            base_size: 10.0,
            size_variance: 0.4,
            flap_speed: 15.0,
            weight: 1.0,
            asset: None,
        }
    }

    /// Check the profile for values that would corrupt per-tick math
    pub fn validate(&self) -> Result<(), SpeciesError> {
        if self.name.is_empty() {
            return Err(SpeciesError::EmptyName);
        }
        if !self.base_size.is_finite() || self.base_size <= 0.0 {
            return Err(SpeciesError::InvalidBaseSize(self.base_size));
        }
        if !self.size_variance.is_finite() || !(0.0..=1.0).contains(&self.size_variance) {
            return Err(SpeciesError::InvalidSizeVariance(self.size_variance));
        }
        if !self.flap_speed.is_finite() || self.flap_speed <= 0.0 {
            return Err(SpeciesError::InvalidFlapSpeed(self.flap_speed));
        }
        Ok(())
    }

    /// Sample a concrete creature size for this species
    pub fn sample_size(&self, anchor_scale: f32, rng: &mut impl Rng) -> f32 {
        let spread = 1.0 - self.size_variance * 0.5 + rng.random::<f32>() * self.size_variance;
        (self.base_size * anchor_scale * spread).clamp(6.0, 100.0)
    }
}

/// Externally owned, read-only list of species available for spawning
#[derive(Debug, Clone, Default)]
pub struct SpeciesCatalog {
    profiles: Vec<Arc<SpeciesProfile>>,
}

impl SpeciesCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, profile: SpeciesProfile) {
        self.profiles.push(Arc::new(profile));
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SpeciesProfile>> {
        self.profiles.iter()
    }

    /// Pick a profile by selection weight
    pub fn choose(&self, rng: &mut impl Rng) -> Option<Arc<SpeciesProfile>> {
        Self::weighted_pick(&self.profiles, rng)
    }

    /// Pick a profile of the given kind by selection weight
    pub fn choose_of_kind(
        &self,
        kind: CreatureKind,
        rng: &mut impl Rng,
    ) -> Option<Arc<SpeciesProfile>> {
        let matching: Vec<Arc<SpeciesProfile>> = self
            .profiles
            .iter()
            .filter(|p| p.kind == kind)
            .cloned()
            .collect();
        Self::weighted_pick(&matching, rng)
    }

    fn weighted_pick(
        profiles: &[Arc<SpeciesProfile>],
        rng: &mut impl Rng,
    ) -> Option<Arc<SpeciesProfile>> {
        if profiles.is_empty() {
            return None;
        }
        let total: f32 = profiles.iter().map(|p| p.weight.max(0.0)).sum();
        if total <= 0.0 {
            let idx = rng.random_range(0..profiles.len());
            return Some(Arc::clone(&profiles[idx]));
        }
        let mut roll = rng.random::<f32>() * total;
        for profile in profiles {
            roll -= profile.weight.max(0.0);
            if roll <= 0.0 {
                return Some(Arc::clone(profile));
            }
        }
        profiles.last().map(Arc::clone)
    }
}
