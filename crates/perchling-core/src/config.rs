//! Aggregate stage configuration, loadable from RON presets
//!
//! The RNG is not part of the configuration: callers inject a random source
//! per call so deterministic tests stay possible.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use perchling_creature::{EffectConfig, MotionConfig, SpawnConfig};

use crate::curve::CurveConfig;
use crate::tracker::TrackerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse RON preset: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Everything tunable about a running stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub tracker: TrackerConfig,
    pub curve: CurveConfig,
    pub motion: MotionConfig,
    pub spawn: SpawnConfig,
    pub effects: EffectConfig,
    /// Delta-time cap per tick, seconds; large stalls integrate as this
    pub max_delta_time: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            curve: CurveConfig::default(),
            motion: MotionConfig::default(),
            spawn: SpawnConfig::default(),
            effects: EffectConfig::default(),
            max_delta_time: 0.1,
        }
    }
}

impl StageConfig {
    /// Parse a configuration preset from RON text
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }
}
