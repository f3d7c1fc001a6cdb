//! Tunable motion, spawning and effect parameters
//!
//! Every rate here is per second and multiplied by delta-time during
//! integration. Defaults are feel-tuning for a 60fps frame loop, not
//! behavioral contracts.

use serde::{Deserialize, Serialize};

/// Steering and animation rates for creature updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Fly-in speed per pixel of remaining distance (1/s)
    pub approach_rate: f32,
    /// Fly-in speed cap (px/s)
    pub max_speed: f32,
    /// Arrival radius as a multiple of creature size
    pub arrive_factor: f32,
    /// Vertical wing-bob speed contribution while flying in (px/s)
    pub flap_bob: f32,
    /// Exponential re-anchoring rate while perched (1/s)
    pub perch_rate: f32,
    /// Escape acceleration while flying away (px/s^2)
    pub escape_accel: f32,
    /// Escape speed cap (px/s)
    pub escape_speed: f32,
    /// Perpendicular wobble speed while flying away (px/s)
    pub escape_wobble: f32,
    /// Wobble oscillation rate (rad/s)
    pub wobble_rate: f32,
    /// Perch-parameter repulsion rate between perched siblings (1/s)
    pub repulse_rate: f32,
    /// Divisor turning combined sibling size into required `t` separation
    pub repulse_sep_scale: f32,
    /// Upward hop impulse (px/s)
    pub hop_impulse: f32,
    /// Gravity pulling a hopping creature back to the perch (px/s^2)
    pub hop_gravity: f32,
    /// Drift speed toward the wandering fallback point (px/s)
    pub wander_speed: f32,
    /// Seconds between dropped items while perched (min, max)
    pub drop_interval: (f32, f32),
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            approach_rate: 1.2,
            max_speed: 480.0,
            arrive_factor: 0.9,
            flap_bob: 120.0,
            perch_rate: 6.0,
            escape_accel: 1800.0,
            escape_speed: 600.0,
            escape_wobble: 90.0,
            wobble_rate: 5.0,
            repulse_rate: 4.8,
            repulse_sep_scale: 250.0,
            hop_impulse: 180.0,
            hop_gravity: 1800.0,
            wander_speed: 40.0,
            drop_interval: (5.0, 10.0),
        }
    }
}

/// Population and throttling limits for the spawn controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Live-creature cap per (anchor id, creature kind) pair
    pub per_anchor_capacity: usize,
    /// Live-creature cap across the whole stage
    pub max_population: usize,
    /// Minimum seconds between any two throttled spawns
    pub min_interval: f32,
    /// Extra random delay added on top of the minimum interval (seconds)
    pub interval_jitter: f32,
    /// Fixed perch parameters used by the initial burst
    pub burst_offsets: Vec<f32>,
    /// Off-screen margin for spawn origins and removal (px)
    pub edge_margin: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            per_anchor_capacity: 6,
            max_population: 60,
            min_interval: 2.0,
            interval_jitter: 1.0,
            burst_offsets: vec![0.1, 0.3, 0.5, 0.7, 0.9],
            edge_margin: 200.0,
        }
    }
}

/// Lifecycle rates for ephemeral effects and their particles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectConfig {
    /// Scale shrink rate while transforming (1/s)
    pub transform_shrink: f32,
    /// Opacity fade rate for released effects (1/s)
    pub release_fade: f32,
    /// Interaction radius as a multiple of the interactor anchor span
    pub interact_factor: f32,
    /// Particles emitted when a transformation completes
    pub burst_count: usize,
    /// Initial radial distance of burst particles from the burst point (px)
    pub burst_radius: f32,
    /// Convergence acceleration of burst particles (1/s)
    pub converge_rate: f32,
    /// Particle shrink rate as it converges (1/s)
    pub particle_shrink: f32,
    /// Growth rate of a held effect while the gesture persists (1/s)
    pub held_grow: f32,
    /// Scale cap for held effects
    pub held_max_scale: f32,
    /// Seconds a secondary sparkle stays attached before fading
    pub sparkle_life: f32,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            transform_shrink: 1.5,
            release_fade: 1.2,
            interact_factor: 0.8,
            burst_count: 12,
            burst_radius: 40.0,
            converge_rate: 6.0,
            particle_shrink: 1.8,
            held_grow: 0.6,
            held_max_scale: 3.0,
            sparkle_life: 8.0,
        }
    }
}
