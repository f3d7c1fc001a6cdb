//! Perchling core: anchor tracking, perch geometry and the stage loop
//!
//! This crate owns the perception-facing half of the pipeline:
//! - Smoothed anchor tracking with disturbance detection and grace-window
//!   eviction
//! - Category-specific perch curve construction and sampling
//! - The `Stage` orchestrator that runs one cooperative tick over anchors,
//!   creatures and effects
//!
//! Creature behavior itself lives in the `perchling-creature` crate and
//! reads anchor state through its `AnchorLookup` trait, which
//! [`tracker::AnchorTracker`] implements.

pub mod config;
pub mod curve;
pub mod events;
pub mod geometry;
pub mod stage;
pub mod tracker;

// Re-export main types for convenience
pub use config::{ConfigError, StageConfig};
pub use curve::{AnchorCategory, CurveConfig, PerchCurve};
pub use events::AnchorEvent;
pub use stage::{FrameInput, SemanticSignal, Stage};
pub use tracker::{AnchorObservation, AnchorRegion, AnchorTracker, TrackerConfig};

pub use perchling_creature;
