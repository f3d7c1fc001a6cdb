//! Anchor tracking: smoothing, disturbance detection, aging and eviction
//!
//! Ingests the per-frame observation stream from the external landmark
//! detector and maintains one `AnchorRegion` per id. Jitter is absorbed by a
//! per-category deadzone plus exponential smoothing, never by exception
//! handling; the tracker is built to run indefinitely under anchors
//! appearing and disappearing arbitrarily.

use ahash::AHashMap;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::curve::{AnchorCategory, CurveConfig, PerchCurve};
use crate::events::AnchorEvent;

/// One frame's observation of a named anchor
#[derive(Debug, Clone)]
pub struct AnchorObservation {
    pub id: String,
    pub category: AnchorCategory,
    pub centroid: Vec2,
    /// Category-specific reference points the perch curve is built from
    pub raw_points: Vec<Vec2>,
}

/// Per-category smoothing and threshold tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// EMA retention factor; reference range 0.7..=0.92
    pub alpha: f32,
    /// Per-frame displacement ignored as jitter, px (head, shoulders, hand)
    pub deadzone: [f32; 3],
    /// Smoothed velocity above which a disturbance fires (head, shoulders,
    /// hand)
    pub threshold: [f32; 3],
    /// Consecutive unobserved frames tolerated before eviction
    pub grace_frames: u32,
    /// Absences longer than this reset velocity state on reappearance
    pub reset_after_frames: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            deadzone: [4.0, 6.0, 8.0],
            threshold: [30.0, 35.0, 25.0],
            grace_frames: 30,
            reset_after_frames: 5,
        }
    }
}

impl TrackerConfig {
    fn deadzone_for(&self, category: AnchorCategory) -> f32 {
        self.deadzone[category_index(category)]
    }

    fn threshold_for(&self, category: AnchorCategory) -> f32 {
        self.threshold[category_index(category)]
    }
}

fn category_index(category: AnchorCategory) -> usize {
    match category {
        AnchorCategory::Head => 0,
        AnchorCategory::Shoulders => 1,
        AnchorCategory::Hand => 2,
    }
}

/// A tracked body region with smoothed state
///
/// Owned exclusively by the tracker; every other component reads it through
/// the tracker's accessors.
#[derive(Debug, Clone)]
pub struct AnchorRegion {
    pub id: String,
    pub category: AnchorCategory,
    pub centroid: Vec2,
    pub raw_points: Vec<Vec2>,
    /// EMA-smoothed per-frame displacement magnitude
    pub velocity: f32,
    pub missing_frames: u32,
    pub curve: PerchCurve,
    /// On-screen width of the region, for sizing and interaction radii
    pub span: f32,
    seen_this_tick: bool,
}

/// Ingests observations and maintains the live anchor set
pub struct AnchorTracker {
    anchors: AHashMap<String, AnchorRegion>,
    events: Vec<AnchorEvent>,
    cfg: TrackerConfig,
    curve_cfg: CurveConfig,
}

impl AnchorTracker {
    pub fn new(cfg: TrackerConfig, curve_cfg: CurveConfig) -> Self {
        Self {
            anchors: AHashMap::new(),
            events: Vec::new(),
            cfg,
            curve_cfg,
        }
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&AnchorRegion> {
        self.anchors.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnchorRegion> {
        self.anchors.values()
    }

    /// Feed one observation for the current frame
    ///
    /// Creates the anchor on first sight; afterwards updates the smoothed
    /// velocity and may emit a disturbance event. Call once per observed
    /// anchor, then `tick()` once per frame.
    pub fn ingest(&mut self, obs: AnchorObservation) {
        if !obs.centroid.is_finite() {
            log::debug!("Ignoring non-finite centroid for anchor '{}'", obs.id);
            return;
        }

        let curve = PerchCurve::build(obs.category, &obs.raw_points, &self.curve_cfg);
        let span = curve.span();

        match self.anchors.get_mut(&obs.id) {
            None => {
                log::debug!("Tracking new {:?} anchor '{}'", obs.category, obs.id);
                self.anchors.insert(
                    obs.id.clone(),
                    AnchorRegion {
                        id: obs.id,
                        category: obs.category,
                        centroid: obs.centroid,
                        raw_points: obs.raw_points,
                        velocity: 0.0,
                        missing_frames: 0,
                        curve,
                        span,
                        seen_this_tick: true,
                    },
                );
            }
            Some(anchor) => {
                // Reappearance after a long absence: the jump from the
                // last-known position is not real motion, so velocity state
                // restarts from zero
                if anchor.missing_frames > self.cfg.reset_after_frames {
                    anchor.velocity = 0.0;
                } else {
                    let raw_displacement = anchor.centroid.distance(obs.centroid);
                    let deadzone = self.cfg.deadzone_for(anchor.category);
                    let clipped = (raw_displacement - deadzone).max(0.0);
                    let alpha = self.cfg.alpha;
                    anchor.velocity = anchor.velocity * alpha + clipped * (1.0 - alpha);

                    if anchor.velocity > self.cfg.threshold_for(anchor.category) {
                        self.events.push(AnchorEvent::Disturbed {
                            anchor_id: anchor.id.clone(),
                            category: anchor.category,
                        });
                    }
                }

                anchor.centroid = obs.centroid;
                anchor.raw_points = obs.raw_points;
                anchor.curve = curve;
                anchor.span = span;
                anchor.missing_frames = 0;
                anchor.seen_this_tick = true;
            }
        }
    }

    /// Age every anchor not ingested this frame and evict the stale ones
    ///
    /// Call exactly once per frame, after all `ingest` calls.
    pub fn tick(&mut self) {
        let mut lost: Vec<(String, AnchorCategory)> = Vec::new();
        for anchor in self.anchors.values_mut() {
            if anchor.seen_this_tick {
                anchor.seen_this_tick = false;
            } else {
                anchor.missing_frames += 1;
                if anchor.missing_frames > self.cfg.grace_frames {
                    lost.push((anchor.id.clone(), anchor.category));
                }
            }
        }
        for (id, category) in lost {
            self.anchors.remove(&id);
            log::debug!("Evicted stale anchor '{}'", id);
            self.events.push(AnchorEvent::Lost {
                anchor_id: id,
                category,
            });
        }
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<AnchorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Sampled perch point for an anchor, centroid fallback for degenerate
    /// curves, `None` for untracked anchors or non-finite results
    pub fn perch_point(&self, id: &str, t: f32) -> Option<Vec2> {
        let anchor = self.anchors.get(id)?;
        let point = anchor.curve.sample(t).unwrap_or(anchor.centroid);
        point.is_finite().then_some(point)
    }
}

// The creature crate sees anchors only through this seam
impl perchling_creature::AnchorLookup for AnchorTracker {
    fn centroid(&self, anchor_id: &str) -> Option<Vec2> {
        self.anchors.get(anchor_id).map(|a| a.centroid)
    }

    fn perch_point(&self, anchor_id: &str, t: f32) -> Option<Vec2> {
        AnchorTracker::perch_point(self, anchor_id, t)
    }

    fn missing_frames(&self, anchor_id: &str) -> Option<u32> {
        self.anchors.get(anchor_id).map(|a| a.missing_frames)
    }

    fn span(&self, anchor_id: &str) -> Option<f32> {
        self.anchors.get(anchor_id).map(|a| a.span)
    }
}
