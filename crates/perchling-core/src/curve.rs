//! Perch curve construction and sampling
//!
//! Each anchor category builds its reference polyline differently:
//! - Head: two ear points plus a synthesized apex above their midpoint,
//!   sampled by arc length so symmetric ears put the apex at t = 0.5
//! - Shoulders: tip, neck apex, tip - two independent parameter-space
//!   segments split at t = 0.5, not one arc-length span
//! - Hand: the upper-boundary hull of all hand landmarks
//!
//! `sample` is pure; it runs every tick for every creature bound to the
//! anchor.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::geometry::{sample_polyline, upper_hull};

/// Body region category, with independent tuning per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorCategory {
    Head,
    Shoulders,
    Hand,
}

/// Construction parameters for perch curves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveConfig {
    /// Head apex height as a fraction of ear span
    pub head_apex_ratio: f32,
    /// Synthesized neck apex height as a fraction of shoulder span, used
    /// only when the perception layer does not supply a neck point
    pub shoulder_apex_ratio: f32,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            head_apex_ratio: 0.45,
            shoulder_apex_ratio: 0.2,
        }
    }
}

/// A resolved perch curve for one anchor
#[derive(Debug, Clone, PartialEq)]
pub enum PerchCurve {
    /// Ordered polyline sampled by cumulative arc length (head arch, hand
    /// hull)
    ArcLength(SmallVec<[Vec2; 8]>),
    /// Two independent linear segments split at t = 0.5 (shoulders)
    TwoSegment { start: Vec2, mid: Vec2, end: Vec2 },
    /// Not enough usable points; sampling falls back to the centroid
    Empty,
}

impl PerchCurve {
    /// Build the category-specific curve from an anchor's raw reference
    /// points
    pub fn build(category: AnchorCategory, raw_points: &[Vec2], cfg: &CurveConfig) -> Self {
        let finite: SmallVec<[Vec2; 8]> = raw_points
            .iter()
            .filter(|p| p.is_finite())
            .copied()
            .collect();
        match category {
            AnchorCategory::Head => Self::build_head(&finite, cfg),
            AnchorCategory::Shoulders => Self::build_shoulders(&finite, cfg),
            AnchorCategory::Hand => Self::build_hand(&finite),
        }
    }

    /// Three-point arch: ear, synthesized apex above the midpoint, ear
    fn build_head(points: &[Vec2], cfg: &CurveConfig) -> Self {
        let [ear_l, ear_r] = points else {
            return Self::Empty;
        };
        let span = ear_l.distance(*ear_r);
        if span <= 0.0 {
            return Self::Empty;
        }
        let apex = (*ear_l + *ear_r) * 0.5 - Vec2::new(0.0, span * cfg.head_apex_ratio);
        Self::ArcLength(SmallVec::from_slice(&[*ear_l, apex, *ear_r]))
    }

    /// Tip -> neck apex -> tip, split in parameter space at t = 0.5
    ///
    /// The neck apex comes from the third raw point when supplied, and is
    /// synthesized above the tip midpoint otherwise.
    fn build_shoulders(points: &[Vec2], cfg: &CurveConfig) -> Self {
        let (tips, neck) = match points {
            [l, r] => {
                let span = l.distance(*r);
                if span <= 0.0 {
                    return Self::Empty;
                }
                let apex = (*l + *r) * 0.5 - Vec2::new(0.0, span * cfg.shoulder_apex_ratio);
                ((*l, *r), apex)
            }
            [l, r, neck, ..] => ((*l, *r), *neck),
            _ => return Self::Empty,
        };
        Self::TwoSegment {
            start: tips.0,
            mid: neck,
            end: tips.1,
        }
    }

    /// Ridge of the back of the hand: upper-boundary hull of all landmarks
    fn build_hand(points: &[Vec2]) -> Self {
        let hull = upper_hull(points);
        if hull.len() < 2 {
            return Self::Empty;
        }
        Self::ArcLength(SmallVec::from_vec(hull))
    }

    /// Point at parameter `t` in [0, 1] along the curve
    pub fn sample(&self, t: f32) -> Option<Vec2> {
        match self {
            Self::ArcLength(points) => sample_polyline(points, t),
            Self::TwoSegment { start, mid, end } => {
                let t = t.clamp(0.0, 1.0);
                let point = if t <= 0.5 {
                    start.lerp(*mid, t * 2.0)
                } else {
                    mid.lerp(*end, (t - 0.5) * 2.0)
                };
                Some(point)
            }
            Self::Empty => None,
        }
    }

    /// Horizontal extent of the curve, a proxy for the anchor's on-screen
    /// width
    pub fn span(&self) -> f32 {
        let (min, max) = match self {
            Self::ArcLength(points) => points
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), p| {
                    (min.min(p.x), max.max(p.x))
                }),
            Self::TwoSegment { start, mid, end } => [start, mid, end]
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), p| {
                    (min.min(p.x), max.max(p.x))
                }),
            Self::Empty => return 0.0,
        };
        (max - min).max(0.0)
    }
}
