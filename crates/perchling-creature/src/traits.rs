//! Collaborator seams between the creature crate and its owners
//!
//! The creature crate never owns anchor state or media assets. It reads both
//! through these traits, implemented by the core stage and by the external
//! renderer respectively.

use glam::Vec2;

/// Read access to the anchor snapshot for the current tick
///
/// All lookups are keyed by the anchor's string id ("Head", "Hand_0", ...).
/// A missing id means "no target" and must never be treated as an error:
/// creatures hold weak references that may dangle at any tick.
pub trait AnchorLookup {
    /// Smoothed centroid of the anchor, if it is currently tracked
    fn centroid(&self, anchor_id: &str) -> Option<Vec2>;

    /// Point at parameter `t` along the anchor's perch curve
    ///
    /// Falls back to the centroid when the curve is degenerate. Returns `None`
    /// when the anchor is untracked or the resolved point is non-finite.
    fn perch_point(&self, anchor_id: &str, t: f32) -> Option<Vec2>;

    /// Consecutive frames the anchor has gone unobserved (0 while visible)
    fn missing_frames(&self, anchor_id: &str) -> Option<u32>;

    /// Reference width of the anchor region, for creature sizing and
    /// interaction radii
    fn span(&self, anchor_id: &str) -> Option<f32>;
}

/// Reference to an externally cached media asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AssetRef(pub String);

/// Readiness contract against the external asset cache
///
/// The core queries this synchronously and never awaits loading.
pub trait AssetRegistry {
    fn is_ready(&self, asset: &AssetRef) -> bool;

    /// Pixel dimensions of a loaded asset, `None` while not ready
    fn dimensions(&self, asset: &AssetRef) -> Option<(u32, u32)>;
}

/// Registry that reports every asset as ready (procedurally drawn species,
/// headless tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

impl AssetRegistry for AlwaysReady {
    fn is_ready(&self, _asset: &AssetRef) -> bool {
        true
    }

    fn dimensions(&self, _asset: &AssetRef) -> Option<(u32, u32)> {
        None
    }
}
