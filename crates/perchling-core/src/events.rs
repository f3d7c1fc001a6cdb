//! Anchor events emitted by the tracker
//!
//! Consumers subscribe by draining the tracker's buffer once per tick; the
//! tracker never mutates creatures directly. Loss and disturbance are
//! ordinary state transitions, not error conditions.

use crate::curve::AnchorCategory;

/// Something happened to a tracked anchor this tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorEvent {
    /// Smoothed velocity crossed the category threshold; bound creatures
    /// should be scared off
    Disturbed {
        anchor_id: String,
        category: AnchorCategory,
    },
    /// The anchor exceeded its grace window and was evicted
    Lost {
        anchor_id: String,
        category: AnchorCategory,
    },
}

impl AnchorEvent {
    pub fn anchor_id(&self) -> &str {
        match self {
            Self::Disturbed { anchor_id, .. } | Self::Lost { anchor_id, .. } => anchor_id,
        }
    }
}
