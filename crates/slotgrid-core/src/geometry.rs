#![forbid(unsafe_code)]

//! Pointer geometry for separator slides.
//!
//! Coordinates are host units (CSS pixels, terminal cells, ...) measured
//! along the row's horizontal axis. The engine only ever needs ratios, so the
//! unit never matters as long as a host is consistent within one slide.

use serde::{Deserialize, Serialize};

/// Measured horizontal extent of two adjacent slots and the separator
/// between them, captured when a slide starts.
///
/// ```text
/// left_origin_x
/// |<-- left_width -->|<- slider_width ->|<-- right_width -->|
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairGeometry {
    /// X coordinate of the left slot's leading edge.
    pub left_origin_x: f64,
    /// Rendered width of the left slot.
    pub left_width: f64,
    /// Rendered width of the separator itself.
    pub slider_width: f64,
    /// Rendered width of the right slot.
    pub right_width: f64,
}

impl PairGeometry {
    /// Create a new pair geometry.
    #[must_use]
    pub const fn new(left_origin_x: f64, left_width: f64, slider_width: f64, right_width: f64) -> Self {
        Self {
            left_origin_x,
            left_width,
            slider_width,
            right_width,
        }
    }

    /// Full extent covered by the pair, separator included.
    #[must_use]
    pub fn extent(&self) -> f64 {
        self.left_width + self.slider_width + self.right_width
    }

    /// Share of the pair extent that lies left of `pointer_x`.
    ///
    /// Returns `None` when the geometry is degenerate (non-positive or
    /// non-finite extent) or the pointer is not finite. The result is not
    /// clamped; callers apply their own bounds.
    #[must_use]
    pub fn share_at(&self, pointer_x: f64) -> Option<f64> {
        let extent = self.extent();
        if !extent.is_finite() || extent <= 0.0 || !pointer_x.is_finite() {
            return None;
        }
        let share = (pointer_x - self.left_origin_x) / extent;
        share.is_finite().then_some(share)
    }
}
