pub mod engine;

use std::fmt;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

pub use self::engine::compare;

/// A rasterized page: RGBA, 8 bits per channel.
pub type PixelBuffer = RgbaImage;

/// Manual registration shift for the "after" document.
///
/// Pixel `(x, y)` of the "before" page is compared against pixel
/// `(x + dx, y + dy)` of the "after" page. One offset applies to every page
/// of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentOffset {
    pub dx: i32,
    pub dy: i32,
}

impl AlignmentOffset {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

impl fmt::Display for AlignmentOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.dx, self.dy)
    }
}

/// Thresholds for the three-pass difference engine.
///
/// `Default` holds the calibrated values. They were picked empirically for
/// antialiased drawings on white paper; changing any of them changes which
/// pages report a difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffParams {
    /// A pixel is changed when `|dR| + |dG| + |dB|` exceeds this.
    pub mask_threshold: u32,
    /// Side of the square clustering blocks, in pixels.
    pub block_size: u32,
    /// Changed pixels a block needs before it counts as real change.
    pub block_min_pixels: u32,
    /// Classified pixels a page needs before `has_difference` is set.
    pub significance_floor: u64,
    /// A pixel is a deletion when "after" is brighter than "before" by more
    /// than this in any channel.
    pub deletion_margin: i32,
}

impl Default for DiffParams {
    fn default() -> Self {
        Self {
            mask_threshold: 45,
            block_size: 6,
            block_min_pixels: 5,
            significance_floor: 300,
            deletion_margin: 20,
        }
    }
}

/// Per-page comparison result.
#[derive(Debug, Clone)]
pub struct DiffMetrics {
    /// 1-based page number within the run.
    pub page_number: u32,
    pub width: u32,
    pub height: u32,
    /// Pixels classified as addition or deletion.
    pub diff_pixel_count: u64,
    pub addition_count: u64,
    pub deletion_count: u64,
    /// `diff_pixel_count / (width * height) * 100`, rounded to 2 decimals.
    pub diff_percent: f64,
    /// At least one real block was found and the classified pixel count
    /// reached the significance floor.
    pub has_difference: bool,
    /// Composite image: grey context with blue additions and red deletions.
    pub visualization: PixelBuffer,
}

impl DiffMetrics {
    /// Renumber a result produced by [`compare`] (which reports page 1).
    pub fn on_page(mut self, page_number: u32) -> Self {
        self.page_number = page_number;
        self
    }
}

/// Percentage of `part` in `total`, rounded to 2 decimals.
pub(crate) fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = part as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_to_two_decimals() {
        assert_eq!(percent_of(0, 100), 0.0);
        assert_eq!(percent_of(1, 3), 33.33);
        assert_eq!(percent_of(2, 3), 66.67);
        assert_eq!(percent_of(576, 14_400), 4.0);
    }

    #[test]
    fn percent_of_empty_canvas_is_zero() {
        assert_eq!(percent_of(0, 0), 0.0);
    }

    #[test]
    fn tiny_fractions_round_to_zero() {
        // 1 pixel of a 300 x 400 page is 0.00083%.
        assert_eq!(percent_of(1, 120_000), 0.0);
    }

    #[test]
    fn offset_display() {
        assert_eq!(AlignmentOffset::new(-3, 12).to_string(), "(-3, 12)");
    }
}
