//! Region ordering, filtering and the padded crop rectangle.

use super::{binarize, contour};
use crate::config::RegionRules;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Axis-aligned bounding box of one external component, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// One past the last row.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// One past the last column.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }
}

/// The rectangle actually copied out of the page, always inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Stable-sort by top edge, then keep the boxes the rules accept.
///
/// Boxes with equal `y` keep their incoming order; with the output of
/// [`contour::external_regions`] that puts the right-most band first.
pub fn order_and_filter(mut regions: Vec<Region>, rules: &RegionRules) -> Vec<Region> {
    regions.sort_by_key(|r| r.y);
    regions.retain(|r| rules.accepts(r.width, r.height));
    regions
}

/// Pad a region upwards and clamp it to the image.
///
/// The top edge moves up by `padding` (stopping at row 0) and the requested
/// height grows by `padding`, so when the top is clamped the extra rows end
/// up below the region instead. The bottom and right edges are then cut to
/// the image size.
pub fn crop_rect(region: &Region, image_width: u32, image_height: u32, padding: u32) -> CropRect {
    let x = region.x.min(image_width);
    let y = region.y.saturating_sub(padding).min(image_height);
    let requested_height = region.height.saturating_add(padding);

    let bottom = y.saturating_add(requested_height).min(image_height);
    let right = region.right().min(image_width);

    CropRect {
        x,
        y,
        width: right.saturating_sub(x),
        height: bottom.saturating_sub(y),
    }
}

/// Run grayscale → binarize → external contours → order/filter on a page.
pub fn find_regions(img: &RgbImage, rules: &RegionRules) -> Vec<Region> {
    let gray = binarize::to_grayscale(img);
    let mask = binarize::binarize_inverted(&gray, rules.threshold);
    let candidates = contour::external_regions(mask.as_raw(), mask.width(), mask.height());
    trace!("{} external contours", candidates.len());
    order_and_filter(candidates, rules)
}
