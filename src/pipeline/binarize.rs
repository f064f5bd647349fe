//! Grayscale conversion and fixed-threshold binarization.
//!
//! The luma weights are the BT.601 fixed-point coefficients (scaled by 2¹⁴)
//! that OpenCV-style toolchains use for 8-bit images. `image`'s own
//! `to_luma8` uses BT.709 weights, which shifts intensities near the cutoff
//! by a few levels and changes which anti-aliased edge pixels count as
//! foreground.

use image::{GrayImage, Luma, RgbImage};

const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;

/// Foreground value in a binary mask.
pub const FOREGROUND: u8 = 255;
/// Background value in a binary mask.
pub const BACKGROUND: u8 = 0;

/// Convert an RGB raster to single-channel intensity.
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    let mut gray = GrayImage::new(img.width(), img.height());
    for (dst, src) in gray.pixels_mut().zip(img.pixels()) {
        let [r, g, b] = src.0;
        let y = (r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT
            + (1 << (SHIFT - 1)))
            >> SHIFT;
        *dst = Luma([y as u8]);
    }
    gray
}

/// Inverted global threshold: intensity `< threshold` becomes
/// [`FOREGROUND`], everything else [`BACKGROUND`].
///
/// Assumes dark content on a light page.
pub fn binarize_inverted(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut mask = GrayImage::new(gray.width(), gray.height());
    for (dst, src) in mask.pixels_mut().zip(gray.pixels()) {
        *dst = Luma([if src.0[0] < threshold {
            FOREGROUND
        } else {
            BACKGROUND
        }]);
    }
    mask
}
