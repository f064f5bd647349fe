//! Image-processing stages shared by the rasterize and extract drivers.
//!
//! ## Data Flow
//!
//! ```text
//! rasterize:  render ──▶ encode
//!             (pdfium)   (JPEG)
//!
//! extract:    binarize ──▶ contour ──▶ regions ──▶ encode
//!             (gray, inv)  (external)  (order,      (JPEG)
//!                                       filter, pad)
//! ```
//!
//! 1. [`render`]   rasterise every page of a PDF at a zoom factor
//! 2. [`binarize`] BT.601 grayscale, then inverted fixed threshold
//! 3. [`contour`]  bounding boxes of outermost foreground components
//! 4. [`regions`]  sort by top edge, filter by size, compute padded crops
//! 5. [`encode`]   JPEG-encode a crop or page

pub mod binarize;
pub mod contour;
pub mod encode;
pub mod regions;
pub mod render;
