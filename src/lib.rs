//! # pdf-bandcrop
//!
//! Rasterize PDF documents into page images, then cut every page into the
//! horizontal bands of dark content it contains.
//!
//! ## Pipeline Overview
//!
//! ```text
//! data/*.pdf
//!  │
//!  ├─ 1. Rasterize  pdfium renders each page at 2× zoom
//!  │                → output/{stem}_page_{n}.jpg
//!  │
//!  └─ 2. Extract    grayscale → inverted threshold → external contours
//!                   → sort by top edge → size filter → pad and crop
//!                   → output_images/{page file}_{i}.jpg
//! ```
//!
//! The two stages are independent and communicate only through the
//! filesystem. Rasterization aborts on the first bad document; extraction
//! records a per-image outcome and keeps going.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_bandcrop::{extract, rasterize, ExtractionConfig, RasterizeConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pages = rasterize(&RasterizeConfig::default())?;
//!     eprintln!("{} pages written", pages.stats.pages_written);
//!
//!     let crops = extract(&ExtractionConfig::default())?;
//!     eprintln!(
//!         "{} crops from {} images ({} skipped)",
//!         crops.stats.crops_written,
//!         crops.stats.processed_images,
//!         crops.stats.skipped_images
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `bandcrop` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-bandcrop = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! Rasterization needs the pdfium shared library at runtime. Set
//! `PDFIUM_LIB_PATH` to the directory containing it, or place it in the
//! working directory or on the system library path. Extraction does not
//! need pdfium.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
#[cfg(feature = "cli")]
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod rasterize;
pub mod workspace;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ExtractionConfig, ExtractionConfigBuilder, OutputPolicy, RasterizeConfig,
    RasterizeConfigBuilder, RegionRules,
};
pub use error::{BandCropError, ImageError};
pub use extract::{extract, extract_image};
pub use output::{
    ExtractionStats, ExtractionSummary, ImageOutcome, ImageStage, ImageStatus, RasterizeStats,
    RasterizeSummary, RasterizedDocument,
};
pub use pipeline::regions::{crop_rect, find_regions, CropRect, Region};
pub use pipeline::render::{PageRenderer, PdfiumRenderer};
pub use progress::{NoopProgressListener, ProgressCallback, ProgressListener, Stage};
pub use rasterize::{rasterize, rasterize_with};
