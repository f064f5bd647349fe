//! Result types returned by the two stages.
//!
//! Everything here derives `Serialize`/`Deserialize` so a run can be dumped
//! as JSON (`bandcrop extract --json`) and compared between runs.

use crate::error::ImageError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Rasterizer ───────────────────────────────────────────────────────────

/// Page images written for one source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterizedDocument {
    /// The PDF that was rendered.
    pub source: PathBuf,
    /// Page image paths, in page order.
    pub pages: Vec<PathBuf>,
}

/// Aggregate counters for a rasterize run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RasterizeStats {
    pub documents: usize,
    pub pages_written: usize,
    pub total_duration_ms: u64,
}

/// Outcome of a complete rasterize run.
///
/// Only produced when every document rendered; any failure aborts the run
/// with a [`crate::error::BandCropError`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterizeSummary {
    pub documents: Vec<RasterizedDocument>,
    pub stats: RasterizeStats,
}

// ── Extractor ────────────────────────────────────────────────────────────

/// How far an image got through the extraction pipeline.
///
/// `Loaded → Grayscaled → Binarized → ContoursFound → Filtered → Written`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImageStage {
    Loaded,
    Grayscaled,
    Binarized,
    ContoursFound,
    Filtered,
    Written,
}

/// Per-image result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImageStatus {
    /// All crops were written (possibly zero of them).
    Success { crops: Vec<PathBuf> },
    /// The image could not be decoded and was not processed.
    Skipped { reason: ImageError },
    /// Processing started but failed after `stage`.
    Failed { stage: ImageStage, error: ImageError },
}

/// One input image and what happened to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOutcome {
    pub input: PathBuf,
    pub status: ImageStatus,
}

impl ImageOutcome {
    /// Crops written for this image; empty unless the status is `Success`.
    pub fn crops(&self) -> &[PathBuf] {
        match &self.status {
            ImageStatus::Success { crops } => crops,
            _ => &[],
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ImageStatus::Success { .. })
    }

    /// File name of the input image, for log lines and progress output.
    pub fn file_name(&self) -> String {
        display_name(&self.input)
    }
}

/// Aggregate counters for an extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_images: usize,
    pub processed_images: usize,
    pub skipped_images: usize,
    pub failed_images: usize,
    pub crops_written: usize,
    pub total_duration_ms: u64,
}

/// Outcome of a complete extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub outcomes: Vec<ImageOutcome>,
    pub stats: ExtractionStats,
}

impl ExtractionSummary {
    /// Aggregate per-image outcomes into a summary.
    pub fn from_outcomes(outcomes: Vec<ImageOutcome>, total_duration_ms: u64) -> Self {
        let mut stats = ExtractionStats {
            total_images: outcomes.len(),
            total_duration_ms,
            ..ExtractionStats::default()
        };
        for outcome in &outcomes {
            match &outcome.status {
                ImageStatus::Success { crops } => {
                    stats.processed_images += 1;
                    stats.crops_written += crops.len();
                }
                ImageStatus::Skipped { .. } => stats.skipped_images += 1,
                ImageStatus::Failed { .. } => stats.failed_images += 1,
            }
        }
        Self { outcomes, stats }
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
