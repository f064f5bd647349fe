//! Configuration types for the rasterize and extract stages.
//!
//! Every threshold the pipeline uses lives in one of the structs below and
//! is passed explicitly into the stage functions. The defaults reproduce
//! the fixed behaviour (zoom 2.0, threshold 200, minimum width 400, minimum
//! height 50, padding 50), so `RasterizeConfig::default()` and
//! `ExtractionConfig::default()` are all a plain run needs.
//!
//! Both configs are built via a builder that validates on `build()`, the
//! same way regardless of whether the caller is the CLI or a test working
//! in a temporary directory.

use crate::error::BandCropError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Default JPEG quality for both page images and crops.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

// ── Region rules ─────────────────────────────────────────────────────────

/// Geometric rules that decide which components become crops.
///
/// All values are in pixels of the rasterised page, so they are tied to the
/// rasterizer's zoom factor: a page rendered at 1.0× needs roughly half the
/// width and height minimums to select the same bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRules {
    /// Grayscale cutoff on the 0–255 scale. Pixels strictly darker than this
    /// are foreground. Default: 200.
    pub threshold: u8,

    /// Minimum bounding-box width (inclusive). Default: 400.
    pub min_width: u32,

    /// Bounding-box height must be strictly greater than this. Default: 50.
    pub min_height: u32,

    /// Pixels added above each region; the crop height grows by the same
    /// amount. Default: 50.
    pub padding: u32,
}

impl Default for RegionRules {
    fn default() -> Self {
        Self {
            threshold: 200,
            min_width: 400,
            min_height: 50,
            padding: 50,
        }
    }
}

impl RegionRules {
    /// Whether a bounding box of this size survives the filter.
    pub fn accepts(&self, width: u32, height: u32) -> bool {
        width >= self.min_width && height > self.min_height
    }
}

// ── Output policy ────────────────────────────────────────────────────────

/// What to do with an output directory that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputPolicy {
    /// Delete the directory and recreate it empty. (default)
    #[default]
    Clean,
    /// Keep existing files; new files overwrite same-named ones.
    Append,
    /// Refuse to run if the directory exists.
    FailIfExists,
}

// ── Rasterize config ─────────────────────────────────────────────────────

/// Configuration for the PDF → page image stage.
#[derive(Clone)]
pub struct RasterizeConfig {
    /// Directory scanned for source documents. Default: `data`.
    pub source_dir: PathBuf,

    /// Working directory receiving page images. Default: `output`.
    pub output_dir: PathBuf,

    /// Glob matched against file names inside `source_dir`. Default: `*.pdf`.
    pub pattern: String,

    /// Horizontal and vertical scale applied to each page. Default: 2.0.
    ///
    /// The extractor's pixel thresholds assume this value; changing it
    /// changes which bands are detected.
    pub zoom: f32,

    /// JPEG quality for page images (1–100). Default: 95.
    pub jpeg_quality: u8,

    /// Handling of a pre-existing `output_dir`. Default: [`OutputPolicy::Clean`].
    pub output_policy: OutputPolicy,

    /// PDF user password applied to every document.
    pub password: Option<String>,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RasterizeConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            pattern: "*.pdf".to_string(),
            zoom: 2.0,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            output_policy: OutputPolicy::default(),
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RasterizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterizeConfig")
            .field("source_dir", &self.source_dir)
            .field("output_dir", &self.output_dir)
            .field("pattern", &self.pattern)
            .field("zoom", &self.zoom)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("output_policy", &self.output_policy)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RasterizeConfig {
    /// Create a new builder for `RasterizeConfig`.
    pub fn builder() -> RasterizeConfigBuilder {
        RasterizeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RasterizeConfig`].
#[derive(Debug)]
pub struct RasterizeConfigBuilder {
    config: RasterizeConfig,
}

impl RasterizeConfigBuilder {
    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.source_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.pattern = pattern.into();
        self
    }

    pub fn zoom(mut self, zoom: f32) -> Self {
        self.config.zoom = zoom;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q;
        self
    }

    pub fn output_policy(mut self, policy: OutputPolicy) -> Self {
        self.config.output_policy = policy;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RasterizeConfig, BandCropError> {
        let c = &self.config;
        if !c.zoom.is_finite() || !(0.1..=10.0).contains(&c.zoom) {
            return Err(BandCropError::InvalidConfig(format!(
                "Zoom must be 0.1–10.0, got {}",
                c.zoom
            )));
        }
        validate_quality(c.jpeg_quality)?;
        validate_pattern(&c.pattern)?;
        validate_dirs(&c.source_dir, &c.output_dir, c.output_policy)?;
        Ok(self.config)
    }
}

// ── Extraction config ────────────────────────────────────────────────────

/// Configuration for the page image → band crops stage.
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Directory scanned for page images. Default: `output`.
    pub input_dir: PathBuf,

    /// Directory receiving crops. Default: `output_images`.
    pub output_dir: PathBuf,

    /// Glob matched against file names inside `input_dir`. Default: `*.jpg`.
    pub pattern: String,

    /// Binarization and geometry rules.
    pub rules: RegionRules,

    /// JPEG quality for crops (1–100). Default: 95.
    pub jpeg_quality: u8,

    /// Handling of a pre-existing `output_dir`. Default: [`OutputPolicy::Clean`].
    pub output_policy: OutputPolicy,

    /// Optional per-image progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("output"),
            output_dir: PathBuf::from("output_images"),
            pattern: "*.jpg".to_string(),
            rules: RegionRules::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            output_policy: OutputPolicy::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("pattern", &self.pattern)
            .field("rules", &self.rules)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("output_policy", &self.output_policy)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProgressListener>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.pattern = pattern.into();
        self
    }

    pub fn rules(mut self, rules: RegionRules) -> Self {
        self.config.rules = rules;
        self
    }

    pub fn threshold(mut self, t: u8) -> Self {
        self.config.rules.threshold = t;
        self
    }

    pub fn min_width(mut self, px: u32) -> Self {
        self.config.rules.min_width = px;
        self
    }

    pub fn min_height(mut self, px: u32) -> Self {
        self.config.rules.min_height = px;
        self
    }

    pub fn padding(mut self, px: u32) -> Self {
        self.config.rules.padding = px;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q;
        self
    }

    pub fn output_policy(mut self, policy: OutputPolicy) -> Self {
        self.config.output_policy = policy;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, BandCropError> {
        let c = &self.config;
        validate_quality(c.jpeg_quality)?;
        validate_pattern(&c.pattern)?;
        validate_dirs(&c.input_dir, &c.output_dir, c.output_policy)?;
        Ok(self.config)
    }
}

fn validate_quality(q: u8) -> Result<(), BandCropError> {
    if !(1..=100).contains(&q) {
        return Err(BandCropError::InvalidConfig(format!(
            "JPEG quality must be 1–100, got {q}"
        )));
    }
    Ok(())
}

/// Cleaning an output directory that is, or contains, the input would delete
/// the inputs before they are read. Paths are compared after resolving them
/// against the working directory and the filesystem.
fn validate_dirs(input: &Path, output: &Path, policy: OutputPolicy) -> Result<(), BandCropError> {
    if policy != OutputPolicy::Clean {
        return Ok(());
    }
    let (input_abs, output_abs) = (resolve(input), resolve(output));
    if input_abs.starts_with(&output_abs) {
        return Err(BandCropError::InvalidConfig(format!(
            "Output directory '{}' contains input directory '{}'; the clean policy would delete the inputs",
            output.display(),
            input.display()
        )));
    }
    Ok(())
}

/// Absolute form of `path`: the longest existing prefix is canonicalised
/// (following symlinks) and the rest is appended with `.` and `..` folded.
fn resolve(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut normal = PathBuf::new();
    for part in absolute.components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir => {
                normal.pop();
            }
            other => normal.push(other),
        }
    }

    let mut rest = Vec::new();
    let mut prefix = normal.as_path();
    loop {
        if let Ok(real) = prefix.canonicalize() {
            return rest.iter().rev().fold(real, |acc, name| acc.join(name));
        }
        match (prefix.parent(), prefix.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                prefix = parent;
            }
            _ => return normal,
        }
    }
}

fn validate_pattern(pattern: &str) -> Result<(), BandCropError> {
    if pattern.trim().is_empty() {
        return Err(BandCropError::InvalidConfig(
            "File pattern must not be empty".into(),
        ));
    }
    glob::Pattern::new(pattern).map_err(|e| BandCropError::InvalidPattern {
        pattern: pattern.to_string(),
        detail: e.to_string(),
    })?;
    Ok(())
}
