//! Stage 2: page images → band crops.
//!
//! Every image is processed independently. An image that cannot be decoded
//! is skipped, an image that fails later (encode, write, or a panic) is
//! recorded as failed, and in both cases the run moves on to the next file.
//! Only problems with the run as a whole (missing input directory, output
//! directory that cannot be prepared) are returned as `Err`.

use crate::config::ExtractionConfig;
use crate::error::{BandCropError, ImageError};
use crate::output::{display_name, ExtractionSummary, ImageOutcome, ImageStage, ImageStatus};
use crate::pipeline::{binarize, contour, encode, regions};
use crate::progress::Stage;
use crate::workspace;
use image::{imageops, DynamicImage, ImageReader, RgbImage};
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, trace};

/// Extract band crops from every matching image in `config.input_dir`.
///
/// The output directory is prepared (cleaned by default) before the input
/// directory is listed.
pub fn extract(config: &ExtractionConfig) -> Result<ExtractionSummary, BandCropError> {
    let start = Instant::now();

    workspace::prepare_output_dir(&config.output_dir, config.output_policy)?;
    let inputs = workspace::list_inputs(&config.input_dir, &config.pattern)?;
    info!(
        "Extracting regions from {} images in {}",
        inputs.len(),
        config.input_dir.display()
    );

    let total = inputs.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(Stage::Extract, total);
    }

    let mut outcomes = Vec::with_capacity(total);
    for (i, input) in inputs.iter().enumerate() {
        let name = display_name(input);
        if let Some(ref cb) = config.progress_callback {
            cb.on_item_start(i + 1, total, &name);
        }

        let outcome = extract_image(input, config);

        if let Some(ref cb) = config.progress_callback {
            match &outcome.status {
                ImageStatus::Success { crops } => {
                    cb.on_item_complete(i + 1, total, &name, crops.len())
                }
                ImageStatus::Skipped { reason } => {
                    cb.on_item_skipped(i + 1, total, &name, &reason.to_string())
                }
                ImageStatus::Failed { error, .. } => {
                    cb.on_item_error(i + 1, total, &name, &error.to_string())
                }
            }
        }
        outcomes.push(outcome);
    }

    let summary = ExtractionSummary::from_outcomes(outcomes, start.elapsed().as_millis() as u64);
    info!(
        "Extraction complete: {}/{} images, {} crops, {} skipped, {} failed",
        summary.stats.processed_images,
        summary.stats.total_images,
        summary.stats.crops_written,
        summary.stats.skipped_images,
        summary.stats.failed_images
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(Stage::Extract, total, summary.stats.processed_images);
    }

    Ok(summary)
}

/// Process one page image, writing its crops into `config.output_dir`.
///
/// Never returns an error: the result is recorded in the outcome's status.
pub fn extract_image(input: &Path, config: &ExtractionConfig) -> ImageOutcome {
    isolate(input, config, crop_and_write)
}

type CropStep =
    fn(&Path, &RgbImage, &ExtractionConfig, &Cell<ImageStage>) -> Result<Vec<PathBuf>, ImageError>;

/// Decode `input`, then run `step` with panics caught and the last reached
/// stage recorded.
fn isolate(input: &Path, config: &ExtractionConfig, step: CropStep) -> ImageOutcome {
    let file = display_name(input);

    let img = match decode(input) {
        Ok(img) => img.into_rgb8(),
        Err(e) => {
            error!("Could not read {}. Skipping..", input.display());
            return ImageOutcome {
                input: input.to_path_buf(),
                status: ImageStatus::Skipped {
                    reason: ImageError::Unreadable {
                        file,
                        detail: e.to_string(),
                    },
                },
            };
        }
    };

    let stage = Cell::new(ImageStage::Loaded);
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        step(input, &img, config, &stage)
    }));

    let status = match result {
        Ok(Ok(crops)) => {
            info!("Processed {}", input.display());
            ImageStatus::Success { crops }
        }
        Ok(Err(e)) => {
            error!("Error while processing {}: {}", input.display(), e);
            ImageStatus::Failed {
                stage: stage.get(),
                error: e,
            }
        }
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            error!("Error while processing {}: {}", input.display(), detail);
            ImageStatus::Failed {
                stage: stage.get(),
                error: ImageError::Panicked { file, detail },
            }
        }
    };

    ImageOutcome {
        input: input.to_path_buf(),
        status,
    }
}

/// Decode by content, not by extension: a PNG named `*.jpg` still loads.
fn decode(input: &Path) -> image::ImageResult<DynamicImage> {
    ImageReader::open(input)?.with_guessed_format()?.decode()
}

/// Grayscale → binarize → contours → order/filter → crop and write.
///
/// `stage` is advanced as each step completes so a failure can report how
/// far the image got.
fn crop_and_write(
    input: &Path,
    img: &RgbImage,
    config: &ExtractionConfig,
    stage: &Cell<ImageStage>,
) -> Result<Vec<PathBuf>, ImageError> {
    let rules = &config.rules;

    let gray = binarize::to_grayscale(img);
    stage.set(ImageStage::Grayscaled);

    let mask = binarize::binarize_inverted(&gray, rules.threshold);
    stage.set(ImageStage::Binarized);

    let candidates = contour::external_regions(mask.as_raw(), mask.width(), mask.height());
    stage.set(ImageStage::ContoursFound);
    trace!("{}: {} external contours", input.display(), candidates.len());

    let kept = regions::order_and_filter(candidates, rules);
    stage.set(ImageStage::Filtered);
    debug!("{}: {} regions kept", input.display(), kept.len());

    let mut written = Vec::with_capacity(kept.len());
    for (index, region) in kept.iter().enumerate() {
        let rect = regions::crop_rect(region, img.width(), img.height(), rules.padding);
        let crop = imageops::crop_imm(img, rect.x, rect.y, rect.width, rect.height).to_image();

        let bytes = encode::encode_jpeg(&crop, config.jpeg_quality).map_err(|e| {
            ImageError::EncodeFailed {
                file: display_name(input),
                index,
                detail: e.to_string(),
            }
        })?;

        let path = config.output_dir.join(workspace::crop_name(input, index));
        std::fs::write(&path, bytes).map_err(|e| ImageError::WriteFailed {
            path: path.clone(),
            detail: e.to_string(),
        })?;

        trace!("{:?} → {:?} → {}", region, rect, path.display());
        written.push(path);
    }
    stage.set(ImageStage::Written);

    Ok(written)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
