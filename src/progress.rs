//! Progress-callback trait for per-item pipeline events.
//!
//! Inject an [`Arc<dyn ProgressListener>`] via
//! [`crate::config::RasterizeConfigBuilder::progress_callback`] or
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as each stage works through its inputs. An "item" is a PDF document
//! for the rasterizer and a page image for the extractor.
//!
//! # Example
//!
//! ```rust
//! use pdf_bandcrop::{ExtractionConfig, ProgressListener};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CropCounter {
//!     crops: AtomicUsize,
//! }
//!
//! impl ProgressListener for CropCounter {
//!     fn on_item_complete(&self, _index: usize, _total: usize, _name: &str, outputs: usize) {
//!         self.crops.fetch_add(outputs, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CropCounter { crops: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ProgressListener>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which stage is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// PDF documents → page images.
    Rasterize,
    /// Page images → band crops.
    Extract,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Rasterize => f.write_str("Rasterizing"),
            Stage::Extract => f.write_str("Extracting"),
        }
    }
}

/// Called by a pipeline stage as it processes each item.
///
/// Both stages are sequential, so events arrive in order from a single
/// thread. The trait is still `Send + Sync` so a listener can be shared with
/// a UI thread. All methods have default no-op implementations.
///
/// Item indices are 1-based.
pub trait ProgressListener: Send + Sync {
    /// Called once after the inputs have been enumerated.
    fn on_stage_start(&self, stage: Stage, total_items: usize) {
        let _ = (stage, total_items);
    }

    /// Called before an item is opened.
    fn on_item_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when an item finished successfully.
    ///
    /// `outputs` is the number of files written for it (pages or crops).
    fn on_item_complete(&self, index: usize, total: usize, name: &str, outputs: usize) {
        let _ = (index, total, name, outputs);
    }

    /// Called when the extractor skips an unreadable image.
    fn on_item_skipped(&self, index: usize, total: usize, name: &str, reason: &str) {
        let _ = (index, total, name, reason);
    }

    /// Called when an item failed.
    fn on_item_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after the last item, unless the stage aborted.
    fn on_stage_complete(&self, stage: Stage, total_items: usize, success_count: usize) {
        let _ = (stage, total_items, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressListener;

impl ProgressListener for NoopProgressListener {}

/// Convenience alias matching the type stored in the stage configs.
pub type ProgressCallback = Arc<dyn ProgressListener>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingListener {
        starts: AtomicUsize,
        outputs: AtomicUsize,
        skipped: AtomicUsize,
        errors: AtomicUsize,
        stages: Mutex<Vec<Stage>>,
    }

    impl ProgressListener for TrackingListener {
        fn on_stage_start(&self, stage: Stage, _total_items: usize) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_item_start(&self, _index: usize, _total: usize, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_complete(&self, _index: usize, _total: usize, _name: &str, outputs: usize) {
            self.outputs.fetch_add(outputs, Ordering::SeqCst);
        }

        fn on_item_skipped(&self, _index: usize, _total: usize, _name: &str, _reason: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_error(&self, _index: usize, _total: usize, _name: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_listener_does_not_panic() {
        let cb = NoopProgressListener;
        cb.on_stage_start(Stage::Extract, 3);
        cb.on_item_start(1, 3, "a.jpg");
        cb.on_item_complete(1, 3, "a.jpg", 2);
        cb.on_item_skipped(2, 3, "b.jpg", "corrupt");
        cb.on_item_error(3, 3, "c.jpg", "disk full");
        cb.on_stage_complete(Stage::Extract, 3, 1);
    }

    #[test]
    fn tracking_listener_receives_events() {
        let tracker = TrackingListener::default();

        tracker.on_stage_start(Stage::Rasterize, 2);
        tracker.on_item_start(1, 2, "a.pdf");
        tracker.on_item_complete(1, 2, "a.pdf", 3);
        tracker.on_item_start(2, 2, "b.pdf");
        tracker.on_item_complete(2, 2, "b.pdf", 1);
        tracker.on_stage_start(Stage::Extract, 4);
        tracker.on_item_skipped(1, 4, "x.jpg", "corrupt");
        tracker.on_item_error(2, 4, "y.jpg", "write failed");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.outputs.load(Ordering::SeqCst), 4);
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(
            *tracker.stages.lock().unwrap(),
            vec![Stage::Rasterize, Stage::Extract]
        );
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Rasterize.to_string(), "Rasterizing");
        assert_eq!(Stage::Extract.to_string(), "Extracting");
    }
}
