//! Stage 1: PDF documents → page images.
//!
//! Unlike the extractor, this stage has no per-item isolation: the first
//! document that fails to open, render, encode or write aborts the run and
//! the error is returned to the caller. Pages already written stay on disk.
//!
//! This stage only emits `debug!` events; the log file's info lines come
//! from the extractor.

use crate::config::RasterizeConfig;
use crate::error::BandCropError;
use crate::output::{display_name, RasterizeStats, RasterizeSummary, RasterizedDocument};
use crate::pipeline::encode;
use crate::pipeline::render::{PageRenderer, PdfiumRenderer};
use crate::progress::Stage;
use crate::workspace;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

/// Rasterize every matching PDF with pdfium.
///
/// # Errors
/// Returns `Err` for the first failure of any kind, including failing to
/// bind pdfium.
pub fn rasterize(config: &RasterizeConfig) -> Result<RasterizeSummary, BandCropError> {
    let renderer = PdfiumRenderer::bind()?;
    rasterize_with(&renderer, config)
}

/// Rasterize every matching PDF with the given renderer.
pub fn rasterize_with(
    renderer: &dyn PageRenderer,
    config: &RasterizeConfig,
) -> Result<RasterizeSummary, BandCropError> {
    let start = Instant::now();

    let sources = workspace::list_inputs(&config.source_dir, &config.pattern)?;
    workspace::prepare_output_dir(&config.output_dir, config.output_policy)?;
    debug!(
        "Rasterizing {} documents from {} into {}",
        sources.len(),
        config.source_dir.display(),
        config.output_dir.display()
    );

    let total = sources.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(Stage::Rasterize, total);
    }

    let mut documents = Vec::with_capacity(total);
    for (i, source) in sources.iter().enumerate() {
        let name = display_name(source);
        if let Some(ref cb) = config.progress_callback {
            cb.on_item_start(i + 1, total, &name);
        }

        let pages = match rasterize_document(renderer, source, config) {
            Ok(pages) => pages,
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_item_error(i + 1, total, &name, &e.to_string());
                }
                return Err(e);
            }
        };

        if let Some(ref cb) = config.progress_callback {
            cb.on_item_complete(i + 1, total, &name, pages.len());
        }
        documents.push(RasterizedDocument {
            source: source.clone(),
            pages,
        });
    }

    let stats = RasterizeStats {
        documents: documents.len(),
        pages_written: documents.iter().map(|d| d.pages.len()).sum(),
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    debug!(
        "Rasterized {} documents, {} pages in {}ms",
        stats.documents, stats.pages_written, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(Stage::Rasterize, total, documents.len());
    }

    Ok(RasterizeSummary { documents, stats })
}

/// Render one document and write `{stem}_page_{n}.jpg` for each page.
///
/// Each page is encoded and written before the next one is rendered.
fn rasterize_document(
    renderer: &dyn PageRenderer,
    source: &Path,
    config: &RasterizeConfig,
) -> Result<Vec<PathBuf>, BandCropError> {
    workspace::check_pdf(source)?;

    let mut written = Vec::new();
    renderer.render_each_page(
        source,
        config.zoom,
        config.password.as_deref(),
        &mut |page, image| {
            let path = config
                .output_dir
                .join(workspace::page_image_name(source, page));

            // JPEG has no alpha channel.
            let rgb = image.into_rgb8();
            let bytes = encode::encode_jpeg(&rgb, config.jpeg_quality).map_err(|e| {
                BandCropError::EncodeFailed {
                    path: path.clone(),
                    source: e,
                }
            })?;
            std::fs::write(&path, bytes).map_err(|e| BandCropError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;

            debug!("Wrote {}", path.display());
            written.push(path);
            Ok(())
        },
    )?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Renders a fixed number of blank pages, or fails for chosen files.
    ///
    /// Before rendering each page it counts the files already in `watch`.
    struct FakeRenderer {
        pages: usize,
        fail_on: Option<&'static str>,
        calls: RefCell<Vec<(String, f32)>>,
        watch: Option<PathBuf>,
        files_before_page: RefCell<Vec<usize>>,
    }

    impl FakeRenderer {
        fn new(pages: usize, fail_on: Option<&'static str>) -> Self {
            Self {
                pages,
                fail_on,
                calls: RefCell::new(vec![]),
                watch: None,
                files_before_page: RefCell::new(vec![]),
            }
        }
    }

    impl PageRenderer for FakeRenderer {
        fn render_each_page(
            &self,
            pdf_path: &Path,
            zoom: f32,
            _password: Option<&str>,
            on_page: &mut dyn FnMut(usize, DynamicImage) -> Result<(), BandCropError>,
        ) -> Result<usize, BandCropError> {
            let name = display_name(pdf_path);
            self.calls.borrow_mut().push((name.clone(), zoom));
            if self.fail_on == Some(name.as_str()) {
                return Err(BandCropError::CorruptPdf {
                    path: pdf_path.to_path_buf(),
                    detail: "broken xref".into(),
                });
            }
            let w = (100.0 * zoom) as u32;
            let h = (150.0 * zoom) as u32;
            for page in 1..=self.pages {
                if let Some(ref dir) = self.watch {
                    let count = std::fs::read_dir(dir).unwrap().count();
                    self.files_before_page.borrow_mut().push(count);
                }
                let image =
                    DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 0])));
                on_page(page, image)?;
            }
            Ok(self.pages)
        }
    }

    fn setup(docs: &[&str]) -> (TempDir, RasterizeConfig) {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("data");
        std::fs::create_dir(&src).unwrap();
        for d in docs {
            std::fs::write(src.join(d), b"%PDF-1.4\n").unwrap();
        }
        let config = RasterizeConfig::builder()
            .source_dir(&src)
            .output_dir(tmp.path().join("output"))
            .build()
            .unwrap();
        (tmp, config)
    }

    #[test]
    fn three_pages_produce_three_named_files() {
        let (_tmp, config) = setup(&["report.pdf"]);
        let renderer = FakeRenderer::new(3, None);

        let summary = rasterize_with(&renderer, &config).unwrap();
        assert_eq!(summary.stats.pages_written, 3);

        let mut names: Vec<String> = std::fs::read_dir(&config.output_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["report_page_1.jpg", "report_page_2.jpg", "report_page_3.jpg"]
        );
        assert_eq!(renderer.calls.borrow()[0].1, 2.0);

        let page = image::open(config.output_dir.join("report_page_1.jpg")).unwrap();
        assert_eq!((page.width(), page.height()), (200, 300));
    }

    #[test]
    fn one_bad_document_aborts_the_run() {
        let (_tmp, config) = setup(&["a.pdf", "b.pdf", "c.pdf"]);
        let renderer = FakeRenderer::new(1, Some("b.pdf"));

        let err = rasterize_with(&renderer, &config).unwrap_err();
        assert!(matches!(err, BandCropError::CorruptPdf { .. }));

        // c.pdf is never attempted; a.pdf's page stays on disk.
        let attempted: Vec<String> = renderer
            .calls
            .borrow()
            .iter()
            .map(|(n, _)| n.clone())
            .collect();
        assert_eq!(attempted, vec!["a.pdf", "b.pdf"]);
        assert!(config.output_dir.join("a_page_1.jpg").exists());
    }

    #[test]
    fn non_pdf_file_aborts_before_rendering() {
        let (tmp, config) = setup(&[]);
        std::fs::write(tmp.path().join("data/fake.pdf"), b"GIF89a").unwrap();
        let renderer = FakeRenderer::new(1, None);

        let err = rasterize_with(&renderer, &config).unwrap_err();
        assert!(matches!(err, BandCropError::NotAPdf { .. }));
        assert!(renderer.calls.borrow().is_empty());
    }

    #[test]
    fn stale_pages_are_removed() {
        let (_tmp, config) = setup(&["doc.pdf"]);
        std::fs::create_dir_all(&config.output_dir).unwrap();
        std::fs::write(config.output_dir.join("old_page_9.jpg"), b"stale").unwrap();

        let renderer = FakeRenderer::new(1, None);
        rasterize_with(&renderer, &config).unwrap();

        assert!(!config.output_dir.join("old_page_9.jpg").exists());
        assert!(config.output_dir.join("doc_page_1.jpg").exists());
    }

    #[test]
    fn each_page_is_written_before_the_next_is_rendered() {
        let (_tmp, config) = setup(&["long.pdf"]);
        let mut renderer = FakeRenderer::new(3, None);
        renderer.watch = Some(config.output_dir.clone());

        rasterize_with(&renderer, &config).unwrap();

        assert_eq!(*renderer.files_before_page.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn write_failure_stops_rendering() {
        let (_tmp, config) = setup(&["doc.pdf"]);
        let mut renderer = FakeRenderer::new(3, None);
        renderer.watch = Some(config.source_dir.clone());

        // Output directory never prepared, so the first write fails.
        let err = rasterize_document(&renderer, &config.source_dir.join("doc.pdf"), &config)
            .unwrap_err();

        assert!(matches!(err, BandCropError::OutputWriteFailed { .. }));
        assert_eq!(renderer.files_before_page.borrow().len(), 1);
    }
}
