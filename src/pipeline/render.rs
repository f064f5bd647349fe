//! PDF rasterisation: render the pages of a document one at a time.
//!
//! Rendering sits behind the [`PageRenderer`] trait so the rasterize stage
//! can be driven by pdfium in production and by an in-memory fake in tests.
//!
//! pdfium is a shared library loaded at runtime. [`PdfiumRenderer::bind`]
//! looks for it in `PDFIUM_LIB_PATH`, then the current directory, then the
//! system library path.

use crate::error::BandCropError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Turns one PDF into one raster image per page.
pub trait PageRenderer {
    /// Render pages in order, scaled by `zoom` in both dimensions, handing
    /// each one to `on_page` (1-based page number, image) before the next is
    /// rendered. Returns the number of pages.
    ///
    /// Any failure, including one returned by `on_page`, is fatal for the
    /// document and stops rendering.
    fn render_each_page(
        &self,
        pdf_path: &Path,
        zoom: f32,
        password: Option<&str>,
        on_page: &mut dyn FnMut(usize, DynamicImage) -> Result<(), BandCropError>,
    ) -> Result<usize, BandCropError>;
}

/// [`PageRenderer`] backed by the pdfium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Bind to a pdfium shared library.
    pub fn bind() -> Result<Self, BandCropError> {
        let bindings = match std::env::var("PDFIUM_LIB_PATH") {
            Ok(dir) if !dir.is_empty() => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            }
            _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| BandCropError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_each_page(
        &self,
        pdf_path: &Path,
        zoom: f32,
        password: Option<&str>,
        on_page: &mut dyn FnMut(usize, DynamicImage) -> Result<(), BandCropError>,
    ) -> Result<usize, BandCropError> {
        let document = self
            .pdfium
            .load_pdf_from_file(pdf_path, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        BandCropError::WrongPassword {
                            path: pdf_path.to_path_buf(),
                        }
                    } else {
                        BandCropError::PasswordRequired {
                            path: pdf_path.to_path_buf(),
                        }
                    }
                } else {
                    BandCropError::CorruptPdf {
                        path: pdf_path.to_path_buf(),
                        detail: err_str,
                    }
                }
            })?;

        let pages = document.pages();
        debug!("{}: {} pages", pdf_path.display(), pages.len());

        let render_config = PdfRenderConfig::new().scale_page_by_factor(zoom);

        let mut rendered = 0;
        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                BandCropError::RasterisationFailed {
                    path: pdf_path.to_path_buf(),
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            on_page(idx + 1, image)?;
            rendered += 1;
        }

        Ok(rendered)
    }
}
