//! Error types for the pdf-bandcrop library.
//!
//! Two distinct error types reflect the two stages' different failure
//! policies:
//!
//! * [`BandCropError`]: **fatal**, the run cannot proceed at all (source
//!   directory missing, corrupt PDF, pdfium unavailable, output directory
//!   cannot be prepared). The rasterizer returns it for *any* document
//!   failure, so one bad PDF halts the whole batch.
//!
//! * [`ImageError`]: **non-fatal**, a single page image could not be
//!   decoded or one of its crops could not be written. Stored inside
//!   [`crate::output::ImageStatus`]; the extractor logs it and moves on to
//!   the next image.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-bandcrop library.
#[derive(Debug, Error)]
pub enum BandCropError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The configured source or working directory does not exist.
    #[error("Directory not found: '{path}'\nCheck the path exists and is a directory.")]
    DirectoryNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The glob pattern used to enumerate inputs is malformed.
    #[error("Invalid file pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for '{path}' page {page}: {detail}")]
    RasterisationFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not remove, create or write into an output location.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rendered page could not be JPEG-encoded.
    #[error("Failed to encode '{path}': {source}")]
    EncodeFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The output directory exists and the policy forbids reusing it.
    #[error("Output directory '{path}' already exists\nRemove it or choose --output-policy clean|append.")]
    OutputExists { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
pdfium is looked up in this order:\n\
  • PDFIUM_LIB_PATH=/dir/containing/libpdfium\n\
  • the current working directory\n\
  • the system library search path\n"
    )]
    PdfiumBindingFailed(String),
}

/// A non-fatal error for a single page image.
///
/// Stored in [`crate::output::ImageStatus`]; the extraction run continues.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// The raster file could not be opened or decoded.
    #[error("Could not read '{file}': {detail}")]
    Unreadable { file: String, detail: String },

    /// A crop could not be JPEG-encoded.
    #[error("Encoding crop {index} of '{file}' failed: {detail}")]
    EncodeFailed {
        file: String,
        index: usize,
        detail: String,
    },

    /// A crop could not be written to disk.
    #[error("Writing '{path}' failed: {detail}")]
    WriteFailed { path: PathBuf, detail: String },

    /// Processing panicked; the panic was contained to this image.
    #[error("Processing '{file}' panicked: {detail}")]
    Panicked { file: String, detail: String },
}
