//! Error type for the pdf2pptx library.
//!
//! Every failure is fatal for the run: one unreadable PDF or one page that
//! fails to render aborts the whole batch. The only recovered case, a page
//! with no detectable content, is not an error at all; see
//! [`crate::pipeline::crop::CropOutcome`].

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2pptx library.
#[derive(Debug, Error)]
pub enum Pdf2PptxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The configured input folder does not exist or is not a directory.
    #[error("Input folder not found: '{path}'\nCheck the path exists and is a directory.")]
    InputDirNotFound { path: PathBuf },

    /// The recursive `*.pdf` scan could not be performed.
    #[error("Failed to scan for PDFs with pattern '{pattern}': {detail}")]
    Discovery { pattern: String, detail: String },

    /// A discovered PDF vanished before it could be opened.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file has a `.pdf` extension but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not parse the document.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The document is encrypted; pdf2pptx never supplies passwords.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page} of '{path}': {detail}")]
    RasterisationFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output folder.
    #[error("Failed to create output folder '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not encode or write a cropped page image.
    #[error("Failed to write page image '{path}': {detail}")]
    ImageWriteFailed { path: PathBuf, detail: String },

    /// Could not read a page image back, package the deck, or write it.
    #[error("Failed to write slide deck '{path}': {detail}")]
    DeckWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
The pdf2pptx binary installs the pinned PDFium release on start-up.\n\
When using the library directly you can:\n\
  • Run the pdf2pptx binary once to populate the cache.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<pdfium_cache::EngineError> for Pdf2PptxError {
    fn from(e: pdfium_cache::EngineError) -> Self {
        Pdf2PptxError::PdfiumBindingFailed(e.to_string())
    }
}
