//! Progress-callback trait for per-file and per-page events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to follow a
//! run as it walks the input folder. The CLI renders these events as a
//! progress bar plus one line per page; library callers can forward them
//! anywhere.
//!
//! # Example
//!
//! ```rust
//! use pdf2pptx::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct SlideCounter {
//!     slides: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for SlideCounter {
//!     fn on_page_complete(&self, _file: &str, page_num: usize, page_count: usize, cropped: bool) {
//!         self.slides.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{page_count} ({})", if cropped { "cropped" } else { "full page" });
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(SlideCounter { slides: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the pipeline as it processes files and pages.
///
/// Events arrive strictly in order from a single thread; `Send + Sync` is
/// required only because the async entry point moves the run onto a
/// blocking worker. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after discovery, before any PDF is opened.
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called after a PDF is opened.
    ///
    /// * `file`       — display name of the PDF (file name)
    /// * `page_count` — pages in the document
    fn on_file_start(&self, file: &str, page_count: usize) {
        let _ = (file, page_count);
    }

    /// Called just before a page is rendered (1-indexed `page_num`).
    fn on_page_start(&self, file: &str, page_num: usize, page_count: usize) {
        let _ = (file, page_num, page_count);
    }

    /// Called when a page has been saved and appended to the deck.
    ///
    /// `cropped` is false when no content was detected and the full page
    /// was used.
    fn on_page_complete(&self, file: &str, page_num: usize, page_count: usize, cropped: bool) {
        let _ = (file, page_num, page_count, cropped);
    }

    /// Called after the last page of a PDF; the document is already closed.
    fn on_file_complete(&self, file: &str, page_count: usize) {
        let _ = (file, page_count);
    }

    /// Called once the deck has been written.
    fn on_run_complete(&self, deck_path: &Path, slide_count: usize) {
        let _ = (deck_path, slide_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
