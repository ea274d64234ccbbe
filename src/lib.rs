//! # pdf2pptx
//!
//! Crop every page of a folder of PDFs to its content and collect the crops
//! into a PowerPoint deck, one picture per slide.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input folder
//!  │
//!  ├─ 1. Discover  every **/*.pdf, sorted by path
//!  ├─ 2. Render    each page via pdfium at 300 DPI (one document open at a time)
//!  ├─ 3. Crop      adaptive threshold → external contours → largest bounding box
//!  ├─ 4. Encode    <stem>_page_<n>.png in the output folder
//!  ├─ 5. Slide     picture at (1in, 1in), 5.5in tall, aspect ratio kept
//!  └─ 6. Save      <output>/Cropped_Images.pptx
//! ```
//!
//! A page with no detectable content is kept whole rather than dropped, so
//! the deck always has exactly one slide per page.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2pptx::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .input_dir("scans")
//!         .output_dir("scans/output")
//!         .build()?;
//!     let output = convert(&config).await?;
//!     eprintln!("{} slides ({} cropped) → {}",
//!         output.slides.len(),
//!         output.stats.cropped_pages,
//!         output.deck_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## PDFium
//!
//! Rendering needs the PDFium shared library. The `pdf2pptx` binary installs
//! the pinned release into the user cache on first run. Library callers get
//! whatever [`pdfium_cache::bind_engine`] finds: `PDFIUM_LIB_PATH`, then the
//! cache, then a system-wide copy.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2pptx` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2pptx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod deck;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, SlidePlacement, DEFAULT_DECK_NAME};
pub use convert::{convert, convert_sync, convert_with_engine};
pub use deck::SlideDeck;
pub use error::Pdf2PptxError;
pub use output::{ConversionOutput, ConversionStats, SlideRecord};
pub use pipeline::crop::{crop_to_content, CropOutcome, CropRegion};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
