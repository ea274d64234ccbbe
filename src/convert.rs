//! Conversion entry points.
//!
//! A run is strictly sequential: discover every PDF, render each page in
//! order, crop it, save it, append it to the deck, and finally write the
//! deck. The first failure aborts the run and no deck is written.
//!
//! [`convert_sync`] does the work on the calling thread. [`convert`] moves
//! the same work onto tokio's blocking pool, because pdfium and the image
//! processing are CPU-bound and must not stall the async executor.

use crate::config::ConversionConfig;
use crate::deck::SlideDeck;
use crate::error::Pdf2PptxError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::assemble::DeckAssembler;
use crate::pipeline::discover::discover_pdfs;
use crate::pipeline::render::PageProducer;
use pdfium_render::prelude::Pdfium;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert every PDF below `config.input_dir` into one slide deck.
///
/// Binds the pdfium library via [`pdfium_cache::bind_engine`]; the engine is
/// only needed when at least one PDF was found.
///
/// # Errors
/// Any unreadable PDF, rendering failure or write failure is fatal.
pub fn convert_sync(config: &ConversionConfig) -> Result<ConversionOutput, Pdf2PptxError> {
    run(config, None)
}

/// Like [`convert_sync`], with a pdfium binding the caller already holds.
pub fn convert_with_engine(
    pdfium: &Pdfium,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PptxError> {
    run(config, Some(pdfium))
}

/// Async wrapper around [`convert_sync`], run on the blocking pool.
///
/// # Example
/// ```rust,no_run
/// use pdf2pptx::{convert, ConversionConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ConversionConfig::builder().input_dir("scans").build()?;
///     let output = convert(&config).await?;
///     println!("{} slides in {}", output.slides.len(), output.deck_path.display());
///     Ok(())
/// }
/// ```
pub async fn convert(config: &ConversionConfig) -> Result<ConversionOutput, Pdf2PptxError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || convert_sync(&config))
        .await
        .map_err(|e| Pdf2PptxError::Internal(format!("Conversion task failed: {e}")))?
}

fn run(
    config: &ConversionConfig,
    engine: Option<&Pdfium>,
) -> Result<ConversionOutput, Pdf2PptxError> {
    let total_start = Instant::now();
    info!(
        "Starting conversion: {} → {}",
        config.input_dir.display(),
        config.output_dir.display()
    );

    // ── Step 1: Output folder ────────────────────────────────────────────
    std::fs::create_dir_all(&config.output_dir).map_err(|source| {
        Pdf2PptxError::OutputDirFailed {
            path: config.output_dir.clone(),
            source,
        }
    })?;

    // ── Step 2: Discover ─────────────────────────────────────────────────
    let files = discover_pdfs(&config.input_dir)?;
    if let Some(cb) = &config.progress_callback {
        cb.on_run_start(files.len());
    }

    let deck_path = config.deck_path();
    let mut stats = ConversionStats {
        pdf_files: files.len(),
        ..Default::default()
    };

    // ── Step 3: Render → crop → save → slide ─────────────────────────────
    let (deck, slides) = if files.is_empty() {
        warn!(
            "No PDF files found under {}; writing an empty deck",
            config.input_dir.display()
        );
        (SlideDeck::new(), Vec::new())
    } else {
        let bound;
        let pdfium = match engine {
            Some(p) => p,
            None => {
                bound = pdfium_cache::bind_engine()?;
                &bound
            }
        };

        let producer =
            PageProducer::new(pdfium, config.dpi).with_progress(config.progress_callback.clone());
        let mut assembler = DeckAssembler::new(&config.output_dir, config.placement)
            .with_progress(config.progress_callback.clone());

        let rendered = producer.run(&files, &mut assembler)?;
        debug!("Rendered {} pages from {} files", rendered, files.len());

        let counts = assembler.stats();
        stats.pages = counts.pages;
        stats.cropped_pages = counts.cropped_pages;
        stats.full_pages = counts.full_pages;
        assembler.into_parts()
    };

    // ── Step 4: Write the deck ───────────────────────────────────────────
    deck.save(&deck_path)?;
    info!("Presentation saved at {}", deck_path.display());
    if let Some(cb) = &config.progress_callback {
        cb.on_run_complete(&deck_path, deck.slide_count());
    }

    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Conversion complete: {} slides from {} PDFs ({} cropped, {} full page) in {}ms",
        deck.slide_count(),
        stats.pdf_files,
        stats.cropped_pages,
        stats.full_pages,
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        deck_path: absolute_or_given(deck_path),
        slides,
        stats,
    })
}

fn absolute_or_given(path: PathBuf) -> PathBuf {
    std::fs::canonicalize(&path).unwrap_or(path)
}
