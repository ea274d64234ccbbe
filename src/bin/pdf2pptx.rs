//! CLI binary for pdf2pptx.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use pdf2pptx::pipeline::discover::discover_pdfs;
use pdf2pptx::{
    convert, ConversionConfig, ConversionOutput, ConversionProgressCallback, ProgressCallback,
    DEFAULT_DECK_NAME,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress on stdout: one bar counting PDF files, plus a line per
/// file and per page printed above it.
struct CliProgressCallback {
    bar: ProgressBar,
    cropped: AtomicUsize,
}

impl CliProgressCallback {
    /// The bar starts as a spinner; its length is set by `on_run_start`.
    fn new() -> Arc<Self> {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stdout());
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Looking for PDFs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            cropped: AtomicUsize::new(0),
        })
    }

    /// Print above the bar. `ProgressBar::println` drops the line when the
    /// bar is hidden (stdout not a terminal), so print through `suspend`.
    fn line(&self, msg: String) {
        self.bar.suspend(|| println!("{msg}"));
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_files: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_files as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
        self.line(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_files} PDF files"))
        ));
    }

    fn on_file_start(&self, file: &str, page_count: usize) {
        self.line(format!(
            "{} Processing PDF file: {}  {}",
            cyan("▸"),
            bold(file),
            dim(&format!("{page_count} pages"))
        ));
    }

    fn on_page_start(&self, file: &str, page_num: usize, page_count: usize) {
        self.bar
            .set_message(format!("{file} page {page_num}/{page_count}"));
    }

    fn on_page_complete(&self, _file: &str, page_num: usize, page_count: usize, cropped: bool) {
        let how = if cropped {
            self.cropped.fetch_add(1, Ordering::SeqCst);
            "cropped"
        } else {
            "full page"
        };
        self.line(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            page_count,
            dim(how),
        ));
    }

    fn on_file_complete(&self, _file: &str, _page_count: usize) {
        self.bar.inc(1);
    }

    fn on_run_complete(&self, deck_path: &Path, slide_count: usize) {
        self.bar.finish_and_clear();
        println!(
            "{} {} slides ({} cropped)  →  Presentation saved at {}",
            green("✔"),
            bold(&slide_count.to_string()),
            self.cropped.load(Ordering::SeqCst),
            bold(&deck_path.display().to_string()),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every PDF under ./scans → output/Cropped_Images.pptx
  pdf2pptx scans

  # Choose the output folder and deck name
  pdf2pptx scans -o decks --deck-name scans.pptx

  # Faster, coarser renders
  pdf2pptx --dpi 150 scans

  # Machine-readable summary of every slide
  pdf2pptx --json scans > slides.json

OUTPUT:
  <OUTPUT>/<stem>_page_<n>.png   one cropped image per PDF page
  <OUTPUT>/Cropped_Images.pptx   one slide per image, in file then page order

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips the download
  PDFIUM_CACHE_DIR        Override the default pdfium cache directory
  RUST_LOG                Tracing filter, e.g. pdf2pptx=debug

  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/pdf2pptx/pdfium-7690/. No manual library setup is required.
"#;

/// Crop PDF pages to their content and collect them into a PowerPoint deck.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2pptx",
    version,
    about = "Crop PDF pages to their content and collect them into a PowerPoint deck",
    long_about = "Render every page of every PDF below INPUT_DIR, crop each page to the \
bounding box of its largest block of content, save the crops as PNG files and place \
each one on its own slide of a PowerPoint presentation.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Folder searched recursively for *.pdf files.
    input_dir: PathBuf,

    /// Folder receiving page images and the deck (created if missing).
    #[arg(short, long, env = "PDF2PPTX_OUTPUT", default_value = "output")]
    output: PathBuf,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDF2PPTX_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// File name of the deck inside the output folder.
    #[arg(long, env = "PDF2PPTX_DECK_NAME", default_value = DEFAULT_DECK_NAME)]
    deck_name: String,

    /// Print a JSON summary (ConversionOutput) to stdout.
    #[arg(long, env = "PDF2PPTX_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2PPTX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2PPTX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2PPTX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Discover inputs ──────────────────────────────────────────────────
    // Done before the engine step so a folder without PDFs never needs
    // the network. The library discovers again inside `convert`.
    let files = discover_pdfs(&cli.input_dir).context("Failed to scan the input folder")?;

    // ── Ensure PDFium engine is available ────────────────────────────────
    // First run downloads the pinned release into the user cache; later
    // runs only check that the library is there.
    if needs_engine_install(&files, pdfium_cache::locate_engine().is_some()) {
        if !cli.quiet {
            // Keep stdout clean for the JSON document.
            let target = if cli.json {
                ProgressDrawTarget::stderr()
            } else {
                ProgressDrawTarget::stdout()
            };
            let dl_bar = ProgressBar::with_draw_target(Some(0), target);
            dl_bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(TICKS),
            );
            dl_bar.set_prefix("PDF engine");
            dl_bar.enable_steady_tick(Duration::from_millis(80));

            let bar = dl_bar.clone();
            tokio::task::block_in_place(|| {
                pdfium_cache::ensure_engine(Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }))
            })
            .context("Failed to install the PDFium engine")?;

            dl_bar.finish_with_message("ready ✓");
        } else {
            tokio::task::block_in_place(|| pdfium_cache::ensure_engine(None))
                .context("Failed to install the PDFium engine")?;
        }
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&config).await.context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        print_summary(&output);
    } else if !cli.quiet {
        println!(
            "   {}",
            dim(&format!(
                "{} PDFs  {} full page  {}ms total",
                output.stats.pdf_files, output.stats.full_pages, output.stats.total_duration_ms
            ))
        );
    }

    Ok(())
}

/// The engine is only installed when there is something to render and no
/// usable copy is present yet.
fn needs_engine_install(files: &[PathBuf], engine_present: bool) -> bool {
    !files.is_empty() && !engine_present
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .input_dir(&cli.input_dir)
        .output_dir(&cli.output)
        .dpi(cli.dpi)
        .deck_name(cli.deck_name.clone());
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid options")
}

fn print_summary(output: &ConversionOutput) {
    for slide in &output.slides {
        let (w, h) = slide.image_size();
        println!(
            "  slide {:>3}  {}  {}x{}{}",
            slide.slide_num,
            slide.image_path.display(),
            w,
            h,
            if slide.crop.is_none() { "  (full page)" } else { "" },
        );
    }
    println!(
        "Converted {} pages from {} PDFs in {}ms",
        output.stats.pages, output.stats.pdf_files, output.stats.total_duration_ms
    );
    println!("Presentation saved at {}", output.deck_path.display());
}
