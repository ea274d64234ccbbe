//! Configuration types for a PDF-to-deck run.
//!
//! Every path and constant the pipeline needs lives in [`ConversionConfig`],
//! built via [`ConversionConfigBuilder`]. Defaults reproduce the fixed
//! behaviour of the tool: 300 DPI renders, pictures placed one inch from the
//! top-left corner at 5.5 inches tall, deck saved as `Cropped_Images.pptx`.

use crate::error::Pdf2PptxError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// English Metric Units per inch, the OOXML length unit.
pub const EMU_PER_INCH: i64 = 914_400;

/// Default deck file name, written inside the output folder.
pub const DEFAULT_DECK_NAME: &str = "Cropped_Images.pptx";

/// Configuration for one conversion run.
///
/// # Example
/// ```rust
/// use pdf2pptx::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .input_dir("scans")
///     .output_dir("scans/deck")
///     .dpi(200)
///     .build()
///     .unwrap();
/// assert_eq!(config.deck_path(), std::path::Path::new("scans/deck/Cropped_Images.pptx"));
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Folder scanned recursively for `*.pdf` files. Default: `.`.
    pub input_dir: PathBuf,

    /// Folder receiving page PNGs and the deck; created if absent.
    /// Default: `output`.
    pub output_dir: PathBuf,

    /// Rendering DPI. Range: 72–600. Default: 300.
    ///
    /// Adaptive thresholding works on an 11 px neighbourhood, so the DPI
    /// also decides how large a gap between two marks still merges them into
    /// one contour.
    pub dpi: u32,

    /// File name of the deck inside `output_dir`. Default: `Cropped_Images.pptx`.
    pub deck_name: String,

    /// Where each picture lands on its slide.
    pub placement: SlidePlacement,

    /// Receives per-file and per-page events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
            dpi: 300,
            deck_name: DEFAULT_DECK_NAME.to_string(),
            placement: SlidePlacement::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("dpi", &self.dpi)
            .field("deck_name", &self.deck_name)
            .field("placement", &self.placement)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full path of the deck file.
    pub fn deck_path(&self) -> PathBuf {
        self.output_dir.join(&self.deck_name)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn input_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.input_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn deck_name(mut self, name: impl Into<String>) -> Self {
        self.config.deck_name = name.into();
        self
    }

    pub fn placement(mut self, placement: SlidePlacement) -> Self {
        self.config.placement = placement;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2PptxError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(Pdf2PptxError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if !c.deck_name.to_ascii_lowercase().ends_with(".pptx") {
            return Err(Pdf2PptxError::InvalidConfig(format!(
                "Deck name must end in .pptx, got '{}'",
                c.deck_name
            )));
        }
        let bare = Path::new(&c.deck_name)
            .file_name()
            .is_some_and(|n| n == c.deck_name.as_str());
        if !bare {
            return Err(Pdf2PptxError::InvalidConfig(format!(
                "Deck name must be a file name, not a path: '{}'",
                c.deck_name
            )));
        }
        if c.placement.height_emu <= 0 {
            return Err(Pdf2PptxError::InvalidConfig(
                "Picture height must be positive".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Position and height of the picture on each slide, in EMU.
///
/// Width is never configured: it follows from the image aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidePlacement {
    pub left_emu: i64,
    pub top_emu: i64,
    pub height_emu: i64,
}

impl SlidePlacement {
    /// Placement from inch measurements.
    pub fn from_inches(left: f64, top: f64, height: f64) -> Self {
        let emu = |inches: f64| (inches * EMU_PER_INCH as f64).round() as i64;
        Self {
            left_emu: emu(left),
            top_emu: emu(top),
            height_emu: emu(height),
        }
    }

    /// Picture width for an image of `width_px` × `height_px`, preserving
    /// its aspect ratio at the configured height.
    pub fn scaled_width_emu(&self, width_px: u32, height_px: u32) -> i64 {
        if height_px == 0 {
            return 0;
        }
        (self.height_emu as f64 * width_px as f64 / height_px as f64).round() as i64
    }
}

impl Default for SlidePlacement {
    /// One inch from the top-left corner, 5.5 inches tall.
    fn default() -> Self {
        Self::from_inches(1.0, 1.0, 5.5)
    }
}
