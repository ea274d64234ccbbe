//! Result types returned by a conversion run.

use crate::pipeline::crop::CropRegion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The saved `.pptx` file.
    pub deck_path: PathBuf,
    /// One record per slide, in slide order.
    pub slides: Vec<SlideRecord>,
    pub stats: ConversionStats,
}

/// How one page became one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRecord {
    /// 1-indexed slide number in the deck.
    pub slide_num: usize,
    pub source_pdf: PathBuf,
    /// 1-indexed page number within `source_pdf`.
    pub page_num: usize,
    /// The PNG written for this page.
    pub image_path: PathBuf,
    pub rendered_width: u32,
    pub rendered_height: u32,
    /// `None` when no content was detected and the full page was kept.
    pub crop: Option<CropRegion>,
}

impl SlideRecord {
    /// Dimensions of the image placed on the slide.
    pub fn image_size(&self) -> (u32, u32) {
        match self.crop {
            Some(r) => (r.width, r.height),
            None => (self.rendered_width, self.rendered_height),
        }
    }
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub pdf_files: usize,
    pub pages: usize,
    /// Pages cropped to a detected content region.
    pub cropped_pages: usize,
    /// Pages kept whole because no contour was found.
    pub full_pages: usize,
    pub total_duration_ms: u64,
}
