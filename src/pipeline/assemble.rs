//! The standard page consumer: crop, save, append a slide.

use crate::config::SlidePlacement;
use crate::deck::SlideDeck;
use crate::error::Pdf2PptxError;
use crate::output::{ConversionStats, SlideRecord};
use crate::pipeline::crop::crop_to_content;
use crate::pipeline::discover::display_name;
use crate::pipeline::encode::{page_image_name, save_png};
use crate::pipeline::render::RenderedPage;
use crate::pipeline::PageSink;
use crate::progress::ProgressCallback;
use std::path::{Path, PathBuf};
use tracing::info;

/// Turns each rendered page into a PNG in `output_dir` and a slide in the
/// deck, in arrival order.
pub struct DeckAssembler {
    output_dir: PathBuf,
    placement: SlidePlacement,
    deck: SlideDeck,
    records: Vec<SlideRecord>,
    cropped_pages: usize,
    progress: Option<ProgressCallback>,
}

impl DeckAssembler {
    /// `output_dir` must already exist.
    pub fn new(output_dir: impl AsRef<Path>, placement: SlidePlacement) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            placement,
            deck: SlideDeck::new(),
            records: Vec::new(),
            cropped_pages: 0,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn deck(&self) -> &SlideDeck {
        &self.deck
    }

    pub fn records(&self) -> &[SlideRecord] {
        &self.records
    }

    /// Page counters so far; duration and file count are left for the caller.
    pub fn stats(&self) -> ConversionStats {
        ConversionStats {
            pages: self.records.len(),
            cropped_pages: self.cropped_pages,
            full_pages: self.records.len() - self.cropped_pages,
            ..Default::default()
        }
    }

    pub fn into_parts(self) -> (SlideDeck, Vec<SlideRecord>) {
        (self.deck, self.records)
    }
}

impl PageSink for DeckAssembler {
    fn accept(&mut self, page: RenderedPage) -> Result<(), Pdf2PptxError> {
        let outcome = crop_to_content(&page.image);
        let image_path = self
            .output_dir
            .join(page_image_name(&page.stem, page.page_num));
        save_png(&outcome.image, &image_path)?;
        info!("Saved cropped image: {}", image_path.display());

        let slide_num = self.deck.add_picture_slide(&image_path, &self.placement)?;
        let cropped = outcome.is_cropped();
        if cropped {
            self.cropped_pages += 1;
        }
        self.records.push(SlideRecord {
            slide_num,
            source_pdf: page.source.clone(),
            page_num: page.page_num,
            image_path,
            rendered_width: page.image.width(),
            rendered_height: page.image.height(),
            crop: outcome.region,
        });

        if let Some(cb) = &self.progress {
            cb.on_page_complete(
                &display_name(&page.source),
                page.page_num,
                page.page_count,
                cropped,
            );
        }
        Ok(())
    }
}
