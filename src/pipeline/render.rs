//! PDF rasterisation: the producer stage of the pipeline.
//!
//! [`PageProducer`] opens each PDF in turn, renders its pages in order at a
//! fixed DPI and hands every page to a [`PageSink`]. A document stays open
//! only while its own pages are rendered; it is released before the next
//! file is opened.
//!
//! pdfium renders pages at 72 points per inch, so the DPI becomes a uniform
//! scale factor of `dpi / 72`. The bitmap is flattened to RGB because the
//! cropper and the PNG output both work on three channels.

use crate::error::Pdf2PptxError;
use crate::pipeline::discover::{display_name, pdf_stem, validate_pdf};
use crate::pipeline::PageSink;
use crate::progress::ProgressCallback;
use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One rasterised page on its way to the sink.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub source: PathBuf,
    /// Stem of the source file, used for output names.
    pub stem: String,
    /// 1-indexed page number.
    pub page_num: usize,
    pub page_count: usize,
    pub image: RgbImage,
}

/// Renders every page of every file and feeds them to a sink.
pub struct PageProducer<'a> {
    pdfium: &'a Pdfium,
    render_config: PdfRenderConfig,
    progress: Option<ProgressCallback>,
}

impl<'a> PageProducer<'a> {
    pub fn new(pdfium: &'a Pdfium, dpi: u32) -> Self {
        let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);
        Self {
            pdfium,
            render_config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Render `files` in order into `sink`. Returns the total page count.
    pub fn run<S: PageSink + ?Sized>(
        &self,
        files: &[PathBuf],
        sink: &mut S,
    ) -> Result<usize, Pdf2PptxError> {
        let mut pages = 0;
        for path in files {
            pages += self.render_file(path, sink)?;
        }
        Ok(pages)
    }

    /// Render all pages of one PDF into `sink`. Returns its page count.
    pub fn render_file<S: PageSink + ?Sized>(
        &self,
        path: &Path,
        sink: &mut S,
    ) -> Result<usize, Pdf2PptxError> {
        validate_pdf(path)?;
        let name = display_name(path);
        let stem = pdf_stem(path);
        info!("Processing PDF file: {}", name);

        let page_count = {
            let document = self.open(path)?;
            let pages = document.pages();
            let page_count = pages.len() as usize;
            if let Some(cb) = &self.progress {
                cb.on_file_start(&name, page_count);
            }

            for (idx, page) in pages.iter().enumerate() {
                let page_num = idx + 1;
                debug!("Processing page {} of {}", page_num, page_count);
                if let Some(cb) = &self.progress {
                    cb.on_page_start(&name, page_num, page_count);
                }

                let image = self.rasterise(&page, path, page_num)?;
                sink.accept(RenderedPage {
                    source: path.to_path_buf(),
                    stem: stem.clone(),
                    page_num,
                    page_count,
                    image,
                })?;
            }
            page_count
        };

        info!("Finished processing {}", name);
        if let Some(cb) = &self.progress {
            cb.on_file_complete(&name, page_count);
        }
        Ok(page_count)
    }

    fn open(&self, path: &Path) -> Result<PdfDocument<'a>, Pdf2PptxError> {
        self.pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| match e {
                PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
                    Pdf2PptxError::PasswordRequired {
                        path: path.to_path_buf(),
                    }
                }
                other => Pdf2PptxError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: format!("{other:?}"),
                },
            })
    }

    fn rasterise(
        &self,
        page: &PdfPage,
        path: &Path,
        page_num: usize,
    ) -> Result<RgbImage, Pdf2PptxError> {
        let bitmap = page.render_with_config(&self.render_config).map_err(|e| {
            Pdf2PptxError::RasterisationFailed {
                path: path.to_path_buf(),
                page: page_num,
                detail: format!("{e:?}"),
            }
        })?;

        let image = bitmap.as_image().to_rgb8();
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}
