//! Pipeline stages for PDF-to-deck conversion.
//!
//! Each submodule implements one step. The render step is a producer and the
//! assemble step a consumer; they meet at the [`PageSink`] trait, so a
//! different consumer (batching, parallel cropping) can be swapped in without
//! touching rendering or cropping.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ render ──▶ crop ──▶ encode ──▶ deck
//! (**/*.pdf)  (pdfium)   (contours) (PNG)    (slide)
//!             producer   └────────── assemble (sink) ──────┘
//! ```
//!
//! 1. [`discover`] — recursive, sorted `*.pdf` scan plus magic-byte check
//! 2. [`render`]   — [`render::PageProducer`], one open document at a time
//! 3. [`crop`]     — threshold, contours, largest bounding box
//! 4. [`encode`]   — `<stem>_page_<n>.png` in the output folder
//! 5. [`assemble`] — [`assemble::DeckAssembler`], the standard sink

pub mod assemble;
pub mod crop;
pub mod discover;
pub mod encode;
pub mod render;

use crate::error::Pdf2PptxError;
use render::RenderedPage;

/// Consumer side of the pipeline: receives rendered pages in order.
///
/// Returning an error stops the producer immediately.
pub trait PageSink {
    fn accept(&mut self, page: RenderedPage) -> Result<(), Pdf2PptxError>;
}

impl<F> PageSink for F
where
    F: FnMut(RenderedPage) -> Result<(), Pdf2PptxError>,
{
    fn accept(&mut self, page: RenderedPage) -> Result<(), Pdf2PptxError> {
        self(page)
    }
}
