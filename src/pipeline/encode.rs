//! Image output: cropped page → PNG file in the output folder.
//!
//! PNG keeps rendered text lossless; the same bytes are later embedded in the
//! deck, so the file on disk and the slide picture are identical.

use crate::error::Pdf2PptxError;
use image::RgbImage;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// File name for page `page_num` (1-indexed) of the PDF with stem `stem`.
pub fn page_image_name(stem: &str, page_num: usize) -> String {
    format!("{stem}_page_{page_num}.png")
}

/// Encode `img` as PNG in memory.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Encode `img` and write it to `path`, replacing any previous file.
pub fn save_png(img: &RgbImage, path: &Path) -> Result<(), Pdf2PptxError> {
    let bytes = encode_png(img).map_err(|e| Pdf2PptxError::ImageWriteFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    std::fs::write(path, &bytes).map_err(|e| Pdf2PptxError::ImageWriteFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
