//! Slide deck writer.
//!
//! [`SlideDeck`] collects one picture per slide and packages the result as
//! an Office Open XML presentation (`.pptx`): a zip archive of XML parts and
//! the embedded pictures. Slides use a single blank layout, so nothing but
//! the picture is visible.
//!
//! Picture bytes are copied into the deck as they are, which keeps the slide
//! picture byte-identical to the PNG written next to it.

mod parts;

use crate::config::SlidePlacement;
use crate::error::Pdf2PptxError;
use image::{ImageFormat, ImageReader};
use parts::PictureShape;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use tracing::{debug, info};
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Default slide width: 10 inches (4:3).
pub const SLIDE_WIDTH_EMU: i64 = 9_144_000;
/// Default slide height: 7.5 inches (4:3).
pub const SLIDE_HEIGHT_EMU: i64 = 6_858_000;

struct PictureSlide {
    data: Vec<u8>,
    extension: &'static str,
    shape: PictureShape,
}

/// An in-memory presentation made of picture slides.
pub struct SlideDeck {
    slides: Vec<PictureSlide>,
    slide_width: i64,
    slide_height: i64,
}

impl Default for SlideDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SlideDeck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlideDeck")
            .field("slides", &self.slides.len())
            .field("slide_width", &self.slide_width)
            .field("slide_height", &self.slide_height)
            .finish()
    }
}

impl SlideDeck {
    /// An empty 4:3 deck.
    pub fn new() -> Self {
        Self {
            slides: Vec::new(),
            slide_width: SLIDE_WIDTH_EMU,
            slide_height: SLIDE_HEIGHT_EMU,
        }
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Slide width and height in EMU.
    pub fn slide_size(&self) -> (i64, i64) {
        (self.slide_width, self.slide_height)
    }

    /// Append a slide showing the PNG or JPEG at `image_path`.
    ///
    /// The picture's top-left corner and height come from `placement`; its
    /// width keeps the image's aspect ratio. Returns the 1-indexed number of
    /// the new slide.
    pub fn add_picture_slide(
        &mut self,
        image_path: &Path,
        placement: &SlidePlacement,
    ) -> Result<usize, Pdf2PptxError> {
        let fail = |detail: String| Pdf2PptxError::DeckWriteFailed {
            path: image_path.to_path_buf(),
            detail,
        };

        let data = std::fs::read(image_path)
            .map_err(|e| fail(format!("cannot read picture: {e}")))?;
        let reader = ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(|e| fail(format!("cannot sniff picture format: {e}")))?;
        let extension = match reader.format() {
            Some(ImageFormat::Png) => "png",
            Some(ImageFormat::Jpeg) => "jpeg",
            other => return Err(fail(format!("unsupported picture format {other:?}"))),
        };
        let (width_px, height_px) = reader
            .into_dimensions()
            .map_err(|e| fail(format!("cannot read picture size: {e}")))?;

        let descr = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let shape = PictureShape {
            descr,
            x: placement.left_emu,
            y: placement.top_emu,
            cx: placement.scaled_width_emu(width_px, height_px),
            cy: placement.height_emu,
        };

        self.slides.push(PictureSlide {
            data,
            extension,
            shape,
        });
        let slide_num = self.slides.len();
        debug!(
            "Slide {}: {} ({}x{} px)",
            slide_num,
            image_path.display(),
            width_px,
            height_px
        );
        Ok(slide_num)
    }

    /// Package the deck as `.pptx` bytes.
    pub fn to_bytes(&self) -> ZipResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let xml = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let media = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let count = self.slides.len();

        put(&mut zip, "[Content_Types].xml", parts::content_types_xml(count).as_bytes(), xml)?;
        put(&mut zip, "_rels/.rels", parts::root_rels_xml().as_bytes(), xml)?;
        put(
            &mut zip,
            "ppt/presentation.xml",
            parts::presentation_xml(count, self.slide_width, self.slide_height).as_bytes(),
            xml,
        )?;
        put(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            parts::presentation_rels_xml(count).as_bytes(),
            xml,
        )?;
        put(
            &mut zip,
            "ppt/slideMasters/slideMaster1.xml",
            parts::SLIDE_MASTER_XML.as_bytes(),
            xml,
        )?;
        put(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            parts::slide_master_rels_xml().as_bytes(),
            xml,
        )?;
        put(
            &mut zip,
            "ppt/slideLayouts/slideLayout1.xml",
            parts::SLIDE_LAYOUT_XML.as_bytes(),
            xml,
        )?;
        put(
            &mut zip,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            parts::slide_layout_rels_xml().as_bytes(),
            xml,
        )?;
        put(&mut zip, "ppt/theme/theme1.xml", parts::THEME_XML.as_bytes(), xml)?;
        put(&mut zip, "ppt/presProps.xml", parts::PRES_PROPS_XML.as_bytes(), xml)?;
        put(&mut zip, "ppt/viewProps.xml", parts::VIEW_PROPS_XML.as_bytes(), xml)?;
        put(&mut zip, "ppt/tableStyles.xml", parts::TABLE_STYLES_XML.as_bytes(), xml)?;

        for (idx, slide) in self.slides.iter().enumerate() {
            let n = idx + 1;
            let media_name = format!("image{n}.{}", slide.extension);
            put(
                &mut zip,
                &format!("ppt/slides/slide{n}.xml"),
                parts::slide_xml(&slide.shape).as_bytes(),
                xml,
            )?;
            put(
                &mut zip,
                &format!("ppt/slides/_rels/slide{n}.xml.rels"),
                parts::slide_rels_xml(&media_name).as_bytes(),
                xml,
            )?;
            put(&mut zip, &format!("ppt/media/{media_name}"), &slide.data, media)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Write the deck to `path`, replacing any existing file.
    ///
    /// The bytes go to a sibling `.tmp` file first and are renamed into
    /// place, so an interrupted run never leaves a truncated deck behind.
    pub fn save(&self, path: &Path) -> Result<(), Pdf2PptxError> {
        let fail = |detail: String| Pdf2PptxError::DeckWriteFailed {
            path: path.to_path_buf(),
            detail,
        };

        let bytes = self.to_bytes().map_err(|e| fail(e.to_string()))?;
        let tmp = path.with_extension("pptx.tmp");
        std::fs::write(&tmp, &bytes).map_err(|e| fail(e.to_string()))?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(fail(e.to_string()));
        }

        info!(
            "Saved {} slides to {} ({} bytes)",
            self.slides.len(),
            path.display(),
            bytes.len()
        );
        Ok(())
    }
}

fn put<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    data: &[u8],
    options: SimpleFileOptions,
) -> ZipResult<()> {
    zip.start_file(name, options)?;
    zip.write_all(data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Read;
    use zip::ZipArchive;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(w, h, Rgb([200, 10, 10]))
            .save(&path)
            .unwrap();
        path
    }

    fn entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut s = String::new();
        archive
            .by_name(name)
            .unwrap_or_else(|_| panic!("missing {name}"))
            .read_to_string(&mut s)
            .unwrap();
        s
    }

    #[test]
    fn one_slide_per_picture_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut deck = SlideDeck::new();
        let placement = SlidePlacement::default();
        let a = write_png(dir.path(), "a_page_1.png", 40, 20);
        let b = write_png(dir.path(), "a_page_2.png", 20, 40);

        assert_eq!(deck.add_picture_slide(&a, &placement).unwrap(), 1);
        assert_eq!(deck.add_picture_slide(&b, &placement).unwrap(), 2);
        assert_eq!(deck.slide_count(), 2);

        let mut archive = ZipArchive::new(Cursor::new(deck.to_bytes().unwrap())).unwrap();
        let pres = entry(&mut archive, "ppt/presentation.xml");
        assert_eq!(pres.matches("<p:sldId ").count(), 2);

        let first = entry(&mut archive, "ppt/slides/slide1.xml");
        assert!(first.contains(r#"descr="a_page_1.png""#));
        assert!(first.contains(r#"<a:off x="914400" y="914400"/>"#));
        assert!(first.contains(r#"<a:ext cx="10058400" cy="5029200"/>"#));

        let second = entry(&mut archive, "ppt/slides/slide2.xml");
        assert!(second.contains(r#"<a:ext cx="2514600" cy="5029200"/>"#));
    }

    #[test]
    fn embedded_picture_matches_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "p.png", 8, 8);
        let mut deck = SlideDeck::new();
        deck.add_picture_slide(&path, &SlidePlacement::default())
            .unwrap();

        let mut archive = ZipArchive::new(Cursor::new(deck.to_bytes().unwrap())).unwrap();
        let mut embedded = Vec::new();
        archive
            .by_name("ppt/media/image1.png")
            .unwrap()
            .read_to_end(&mut embedded)
            .unwrap();
        assert_eq!(embedded, std::fs::read(&path).unwrap());
    }

    #[test]
    fn empty_deck_is_still_a_package() {
        let deck = SlideDeck::new();
        let mut archive = ZipArchive::new(Cursor::new(deck.to_bytes().unwrap())).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/theme/theme1.xml",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing {part}");
        }
        let presentation = entry(&mut archive, "ppt/presentation.xml");
        assert!(!presentation.contains("sldId "));

        let (cx, cy) = deck.slide_size();
        assert_eq!((cx, cy), (9_144_000, 6_858_000));
        assert!(presentation.contains(&format!(r#"<p:sldSz cx="{cx}" cy="{cy}"/>"#)));
    }

    #[test]
    fn non_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"not an image").unwrap();
        let err = SlideDeck::new()
            .add_picture_slide(&path, &SlidePlacement::default())
            .unwrap_err();
        assert!(matches!(err, Pdf2PptxError::DeckWriteFailed { .. }));
    }

    #[test]
    fn save_replaces_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Cropped_Images.pptx");
        std::fs::write(&out, b"stale").unwrap();

        let png = write_png(dir.path(), "x.png", 3, 3);
        let mut deck = SlideDeck::new();
        deck.add_picture_slide(&png, &SlidePlacement::default())
            .unwrap();
        deck.save(&out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        assert!(!dir.path().join("Cropped_Images.pptx.tmp").exists());
    }
}
