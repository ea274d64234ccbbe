//! End-to-end tests: real PDFs through pdfium into a real `.pptx`.
//!
//! The PDFs are generated on the fly, so no fixtures are needed. The tests
//! need a PDFium library (`PDFIUM_LIB_PATH`, the pdf2pptx cache, or a system
//! copy) and print `SKIP` when none can be bound.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test pipeline -- --nocapture

use pdf2pptx::{convert_with_engine, ConversionConfig, Pdf2PptxError};
use pdfium_render::prelude::{PdfRenderConfig, Pdfium};
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// The pdfium binding is process-global, so every test shares one. The
/// error text is kept so each skipped test can report it.
static ENGINE: OnceLock<Result<Pdfium, String>> = OnceLock::new();

/// Serialises the tests that drive the engine.
static ENGINE_LOCK: Mutex<()> = Mutex::new(());

/// The shared binding plus the lock guarding it, or `None` (after printing
/// `SKIP`) when no PDFium library can be bound.
fn engine() -> Option<(&'static Pdfium, MutexGuard<'static, ()>)> {
    match ENGINE.get_or_init(|| pdfium_cache::bind_engine().map_err(|e| e.to_string())) {
        Ok(pdfium) => {
            let guard = ENGINE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            Some((pdfium, guard))
        }
        Err(e) => {
            println!("SKIP — no PDFium library available: {e}");
            None
        }
    }
}

/// A filled black rectangle in PDF user space: x, y (from bottom), w, h.
type Rect = (u32, u32, u32, u32);

/// Build a PDF whose pages are `width` × `height` points. Each entry of
/// `pages` lists the rectangles painted on that page; an empty list gives a
/// blank page.
fn make_pdf(width: u32, height: u32, pages: &[&[Rect]]) -> Vec<u8> {
    let mut objects: Vec<String> = Vec::new();
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 3 + i * 2).collect();

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    ));
    for (i, rects) in pages.iter().enumerate() {
        let content_id = page_ids[i] + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width} {height}] /Contents {content_id} 0 R >>"
        ));
        let mut stream = String::from("0 g\n");
        for (x, y, w, h) in rects.iter() {
            stream.push_str(&format!("{x} {y} {w} {h} re f\n"));
        }
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ));
    }

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }
    let xref_at = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    ));
    pdf.into_bytes()
}

fn write(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

fn config(input: &Path, output: &Path) -> ConversionConfig {
    ConversionConfig::builder()
        .input_dir(input)
        .output_dir(output)
        .dpi(72)
        .build()
        .unwrap()
}

fn deck_part(deck: &Path, name: &str) -> String {
    let bytes = std::fs::read(deck).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("missing {name}"))
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn two_files_become_five_slides_in_order() {
    let Some((pdfium, _guard)) = engine() else {
        return;
    };
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(
        &input.path().join("a.pdf"),
        &make_pdf(200, 100, &[&[(20, 30, 50, 40)], &[(100, 10, 60, 60)]]),
    );
    write(
        &input.path().join("b.pdf"),
        &make_pdf(
            200,
            100,
            &[&[(10, 10, 20, 20)], &[(50, 50, 30, 30)], &[(5, 5, 150, 80)]],
        ),
    );

    let out = convert_with_engine(pdfium, &config(input.path(), output.path())).unwrap();

    let names: Vec<String> = out
        .slides
        .iter()
        .map(|s| s.image_path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "a_page_1.png",
            "a_page_2.png",
            "b_page_1.png",
            "b_page_2.png",
            "b_page_3.png"
        ]
    );
    for (i, slide) in out.slides.iter().enumerate() {
        assert_eq!(slide.slide_num, i + 1);
        assert!(slide.image_path.is_file());
    }
    assert_eq!(out.stats.pdf_files, 2);
    assert_eq!(out.stats.pages, 5);
    assert_eq!(out.stats.cropped_pages, 5);

    let pres = deck_part(&out.deck_path, "ppt/presentation.xml");
    assert_eq!(pres.matches("<p:sldId ").count(), 5);
    let third = deck_part(&out.deck_path, "ppt/slides/slide3.xml");
    assert!(third.contains(r#"descr="b_page_1.png""#));
    assert!(third.contains(r#"<a:off x="914400" y="914400"/>"#));
    assert!(third.contains(r#"cy="5029200""#));
}

#[test]
fn rectangle_is_cropped_tightly() {
    let Some((pdfium, _guard)) = engine() else {
        return;
    };
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    // 50×40 pt block whose top-left corner sits at (20, 30) in image space.
    write(
        &input.path().join("box.pdf"),
        &make_pdf(200, 100, &[&[(20, 30, 50, 40)]]),
    );

    let out = convert_with_engine(pdfium, &config(input.path(), output.path())).unwrap();
    let slide = &out.slides[0];
    let region = slide.crop.expect("rectangle should be detected");

    assert_eq!((slide.rendered_width, slide.rendered_height), (200, 100));
    assert!((18..=22).contains(&region.x), "{region:?}");
    assert!((28..=32).contains(&region.y), "{region:?}");
    assert!((48..=54).contains(&region.width), "{region:?}");
    assert!((38..=44).contains(&region.height), "{region:?}");
    assert_eq!(
        image::image_dimensions(&slide.image_path).unwrap(),
        (region.width, region.height)
    );
}

#[test]
fn blank_page_keeps_full_render() {
    let Some((pdfium, _guard)) = engine() else {
        return;
    };
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(
        &input.path().join("mixed.pdf"),
        &make_pdf(120, 90, &[&[], &[(10, 10, 30, 30)]]),
    );

    let out = convert_with_engine(pdfium, &config(input.path(), output.path())).unwrap();
    assert_eq!(out.slides.len(), 2);

    let blank = &out.slides[0];
    assert!(blank.crop.is_none());

    // The saved image is the render itself, pixel for pixel.
    let document = pdfium
        .load_pdf_from_file(&input.path().join("mixed.pdf"), None)
        .unwrap();
    let page = document.pages().get(0).unwrap();
    let render = page
        .render_with_config(&PdfRenderConfig::new().scale_page_by_factor(1.0))
        .unwrap()
        .as_image()
        .to_rgb8();
    let saved = image::open(&blank.image_path).unwrap().to_rgb8();
    assert_eq!(saved.dimensions(), (blank.rendered_width, blank.rendered_height));
    assert_eq!(saved.dimensions(), render.dimensions());
    assert!(saved.as_raw() == render.as_raw(), "saved page differs from the render");
    assert!(out.slides[1].crop.is_some());
    assert_eq!((out.stats.cropped_pages, out.stats.full_pages), (1, 1));
}

#[test]
fn rerun_overwrites_instead_of_appending() {
    let Some((pdfium, _guard)) = engine() else {
        return;
    };
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(
        &input.path().join("doc.pdf"),
        &make_pdf(100, 100, &[&[(10, 10, 40, 40)], &[(30, 30, 20, 20)]]),
    );
    let cfg = config(input.path(), output.path());

    let first = convert_with_engine(pdfium, &cfg).unwrap();
    let second = convert_with_engine(pdfium, &cfg).unwrap();
    assert_eq!(first.slides.len(), 2);
    assert_eq!(second.slides.len(), 2);

    let pres = deck_part(&second.deck_path, "ppt/presentation.xml");
    assert_eq!(pres.matches("<p:sldId ").count(), 2);
    let pngs = std::fs::read_dir(output.path())
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .path()
                .extension()
                .is_some_and(|x| x == "png")
        })
        .count();
    assert_eq!(pngs, 2);
}

#[test]
fn nested_folders_are_searched() {
    let Some((pdfium, _guard)) = engine() else {
        return;
    };
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(
        &input.path().join("2024/q1/late.pdf"),
        &make_pdf(100, 100, &[&[(10, 10, 40, 40)]]),
    );
    write(
        &input.path().join("early.pdf"),
        &make_pdf(100, 100, &[&[(10, 10, 40, 40)]]),
    );
    write(&input.path().join("readme.txt"), b"not a pdf");

    let out = convert_with_engine(pdfium, &config(input.path(), output.path())).unwrap();
    let sources: Vec<_> = out
        .slides
        .iter()
        .map(|s| s.source_pdf.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(sources, vec!["late.pdf", "early.pdf"]);
    assert!(output.path().join("late_page_1.png").is_file());
}

#[test]
fn fake_pdf_aborts_without_a_deck() {
    let Some((pdfium, _guard)) = engine() else {
        return;
    };
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(
        &input.path().join("a.pdf"),
        &make_pdf(100, 100, &[&[(10, 10, 40, 40)]]),
    );
    write(&input.path().join("b.pdf"), b"<html>not a pdf</html>");

    let err = convert_with_engine(pdfium, &config(input.path(), output.path())).unwrap_err();
    assert!(matches!(err, Pdf2PptxError::NotAPdf { .. }), "{err}");
    assert!(output.path().join("a_page_1.png").is_file());
    assert!(!output.path().join("Cropped_Images.pptx").exists());
}

#[test]
fn default_dpi_renders_at_300() {
    let Some((pdfium, _guard)) = engine() else {
        return;
    };
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(&input.path().join("one.pdf"), &make_pdf(72, 36, &[&[]]));
    let cfg = ConversionConfig::builder()
        .input_dir(input.path())
        .output_dir(output.path())
        .build()
        .unwrap();

    let out = convert_with_engine(pdfium, &cfg).unwrap();
    let slide = &out.slides[0];
    // 72 × 36 pt at 300 DPI, allowing pdfium one pixel of rounding.
    assert!((299..=300).contains(&slide.rendered_width), "{slide:?}");
    assert!((149..=150).contains(&slide.rendered_height), "{slide:?}");
    let xml = deck_part(&out.deck_path, "ppt/slides/slide1.xml");
    assert!(xml.contains(r#"cy="5029200""#));
}
