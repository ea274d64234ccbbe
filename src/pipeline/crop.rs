//! Content cropping: find the largest block of ink on a page and cut it out.
//!
//! The steps are fixed: grayscale, adaptive Gaussian threshold (11 px block,
//! offset 2, inverted so ink becomes foreground), external contours only,
//! largest enclosed area, axis-aligned bounding box, crop. A page where no
//! contour survives (blank, or a flat colour) is returned untouched.
//!
//! Contour tracing itself is `imageproc`'s border-following implementation;
//! this module only picks the winner.

use image::{imageops, GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::filter::separable_filter_equal;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Side of the square neighbourhood the local threshold is computed over.
pub const THRESHOLD_BLOCK_SIZE: u32 = 11;

/// Subtracted from the local mean; a pixel is ink when it is at least this
/// much darker than its surroundings.
pub const THRESHOLD_OFFSET: i16 = 2;

/// Axis-aligned rectangle in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Whether the rectangle lies entirely inside a `width` × `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

/// A cropped page and the region it was cut from.
#[derive(Debug, Clone)]
pub struct CropOutcome {
    pub image: RgbImage,
    /// `None` when no contour was found and `image` is the whole page.
    pub region: Option<CropRegion>,
}

impl CropOutcome {
    pub fn is_cropped(&self) -> bool {
        self.region.is_some()
    }
}

/// Crop `page` to the bounding box of its largest external contour.
///
/// Falls back to an unmodified copy of `page` when nothing is detected.
pub fn crop_to_content(page: &RgbImage) -> CropOutcome {
    let gray = imageops::grayscale(page);
    let binary = threshold_adaptive_gaussian(&gray);

    match largest_external_contour_bounds(&binary) {
        Some(region) => {
            debug!(
                "Cropping {}x{} page to {}x{} at ({}, {})",
                page.width(),
                page.height(),
                region.width,
                region.height,
                region.x,
                region.y
            );
            let image =
                imageops::crop_imm(page, region.x, region.y, region.width, region.height).to_image();
            CropOutcome {
                image,
                region: Some(region),
            }
        }
        None => {
            debug!("No contours found, keeping the entire page");
            CropOutcome {
                image: page.clone(),
                region: None,
            }
        }
    }
}

/// Inverted adaptive threshold with a Gaussian-weighted local mean.
///
/// Output pixels are 255 where the source is at least [`THRESHOLD_OFFSET`]
/// darker than its neighbourhood and 0 elsewhere.
pub fn threshold_adaptive_gaussian(gray: &GrayImage) -> GrayImage {
    if gray.width() == 0 || gray.height() == 0 {
        return gray.clone();
    }

    let means = local_mean(gray);
    let mut binary = GrayImage::new(gray.width(), gray.height());
    for ((out, src), mean) in binary.pixels_mut().zip(gray.pixels()).zip(means.pixels()) {
        let ink = i16::from(src[0]) <= i16::from(mean[0]) - THRESHOLD_OFFSET;
        *out = Luma([if ink { 255 } else { 0 }]);
    }
    binary
}

/// Gaussian-weighted mean over the [`THRESHOLD_BLOCK_SIZE`] square around
/// each pixel, rounded back to 8 bits. Borders are replicated.
///
/// Both passes run on `f32` samples so the horizontal pass is not truncated
/// before the vertical one.
fn local_mean(gray: &GrayImage) -> GrayImage {
    let kernel = gaussian_kernel(THRESHOLD_BLOCK_SIZE, gaussian_sigma(THRESHOLD_BLOCK_SIZE));
    let samples: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
            Luma([f32::from(gray.get_pixel(x, y)[0])])
        });
    let blurred = separable_filter_equal(&samples, &kernel);

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let mean = blurred.get_pixel(x, y)[0].round().clamp(0.0, 255.0);
        Luma([mean as u8])
    })
}

/// Sigma OpenCV derives for a Gaussian kernel of `block_size` taps.
fn gaussian_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalised 1-D Gaussian of exactly `taps` weights (odd), centred.
fn gaussian_kernel(taps: u32, sigma: f32) -> Vec<f32> {
    let radius = (taps / 2) as i32;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Bounding box of the outermost contour enclosing the most area.
///
/// Ties keep the contour found first in raster order.
pub fn largest_external_contour_bounds(binary: &GrayImage) -> Option<CropRegion> {
    let contours: Vec<Contour<i32>> = find_contours(binary);

    let mut best: Option<(f64, &Contour<i32>)> = None;
    for contour in contours.iter().filter(|c| is_external(c)) {
        let area = enclosed_area(&contour.points);
        if best.map_or(true, |(best_area, _)| area > best_area) {
            best = Some((area, contour));
        }
    }

    let (area, contour) = best?;
    debug!(
        "Largest of {} contours encloses {:.0} px²",
        contours.len(),
        area
    );
    bounding_rect(&contour.points)
}

fn is_external(contour: &Contour<i32>) -> bool {
    matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none()
}

/// Shoelace area of the polygon traced by `points`.
fn enclosed_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y))
        .sum();
    (twice as f64 / 2.0).abs()
}

fn bounding_rect(points: &[Point<i32>]) -> Option<CropRegion> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    Some(CropRegion {
        x: min_x as u32,
        y: min_y as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn page(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, WHITE)
    }

    fn fill(img: &mut RgbImage, r: CropRegion, colour: Rgb<u8>) {
        for y in r.y..r.y + r.height {
            for x in r.x..r.x + r.width {
                img.put_pixel(x, y, colour);
            }
        }
    }

    fn rect(x: u32, y: u32, width: u32, height: u32) -> CropRegion {
        CropRegion {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn blank_page_is_returned_unchanged() {
        let blank = page(120, 90);
        let out = crop_to_content(&blank);
        assert!(!out.is_cropped());
        assert_eq!(out.image, blank);
    }

    #[test]
    fn flat_coloured_page_has_no_contours() {
        let grey = RgbImage::from_pixel(64, 48, Rgb([128, 128, 128]));
        let out = crop_to_content(&grey);
        assert_eq!(out.region, None);
        assert_eq!(out.image.as_raw(), grey.as_raw());
    }

    #[test]
    fn larger_of_two_blocks_wins() {
        let mut img = page(200, 160);
        let big = rect(20, 20, 60, 40);
        let small = rect(120, 100, 10, 10);
        fill(&mut img, big, BLACK);
        fill(&mut img, small, BLACK);

        let out = crop_to_content(&img);
        assert_eq!(out.region, Some(big));
        assert_eq!(out.image.dimensions(), (60, 40));
    }

    #[test]
    fn larger_block_wins_regardless_of_position() {
        let mut img = page(200, 160);
        let small = rect(10, 10, 12, 12);
        let big = rect(90, 70, 80, 50);
        fill(&mut img, small, BLACK);
        fill(&mut img, big, BLACK);

        assert_eq!(crop_to_content(&img).region, Some(big));
    }

    #[test]
    fn equal_blocks_resolve_to_first_in_raster_order() {
        let mut img = page(160, 160);
        let first = rect(10, 10, 30, 30);
        let second = rect(100, 100, 30, 30);
        fill(&mut img, second, BLACK);
        fill(&mut img, first, BLACK);

        assert_eq!(crop_to_content(&img).region, Some(first));
    }

    #[test]
    fn crop_preserves_original_colours() {
        let mut img = page(100, 100);
        let block = rect(30, 40, 20, 10);
        fill(&mut img, block, Rgb([200, 0, 0]));

        let out = crop_to_content(&img);
        assert_eq!(out.region, Some(block));
        assert!(out.image.pixels().all(|p| *p == Rgb([200, 0, 0])));
    }

    #[test]
    fn content_touching_the_edge_stays_in_bounds() {
        let mut img = page(100, 80);
        fill(&mut img, rect(0, 0, 30, 20), BLACK);

        let out = crop_to_content(&img);
        let region = out.region.expect("block should be detected");
        assert!(region.fits_within(100, 80));
        assert_eq!(region, rect(0, 0, 30, 20));
        assert!(out.image.width() <= img.width());
        assert!(out.image.height() <= img.height());
    }

    #[test]
    fn hole_borders_are_ignored() {
        // A thick frame: the outer border encloses everything, the inner
        // border is a hole and must not compete.
        let mut img = page(200, 200);
        fill(&mut img, rect(20, 20, 160, 160), BLACK);
        fill(&mut img, rect(40, 40, 120, 120), WHITE);

        assert_eq!(crop_to_content(&img).region, Some(rect(20, 20, 160, 160)));
    }

    #[test]
    fn threshold_marks_only_ink() {
        let mut gray = GrayImage::from_pixel(40, 40, Luma([255]));
        gray.put_pixel(20, 20, Luma([0]));

        let binary = threshold_adaptive_gaussian(&gray);
        assert_eq!(binary.get_pixel(20, 20)[0], 255);
        assert_eq!(binary.get_pixel(5, 5)[0], 0);
        assert_eq!(binary.get_pixel(21, 20)[0], 0);
    }

    #[test]
    fn sigma_matches_block_size_eleven() {
        assert!((gaussian_sigma(THRESHOLD_BLOCK_SIZE) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn kernel_spans_exactly_the_block() {
        let kernel = gaussian_kernel(THRESHOLD_BLOCK_SIZE, gaussian_sigma(THRESHOLD_BLOCK_SIZE));
        assert_eq!(kernel.len(), 11);
        assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        for i in 0..5 {
            assert_eq!(kernel[i], kernel[10 - i]);
            assert!(kernel[i] < kernel[i + 1]);
        }
    }

    #[test]
    fn local_mean_window_ends_five_pixels_out() {
        let flat = GrayImage::from_pixel(41, 41, Luma([100]));
        let baseline = local_mean(&flat).get_pixel(20, 20)[0];
        assert_eq!(baseline, 100);

        let with_column_at = |x: u32| {
            let mut img = flat.clone();
            for y in 0..img.height() {
                img.put_pixel(x, y, Luma([255]));
            }
            local_mean(&img).get_pixel(20, 20)[0]
        };

        // Six pixels away is outside the 11-pixel block.
        assert_eq!(with_column_at(26), baseline);
        assert_eq!(with_column_at(14), baseline);
        // Five pixels away is the last tap inside it.
        assert!(with_column_at(25) > baseline);
        assert!(with_column_at(15) > baseline);
    }

    #[test]
    fn shoelace_area_of_square_outline() {
        let square = [
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 4),
            Point::new(0, 4),
        ];
        assert_eq!(enclosed_area(&square), 16.0);
        assert_eq!(enclosed_area(&square[..2]), 0.0);
    }

    #[test]
    fn region_bounds_check() {
        assert!(rect(0, 0, 10, 10).fits_within(10, 10));
        assert!(!rect(5, 0, 10, 10).fits_within(10, 10));
        assert!(!rect(0, 0, 0, 10).fits_within(10, 10));
    }
}
