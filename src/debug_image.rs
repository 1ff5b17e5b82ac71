//! Debug overlay images
//!
//! Draws margin boundaries and findings over a rendered page so a reviewer
//! can see what the analyzer flagged.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::margin::{BoundingBox, MarginOptions, PageAnalysis, RenderedPage, Severity};

/// Margin boundary lines (light blue)
pub const MARGIN_LINE_COLOR: Rgb<u8> = Rgb([100, 100, 255]);
pub const MARGIN_LINE_WIDTH: u32 = 2;

/// Outline width for violation and gap boxes
pub const FINDING_OUTLINE_WIDTH: u32 = 3;

/// Debug image error types
#[derive(Debug, Error)]
pub enum DebugImageError {
    #[error("Failed to save debug image {path}: {reason}")]
    SaveFailed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DebugImageError>;

/// Outline color for a margin violation
pub fn violation_color(severity: Severity) -> Rgb<u8> {
    match severity {
        Severity::High => Rgb([255, 0, 0]),
        Severity::Medium => Rgb([255, 165, 0]),
        Severity::Low => Rgb([255, 255, 0]),
    }
}

/// Outline color for a whitespace gap (purple shades)
pub fn gap_color(severity: Severity) -> Rgb<u8> {
    match severity {
        Severity::High => Rgb([180, 0, 255]),
        Severity::Medium => Rgb([210, 120, 255]),
        Severity::Low => Rgb([235, 200, 255]),
    }
}

/// File name for a page's overlay, e.g. `page_0007_violations.png`
pub fn debug_image_name(page_num: usize) -> String {
    format!("page_{:04}_violations.png", page_num)
}

/// Draw an outline of `width` pixels inside the inclusive box corners
fn draw_box(img: &mut RgbImage, bbox: &BoundingBox, width: u32, color: Rgb<u8>) {
    let (img_w, img_h) = img.dimensions();
    if img_w == 0 || img_h == 0 {
        return;
    }

    let x1 = bbox.x1.min(img_w - 1);
    let y1 = bbox.y1.min(img_h - 1);
    let x2 = bbox.x2.min(img_w - 1).max(x1);
    let y2 = bbox.y2.min(img_h - 1).max(y1);

    for inset in 0..width {
        if x1 + inset > x2.saturating_sub(inset) || y1 + inset > y2.saturating_sub(inset) {
            break;
        }
        let rect = Rect::at((x1 + inset) as i32, (y1 + inset) as i32)
            .of_size(x2 - x1 + 1 - 2 * inset, y2 - y1 + 1 - 2 * inset);
        draw_hollow_rect_mut(img, rect, color);
    }
}

/// Render the overlay for one page
pub fn render_overlay(
    page: &RenderedPage,
    analysis: &PageAnalysis,
    options: &MarginOptions,
) -> RgbImage {
    let mut img = image::DynamicImage::ImageLuma8(page.image().clone()).to_rgb8();
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img;
    }

    let bounds = options.margins_to_pixels(analysis.page_num, width, height);

    // Boundary lines, kept on the page when a boundary sits on the edge
    for x in [bounds.left, bounds.right_start] {
        let x = x.min(width.saturating_sub(MARGIN_LINE_WIDTH));
        let rect = Rect::at(x as i32, 0).of_size(MARGIN_LINE_WIDTH.min(width), height);
        draw_filled_rect_mut(&mut img, rect, MARGIN_LINE_COLOR);
    }
    for y in [bounds.top, bounds.bottom_start] {
        let y = y.min(height.saturating_sub(MARGIN_LINE_WIDTH));
        let rect = Rect::at(0, y as i32).of_size(width, MARGIN_LINE_WIDTH.min(height));
        draw_filled_rect_mut(&mut img, rect, MARGIN_LINE_COLOR);
    }

    for violation in &analysis.violations {
        draw_box(
            &mut img,
            &violation.bbox,
            FINDING_OUTLINE_WIDTH,
            violation_color(violation.severity),
        );
    }

    // Gap boxes carry an exclusive lower edge
    for gap in &analysis.whitespace_gaps {
        let bbox = BoundingBox::new(
            gap.bbox.x1,
            gap.bbox.y1,
            gap.bbox.x2.saturating_sub(1),
            gap.bbox.y2.saturating_sub(1),
        );
        draw_box(&mut img, &bbox, FINDING_OUTLINE_WIDTH, gap_color(gap.severity));
    }

    img
}

/// Render and save the overlay for a page into `output_dir`
pub fn save_debug_image(
    page: &RenderedPage,
    analysis: &PageAnalysis,
    options: &MarginOptions,
    output_dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join(debug_image_name(analysis.page_num));
    render_overlay(page, analysis, options)
        .save(&path)
        .map_err(|e| DebugImageError::SaveFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    debug!(page = analysis.page_num, path = %path.display(), "saved debug image");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::margin::{MarginSide, MarginViolation, WhitespaceGap};
    use tempfile::tempdir;

    fn letter_options() -> MarginOptions {
        MarginOptions::builder()
            .page_size(8.5, 11.0)
            .margins(0.75, 0.75, 0.75, 0.75)
            .twoside(false)
            .build()
    }

    fn analysis_with_findings() -> PageAnalysis {
        let mut analysis = PageAnalysis::new(3, 1275, 1650);
        analysis.violations.push(MarginViolation {
            page_num: 3,
            side: MarginSide::Left,
            pixel_count: 2500,
            percentage: 1.35,
            bbox: BoundingBox::new(10, 20, 49, 69),
            severity: Severity::High,
        });
        analysis.whitespace_gaps.push(WhitespaceGap {
            page_num: 3,
            height_px: 300,
            height_in: 2.0,
            bbox: BoundingBox::new(0, 600, 1275, 900),
            severity: Severity::Medium,
        });
        analysis
    }

    #[test]
    fn test_debug_image_name() {
        assert_eq!(debug_image_name(7), "page_0007_violations.png");
        assert_eq!(debug_image_name(12345), "page_12345_violations.png");
    }

    #[test]
    fn test_overlay_draws_margins_and_findings() {
        let page = RenderedPage::filled(1275, 1650, 255);
        let overlay = render_overlay(&page, &analysis_with_findings(), &letter_options());

        assert_eq!(overlay.dimensions(), (1275, 1650));

        // Left margin boundary at x=112
        assert_eq!(*overlay.get_pixel(112, 800), MARGIN_LINE_COLOR);
        assert_eq!(*overlay.get_pixel(113, 800), MARGIN_LINE_COLOR);
        // Violation outline, 3px wide from the box corner
        assert_eq!(*overlay.get_pixel(10, 40), Rgb([255, 0, 0]));
        assert_eq!(*overlay.get_pixel(12, 40), Rgb([255, 0, 0]));
        assert_eq!(*overlay.get_pixel(13, 40), Rgb([255, 255, 255]));
        // Gap outline on its last included row
        assert_eq!(*overlay.get_pixel(640, 899), Rgb([210, 120, 255]));
        // Untouched background stays white
        assert_eq!(*overlay.get_pixel(640, 300), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_overlay_keeps_page_content() {
        let mut img = image::GrayImage::from_pixel(200, 300, image::Luma([255]));
        img.put_pixel(150, 150, image::Luma([0]));
        let page = RenderedPage::new(img);
        let options = MarginOptions::builder().page_size(2.0, 3.0).build();
        let overlay = render_overlay(&page, &PageAnalysis::new(1, 200, 300), &options);

        assert_eq!(*overlay.get_pixel(150, 150), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_tiny_boxes_do_not_panic() {
        let page = RenderedPage::filled(4, 4, 255);
        let mut analysis = PageAnalysis::new(1, 4, 4);
        analysis.violations.push(MarginViolation {
            page_num: 1,
            side: MarginSide::Top,
            pixel_count: 1,
            percentage: 100.0,
            bbox: BoundingBox::new(3, 3, 3, 3),
            severity: Severity::Low,
        });
        let options = MarginOptions::builder().page_size(1.0, 1.0).build();

        let overlay = render_overlay(&page, &analysis, &options);
        assert_eq!(*overlay.get_pixel(3, 3), Rgb([255, 255, 0]));
    }

    #[test]
    fn test_save_debug_image() {
        let dir = tempdir().unwrap();
        let out_dir = dir.path().join("debug");
        let page = RenderedPage::filled(1275, 1650, 255);

        let path =
            save_debug_image(&page, &analysis_with_findings(), &letter_options(), &out_dir).unwrap();

        assert_eq!(path, out_dir.join("page_0003_violations.png"));
        let saved = image::open(&path).unwrap().to_rgb8();
        assert_eq!(saved.dimensions(), (1275, 1650));
    }

    #[test]
    fn test_colors() {
        assert_eq!(violation_color(Severity::Medium), Rgb([255, 165, 0]));
        assert_eq!(gap_color(Severity::High), Rgb([180, 0, 255]));
        assert_eq!(gap_color(Severity::Low), Rgb([235, 200, 255]));
    }
}
