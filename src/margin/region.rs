//! Margin region scanning
//!
//! The four margins are described as a small fixed set of named rectangles
//! which all go through the same content counting routine.

use crate::util::percentage;

use super::geometry::MarginPixels;
use super::types::{
    BoundingBox, MarginOptions, MarginSide, MarginViolation, RenderedPage, Severity,
    HIGH_PERCENTAGE, HIGH_PIXEL_COUNT, MEDIUM_PERCENTAGE, MEDIUM_PIXEL_COUNT,
};

/// A half-open rectangle `[x1, x2) x [y1, y2)` tagged with its margin side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRegion {
    pub side: MarginSide,
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl ScanRegion {
    pub fn new(side: MarginSide, x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self {
            side,
            x1,
            y1,
            x2,
            y2,
        }
    }

    /// Clip to the page; `None` when nothing is left
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        let x2 = self.x2.min(width);
        let y2 = self.y2.min(height);
        if self.x1 >= x2 || self.y1 >= y2 {
            return None;
        }
        Some(Self { x2, y2, ..*self })
    }

    pub fn area(&self) -> u64 {
        u64::from(self.x2.saturating_sub(self.x1)) * u64::from(self.y2.saturating_sub(self.y1))
    }
}

/// Build the regions to scan on one page
///
/// Side regions stop short of the header/footer skip zones; the bottom margin
/// is split in two around the centered page number zone.
pub fn scan_regions(
    options: &MarginOptions,
    bounds: &MarginPixels,
    width_px: u32,
    height_px: u32,
) -> Vec<ScanRegion> {
    let top_skip = (bounds.top as f64 * options.top_skip_pct / 100.0) as u32;
    let bottom_margin_height = height_px.saturating_sub(bounds.bottom_start);
    let bottom_skip_start = height_px
        .saturating_sub((bottom_margin_height as f64 * options.bottom_skip_pct / 100.0) as u32);

    let page_num_start = (width_px as f64 * options.page_num_center_start_pct / 100.0) as u32;
    let page_num_end = (width_px as f64 * options.page_num_center_end_pct / 100.0) as u32;

    let mut regions = Vec::with_capacity(5);

    if options.check_left {
        regions.push(ScanRegion::new(
            MarginSide::Left,
            0,
            top_skip,
            bounds.left,
            bottom_skip_start,
        ));
    }

    if options.check_right {
        regions.push(ScanRegion::new(
            MarginSide::Right,
            bounds.right_start,
            top_skip,
            width_px,
            bottom_skip_start,
        ));
    }

    if options.check_bottom {
        regions.push(ScanRegion::new(
            MarginSide::Bottom,
            0,
            bounds.bottom_start,
            page_num_start,
            height_px,
        ));
        regions.push(ScanRegion::new(
            MarginSide::Bottom,
            page_num_end,
            bounds.bottom_start,
            width_px,
            height_px,
        ));
    }

    // Corners belong to the side margins
    if options.check_top {
        regions.push(ScanRegion::new(
            MarginSide::Top,
            bounds.left,
            0,
            bounds.right_start,
            bounds.top,
        ));
    }

    regions
}

/// Content statistics of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionContent {
    pub pixel_count: u32,
    /// Tight box in page coordinates (inclusive corners)
    pub bbox: Option<BoundingBox>,
}

/// Count pixels below `threshold` in a clamped region and track their extent
pub fn count_content(page: &RenderedPage, region: &ScanRegion, threshold: u8) -> RegionContent {
    let mut pixel_count = 0u32;
    let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
    let (mut max_x, mut max_y) = (0u32, 0u32);

    for y in region.y1..region.y2 {
        let row = page.row(y);
        let span = &row[region.x1 as usize..region.x2 as usize];
        let mut row_has_content = false;

        for (offset, &value) in span.iter().enumerate() {
            if value < threshold {
                let x = region.x1 + offset as u32;
                pixel_count += 1;
                row_has_content = true;
                min_x = min_x.min(x);
                max_x = max_x.max(x);
            }
        }

        if row_has_content {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    let bbox = (pixel_count > 0).then(|| BoundingBox::new(min_x, min_y, max_x, max_y));
    RegionContent { pixel_count, bbox }
}

/// Classify violation severity from pixel count and coverage
pub fn classify_severity(pixel_count: u32, percentage: f64) -> Severity {
    if percentage > HIGH_PERCENTAGE || pixel_count > HIGH_PIXEL_COUNT {
        Severity::High
    } else if percentage > MEDIUM_PERCENTAGE || pixel_count > MEDIUM_PIXEL_COUNT {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Analyze one margin region for content
///
/// Regions that are empty after clipping, or hold fewer content pixels than
/// `min_violation_pixels`, yield `None`.
pub fn analyze_margin_region(
    page: &RenderedPage,
    region: &ScanRegion,
    page_num: usize,
    options: &MarginOptions,
) -> Option<MarginViolation> {
    let region = region.clamp_to(page.width(), page.height())?;

    let content = count_content(page, &region, options.threshold);
    if content.pixel_count < options.min_violation_pixels {
        return None;
    }
    let bbox = content.bbox?;

    let percentage = percentage(content.pixel_count as usize, region.area() as usize);
    let severity = classify_severity(content.pixel_count, percentage);

    Some(MarginViolation {
        page_num,
        side: region.side,
        pixel_count: content.pixel_count,
        percentage,
        bbox,
        severity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn page_with_block(w: u32, h: u32, x: u32, y: u32, bw: u32, bh: u32) -> RenderedPage {
        let mut img = GrayImage::from_pixel(w, h, Luma([255]));
        for yy in y..y + bh {
            for xx in x..x + bw {
                img.put_pixel(xx, yy, Luma([0]));
            }
        }
        RenderedPage::new(img)
    }

    #[test]
    fn test_empty_region_has_no_violation() {
        let page = RenderedPage::filled(100, 100, 255);
        let region = ScanRegion::new(MarginSide::Left, 0, 0, 20, 100);

        for threshold in [1u8, 128, 250, 255] {
            for min in [0u32, 1, 50] {
                let opts = MarginOptions::builder()
                    .threshold(threshold)
                    .min_violation_pixels(min)
                    .build();
                assert!(analyze_margin_region(&page, &region, 1, &opts).is_none());
            }
        }
    }

    #[test]
    fn test_zero_area_region() {
        let page = page_with_block(100, 100, 0, 0, 10, 10);
        let opts = MarginOptions::builder().min_violation_pixels(0).build();

        let inverted = ScanRegion::new(MarginSide::Right, 50, 0, 40, 100);
        assert!(analyze_margin_region(&page, &inverted, 1, &opts).is_none());

        let off_page = ScanRegion::new(MarginSide::Bottom, 0, 200, 100, 300);
        assert!(analyze_margin_region(&page, &off_page, 1, &opts).is_none());
    }

    #[test]
    fn test_min_violation_pixels_boundary() {
        // 7x7 = 49 content pixels
        let page = page_with_block(100, 100, 2, 2, 7, 7);
        let region = ScanRegion::new(MarginSide::Left, 0, 0, 20, 100);

        let opts = MarginOptions::builder().min_violation_pixels(50).build();
        assert!(analyze_margin_region(&page, &region, 1, &opts).is_none());

        let opts = MarginOptions::builder().min_violation_pixels(49).build();
        let v = analyze_margin_region(&page, &region, 1, &opts).unwrap();
        assert_eq!(v.pixel_count, 49);
    }

    #[test]
    fn test_threshold_is_strict() {
        let page = RenderedPage::filled(10, 10, 250);
        let region = ScanRegion::new(MarginSide::Top, 0, 0, 10, 10);

        let opts = MarginOptions::builder()
            .threshold(250)
            .min_violation_pixels(1)
            .build();
        assert!(analyze_margin_region(&page, &region, 1, &opts).is_none());

        let opts = MarginOptions::builder()
            .threshold(251)
            .min_violation_pixels(1)
            .build();
        let v = analyze_margin_region(&page, &region, 1, &opts).unwrap();
        assert_eq!(v.pixel_count, 100);
        assert_eq!(v.percentage, 100.0);
    }

    #[test]
    fn test_bbox_translated_to_page_coordinates() {
        let page = page_with_block(200, 200, 150, 40, 10, 20);
        let region = ScanRegion::new(MarginSide::Right, 140, 10, 200, 190);
        let opts = MarginOptions::default();

        let v = analyze_margin_region(&page, &region, 3, &opts).unwrap();
        assert_eq!(v.page_num, 3);
        assert_eq!(v.side, MarginSide::Right);
        assert_eq!(v.pixel_count, 200);
        assert_eq!(v.bbox, BoundingBox::new(150, 40, 159, 59));
    }

    #[test]
    fn test_classify_severity_boundaries() {
        assert_eq!(classify_severity(5000, 5.0), Severity::Medium);
        assert_eq!(classify_severity(5001, 0.0), Severity::High);
        assert_eq!(classify_severity(0, 5.01), Severity::High);
        assert_eq!(classify_severity(1000, 1.0), Severity::Low);
        assert_eq!(classify_severity(1001, 0.0), Severity::Medium);
        assert_eq!(classify_severity(50, 1.01), Severity::Medium);
        assert_eq!(classify_severity(50, 0.5), Severity::Low);
    }

    #[test]
    fn test_severity_is_monotonic() {
        let percentages = [0.0, 0.5, 1.0, 1.5, 5.0, 5.5, 50.0];
        let counts = [0u32, 500, 1000, 1001, 5000, 5001, 100_000];

        for &p in &percentages {
            for pair in counts.windows(2) {
                assert!(classify_severity(pair[0], p) <= classify_severity(pair[1], p));
            }
        }
        for &c in &counts {
            for pair in percentages.windows(2) {
                assert!(classify_severity(c, pair[0]) <= classify_severity(c, pair[1]));
            }
        }
    }

    #[test]
    fn test_scan_regions_layout() {
        let opts = MarginOptions::default();
        let bounds = MarginPixels {
            left: 112,
            right_start: 807,
            top: 105,
            bottom_start: 1230,
        };

        let regions = scan_regions(&opts, &bounds, 900, 1350);
        assert_eq!(regions.len(), 5);
        assert_eq!(regions[0], ScanRegion::new(MarginSide::Left, 0, 0, 112, 1350));
        assert_eq!(regions[1], ScanRegion::new(MarginSide::Right, 807, 0, 900, 1350));
        assert_eq!(regions[2], ScanRegion::new(MarginSide::Bottom, 0, 1230, 360, 1350));
        assert_eq!(regions[3], ScanRegion::new(MarginSide::Bottom, 540, 1230, 900, 1350));
        assert_eq!(regions[4], ScanRegion::new(MarginSide::Top, 112, 0, 807, 105));
    }

    #[test]
    fn test_scan_regions_skip_zones() {
        let opts = MarginOptions::builder().skip_pct(50.0, 50.0).build();
        let bounds = MarginPixels {
            left: 100,
            right_start: 800,
            top: 100,
            bottom_start: 1200,
        };

        let regions = scan_regions(&opts, &bounds, 900, 1400);
        let left = regions[0];
        assert_eq!(left.y1, 50);
        assert_eq!(left.y2, 1300);
    }

    #[test]
    fn test_scan_regions_disabled_sides() {
        let opts = MarginOptions::builder()
            .sides(false, true, false, false)
            .build();
        let bounds = MarginPixels {
            left: 10,
            right_start: 90,
            top: 10,
            bottom_start: 90,
        };

        let regions = scan_regions(&opts, &bounds, 100, 100);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].side, MarginSide::Right);
    }
}
