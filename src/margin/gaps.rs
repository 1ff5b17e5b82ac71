//! Whitespace gap detection
//!
//! Finds full-width runs of blank rows taller than a minimum height, e.g. a
//! float pushed to the next page leaving half a page empty.

use super::types::{BoundingBox, MarginOptions, RenderedPage, Severity, WhitespaceGap};

/// Classify gap severity relative to the configured minimum height
pub fn classify_gap_severity(height_in: f64, min_height_in: f64) -> Severity {
    if height_in >= min_height_in * 2.0 {
        Severity::High
    } else if height_in >= min_height_in * 1.5 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Minimum gap height in pixels for the given vertical resolution (at least 1)
pub fn min_gap_pixels(gap_min_height_in: f64, ppi_y: f64) -> u32 {
    let px = (gap_min_height_in * ppi_y).round_ties_even();
    if px.is_finite() && px >= 1.0 {
        px as u32
    } else {
        1
    }
}

/// Find full-width whitespace gaps
///
/// `top_px` and `bottom_start_px` bound the text block; they are ignored when
/// `gap_include_margins` is set. Near-blank scan areas (at least
/// `gap_skip_page_white_pct` percent white) report nothing.
pub fn find_whitespace_gaps(
    page: &RenderedPage,
    page_num: usize,
    options: &MarginOptions,
    top_px: u32,
    bottom_start_px: u32,
) -> Vec<WhitespaceGap> {
    let (width_px, height_px) = (page.width(), page.height());

    let (y_start, y_end) = if options.gap_include_margins {
        (0, height_px)
    } else {
        (top_px, bottom_start_px.min(height_px))
    };

    if y_start >= y_end || width_px == 0 {
        return Vec::new();
    }

    let threshold = options.threshold;

    // A row is white when no pixel across the full width is content
    let mut content_pixels = 0u64;
    let mut white_rows = Vec::with_capacity((y_end - y_start) as usize);
    for y in y_start..y_end {
        let row = page.row(y);
        let row_content = row.iter().filter(|&&v| v < threshold).count() as u64;
        content_pixels += row_content;
        white_rows.push(row_content == 0);
    }

    let total_pixels = u64::from(y_end - y_start) * u64::from(width_px);
    let white_pct = 100.0 * (1.0 - content_pixels as f64 / total_pixels as f64);
    if white_pct >= options.gap_skip_page_white_pct {
        return Vec::new();
    }

    let ppi_y = height_px as f64 / options.page_height_in;
    let min_gap_px = min_gap_pixels(options.gap_min_height_in, ppi_y);

    let make_gap = |run_start: usize, run_end: usize| -> Option<WhitespaceGap> {
        let run_len = (run_end - run_start) as u32;
        if run_len < min_gap_px {
            return None;
        }
        let height_in = run_len as f64 / ppi_y;
        Some(WhitespaceGap {
            page_num,
            height_px: run_len,
            height_in,
            bbox: BoundingBox::new(
                0,
                y_start + run_start as u32,
                width_px,
                y_start + run_end as u32,
            ),
            severity: classify_gap_severity(height_in, options.gap_min_height_in),
        })
    };

    let mut gaps = Vec::new();
    let mut run_start: Option<usize> = None;

    for (idx, &is_white) in white_rows.iter().enumerate() {
        match (is_white, run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                gaps.extend(make_gap(start, idx));
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        gaps.extend(make_gap(start, white_rows.len()));
    }

    gaps
}
