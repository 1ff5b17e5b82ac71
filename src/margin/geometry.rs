//! Page geometry: margins per page and their pixel boundaries

use serde::Serialize;

use super::types::MarginOptions;

/// Margin widths for one page side-resolved (inches)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Margin boundaries in pixel coordinates of a rendered page
///
/// `left` and `top` are the widths of the left and top margins; `right_start`
/// and `bottom_start` are the first column/row of the right and bottom margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarginPixels {
    pub left: u32,
    pub right_start: u32,
    pub top: u32,
    pub bottom_start: u32,
}

/// Truncating inch-to-pixel conversion, saturating at zero
#[inline]
fn to_px(inches: f64, ppi: f64) -> u32 {
    let px = inches * ppi;
    if px.is_finite() && px > 0.0 {
        px as u32
    } else {
        0
    }
}

impl MarginOptions {
    /// Get margins for a 1-based page number
    ///
    /// In twoside documents odd pages (recto) put the gutter on the left and
    /// even pages (verso) put it on the right.
    pub fn margins_for_page(&self, page_num: usize) -> PageMargins {
        let (left, right) = if self.twoside && page_num % 2 == 0 {
            (self.outer_margin_in, self.inner_margin_in)
        } else {
            (self.inner_margin_in, self.outer_margin_in)
        };

        PageMargins {
            left,
            right,
            top: self.top_margin_in,
            bottom: self.bottom_margin_in,
        }
    }

    /// Pixels per inch along each axis for a rendered page
    pub fn pixels_per_inch(&self, width_px: u32, height_px: u32) -> (f64, f64) {
        (
            width_px as f64 / self.page_width_in,
            height_px as f64 / self.page_height_in,
        )
    }

    /// Convert a page's margins to pixel boundaries
    ///
    /// Left/top widths are truncated; right/bottom starts are the page size
    /// minus a truncated width, which can differ by one pixel from truncating
    /// the start coordinate directly.
    pub fn margins_to_pixels(&self, page_num: usize, width_px: u32, height_px: u32) -> MarginPixels {
        let margins = self.margins_for_page(page_num);
        let (ppi_x, ppi_y) = self.pixels_per_inch(width_px, height_px);

        MarginPixels {
            left: to_px(margins.left, ppi_x).min(width_px),
            right_start: width_px.saturating_sub(to_px(margins.right, ppi_x)),
            top: to_px(margins.top, ppi_y).min(height_px),
            bottom_start: height_px.saturating_sub(to_px(margins.bottom, ppi_y)),
        }
    }
}
