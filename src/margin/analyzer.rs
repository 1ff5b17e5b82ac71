//! Page analyzer
//!
//! One deterministic pass over a rendered page: margin regions first, then
//! whitespace gaps.

use tracing::trace;

use super::gaps::find_whitespace_gaps;
use super::region::{analyze_margin_region, scan_regions};
use super::types::{MarginOptions, PageAnalysis, RenderedPage};

/// Margin & whitespace analyzer
///
/// Holds the (read-only) options; `analyze_page` may be called from several
/// threads at once.
#[derive(Debug, Clone)]
pub struct MarginAnalyzer {
    options: MarginOptions,
}

impl MarginAnalyzer {
    pub fn new(options: MarginOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MarginOptions {
        &self.options
    }

    /// Analyze a single page (1-based `page_num`)
    pub fn analyze_page(&self, page: &RenderedPage, page_num: usize) -> PageAnalysis {
        analyze_page(page, page_num, &self.options)
    }
}

/// Analyze a single page for margin violations and whitespace gaps
pub fn analyze_page(page: &RenderedPage, page_num: usize, options: &MarginOptions) -> PageAnalysis {
    let (width_px, height_px) = (page.width(), page.height());
    let mut analysis = PageAnalysis::new(page_num, width_px, height_px);

    // Recomputed per page: twoside swaps sides by parity
    let bounds = options.margins_to_pixels(page_num, width_px, height_px);
    trace!(page = page_num, ?bounds, "margin boundaries");

    for region in scan_regions(options, &bounds, width_px, height_px) {
        if let Some(violation) = analyze_margin_region(page, &region, page_num, options) {
            analysis.violations.push(violation);
        }
    }

    if options.check_whitespace {
        analysis.whitespace_gaps.extend(find_whitespace_gaps(
            page,
            page_num,
            options,
            bounds.top,
            bounds.bottom_start,
        ));
    }

    analysis
}
