//! Margin & Whitespace Analyzer
//!
//! Detects content bleeding into page margins (overfull boxes, oversized
//! figures) and oversized full-width blank bands in the text block of a
//! rendered page.
//!
//! # Features
//!
//! - Twoside geometry (inner/outer margins swap on even pages)
//! - Header/footer skip zones and a centered page number exclusion zone
//! - Severity classification by pixel count and coverage
//! - Whitespace gap detection with near-blank page skipping
//!
//! # Example
//!
//! ```rust
//! use bookcheck::{MarginAnalyzer, MarginOptions, RenderedPage};
//!
//! let options = MarginOptions::builder()
//!     .page_size(6.0, 9.0)
//!     .margins(0.75, 0.625, 0.7, 0.8)
//!     .check_whitespace(true)
//!     .build();
//!
//! let page = RenderedPage::filled(900, 1350, 255);
//! let analysis = MarginAnalyzer::new(options).analyze_page(&page, 1);
//!
//! assert!(!analysis.has_any_issues());
//! ```

// Submodules
mod analyzer;
mod gaps;
mod geometry;
mod region;
mod types;

// Re-export public API
pub use analyzer::{analyze_page, MarginAnalyzer};
pub use gaps::{classify_gap_severity, find_whitespace_gaps, min_gap_pixels};
pub use geometry::{MarginPixels, PageMargins};
pub use region::{
    analyze_margin_region, classify_severity, count_content, scan_regions, RegionContent,
    ScanRegion,
};
pub use types::{
    BoundingBox, MarginError, MarginOptions, MarginOptionsBuilder, MarginSide, MarginViolation,
    PageAnalysis, RenderedPage, Result, Severity, WhitespaceGap, DEFAULT_DPI,
    DEFAULT_MIN_VIOLATION_PIXELS, DEFAULT_THRESHOLD,
};
