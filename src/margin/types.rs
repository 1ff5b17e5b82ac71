//! Margin module core types
//!
//! Contains the page geometry options and the findings produced by the analyzer.

use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================
// Constants
// ============================================================

/// Default content threshold - pixels darker than this are content
pub const DEFAULT_THRESHOLD: u8 = 250;

/// Default minimum number of content pixels for a reportable violation
pub const DEFAULT_MIN_VIOLATION_PIXELS: u32 = 50;

/// Default render resolution
pub const DEFAULT_DPI: u32 = 150;

/// Coverage percentage above which a violation is high severity
pub const HIGH_PERCENTAGE: f64 = 5.0;

/// Pixel count above which a violation is high severity
pub const HIGH_PIXEL_COUNT: u32 = 5000;

/// Coverage percentage above which a violation is medium severity
pub const MEDIUM_PERCENTAGE: f64 = 1.0;

/// Pixel count above which a violation is medium severity
pub const MEDIUM_PIXEL_COUNT: u32 = 1000;

// ============================================================
// Error Types
// ============================================================

/// Margin error types
#[derive(Debug, Error)]
pub enum MarginError {
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MarginError>;

// ============================================================
// Options
// ============================================================

/// Page geometry and detection options
///
/// Defaults describe a US Trade (6x9in) book with typical LaTeX `geometry`
/// margins: inner 0.75in, outer 0.625in, top 0.7in, bottom 0.8in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginOptions {
    /// Physical page width (inches)
    pub page_width_in: f64,
    /// Physical page height (inches)
    pub page_height_in: f64,

    /// Inner (gutter) margin (inches)
    pub inner_margin_in: f64,
    /// Outer margin (inches)
    pub outer_margin_in: f64,
    /// Top margin (inches)
    pub top_margin_in: f64,
    /// Bottom margin (inches)
    pub bottom_margin_in: f64,

    /// Swap inner/outer margins on even pages
    pub twoside: bool,

    /// Percentage of the top margin height excluded from side scans (running headers)
    pub top_skip_pct: f64,
    /// Percentage of the bottom margin height excluded from side scans (footers)
    pub bottom_skip_pct: f64,

    /// Start of the page number zone in the bottom margin (% of page width)
    pub page_num_center_start_pct: f64,
    /// End of the page number zone in the bottom margin (% of page width)
    pub page_num_center_end_pct: f64,

    /// Pixels below this value are content (0=black, 255=white)
    pub threshold: u8,
    /// Minimum content pixels for a region to be reported
    pub min_violation_pixels: u32,
    /// Render resolution
    pub dpi: u32,

    /// Pages skipped at the start of the document (covers)
    pub skip_first: usize,
    /// Pages skipped at the end of the document
    pub skip_last: usize,

    pub check_top: bool,
    pub check_bottom: bool,
    pub check_left: bool,
    pub check_right: bool,

    /// Detect full-width whitespace gaps
    pub check_whitespace: bool,
    /// Minimum reported gap height (inches)
    pub gap_min_height_in: f64,
    /// Scan the full page height instead of the text block
    pub gap_include_margins: bool,
    /// Skip gap detection when the scanned area is at least this % white
    pub gap_skip_page_white_pct: f64,
}

impl Default for MarginOptions {
    fn default() -> Self {
        Self {
            page_width_in: 6.0,
            page_height_in: 9.0,
            inner_margin_in: 0.75,
            outer_margin_in: 0.625,
            top_margin_in: 0.7,
            bottom_margin_in: 0.8,
            twoside: true,
            top_skip_pct: 0.0,
            bottom_skip_pct: 0.0,
            page_num_center_start_pct: 40.0,
            page_num_center_end_pct: 60.0,
            threshold: DEFAULT_THRESHOLD,
            min_violation_pixels: DEFAULT_MIN_VIOLATION_PIXELS,
            dpi: DEFAULT_DPI,
            skip_first: 0,
            skip_last: 0,
            check_top: true,
            check_bottom: true,
            check_left: true,
            check_right: true,
            check_whitespace: false,
            gap_min_height_in: 1.0,
            gap_include_margins: false,
            gap_skip_page_white_pct: 95.0,
        }
    }
}

impl MarginOptions {
    /// Create a new options builder
    pub fn builder() -> MarginOptionsBuilder {
        MarginOptionsBuilder::default()
    }

    /// US Trade 6x9in (same as default)
    pub fn us_trade() -> Self {
        Self::default()
    }

    /// US Letter 8.5x11in with 1in margins, oneside
    pub fn us_letter() -> Self {
        Self {
            page_width_in: 8.5,
            page_height_in: 11.0,
            inner_margin_in: 1.0,
            outer_margin_in: 1.0,
            top_margin_in: 1.0,
            bottom_margin_in: 1.0,
            twoside: false,
            ..Default::default()
        }
    }

    /// Reject geometry the analyzer cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.page_width_in > 0.0 && self.page_height_in > 0.0) {
            return Err(MarginError::InvalidOptions(format!(
                "page size must be positive, got {}x{}in",
                self.page_width_in, self.page_height_in
            )));
        }
        let margins = [
            ("inner", self.inner_margin_in),
            ("outer", self.outer_margin_in),
            ("top", self.top_margin_in),
            ("bottom", self.bottom_margin_in),
        ];
        for (name, value) in margins {
            if !(value >= 0.0) {
                return Err(MarginError::InvalidOptions(format!(
                    "{} margin must not be negative, got {}in",
                    name, value
                )));
            }
        }
        if self.dpi == 0 {
            return Err(MarginError::InvalidOptions("DPI must be positive".to_string()));
        }
        let percentages = [
            ("top skip", self.top_skip_pct),
            ("bottom skip", self.bottom_skip_pct),
            ("page number zone start", self.page_num_center_start_pct),
            ("page number zone end", self.page_num_center_end_pct),
        ];
        for (name, value) in percentages {
            if !(value >= 0.0) {
                return Err(MarginError::InvalidOptions(format!(
                    "{} must not be negative, got {}%",
                    name, value
                )));
            }
        }
        if self.page_num_center_start_pct > self.page_num_center_end_pct {
            return Err(MarginError::InvalidOptions(format!(
                "page number zone start ({}%) is after its end ({}%)",
                self.page_num_center_start_pct, self.page_num_center_end_pct
            )));
        }
        if self.check_whitespace && !(self.gap_min_height_in > 0.0) {
            return Err(MarginError::InvalidOptions(format!(
                "gap minimum height must be positive, got {}in",
                self.gap_min_height_in
            )));
        }
        Ok(())
    }

    /// Short labels of the enabled sides ("L", "R", "T", "B")
    pub fn enabled_sides(&self) -> Vec<&'static str> {
        let mut sides = Vec::with_capacity(4);
        if self.check_left {
            sides.push("L");
        }
        if self.check_right {
            sides.push("R");
        }
        if self.check_top {
            sides.push("T");
        }
        if self.check_bottom {
            sides.push("B");
        }
        sides
    }
}

/// Builder for MarginOptions
#[derive(Debug, Default)]
pub struct MarginOptionsBuilder {
    options: MarginOptions,
}

impl MarginOptionsBuilder {
    /// Set physical page size (inches)
    pub fn page_size(mut self, width_in: f64, height_in: f64) -> Self {
        self.options.page_width_in = width_in;
        self.options.page_height_in = height_in;
        self
    }

    /// Set all four margins (inches)
    pub fn margins(mut self, inner: f64, outer: f64, top: f64, bottom: f64) -> Self {
        self.options.inner_margin_in = inner;
        self.options.outer_margin_in = outer;
        self.options.top_margin_in = top;
        self.options.bottom_margin_in = bottom;
        self
    }

    /// Set twoside mode
    pub fn twoside(mut self, twoside: bool) -> Self {
        self.options.twoside = twoside;
        self
    }

    /// Set header/footer skip percentages
    pub fn skip_pct(mut self, top: f64, bottom: f64) -> Self {
        self.options.top_skip_pct = top;
        self.options.bottom_skip_pct = bottom;
        self
    }

    /// Set page number exclusion zone (percent of page width)
    pub fn page_number_zone(mut self, start_pct: f64, end_pct: f64) -> Self {
        self.options.page_num_center_start_pct = start_pct;
        self.options.page_num_center_end_pct = end_pct;
        self
    }

    /// Set content threshold (0-255)
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.options.threshold = threshold;
        self
    }

    /// Set minimum violation pixel count
    pub fn min_violation_pixels(mut self, pixels: u32) -> Self {
        self.options.min_violation_pixels = pixels;
        self
    }

    /// Set render DPI
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.options.dpi = dpi;
        self
    }

    /// Set pages skipped at either end of the document
    pub fn skip_pages(mut self, first: usize, last: usize) -> Self {
        self.options.skip_first = first;
        self.options.skip_last = last;
        self
    }

    /// Enable or disable individual sides
    pub fn sides(mut self, left: bool, right: bool, top: bool, bottom: bool) -> Self {
        self.options.check_left = left;
        self.options.check_right = right;
        self.options.check_top = top;
        self.options.check_bottom = bottom;
        self
    }

    /// Enable whitespace gap detection
    pub fn check_whitespace(mut self, enabled: bool) -> Self {
        self.options.check_whitespace = enabled;
        self
    }

    /// Set minimum gap height (inches)
    pub fn gap_min_height_in(mut self, height: f64) -> Self {
        self.options.gap_min_height_in = height;
        self
    }

    /// Scan margins as well as the text block for gaps
    pub fn gap_include_margins(mut self, include: bool) -> Self {
        self.options.gap_include_margins = include;
        self
    }

    /// Set the near-blank page cutoff; above 100 never skips
    pub fn gap_skip_page_white_pct(mut self, pct: f64) -> Self {
        self.options.gap_skip_page_white_pct = pct;
        self
    }

    /// Build the options
    pub fn build(self) -> MarginOptions {
        self.options
    }
}

// ============================================================
// Page Buffer
// ============================================================

/// A rendered page as an 8-bit grayscale raster (0=black, 255=white)
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pixels: GrayImage,
}

impl RenderedPage {
    /// Wrap an existing grayscale image
    pub fn new(pixels: GrayImage) -> Self {
        Self { pixels }
    }

    /// Create a page filled with a single gray value
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self::new(GrayImage::from_pixel(width, height, image::Luma([value])))
    }

    /// Convert any decoded image to grayscale
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        Self::new(img.to_luma8())
    }

    /// Load a page image from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MarginError::ImageNotFound(path.to_path_buf()));
        }
        let img = image::open(path).map_err(|e| MarginError::InvalidImage(e.to_string()))?;
        Ok(Self::from_dynamic(&img))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Row-major pixel data
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Pixel values of one row
    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width() as usize;
        let start = y as usize * w;
        &self.as_raw()[start..start + w]
    }

    pub fn image(&self) -> &GrayImage {
        &self.pixels
    }
}

impl From<GrayImage> for RenderedPage {
    fn from(pixels: GrayImage) -> Self {
        Self::new(pixels)
    }
}

// ============================================================
// Findings
// ============================================================

/// Which margin a violation was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl MarginSide {
    pub fn as_str(self) -> &'static str {
        match self {
            MarginSide::Left => "left",
            MarginSide::Right => "right",
            MarginSide::Top => "top",
            MarginSide::Bottom => "bottom",
        }
    }
}

impl fmt::Display for MarginSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finding severity, ordered `Low < Medium < High`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rectangle in page pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})-({},{})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Content found inside a margin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginViolation {
    /// 1-based page number
    pub page_num: usize,
    pub side: MarginSide,
    /// Number of content pixels in the scanned region
    pub pixel_count: u32,
    /// Percentage of the scanned region covered by content
    pub percentage: f64,
    /// Tight box around the content (inclusive corners)
    pub bbox: BoundingBox,
    pub severity: Severity,
}

/// A full-width blank band taller than the configured minimum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhitespaceGap {
    /// 1-based page number
    pub page_num: usize,
    pub height_px: u32,
    pub height_in: f64,
    /// `(0, y1)-(page width, y2)`, `y2` exclusive
    pub bbox: BoundingBox,
    pub severity: Severity,
}

/// Results of analyzing a single page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    /// 1-based page number
    pub page_num: usize,
    pub width_px: u32,
    pub height_px: u32,
    pub violations: Vec<MarginViolation>,
    pub whitespace_gaps: Vec<WhitespaceGap>,
}

impl PageAnalysis {
    /// Empty analysis for a page of the given size
    pub fn new(page_num: usize, width_px: u32, height_px: u32) -> Self {
        Self {
            page_num,
            width_px,
            height_px,
            violations: Vec::new(),
            whitespace_gaps: Vec::new(),
        }
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn has_whitespace_gaps(&self) -> bool {
        !self.whitespace_gaps.is_empty()
    }

    pub fn has_any_issues(&self) -> bool {
        self.has_violations() || self.has_whitespace_gaps()
    }

    /// Highest severity among violations and gaps
    pub fn worst_severity(&self) -> Option<Severity> {
        self.violations
            .iter()
            .map(|v| v.severity)
            .chain(self.whitespace_gaps.iter().map(|g| g.severity))
            .max()
    }

    /// Sides with at least one violation, sorted and deduplicated
    pub fn affected_sides(&self) -> Vec<MarginSide> {
        let mut sides: Vec<MarginSide> = self.violations.iter().map(|v| v.side).collect();
        sides.sort_by_key(|s| s.as_str());
        sides.dedup();
        sides
    }
}
