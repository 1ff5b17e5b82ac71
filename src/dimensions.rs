//! PDF dimension check
//!
//! Verifies that every page of a PDF matches an expected physical size
//! (and optionally an expected page count). The expected size is given
//! directly or derived from a TeX cover-variables file:
//!
//! ```text
//! width  = 2 × trim width + spine + 2 × bleed
//! height = trim height + 2 × bleed
//! ```

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

use crate::pdf_reader::{LopdfReader, PdfPage, PdfReaderError};
use crate::util::{inches_to_points, mm_to_inches};

/// Default size tolerance in points
pub const DEFAULT_TOLERANCE_PT: f64 = 0.5;

static SETLENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\setlength\{\\([A-Za-z]+)\}\{([^}]+)\}").expect("valid setlength regex")
});
static LENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9.]+)\s*(in|mm)?$").expect("valid length regex"));

/// Dimension check error types
#[derive(Debug, Error)]
pub enum DimensionError {
    #[error("Cover vars file not found: {0}")]
    VarsNotFound(PathBuf),

    #[error("Missing \\{0} in cover vars")]
    MissingLength(String),

    #[error("Unsupported length: {0}")]
    InvalidLength(String),

    #[error("Invalid expected size: {0}")]
    InvalidExpectedSize(String),

    #[error("PDF has no pages")]
    NoPages,

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfReaderError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DimensionError>;

/// Parse a TeX length in inches or millimeters; bare numbers are inches
pub fn parse_length_in(value: &str) -> Result<f64> {
    let value = value.trim();
    let caps = LENGTH_RE
        .captures(value)
        .ok_or_else(|| DimensionError::InvalidLength(value.to_string()))?;

    let number: f64 = caps[1]
        .parse()
        .map_err(|_| DimensionError::InvalidLength(value.to_string()))?;

    match caps.get(2).map(|m| m.as_str()) {
        Some("mm") => Ok(mm_to_inches(number)),
        _ => Ok(number),
    }
}

/// Expected physical page size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpectedSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl ExpectedSize {
    pub fn new(width_in: f64, height_in: f64) -> Result<Self> {
        if !(width_in > 0.0 && height_in > 0.0) {
            return Err(DimensionError::InvalidExpectedSize(format!(
                "{} x {} in",
                width_in, height_in
            )));
        }
        Ok(Self {
            width_in,
            height_in,
        })
    }

    pub fn width_pt(&self) -> f64 {
        inches_to_points(self.width_in)
    }

    pub fn height_pt(&self) -> f64 {
        inches_to_points(self.height_in)
    }
}

/// Cover geometry read from a TeX cover-variables file
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverVars {
    pub trim_width_in: f64,
    pub trim_height_in: f64,
    pub bleed_in: f64,
    pub spine_width_in: f64,
    /// Hardcover board wrap; files without `\CoverWrapArea` have none
    pub wrap_area_in: f64,
}

impl CoverVars {
    /// Parse `\setlength{\CoverTrimWidth}{6in}` style assignments
    pub fn parse(text: &str) -> Result<Self> {
        let lengths: HashMap<&str, &str> = SETLENGTH_RE
            .captures_iter(text)
            .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
            .collect();

        let find = |name: &str| -> Result<f64> {
            let value = lengths
                .get(name)
                .ok_or_else(|| DimensionError::MissingLength(name.to_string()))?;
            parse_length_in(value)
        };

        Ok(Self {
            trim_width_in: find("CoverTrimWidth")?,
            trim_height_in: find("CoverTrimHeight")?,
            bleed_in: find("CoverBleed")?,
            spine_width_in: find("CoverSpineWidth")?,
            wrap_area_in: match lengths.get("CoverWrapArea") {
                Some(value) => parse_length_in(value)?,
                None => 0.0,
            },
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DimensionError::VarsNotFound(path.to_path_buf()));
        }
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Full wrap size: back, spine and front plus board wrap and bleed on every edge
    pub fn expected_size(&self) -> ExpectedSize {
        ExpectedSize {
            width_in: 2.0 * (self.trim_width_in + self.wrap_area_in)
                + self.spine_width_in
                + 2.0 * self.bleed_in,
            height_in: self.trim_height_in + 2.0 * self.wrap_area_in + 2.0 * self.bleed_in,
        }
    }
}

/// A page whose size differs from the expected one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSizeMismatch {
    /// 1-based page number
    pub page_num: usize,
    pub width_pt: f64,
    pub height_pt: f64,
}

/// Outcome of a dimension check
#[derive(Debug, Clone, Serialize)]
pub struct DimensionReport {
    pub expected: ExpectedSize,
    pub tolerance_pt: f64,
    pub page_count: usize,
    pub expected_pages: Option<usize>,
    /// Size of the first page in points
    pub first_page_pt: (f64, f64),
    pub mismatches: Vec<PageSizeMismatch>,
}

impl DimensionReport {
    pub fn page_count_ok(&self) -> bool {
        self.expected_pages.map_or(true, |n| n == self.page_count)
    }

    pub fn ok(&self) -> bool {
        self.mismatches.is_empty() && self.page_count_ok()
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Expected: {:.2} x {:.2} pts ({:.3} x {:.3} in)",
            self.expected.width_pt(),
            self.expected.height_pt(),
            self.expected.width_in,
            self.expected.height_in
        );

        let (w, h) = self.first_page_pt;
        let status = if self.mismatches.is_empty() { "ok" } else { "mismatch" };
        let _ = writeln!(out, "PDF: {:.2} x {:.2} pts ({})", w, h, status);

        for m in &self.mismatches {
            let _ = writeln!(
                out,
                "  page {}: {:.2} x {:.2} pts (tolerance {:.2} pt)",
                m.page_num, m.width_pt, m.height_pt, self.tolerance_pt
            );
        }

        match self.expected_pages {
            Some(expected) if expected != self.page_count => {
                let _ = writeln!(out, "Pages: {} != expected {}", self.page_count, expected);
            }
            _ => {
                let _ = writeln!(out, "Pages: {}", self.page_count);
            }
        }
        out
    }
}

/// Page size check against an expected size
#[derive(Debug, Clone)]
pub struct DimensionCheck {
    expected: ExpectedSize,
    tolerance_pt: f64,
    expected_pages: Option<usize>,
}

impl DimensionCheck {
    pub fn new(expected: ExpectedSize) -> Self {
        Self {
            expected,
            tolerance_pt: DEFAULT_TOLERANCE_PT,
            expected_pages: None,
        }
    }

    pub fn with_tolerance_pt(mut self, tolerance_pt: f64) -> Self {
        self.tolerance_pt = tolerance_pt.abs();
        self
    }

    pub fn with_expected_pages(mut self, pages: Option<usize>) -> Self {
        self.expected_pages = pages;
        self
    }

    fn close_enough(&self, value: f64, expected: f64) -> bool {
        (value - expected).abs() <= self.tolerance_pt
    }

    /// Compare page boxes against the expected size
    pub fn check_pages(&self, pages: &[PdfPage]) -> Result<DimensionReport> {
        let first = pages.first().ok_or(DimensionError::NoPages)?;
        let (expected_w, expected_h) = (self.expected.width_pt(), self.expected.height_pt());

        let mismatches = pages
            .iter()
            .filter(|p| {
                !self.close_enough(p.width_pt, expected_w)
                    || !self.close_enough(p.height_pt, expected_h)
            })
            .map(|p| PageSizeMismatch {
                page_num: p.index + 1,
                width_pt: p.width_pt,
                height_pt: p.height_pt,
            })
            .collect();

        Ok(DimensionReport {
            expected: self.expected,
            tolerance_pt: self.tolerance_pt,
            page_count: pages.len(),
            expected_pages: self.expected_pages,
            first_page_pt: (first.width_pt, first.height_pt),
            mismatches,
        })
    }

    pub fn check_pdf(&self, pdf_path: &Path) -> Result<DimensionReport> {
        let reader = LopdfReader::new(pdf_path)?;
        debug!(
            pdf = %pdf_path.display(),
            pages = reader.info.page_count,
            "checking page dimensions"
        );
        self.check_pages(&reader.info.pages)
    }
}
