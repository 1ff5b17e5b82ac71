//! Cover calculator
//!
//! Computes spine width and wrap-cover size from the interior page count
//! for Lulu and Amazon KDP bindings, and writes the TeX cover-variables
//! file the cover template reads (and `dimensions` can check against).

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::pdf_reader::{LopdfReader, PdfReaderError};

/// Standard bleed in inches
pub const STANDARD_BLEED_IN: f64 = 0.125;

/// Spine allowance added to every paperback spine (inches)
pub const SPINE_BASE_IN: f64 = 0.06;

/// Lulu hardcover case wrap around the boards, every edge (inches)
pub const HARDCOVER_WRAP_IN: f64 = 0.75;

/// Lulu paperback pages per inch of spine
pub const LULU_PAGES_PER_INCH: f64 = 444.0;

/// KDP paper thickness per page (inches)
pub const KDP_WHITE_PAGE_IN: f64 = 0.002252;
pub const KDP_CREAM_PAGE_IN: f64 = 0.0025;

/// Lulu hardcover spine widths: `(min pages, max pages, spine inches)`
pub const HARDCOVER_TABLE: &[(usize, usize, f64)] = &[
    (24, 84, 0.25),
    (85, 140, 0.5),
    (141, 168, 0.625),
    (169, 194, 0.688),
    (195, 222, 0.75),
    (223, 250, 0.813),
    (251, 278, 0.875),
    (279, 306, 0.938),
    (307, 334, 1.0),
    (335, 360, 1.063),
    (361, 388, 1.125),
    (389, 416, 1.188),
    (417, 444, 1.25),
    (445, 472, 1.313),
    (473, 500, 1.375),
    (501, 528, 1.438),
    (529, 556, 1.5),
    (557, 582, 1.563),
    (583, 610, 1.625),
    (611, 638, 1.688),
    (639, 666, 1.75),
    (667, 694, 1.813),
    (695, 722, 1.875),
    (723, 750, 1.938),
    (751, 778, 2.0),
    (779, 799, 2.063),
];

/// Cover calculation error types
#[derive(Debug, Error)]
pub enum CoverError {
    #[error("{binding} requires at least {min} interior pages (got {pages})")]
    TooFewPages {
        binding: Binding,
        pages: usize,
        min: usize,
    },

    #[error("{pages} pages is outside the supported hardcover range (max {max})")]
    PageCountOutOfRange { pages: usize, max: usize },

    #[error("Invalid trim size: {0}")]
    InvalidTrim(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfReaderError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoverError>;

/// Binding / paper combination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Binding {
    /// Lulu perfect-bound paperback
    #[default]
    Paperback,
    /// Lulu casewrap hardcover
    Hardcover,
    /// Amazon KDP paperback, white paper
    KdpWhite,
    /// Amazon KDP paperback, cream paper
    KdpCream,
}

impl Binding {
    /// Minimum interior page count accepted by the vendor
    pub fn min_pages(self) -> usize {
        match self {
            Binding::Paperback => 32,
            Binding::Hardcover | Binding::KdpWhite | Binding::KdpCream => 24,
        }
    }

    pub fn vendor(self) -> &'static str {
        match self {
            Binding::Paperback | Binding::Hardcover => "Lulu",
            Binding::KdpWhite | Binding::KdpCream => "Amazon KDP",
        }
    }

    /// Value written to `\CoverBinding`
    pub fn tex_name(self) -> &'static str {
        match self {
            Binding::Paperback => "paperback",
            Binding::Hardcover => "hardcover",
            Binding::KdpWhite | Binding::KdpCream => "kdp-paperback",
        }
    }

    /// KDP paper stock, if any
    pub fn paper(self) -> Option<&'static str> {
        match self {
            Binding::KdpWhite => Some("white"),
            Binding::KdpCream => Some("cream"),
            _ => None,
        }
    }

    /// Default location of the generated vars file
    pub fn default_output(self) -> PathBuf {
        match self {
            Binding::Paperback | Binding::Hardcover => {
                PathBuf::from("front-matter/cover/cover-vars.tex")
            }
            Binding::KdpWhite | Binding::KdpCream => {
                PathBuf::from("front-matter/cover/kdp-cover-vars.tex")
            }
        }
    }

    /// Cover material folded around the boards on each edge
    pub fn wrap_in(self) -> f64 {
        match self {
            Binding::Hardcover => HARDCOVER_WRAP_IN,
            _ => 0.0,
        }
    }

    /// Spine width in inches for an interior page count
    pub fn spine_width_in(self, pages: usize) -> Result<f64> {
        if pages < self.min_pages() {
            return Err(CoverError::TooFewPages {
                binding: self,
                pages,
                min: self.min_pages(),
            });
        }

        match self {
            Binding::Paperback => Ok(pages as f64 / LULU_PAGES_PER_INCH + SPINE_BASE_IN),
            Binding::Hardcover => hardcover_spine_in(pages),
            Binding::KdpWhite => Ok(pages as f64 * KDP_WHITE_PAGE_IN + SPINE_BASE_IN),
            Binding::KdpCream => Ok(pages as f64 * KDP_CREAM_PAGE_IN + SPINE_BASE_IN),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Paperback => f.write_str("Lulu paperback"),
            Binding::Hardcover => f.write_str("Lulu hardcover"),
            Binding::KdpWhite => f.write_str("KDP paperback (white)"),
            Binding::KdpCream => f.write_str("KDP paperback (cream)"),
        }
    }
}

fn hardcover_spine_in(pages: usize) -> Result<f64> {
    HARDCOVER_TABLE
        .iter()
        .find(|(low, high, _)| (*low..=*high).contains(&pages))
        .map(|&(_, _, width)| width)
        .ok_or(CoverError::PageCountOutOfRange {
            pages,
            max: HARDCOVER_TABLE.last().map_or(0, |&(_, high, _)| high),
        })
}

/// Inputs of a cover calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverSpec {
    pub binding: Binding,
    pub pages: usize,
    pub trim_width_in: f64,
    pub trim_height_in: f64,
    pub bleed_in: f64,
}

impl CoverSpec {
    /// 6×9in trim with standard bleed
    pub fn new(binding: Binding, pages: usize) -> Self {
        Self {
            binding,
            pages,
            trim_width_in: 6.0,
            trim_height_in: 9.0,
            bleed_in: STANDARD_BLEED_IN,
        }
    }

    pub fn with_trim(mut self, width_in: f64, height_in: f64) -> Self {
        self.trim_width_in = width_in;
        self.trim_height_in = height_in;
        self
    }

    pub fn with_bleed(mut self, bleed_in: f64) -> Self {
        self.bleed_in = bleed_in;
        self
    }

    /// Take the page count from an interior PDF
    pub fn from_pdf(binding: Binding, pdf_path: &Path) -> Result<Self> {
        let reader = LopdfReader::new(pdf_path)?;
        Ok(Self::new(binding, reader.info.page_count))
    }

    pub fn dimensions(&self) -> Result<CoverDimensions> {
        if !(self.trim_width_in > 0.0 && self.trim_height_in > 0.0) {
            return Err(CoverError::InvalidTrim(format!(
                "{} x {} in",
                self.trim_width_in, self.trim_height_in
            )));
        }
        if !(self.bleed_in >= 0.0) {
            return Err(CoverError::InvalidTrim(format!("bleed {} in", self.bleed_in)));
        }

        let spine_in = self.binding.spine_width_in(self.pages)?;
        let wrap_in = self.binding.wrap_in();
        Ok(CoverDimensions {
            spine_in,
            wrap_in,
            width_in: 2.0 * (self.trim_width_in + wrap_in) + spine_in + 2.0 * self.bleed_in,
            height_in: self.trim_height_in + 2.0 * wrap_in + 2.0 * self.bleed_in,
        })
    }
}

/// Computed wrap-cover size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverDimensions {
    pub spine_in: f64,
    /// Hardcover board wrap on each edge, 0 for paperbacks
    pub wrap_in: f64,
    pub width_in: f64,
    pub height_in: f64,
}

const RULE: &str =
    "% ============================================================================\n";

/// Render the TeX cover-variables file
pub fn render_cover_vars(
    spec: &CoverSpec,
    dims: &CoverDimensions,
    generated: NaiveDateTime,
) -> String {
    let binding = spec.binding;
    let mut out = String::new();

    out.push_str(RULE);
    let _ = writeln!(
        out,
        "% COVER VARIABLES - Generated for {} wrap cover",
        binding.vendor()
    );
    out.push_str(RULE);
    let _ = writeln!(out, "% Generated: {}", generated.format("%Y-%m-%d %H:%M:%S"));
    match binding.paper() {
        Some(paper) => {
            let _ = writeln!(out, "% Paper: {} | Pages: {}", paper, spec.pages);
        }
        None => {
            let _ = writeln!(out, "% Binding: {} | Pages: {}", binding.tex_name(), spec.pages);
        }
    }
    if dims.wrap_in > 0.0 {
        out.push_str("% Hardcover Case Wrap Specifications:\n");
        let _ = writeln!(out, "%   - Wrap area: {:.3}in (wraps around boards)", dims.wrap_in);
        let _ = writeln!(
            out,
            "%   - Total cover: {:.3}in x {:.3}in",
            dims.width_in, dims.height_in
        );
        let _ = writeln!(
            out,
            "%   - Interior trim: {:.3}in x {:.3}in",
            spec.trim_width_in, spec.trim_height_in
        );
    }
    out.push_str(RULE);
    out.push('\n');

    for name in [
        "CoverTrimWidth",
        "CoverTrimHeight",
        "CoverBleed",
        "CoverSpineWidth",
        "CoverWrapArea",
    ] {
        let _ = writeln!(out, "\\newlength{{\\{}}}", name);
    }
    let _ = writeln!(out, "\\newcommand{{\\CoverPageCount}}{{{}}}", spec.pages);
    if let Some(paper) = binding.paper() {
        let _ = writeln!(out, "\\newcommand{{\\CoverPaper}}{{{}}}", paper);
    }
    let _ = writeln!(out, "\\newcommand{{\\CoverBinding}}{{{}}}", binding.tex_name());
    out.push('\n');

    let _ = writeln!(out, "\\setlength{{\\CoverTrimWidth}}{{{:.3}in}}", spec.trim_width_in);
    let _ = writeln!(out, "\\setlength{{\\CoverTrimHeight}}{{{:.3}in}}", spec.trim_height_in);
    let _ = writeln!(out, "\\setlength{{\\CoverBleed}}{{{:.3}in}}", spec.bleed_in);
    let _ = writeln!(out, "\\setlength{{\\CoverSpineWidth}}{{{:.6}in}}", dims.spine_in);
    let _ = writeln!(out, "\\setlength{{\\CoverWrapArea}}{{{:.3}in}}", dims.wrap_in);
    out.push('\n');

    let _ = writeln!(
        out,
        "% Derived sizes (inches): cover_width={:.6}, cover_height={:.3}",
        dims.width_in, dims.height_in
    );
    out
}

/// Write the vars file, creating parent directories
pub fn write_cover_vars(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    info!(path = %path.display(), "wrote cover variables");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::CoverVars;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap()
    }

    // TC-COV-001: Lulu paperback formula
    #[test]
    fn test_paperback_spine() {
        let spine = Binding::Paperback.spine_width_in(444).unwrap();
        assert!((spine - 1.06).abs() < 1e-12);

        let spine = Binding::Paperback.spine_width_in(32).unwrap();
        assert!((spine - (32.0 / 444.0 + 0.06)).abs() < 1e-12);
    }

    // TC-COV-002: Minimum page counts
    #[test]
    fn test_minimum_pages() {
        assert!(matches!(
            Binding::Paperback.spine_width_in(31),
            Err(CoverError::TooFewPages { min: 32, pages: 31, .. })
        ));
        assert!(Binding::Hardcover.spine_width_in(23).is_err());
        assert!(Binding::KdpWhite.spine_width_in(23).is_err());
        assert!(Binding::KdpCream.spine_width_in(24).is_ok());
    }

    // TC-COV-003: Hardcover table boundaries
    #[test]
    fn test_hardcover_table() {
        assert_eq!(Binding::Hardcover.spine_width_in(24).unwrap(), 0.25);
        assert_eq!(Binding::Hardcover.spine_width_in(84).unwrap(), 0.25);
        assert_eq!(Binding::Hardcover.spine_width_in(85).unwrap(), 0.5);
        assert_eq!(Binding::Hardcover.spine_width_in(360).unwrap(), 1.063);
        assert_eq!(Binding::Hardcover.spine_width_in(799).unwrap(), 2.063);
        assert!(matches!(
            Binding::Hardcover.spine_width_in(800),
            Err(CoverError::PageCountOutOfRange { pages: 800, max: 799 })
        ));
    }

    #[test]
    fn test_hardcover_table_is_contiguous() {
        for pair in HARDCOVER_TABLE.windows(2) {
            assert_eq!(pair[0].1 + 1, pair[1].0);
            assert!(pair[0].2 < pair[1].2);
        }
    }

    // TC-COV-004: KDP paper formulas
    #[test]
    fn test_kdp_spine() {
        let white = Binding::KdpWhite.spine_width_in(250).unwrap();
        assert!((white - 0.623).abs() < 1e-9);

        let cream = Binding::KdpCream.spine_width_in(250).unwrap();
        assert!((cream - 0.685).abs() < 1e-9);
    }

    #[test]
    fn test_cover_dimensions() {
        // Case wrap adds 0.75in on every edge
        let dims = CoverSpec::new(Binding::Hardcover, 300).dimensions().unwrap();
        assert_eq!(dims.spine_in, 0.938);
        assert_eq!(dims.wrap_in, 0.75);
        assert!((dims.width_in - 14.688).abs() < 1e-9);
        assert!((dims.height_in - 10.75).abs() < 1e-9);

        let dims = CoverSpec::new(Binding::Paperback, 444).dimensions().unwrap();
        assert_eq!(dims.wrap_in, 0.0);
        assert!((dims.width_in - (12.0 + 1.06 + 0.25)).abs() < 1e-9);
        assert!((dims.height_in - 9.25).abs() < 1e-12);

        let dims = CoverSpec::new(Binding::KdpWhite, 100)
            .with_trim(5.5, 8.5)
            .with_bleed(0.0)
            .dimensions()
            .unwrap();
        assert!((dims.width_in - (11.0 + 0.2852)).abs() < 1e-9);
        assert!((dims.height_in - 8.5).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_trim() {
        let result = CoverSpec::new(Binding::Paperback, 100)
            .with_trim(0.0, 9.0)
            .dimensions();
        assert!(matches!(result, Err(CoverError::InvalidTrim(_))));

        let result = CoverSpec::new(Binding::Paperback, 100)
            .with_bleed(-0.1)
            .dimensions();
        assert!(matches!(result, Err(CoverError::InvalidTrim(_))));
    }

    #[test]
    fn test_render_cover_vars_lulu() {
        let spec = CoverSpec::new(Binding::Hardcover, 300);
        let dims = spec.dimensions().unwrap();
        let tex = render_cover_vars(&spec, &dims, timestamp());

        assert!(tex.contains("% COVER VARIABLES - Generated for Lulu wrap cover"));
        assert!(tex.contains("% Generated: 2026-03-14 09:26:53"));
        assert!(tex.contains("% Binding: hardcover | Pages: 300"));
        assert!(tex.contains("\\newlength{\\CoverSpineWidth}\n"));
        assert!(tex.contains("\\newcommand{\\CoverPageCount}{300}"));
        assert!(tex.contains("\\newcommand{\\CoverBinding}{hardcover}"));
        assert!(tex.contains("\\setlength{\\CoverTrimWidth}{6.000in}"));
        assert!(tex.contains("\\setlength{\\CoverSpineWidth}{0.938000in}"));
        assert!(tex.contains("\\newlength{\\CoverWrapArea}\n"));
        assert!(tex.contains("\\setlength{\\CoverWrapArea}{0.750in}"));
        assert!(tex.contains("%   - Wrap area: 0.750in"));
        assert!(tex.contains("cover_width=14.688000, cover_height=10.750"));
        assert!(!tex.contains("CoverPaper"));
    }

    #[test]
    fn test_render_cover_vars_kdp() {
        let spec = CoverSpec::new(Binding::KdpCream, 200);
        let dims = spec.dimensions().unwrap();
        let tex = render_cover_vars(&spec, &dims, timestamp());

        assert!(tex.contains("Generated for Amazon KDP wrap cover"));
        assert!(tex.contains("% Paper: cream | Pages: 200"));
        assert!(tex.contains("\\newcommand{\\CoverPaper}{cream}"));
        assert!(tex.contains("\\newcommand{\\CoverBinding}{kdp-paperback}"));
        assert!(tex.contains("\\newlength{\\CoverWrapArea}\n"));
        assert!(tex.contains("\\setlength{\\CoverWrapArea}{0.000in}"));
        assert!(!tex.contains("Case Wrap"));
    }

    #[test]
    fn test_cover_vars_read_back() {
        let spec = CoverSpec::new(Binding::Paperback, 222).with_bleed(0.125);
        let dims = spec.dimensions().unwrap();
        let tex = render_cover_vars(&spec, &dims, timestamp());

        let vars = CoverVars::parse(&tex).unwrap();
        assert_eq!(vars.trim_width_in, 6.0);
        assert_eq!(vars.bleed_in, 0.125);
        assert!((vars.spine_width_in - dims.spine_in).abs() < 1e-6);

        let size = vars.expected_size();
        assert!((size.width_in - dims.width_in).abs() < 1e-6);
        assert!((size.height_in - dims.height_in).abs() < 1e-12);
    }

    #[test]
    fn test_hardcover_vars_read_back_includes_wrap() {
        let spec = CoverSpec::new(Binding::Hardcover, 300);
        let dims = spec.dimensions().unwrap();
        let tex = render_cover_vars(&spec, &dims, timestamp());

        let vars = CoverVars::parse(&tex).unwrap();
        assert_eq!(vars.wrap_area_in, 0.75);
        let size = vars.expected_size();
        assert!((size.width_in - 14.688).abs() < 1e-6);
        assert!((size.height_in - 10.75).abs() < 1e-9);
    }

    #[test]
    fn test_write_cover_vars_creates_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("front-matter/cover/cover-vars.tex");

        write_cover_vars(&path, "% vars\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "% vars\n");
    }

    #[test]
    fn test_from_pdf_page_count() {
        let dir = tempdir().unwrap();
        let pdf = dir.path().join("interior.pdf");
        crate::pdf_reader::test_pdf::write(&pdf, &vec![(432, 648, 0); 40], false);

        let spec = CoverSpec::from_pdf(Binding::Paperback, &pdf).unwrap();
        assert_eq!(spec.pages, 40);
        assert!(spec.dimensions().is_ok());
    }

    #[test]
    fn test_binding_display_and_defaults() {
        assert_eq!(Binding::default(), Binding::Paperback);
        assert_eq!(Binding::KdpWhite.to_string(), "KDP paperback (white)");
        assert_eq!(
            Binding::KdpCream.default_output(),
            PathBuf::from("front-matter/cover/kdp-cover-vars.tex")
        );
    }
}
