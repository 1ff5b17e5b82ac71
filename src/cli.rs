//! CLI interface module
//!
//! Provides command-line interface using clap derive macros.

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::config::CliOverrides;
use crate::cover::{Binding, STANDARD_BLEED_IN};
use crate::dimensions::DEFAULT_TOLERANCE_PT;
use crate::render::RendererKind;

/// Exit codes for the CLI
///
/// These codes follow standard Unix conventions and provide
/// specific error categories for scripting and automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Check passed
    Success = 0,
    /// High-severity findings or dimension mismatch
    CheckFailed = 1,
    /// Invalid arguments or configuration
    InvalidArgs = 2,
    /// Input file or directory not found
    InputNotFound = 3,
    /// Output could not be written
    OutputError = 4,
    /// Error while processing pages
    ProcessingError = 5,
    /// Renderer missing or failed
    ExternalToolError = 6,
}

impl ExitCode {
    /// Convert to process exit code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get human-readable description
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::CheckFailed => "Check failed (high-severity findings or size mismatch)",
            ExitCode::InvalidArgs => "Invalid arguments",
            ExitCode::InputNotFound => "Input file or directory not found",
            ExitCode::OutputError => "Output error (permission denied, disk full, etc.)",
            ExitCode::ProcessingError => "Processing error",
            ExitCode::ExternalToolError => "External tool error (pdftoppm, ImageMagick)",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.code()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code() as u8)
    }
}

/// Print-production checks for LaTeX book PDFs
#[derive(Parser, Debug)]
#[command(name = "bookcheck")]
#[command(author = "bookcheck Contributors")]
#[command(version)]
#[command(about = "Margin, whitespace, page size and cover checks for LaTeX book PDFs", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a PDF for content in the margins and large whitespace gaps
    Check(CheckArgs),
    /// Verify page size (and count) against an expected trim size
    Dimensions(DimensionsArgs),
    /// Compute spine width and cover size, and write the cover vars file
    Cover(CoverArgs),
    /// Print the effective configuration as TOML
    ShowConfig(ShowConfigArgs),
    /// Show system information
    Info,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// PDF file to check
    #[arg(required_unless_present = "images")]
    pub pdf: Option<PathBuf>,

    /// Analyze pre-rendered page images in this directory instead of a PDF
    #[arg(long, conflicts_with = "pdf")]
    pub images: Option<PathBuf>,

    /// Configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Page width in inches
    #[arg(long)]
    pub page_width: Option<f64>,

    /// Page height in inches
    #[arg(long)]
    pub page_height: Option<f64>,

    /// Inner (gutter) margin in inches
    #[arg(short, long)]
    pub inner: Option<f64>,

    /// Outer margin in inches
    #[arg(short, long)]
    pub outer: Option<f64>,

    /// Top margin in inches
    #[arg(short, long)]
    pub top: Option<f64>,

    /// Bottom margin in inches
    #[arg(short, long)]
    pub bottom: Option<f64>,

    /// Same margins on every page (no inner/outer swap)
    #[arg(long)]
    pub oneside: bool,

    /// Percentage of the top margin to skip in side scans (running headers)
    #[arg(long)]
    pub top_skip: Option<f64>,

    /// Percentage of the bottom margin to skip in side scans (footers)
    #[arg(long)]
    pub bottom_skip: Option<f64>,

    /// Page number zone start (% of page width)
    #[arg(long)]
    pub page_num_start: Option<f64>,

    /// Page number zone end (% of page width)
    #[arg(long)]
    pub page_num_end: Option<f64>,

    /// Pixels darker than this are content (0-255)
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Minimum content pixels for a violation
    #[arg(long)]
    pub min_pixels: Option<u32>,

    /// Render resolution
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Skip this many pages at the start (covers)
    #[arg(long)]
    pub skip_first: Option<usize>,

    /// Skip this many pages at the end
    #[arg(long)]
    pub skip_last: Option<usize>,

    /// Do not check the top margin
    #[arg(long)]
    pub no_top: bool,

    /// Do not check the bottom margin
    #[arg(long)]
    pub no_bottom: bool,

    /// Do not check the left margin
    #[arg(long)]
    pub no_left: bool,

    /// Do not check the right margin
    #[arg(long)]
    pub no_right: bool,

    /// Detect large full-width whitespace gaps
    #[arg(long)]
    pub check_whitespace: bool,

    /// Minimum gap height in inches
    #[arg(long)]
    pub gap_min_height: Option<f64>,

    /// Include top/bottom margins in gap detection
    #[arg(long)]
    pub gap_include_margins: bool,

    /// Skip gap detection on pages at least this % white
    #[arg(long)]
    pub gap_skip_page_white_pct: Option<f64>,

    /// Page renderer
    #[arg(long, value_enum)]
    pub renderer: Option<RendererKind>,

    /// Write overlay images for pages with issues to this directory
    #[arg(short, long)]
    pub debug_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Number of parallel threads
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl CheckArgs {
    /// Collect explicitly given values; flags only override when set
    pub fn to_overrides(&self) -> CliOverrides {
        let set = |flag: bool, value: bool| flag.then_some(value);

        CliOverrides {
            page_width: self.page_width,
            page_height: self.page_height,
            inner: self.inner,
            outer: self.outer,
            top: self.top,
            bottom: self.bottom,
            twoside: set(self.oneside, false),
            top_skip_pct: self.top_skip,
            bottom_skip_pct: self.bottom_skip,
            page_num_start: self.page_num_start,
            page_num_end: self.page_num_end,
            threshold: self.threshold,
            min_pixels: self.min_pixels,
            dpi: self.dpi,
            skip_first: self.skip_first,
            skip_last: self.skip_last,
            check_left: set(self.no_left, false),
            check_right: set(self.no_right, false),
            check_top: set(self.no_top, false),
            check_bottom: set(self.no_bottom, false),
            check_whitespace: set(self.check_whitespace, true),
            gap_min_height: self.gap_min_height,
            gap_include_margins: set(self.gap_include_margins, true),
            gap_skip_page_white_pct: self.gap_skip_page_white_pct,
            threads: self.threads,
            renderer: self.renderer,
            debug_dir: self.debug_dir.clone(),
            json: set(self.json, true),
        }
    }
}

/// Arguments for the dimensions command
#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("expected")
        .required(true)
        .args(["vars", "width_in"]),
))]
pub struct DimensionsArgs {
    /// PDF to check
    pub pdf: PathBuf,

    /// TeX cover vars file with trim, bleed and spine lengths
    #[arg(long, conflicts_with_all = ["width_in", "height_in"])]
    pub vars: Option<PathBuf>,

    /// Expected width in inches
    #[arg(long, requires = "height_in")]
    pub width_in: Option<f64>,

    /// Expected height in inches
    #[arg(long, requires = "width_in")]
    pub height_in: Option<f64>,

    /// Expected page count
    #[arg(long)]
    pub pages: Option<usize>,

    /// Size tolerance in points
    #[arg(long, default_value_t = DEFAULT_TOLERANCE_PT)]
    pub tolerance_pt: f64,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the cover command
#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("page_source")
        .required(true)
        .args(["pdf", "page_count"]),
))]
pub struct CoverArgs {
    /// Interior PDF to take the page count from
    #[arg(long)]
    pub pdf: Option<PathBuf>,

    /// Interior page count
    #[arg(long)]
    pub page_count: Option<usize>,

    /// Binding and paper
    #[arg(long, value_enum, default_value_t = Binding::Paperback)]
    pub binding: Binding,

    /// Trim width in inches
    #[arg(long, default_value_t = 6.0)]
    pub trim_width: f64,

    /// Trim height in inches
    #[arg(long, default_value_t = 9.0)]
    pub trim_height: f64,

    /// Bleed in inches
    #[arg(long, default_value_t = STANDARD_BLEED_IN)]
    pub bleed: f64,

    /// Output TeX file (default depends on the binding)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print the vars file instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

impl CoverArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.binding.default_output())
    }
}

/// Arguments for the show-config command
#[derive(Args, Debug)]
pub struct ShowConfigArgs {
    /// Configuration file (default: search path)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Create a progress bar for page analysis
pub fn create_page_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] Page {pos}/{len} ({percent}%) - {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("█▓░"),
    );
    pb
}
