//! bookcheck - print-production checks for LaTeX book PDFs
//!
//! Renders each page of a typeset book and flags ink that strays into the
//! margins, as well as large blank bands inside the text block. Also checks
//! page sizes against an expected trim size and computes spine and cover
//! dimensions for print-on-demand vendors.
//!
//! # Features
//!
//! - **Margin Analysis** ([`margin`]) - Scan rendered pages for content outside the text block
//! - **Page Rendering** ([`render`]) - Rasterize PDF pages with pdftoppm or ImageMagick
//! - **Check Pipeline** ([`pipeline`]) - Analyze a whole document in parallel
//! - **Reports** ([`report`]) - Aggregate findings as text or JSON
//! - **Debug Overlays** ([`debug_image`]) - Draw findings onto page images
//! - **Dimension Check** ([`dimensions`]) - Compare PDF page boxes with a trim size
//! - **Cover Calculator** ([`cover`]) - Spine width and wrap-cover size per binding
//!
//! # Quick Start
//!
//! ## Analyzing a single page
//!
//! ```rust
//! use bookcheck::{analyze_page, MarginOptions, RenderedPage};
//!
//! let options = MarginOptions::builder()
//!     .page_size(6.0, 9.0)
//!     .margins(0.875, 0.625, 0.75, 0.75)
//!     .dpi(150)
//!     .build();
//!
//! // A blank 6x9in page at 150 DPI
//! let page = RenderedPage::filled(900, 1350, 255);
//! let analysis = analyze_page(&page, 1, &options);
//! assert!(!analysis.has_any_issues());
//! ```
//!
//! ## Checking a document
//!
//! ```rust,no_run
//! use bookcheck::{open_pdf_renderer, CheckPipeline, CheckReport, MarginOptions, RendererKind};
//! use std::path::Path;
//!
//! let renderer = open_pdf_renderer(Path::new("book.pdf"), RendererKind::Auto).unwrap();
//! let pipeline = CheckPipeline::new(MarginOptions::default());
//! let outcome = pipeline.run(renderer.as_ref()).unwrap();
//!
//! let report = CheckReport::new("book.pdf", &outcome.analyses, &outcome.failures);
//! println!("{}", report.render_text());
//! ```
//!
//! # Architecture
//!
//! ```text
//! PDF -> PageRenderer -> RenderedPage -> analyze_page -> PageAnalysis
//!                                              |
//!                               CheckReport / debug overlays
//! ```
//!
//! # License
//!
//! AGPL-3.0

pub mod cli;
pub mod config;
pub mod cover;
pub mod debug_image;
pub mod dimensions;
pub mod margin;
pub mod pdf_reader;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod util;

// Re-exports for convenience
pub use cli::{
    create_page_progress_bar, CheckArgs, Cli, Commands, CoverArgs, DimensionsArgs, ExitCode,
    ShowConfigArgs,
};
pub use config::{CheckSettings, CliOverrides, Config, ConfigError};
pub use cover::{
    render_cover_vars, write_cover_vars, Binding, CoverDimensions, CoverError, CoverSpec,
};
pub use debug_image::{render_overlay, save_debug_image, DebugImageError};
pub use dimensions::{
    CoverVars, DimensionCheck, DimensionError, DimensionReport, ExpectedSize, PageSizeMismatch,
};
pub use margin::{
    analyze_page, BoundingBox, MarginAnalyzer, MarginError, MarginOptions, MarginOptionsBuilder,
    MarginSide, MarginViolation, PageAnalysis, RenderedPage, Severity, WhitespaceGap,
};
pub use pdf_reader::{LopdfReader, PdfDocument, PdfPage, PdfReaderError};
pub use pipeline::{
    CheckOutcome, CheckPipeline, PageFailure, PipelineError, ProgressCallback, SilentProgress,
};
pub use render::{
    open_pdf_renderer, ImageDirRenderer, MagickRenderer, PageRenderer, PdftoppmRenderer,
    RenderError, RendererKind,
};
pub use report::{CheckReport, ReportError, ReportSummary};
