//! bookcheck - print-production checks for LaTeX book PDFs
//!
//! CLI entry point

use bookcheck::{
    // CLI
    create_page_progress_bar, CheckArgs, Cli, Commands, CoverArgs, DimensionsArgs, ExitCode,
    ShowConfigArgs,
    // Config
    CliOverrides, Config, ConfigError,
    // Checks
    render_cover_vars, write_cover_vars, CheckPipeline, CheckReport, CoverError, CoverSpec,
    CoverVars, DimensionCheck, DimensionError, ExpectedSize, MarginOptions, PdfReaderError,
    PipelineError, ProgressCallback, RenderError,
    // Rendering
    open_pdf_renderer, ImageDirRenderer, PageRenderer, RendererKind,
    util::{ensure_dir_writable, format_duration},
};
use clap::Parser;
use indicatif::ProgressBar;
use std::fmt::Display;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check(args) => run_check(&args),
        Commands::Dimensions(args) => run_dimensions(&args),
        Commands::Cover(args) => run_cover(&args),
        Commands::ShowConfig(args) => run_show_config(&args),
        Commands::Info => run_info(),
    };

    match result {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("Error: {}", e.message);
            e.code.into()
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("bookcheck={}", default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ============ Errors ============

/// A failed command and the exit status it maps to
struct CommandError {
    code: ExitCode,
    message: String,
}

impl CommandError {
    fn new(code: ExitCode, message: impl Display) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }
}

type CommandResult = Result<ExitCode, CommandError>;

fn config_error(e: ConfigError) -> CommandError {
    let code = match e {
        ConfigError::NotFound(_) => ExitCode::InputNotFound,
        ConfigError::Io(_) | ConfigError::TomlParse(_) => ExitCode::InvalidArgs,
    };
    CommandError::new(code, e)
}

fn render_error(e: RenderError) -> CommandError {
    let code = match e {
        RenderError::PdfNotFound(_)
        | RenderError::DirectoryNotFound(_)
        | RenderError::NoPageImages(_) => ExitCode::InputNotFound,
        RenderError::ToolNotFound(_) | RenderError::ExternalToolError(_) => {
            ExitCode::ExternalToolError
        }
        RenderError::PageOutOfRange { .. }
        | RenderError::RenderFailed { .. }
        | RenderError::PdfRead(_)
        | RenderError::IoError(_) => ExitCode::ProcessingError,
    };
    CommandError::new(code, e)
}

fn pipeline_error(e: PipelineError) -> CommandError {
    match e {
        PipelineError::Render(e) => render_error(e),
        PipelineError::NoPagesToAnalyze { .. } => CommandError::new(ExitCode::InvalidArgs, e),
        PipelineError::ThreadPool(_) => CommandError::new(ExitCode::ProcessingError, e),
    }
}

fn pdf_error_code(e: &PdfReaderError) -> ExitCode {
    match e {
        PdfReaderError::FileNotFound(_) => ExitCode::InputNotFound,
        _ => ExitCode::ProcessingError,
    }
}

fn dimension_error(e: DimensionError) -> CommandError {
    let code = match &e {
        DimensionError::VarsNotFound(_) => ExitCode::InputNotFound,
        DimensionError::MissingLength(_)
        | DimensionError::InvalidLength(_)
        | DimensionError::InvalidExpectedSize(_) => ExitCode::InvalidArgs,
        DimensionError::NoPages | DimensionError::IoError(_) => ExitCode::ProcessingError,
        DimensionError::Pdf(pdf) => pdf_error_code(pdf),
    };
    CommandError::new(code, e)
}

fn cover_error(e: CoverError) -> CommandError {
    let code = match &e {
        CoverError::TooFewPages { .. }
        | CoverError::PageCountOutOfRange { .. }
        | CoverError::InvalidTrim(_) => ExitCode::InvalidArgs,
        CoverError::Pdf(pdf) => pdf_error_code(pdf),
        CoverError::IoError(_) => ExitCode::OutputError,
    };
    CommandError::new(code, e)
}

// ============ Progress Callback Implementation ============

/// Progress bar over the analyzed pages
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(pages: usize, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            create_page_progress_bar(pages as u64)
        };
        Self { bar }
    }
}

impl ProgressCallback for BarProgress {
    fn on_step_start(&self, step: &str) {
        self.bar.set_message(step.to_string());
    }

    fn on_step_progress(&self, current: usize, _total: usize) {
        self.bar.set_position(current as u64);
    }

    fn on_step_complete(&self, _step: &str, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    fn on_debug(&self, message: &str) {
        debug!("{}", message);
    }
}

// ============ Check Command ============

fn run_check(args: &CheckArgs) -> CommandResult {
    let (config, config_path) =
        Config::load_with_override(args.config.as_deref()).map_err(config_error)?;
    if let Some(path) = &config_path {
        debug!(path = %path.display(), "loaded config");
    }

    let settings = config.merge_with_cli(&args.to_overrides());
    settings
        .options
        .validate()
        .map_err(|e| CommandError::new(ExitCode::InvalidArgs, e))?;

    let (renderer, source): (Box<dyn PageRenderer>, String) = match (&args.images, &args.pdf) {
        (Some(dir), _) => (
            Box::new(ImageDirRenderer::new(dir).map_err(render_error)?) as Box<dyn PageRenderer>,
            dir.display().to_string(),
        ),
        (None, Some(pdf)) => (
            open_pdf_renderer(pdf, settings.renderer).map_err(render_error)?,
            pdf.display().to_string(),
        ),
        (None, None) => {
            return Err(CommandError::new(
                ExitCode::InvalidArgs,
                "a PDF or --images directory is required",
            ))
        }
    };

    let mut pipeline = CheckPipeline::new(settings.options.clone())
        .with_threads(settings.threads.unwrap_or(0));
    if let Some(dir) = &settings.debug_dir {
        ensure_dir_writable(dir).map_err(|e| CommandError::new(ExitCode::OutputError, e))?;
        pipeline = pipeline.with_debug_dir(dir);
    }

    let show_header = !args.quiet && !settings.json;
    if show_header {
        print_check_header(&source, &settings.options);
    }

    let total_pages = renderer.page_count().map_err(render_error)?;
    let range = match pipeline.page_range(total_pages) {
        Ok(range) => range,
        Err(PipelineError::NoPagesToAnalyze { .. }) => {
            eprintln!("Warning: No pages to analyze after skipping.");
            return Ok(ExitCode::Success);
        }
        Err(e) => return Err(pipeline_error(e)),
    };
    if show_header {
        println!(
            "Analyzing pages {} to {} of {}\n",
            range.start + 1,
            range.end,
            total_pages
        );
    }

    let progress = BarProgress::new(range.len(), args.quiet || settings.json);
    let outcome = pipeline
        .run_with_progress(renderer.as_ref(), &progress)
        .map_err(pipeline_error)?;

    let report = CheckReport::new(source, &outcome.analyses, &outcome.failures);

    if settings.json {
        let json = report
            .to_json()
            .map_err(|e| CommandError::new(ExitCode::OutputError, e))?;
        println!("{}", json);
    } else {
        print!("{}", report.render_text());
        if let Some(dir) = pipeline.debug_dir() {
            if !outcome.debug_images.is_empty() {
                println!(
                    "Debug images: {} written to {}",
                    outcome.debug_images.len(),
                    dir.display()
                );
            }
        }
        if !args.quiet {
            println!("Completed in {}", format_duration(outcome.elapsed));
        }
    }

    Ok(report.exit_code())
}

fn print_check_header(source: &str, options: &MarginOptions) {
    let sides = options.enabled_sides();
    println!("Margin Analysis Configuration");
    println!("  Analyzing:       {}", source);
    println!(
        "  Page size:       {}\" x {}\" ({})",
        options.page_width_in,
        options.page_height_in,
        if options.twoside { "twoside" } else { "oneside" }
    );
    println!(
        "  Margins:         inner={}\" outer={}\" top={}\" bottom={}\"",
        options.inner_margin_in,
        options.outer_margin_in,
        options.top_margin_in,
        options.bottom_margin_in
    );
    println!(
        "  Sides checked:   {}",
        if sides.is_empty() {
            "none".to_string()
        } else {
            sides.join(", ")
        }
    );
    println!(
        "  Detection:       threshold={} min_pixels={} dpi={}",
        options.threshold, options.min_violation_pixels, options.dpi
    );
    println!(
        "  Whitespace gaps: {} (min={}\" include_margins={} skip_page_white>={}%)",
        if options.check_whitespace { "on" } else { "off" },
        options.gap_min_height_in,
        options.gap_include_margins,
        options.gap_skip_page_white_pct
    );
    println!();
}

// ============ Dimensions Command ============

fn run_dimensions(args: &DimensionsArgs) -> CommandResult {
    let expected = match (&args.vars, args.width_in, args.height_in) {
        (Some(vars), _, _) => CoverVars::load(vars)
            .map_err(dimension_error)?
            .expected_size(),
        (None, Some(w), Some(h)) => ExpectedSize::new(w, h).map_err(dimension_error)?,
        _ => {
            return Err(CommandError::new(
                ExitCode::InvalidArgs,
                "either --vars or both --width-in and --height-in are required",
            ))
        }
    };

    let report = DimensionCheck::new(expected)
        .with_tolerance_pt(args.tolerance_pt)
        .with_expected_pages(args.pages)
        .check_pdf(&args.pdf)
        .map_err(dimension_error)?;

    if args.json {
        let value = serde_json::json!({
            "pdf": args.pdf.display().to_string(),
            "ok": report.ok(),
            "report": report,
        });
        let json = serde_json::to_string_pretty(&value)
            .map_err(|e| CommandError::new(ExitCode::OutputError, e))?;
        println!("{}", json);
    } else {
        print!("{}", report.render_text());
    }

    Ok(if report.ok() {
        ExitCode::Success
    } else {
        ExitCode::CheckFailed
    })
}

// ============ Cover Command ============

fn run_cover(args: &CoverArgs) -> CommandResult {
    let spec = match (&args.pdf, args.page_count) {
        (Some(pdf), _) => CoverSpec::from_pdf(args.binding, pdf).map_err(cover_error)?,
        (None, Some(pages)) => CoverSpec::new(args.binding, pages),
        (None, None) => {
            return Err(CommandError::new(
                ExitCode::InvalidArgs,
                "either --pdf or --page-count is required",
            ))
        }
    }
    .with_trim(args.trim_width, args.trim_height)
    .with_bleed(args.bleed);

    let dims = spec.dimensions().map_err(cover_error)?;
    let content = render_cover_vars(&spec, &dims, chrono::Local::now().naive_local());

    println!("Binding: {} ({})", spec.binding, spec.binding.vendor());
    println!("Pages: {}", spec.pages);
    println!("Spine width: {:.4} in", dims.spine_in);
    if dims.wrap_in > 0.0 {
        println!("Wrap area: {:.3} in", dims.wrap_in);
    }
    println!(
        "Cover size: {:.3} x {:.3} in (with {:.3} in bleed)",
        dims.width_in, dims.height_in, spec.bleed_in
    );

    if args.dry_run {
        println!();
        print!("{}", content);
        return Ok(ExitCode::Success);
    }

    let output = args.output_path();
    write_cover_vars(&output, &content).map_err(cover_error)?;
    println!("Written: {}", output.display());

    Ok(ExitCode::Success)
}

// ============ Show Config Command ============

fn run_show_config(args: &ShowConfigArgs) -> CommandResult {
    let (config, config_path) =
        Config::load_with_override(args.config.as_deref()).map_err(config_error)?;
    let settings = config.merge_with_cli(&CliOverrides::new());

    let mut effective = Config::from_options(&settings.options);
    effective.general = config.general.clone();
    effective.general.renderer = Some(settings.renderer);
    effective.output = config.output.clone();

    match &config_path {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# No config file found; showing defaults"),
    }
    let toml = effective
        .to_toml()
        .map_err(|e| CommandError::new(ExitCode::OutputError, e))?;
    print!("{}", toml);

    Ok(ExitCode::Success)
}

// ============ Info Command ============

fn run_info() -> CommandResult {
    println!("bookcheck v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());

    println!();
    println!("PDF Renderers:");
    check_tool_with_version("pdftoppm", "Poppler", &["-v"]);
    check_tool_with_version("magick", "ImageMagick", &["--version"]);
    match RendererKind::Auto.resolve() {
        Ok(kind) => println!("  Auto selects: {:?}", kind),
        Err(_) => println!("  Auto selects: none (only --images is available)"),
    }

    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        print_config_path(&path);
    }

    Ok(ExitCode::Success)
}

fn print_config_path(path: &Path) {
    let status = if path.exists() { "found" } else { "not present" };
    println!("  {} ({})", path.display(), status);
}

fn check_tool_with_version(cmd: &str, name: &str, version_args: &[&str]) {
    match which::which(cmd) {
        Ok(path) => {
            // pdftoppm prints its version on stderr
            let first_line = std::process::Command::new(&path)
                .args(version_args)
                .output()
                .ok()
                .and_then(|output| {
                    let text = if output.stdout.is_empty() {
                        String::from_utf8_lossy(&output.stderr).into_owned()
                    } else {
                        String::from_utf8_lossy(&output.stdout).into_owned()
                    };
                    text.lines().next().map(|l| l.trim().to_string())
                })
                .filter(|line| !line.is_empty() && line.len() < 80);

            match first_line {
                Some(version) => println!("  {}: {} ({})", name, version, path.display()),
                None => println!("  {}: {} (found)", name, path.display()),
            }
        }
        Err(_) => println!("  {}: Not found", name),
    }
}
