//! Configuration file support for bookcheck
//!
//! Supports TOML configuration files with the following search order:
//! 1. `--config <path>` - explicitly specified path
//! 2. `./bookcheck.toml` - current directory
//! 3. `~/.config/bookcheck/config.toml` - user config
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! threads = 4
//! renderer = "pdftoppm"
//!
//! [page]
//! width = 6.0
//! height = 9.0
//! twoside = true
//!
//! [margins]
//! inner = 0.75
//! outer = 0.625
//! top = 0.7
//! bottom = 0.8
//!
//! [whitespace]
//! enabled = true
//! min_height = 1.5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::margin::MarginOptions;
use crate::render::RendererKind;

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// File not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// General configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Number of threads for parallel page analysis
    #[serde(default)]
    pub threads: Option<usize>,

    /// Page renderer
    #[serde(default)]
    pub renderer: Option<RendererKind>,
}

/// Physical page configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageConfig {
    /// Page width in inches
    #[serde(default)]
    pub width: Option<f64>,

    /// Page height in inches
    #[serde(default)]
    pub height: Option<f64>,

    /// Swap inner/outer margins on even pages
    #[serde(default)]
    pub twoside: Option<bool>,
}

/// Margin widths and skip zones
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MarginsConfig {
    #[serde(default)]
    pub inner: Option<f64>,

    #[serde(default)]
    pub outer: Option<f64>,

    #[serde(default)]
    pub top: Option<f64>,

    #[serde(default)]
    pub bottom: Option<f64>,

    /// Percentage of the top margin skipped in side scans
    #[serde(default)]
    pub top_skip_pct: Option<f64>,

    /// Percentage of the bottom margin skipped in side scans
    #[serde(default)]
    pub bottom_skip_pct: Option<f64>,
}

/// Content detection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectionConfig {
    /// Pixel threshold (0-255)
    #[serde(default)]
    pub threshold: Option<u8>,

    /// Minimum content pixels for a violation
    #[serde(default)]
    pub min_pixels: Option<u32>,

    /// Render resolution
    #[serde(default)]
    pub dpi: Option<u32>,

    /// Page number zone start (% of page width)
    #[serde(default)]
    pub page_num_start: Option<f64>,

    /// Page number zone end (% of page width)
    #[serde(default)]
    pub page_num_end: Option<f64>,
}

/// Page selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PagesConfig {
    #[serde(default)]
    pub skip_first: Option<usize>,

    #[serde(default)]
    pub skip_last: Option<usize>,
}

/// Per-side enables
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SidesConfig {
    #[serde(default)]
    pub left: Option<bool>,

    #[serde(default)]
    pub right: Option<bool>,

    #[serde(default)]
    pub top: Option<bool>,

    #[serde(default)]
    pub bottom: Option<bool>,
}

/// Whitespace gap detection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WhitespaceConfig {
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Minimum gap height in inches
    #[serde(default)]
    pub min_height: Option<f64>,

    #[serde(default)]
    pub include_margins: Option<bool>,

    #[serde(default)]
    pub skip_page_white_pct: Option<f64>,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Directory for debug overlay images
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[serde(default)]
    pub json: Option<bool>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub page: PageConfig,

    #[serde(default)]
    pub margins: MarginsConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub pages: PagesConfig,

    #[serde(default)]
    pub sides: SidesConfig,

    #[serde(default)]
    pub whitespace: WhitespaceConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Fully resolved settings for a `check` run
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSettings {
    pub options: MarginOptions,
    pub threads: Option<usize>,
    pub renderer: RendererKind,
    pub debug_dir: Option<PathBuf>,
    pub json: bool,
}

impl Config {
    /// Load configuration from the default search path
    ///
    /// Returns the config and the file it came from (if any).
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in Self::search_paths() {
            if path.exists() {
                let config = Self::load_from_path(&path)?;
                return Ok((config, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }

    /// Load from `--config` if given, otherwise search the default paths
    pub fn load_with_override(path: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match path {
            Some(path) => Ok((Self::load_from_path(path)?, Some(path.to_path_buf()))),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Config with every value filled from the given options
    pub fn from_options(options: &MarginOptions) -> Self {
        Self {
            general: GeneralConfig {
                threads: None,
                renderer: Some(RendererKind::Auto),
            },
            page: PageConfig {
                width: Some(options.page_width_in),
                height: Some(options.page_height_in),
                twoside: Some(options.twoside),
            },
            margins: MarginsConfig {
                inner: Some(options.inner_margin_in),
                outer: Some(options.outer_margin_in),
                top: Some(options.top_margin_in),
                bottom: Some(options.bottom_margin_in),
                top_skip_pct: Some(options.top_skip_pct),
                bottom_skip_pct: Some(options.bottom_skip_pct),
            },
            detection: DetectionConfig {
                threshold: Some(options.threshold),
                min_pixels: Some(options.min_violation_pixels),
                dpi: Some(options.dpi),
                page_num_start: Some(options.page_num_center_start_pct),
                page_num_end: Some(options.page_num_center_end_pct),
            },
            pages: PagesConfig {
                skip_first: Some(options.skip_first),
                skip_last: Some(options.skip_last),
            },
            sides: SidesConfig {
                left: Some(options.check_left),
                right: Some(options.check_right),
                top: Some(options.check_top),
                bottom: Some(options.check_bottom),
            },
            whitespace: WhitespaceConfig {
                enabled: Some(options.check_whitespace),
                min_height: Some(options.gap_min_height_in),
                include_margins: Some(options.gap_include_margins),
                skip_page_white_pct: Some(options.gap_skip_page_white_pct),
            },
            output: OutputConfig {
                debug_dir: None,
                json: Some(false),
            },
        }
    }

    /// Convert to analyzer options
    pub fn to_margin_options(&self) -> MarginOptions {
        self.merge_with_cli(&CliOverrides::default()).options
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> CheckSettings {
        let d = MarginOptions::default();

        let options = MarginOptions::builder()
            .page_size(
                cli.page_width.or(self.page.width).unwrap_or(d.page_width_in),
                cli.page_height.or(self.page.height).unwrap_or(d.page_height_in),
            )
            .margins(
                cli.inner.or(self.margins.inner).unwrap_or(d.inner_margin_in),
                cli.outer.or(self.margins.outer).unwrap_or(d.outer_margin_in),
                cli.top.or(self.margins.top).unwrap_or(d.top_margin_in),
                cli.bottom.or(self.margins.bottom).unwrap_or(d.bottom_margin_in),
            )
            .twoside(cli.twoside.or(self.page.twoside).unwrap_or(d.twoside))
            .skip_pct(
                cli.top_skip_pct
                    .or(self.margins.top_skip_pct)
                    .unwrap_or(d.top_skip_pct),
                cli.bottom_skip_pct
                    .or(self.margins.bottom_skip_pct)
                    .unwrap_or(d.bottom_skip_pct),
            )
            .page_number_zone(
                cli.page_num_start
                    .or(self.detection.page_num_start)
                    .unwrap_or(d.page_num_center_start_pct),
                cli.page_num_end
                    .or(self.detection.page_num_end)
                    .unwrap_or(d.page_num_center_end_pct),
            )
            .threshold(cli.threshold.or(self.detection.threshold).unwrap_or(d.threshold))
            .min_violation_pixels(
                cli.min_pixels
                    .or(self.detection.min_pixels)
                    .unwrap_or(d.min_violation_pixels),
            )
            .dpi(cli.dpi.or(self.detection.dpi).unwrap_or(d.dpi))
            .skip_pages(
                cli.skip_first.or(self.pages.skip_first).unwrap_or(d.skip_first),
                cli.skip_last.or(self.pages.skip_last).unwrap_or(d.skip_last),
            )
            .sides(
                cli.check_left.or(self.sides.left).unwrap_or(d.check_left),
                cli.check_right.or(self.sides.right).unwrap_or(d.check_right),
                cli.check_top.or(self.sides.top).unwrap_or(d.check_top),
                cli.check_bottom.or(self.sides.bottom).unwrap_or(d.check_bottom),
            )
            .check_whitespace(
                cli.check_whitespace
                    .or(self.whitespace.enabled)
                    .unwrap_or(d.check_whitespace),
            )
            .gap_min_height_in(
                cli.gap_min_height
                    .or(self.whitespace.min_height)
                    .unwrap_or(d.gap_min_height_in),
            )
            .gap_include_margins(
                cli.gap_include_margins
                    .or(self.whitespace.include_margins)
                    .unwrap_or(d.gap_include_margins),
            )
            .gap_skip_page_white_pct(
                cli.gap_skip_page_white_pct
                    .or(self.whitespace.skip_page_white_pct)
                    .unwrap_or(d.gap_skip_page_white_pct),
            )
            .build();

        CheckSettings {
            options,
            threads: cli.threads.or(self.general.threads),
            renderer: cli
                .renderer
                .or(self.general.renderer)
                .unwrap_or_default(),
            debug_dir: cli
                .debug_dir
                .clone()
                .or_else(|| self.output.debug_dir.clone()),
            json: cli.json.or(self.output.json).unwrap_or(false),
        }
    }

    /// Get config file search paths
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("bookcheck.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("bookcheck").join("config.toml"));
        }

        paths
    }
}

/// CLI override values for merging with config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub page_width: Option<f64>,
    pub page_height: Option<f64>,
    pub inner: Option<f64>,
    pub outer: Option<f64>,
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub twoside: Option<bool>,
    pub top_skip_pct: Option<f64>,
    pub bottom_skip_pct: Option<f64>,
    pub page_num_start: Option<f64>,
    pub page_num_end: Option<f64>,
    pub threshold: Option<u8>,
    pub min_pixels: Option<u32>,
    pub dpi: Option<u32>,
    pub skip_first: Option<usize>,
    pub skip_last: Option<usize>,
    pub check_left: Option<bool>,
    pub check_right: Option<bool>,
    pub check_top: Option<bool>,
    pub check_bottom: Option<bool>,
    pub check_whitespace: Option<bool>,
    pub gap_min_height: Option<f64>,
    pub gap_include_margins: Option<bool>,
    pub gap_skip_page_white_pct: Option<f64>,
    pub threads: Option<usize>,
    pub renderer: Option<RendererKind>,
    pub debug_dir: Option<PathBuf>,
    pub json: Option<bool>,
}

impl CliOverrides {
    /// Create new empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set DPI override
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    /// Set page size override
    pub fn with_page_size(mut self, width: f64, height: f64) -> Self {
        self.page_width = Some(width);
        self.page_height = Some(height);
        self
    }

    /// Set twoside override
    pub fn with_twoside(mut self, twoside: bool) -> Self {
        self.twoside = Some(twoside);
        self
    }

    /// Set whitespace detection override
    pub fn with_whitespace(mut self, enabled: bool) -> Self {
        self.check_whitespace = Some(enabled);
        self
    }
}
