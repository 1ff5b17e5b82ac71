//! Page Rendering module
//!
//! Turns PDF pages into grayscale rasters for analysis. Rendering is
//! delegated to external tools (Poppler's `pdftoppm` or ImageMagick), or
//! pages can be supplied pre-rendered as image files.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

use crate::margin::RenderedPage;
use crate::pdf_reader::LopdfReader;

/// Image file extensions accepted by [`ImageDirRenderer`]
pub const PAGE_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pgm", "pnm", "tif", "tiff"];

/// Rendering error types
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF file not found: {0}")]
    PdfNotFound(PathBuf),

    #[error("Image directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("No page images found in {0}")]
    NoPageImages(PathBuf),

    #[error("Required tool not found: {0}")]
    ToolNotFound(String),

    #[error("External tool error: {0}")]
    ExternalToolError(String),

    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("Rendering failed for page {page}: {reason}")]
    RenderFailed { page: usize, reason: String },

    #[error("Could not read PDF: {0}")]
    PdfRead(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Source of rendered pages
///
/// `page_index` is 0-based. Implementations must be usable from several
/// threads at once.
pub trait PageRenderer: Send + Sync {
    /// Number of pages in the document
    fn page_count(&self) -> Result<usize>;

    /// Render one page at the given resolution
    fn render_page(&self, page_index: usize, dpi: u32) -> Result<RenderedPage>;

    /// Short renderer name for display
    fn name(&self) -> &'static str;
}

/// Renderer selection
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// pdftoppm if installed, otherwise ImageMagick
    #[default]
    Auto,
    /// Poppler pdftoppm
    Pdftoppm,
    /// ImageMagick
    Magick,
}

impl RendererKind {
    /// Resolve `Auto` against the tools installed on this machine
    pub fn resolve(self) -> Result<RendererKind> {
        match self {
            RendererKind::Auto => {
                if which::which("pdftoppm").is_ok() {
                    Ok(RendererKind::Pdftoppm)
                } else if which::which("magick").is_ok() {
                    Ok(RendererKind::Magick)
                } else {
                    Err(RenderError::ToolNotFound(
                        "pdftoppm or magick (install Poppler or ImageMagick)".to_string(),
                    ))
                }
            }
            RendererKind::Pdftoppm => {
                which::which("pdftoppm")
                    .map_err(|_| RenderError::ToolNotFound("pdftoppm".to_string()))?;
                Ok(self)
            }
            RendererKind::Magick => {
                which::which("magick")
                    .map_err(|_| RenderError::ToolNotFound("magick".to_string()))?;
                Ok(self)
            }
        }
    }
}

/// Open a renderer for a PDF file
pub fn open_pdf_renderer(pdf_path: &Path, kind: RendererKind) -> Result<Box<dyn PageRenderer>> {
    if !pdf_path.exists() {
        return Err(RenderError::PdfNotFound(pdf_path.to_path_buf()));
    }

    let renderer: Box<dyn PageRenderer> = match kind.resolve()? {
        RendererKind::Magick => Box::new(MagickRenderer::new(pdf_path)?),
        _ => Box::new(PdftoppmRenderer::new(pdf_path)?),
    };
    debug!(renderer = renderer.name(), pdf = %pdf_path.display(), "opened renderer");
    Ok(renderer)
}

/// Count pages with lopdf
fn lopdf_page_count(pdf_path: &Path) -> Result<usize> {
    LopdfReader::new(pdf_path)
        .map(|reader| reader.info.page_count)
        .map_err(|e| RenderError::PdfRead(e.to_string()))
}

fn check_page_index(page_index: usize, count: usize) -> Result<()> {
    if page_index >= count {
        return Err(RenderError::PageOutOfRange {
            page: page_index + 1,
            count,
        });
    }
    Ok(())
}

/// Run an external command, mapping a non-zero exit to `ExternalToolError`
fn run_tool(cmd: &mut Command) -> Result<()> {
    debug!(command = ?cmd, "running external tool");
    let output = cmd.output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RenderError::ExternalToolError(stderr.trim().to_string()));
    }
    Ok(())
}

fn load_rendered(path: &Path, page_index: usize) -> Result<RenderedPage> {
    let img = image::open(path).map_err(|e| RenderError::RenderFailed {
        page: page_index + 1,
        reason: e.to_string(),
    })?;
    Ok(RenderedPage::from_dynamic(&img))
}

// ============================================================
// pdftoppm
// ============================================================

/// Poppler `pdftoppm` renderer
#[derive(Debug)]
pub struct PdftoppmRenderer {
    pdf_path: PathBuf,
    page_count: usize,
}

impl PdftoppmRenderer {
    pub fn new(pdf_path: &Path) -> Result<Self> {
        if !pdf_path.exists() {
            return Err(RenderError::PdfNotFound(pdf_path.to_path_buf()));
        }
        Ok(Self {
            pdf_path: pdf_path.to_path_buf(),
            page_count: lopdf_page_count(pdf_path)?,
        })
    }
}

/// Render one page in grayscale at the crop box, so trim-size pages map to trim-size images
fn pdftoppm_args(dpi: u32, page_num: &str) -> Vec<String> {
    let mut args = vec!["-r".to_string(), dpi.to_string()];
    for flag in ["-f", page_num, "-l", page_num] {
        args.push(flag.to_string());
    }
    for flag in ["-cropbox", "-gray", "-png", "-singlefile"] {
        args.push(flag.to_string());
    }
    args
}

impl PageRenderer for PdftoppmRenderer {
    fn page_count(&self) -> Result<usize> {
        Ok(self.page_count)
    }

    fn render_page(&self, page_index: usize, dpi: u32) -> Result<RenderedPage> {
        check_page_index(page_index, self.page_count)?;

        let work_dir = tempfile::tempdir()?;
        let prefix = work_dir.path().join("page");
        let page_num = (page_index + 1).to_string();

        run_tool(
            Command::new("pdftoppm")
                .args(pdftoppm_args(dpi, &page_num))
                .arg(&self.pdf_path)
                .arg(&prefix),
        )?;

        load_rendered(&prefix.with_extension("png"), page_index)
    }

    fn name(&self) -> &'static str {
        "pdftoppm"
    }
}

// ============================================================
// ImageMagick
// ============================================================

/// ImageMagick-based renderer
#[derive(Debug)]
pub struct MagickRenderer {
    pdf_path: PathBuf,
    page_count: usize,
}

impl MagickRenderer {
    pub fn new(pdf_path: &Path) -> Result<Self> {
        if !pdf_path.exists() {
            return Err(RenderError::PdfNotFound(pdf_path.to_path_buf()));
        }
        Ok(Self {
            pdf_path: pdf_path.to_path_buf(),
            page_count: lopdf_page_count(pdf_path)?,
        })
    }
}

impl PageRenderer for MagickRenderer {
    fn page_count(&self) -> Result<usize> {
        Ok(self.page_count)
    }

    fn render_page(&self, page_index: usize, dpi: u32) -> Result<RenderedPage> {
        check_page_index(page_index, self.page_count)?;

        let work_dir = tempfile::tempdir()?;
        let output_path = work_dir.path().join("page.png");

        // Flatten transparency onto white so empty areas read as background
        run_tool(
            Command::new("magick")
                .arg("-density")
                .arg(dpi.to_string())
                .args(["-background", "white", "-alpha", "remove", "-alpha", "off"])
                .arg(format!("{}[{}]", self.pdf_path.display(), page_index))
                .args(["-colorspace", "gray"])
                .arg(&output_path),
        )?;

        load_rendered(&output_path, page_index)
    }

    fn name(&self) -> &'static str {
        "ImageMagick"
    }
}

// ============================================================
// Pre-rendered images
// ============================================================

/// Pages supplied as image files in a directory, ordered by file name
///
/// The DPI argument is ignored; the pixel-per-inch ratio is derived from the
/// image size and the physical page size.
#[derive(Debug)]
pub struct ImageDirRenderer {
    files: Vec<PathBuf>,
}

impl ImageDirRenderer {
    pub fn new(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(RenderError::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    PAGE_IMAGE_EXTENSIONS
                        .iter()
                        .any(|known| known.eq_ignore_ascii_case(ext))
                });
            if path.is_file() && is_image {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(RenderError::NoPageImages(dir.to_path_buf()));
        }

        Ok(Self { files })
    }

}

impl PageRenderer for ImageDirRenderer {
    fn page_count(&self) -> Result<usize> {
        Ok(self.files.len())
    }

    fn render_page(&self, page_index: usize, _dpi: u32) -> Result<RenderedPage> {
        check_page_index(page_index, self.files.len())?;
        load_rendered(&self.files[page_index], page_index)
    }

    fn name(&self) -> &'static str {
        "image directory"
    }
}
