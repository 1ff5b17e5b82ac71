//! PDF Reader module
//!
//! Reads page count and page boxes from a PDF without rendering it.

use lopdf::{Dictionary, Document, Object};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::util::points_to_inches;

/// Maximum depth followed up the page tree for inherited attributes
const MAX_TREE_DEPTH: usize = 32;

/// PDF reading error types
#[derive(Debug, Error)]
pub enum PdfReaderError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid PDF format: {0}")]
    InvalidFormat(String),

    #[error("Page {0} has no MediaBox")]
    MissingPageBox(usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("PDF parse error: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, PdfReaderError>;

/// PDF document information
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub path: PathBuf,
    pub page_count: usize,
    pub pages: Vec<PdfPage>,
    pub is_encrypted: bool,
}

/// Page information
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPage {
    /// 0-indexed page number
    pub index: usize,
    /// Width in points (1 point = 1/72 inch)
    pub width_pt: f64,
    /// Height in points
    pub height_pt: f64,
    /// Rotation (0, 90, 180, 270)
    pub rotation: u16,
}

impl PdfPage {
    pub fn width_in(&self) -> f64 {
        points_to_inches(self.width_pt)
    }

    pub fn height_in(&self) -> f64 {
        points_to_inches(self.height_pt)
    }

    /// Size as displayed, with width and height swapped for quarter turns
    pub fn displayed_size_pt(&self) -> (f64, f64) {
        if self.rotation % 180 == 90 {
            (self.height_pt, self.width_pt)
        } else {
            (self.width_pt, self.height_pt)
        }
    }
}

/// lopdf-based PDF reader
pub struct LopdfReader {
    pub info: PdfDocument,
}

impl LopdfReader {
    /// Open a PDF and read its page tree
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PdfReaderError::FileNotFound(path.to_path_buf()));
        }

        let document = Document::load(path).map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("header") || err_str.contains("PDF") {
                PdfReaderError::InvalidFormat(err_str)
            } else {
                PdfReaderError::ParseError(err_str)
            }
        })?;

        let is_encrypted = document.is_encrypted();
        let pages = Self::extract_pages(&document)?;

        Ok(Self {
            info: PdfDocument {
                path: path.to_path_buf(),
                page_count: pages.len(),
                pages,
                is_encrypted,
            },
        })
    }

    fn extract_pages(doc: &Document) -> Result<Vec<PdfPage>> {
        let page_ids = doc.get_pages();
        let mut pages = Vec::with_capacity(page_ids.len());

        for (index, page_id) in page_ids.values().enumerate() {
            let page_dict = doc
                .get_dictionary(*page_id)
                .map_err(|e| PdfReaderError::ParseError(e.to_string()))?;

            let (width_pt, height_pt) = Self::get_page_size(doc, page_dict)
                .ok_or(PdfReaderError::MissingPageBox(index + 1))?;

            let rotation = Self::find_inherited(doc, page_dict, b"Rotate")
                .and_then(|obj| obj.as_i64().ok())
                .map(|r| r.rem_euclid(360) as u16)
                .unwrap_or(0);

            pages.push(PdfPage {
                index,
                width_pt,
                height_pt,
                rotation,
            });
        }

        Ok(pages)
    }

    /// Look up a page attribute, walking up `/Parent` links when absent
    fn find_inherited<'a>(
        doc: &'a Document,
        page_dict: &'a Dictionary,
        key: &[u8],
    ) -> Option<&'a Object> {
        let mut dict = page_dict;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = doc.get_dictionary(parent_id).ok()?;
        }
        None
    }

    /// Page dimensions from CropBox, falling back to MediaBox
    fn get_page_size(doc: &Document, page_dict: &Dictionary) -> Option<(f64, f64)> {
        [b"CropBox".as_slice(), b"MediaBox".as_slice()]
            .iter()
            .filter_map(|key| Self::find_inherited(doc, page_dict, key))
            .find_map(|box_obj| {
                let box_arr = Self::resolve_array(doc, box_obj).ok()?;
                if box_arr.len() < 4 {
                    return None;
                }
                let x1 = Self::get_number(&box_arr[0])?;
                let y1 = Self::get_number(&box_arr[1])?;
                let x2 = Self::get_number(&box_arr[2])?;
                let y2 = Self::get_number(&box_arr[3])?;
                Some(((x2 - x1).abs(), (y2 - y1).abs()))
            })
    }

    /// Resolve an object to an array (following references)
    fn resolve_array(doc: &Document, obj: &Object) -> Result<Vec<Object>> {
        match obj {
            Object::Array(arr) => Ok(arr.clone()),
            Object::Reference(id) => {
                let resolved = doc
                    .get_object(*id)
                    .map_err(|e| PdfReaderError::ParseError(e.to_string()))?;
                Self::resolve_array(doc, resolved)
            }
            _ => Err(PdfReaderError::ParseError("Expected array".to_string())),
        }
    }

    fn get_number(obj: &Object) -> Option<f64> {
        match obj {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(f) => Some(*f as f64),
            _ => None,
        }
    }

    /// Get page by 0-based index
    pub fn get_page(&self, index: usize) -> Result<&PdfPage> {
        self.info
            .pages
            .get(index)
            .ok_or_else(|| PdfReaderError::ParseError(format!("Page {} not found", index)))
    }

    pub fn pages(&self) -> impl Iterator<Item = &PdfPage> {
        self.info.pages.iter()
    }

    pub fn is_encrypted(&self) -> bool {
        self.info.is_encrypted
    }
}
