//! PDF text layer extraction using lopdf and pdf-extract.

use std::fs;
use std::path::Path;

use lopdf::Document;
use tracing::{debug, trace};

use super::{DocumentText, Result, TextSource};
use crate::error::PdfError;

/// Text source backed by the PDF's embedded text layer.
pub struct PdfTextSource;

impl TextSource for PdfTextSource {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentText>> {
        let raw = fs::read(path).map_err(|e| PdfError::Parse(e.to_string()))?;
        let mut doc = Document::load_mem(&raw).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        let raw = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            raw
        };

        let page_count = doc.get_pages().len() as u32;
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("loaded {} with {} pages", path.display(), page_count);
        Ok(Box::new(LoadedPdf {
            doc,
            raw,
            page_count,
        }))
    }
}

/// A loaded document: lopdf for per-page extraction, raw bytes kept for
/// the pdf-extract whole-document fallback.
struct LoadedPdf {
    doc: Document,
    raw: Vec<u8>,
    page_count: u32,
}

impl DocumentText for LoadedPdf {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn page_text(&self, page: u32) -> Result<String> {
        match self.doc.extract_text(&[page]) {
            Ok(text) => Ok(text),
            Err(e) => {
                trace!("lopdf page {} extraction failed: {}, trying pdf-extract", page, e);
                self.page_text_fallback(page).map_err(|reason| PdfError::PageText {
                    page,
                    reason,
                })
            }
        }
    }
}

impl LoadedPdf {
    /// Whole-document extraction split evenly into per-page line ranges.
    ///
    /// pdf-extract has no page addressing, so this is an approximation;
    /// good enough for the trailing receipt pages this pipeline reads.
    fn page_text_fallback(&self, page: u32) -> std::result::Result<String, String> {
        let full_text =
            pdf_extract::extract_text_from_mem(&self.raw).map_err(|e| e.to_string())?;
        Ok(page_lines(&full_text, page, self.page_count))
    }
}

/// Lines of `full_text` assigned to `page` when split evenly across
/// `pages`. The last page takes the division remainder, so no trailing
/// line is ever unassigned.
fn page_lines(full_text: &str, page: u32, pages: u32) -> String {
    let lines: Vec<&str> = full_text.lines().collect();
    let per_page = lines.len() / pages.max(1) as usize;

    let start = ((page - 1) as usize) * per_page;
    let end = if page >= pages {
        lines.len()
    } else {
        (page as usize) * per_page
    };

    lines[start.min(lines.len())..end.min(lines.len())].join("\n")
}
