//! Native PDF text acquisition.

mod text;

pub use text::PdfTextSource;

use crate::error::PdfError;
use std::path::Path;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Capability interface for native text extraction.
///
/// Opens a document once; pages are then read through [`DocumentText`].
pub trait TextSource: Send + Sync {
    /// Load a document from disk.
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentText>>;
}

/// Per-document page text access.
pub trait DocumentText: Send {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Extract the embedded text layer of a page (1-indexed).
    ///
    /// A failure here is page-local: callers treat it as empty text and
    /// defer to the OCR fallback.
    fn page_text(&self, page: u32) -> Result<String>;
}

#[cfg(test)]
impl std::fmt::Debug for dyn DocumentText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn DocumentText")
    }
}
