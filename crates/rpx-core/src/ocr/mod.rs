//! OCR fallback via external binaries (pdftoppm + tesseract).

mod tesseract;

pub use tesseract::TesseractOcr;

use crate::error::OcrError;
use std::path::Path;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

/// Capability interface for the rasterize-then-recognize fallback.
///
/// Calls are blocking and potentially slow; they are the dominant cost of
/// the pipeline and the reason the batch scheduler runs parallel workers.
pub trait OcrProvider: Send + Sync {
    /// Rasterize one page of a PDF and recognize its text.
    fn page_text(&self, pdf_path: &Path, page: u32) -> Result<String>;
}

/// Verify that the external binaries the fallback shells out to exist.
///
/// Called once at start-up; a missing binary is a configuration error
/// unless OCR is disabled for the run.
pub fn check_binaries() -> Result<()> {
    for (binary, hint) in [
        ("pdftoppm", "install poppler-utils"),
        ("tesseract", "install tesseract-ocr"),
    ] {
        if which::which(binary).is_err() {
            return Err(OcrError::MissingBinary {
                binary: binary.to_string(),
                hint: hint.to_string(),
            });
        }
    }
    Ok(())
}
