//! Error types for the rpx-core library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the rpx library.
#[derive(Error, Debug)]
pub enum RpxError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Every examined page of a document failed to read.
    #[error("no readable pages in {}", path.display())]
    DocumentUnreadable { path: PathBuf },

    /// Configuration error. Fatal; aborts before any job runs.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF text extraction.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Failed to extract the text layer of a page.
    #[error("failed to extract text from page {page}: {reason}")]
    PageText { page: u32, reason: String },
}

/// Errors related to the external rasterizer and OCR engine.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Rasterizing a PDF page to an image failed.
    #[error("rasterization failed for page {page}: {reason}")]
    Raster { page: u32, reason: String },

    /// Text recognition on a rasterized page failed.
    #[error("recognition failed for page {page}: {reason}")]
    Recognition { page: u32, reason: String },

    /// A required external binary is not installed.
    #[error("{binary} not found ({hint})")]
    MissingBinary { binary: String, hint: String },

    /// I/O error while shelling out.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
