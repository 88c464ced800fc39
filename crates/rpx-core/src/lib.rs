//! Core library for Russian Post receipt extraction.
//!
//! This crate provides:
//! - Native PDF text acquisition with an OCR fallback (pdftoppm + tesseract)
//! - Track-number / access-code field matching with label disambiguation
//! - Trailing-page document resolution with a deterministic tie-break
//! - A bounded worker pool with progress events and cooperative cancellation

pub mod batch;
pub mod error;
pub mod matcher;
pub mod models;
pub mod ocr;
pub mod page;
pub mod pdf;
pub mod resolver;

pub use batch::{run_batch, CancelFile, CancelSignal, NeverCancel};
pub use error::{OcrError, PdfError, RpxError};
pub use models::{
    BatchOutcome, BatchStatus, Candidate, ExtractConfig, ExtractionResult, FieldKind, Method,
    OcrPolicy, ProgressEvent,
};
pub use ocr::{OcrProvider, TesseractOcr};
pub use page::PageDecisionEngine;
pub use pdf::{DocumentText, PdfTextSource, TextSource};
pub use resolver::DocumentResolver;
