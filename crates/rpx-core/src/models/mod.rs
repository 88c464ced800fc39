//! Configuration and data records.

pub mod config;
pub mod record;

pub use config::{ExtractConfig, OcrPolicy};
pub use record::{
    BatchOutcome, BatchStatus, Candidate, ExtractionResult, FieldKind, Method, ProgressEvent,
};
