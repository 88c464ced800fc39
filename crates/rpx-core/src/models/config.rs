//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// OCR usage policy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrPolicy {
    /// OCR only when the native text layer is insufficient.
    Auto,
    /// Always OCR; the native text layer is not consulted.
    Forced,
    /// Never OCR; insufficient pages contribute whatever native text they have.
    Disabled,
}

/// Main configuration for the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// How many trailing pages to examine per document.
    pub max_pages_back: usize,

    /// Native text shorter than this (in chars) triggers the OCR fallback.
    pub min_chars_for_ocr: usize,

    /// OCR usage policy.
    pub ocr: OcrPolicy,

    /// DPI for rasterizing pages before OCR.
    pub dpi: u32,

    /// Language spec passed to the OCR engine (e.g. "rus+eng").
    pub languages: String,

    /// Worker pool size; 0 resolves to the host core count at start-up.
    pub workers: usize,

    /// Directory for per-page text dumps, if any.
    pub debug_dump_dir: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_pages_back: 5,
            min_chars_for_ocr: 200,
            ocr: OcrPolicy::Auto,
            dpi: 300,
            languages: "rus+eng".to_string(),
            workers: 0,
            debug_dump_dir: None,
        }
    }
}

impl ExtractConfig {
    /// Build the OCR policy from the two CLI toggles.
    ///
    /// The toggles are mutually exclusive; the CLI enforces that before
    /// this is called.
    pub fn policy_from_flags(no_ocr: bool, force_ocr: bool) -> OcrPolicy {
        match (no_ocr, force_ocr) {
            (true, _) => OcrPolicy::Disabled,
            (false, true) => OcrPolicy::Forced,
            (false, false) => OcrPolicy::Auto,
        }
    }

    /// Resolve the configured worker count, once, at start-up.
    ///
    /// 0 means auto-detect the available core count.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        }
    }
}
