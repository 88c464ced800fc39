//! Document-level resolution: trailing-page scan and candidate merge.

use std::path::Path;

use tracing::{debug, warn};

use crate::batch::CancelSignal;
use crate::error::RpxError;
use crate::models::{Candidate, ExtractConfig, ExtractionResult, FieldKind, Method};
use crate::ocr::OcrProvider;
use crate::page::PageDecisionEngine;
use crate::pdf::TextSource;

/// Resolves one document to an [`ExtractionResult`].
///
/// Pages are examined last-first up to `max_pages_back`. The first candidate
/// found per kind wins; since pages closer to the end are visited first this
/// realizes the tie-break policy: page closeness dominates, with no
/// replacement by later-visited (earlier-from-end) pages regardless of
/// method. Scanning stops early once both fields are present with native
/// method.
pub struct DocumentResolver<'a> {
    config: &'a ExtractConfig,
    text: &'a dyn TextSource,
    ocr: Option<&'a dyn OcrProvider>,
}

impl<'a> DocumentResolver<'a> {
    pub fn new(
        config: &'a ExtractConfig,
        text: &'a dyn TextSource,
        ocr: Option<&'a dyn OcrProvider>,
    ) -> Self {
        Self { config, text, ocr }
    }

    /// Resolve a single document. Never panics and never aborts the batch:
    /// any failure is captured in the result's `error` field.
    pub fn resolve(&self, path: &Path, cancel: &dyn CancelSignal) -> ExtractionResult {
        let doc = match self.text.open(path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("cannot open {}: {}", path.display(), e);
                return ExtractionResult::failed(path, e);
            }
        };

        let engine = PageDecisionEngine::new(self.config, self.ocr);
        let mut track: Option<Candidate> = None;
        let mut code: Option<Candidate> = None;
        let mut pages_examined = 0u32;
        let mut failed_pages = 0u32;

        for page in pages_from_end(doc.page_count(), self.config.max_pages_back) {
            // in-flight documents finish their current page, nothing more
            if pages_examined > 0 && cancel.is_cancelled() {
                debug!("cancellation observed, stopping scan of {}", path.display());
                break;
            }
            pages_examined += 1;

            let outcome = engine.examine(doc.as_ref(), path, page);
            if outcome.read_error.is_some() {
                failed_pages += 1;
            }
            for candidate in outcome.candidates {
                let slot = match candidate.kind {
                    FieldKind::Track => &mut track,
                    FieldKind::Code => &mut code,
                };
                if slot.is_none() {
                    *slot = Some(candidate);
                }
            }

            if is_native(&track) && is_native(&code) {
                debug!("early success for {} on page {}", path.display(), page);
                break;
            }
        }

        let error = (pages_examined > 0 && failed_pages == pages_examined).then(|| {
            RpxError::DocumentUnreadable {
                path: path.to_path_buf(),
            }
            .to_string()
        });

        ExtractionResult {
            file: path.to_path_buf(),
            track,
            code,
            pages_examined,
            error,
        }
    }
}

fn is_native(candidate: &Option<Candidate>) -> bool {
    matches!(candidate, Some(c) if c.method == Method::Native)
}

/// Page indices from the last page backwards; 0 means no budget limit.
fn pages_from_end(total: u32, max_back: usize) -> impl Iterator<Item = u32> {
    let budget = if max_back == 0 { usize::MAX } else { max_back };
    (1..=total).rev().take(budget)
}
