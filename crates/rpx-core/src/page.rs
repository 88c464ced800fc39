//! Per-page orchestration: native text, OCR fallback decision, matching.

use std::path::Path;

use tracing::{debug, warn};

use crate::matcher;
use crate::models::{Candidate, ExtractConfig, Method, OcrPolicy};
use crate::ocr::OcrProvider;
use crate::pdf::DocumentText;

/// What examining one page produced. Transient; consumed by the resolver.
#[derive(Debug)]
pub struct PageOutcome {
    /// Candidates matched on this page.
    pub candidates: Vec<Candidate>,
    /// The method whose text was actually fed to the matcher.
    pub method: Method,
    /// Set only when every attempted text acquisition failed
    /// (not for merely-empty text).
    pub read_error: Option<String>,
}

/// Decides, per page, whether the native text layer suffices or the OCR
/// fallback must run, then hands the final text to the field matcher.
pub struct PageDecisionEngine<'a> {
    config: &'a ExtractConfig,
    ocr: Option<&'a dyn OcrProvider>,
}

impl<'a> PageDecisionEngine<'a> {
    /// `ocr` is `None` when OCR is disabled for the run.
    pub fn new(config: &'a ExtractConfig, ocr: Option<&'a dyn OcrProvider>) -> Self {
        Self { config, ocr }
    }

    /// Examine one page of an open document.
    pub fn examine(&self, doc: &dyn DocumentText, pdf_path: &Path, page: u32) -> PageOutcome {
        let forced = self.config.ocr == OcrPolicy::Forced;

        let mut native_error = None;
        let native = if forced {
            String::new()
        } else {
            match doc.page_text(page) {
                Ok(text) => text,
                Err(e) => {
                    debug!("native text failed for page {}: {}", page, e);
                    native_error = Some(e.to_string());
                    String::new()
                }
            }
        };

        let needs_ocr = forced || native.chars().count() < self.config.min_chars_for_ocr;

        // OCR output is authoritative once it succeeds
        let mut text = native;
        let mut method = Method::Native;
        let mut ocr_error = None;
        if needs_ocr {
            if let Some(ocr) = self.ocr {
                match ocr.page_text(pdf_path, page) {
                    Ok(recognized) => {
                        text = recognized;
                        method = Method::Ocr;
                    }
                    Err(e) => {
                        warn!("OCR failed for {} page {}: {}", pdf_path.display(), page, e);
                        ocr_error = Some(e.to_string());
                    }
                }
            }
        }

        if let Some(dir) = &self.config.debug_dump_dir {
            self.dump_text(dir, pdf_path, page, method, &text);
        }

        let native_attempted = !forced;
        let ocr_attempted = needs_ocr && self.ocr.is_some();
        let read_error = if (!native_attempted || native_error.is_some())
            && (!ocr_attempted || ocr_error.is_some())
            && (native_error.is_some() || ocr_error.is_some())
        {
            Some(
                [native_error, ocr_error]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        } else {
            None
        };

        PageOutcome {
            candidates: matcher::scan(&text, page, method),
            method,
            read_error,
        }
    }

    /// Write the final page text to the dump directory (`--debug-dump-text`).
    fn dump_text(&self, dir: &Path, pdf_path: &Path, page: u32, method: Method, text: &str) {
        let stem = pdf_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let path = dir.join(format!("{}_page{}_{}.txt", stem, page, method));
        if let Err(e) = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, text)) {
            warn!("failed to dump page text to {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, PdfError};
    use crate::models::FieldKind;
    use crate::pdf::Result as PdfResult;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeDoc {
        pages: Vec<PdfResult<String>>,
    }

    impl FakeDoc {
        fn with_page(text: &str) -> Self {
            Self {
                pages: vec![Ok(text.to_string())],
            }
        }

        fn unreadable() -> Self {
            Self {
                pages: vec![Err(PdfError::PageText {
                    page: 1,
                    reason: "broken stream".to_string(),
                })],
            }
        }
    }

    impl DocumentText for FakeDoc {
        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn page_text(&self, page: u32) -> PdfResult<String> {
            match &self.pages[(page - 1) as usize] {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(PdfError::PageText {
                    page,
                    reason: "broken stream".to_string(),
                }),
            }
        }
    }

    struct FakeOcr {
        text: Option<String>,
        calls: AtomicUsize,
    }

    impl FakeOcr {
        fn recognizing(text: &str) -> Self {
            Self {
                text: Some(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                text: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl OcrProvider for FakeOcr {
        fn page_text(&self, _pdf_path: &Path, page: u32) -> Result<String, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.text {
                Some(text) => Ok(text.clone()),
                None => Err(OcrError::Recognition {
                    page,
                    reason: "engine crashed".to_string(),
                }),
            }
        }
    }

    fn config(policy: OcrPolicy, min_chars: usize) -> ExtractConfig {
        ExtractConfig {
            ocr: policy,
            min_chars_for_ocr: min_chars,
            ..Default::default()
        }
    }

    #[test]
    fn test_short_native_text_triggers_ocr() {
        let doc = FakeDoc::with_page("too short");
        let ocr = FakeOcr::recognizing("8006 5036 2850 04 Код доступа: 1234 5678");
        let config = config(OcrPolicy::Auto, 200);
        let engine = PageDecisionEngine::new(&config, Some(&ocr));

        let outcome = engine.examine(&doc, Path::new("short.pdf"), 1);
        assert_eq!(ocr.calls(), 1);
        assert_eq!(outcome.method, Method::Ocr);
        assert_eq!(outcome.candidates.len(), 2);
        assert!(outcome.read_error.is_none());
    }

    #[test]
    fn test_sufficient_native_text_skips_ocr() {
        let text = "x".repeat(500);
        let doc = FakeDoc::with_page(&text);
        let ocr = FakeOcr::recognizing("should not be used");
        let config = config(OcrPolicy::Auto, 200);
        let engine = PageDecisionEngine::new(&config, Some(&ocr));

        let outcome = engine.examine(&doc, Path::new("long.pdf"), 1);
        assert_eq!(ocr.calls(), 0);
        assert_eq!(outcome.method, Method::Native);
        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn test_forced_policy_always_invokes_ocr() {
        let text = "x".repeat(500);
        let doc = FakeDoc::with_page(&text);
        let ocr = FakeOcr::recognizing("8006 5036 2850 04");
        let config = config(OcrPolicy::Forced, 200);
        let engine = PageDecisionEngine::new(&config, Some(&ocr));

        let outcome = engine.examine(&doc, Path::new("a.pdf"), 1);
        assert_eq!(ocr.calls(), 1);
        assert_eq!(outcome.method, Method::Ocr);
        assert_eq!(outcome.candidates[0].kind, FieldKind::Track);
    }

    #[test]
    fn test_disabled_policy_never_invokes_ocr() {
        let doc = FakeDoc::with_page("8006 5036 2850 04");
        let config = config(OcrPolicy::Disabled, 200);
        let engine = PageDecisionEngine::new(&config, None);

        let outcome = engine.examine(&doc, Path::new("a.pdf"), 1);
        assert_eq!(outcome.method, Method::Native);
        assert_eq!(outcome.candidates.len(), 1);
    }

    #[test]
    fn test_ocr_failure_degrades_to_native_text() {
        let doc = FakeDoc::with_page("8006 5036 2850 04");
        let ocr = FakeOcr::failing();
        let config = config(OcrPolicy::Auto, 200);
        let engine = PageDecisionEngine::new(&config, Some(&ocr));

        let outcome = engine.examine(&doc, Path::new("a.pdf"), 1);
        assert_eq!(ocr.calls(), 1);
        assert_eq!(outcome.method, Method::Native);
        assert_eq!(outcome.candidates[0].value, "80065036285004");
        // native text was acquired, so this is not a read failure
        assert!(outcome.read_error.is_none());
    }

    #[test]
    fn test_all_acquisitions_failing_is_a_read_error() {
        let doc = FakeDoc::unreadable();
        let ocr = FakeOcr::failing();
        let config = config(OcrPolicy::Auto, 200);
        let engine = PageDecisionEngine::new(&config, Some(&ocr));

        let outcome = engine.examine(&doc, Path::new("a.pdf"), 1);
        assert!(outcome.read_error.is_some());
        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn test_debug_dump_writes_page_text() {
        let dir = tempfile::tempdir().unwrap();
        let doc = FakeDoc::with_page("8006 5036 2850 04");
        let config = ExtractConfig {
            ocr: OcrPolicy::Disabled,
            debug_dump_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let engine = PageDecisionEngine::new(&config, None);

        engine.examine(&doc, Path::new("in/receipt.pdf"), 1);
        let dumped = std::fs::read_to_string(dir.path().join("receipt_page1_native.txt")).unwrap();
        assert_eq!(dumped, "8006 5036 2850 04");
    }
}
