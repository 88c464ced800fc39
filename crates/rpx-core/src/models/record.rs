//! Data records produced by the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of field a candidate was matched as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// 14-digit tracking number (Russian Post identifier, leading '8').
    Track,
    /// 8-digit access code.
    Code,
}

/// How the text that produced a candidate was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Embedded PDF text layer.
    Native,
    /// Rasterize + OCR fallback.
    Ocr,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Native => write!(f, "native"),
            Method::Ocr => write!(f, "ocr"),
        }
    }
}

/// A matched field value with its provenance. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Which field this value was matched as.
    pub kind: FieldKind,
    /// The digit string (length 14 for track, 8 for code).
    pub value: String,
    /// 1-indexed page the value was found on.
    pub page: u32,
    /// Extraction method that produced the page text.
    pub method: Method,
}

/// One record per input document. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Source file path.
    pub file: PathBuf,
    /// Selected tracking-number candidate, if any.
    pub track: Option<Candidate>,
    /// Selected access-code candidate, if any.
    pub code: Option<Candidate>,
    /// How many trailing pages were inspected.
    pub pages_examined: u32,
    /// Document-level error, if every examined page failed to read.
    pub error: Option<String>,
}

impl ExtractionResult {
    /// An empty result for a document that could not be opened.
    pub fn failed(file: &Path, error: impl fmt::Display) -> Self {
        Self {
            file: file.to_path_buf(),
            track: None,
            code: None,
            pages_examined: 0,
            error: Some(error.to_string()),
        }
    }

    /// The method that produced the selected candidates: `ocr` if any
    /// selected candidate came from OCR, otherwise `native` if anything
    /// was found at all.
    pub fn method(&self) -> Option<Method> {
        let methods = [
            self.track.as_ref().map(|c| c.method),
            self.code.as_ref().map(|c| c.method),
        ];
        if methods.iter().flatten().any(|m| *m == Method::Ocr) {
            Some(Method::Ocr)
        } else if methods.iter().any(Option::is_some) {
            Some(Method::Native)
        } else {
            None
        }
    }
}

/// Progress notification emitted by the batch scheduler.
///
/// Serializes to the JSON-lines protocol consumed by the GUI front-end:
/// one object per line, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// A file has been picked up by a worker.
    Start { file: String },
    /// Extraction finished for a file; carries the matched values.
    ///
    /// `track`, `code` and `method` serialize as JSON `null` when nothing
    /// was found. Absent fields are nulls rather than empty strings so a
    /// consumer can distinguish "not found" without string sentinels.
    Progress {
        file: String,
        track: Option<String>,
        code: Option<String>,
        method: Option<Method>,
    },
    /// All events for a file have been emitted.
    Done { file: String },
}

impl ProgressEvent {
    /// Build the `progress` event for a finished result.
    pub fn progress_for(result: &ExtractionResult) -> Self {
        ProgressEvent::Progress {
            file: result.file.display().to_string(),
            track: result.track.as_ref().map(|c| c.value.clone()),
            code: result.code.as_ref().map(|c| c.value.clone()),
            method: result.method(),
        }
    }
}

/// How a batch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Every enumerated file was processed.
    Complete,
    /// The cancellation signal stopped dispatch before all files started.
    Cancelled,
}

/// Aggregated outcome of a batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Per-file results, in input enumeration order.
    pub results: Vec<ExtractionResult>,
    /// Completion status.
    pub status: BatchStatus,
    /// Number of enumerated files never started due to cancellation.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidate(kind: FieldKind, value: &str, page: u32, method: Method) -> Candidate {
        Candidate {
            kind,
            value: value.to_string(),
            page,
            method,
        }
    }

    #[test]
    fn test_result_method_prefers_ocr_when_mixed() {
        let result = ExtractionResult {
            file: PathBuf::from("a.pdf"),
            track: Some(candidate(FieldKind::Track, "80065036285004", 2, Method::Native)),
            code: Some(candidate(FieldKind::Code, "12345678", 1, Method::Ocr)),
            pages_examined: 2,
            error: None,
        };
        assert_eq!(result.method(), Some(Method::Ocr));
    }

    #[test]
    fn test_result_method_absent_when_nothing_found() {
        let result = ExtractionResult::failed(Path::new("a.pdf"), "boom");
        assert_eq!(result.method(), None);
    }

    #[test]
    fn test_progress_event_json_shapes() {
        let start = ProgressEvent::Start {
            file: "in/a.pdf".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&start).unwrap(),
            r#"{"event":"start","file":"in/a.pdf"}"#
        );

        let progress = ProgressEvent::Progress {
            file: "in/a.pdf".to_string(),
            track: Some("80065036285004".to_string()),
            code: None,
            method: Some(Method::Native),
        };
        assert_eq!(
            serde_json::to_string(&progress).unwrap(),
            r#"{"event":"progress","file":"in/a.pdf","track":"80065036285004","code":null,"method":"native"}"#
        );

        let done = ProgressEvent::Done {
            file: "in/a.pdf".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&done).unwrap(),
            r#"{"event":"done","file":"in/a.pdf"}"#
        );
    }
}
