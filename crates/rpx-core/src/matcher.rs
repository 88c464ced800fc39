//! Track-number and access-code matching.
//!
//! Pure text scanning: label-anchored windows first (a digit run next to a
//! postal label is the most reliable), then a digits-only fallback over the
//! whole page. Receipt metadata is printed in the trailing logo block, so
//! the last occurrence of a label wins. A 14-digit track run is masked out
//! before the 8-digit code search so a code is never taken from inside a
//! track number.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{Candidate, FieldKind, Method};

/// Chars of context inspected after a field label.
const LABEL_WINDOW_CHARS: usize = 500;

lazy_static! {
    // Labels printed next to the tracking number on receipts
    static ref TRACK_LABEL: Regex = Regex::new(
        r"(?i)(трек.*номер|трек\s*№|почтовый\s+идентификатор|идентификатор\s+отправления)"
    ).unwrap();

    static ref CODE_LABEL: Regex = Regex::new(r"(?i)код\s*доступа").unwrap();

    // Digit runs, allowing the grouped spacing receipts print (8006 5036 2850 04)
    static ref TRACK_RUN: Regex = Regex::new(r"8(?:\s*\d){13}").unwrap();
    static ref CODE_RUN: Regex = Regex::new(r"(?:\d\s*){8}").unwrap();

    static ref NON_DIGIT: Regex = Regex::new(r"[^0-9\s]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    // Contractual track shape: exactly 14 digits, leading '8'
    static ref TRACK14: Regex = Regex::new(r"^8\d{13}$").unwrap();
}

/// Scan a block of page text for field candidates.
///
/// Returns at most one candidate per kind, tagged with the page and the
/// extraction method that produced the text. Deterministic and side-effect
/// free.
pub fn scan(text: &str, page: u32, method: Method) -> Vec<Candidate> {
    let t = text.replace('\u{a0}', " ");

    let mut track = TRACK_LABEL
        .find_iter(&t)
        .last()
        .and_then(|m| find_track(&digits_view(window_after(&t, m.end()))).map(|(v, _)| v));

    let mut code = CODE_LABEL.find_iter(&t).last().and_then(|m| {
        let mut view = digits_view(window_after(&t, m.end()));
        if let Some((_, range)) = find_track(&view) {
            mask(&mut view, range);
        }
        find_code(&view)
    });

    if track.is_none() || code.is_none() {
        let mut view = digits_view(&t);
        if let Some((value, range)) = find_track(&view) {
            track.get_or_insert(value);
            mask(&mut view, range);
        }
        if code.is_none() {
            code = find_code(&view);
        }
    }

    let mut candidates = Vec::new();
    if let Some(value) = track {
        candidates.push(Candidate {
            kind: FieldKind::Track,
            value,
            page,
            method,
        });
    }
    if let Some(value) = code {
        candidates.push(Candidate {
            kind: FieldKind::Code,
            value,
            page,
            method,
        });
    }
    candidates
}

/// Up to `LABEL_WINDOW_CHARS` chars of text following a label match.
fn window_after(t: &str, start: usize) -> &str {
    let tail = &t[start..];
    let end = tail
        .char_indices()
        .nth(LABEL_WINDOW_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(tail.len());
    &tail[..end]
}

/// Reduce text to digits and single spaces (ASCII-only output).
fn digits_view(text: &str) -> String {
    let digits = NON_DIGIT.replace_all(text, " ");
    WHITESPACE.replace_all(&digits, " ").into_owned()
}

/// First valid track run in a digits view, with its byte range.
fn find_track(view: &str) -> Option<(String, Range<usize>)> {
    let m = TRACK_RUN.find(view)?;
    let raw: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
    TRACK14.is_match(&raw).then(|| (raw, m.range()))
}

/// First 8-digit run in a digits view.
fn find_code(view: &str) -> Option<String> {
    let m = CODE_RUN.find(view)?;
    let raw: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
    (raw.len() == 8).then_some(raw)
}

/// Blank out a matched range so later searches cannot reuse it.
fn mask(view: &mut String, range: Range<usize>) {
    let spaces = " ".repeat(range.len());
    view.replace_range(range, &spaces);
}
