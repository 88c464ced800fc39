//! Integration tests for the rpx binary.

use std::path::Path;

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;

/// Build a one-page PDF whose text layer contains `text`.
fn build_pdf(path: &Path, text: &str) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn rpx() -> Command {
    Command::cargo_bin("rpx").unwrap()
}

#[test]
fn test_conflicting_ocr_flags_are_rejected() {
    rpx()
        .args(["--input", "x.pdf", "--output", "out.csv", "--no-ocr", "--force-ocr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_missing_input_is_a_fatal_configuration_error() {
    rpx()
        .args([
            "--input",
            "/nonexistent/receipts",
            "--output",
            "out.csv",
            "--no-ocr",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_directory_without_pdfs_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    rpx()
        .args(["--no-ocr", "--output"])
        .arg(dir.path().join("out.csv"))
        .arg("--input")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no PDF files"));
}

#[test]
fn test_csv_extraction_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("receipt.pdf");
    let out = dir.path().join("results.csv");
    build_pdf(&pdf, "postal receipt 80012345678901 access 12345678 end");

    rpx()
        .arg("--input")
        .arg(&pdf)
        .arg("--output")
        .arg(&out)
        .args(["--csv", "--no-ocr"])
        .assert()
        .success();

    let csv = std::fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("file,track,code,method,error"));
    assert!(csv.contains("receipt.pdf,80012345678901,12345678,native,"));
}

#[test]
fn test_plain_output_format() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("receipt.pdf");
    let out = dir.path().join("results.txt");
    build_pdf(&pdf, "postal receipt 80012345678901 access 12345678 end");

    rpx()
        .arg("--input")
        .arg(&pdf)
        .arg("--output")
        .arg(&out)
        .arg("--no-ocr")
        .assert()
        .success();

    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text, "receipt.pdf - 80012345678901 - 12345678\n");
}

#[test]
fn test_progress_stdout_emits_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("receipt.pdf");
    let out = dir.path().join("results.csv");
    build_pdf(&pdf, "postal receipt 80012345678901 access 12345678 end");

    let assert = rpx()
        .arg("--input")
        .arg(&pdf)
        .arg("--output")
        .arg(&out)
        .args(["--csv", "--no-ocr", "--progress-stdout"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains(r#""event":"start""#));
    assert!(lines[1].contains(r#""event":"progress""#));
    assert!(lines[1].contains(r#""track":"80012345678901""#));
    assert!(lines[2].contains(r#""event":"done""#));
    // every line is an independent JSON object
    for line in lines {
        serde_json::from_str::<serde_json::Value>(line).unwrap();
    }
}

#[test]
fn test_preexisting_cancel_file_skips_all_work() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("receipt.pdf");
    let out = dir.path().join("results.csv");
    let marker = dir.path().join("stop.flag");
    build_pdf(&pdf, "postal receipt 80012345678901 access 12345678 end");
    std::fs::write(&marker, b"stop").unwrap();

    rpx()
        .arg("--input")
        .arg(&pdf)
        .arg("--output")
        .arg(&out)
        .arg("--cancel-file")
        .arg(&marker)
        .args(["--csv", "--no-ocr"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled"));

    // header only, no rows
    let csv = std::fs::read_to_string(&out).unwrap();
    assert_eq!(csv.lines().count(), 1);
}
