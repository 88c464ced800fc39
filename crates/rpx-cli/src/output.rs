//! Result file writing (CSV or plain text).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rpx_core::ExtractionResult;

/// Write the batch results to `path`, one row/line per input file.
pub fn write_results(
    path: &Path,
    results: &[ExtractionResult],
    csv_format: bool,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    // Excel on Windows wants a BOM to pick UTF-8
    #[cfg(windows)]
    writer.write_all(b"\xef\xbb\xbf")?;

    if csv_format {
        write_csv(writer, results)
    } else {
        write_plain(writer, results)
    }
}

fn write_csv<W: Write>(writer: W, results: &[ExtractionResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["file", "track", "code", "method", "error"])?;

    for result in results {
        let method = result.method().map(|m| m.to_string()).unwrap_or_default();
        wtr.write_record([
            file_name(result),
            result.track.as_ref().map(|c| c.value.as_str()).unwrap_or(""),
            result.code.as_ref().map(|c| c.value.as_str()).unwrap_or(""),
            &method,
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn write_plain<W: Write>(mut writer: W, results: &[ExtractionResult]) -> anyhow::Result<()> {
    for result in results {
        writeln!(
            writer,
            "{} - {} - {}",
            file_name(result),
            result.track.as_ref().map(|c| c.value.as_str()).unwrap_or(""),
            result.code.as_ref().map(|c| c.value.as_str()).unwrap_or(""),
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn file_name(result: &ExtractionResult) -> &str {
    result
        .file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("")
}
