//! CLI application for Russian Post receipt extraction.

mod output;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rpx_core::{
    run_batch, BatchStatus, CancelFile, CancelSignal, DocumentResolver, ExtractConfig,
    NeverCancel, OcrPolicy, OcrProvider, PdfTextSource, ProgressEvent, RpxError, TesseractOcr,
};

/// Extract Russian Post track numbers and access codes from receipt PDFs
#[derive(Parser)]
#[command(name = "rpx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input PDF file or directory tree
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    /// Destination file for results
    #[arg(long, value_name = "PATH")]
    output: PathBuf,

    /// Write CSV output (also implied by a .csv output extension)
    #[arg(long)]
    csv: bool,

    /// Trailing pages to examine per document (0 = all)
    #[arg(long, default_value_t = 5)]
    max_pages_back: usize,

    /// Native text shorter than this (chars) triggers the OCR fallback
    #[arg(long, default_value_t = 200)]
    min_chars_for_ocr: usize,

    /// Disable the OCR fallback entirely
    #[arg(long, conflicts_with = "force_ocr")]
    no_ocr: bool,

    /// Always OCR, ignoring the native text layer
    #[arg(long)]
    force_ocr: bool,

    /// Rasterization DPI for OCR
    #[arg(long, default_value_t = 300)]
    dpi: u32,

    /// Language spec passed to the OCR engine
    #[arg(long, default_value = "rus+eng", value_name = "LANGSPEC")]
    lang: String,

    /// Worker pool size (0 = host core count)
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Write per-page text dumps into this directory
    #[arg(long, value_name = "DIR")]
    debug_dump_text: Option<PathBuf>,

    /// Write the log to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Emit JSON progress events on stdout, one per line
    #[arg(long)]
    progress_stdout: bool,

    /// Marker file whose presence cancels the batch
    #[arg(long, value_name = "PATH")]
    cancel_file: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = ExtractConfig {
        max_pages_back: cli.max_pages_back,
        min_chars_for_ocr: cli.min_chars_for_ocr,
        ocr: ExtractConfig::policy_from_flags(cli.no_ocr, cli.force_ocr),
        dpi: cli.dpi,
        languages: cli.lang.clone(),
        workers: cli.workers,
        debug_dump_dir: cli.debug_dump_text.clone(),
    };

    // configuration errors are the only fatal ones; fail before any job runs
    if !cli.input.exists() {
        bail!("input path does not exist: {}", cli.input.display());
    }
    if config.ocr != OcrPolicy::Disabled {
        rpx_core::ocr::check_binaries().map_err(|e| RpxError::Config(e.to_string()))?;
    }

    let files = collect_pdfs(&cli.input)?;
    if files.is_empty() {
        bail!("no PDF files found under {}", cli.input.display());
    }

    let workers = config.effective_workers();
    info!("processing {} files with {} workers", files.len(), workers);

    let cancel: Box<dyn CancelSignal> = match &cli.cancel_file {
        Some(path) => Box::new(CancelFile::new(path)),
        None => Box::new(NeverCancel),
    };
    let cancel = cancel.as_ref();

    let source = PdfTextSource;
    let tesseract;
    let ocr: Option<&dyn OcrProvider> = if config.ocr == OcrPolicy::Disabled {
        None
    } else {
        tesseract = TesseractOcr::new(config.dpi, config.languages.clone());
        Some(&tesseract)
    };
    let resolver = DocumentResolver::new(&config, &source, ocr);

    let bar = (!cli.progress_stdout).then(|| progress_bar(files.len()));
    let progress_stdout = cli.progress_stdout;

    let outcome = run_batch(
        &files,
        workers,
        cancel,
        |path| resolver.resolve(path, cancel),
        |event| {
            if progress_stdout {
                emit_progress_line(event);
            }
            if let (Some(bar), ProgressEvent::Done { .. }) = (&bar, event) {
                bar.inc(1);
            }
        },
    );
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let csv_format = cli.csv
        || cli
            .output
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    output::write_results(&cli.output, &outcome.results, csv_format)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    // stdout carries only the JSON protocol when --progress-stdout is set
    if !cli.progress_stdout {
        print_summary(&outcome, &cli.output);
    }

    // per-file errors are annotations, not process failures
    Ok(())
}

/// Serialize one progress event to stdout, flushed per line so a piped
/// front-end sees it immediately.
fn emit_progress_line(event: &ProgressEvent) {
    match serde_json::to_string(event) {
        Ok(line) => {
            let mut stdout = std::io::stdout();
            if writeln!(stdout, "{}", line).and_then(|_| stdout.flush()).is_err() {
                warn!("failed to write progress event");
            }
        }
        Err(e) => warn!("failed to serialize progress event: {}", e),
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match &cli.log {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            // stdout is reserved for the progress protocol
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Enumerate input PDFs: the file itself, or a recursive directory walk.
fn collect_pdfs(input: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(if has_pdf_extension(input) {
            vec![input.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let pattern = format!("{}/**/*", input.display());
    let mut files: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && has_pdf_extension(p))
        .collect();
    files.sort();
    Ok(files)
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );
    bar
}

fn print_summary(outcome: &rpx_core::BatchOutcome, output: &Path) {
    let found = outcome
        .results
        .iter()
        .filter(|r| r.track.is_some() && r.code.is_some())
        .count();
    let failed = outcome.results.iter().filter(|r| r.error.is_some()).count();

    println!(
        "{} Processed {} files: {} complete, {} with errors",
        style("✓").green(),
        outcome.results.len(),
        style(found).green(),
        style(failed).red()
    );
    println!("   Results written to {}", output.display());

    if outcome.status == BatchStatus::Cancelled {
        println!(
            "{} Batch cancelled; {} files were not started",
            style("!").yellow(),
            outcome.skipped
        );
    }
}
