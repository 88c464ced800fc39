//! Concurrent batch scheduling over a bounded worker pool.
//!
//! The workload is blocking external-process invocation (rasterizer, OCR),
//! so the pool is plain OS threads pulling file indices from a shared
//! counter. Progress events and results funnel through an mpsc channel to a
//! single aggregation point on the calling thread; nothing else is shared
//! mutably between workers.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use tracing::{debug, info};

use crate::models::{BatchOutcome, BatchStatus, ExtractionResult, ProgressEvent};

/// Read-only cancellation signal, polled at defined checkpoints.
///
/// The write side is external (for the marker-file implementation, whoever
/// creates the file).
pub trait CancelSignal: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

/// A signal that never fires.
pub struct NeverCancel;

impl CancelSignal for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Marker-file cancellation: the file's presence stops new dispatch.
pub struct CancelFile {
    path: PathBuf,
}

impl CancelFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CancelSignal for CancelFile {
    fn is_cancelled(&self) -> bool {
        self.path.exists()
    }
}

enum WorkerMsg {
    Event(ProgressEvent),
    Finished {
        index: usize,
        result: ExtractionResult,
    },
}

/// Run `processor` over `files` on a pool of `workers` threads.
///
/// Events for one file are emitted in start → progress → done order; the
/// global interleaving across files is arbitrary. Results come back in
/// input enumeration order, so the outcome is independent of the
/// parallelism degree. Workers poll `cancel` before claiming a new file;
/// a file already claimed runs to completion.
pub fn run_batch<P, S>(
    files: &[PathBuf],
    workers: usize,
    cancel: &dyn CancelSignal,
    processor: P,
    mut sink: S,
) -> BatchOutcome
where
    P: Fn(&Path) -> ExtractionResult + Sync,
    S: FnMut(&ProgressEvent),
{
    let pool_size = workers.max(1).min(files.len().max(1));
    debug!("dispatching {} files across {} workers", files.len(), pool_size);

    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<WorkerMsg>();
    let mut slots: Vec<Option<ExtractionResult>> = Vec::new();
    slots.resize_with(files.len(), || None);

    thread::scope(|s| {
        for _ in 0..pool_size {
            let tx = tx.clone();
            let next = &next;
            let processor = &processor;
            s.spawn(move || {
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(file) = files.get(index) else { break };

                    let name = file.display().to_string();
                    let _ = tx.send(WorkerMsg::Event(ProgressEvent::Start { file: name.clone() }));
                    let result = processor(file);
                    let _ = tx.send(WorkerMsg::Event(ProgressEvent::progress_for(&result)));
                    let _ = tx.send(WorkerMsg::Event(ProgressEvent::Done { file: name }));
                    let _ = tx.send(WorkerMsg::Finished { index, result });
                }
            });
        }
        drop(tx);

        // single aggregation point; the only place results and events meet
        for msg in rx {
            match msg {
                WorkerMsg::Event(event) => sink(&event),
                WorkerMsg::Finished { index, result } => slots[index] = Some(result),
            }
        }
    });

    let results: Vec<ExtractionResult> = slots.into_iter().flatten().collect();
    let skipped = files.len() - results.len();
    let status = if skipped > 0 {
        info!("batch cancelled with {} files not started", skipped);
        BatchStatus::Cancelled
    } else {
        BatchStatus::Complete
    };

    BatchOutcome {
        results,
        status,
        skipped,
    }
}
