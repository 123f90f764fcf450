//! Bounded-window scheduler that fans ingestion tasks out to a worker pool
//!
//! The calling thread acts as coordinator. It owns the [`SchedulerState`],
//! keeps at most `in_flight_capacity` tasks submitted but unfinished, and
//! blocks on the completion channel between top-ups.

use super::errors::{IngestError, IngestResult};
use super::progress::{ProgressObserver, SchedulerState};
use super::report::RunTotals;
use super::task::{IngestionTask, TaskContext, TaskOutcome};
use crate::config::IndexConfig;
use crate::document::DiscoveredFile;
use crate::formats::ParserVariant;
use crate::sink::IndexSink;
use ahash::AHashSet;
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Worker pool shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub workers: usize,
    /// Maximum submitted-but-unfinished tasks, never below `workers`
    pub in_flight_capacity: usize,
}

impl SchedulerOptions {
    #[must_use]
    pub fn new(workers: usize, in_flight_capacity: usize) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            in_flight_capacity: in_flight_capacity.max(workers),
        }
    }
}

impl From<&IndexConfig> for SchedulerOptions {
    fn from(config: &IndexConfig) -> Self {
        Self::new(config.workers(), config.in_flight_capacity())
    }
}

/// What the scheduler hands back after a consistent run
#[derive(Debug, Clone)]
pub struct SchedulerReport {
    pub state: SchedulerState,
    pub totals: RunTotals,
    /// Sink document count after the final commit
    pub committed_documents: u64,
}

/// Process every file exactly once, then commit and close the sink.
///
/// Per-file failures are folded into the report. The run itself fails only
/// when the accounting does not add up or the sink cannot commit.
pub fn run(
    files: Vec<DiscoveredFile>,
    variant: ParserVariant,
    sink: Arc<dyn IndexSink>,
    ctx: TaskContext,
    options: SchedulerOptions,
    observer: &dyn ProgressObserver,
) -> IngestResult<SchedulerReport> {
    let options = SchedulerOptions::new(options.workers, options.in_flight_capacity);
    let capacity = options.in_flight_capacity;
    let mut state = SchedulerState::new(files.len());

    info!(
        files = state.total_discovered,
        workers = options.workers,
        in_flight_capacity = capacity,
        format = variant.name(),
        "Starting ingestion"
    );

    let (task_tx, task_rx) = bounded::<IngestionTask>(capacity);
    let (done_tx, done_rx) = unbounded::<TaskOutcome>();

    let mut workers = Vec::with_capacity(options.workers);
    for i in 0..options.workers {
        let spawned = spawn_worker(
            i,
            task_rx.clone(),
            done_tx.clone(),
            Arc::clone(&sink),
            ctx.clone(),
        );
        match spawned {
            Ok(handle) => workers.push(handle),
            Err(e) => {
                error!(worker = i, error = %e, "Failed to spawn ingestion worker");
                drop(task_tx);
                drop(done_tx);
                join_workers(workers);
                close_quietly(sink.as_ref());
                return Err(IngestError::WorkerSpawn(e));
            }
        }
    }
    // Only workers hold these now, so the channels disconnect when they exit
    drop(task_rx);
    drop(done_tx);

    let mut backlog = files.into_iter();
    let mut totals = RunTotals::default();
    let mut seen = AHashSet::with_capacity(state.total_discovered);
    let mut last_logged_percent = None;
    let mut duplicate = None;

    loop {
        while state.in_flight() < capacity && state.backlog() > 0 {
            let Some(file) = backlog.next() else {
                break;
            };
            if let Err(e) = task_tx.send(IngestionTask::new(file, variant)) {
                error!(path = %e.0.file.path.display(), "Worker pool disconnected, stopping submission");
                break;
            }
            state.record_submitted();
        }
        report_progress(&state, observer, &mut last_logged_percent);

        if state.in_flight() == 0 {
            break;
        }
        let Ok(outcome) = done_rx.recv() else {
            warn!(in_flight = state.in_flight(), "Completion channel closed early");
            break;
        };
        if !seen.insert(outcome.file.seq) {
            duplicate = Some(outcome.file);
            break;
        }
        state.record_completed();
        totals.record(&outcome);
        observer.on_task_completed(&outcome, &state);
    }

    drop(task_tx);
    join_workers(workers);

    if let Some(file) = duplicate {
        error!(seq = file.seq, path = %file.path.display(), "Task completed more than once");
        close_quietly(sink.as_ref());
        return Err(IngestError::DuplicateCompletion {
            seq: file.seq,
            path: file.path,
        });
    }
    if !state.is_finished() {
        error!(
            discovered = state.total_discovered,
            completed = state.completed,
            "Consistency check failed, index not committed"
        );
        close_quietly(sink.as_ref());
        return Err(IngestError::Consistency {
            discovered: state.total_discovered,
            completed: state.completed,
        });
    }

    info!(
        files = state.completed,
        failed = totals.files_failed,
        indexed = totals.documents_indexed,
        "All files processed, committing index"
    );
    let committed_documents = match sink.commit() {
        Ok(count) => count,
        Err(e) => {
            close_quietly(sink.as_ref());
            return Err(e.into());
        }
    };
    sink.close()?;

    Ok(SchedulerReport {
        state,
        totals,
        committed_documents,
    })
}

fn spawn_worker(
    index: usize,
    tasks: Receiver<IngestionTask>,
    done: Sender<TaskOutcome>,
    sink: Arc<dyn IndexSink>,
    ctx: TaskContext,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("ingest-worker-{index}"))
        .spawn(move || {
            for task in tasks {
                let outcome = match panic::catch_unwind(AssertUnwindSafe(|| task.run(&*sink, &ctx)))
                {
                    Ok(outcome) => outcome,
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        error!(path = %task.file.path.display(), panic = %message, "Ingestion task panicked");
                        TaskOutcome::panicked(task.file.clone(), &message)
                    }
                };
                if done.send(outcome).is_err() {
                    break;
                }
            }
            debug!(worker = index, "Ingestion worker exiting");
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn join_workers(workers: Vec<JoinHandle<()>>) {
    for handle in workers {
        let name = handle.thread().name().unwrap_or("ingest-worker").to_string();
        if handle.join().is_err() {
            error!(worker = %name, "Ingestion worker terminated abnormally");
        }
    }
}

fn close_quietly(sink: &dyn IndexSink) {
    if let Err(e) = sink.close() {
        warn!(error = %e, "Failed to close index sink");
    }
}

/// Observer on every cycle, the log only when the whole percentage moves
fn report_progress(
    state: &SchedulerState,
    observer: &dyn ProgressObserver,
    last_logged_percent: &mut Option<u64>,
) {
    observer.on_progress(state);
    let percent = state.percent_complete();
    let whole = percent.floor() as u64;
    if *last_logged_percent != Some(whole) {
        *last_logged_percent = Some(whole);
        info!(
            completed = state.completed,
            total = state.total_discovered,
            in_flight = state.in_flight(),
            backlog = state.backlog(),
            "Progress: {percent:.2}%"
        );
    }
}
