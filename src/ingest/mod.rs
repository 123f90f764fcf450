//! Concurrent ingestion of a discovered collection into an index sink
//!
//! [`build_index`] is the whole pipeline: discovery, scheduling, commit and
//! the run summary. The pieces are public for callers that bring their own
//! sink or file list.

mod errors;
pub mod progress;
pub mod report;
pub mod scheduler;
pub mod task;

pub use errors::{IngestError, IngestResult};
pub use progress::{
    CollectedError, ErrorCollector, LineObserver, NoopObserver, ProgressObserver, SchedulerState,
};
pub use report::{FailedFile, RunSummary, RunTotals};
pub use scheduler::{SchedulerOptions, SchedulerReport};
pub use task::{IngestionTask, TaskContext, TaskOutcome};

use crate::config::IndexConfig;
use crate::discovery::discover_files;
use crate::sink::{IndexSink, MemorySink, TantivySink};
use chrono::Utc;
use imstr::ImString;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Index every file under the configured input root.
///
/// Opens a fresh Tantivy index in the output directory (or an in-memory sink
/// for dry runs), processes every discovered file exactly once and commits.
/// When a report path is configured the summary is also written there as JSON.
pub fn build_index(config: &IndexConfig, observer: &dyn ProgressObserver) -> IngestResult<RunSummary> {
    let started_at = Utc::now();
    let start = Instant::now();

    match serde_json::to_string(config) {
        Ok(json) => info!(config = %json, "Effective configuration"),
        Err(e) => warn!(error = %e, "Failed to serialize configuration"),
    }

    let errors = Arc::new(ErrorCollector::new());

    let discovery = discover_files(config.input_dir(), config.excluded_dirs())?;
    let discovery_errors = discovery.errors.len();
    let root_label = ImString::from(config.input_dir().to_string_lossy().into_owned());
    for e in &discovery.errors {
        errors.push(root_label.clone(), "discovery_error", e.to_string());
    }
    info!(
        files = discovery.len(),
        discovery_errors,
        root = %config.input_dir().display(),
        "Discovery finished"
    );

    let sink: Arc<dyn IndexSink> = if config.dry_run() {
        info!("Dry run, documents are kept in memory");
        Arc::new(MemorySink::new(config.hints()))
    } else {
        Arc::new(TantivySink::create(config)?)
    };

    let ctx = TaskContext::new(config.hints(), Arc::clone(&errors), config.audit_stderr());
    let report = scheduler::run(
        discovery.files,
        config.format(),
        sink,
        ctx,
        SchedulerOptions::from(config),
        observer,
    )?;

    let elapsed = start.elapsed();
    let summary = RunSummary {
        format: config.format(),
        input_dir: config.input_dir().clone(),
        output_dir: (!config.dry_run()).then(|| config.output_dir().clone()),
        started_at,
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        total_files: report.state.total_discovered,
        discovery_errors,
        totals: report.totals,
        committed_documents: report.committed_documents,
        error_counts: errors.counts(),
        collected_errors: errors.snapshot(),
        errors_dropped: errors.overflow(),
    };

    info!(
        files = summary.total_files,
        failed = summary.totals.files_failed,
        indexed = summary.totals.documents_indexed,
        skipped = summary.totals.documents_skipped,
        committed = summary.committed_documents,
        errors = errors.total(),
        errors_dropped = summary.errors_dropped,
        elapsed = %summary.elapsed_hms(),
        "Indexing complete"
    );

    if let Some(path) = config.report_path() {
        summary.write_json(path).map_err(|source| IngestError::Report {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Run report written");
    }

    Ok(summary)
}
