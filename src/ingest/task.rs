//! One discovered file, parsed and submitted end to end

use super::progress::ErrorCollector;
use crate::document::{DiscoveredFile, IndexingHints};
use crate::formats::{FormatError, ParsedRecord, ParserVariant, SkipReason, SkippedRecord};
use crate::sink::IndexSink;
use crate::utils::constants::MAX_ERROR_MESSAGE_CHARS;
use crate::utils::safe_truncate_chars;
use std::fs::File;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Shared, read-only state handed to every task
#[derive(Clone)]
pub struct TaskContext {
    pub hints: IndexingHints,
    pub errors: Arc<ErrorCollector>,
    /// Print the id of every skipped record on stderr
    pub audit_stderr: bool,
}

impl TaskContext {
    #[must_use]
    pub fn new(hints: IndexingHints, errors: Arc<ErrorCollector>, audit_stderr: bool) -> Self {
        Self {
            hints,
            errors,
            audit_stderr,
        }
    }
}

/// Unit of work distributed to the worker pool
#[derive(Debug, Clone)]
pub struct IngestionTask {
    pub file: DiscoveredFile,
    pub variant: ParserVariant,
}

/// Result of one task; every task produces exactly one
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub file: DiscoveredFile,
    /// Documents accepted by the sink, including those accepted before a failure
    pub documents_indexed: u64,
    pub documents_skipped: u64,
    /// Skipped records that were damaged rather than merely empty
    pub records_malformed: u64,
    pub failed: bool,
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl TaskOutcome {
    fn new(file: DiscoveredFile) -> Self {
        Self {
            file,
            documents_indexed: 0,
            documents_skipped: 0,
            records_malformed: 0,
            failed: false,
            error: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Outcome for a task that panicked on its worker
    #[must_use]
    pub fn panicked(file: DiscoveredFile, message: &str) -> Self {
        let mut outcome = Self::new(file);
        outcome.failed = true;
        outcome.error = Some(format!("task panicked: {message}"));
        outcome
    }

    fn fail(&mut self, message: String) {
        self.failed = true;
        self.error = Some(safe_truncate_chars(&message, MAX_ERROR_MESSAGE_CHARS).to_string());
    }
}

impl IngestionTask {
    #[must_use]
    pub fn new(file: DiscoveredFile, variant: ParserVariant) -> Self {
        Self { file, variant }
    }

    /// Parse the file and forward every document to `sink`.
    ///
    /// Never returns an error: stream and sink failures end the file early
    /// and are reported through the outcome and the error collector.
    pub fn run(&self, sink: &dyn IndexSink, ctx: &TaskContext) -> TaskOutcome {
        let start = Instant::now();
        let mut outcome = TaskOutcome::new(self.file.clone());
        let path = &self.file.path;

        let records = match File::open(path).and_then(|f| self.variant.open(f, ctx.hints)) {
            Ok(records) => records,
            Err(e) => {
                let e = FormatError::Io(e);
                error!(path = %path.display(), error = %e, "Failed to open input file");
                self.collect(ctx, e.category(), &e.to_string());
                outcome.fail(e.to_string());
                outcome.elapsed = start.elapsed();
                return outcome;
            }
        };

        for record in records {
            match record {
                Ok(ParsedRecord::Document(document)) => {
                    if document.is_blank() {
                        let skipped = SkippedRecord {
                            id: document.id,
                            reason: SkipReason::EmptyContent,
                        };
                        self.note_skipped(&skipped, ctx, &mut outcome);
                        continue;
                    }
                    let doc_id = document.id.clone();
                    if let Err(e) = sink.add_document(document) {
                        error!(
                            path = %path.display(),
                            doc_id = doc_id.as_deref().unwrap_or("<no-id>"),
                            error = %e,
                            "Index sink rejected document, abandoning file"
                        );
                        self.collect(ctx, e.category(), &e.to_string());
                        outcome.fail(e.to_string());
                        break;
                    }
                    outcome.documents_indexed += 1;
                }
                Ok(ParsedRecord::Skipped(skipped)) => {
                    self.note_skipped(&skipped, ctx, &mut outcome);
                }
                Err(e) => {
                    error!(
                        path = %path.display(),
                        indexed_before_failure = outcome.documents_indexed,
                        error = %e,
                        "Stream error, abandoning file"
                    );
                    self.collect(ctx, e.category(), &e.to_string());
                    outcome.fail(e.to_string());
                    break;
                }
            }
        }

        outcome.elapsed = start.elapsed();
        debug!(
            path = %path.display(),
            indexed = outcome.documents_indexed,
            skipped = outcome.documents_skipped,
            malformed = outcome.records_malformed,
            failed = outcome.failed,
            elapsed_ms = outcome.elapsed.as_millis(),
            "File processed"
        );
        outcome
    }

    fn note_skipped(&self, skipped: &SkippedRecord, ctx: &TaskContext, outcome: &mut TaskOutcome) {
        outcome.documents_skipped += 1;
        let id = skipped.display_id();
        let path = self.file.relative_path.as_str();

        match &skipped.reason {
            SkipReason::EmptyContent => {
                debug!(path, doc_id = id, "Skipping record with empty content");
            }
            SkipReason::Html(e) => {
                outcome.records_malformed += 1;
                error!(path, doc_id = id, error = %e, "HTML extraction failed");
                self.collect(ctx, "html_error", &format!("{id}: {e}"));
            }
            SkipReason::Malformed(reason) => {
                outcome.records_malformed += 1;
                warn!(path, doc_id = id, reason = %reason, "Malformed record");
                self.collect(ctx, "malformed_record", &format!("{id}: {reason}"));
            }
            SkipReason::MissingId => {
                outcome.records_malformed += 1;
                warn!(path, "Response record without WARC-TREC-ID");
                self.collect(ctx, "missing_id", "record without identifier");
            }
        }

        if ctx.audit_stderr {
            eprintln!("{id}");
        }
    }

    fn collect(&self, ctx: &TaskContext, category: &'static str, message: &str) {
        ctx.errors.push(
            self.file.relative_path.clone(),
            category,
            safe_truncate_chars(message, MAX_ERROR_MESSAGE_CHARS),
        );
    }
}
