//! Run totals and the serializable run summary

use super::progress::CollectedError;
use super::task::TaskOutcome;
use crate::formats::ParserVariant;
use crate::utils::constants::MAX_REPORTED_FAILURES;
use crate::utils::format_hms;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A file that ended early
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub documents_indexed: u64,
    pub message: String,
}

/// Per-file outcomes folded together by the coordinator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub files_completed: usize,
    pub files_failed: usize,
    pub documents_indexed: u64,
    pub documents_skipped: u64,
    pub records_malformed: u64,
    /// First failures, bounded
    pub failures: Vec<FailedFile>,
    /// Failures beyond the bound
    pub failures_omitted: usize,
}

impl RunTotals {
    pub fn record(&mut self, outcome: &TaskOutcome) {
        self.files_completed += 1;
        self.documents_indexed += outcome.documents_indexed;
        self.documents_skipped += outcome.documents_skipped;
        self.records_malformed += outcome.records_malformed;

        if outcome.failed {
            self.files_failed += 1;
            if self.failures.len() < MAX_REPORTED_FAILURES {
                self.failures.push(FailedFile {
                    path: outcome.file.path.clone(),
                    documents_indexed: outcome.documents_indexed,
                    message: outcome.error.clone().unwrap_or_default(),
                });
            } else {
                self.failures_omitted += 1;
            }
        }
    }
}

/// Everything known about a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub format: ParserVariant,
    pub input_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub total_files: usize,
    pub discovery_errors: usize,
    #[serde(flatten)]
    pub totals: RunTotals,
    /// Document count reported by the sink after the final commit
    pub committed_documents: u64,
    /// Collected error counts by category
    pub error_counts: BTreeMap<String, usize>,
    /// First per-file errors, bounded
    pub collected_errors: Vec<CollectedError>,
    /// Errors counted but not retained once the bound was reached
    pub errors_dropped: usize,
}

impl RunSummary {
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Elapsed wall time as `HH:MM:SS`
    #[must_use]
    pub fn elapsed_hms(&self) -> String {
        format_hms(self.elapsed())
    }

    /// Write the summary as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DiscoveredFile;

    fn outcome(name: &str, indexed: u64, failed: bool) -> TaskOutcome {
        TaskOutcome {
            file: DiscoveredFile::new(0, PathBuf::from(format!("/c/{name}")), Path::new("/c")),
            documents_indexed: indexed,
            documents_skipped: 1,
            records_malformed: 0,
            failed,
            error: failed.then(|| "Failed to decompress stream: corrupt deflate stream".into()),
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn totals_fold_outcomes() {
        let mut totals = RunTotals::default();
        totals.record(&outcome("a", 10, false));
        totals.record(&outcome("b", 3, true));
        assert_eq!(totals.files_completed, 2);
        assert_eq!(totals.files_failed, 1);
        assert_eq!(totals.documents_indexed, 13);
        assert_eq!(totals.documents_skipped, 2);
        assert_eq!(totals.failures.len(), 1);
        assert_eq!(totals.failures[0].documents_indexed, 3);
    }

    #[test]
    fn summary_serializes_flat_totals() {
        let mut totals = RunTotals::default();
        totals.record(&outcome("a", 7, false));
        let summary = RunSummary {
            format: ParserVariant::ClueWeb09,
            input_dir: PathBuf::from("/c"),
            output_dir: Some(PathBuf::from("/idx")),
            started_at: Utc::now(),
            elapsed_ms: 3_723_000,
            total_files: 1,
            discovery_errors: 0,
            totals,
            committed_documents: 7,
            error_counts: BTreeMap::from([("malformed_record".to_string(), 1)]),
            collected_errors: vec![CollectedError {
                file: "a".into(),
                category: "malformed_record",
                message: "A-3: header line without a colon".into(),
            }],
            errors_dropped: 0,
        };
        assert_eq!(summary.elapsed_hms(), "01:02:03");

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["format"], "clueweb09");
        assert_eq!(value["documents_indexed"], 7);
        assert_eq!(value["committed_documents"], 7);
        assert_eq!(value["collected_errors"][0]["category"], "malformed_record");
        assert_eq!(value["collected_errors"][0]["file"], "a");
        assert_eq!(value["errors_dropped"], 0);
    }
}
