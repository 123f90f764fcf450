//! Error types for an ingestion run

use crate::discovery::DiscoveryError;
use crate::sink::SinkError;
use std::path::PathBuf;
use thiserror::Error;

pub type IngestResult<T> = Result<T, IngestError>;

/// Run-level failures; per-file problems never surface here
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Index sink failed: {0}")]
    Sink(#[from] SinkError),

    /// Not every discovered file reported completion
    #[error("Consistency check failed: {discovered} files discovered but {completed} completed")]
    Consistency { discovered: usize, completed: usize },

    /// A task reported completion twice
    #[error("Task {seq} ({}) completed more than once", path.display())]
    DuplicateCompletion { seq: usize, path: PathBuf },

    #[error("Failed to spawn ingestion worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("Failed to write run report to {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    /// Accounting failures, as opposed to infrastructure failures
    #[must_use]
    pub fn is_consistency_failure(&self) -> bool {
        matches!(
            self,
            IngestError::Consistency { .. } | IngestError::DuplicateCompletion { .. }
        )
    }
}
