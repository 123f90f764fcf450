//! Error types for index sinks

use crate::document::IndexingHints;
use tantivy::TantivyError;
use std::path::PathBuf;
use thiserror::Error;

pub type SinkResult<T> = Result<T, SinkError>;

#[derive(Debug, Error)]
pub enum SinkError {
    /// Tantivy error wrapper
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] TantivyError),

    /// IO error while preparing the index directory
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document asks for postings or storage the index was not built with
    #[error(
        "Document {doc_id} requests {found:?} but the index was created for {expected:?}"
    )]
    HintMismatch {
        doc_id: String,
        expected: IndexingHints,
        found: IndexingHints,
    },

    /// The analyzer configuration cannot be realized
    #[error("Analyzer configuration error: {0}")]
    Analyzer(String),

    /// The output directory holds files that are not a Tantivy index
    #[error("Output directory {} is not empty and does not contain an index", .0.display())]
    OutputNotEmpty(PathBuf),

    /// The sink was already closed
    #[error("Index sink is closed")]
    Closed,
}

impl SinkError {
    /// Category used by the error collector
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            SinkError::Tantivy(_) => "tantivy_error",
            SinkError::Io(_) => "io_error",
            SinkError::HintMismatch { .. } => "hint_mismatch",
            SinkError::Analyzer(_) => "analyzer_error",
            SinkError::OutputNotEmpty(_) => "output_not_empty",
            SinkError::Closed => "sink_closed",
        }
    }
}
