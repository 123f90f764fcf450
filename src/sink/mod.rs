//! Index sinks: where normalized documents end up
//!
//! The ingestion pipeline only sees the [`IndexSink`] trait. Production runs
//! write a Tantivy index through [`TantivySink`]; dry runs and tests collect
//! documents in a [`MemorySink`].

pub mod analyzer;
mod errors;
mod memory;
pub mod schema;
mod tantivy_sink;

pub use analyzer::{AnalyzerSettings, UnknownStemmer, parse_stemmer};
pub use errors::{SinkError, SinkResult};
pub use memory::MemorySink;
pub use schema::CollectionSchema;
pub use tantivy_sink::TantivySink;

use crate::document::{Document, IndexingHints};

/// Consumer of normalized documents.
///
/// `add_document` is called concurrently from every worker thread.
/// `commit` and `close` are called once each, by the scheduler, after all
/// workers are done.
pub trait IndexSink: Send + Sync {
    fn add_document(&self, document: Document) -> SinkResult<()>;

    /// Make all added documents durable and return the total document count
    fn commit(&self) -> SinkResult<u64>;

    /// Release the sink; further calls fail with [`SinkError::Closed`]
    fn close(&self) -> SinkResult<()>;
}

/// Reject documents whose hints differ from what the sink was built for
pub(crate) fn check_hints(document: &Document, expected: IndexingHints) -> SinkResult<()> {
    if document.hints == expected {
        Ok(())
    } else {
        Err(SinkError::HintMismatch {
            doc_id: document.display_id().to_string(),
            expected,
            found: document.hints,
        })
    }
}
