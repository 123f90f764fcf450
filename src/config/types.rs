//! Core configuration type for an indexing run

use crate::document::IndexingHints;
use crate::formats::ParserVariant;
use serde::Serialize;
use std::path::PathBuf;

/// Validated settings for one indexing run
///
/// Serialized only for logging the effective configuration at startup.
#[derive(Debug, Clone, Serialize)]
pub struct IndexConfig {
    /// Root of the collection tree
    pub(crate) input_dir: PathBuf,
    /// Index directory; an existing index there is replaced
    pub(crate) output_dir: PathBuf,
    pub(crate) format: ParserVariant,

    /// Drop English stopwords from `body`
    pub(crate) remove_stopwords: bool,
    /// Normalized stemmer name, known to resolve
    pub(crate) stemmer: String,

    /// Worker threads processing files
    pub(crate) workers: usize,
    /// Upper bound on submitted-but-unfinished tasks, never below `workers`
    pub(crate) in_flight_capacity: usize,
    /// Directory names pruned from discovery
    pub(crate) excluded_dirs: Vec<String>,

    pub(crate) hints: IndexingHints,
    /// Merge all segments into one before the final commit returns
    pub(crate) optimize: bool,
    pub(crate) writer_memory_mb: usize,

    /// Where to write the JSON run report, if anywhere
    pub(crate) report_path: Option<PathBuf>,
    /// Parse everything but keep documents in memory instead of writing an index
    pub(crate) dry_run: bool,
    /// Print the id of every skipped record on stderr
    pub(crate) audit_stderr: bool,
}
