//! Format-agnostic document model shared by the parsers, the ingestion tasks
//! and the index sink.

use imstr::ImString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-document instructions for the index sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingHints {
    /// Keep enough of the body to rebuild per-document term vectors
    pub store_term_vectors: bool,
    /// Record term positions (`true`) or only term frequencies (`false`)
    pub positional: bool,
}

impl Default for IndexingHints {
    fn default() -> Self {
        Self {
            store_term_vectors: false,
            positional: true,
        }
    }
}

/// A normalized record ready for the index sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Collection identifier (`WARC-TREC-ID`, `DOCNO`). Absent when the record
    /// carried none.
    pub id: Option<String>,
    pub body: String,
    pub hints: IndexingHints,
}

impl Document {
    #[must_use]
    pub fn new(id: Option<String>, body: String, hints: IndexingHints) -> Self {
        Self { id, body, hints }
    }

    /// True when the body has no content once whitespace is trimmed.
    ///
    /// Blank documents are never forwarded to the sink.
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Identifier used in logs and the stderr audit trail
    #[must_use]
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<no-id>")
    }
}

/// A regular file found under the input root.
///
/// Created once by discovery and consumed exactly once by an ingestion task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Position in discovery order, unique within a run
    pub seq: usize,
    pub path: PathBuf,
    /// Name of the directory that contains the file
    pub parent_name: ImString,
    /// Path relative to the input root, `/`-separated
    pub relative_path: ImString,
}

impl DiscoveredFile {
    #[must_use]
    pub fn new(seq: usize, path: PathBuf, root: &Path) -> Self {
        let parent_name = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| ImString::from(name.to_string_lossy().as_ref()))
            .unwrap_or_else(ImString::new);

        let relative = path.strip_prefix(root).unwrap_or(&path);
        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Self {
            seq,
            path,
            parent_name,
            relative_path: ImString::from(relative_path),
        }
    }

    /// Label printed on the per-file progress line: `./<parent>/<file>`
    #[must_use]
    pub fn progress_label(&self) -> String {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.parent_name.is_empty() {
            format!("./{file_name}")
        } else {
            format!("./{}/{}", self.parent_name.as_str(), file_name)
        }
    }
}
