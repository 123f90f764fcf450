//! Tantivy-backed index sink
//!
//! One `IndexWriter` is shared by all ingestion workers. `add_document`
//! takes the writer lock shared, since Tantivy's writer accepts documents
//! through `&self`; `commit` and `close` take it exclusively.

use super::analyzer::{AnalyzerSettings, BODY_TOKENIZER};
use super::errors::{SinkError, SinkResult};
use super::schema::CollectionSchema;
use super::{IndexSink, check_hints};
use crate::config::IndexConfig;
use crate::document::{Document, IndexingHints};
use parking_lot::RwLock;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tracing::{debug, info, warn};

pub struct TantivySink {
    index: Index,
    schema: CollectionSchema,
    writer: RwLock<Option<IndexWriter>>,
    reader: IndexReader,
    optimize: bool,
    index_path: PathBuf,
}

impl TantivySink {
    /// Create a fresh index in the configured output directory
    pub fn create(config: &IndexConfig) -> SinkResult<Self> {
        Self::create_in_dir(
            config.output_dir(),
            config.hints(),
            &config.analyzer(),
            config.writer_memory_bytes(),
            config.optimize(),
        )
    }

    /// Create a fresh index at `index_dir`, replacing any index already there
    pub fn create_in_dir(
        index_dir: &Path,
        hints: IndexingHints,
        analyzer: &AnalyzerSettings,
        memory_budget_bytes: usize,
        optimize: bool,
    ) -> SinkResult<Self> {
        prepare_index_dir(index_dir)?;

        let schema = CollectionSchema::new(hints);
        let index = Index::create_in_dir(index_dir, schema.schema.clone())?;
        index.tokenizers().register(BODY_TOKENIZER, analyzer.build()?);

        let writer: IndexWriter = index.writer(memory_budget_bytes)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        info!(
            path = %index_dir.display(),
            memory_mb = memory_budget_bytes / (1024 * 1024),
            positional = hints.positional,
            store_body = hints.store_term_vectors,
            stemmer = %analyzer.stemmer,
            remove_stopwords = analyzer.remove_stopwords,
            "Created index"
        );

        Ok(Self {
            index,
            schema,
            writer: RwLock::new(Some(writer)),
            reader,
            optimize,
            index_path: index_dir.to_path_buf(),
        })
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[must_use]
    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Merge every searchable segment into one and wait for the merge
    fn merge_all_segments(&self, writer: &mut IndexWriter) -> SinkResult<()> {
        let segment_ids = self.index.searchable_segment_ids()?;
        if segment_ids.len() < 2 {
            return Ok(());
        }
        let start = Instant::now();
        writer.merge(&segment_ids).wait()?;
        writer.commit()?;
        info!(
            segments = segment_ids.len(),
            duration_ms = start.elapsed().as_millis(),
            "Merged index into a single segment"
        );
        Ok(())
    }
}

/// Files Tantivy writes outside its segment list
const INDEX_META: &str = "meta.json";
const MANAGED_FILES: &str = ".managed.json";
const INDEX_LOCKS: [&str; 2] = [".tantivy-meta.lock", ".tantivy-writer.lock"];

/// Make `index_dir` ready for a fresh index.
///
/// A missing directory is created. An existing index has its own files
/// removed and nothing else. Any other non-empty directory is refused.
fn prepare_index_dir(index_dir: &Path) -> SinkResult<()> {
    if !index_dir.exists() {
        fs::create_dir_all(index_dir)?;
        return Ok(());
    }
    if index_dir.join(INDEX_META).is_file() {
        let removed = remove_index_files(index_dir)?;
        warn!(path = %index_dir.display(), files = removed, "Replacing existing index");
        return Ok(());
    }
    if fs::read_dir(index_dir)?.next().is_some() {
        return Err(SinkError::OutputNotEmpty(index_dir.to_path_buf()));
    }
    Ok(())
}

/// Delete the files listed in Tantivy's managed-file list plus its meta and
/// lock files. Entries that are not plain file names are ignored.
fn remove_index_files(index_dir: &Path) -> SinkResult<usize> {
    let managed: Vec<PathBuf> = match fs::read(index_dir.join(MANAGED_FILES)) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(io::Error::other)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    let own_files = [INDEX_META, MANAGED_FILES]
        .into_iter()
        .chain(INDEX_LOCKS)
        .map(PathBuf::from);

    let mut removed = 0;
    for name in managed.into_iter().chain(own_files) {
        if name.file_name() != Some(name.as_os_str()) {
            debug!(entry = %name.display(), "Ignoring managed entry outside the index directory");
            continue;
        }
        match fs::remove_file(index_dir.join(&name)) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(removed)
}

impl IndexSink for TantivySink {
    fn add_document(&self, document: Document) -> SinkResult<()> {
        check_hints(&document, self.schema.hints)?;

        let mut doc = TantivyDocument::default();
        if let Some(id) = &document.id {
            doc.add_text(self.schema.docno, id);
        }
        doc.add_text(self.schema.body, &document.body);

        let guard = self.writer.read();
        let writer = guard.as_ref().ok_or(SinkError::Closed)?;
        writer.add_document(doc)?;
        Ok(())
    }

    fn commit(&self) -> SinkResult<u64> {
        let start = Instant::now();
        let mut guard = self.writer.write();
        let writer = guard.as_mut().ok_or(SinkError::Closed)?;

        writer.commit()?;
        debug!(duration_ms = start.elapsed().as_millis(), "Index commit completed");

        if self.optimize {
            self.merge_all_segments(writer)?;
        }

        self.reader.reload()?;
        let num_docs = self.reader.searcher().num_docs();
        info!(
            documents = num_docs,
            duration_ms = start.elapsed().as_millis(),
            "Index committed"
        );
        Ok(num_docs)
    }

    fn close(&self) -> SinkResult<()> {
        let Some(writer) = self.writer.write().take() else {
            return Ok(());
        };
        writer.wait_merging_threads()?;
        debug!(path = %self.index_path.display(), "Index writer closed");
        Ok(())
    }
}
