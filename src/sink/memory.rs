//! In-memory sink for dry runs and tests

use super::errors::{SinkError, SinkResult};
use super::{IndexSink, check_hints};
use crate::document::{Document, IndexingHints};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Keeps every accepted document; `commit` reports how many there are
#[derive(Debug, Default)]
pub struct MemorySink {
    hints: IndexingHints,
    documents: Mutex<Vec<Document>>,
    closed: AtomicBool,
}

impl MemorySink {
    #[must_use]
    pub fn new(hints: IndexingHints) -> Self {
        Self {
            hints,
            documents: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers of the accepted documents, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .documents
            .lock()
            .iter()
            .filter_map(|d| d.id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl IndexSink for MemorySink {
    fn add_document(&self, document: Document) -> SinkResult<()> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        check_hints(&document, self.hints)?;
        self.documents.lock().push(document);
        Ok(())
    }

    fn commit(&self) -> SinkResult<u64> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        Ok(self.len() as u64)
    }

    fn close(&self) -> SinkResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn concurrent_adds_are_all_kept() {
        let sink = Arc::new(MemorySink::new(IndexingHints::default()));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        sink.add_document(Document::new(
                            Some(format!("{t}-{i}")),
                            "x".into(),
                            IndexingHints::default(),
                        ))
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sink.commit().unwrap(), 200);
        assert_eq!(sink.ids().len(), 200);
    }

    #[test]
    fn close_rejects_further_work() {
        let sink = MemorySink::new(IndexingHints::default());
        sink.close().unwrap();
        assert!(sink.is_closed());
        let doc = Document::new(None, "x".into(), IndexingHints::default());
        assert!(matches!(sink.add_document(doc), Err(SinkError::Closed)));
    }
}
