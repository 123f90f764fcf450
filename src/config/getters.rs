//! Getter methods for `IndexConfig`

use std::path::{Path, PathBuf};

use super::types::IndexConfig;
use crate::document::IndexingHints;
use crate::formats::ParserVariant;
use crate::sink::AnalyzerSettings;

impl IndexConfig {
    #[must_use]
    pub fn input_dir(&self) -> &PathBuf {
        &self.input_dir
    }

    #[must_use]
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    #[must_use]
    pub fn format(&self) -> ParserVariant {
        self.format
    }

    #[must_use]
    pub fn remove_stopwords(&self) -> bool {
        self.remove_stopwords
    }

    #[must_use]
    pub fn stemmer(&self) -> &str {
        &self.stemmer
    }

    /// Analyzer settings for the `body` field
    #[must_use]
    pub fn analyzer(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            remove_stopwords: self.remove_stopwords,
            stemmer: self.stemmer.clone(),
        }
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[must_use]
    pub fn in_flight_capacity(&self) -> usize {
        self.in_flight_capacity
    }

    #[must_use]
    pub fn excluded_dirs(&self) -> &[String] {
        &self.excluded_dirs
    }

    #[must_use]
    pub fn hints(&self) -> IndexingHints {
        self.hints
    }

    #[must_use]
    pub fn optimize(&self) -> bool {
        self.optimize
    }

    #[must_use]
    pub fn writer_memory_mb(&self) -> usize {
        self.writer_memory_mb
    }

    /// Writer memory budget in bytes
    #[must_use]
    pub fn writer_memory_bytes(&self) -> usize {
        self.writer_memory_mb.saturating_mul(1024 * 1024)
    }

    #[must_use]
    pub fn report_path(&self) -> Option<&Path> {
        self.report_path.as_deref()
    }

    #[must_use]
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    #[must_use]
    pub fn audit_stderr(&self) -> bool {
        self.audit_stderr
    }
}
