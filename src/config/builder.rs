//! Type-safe builder for `IndexConfig` using the typestate pattern
//!
//! The input root, the output directory and the collection format must be
//! given, in that order, before `build` becomes available.

use crate::document::IndexingHints;
use crate::formats::ParserVariant;
use crate::sink::analyzer::{UnknownStemmer, parse_stemmer};
use crate::utils::{
    DEFAULT_EXCLUDED_DIRS, DEFAULT_IN_FLIGHT_CAPACITY, DEFAULT_STEMMER, DEFAULT_WRITER_MEMORY_MB,
    MIN_WRITER_MEMORY_MB,
};
use std::marker::PhantomData;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use super::types::IndexConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    UnknownStemmer(#[from] UnknownStemmer),

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("writer memory budget of {0} MB is below the 16 MB minimum")]
    WriterMemoryTooSmall(usize),

    #[error("output directory {0} must not lie inside the input directory")]
    OutputInsideInput(PathBuf),

    #[error("output directory {0} is the input directory")]
    OutputIsInput(PathBuf),

    #[error("input directory {0} must not lie inside the output directory")]
    InputInsideOutput(PathBuf),
}

// Type states for the builder
pub struct WithInputDir;
pub struct WithOutputDir;
pub struct Complete;

/// Optional settings, carried unchanged across state transitions
#[derive(Debug, Clone)]
struct Options {
    remove_stopwords: bool,
    stemmer: String,
    workers: Option<usize>,
    in_flight_capacity: Option<usize>,
    excluded_dirs: Vec<String>,
    hints: IndexingHints,
    optimize: bool,
    writer_memory_mb: usize,
    report_path: Option<PathBuf>,
    dry_run: bool,
    audit_stderr: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            remove_stopwords: true,
            stemmer: DEFAULT_STEMMER.to_string(),
            workers: None,
            in_flight_capacity: None,
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|d| (*d).to_string()).collect(),
            hints: IndexingHints::default(),
            optimize: false,
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
            report_path: None,
            dry_run: false,
            audit_stderr: true,
        }
    }
}

pub struct IndexConfigBuilder<State = ()> {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    format: Option<ParserVariant>,
    options: Options,
    _phantom: PhantomData<State>,
}

impl Default for IndexConfigBuilder<()> {
    fn default() -> Self {
        Self {
            input_dir: None,
            output_dir: None,
            format: None,
            options: Options::default(),
            _phantom: PhantomData,
        }
    }
}

impl IndexConfig {
    /// Create a builder for configuring an `IndexConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> IndexConfigBuilder<()> {
        IndexConfigBuilder::default()
    }
}

impl<State> IndexConfigBuilder<State> {
    fn transition<Next>(self) -> IndexConfigBuilder<Next> {
        IndexConfigBuilder {
            input_dir: self.input_dir,
            output_dir: self.output_dir,
            format: self.format,
            options: self.options,
            _phantom: PhantomData,
        }
    }
}

impl IndexConfigBuilder<()> {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> IndexConfigBuilder<WithInputDir> {
        self.input_dir = Some(dir.into());
        self.transition()
    }
}

impl IndexConfigBuilder<WithInputDir> {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> IndexConfigBuilder<WithOutputDir> {
        self.output_dir = Some(dir.into());
        self.transition()
    }
}

impl IndexConfigBuilder<WithOutputDir> {
    pub fn format(mut self, format: ParserVariant) -> IndexConfigBuilder<Complete> {
        self.format = Some(format);
        self.transition()
    }
}

// Build method only available when all required fields are set
impl IndexConfigBuilder<Complete> {
    pub fn build(self) -> Result<IndexConfig, ConfigError> {
        let input_dir = self.input_dir.ok_or(ConfigError::Missing("input_dir"))?;
        let output_dir = self.output_dir.ok_or(ConfigError::Missing("output_dir"))?;
        let format = self.format.ok_or(ConfigError::Missing("format"))?;
        let options = self.options;

        let stemmer = options.stemmer.trim().to_ascii_lowercase();
        parse_stemmer(&stemmer)?;

        let workers = options.workers.unwrap_or_else(num_cpus::get);
        if workers == 0 {
            return Err(ConfigError::NoWorkers);
        }

        let in_flight_capacity = match options.in_flight_capacity {
            None => DEFAULT_IN_FLIGHT_CAPACITY.max(workers),
            Some(capacity) if capacity < workers => {
                tracing::warn!(
                    requested = capacity,
                    workers,
                    "In-flight capacity below worker count, raising it to the worker count"
                );
                workers
            }
            Some(capacity) => capacity,
        };

        if !options.dry_run && options.writer_memory_mb < MIN_WRITER_MEMORY_MB {
            return Err(ConfigError::WriterMemoryTooSmall(options.writer_memory_mb));
        }

        check_directories(&input_dir, &output_dir)?;

        Ok(IndexConfig {
            input_dir,
            output_dir,
            format,
            remove_stopwords: options.remove_stopwords,
            stemmer,
            workers,
            in_flight_capacity,
            excluded_dirs: options.excluded_dirs,
            hints: options.hints,
            optimize: options.optimize,
            writer_memory_mb: options.writer_memory_mb,
            report_path: options.report_path,
            dry_run: options.dry_run,
            audit_stderr: options.audit_stderr,
        })
    }
}

/// Reject an output directory that overlaps the collection in either direction
fn check_directories(input_dir: &Path, output_dir: &Path) -> Result<(), ConfigError> {
    let input = resolve(input_dir);
    let output = resolve(output_dir);

    if output == input {
        return Err(ConfigError::OutputIsInput(output_dir.to_path_buf()));
    }
    if output.starts_with(&input) {
        return Err(ConfigError::OutputInsideInput(output_dir.to_path_buf()));
    }
    if input.starts_with(&output) {
        return Err(ConfigError::InputInsideOutput(input_dir.to_path_buf()));
    }
    Ok(())
}

/// Absolute, `.`/`..`-free form of `path` with symlinks resolved as far as
/// the path exists
fn resolve(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    let mut missing: Vec<OsString> = Vec::new();
    let mut existing = lexical.as_path();
    loop {
        if let Ok(real) = existing.canonicalize() {
            return missing.iter().rev().fold(real, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return lexical,
        }
    }
}

// Builder methods available at any state
impl<State> IndexConfigBuilder<State> {
    #[must_use]
    pub fn remove_stopwords(mut self, remove: bool) -> Self {
        self.options.remove_stopwords = remove;
        self
    }

    /// Stemmer by name: `porter`, `english`, `snowball`, `none` or a Tantivy language
    #[must_use]
    pub fn stemmer(mut self, name: impl Into<String>) -> Self {
        self.options.stemmer = name.into();
        self
    }

    /// Number of worker threads (default: available parallelism)
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.options.workers = Some(workers);
        self
    }

    /// Maximum submitted-but-unfinished tasks (default: 2000, at least the worker count)
    #[must_use]
    pub fn in_flight_capacity(mut self, capacity: usize) -> Self {
        self.options.in_flight_capacity = Some(capacity);
        self
    }

    /// Replace the excluded directory names (default: `OtherData`)
    #[must_use]
    pub fn excluded_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.excluded_dirs = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn hints(mut self, hints: IndexingHints) -> Self {
        self.options.hints = hints;
        self
    }

    #[must_use]
    pub fn optimize(mut self, optimize: bool) -> Self {
        self.options.optimize = optimize;
        self
    }

    #[must_use]
    pub fn writer_memory_mb(mut self, megabytes: usize) -> Self {
        self.options.writer_memory_mb = megabytes;
        self
    }

    #[must_use]
    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.report_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.options.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn audit_stderr(mut self, enabled: bool) -> Self {
        self.options.audit_stderr = enabled;
        self
    }
}
