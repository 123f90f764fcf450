//! Recursive discovery of collection files
//!
//! Walks the input root with `jwalk`, pruning excluded directory names before
//! they are read. Every regular file found is numbered in walk order; the
//! walk is sorted per directory, so two walks of the same tree agree.

use crate::document::DiscoveredFile;
use jwalk::WalkDir;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The input root itself cannot be listed; the run cannot start
    #[error("Cannot read input root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One entry below the root could not be visited
    #[error("Failed to visit {}: {message}", display_path(.path))]
    Walk {
        path: Option<PathBuf>,
        message: String,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string())
}

/// Result of walking the input root
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<DiscoveredFile>,
    /// Per-entry failures; the entries are omitted from `files`
    pub errors: Vec<DiscoveryError>,
}

impl Discovery {
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Walker threads for the current machine
fn walk_parallelism() -> usize {
    let cpu_count = num_cpus::get();
    match cpu_count {
        1..=4 => cpu_count,
        5..=8 => cpu_count - 1,
        9..=16 => (cpu_count * 3) / 4,
        17..=32 => cpu_count / 2,
        _ => 32,
    }
}

/// Enumerate every regular file under `root`, skipping directories named in
/// `excluded_dirs` together with everything beneath them.
///
/// Symlinks are not followed and hidden entries are included.
pub fn discover_files(root: &Path, excluded_dirs: &[String]) -> Result<Discovery, DiscoveryError> {
    std::fs::read_dir(root).map_err(|source| DiscoveryError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let excluded: Arc<[String]> = excluded_dirs.into();
    let walk_root = root.to_path_buf();

    let walker = WalkDir::new(root)
        .parallelism(jwalk::Parallelism::RayonNewPool(walk_parallelism()))
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
        .process_read_dir(move |_depth, path, _state, entries| {
            entries.retain(|entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => {
                    let name = entry.file_name().to_string_lossy();
                    let keep = !excluded.iter().any(|ex| ex.as_str() == name.as_ref());
                    if !keep {
                        debug!(dir = %path.join(entry.file_name()).display(), "Pruning excluded directory");
                    }
                    keep
                }
                _ => true,
            });
        });

    let mut discovery = Discovery::default();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let seq = discovery.files.len();
                discovery
                    .files
                    .push(DiscoveredFile::new(seq, entry.path(), &walk_root));
            }
            Ok(_) => {}
            Err(e) => {
                let path = e.path().map(Path::to_path_buf);
                let failure = DiscoveryError::Walk {
                    path,
                    message: e.to_string(),
                };
                warn!(error = %failure, "Skipping unreadable entry during discovery");
                discovery.errors.push(failure);
            }
        }
    }

    info!(
        root = %root.display(),
        files = discovery.files.len(),
        errors = discovery.errors.len(),
        "File discovery complete"
    );
    Ok(discovery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn relative_paths(discovery: &Discovery) -> Vec<String> {
        discovery
            .files
            .iter()
            .map(|f| f.relative_path.as_str().to_string())
            .collect()
    }

    #[test]
    fn finds_nested_files_and_prunes_excluded_dirs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "ClueWeb12_00/0000tw/0000tw-00.warc.gz");
        touch(dir.path(), "ClueWeb12_00/0000tw/0000tw-01.warc.gz");
        touch(dir.path(), "ClueWeb12_01/0100tw/0100tw-00.warc.gz");
        touch(dir.path(), "OtherData/redirects.txt");
        touch(dir.path(), "ClueWeb12_01/OtherData/nested.txt");
        touch(dir.path(), ".hidden/file.gz");

        let discovery = discover_files(dir.path(), &["OtherData".to_string()]).unwrap();
        assert!(discovery.errors.is_empty());
        assert_eq!(
            relative_paths(&discovery),
            [
                ".hidden/file.gz",
                "ClueWeb12_00/0000tw/0000tw-00.warc.gz",
                "ClueWeb12_00/0000tw/0000tw-01.warc.gz",
                "ClueWeb12_01/0100tw/0100tw-00.warc.gz",
            ]
        );
        for (i, file) in discovery.files.iter().enumerate() {
            assert_eq!(file.seq, i);
        }
    }

    #[test]
    fn walks_are_deterministic() {
        let dir = TempDir::new().unwrap();
        for i in 0..20 {
            touch(dir.path(), &format!("d{}/f{i}.txt", i % 4));
        }
        let first = discover_files(dir.path(), &[]).unwrap();
        let second = discover_files(dir.path(), &[]).unwrap();
        assert_eq!(first.len(), 20);
        assert_eq!(relative_paths(&first), relative_paths(&second));
    }

    #[test]
    fn empty_root_yields_no_files() {
        let dir = TempDir::new().unwrap();
        let discovery = discover_files(dir.path(), &[]).unwrap();
        assert!(discovery.is_empty());
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(matches!(
            discover_files(&missing, &[]),
            Err(DiscoveryError::RootUnreadable { .. })
        ));
    }
}
