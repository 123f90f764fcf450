//! Shared constants for collection ingestion
//!
//! Default values used by the configuration builder, the parsers and the
//! scheduler live here so that no component carries its own magic numbers.

/// Gzip member magic bytes
///
/// Every input stream is sniffed for these two bytes before parsing, so
/// compressed and plain files can share one collection tree.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read buffer for input files: 256 KiB
///
/// ClueWeb archives are read sequentially end to end; a large buffer keeps
/// the decoder fed without many small syscalls.
pub const INPUT_BUFFER_SIZE: usize = 256 * 1024;

/// Default in-flight window: 2000 submitted-but-unfinished tasks
///
/// When more workers than this are configured, the window grows to the
/// worker count so that no worker sits idle.
pub const DEFAULT_IN_FLIGHT_CAPACITY: usize = 2000;

/// Default Tantivy writer memory budget: 512 MB
pub const DEFAULT_WRITER_MEMORY_MB: usize = 512;

/// Smallest memory budget Tantivy accepts for a writer (15 MB per thread, rounded up)
pub const MIN_WRITER_MEMORY_MB: usize = 16;

/// Largest WARC payload materialized in memory: 64 MiB
///
/// Larger records are consumed and reported as malformed.
pub const MAX_WARC_PAYLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// Longest header line accepted before the record is declared malformed
pub const MAX_WARC_HEADER_LINE: usize = 64 * 1024;

/// Directory names pruned from discovery by default
///
/// `OtherData` holds ClueWeb's link graphs and redirect tables, which are
/// not WARC files.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["OtherData"];

/// Default stemmer name
pub const DEFAULT_STEMMER: &str = "porter";

/// Tokens longer than this many bytes are dropped by the analyzer
pub const MAX_TOKEN_LENGTH: usize = 40;

/// Upper bound on individual errors retained by the error collector
pub const MAX_COLLECTED_ERRORS: usize = 1000;

/// Upper bound on failed files listed in the run report
pub const MAX_REPORTED_FAILURES: usize = 200;

/// Characters of an error message kept in logs and reports
pub const MAX_ERROR_MESSAGE_CHARS: usize = 300;
