//! Error types for collection record parsing

use thiserror::Error;

/// Stream-level failures that end processing of one input file.
///
/// Problems confined to a single record are not errors: they surface as
/// [`super::ParsedRecord::Skipped`] and the stream continues.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Reading the underlying file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The gzip layer is corrupt or truncated
    #[error("Failed to decompress stream: {0}")]
    Decompression(String),

    /// The stream ended inside a length-framed payload
    #[error("Stream truncated inside record {id}: expected {expected} payload bytes, got {actual}")]
    Truncated {
        id: String,
        expected: u64,
        actual: u64,
    },
}

impl FormatError {
    /// Classify an I/O error raised while reading through the decoder.
    ///
    /// `flate2` reports bad headers, bad checksums and premature ends of a gzip
    /// member as `InvalidInput`, `InvalidData` or `UnexpectedEof`.
    #[must_use]
    pub fn from_read(error: std::io::Error, compressed: bool) -> Self {
        use std::io::ErrorKind;
        if compressed
            && matches!(
                error.kind(),
                ErrorKind::InvalidInput | ErrorKind::InvalidData | ErrorKind::UnexpectedEof
            )
        {
            FormatError::Decompression(error.to_string())
        } else {
            FormatError::Io(error)
        }
    }

    /// Category used by the error collector
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            FormatError::Io(_) => "io_error",
            FormatError::Decompression(_) => "decompression_error",
            FormatError::Truncated { .. } => "truncated_record",
        }
    }
}

/// Reasons an HTML payload could not be turned into text
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HtmlError {
    /// The payload holds binary content (images, archives, ...)
    #[error("payload is not text ({nul_bytes} NUL bytes in {len} bytes)")]
    NotText { nul_bytes: usize, len: usize },
}
