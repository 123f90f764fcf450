//! Collection record formats
//!
//! Every supported collection is described by one [`ParserVariant`]. A variant
//! turns a byte stream into a lazy, non-restartable sequence of
//! [`ParsedRecord`]s; it never talks to the index sink.
//!
//! - `clueweb09` / `clueweb12`: gzip-compressed WARC files, two framing grammars
//! - `trecweb` / `trectext`: `<DOC>`-delimited SGML records (Gov2, Robust04, ...)

mod errors;
pub mod html;
pub mod trec;
pub mod warc;

pub use errors::{FormatError, HtmlError};
pub use html::extract_text;
pub use trec::{TrecReader, TrecRecord};
pub use warc::{WarcGeneration, WarcReader, WarcRecord};

use crate::document::{Document, IndexingHints};
use crate::utils::constants::{GZIP_MAGIC, INPUT_BUFFER_SIZE};
use flate2::bufread::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use std::str::FromStr;

/// Collection type selected once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserVariant {
    ClueWeb09,
    ClueWeb12,
    /// TREC web collections (WT2G, Gov2)
    TrecWeb,
    /// TREC newswire collections (TREC 1-3, 6-8, Robust04)
    TrecText,
}

impl ParserVariant {
    pub const ALL: [ParserVariant; 4] = [
        ParserVariant::TrecText,
        ParserVariant::TrecWeb,
        ParserVariant::ClueWeb09,
        ParserVariant::ClueWeb12,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ParserVariant::ClueWeb09 => "clueweb09",
            ParserVariant::ClueWeb12 => "clueweb12",
            ParserVariant::TrecWeb => "trecweb",
            ParserVariant::TrecText => "trectext",
        }
    }

    /// WARC grammar for the ClueWeb variants
    #[must_use]
    pub fn warc_generation(self) -> Option<WarcGeneration> {
        match self {
            ParserVariant::ClueWeb09 => Some(WarcGeneration::ClueWeb09),
            ParserVariant::ClueWeb12 => Some(WarcGeneration::ClueWeb12),
            ParserVariant::TrecWeb | ParserVariant::TrecText => None,
        }
    }

    /// Open a record stream over raw file bytes.
    ///
    /// Gzip input is recognized by its magic bytes, so compressed and plain
    /// files can be mixed within one collection.
    pub fn open<R: Read>(self, inner: R, hints: IndexingHints) -> io::Result<RecordStream<R>> {
        let input = InputStream::open(inner)?;
        let compressed = input.is_compressed();
        Ok(match self.warc_generation() {
            Some(generation) => {
                RecordStream::Warc(warc::WarcRecords::new(input, generation, compressed, hints))
            }
            None => RecordStream::Trec(trec::TrecRecords::new(input, compressed, hints)),
        })
    }
}

impl fmt::Display for ParserVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown collection format name
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown collection format '{0}' (expected trectext, trecweb, clueweb09 or clueweb12)")]
pub struct UnknownFormat(pub String);

impl FromStr for ParserVariant {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ParserVariant::ALL
            .into_iter()
            .find(|variant| variant.name() == wanted)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// Outcome of parsing one raw record
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRecord {
    /// A document for the sink, body guaranteed non-blank
    Document(Document),
    /// A record that produced no document
    Skipped(SkippedRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub id: Option<String>,
    pub reason: SkipReason,
}

impl SkippedRecord {
    #[must_use]
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<no-id>")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Extracted text was empty after trimming
    EmptyContent,
    /// HTML payload could not be parsed into text
    Html(HtmlError),
    /// Record framing was damaged; the reader resynchronized after it
    Malformed(String),
    /// A response record without a document identifier
    MissingId,
}

impl SkipReason {
    /// True for genuine parse problems, false for content that was simply empty
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        !matches!(self, SkipReason::EmptyContent)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyContent => f.write_str("empty content"),
            SkipReason::Html(e) => write!(f, "html: {e}"),
            SkipReason::Malformed(msg) => write!(f, "malformed record: {msg}"),
            SkipReason::MissingId => f.write_str("missing document identifier"),
        }
    }
}

/// Buffered input with transparent gzip decoding
pub enum InputStream<R: Read> {
    Plain(BufReader<R>),
    Gzip(BufReader<MultiGzDecoder<BufReader<R>>>),
}

impl<R: Read> InputStream<R> {
    /// Peek at the first bytes and wrap the reader in a decoder when needed
    pub fn open(inner: R) -> io::Result<Self> {
        let mut buffered = BufReader::with_capacity(INPUT_BUFFER_SIZE, inner);
        let is_gzipped = {
            let head = buffered.fill_buf()?;
            head.len() >= 2 && head[..2] == GZIP_MAGIC
        };

        Ok(if is_gzipped {
            InputStream::Gzip(BufReader::with_capacity(
                INPUT_BUFFER_SIZE,
                MultiGzDecoder::new(buffered),
            ))
        } else {
            InputStream::Plain(buffered)
        })
    }

    #[must_use]
    pub fn is_compressed(&self) -> bool {
        matches!(self, InputStream::Gzip(_))
    }
}

impl<R: Read> Read for InputStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            InputStream::Plain(r) => r.read(buf),
            InputStream::Gzip(r) => r.read(buf),
        }
    }
}

impl<R: Read> BufRead for InputStream<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            InputStream::Plain(r) => r.fill_buf(),
            InputStream::Gzip(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            InputStream::Plain(r) => r.consume(amt),
            InputStream::Gzip(r) => r.consume(amt),
        }
    }
}

/// Lazy record sequence for one input file
pub enum RecordStream<R: Read> {
    Warc(warc::WarcRecords<InputStream<R>>),
    Trec(trec::TrecRecords<InputStream<R>>),
}

impl<R: Read> Iterator for RecordStream<R> {
    type Item = Result<ParsedRecord, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RecordStream::Warc(records) => records.next(),
            RecordStream::Trec(records) => records.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn variant_names_round_trip_through_from_str() {
        for variant in ParserVariant::ALL {
            assert_eq!(variant.name().parse::<ParserVariant>().ok(), Some(variant));
        }
        assert_eq!(
            "ClueWeb12".parse::<ParserVariant>().ok(),
            Some(ParserVariant::ClueWeb12)
        );
        assert!("warc".parse::<ParserVariant>().is_err());
    }

    #[test]
    fn trecweb_and_trectext_stay_distinct_but_share_rules() {
        assert_ne!(ParserVariant::TrecWeb, ParserVariant::TrecText);
        assert!(ParserVariant::TrecWeb.warc_generation().is_none());
        assert!(ParserVariant::TrecText.warc_generation().is_none());
    }

    #[test]
    fn input_stream_detects_gzip_by_magic_bytes() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello gzip").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut input = InputStream::open(&compressed[..]).unwrap();
        assert!(input.is_compressed());
        let mut text = String::new();
        input.read_to_string(&mut text).unwrap();
        assert_eq!(text, "hello gzip");

        let mut plain = InputStream::open(&b"hello plain"[..]).unwrap();
        assert!(!plain.is_compressed());
        let mut text = String::new();
        plain.read_to_string(&mut text).unwrap();
        assert_eq!(text, "hello plain");
    }
}
