//! Length-framed WARC reader for the ClueWeb09 and ClueWeb12 archives
//!
//! The two crawls ship different WARC revisions. ClueWeb09 uses `WARC/0.18`
//! with exact header names and LF line ends; ClueWeb12 uses `WARC/1.0`, CRLF
//! line ends and case-insensitive header names. Both carry the collection
//! identifier in `WARC-TREC-ID`.
//!
//! [`WarcReader`] yields raw framed records and reports damaged framing
//! without aborting. [`WarcRecords`] turns `response` records into
//! documents.

use super::errors::FormatError;
use super::html::extract_text;
use super::{ParsedRecord, SkipReason, SkippedRecord};
use crate::document::{Document, IndexingHints};
use crate::utils::constants::{MAX_WARC_HEADER_LINE, MAX_WARC_PAYLOAD_BYTES};
use std::io::{self, BufRead, Read};
use tracing::debug;

const WARC_TYPE: &str = "WARC-Type";
const WARC_TREC_ID: &str = "WARC-TREC-ID";
const CONTENT_LENGTH: &str = "Content-Length";
const RESPONSE: &str = "response";

/// WARC grammar of one ClueWeb generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarcGeneration {
    ClueWeb09,
    ClueWeb12,
}

impl WarcGeneration {
    /// Line that opens every record
    #[must_use]
    pub fn version_line(self) -> &'static str {
        match self {
            WarcGeneration::ClueWeb09 => "WARC/0.18",
            WarcGeneration::ClueWeb12 => "WARC/1.0",
        }
    }

    /// Compare a header name (or a keyword value) under this grammar's rules
    #[inline]
    #[must_use]
    pub fn names_match(self, found: &str, wanted: &str) -> bool {
        match self {
            WarcGeneration::ClueWeb09 => found == wanted,
            WarcGeneration::ClueWeb12 => found.eq_ignore_ascii_case(wanted),
        }
    }
}

/// One framed WARC record: header fields plus the raw payload block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarcRecord {
    pub generation: WarcGeneration,
    /// Header fields in file order, names and values trimmed
    pub headers: Vec<(String, String)>,
    pub payload: Vec<u8>,
}

impl WarcRecord {
    /// First header value whose name matches under the record's grammar
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(found, _)| self.generation.names_match(found, name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn record_type(&self) -> Option<&str> {
        self.header(WARC_TYPE)
    }

    #[must_use]
    pub fn is_response(&self) -> bool {
        self.record_type()
            .is_some_and(|kind| self.generation.names_match(kind, RESPONSE))
    }

    /// Collection identifier, absent when the header is missing or blank
    #[must_use]
    pub fn trec_id(&self) -> Option<&str> {
        self.header(WARC_TREC_ID).filter(|id| !id.is_empty())
    }

    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.header(CONTENT_LENGTH)?.parse().ok()
    }
}

/// What the framing layer produced for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarcEntry {
    Record(WarcRecord),
    /// Damaged framing; the reader resynchronizes at the next version line
    Damaged { id: Option<String>, reason: String },
}

enum Line {
    Eof,
    Complete,
    /// Longer than the header line limit; the excess was discarded
    Overflowed,
}

/// Raw WARC framing over a buffered stream
///
/// Once a stream error has been returned the reader is exhausted.
pub struct WarcReader<R> {
    input: R,
    generation: WarcGeneration,
    compressed: bool,
    line: Vec<u8>,
    /// The version line of the next record was already consumed
    version_pending: bool,
    finished: bool,
}

impl<R: BufRead> WarcReader<R> {
    pub fn new(input: R, generation: WarcGeneration, compressed: bool) -> Self {
        Self {
            input,
            generation,
            compressed,
            line: Vec::with_capacity(256),
            version_pending: false,
            finished: false,
        }
    }

    fn read_entry(&mut self) -> Result<Option<WarcEntry>, FormatError> {
        let compressed = self.compressed;
        let as_format_error = |e: io::Error| FormatError::from_read(e, compressed);

        if !self.version_pending && !self.seek_version_line().map_err(as_format_error)? {
            return Ok(None);
        }
        self.version_pending = false;

        let mut headers: Vec<(String, String)> = Vec::new();
        loop {
            match self.read_line().map_err(as_format_error)? {
                Line::Complete => {}
                Line::Eof => {
                    return Ok(Some(self.damaged(&headers, "stream ended inside header block")));
                }
                Line::Overflowed => {
                    return Ok(Some(self.damaged(
                        &headers,
                        format!("header line longer than {MAX_WARC_HEADER_LINE} bytes"),
                    )));
                }
            }

            let text = String::from_utf8_lossy(strip_terminator(&self.line)).into_owned();
            if text.is_empty() {
                break;
            }
            if text == self.generation.version_line() {
                self.version_pending = true;
                return Ok(Some(
                    self.damaged(&headers, "header block not terminated before next record"),
                ));
            }

            if text.starts_with([' ', '\t']) {
                if let Some((_, value)) = headers.last_mut() {
                    value.push(' ');
                    value.push_str(text.trim());
                    continue;
                }
            }
            match text.split_once(':') {
                Some((name, value)) => {
                    headers.push((name.trim().to_string(), value.trim().to_string()));
                }
                None => {
                    return Ok(Some(
                        self.damaged(&headers, format!("header line without a colon: {text:?}")),
                    ));
                }
            }
        }

        let mut record = WarcRecord {
            generation: self.generation,
            headers,
            payload: Vec::new(),
        };
        let Some(length) = record.content_length() else {
            let reason = match record.header(CONTENT_LENGTH) {
                Some(raw) => format!("unparsable Content-Length {raw:?}"),
                None => "missing Content-Length".to_string(),
            };
            return Ok(Some(self.damaged(&record.headers, reason)));
        };
        let id = record.trec_id().unwrap_or("<no-id>").to_string();

        if length > MAX_WARC_PAYLOAD_BYTES {
            let copied = io::copy(&mut (&mut self.input).take(length), &mut io::sink())
                .map_err(as_format_error)?;
            if copied < length {
                return Err(FormatError::Truncated {
                    id,
                    expected: length,
                    actual: copied,
                });
            }
            return Ok(Some(self.damaged(
                &record.headers,
                format!("payload of {length} bytes exceeds the {MAX_WARC_PAYLOAD_BYTES} byte limit"),
            )));
        }

        let mut payload = Vec::with_capacity(length as usize);
        (&mut self.input)
            .take(length)
            .read_to_end(&mut payload)
            .map_err(as_format_error)?;
        if (payload.len() as u64) < length {
            return Err(FormatError::Truncated {
                id,
                expected: length,
                actual: payload.len() as u64,
            });
        }

        record.payload = payload;
        Ok(Some(WarcEntry::Record(record)))
    }

    /// Discard lines up to and including the next version line
    fn seek_version_line(&mut self) -> io::Result<bool> {
        let mut discarded = 0usize;
        loop {
            match self.read_line()? {
                Line::Eof => return Ok(false),
                Line::Overflowed => discarded += 1,
                Line::Complete => {
                    let line = strip_terminator(&self.line);
                    if line == self.generation.version_line().as_bytes() {
                        if discarded > 0 {
                            debug!(
                                discarded_lines = discarded,
                                "Resynchronized at next WARC version line"
                            );
                        }
                        return Ok(true);
                    }
                    if !line.is_empty() {
                        discarded += 1;
                    }
                }
            }
        }
    }

    /// Read one line into `self.line`, keeping at most the header line limit
    fn read_line(&mut self) -> io::Result<Line> {
        self.line.clear();
        let mut consumed_any = false;
        let mut overflowed = false;
        loop {
            let available = match self.input.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(match (consumed_any, overflowed) {
                    (false, _) => Line::Eof,
                    (true, false) => Line::Complete,
                    (true, true) => Line::Overflowed,
                });
            }

            let (used, done) = match available.iter().position(|&b| b == b'\n') {
                Some(idx) => (idx + 1, true),
                None => (available.len(), false),
            };
            let room = MAX_WARC_HEADER_LINE.saturating_sub(self.line.len());
            if used > room {
                overflowed = true;
            }
            self.line.extend_from_slice(&available[..used.min(room)]);
            self.input.consume(used);
            consumed_any = true;

            if done {
                return Ok(if overflowed {
                    Line::Overflowed
                } else {
                    Line::Complete
                });
            }
        }
    }

    fn damaged(&self, headers: &[(String, String)], reason: impl Into<String>) -> WarcEntry {
        let id = headers
            .iter()
            .find(|(name, _)| self.generation.names_match(name, WARC_TREC_ID))
            .map(|(_, value)| value.clone())
            .filter(|value| !value.is_empty());
        WarcEntry::Damaged {
            id,
            reason: reason.into(),
        }
    }
}

impl<R: BufRead> Iterator for WarcReader<R> {
    type Item = Result<WarcEntry, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Drop one trailing LF and, if present, the CR before it
#[inline]
fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Body of an HTTP response block: everything after the first blank line
///
/// A block with no blank line is all headers when it starts with a status
/// line, and all body otherwise.
fn http_body(payload: &[u8]) -> &[u8] {
    let mut start = 0;
    while let Some(offset) = payload[start..].iter().position(|&b| b == b'\n') {
        let end = start + offset;
        if strip_terminator(&payload[start..end]).is_empty() {
            return &payload[end + 1..];
        }
        start = end + 1;
    }
    if payload.starts_with(b"HTTP/") {
        &[]
    } else {
        payload
    }
}

/// Map one WARC record to a parse outcome; non-response records map to nothing
#[must_use]
pub fn parse_record(record: &WarcRecord, hints: IndexingHints) -> Option<ParsedRecord> {
    if !record.is_response() {
        return None;
    }

    let Some(id) = record.trec_id().map(str::to_owned) else {
        return Some(ParsedRecord::Skipped(SkippedRecord {
            id: None,
            reason: SkipReason::MissingId,
        }));
    };

    let outcome = match extract_text(http_body(&record.payload)) {
        Err(e) => ParsedRecord::Skipped(SkippedRecord {
            id: Some(id),
            reason: SkipReason::Html(e),
        }),
        Ok(text) if text.trim().is_empty() => ParsedRecord::Skipped(SkippedRecord {
            id: Some(id),
            reason: SkipReason::EmptyContent,
        }),
        Ok(text) => ParsedRecord::Document(Document::new(Some(id), text, hints)),
    };
    Some(outcome)
}

/// Documents from a WARC stream
pub struct WarcRecords<R> {
    reader: WarcReader<R>,
    hints: IndexingHints,
}

impl<R: BufRead> WarcRecords<R> {
    pub fn new(input: R, generation: WarcGeneration, compressed: bool, hints: IndexingHints) -> Self {
        Self {
            reader: WarcReader::new(input, generation, compressed),
            hints,
        }
    }
}

impl<R: BufRead> Iterator for WarcRecords<R> {
    type Item = Result<ParsedRecord, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.next()? {
                Err(e) => return Some(Err(e)),
                Ok(WarcEntry::Damaged { id, reason }) => {
                    return Some(Ok(ParsedRecord::Skipped(SkippedRecord {
                        id,
                        reason: SkipReason::Malformed(reason),
                    })));
                }
                Ok(WarcEntry::Record(record)) => {
                    if let Some(parsed) = parse_record(&record, self.hints) {
                        return Some(Ok(parsed));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::HtmlError;

    fn frame(generation: WarcGeneration, headers: &[(&str, String)], payload: &[u8]) -> Vec<u8> {
        let eol = match generation {
            WarcGeneration::ClueWeb09 => "\n",
            WarcGeneration::ClueWeb12 => "\r\n",
        };
        let mut out = format!("{}{eol}", generation.version_line()).into_bytes();
        for (name, value) in headers {
            out.extend_from_slice(format!("{name}: {value}{eol}").as_bytes());
        }
        out.extend_from_slice(eol.as_bytes());
        out.extend_from_slice(payload);
        out.extend_from_slice(format!("{eol}{eol}").as_bytes());
        out
    }

    fn response(generation: WarcGeneration, id: &str, html: &str) -> Vec<u8> {
        let payload = format!("HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n{html}");
        frame(
            generation,
            &[
                ("WARC-Type", "response".into()),
                ("WARC-TREC-ID", id.into()),
                ("Content-Length", payload.len().to_string()),
            ],
            payload.as_bytes(),
        )
    }

    fn warcinfo(generation: WarcGeneration) -> Vec<u8> {
        let payload = b"software: test\r\n";
        frame(
            generation,
            &[
                ("WARC-Type", "warcinfo".into()),
                ("Content-Length", payload.len().to_string()),
            ],
            payload,
        )
    }

    fn parse_all(generation: WarcGeneration, bytes: &[u8]) -> Vec<Result<ParsedRecord, FormatError>> {
        WarcRecords::new(bytes, generation, false, IndexingHints::default()).collect()
    }

    fn document_ids(results: &[Result<ParsedRecord, FormatError>]) -> Vec<String> {
        results
            .iter()
            .filter_map(|r| match r {
                Ok(ParsedRecord::Document(doc)) => doc.id.clone(),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn clueweb12_responses_become_documents() {
        let g = WarcGeneration::ClueWeb12;
        let mut bytes = warcinfo(g);
        bytes.extend(response(g, "clueweb12-0000tw-00-00001", "<p>hello <b>world</b></p>"));
        bytes.extend(response(g, "clueweb12-0000tw-00-00002", "<div>second</div>"));

        let results = parse_all(g, &bytes);
        assert_eq!(results.len(), 2, "warcinfo must not produce an outcome");
        match &results[0] {
            Ok(ParsedRecord::Document(doc)) => {
                assert_eq!(doc.id.as_deref(), Some("clueweb12-0000tw-00-00001"));
                assert_eq!(doc.body, "hello world");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(document_ids(&results)[1], "clueweb12-0000tw-00-00002");
    }

    #[test]
    fn clueweb09_uses_its_own_version_line() {
        let g = WarcGeneration::ClueWeb09;
        let bytes = response(g, "clueweb09-en0000-00-00000", "<p>text</p>");
        assert_eq!(document_ids(&parse_all(g, &bytes)), ["clueweb09-en0000-00-00000"]);

        // A ClueWeb12 reader never finds a record in a ClueWeb09 file
        assert!(parse_all(WarcGeneration::ClueWeb12, &bytes).is_empty());
    }

    #[test]
    fn header_names_are_case_insensitive_only_for_clueweb12() {
        let lower = |g: WarcGeneration| {
            let payload = "HTTP/1.1 200 OK\r\n\r\n<p>case</p>";
            frame(
                g,
                &[
                    ("warc-type", "response".into()),
                    ("warc-trec-id", "doc-1".into()),
                    ("content-length", payload.len().to_string()),
                ],
                payload.as_bytes(),
            )
        };

        let cw12 = parse_all(WarcGeneration::ClueWeb12, &lower(WarcGeneration::ClueWeb12));
        assert_eq!(document_ids(&cw12), ["doc-1"]);

        let cw09 = parse_all(WarcGeneration::ClueWeb09, &lower(WarcGeneration::ClueWeb09));
        assert_eq!(cw09.len(), 1);
        assert!(matches!(
            &cw09[0],
            Ok(ParsedRecord::Skipped(SkippedRecord {
                reason: SkipReason::Malformed(_),
                ..
            }))
        ));
    }

    #[test]
    fn bare_lf_is_tolerated_in_clueweb12() {
        let payload = "HTTP/1.1 200 OK\n\n<p>lf only</p>";
        let bytes = format!(
            "WARC/1.0\nWARC-Type: response\nWARC-TREC-ID: lf-doc\nContent-Length: {}\n\n{payload}\n\n",
            payload.len()
        );
        let results = parse_all(WarcGeneration::ClueWeb12, bytes.as_bytes());
        assert_eq!(document_ids(&results), ["lf-doc"]);
    }

    #[test]
    fn bad_content_length_is_reported_and_reader_resynchronizes() {
        let g = WarcGeneration::ClueWeb12;
        let mut bytes = frame(
            g,
            &[
                ("WARC-Type", "response".into()),
                ("WARC-TREC-ID", "broken".into()),
                ("Content-Length", "twelve".into()),
            ],
            b"HTTP/1.1 200 OK\r\n\r\n<p>lost</p>",
        );
        bytes.extend(response(g, "after-broken", "<p>recovered</p>"));

        let results = parse_all(g, &bytes);
        assert_eq!(results.len(), 2);
        match &results[0] {
            Ok(ParsedRecord::Skipped(skipped)) => {
                assert_eq!(skipped.id.as_deref(), Some("broken"));
                assert!(skipped.reason.is_malformed());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(document_ids(&results), ["after-broken"]);
    }

    #[test]
    fn truncated_payload_fails_the_stream() {
        let g = WarcGeneration::ClueWeb12;
        let mut bytes = response(g, "complete", "<p>ok</p>");
        let mut partial = response(g, "cut-short", "<p>this payload never finishes</p>");
        partial.truncate(partial.len() - 20);
        bytes.extend(partial);

        let results = parse_all(g, &bytes);
        assert_eq!(results.len(), 2);
        assert_eq!(document_ids(&results), ["complete"]);
        match &results[1] {
            Err(FormatError::Truncated { id, expected, actual }) => {
                assert_eq!(id, "cut-short");
                assert!(actual < expected);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn response_without_id_is_skipped() {
        let g = WarcGeneration::ClueWeb09;
        let payload = "HTTP/1.1 200 OK\n\n<p>anonymous</p>";
        let bytes = frame(
            g,
            &[
                ("WARC-Type", "response".into()),
                ("Content-Length", payload.len().to_string()),
            ],
            payload.as_bytes(),
        );
        let results = parse_all(g, &bytes);
        assert!(matches!(
            &results[..],
            [Ok(ParsedRecord::Skipped(SkippedRecord {
                id: None,
                reason: SkipReason::MissingId
            }))]
        ));
    }

    #[test]
    fn empty_and_binary_payloads_are_skipped_with_their_id() {
        let g = WarcGeneration::ClueWeb12;
        let mut bytes = response(g, "empty-page", "<html><script>x()</script></html>");

        let mut binary = b"HTTP/1.1 200 OK\r\nContent-Type: image/gif\r\n\r\nGIF89a".to_vec();
        binary.extend_from_slice(&[0, 0, 1, 0]);
        bytes.extend(frame(
            g,
            &[
                ("WARC-Type", "response".into()),
                ("WARC-TREC-ID", "gif".into()),
                ("Content-Length", binary.len().to_string()),
            ],
            &binary,
        ));

        let results = parse_all(g, &bytes);
        assert_eq!(results.len(), 2);
        assert!(matches!(
            &results[0],
            Ok(ParsedRecord::Skipped(SkippedRecord { id: Some(id), reason: SkipReason::EmptyContent }))
                if id == "empty-page"
        ));
        assert!(matches!(
            &results[1],
            Ok(ParsedRecord::Skipped(SkippedRecord {
                reason: SkipReason::Html(HtmlError::NotText { .. }),
                ..
            }))
        ));
    }

    #[test]
    fn leading_garbage_is_discarded() {
        let g = WarcGeneration::ClueWeb12;
        let mut bytes = b"partial trailing bytes of a previous record\r\n\r\n".to_vec();
        bytes.extend(response(g, "first-real", "<p>x</p>"));
        assert_eq!(document_ids(&parse_all(g, &bytes)), ["first-real"]);
    }

    #[test]
    fn http_body_splits_at_first_blank_line() {
        assert_eq!(http_body(b"HTTP/1.1 200 OK\r\nA: b\r\n\r\n<p>x</p>"), b"<p>x</p>");
        assert_eq!(http_body(b"HTTP/1.1 200 OK\nA: b\n\nbody\n\nmore"), b"body\n\nmore");
        assert_eq!(http_body(b"HTTP/1.1 204 No Content\r\n"), b"");
        assert_eq!(http_body(b"<p>no headers</p>"), b"<p>no headers</p>");
    }
}
