//! `<DOC>`-delimited SGML records (TREC newswire, WT2G, Gov2)
//!
//! ```text
//! <DOC>
//! <DOCNO> GX000-00-0000000 </DOCNO>
//! <DOCHDR> ... </DOCHDR>
//! <html> ... </html>
//! </DOC>
//! ```
//!
//! The record body is every line between the framing markers, tag lines
//! included, joined with `\n`. The identifier is taken from the last
//! `<DOCNO>` line seen.

use super::errors::FormatError;
use super::{ParsedRecord, SkipReason, SkippedRecord};
use crate::document::{Document, IndexingHints};
use regex::Regex;
use std::io::{self, BufRead};
use std::sync::LazyLock;

const DOC_OPEN: &str = "<DOC>";
const DOC_CLOSE: &str = "</DOC>";

static DOCNO_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<DOCNO>\s*(\S+)\s*<").expect("DOCNO_TAG: hardcoded regex is valid")
});

/// One raw `<DOC>` record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrecRecord {
    pub id: Option<String>,
    pub body: String,
}

impl TrecRecord {
    fn push_line(&mut self, line: &str, first: &mut bool) {
        if let Some(caps) = DOCNO_TAG.captures(line) {
            self.id = Some(caps[1].to_string());
        }
        if !*first {
            self.body.push('\n');
        }
        self.body.push_str(line);
        *first = false;
    }
}

/// Line-oriented `<DOC>` framing over a buffered stream
pub struct TrecReader<R> {
    input: R,
    compressed: bool,
    line: Vec<u8>,
    finished: bool,
}

impl<R: BufRead> TrecReader<R> {
    pub fn new(input: R, compressed: bool) -> Self {
        Self {
            input,
            compressed,
            line: Vec::with_capacity(1024),
            finished: false,
        }
    }

    /// Next line with its terminator removed, `None` at end of stream
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.line.clear();
        if self.input.read_until(b'\n', &mut self.line)? == 0 {
            return Ok(None);
        }
        let mut text = String::from_utf8_lossy(&self.line).into_owned();
        if text.ends_with('\n') {
            text.pop();
            if text.ends_with('\r') {
                text.pop();
            }
        }
        Ok(Some(text))
    }

    fn read_record(&mut self) -> io::Result<Option<TrecRecord>> {
        let opener_rest = loop {
            let Some(line) = self.next_line()? else {
                return Ok(None);
            };
            let trimmed = line.trim();
            if let Some(rest) = trimmed.strip_prefix(DOC_OPEN) {
                break rest.to_string();
            }
        };

        let mut record = TrecRecord::default();
        let mut first = true;

        // Content after the opener on the same line, possibly closed there too
        let rest = opener_rest.trim();
        if let Some(close) = rest.find(DOC_CLOSE) {
            let inner = rest[..close].trim();
            if !inner.is_empty() {
                record.push_line(inner, &mut first);
            }
            return Ok(Some(record));
        }
        if !rest.is_empty() {
            record.push_line(rest, &mut first);
        }

        while let Some(line) = self.next_line()? {
            if line.trim_start().starts_with(DOC_CLOSE) {
                return Ok(Some(record));
            }
            record.push_line(&line, &mut first);
        }
        // End of stream closes the open record
        Ok(Some(record))
    }
}

impl<R: BufRead> Iterator for TrecReader<R> {
    type Item = Result<TrecRecord, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(FormatError::from_read(e, self.compressed)))
            }
        }
    }
}

/// Documents from a `<DOC>` stream
///
/// Records with an empty body produce no outcome at all.
pub struct TrecRecords<R> {
    reader: TrecReader<R>,
    hints: IndexingHints,
}

impl<R: BufRead> TrecRecords<R> {
    pub fn new(input: R, compressed: bool, hints: IndexingHints) -> Self {
        Self {
            reader: TrecReader::new(input, compressed),
            hints,
        }
    }
}

impl<R: BufRead> Iterator for TrecRecords<R> {
    type Item = Result<ParsedRecord, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.reader.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };
            if record.body.is_empty() {
                continue;
            }
            if record.body.trim().is_empty() {
                return Some(Ok(ParsedRecord::Skipped(SkippedRecord {
                    id: record.id,
                    reason: SkipReason::EmptyContent,
                })));
            }
            return Some(Ok(ParsedRecord::Document(Document::new(
                record.id,
                record.body,
                self.hints,
            ))));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Vec<ParsedRecord> {
        TrecRecords::new(input.as_bytes(), false, IndexingHints::default())
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn documents(input: &str) -> Vec<Document> {
        parse(input)
            .into_iter()
            .filter_map(|r| match r {
                ParsedRecord::Document(doc) => Some(doc),
                ParsedRecord::Skipped(_) => None,
            })
            .collect()
    }

    #[test]
    fn single_record_keeps_tag_lines_in_body() {
        let docs = documents("<DOC>\n<DOCNO> X1 </DOCNO>\nhello world\n</DOC>\n");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id.as_deref(), Some("X1"));
        assert_eq!(docs[0].body, "<DOCNO> X1 </DOCNO>\nhello world");
    }

    #[test]
    fn empty_record_on_one_line_produces_nothing() {
        assert!(parse("<DOC></DOC>\n").is_empty());
        assert!(parse("<DOC>\n</DOC>\n").is_empty());
    }

    #[test]
    fn whitespace_only_body_is_skipped() {
        let outcomes = parse("<DOC>\n   \n\t\n</DOC>\n");
        assert_eq!(
            outcomes,
            vec![ParsedRecord::Skipped(SkippedRecord {
                id: None,
                reason: SkipReason::EmptyContent,
            })]
        );
    }

    #[test]
    fn last_docno_wins() {
        let docs = documents("<DOC>\n<DOCNO>first</DOCNO>\n<DOCNO>second</DOCNO>\ntext\n</DOC>\n");
        assert_eq!(docs[0].id.as_deref(), Some("second"));
    }

    #[test]
    fn missing_docno_still_emits_document() {
        let docs = documents("<DOC>\njust text\n</DOC>\n");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, None);
        assert_eq!(docs[0].body, "just text");
    }

    #[test]
    fn whitespace_around_framing_tags_is_tolerated() {
        let docs = documents("   <DOC>  \n  <DOCNO>  FT911-3  </DOCNO>\nbody\n\t</DOC>\n");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id.as_deref(), Some("FT911-3"));
    }

    #[test]
    fn text_outside_records_is_ignored() {
        let docs = documents(
            "junk\n<DOC>\n<DOCNO>A</DOCNO>\na\n</DOC>\nbetween\n<DOC>\n<DOCNO>B</DOCNO>\nb\n</DOC>\n",
        );
        let ids: Vec<_> = docs.iter().filter_map(|d| d.id.as_deref()).collect();
        assert_eq!(ids, ["A", "B"]);
        assert!(docs.iter().all(|d| !d.body.contains("junk") && !d.body.contains("between")));
    }

    #[test]
    fn truncated_stream_closes_open_record() {
        let docs = documents("<DOC>\n<DOCNO>A</DOCNO>\na\n</DOC>\n<DOC>\n<DOCNO>B</DOCNO>\npartial");
        let ids: Vec<_> = docs.iter().filter_map(|d| d.id.as_deref()).collect();
        assert_eq!(ids, ["A", "B"]);
        assert_eq!(docs[1].body, "<DOCNO>B</DOCNO>\npartial");
    }

    #[test]
    fn crlf_and_invalid_utf8_are_tolerated() {
        let mut bytes = b"<DOC>\r\n<DOCNO>W1</DOCNO>\r\ncaf".to_vec();
        bytes.extend_from_slice(&[0xE9, b'\r', b'\n']);
        bytes.extend_from_slice(b"</DOC>\r\n");
        let records: Vec<_> = TrecRecords::new(&bytes[..], false, IndexingHints::default())
            .collect::<Result<_, _>>()
            .unwrap();
        match &records[..] {
            [ParsedRecord::Document(doc)] => {
                assert_eq!(doc.id.as_deref(), Some("W1"));
                assert_eq!(doc.body, "<DOCNO>W1</DOCNO>\ncaf\u{FFFD}");
            }
            other => panic!("unexpected outcomes: {other:?}"),
        }
    }

    #[test]
    fn content_on_opener_line_is_kept() {
        let docs = documents("<DOC><DOCNO>S1</DOCNO> inline</DOC>\n");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id.as_deref(), Some("S1"));
        assert_eq!(docs[0].body, "<DOCNO>S1</DOCNO> inline");
    }

    #[test]
    fn raw_reader_reports_zero_length_records() {
        let records: Vec<_> = TrecReader::new(&b"<DOC></DOC>\n<DOC>\nx\n</DOC>\n"[..], false)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].body.is_empty());
        assert_eq!(records[1].body, "x");
    }
}
