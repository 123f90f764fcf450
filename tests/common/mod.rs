//! Fixture builders shared by the integration tests

use anyhow::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Gzip-compress `content`
#[allow(dead_code)]
pub fn gzip(content: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content)?;
    Ok(encoder.finish()?)
}

/// Write `content` under `root`, creating parent directories
#[allow(dead_code)]
pub fn write_file(root: &Path, relative: &str, content: &[u8]) -> Result<PathBuf> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    Ok(path)
}

/// `<DOC>` records with the given ids, one line of text each
#[allow(dead_code)]
pub fn trec_docs(ids: &[&str]) -> String {
    ids.iter()
        .map(|id| format!("<DOC>\n<DOCNO> {id} </DOCNO>\n<TEXT>\nstory about {id}\n</TEXT>\n</DOC>\n"))
        .collect()
}

/// A ClueWeb12 WARC file: one warcinfo record, then one response per id
#[allow(dead_code)]
pub fn clueweb12_warc(ids: &[&str]) -> Vec<u8> {
    let mut out = warc_record("WARC/1.0", "\r\n", "warcinfo", None, b"software: fixture\r\n");
    for id in ids {
        let payload = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<html><body><p>page {id}</p></body></html>"
        );
        out.extend(warc_record("WARC/1.0", "\r\n", "response", Some(id), payload.as_bytes()));
    }
    out
}

/// A ClueWeb09 WARC file with one response per id
#[allow(dead_code)]
pub fn clueweb09_warc(ids: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    for id in ids {
        let payload = format!("HTTP/1.1 200 OK\nContent-Type: text/html\n\n<p>page {id}</p>");
        out.extend(warc_record("WARC/0.18", "\n", "response", Some(id), payload.as_bytes()));
    }
    out
}

fn warc_record(version: &str, eol: &str, kind: &str, id: Option<&str>, payload: &[u8]) -> Vec<u8> {
    let mut out = format!("{version}{eol}WARC-Type: {kind}{eol}").into_bytes();
    if let Some(id) = id {
        out.extend_from_slice(format!("WARC-TREC-ID: {id}{eol}").as_bytes());
    }
    out.extend_from_slice(format!("Content-Length: {}{eol}{eol}", payload.len()).as_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(format!("{eol}{eol}").as_bytes());
    out
}
