//! Visible-text extraction from crawled HTML payloads

use super::errors::HtmlError;
use ego_tree::iter::Edge;
use scraper::{Html, Node};

/// Elements whose text never reaches the index
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Elements that end a run of inline text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "title", "tr", "ul",
];

/// Parse an HTML payload and return its visible text with whitespace collapsed.
///
/// The parser is error tolerant, so the only structural failure is a payload
/// that is not text at all.
pub fn extract_text(payload: &[u8]) -> Result<String, HtmlError> {
    let nul_bytes = bytecount_nul(payload);
    if nul_bytes > 0 {
        return Err(HtmlError::NotText {
            nul_bytes,
            len: payload.len(),
        });
    }

    let source = String::from_utf8_lossy(payload);
    let document = Html::parse_document(&source);

    let mut text = String::with_capacity(source.len() / 3);
    let mut hidden_depth = 0usize;

    for edge in document.tree.root().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(element) => {
                    let name = element.name();
                    if HIDDEN_ELEMENTS.contains(&name) {
                        hidden_depth += 1;
                    } else if hidden_depth == 0 && BLOCK_ELEMENTS.contains(&name) {
                        push_separator(&mut text);
                    }
                }
                Node::Text(chunk) if hidden_depth == 0 => push_collapsed(&mut text, chunk),
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(element) = node.value() {
                    let name = element.name();
                    if HIDDEN_ELEMENTS.contains(&name) {
                        hidden_depth = hidden_depth.saturating_sub(1);
                    } else if hidden_depth == 0 && BLOCK_ELEMENTS.contains(&name) {
                        push_separator(&mut text);
                    }
                }
            }
        }
    }

    let trimmed_len = text.trim_end().len();
    text.truncate(trimmed_len);
    Ok(text)
}

#[inline]
fn bytecount_nul(payload: &[u8]) -> usize {
    payload.iter().filter(|&&b| b == 0).count()
}

#[inline]
fn push_separator(out: &mut String) {
    if !out.is_empty() && !out.ends_with(' ') {
        out.push(' ');
    }
}

/// Append `chunk` with runs of whitespace folded into one space
fn push_collapsed(out: &mut String, chunk: &str) {
    for c in chunk.chars() {
        if c.is_whitespace() {
            push_separator(out);
        } else {
            out.push(c);
        }
    }
}
