//! Two-field index schema: `docno` for exact identifier lookup and `body`
//! for analyzed full text.

use super::analyzer::BODY_TOKENIZER;
use crate::document::IndexingHints;
use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions,
};

pub const DOCNO_FIELD: &str = "docno";
pub const BODY_FIELD: &str = "body";

#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub schema: Schema,
    pub docno: Field,
    pub body: Field,
    /// Hints the `body` field was configured for
    pub hints: IndexingHints,
}

impl CollectionSchema {
    #[must_use]
    pub fn new(hints: IndexingHints) -> Self {
        let mut builder = Schema::builder();

        let docno = builder.add_text_field(DOCNO_FIELD, STRING | STORED);

        let index_option = if hints.positional {
            IndexRecordOption::WithFreqsAndPositions
        } else {
            IndexRecordOption::WithFreqs
        };
        let mut body_options = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(BODY_TOKENIZER)
                .set_index_option(index_option),
        );
        // Tantivy keeps no term vectors; storing the body lets them be rebuilt
        if hints.store_term_vectors {
            body_options = body_options.set_stored();
        }
        let body = builder.add_text_field(BODY_FIELD, body_options);

        Self {
            schema: builder.build(),
            docno,
            body,
            hints,
        }
    }
}
