//! Body analyzer: simple tokenization, lowercasing, optional English stopword
//! removal and optional stemming.

use super::errors::{SinkError, SinkResult};
use crate::utils::constants::MAX_TOKEN_LENGTH;
use serde::Serialize;
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter,
    TextAnalyzer,
};

/// Name under which the body analyzer is registered with the index
pub const BODY_TOKENIZER: &str = "collection_body";

/// Stemmer names that select no stemming at all
const NO_STEMMER: &[&str] = &["none", "off", "no"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stemmer '{0}' (expected porter, english, snowball, none or a language name)")]
pub struct UnknownStemmer(pub String);

/// Resolve a stemmer name to a Tantivy stemming language.
///
/// `Ok(None)` means stemming is disabled.
pub fn parse_stemmer(name: &str) -> Result<Option<Language>, UnknownStemmer> {
    let normalized = name.trim().to_ascii_lowercase();
    if normalized.is_empty() || NO_STEMMER.contains(&normalized.as_str()) {
        return Ok(None);
    }
    let language = match normalized.as_str() {
        "porter" | "english" | "snowball" | "en" => Language::English,
        "arabic" => Language::Arabic,
        "danish" => Language::Danish,
        "dutch" => Language::Dutch,
        "finnish" => Language::Finnish,
        "french" => Language::French,
        "german" => Language::German,
        "greek" => Language::Greek,
        "hungarian" => Language::Hungarian,
        "italian" => Language::Italian,
        "norwegian" => Language::Norwegian,
        "portuguese" => Language::Portuguese,
        "romanian" => Language::Romanian,
        "russian" => Language::Russian,
        "spanish" => Language::Spanish,
        "swedish" => Language::Swedish,
        "tamil" => Language::Tamil,
        "turkish" => Language::Turkish,
        _ => return Err(UnknownStemmer(name.to_string())),
    };
    Ok(Some(language))
}

/// Analyzer options for the `body` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzerSettings {
    pub remove_stopwords: bool,
    /// Stemmer name as configured, validated by [`parse_stemmer`]
    pub stemmer: String,
}

impl AnalyzerSettings {
    pub fn build(&self) -> SinkResult<TextAnalyzer> {
        let stemmer = parse_stemmer(&self.stemmer).map_err(|e| SinkError::Analyzer(e.to_string()))?;

        let mut builder = TextAnalyzer::builder(SimpleTokenizer::default())
            .dynamic()
            .filter_dynamic(RemoveLongFilter::limit(MAX_TOKEN_LENGTH))
            .filter_dynamic(LowerCaser);

        if self.remove_stopwords {
            let stopwords = StopWordFilter::new(Language::English).ok_or_else(|| {
                SinkError::Analyzer("no English stopword list available".to_string())
            })?;
            builder = builder.filter_dynamic(stopwords);
        }
        if let Some(language) = stemmer {
            builder = builder.filter_dynamic(Stemmer::new(language));
        }
        Ok(builder.build())
    }
}
