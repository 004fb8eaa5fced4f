pub mod hf;
pub mod pattern;

use serde::Deserialize;

use crate::window::{Result, TokenRecord};

pub use self::hf::HfTokenizer;
pub use self::pattern::RegexTokenizer;

/// A document as handed to the window builder: raw text, or words that were
/// already split upstream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DocumentInput {
    Text(String),
    Words(Vec<String>),
}

impl From<&str> for DocumentInput {
    fn from(s: &str) -> Self { DocumentInput::Text(s.to_string()) }
}

impl From<String> for DocumentInput {
    fn from(s: String) -> Self { DocumentInput::Text(s) }
}

impl From<Vec<String>> for DocumentInput {
    fn from(words: Vec<String>) -> Self { DocumentInput::Words(words) }
}

pub trait Tokenizer: Send + Sync {
    fn tokenize_one(&self, doc: &DocumentInput) -> Result<Vec<TokenRecord>>;

    fn tokenize(&self, docs: &[DocumentInput]) -> Result<Vec<Vec<TokenRecord>>> {
        docs.iter().map(|d| self.tokenize_one(d)).collect()
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for Box<T> {
    fn tokenize_one(&self, doc: &DocumentInput) -> Result<Vec<TokenRecord>> {
        (**self).tokenize_one(doc)
    }
}

/// Pre-split words become one token each; `idx` is the offset inside the
/// single-space join, so window text rebuilt with `join(" ")` lines up.
pub fn words_to_tokens(words: &[String]) -> Vec<TokenRecord> {
    let mut out = Vec::with_capacity(words.len());
    let mut idx = 0usize;
    for (i, w) in words.iter().enumerate() {
        out.push(TokenRecord::new(w.clone(), idx, i));
        idx += w.chars().count() + 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_get_join_offsets() {
        let words: Vec<String> = ["New", "York", "é"].iter().map(|s| s.to_string()).collect();
        let toks = words_to_tokens(&words);
        assert_eq!(toks[0], TokenRecord::new("New", 0, 0));
        assert_eq!(toks[1], TokenRecord::new("York", 4, 1));
        assert_eq!(toks[2], TokenRecord::new("é", 9, 2));
    }

    #[test]
    fn documents_deserialize_untagged() {
        let docs: Vec<DocumentInput> = serde_json::from_str(r#"["a b", ["a", "b"]]"#).unwrap();
        assert!(matches!(docs[0], DocumentInput::Text(_)));
        assert_eq!(docs[1], DocumentInput::Words(vec!["a".into(), "b".into()]));
    }
}
