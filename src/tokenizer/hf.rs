use std::path::Path;

use hf_hub::api::sync::Api;
use tokenizers::Tokenizer as HfInner;

use crate::window::offsets::CharOffsets;
use crate::window::{Result, TokenRecord, WindowError};

use super::{DocumentInput, Tokenizer};

/// Subword tokens from a Hugging Face `tokenizer.json`, without special tokens.
#[derive(Debug, Clone)]
pub struct HfTokenizer {
    inner: HfInner,
    model_max_length: Option<usize>,
}

impl HfTokenizer {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let inner = HfInner::from_file(path).map_err(|e| WindowError::tokenizer(e.to_string()))?;
        Ok(Self { inner, model_max_length: None })
    }

    // loads the tokenizer from the HF Hub and picks up model_max_length from tokenizer_config.json
    pub fn from_pretrained(model_id: &str) -> Result<Self> {
        let inner = HfInner::from_pretrained(model_id, None)
            .map_err(|e| WindowError::tokenizer(e.to_string()))?;

        let api = Api::new().map_err(|e| WindowError::tokenizer(e.to_string()))?;
        let repo = api.model(model_id.to_string());
        let model_max_length = repo
            .get("tokenizer_config.json")
            .ok()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
            .and_then(|cfg| cfg.get("model_max_length").and_then(|v| v.as_u64()))
            // some configs store a 1e30 sentinel for "unbounded"
            .filter(|&n| n <= u32::MAX as u64)
            .map(|n| n as usize);

        Ok(Self { inner, model_max_length })
    }

    pub fn model_max_length(&self) -> Option<usize> { self.model_max_length }

    fn tokenize_text(&self, text: &str) -> Result<Vec<TokenRecord>> {
        let enc = self
            .inner
            .encode_char_offsets(text, false)
            .map_err(|e| WindowError::tokenizer(e.to_string()))?;

        Ok(records_from_offsets(text, enc.get_offsets()))
    }
}

/// Char offsets to token records. Zero-width pieces are skipped and `i`
/// counts only the kept ones; token text is the covered slice of `text`.
fn records_from_offsets(text: &str, offsets: &[(usize, usize)]) -> Vec<TokenRecord> {
    let conv = CharOffsets::new(text);
    offsets
        .iter()
        .filter(|(start, end)| end > start)
        .enumerate()
        .map(|(i, &(start, end))| TokenRecord::new(conv.slice(text, start, end), start, i))
        .collect()
}

impl Tokenizer for HfTokenizer {
    fn tokenize_one(&self, doc: &DocumentInput) -> Result<Vec<TokenRecord>> {
        match doc {
            DocumentInput::Text(text) => self.tokenize_text(text),
            DocumentInput::Words(words) => self.tokenize_text(&words.join(" ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    const WORD_LEVEL: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {"[UNK]": 0, "café": 1, "au": 2, "lait": 3, ".": 4},
            "unk_token": "[UNK]"
        }
    }"#;

    fn tokenizer() -> HfTokenizer {
        HfTokenizer { inner: HfInner::from_str(WORD_LEVEL).unwrap(), model_max_length: None }
    }

    #[test]
    fn offsets_are_chars_and_text_comes_from_the_document() {
        let out = tokenizer().tokenize_one(&"café au lait.".into()).unwrap();
        assert_eq!(
            out,
            vec![
                TokenRecord::new("café", 0, 0),
                TokenRecord::new("au", 5, 1),
                TokenRecord::new("lait", 8, 2),
                TokenRecord::new(".", 12, 3),
            ]
        );

        // unknown words keep their surface form, not the unk token
        let out = tokenizer().tokenize_one(&"au zébu".into()).unwrap();
        assert_eq!(out[1], TokenRecord::new("zébu", 3, 1));
    }

    #[test]
    fn pre_split_words_are_space_joined() {
        let words = vec!["lait".to_string(), "café".to_string()];
        let out = tokenizer().tokenize_one(&DocumentInput::Words(words)).unwrap();
        assert_eq!(out[1], TokenRecord::new("café", 5, 1));
        assert_eq!(tokenizer().model_max_length(), None);
    }

    #[test]
    fn zero_width_pieces_are_skipped_and_renumbered() {
        let text = "né ici";
        let out = records_from_offsets(text, &[(0, 0), (0, 2), (2, 2), (3, 6)]);
        assert_eq!(out, vec![TokenRecord::new("né", 0, 0), TokenRecord::new("ici", 3, 1)]);
    }
}
