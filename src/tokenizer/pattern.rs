use regex::Regex;

use crate::window::offsets::CharOffsets;
use crate::window::{Result, TokenRecord, WindowError};

use super::{words_to_tokens, DocumentInput, Tokenizer};

pub const DEFAULT_PATTERN: &str = r"\w+|[^\w\s]";

/// Word/punctuation tokenizer; offsets are reported in chars.
#[derive(Debug, Clone)]
pub struct RegexTokenizer {
    re: Regex,
}

impl RegexTokenizer {
    pub fn new() -> Self {
        Self { re: Regex::new(DEFAULT_PATTERN).expect("default token pattern compiles") }
    }

    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern).map_err(|e| WindowError::tokenizer(e.to_string()))?;
        Ok(Self { re })
    }

    fn tokenize_text(&self, text: &str) -> Vec<TokenRecord> {
        let conv = CharOffsets::new(text);
        self.re
            .find_iter(text)
            .enumerate()
            .map(|(i, m)| TokenRecord::new(m.as_str(), conv.byte_to_char(m.start()), i))
            .collect()
    }
}

impl Default for RegexTokenizer {
    fn default() -> Self { Self::new() }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize_one(&self, doc: &DocumentInput) -> Result<Vec<TokenRecord>> {
        Ok(match doc {
            DocumentInput::Text(text) => self.tokenize_text(text),
            DocumentInput::Words(words) => words_to_tokens(words),
        })
    }
}
