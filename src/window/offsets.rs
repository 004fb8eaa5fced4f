use std::collections::BTreeMap;

use super::types::TokenRecord;

/// Byte <-> char conversion for one document. ASCII text maps to itself.
pub struct CharOffsets {
    char_to_byte: Vec<usize>,
    byte_len: usize,
    ascii: bool,
}

impl CharOffsets {
    pub fn new(text: &str) -> Self {
        if text.is_ascii() {
            return Self { char_to_byte: Vec::new(), byte_len: text.len(), ascii: true };
        }
        let char_to_byte = text.char_indices().map(|(b, _)| b).collect();
        Self { char_to_byte, byte_len: text.len(), ascii: false }
    }

    /// Char offsets past the end clamp to the byte length.
    pub fn char_to_byte(&self, char_idx: usize) -> usize {
        if self.ascii {
            return char_idx.min(self.byte_len);
        }
        self.char_to_byte.get(char_idx).copied().unwrap_or(self.byte_len)
    }

    pub fn byte_to_char(&self, byte_idx: usize) -> usize {
        if self.ascii {
            return byte_idx.min(self.byte_len);
        }
        match self.char_to_byte.binary_search(&byte_idx) {
            Ok(c) => c,
            Err(c) => c,
        }
    }

    /// Substring by char range, clamped to the text.
    pub fn slice<'a>(&self, text: &'a str, char_start: usize, char_end: usize) -> &'a str {
        let start = self.char_to_byte(char_start);
        let end = self.char_to_byte(char_end.max(char_start));
        &text[start..end]
    }
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// End offset (exclusive, in chars) of a token.
pub fn token_end(token: &TokenRecord) -> usize {
    token.idx + char_len(&token.text)
}

/// Content-index -> char maps for the tokens of one window.
pub fn token_char_maps(window: &[TokenRecord]) -> (BTreeMap<usize, usize>, BTreeMap<usize, usize>) {
    let starts = window.iter().enumerate().map(|(k, t)| (k, t.idx)).collect();
    let ends = window.iter().enumerate().map(|(k, t)| (k, token_end(t))).collect();
    (starts, ends)
}

/// Char -> global token index maps for the tokens of one window.
pub fn char_token_maps(window: &[TokenRecord]) -> (BTreeMap<usize, usize>, BTreeMap<usize, usize>) {
    let starts = window.iter().map(|t| (t.idx, t.i)).collect();
    let ends = window.iter().map(|t| (token_end(t), t.i)).collect();
    (starts, ends)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_identity() {
        let conv = CharOffsets::new("plain text");
        assert_eq!(conv.char_to_byte(3), 3);
        assert_eq!(conv.byte_to_char(7), 7);
        assert_eq!(conv.slice("plain text", 6, 10), "text");
    }

    #[test]
    fn multibyte_slices_by_chars() {
        let text = "The café costs €50";
        let conv = CharOffsets::new(text);
        assert_eq!(char_len(text), 18);
        assert_eq!(conv.slice(text, 4, 8), "café");
        assert_eq!(conv.slice(text, 15, 18), "€50");
        assert_eq!(conv.byte_to_char(text.find('€').unwrap()), 15);
    }

    #[test]
    fn slice_clamps_past_end() {
        let text = "naïve";
        let conv = CharOffsets::new(text);
        assert_eq!(conv.slice(text, 2, 99), "ïve");
        assert_eq!(conv.slice(text, 4, 2), "");
    }

    #[test]
    fn token_maps_use_local_and_global_indices() {
        let window = vec![
            TokenRecord::new("was", 13, 2),
            TokenRecord::new("born", 17, 3),
        ];
        let (t2c_start, t2c_end) = token_char_maps(&window);
        assert_eq!(t2c_start.get(&0), Some(&13));
        assert_eq!(t2c_end.get(&1), Some(&21));

        let (c2t_start, c2t_end) = char_token_maps(&window);
        assert_eq!(c2t_start.get(&17), Some(&3));
        assert_eq!(c2t_end.get(&16), Some(&2));
    }
}
