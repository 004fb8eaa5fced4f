use crate::window::TokenRecord;

use super::{SplitParams, Splitter};

/// The whole document is one window, cut every `max_length` tokens if set.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankSplitter;

impl Splitter for BlankSplitter {
    fn split(&self, tokens: &[TokenRecord], params: &SplitParams) -> Vec<Vec<TokenRecord>> {
        if tokens.is_empty() {
            return Vec::new();
        }
        match params.max_length {
            Some(max) => tokens.chunks(max.max(1)).map(|c| c.to_vec()).collect(),
            None => vec![tokens.to_vec()],
        }
    }
}
