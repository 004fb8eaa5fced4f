use crate::window::TokenRecord;

use super::{SplitParams, Splitter};

pub const DEFAULT_WINDOW_SIZE: usize = 32;
pub const DEFAULT_WINDOW_STRIDE: usize = 16;

/// Fixed-size token windows starting every `window_stride` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindowSplitter {
    pub window_size: usize,
    pub window_stride: usize,
}

impl SlidingWindowSplitter {
    pub fn new(window_size: usize, window_stride: usize) -> Self {
        Self { window_size, window_stride }
    }

    /// Size and stride for one call: explicit params win, `max_length` caps the size.
    pub fn resolve(&self, params: &SplitParams) -> (usize, usize) {
        let mut size = params.window_size.unwrap_or(self.window_size).max(1);
        if let Some(max) = params.max_length {
            size = size.min(max.max(1));
        }
        let stride = params.window_stride.unwrap_or(self.window_stride).clamp(1, size);
        (size, stride)
    }
}

impl Default for SlidingWindowSplitter {
    fn default() -> Self { Self::new(DEFAULT_WINDOW_SIZE, DEFAULT_WINDOW_STRIDE) }
}

impl Splitter for SlidingWindowSplitter {
    fn split(&self, tokens: &[TokenRecord], params: &SplitParams) -> Vec<Vec<TokenRecord>> {
        let (size, stride) = self.resolve(params);
        window_bounds(tokens.len(), size, stride)
            .into_iter()
            .map(|(start, end)| tokens[start..end].to_vec())
            .collect()
    }
}

/// `[start, end)` token ranges. The final window is pulled back so it still
/// holds `size` tokens and ends at the document end.
pub fn window_bounds(len: usize, size: usize, stride: usize) -> Vec<(usize, usize)> {
    let size = size.max(1);
    let stride = stride.clamp(1, size);

    let mut out = Vec::new();
    let mut start = 0usize;
    while start < len {
        if start != 0 && start + size > len {
            out.push((len - size, len));
            break;
        }
        let end = (start + size).min(len);
        out.push((start, end));
        if end == len { break; }
        start += stride;
    }
    out
}
