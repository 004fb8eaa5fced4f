pub mod blank;
pub mod window;

use crate::window::TokenRecord;

pub use self::blank::BlankSplitter;
pub use self::window::SlidingWindowSplitter;

/// Per-call split settings. Unset values fall back to the splitter's own
/// defaults; nothing is written back to the splitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitParams {
    pub window_size: Option<usize>,
    pub window_stride: Option<usize>,
    pub max_length: Option<usize>,
}

pub trait Splitter: Send + Sync {
    /// Groups of consecutive tokens, in document order.
    fn split(&self, tokens: &[TokenRecord], params: &SplitParams) -> Vec<Vec<TokenRecord>>;
}

impl<S: Splitter + ?Sized> Splitter for Box<S> {
    fn split(&self, tokens: &[TokenRecord], params: &SplitParams) -> Vec<Vec<TokenRecord>> {
        (**self).split(tokens, params)
    }
}
