use thiserror::Error;

pub type Result<T> = std::result::Result<T, WindowError>;

/// Caller errors raised by window construction and merging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("documents and mentions should have the same length, got {documents} and {mentions}")]
    MentionCountMismatch { documents: usize, mentions: usize },

    #[error("cannot merge windows of different documents ({left} vs {right})")]
    DocIdMismatch { left: usize, right: usize },

    #[error("window 2 offset ({right}) is not greater than window 1 offset ({left})")]
    OffsetOrder { left: usize, right: usize },

    #[error("triple references span {index} but the window has {spans} predicted span(s)")]
    TripleIndex { index: usize, spans: usize },

    #[error("tokenizer failed: {0}")]
    Tokenizer(String),
}

impl WindowError {
    pub fn tokenizer(msg: impl Into<String>) -> Self {
        WindowError::Tokenizer(msg.into())
    }
}
