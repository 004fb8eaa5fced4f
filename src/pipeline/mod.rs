pub mod jsonl;
pub mod merge;
pub mod window;
