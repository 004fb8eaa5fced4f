pub mod merge;
pub mod window;
