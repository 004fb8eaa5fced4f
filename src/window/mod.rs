//! Splitting documents into overlapping token windows and folding per-window
//! model output back into one result per document.

pub mod builder;
pub mod error;
pub mod merge;
pub mod offsets;
pub mod types;

pub use builder::{BoundaryMarkers, WindowManager, WindowRequest};
pub use error::{Result, WindowError};
pub use merge::{group_by_doc, merge_windows};
pub use types::{Span, TokenRecord, Triple, Window};
