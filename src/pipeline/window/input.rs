use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::pipeline::jsonl::parse_lines;
use crate::tokenizer::DocumentInput;
use crate::window::Span;

/// A JSON array of items, or one item per line.
fn parse_list<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>> {
    if raw.trim_start().starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<T>>(raw) {
            return Ok(items);
        }
    }
    parse_lines(raw)
}

pub async fn load_documents(path: &Path) -> Result<Vec<DocumentInput>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read documents {}", path.display()))?;
    parse_list(&raw).with_context(|| format!("parse documents {}", path.display()))
}

/// One `[[start, end], ...]` list per document.
pub async fn load_mentions(path: &Path) -> Result<Vec<Vec<Span>>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read mentions {}", path.display()))?;
    parse_list(&raw).with_context(|| format!("parse mentions {}", path.display()))
}
