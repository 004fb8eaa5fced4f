use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

/// One JSON value per non-empty line.
pub fn parse_lines<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| serde_json::from_str(line).with_context(|| format!("parse line {}", n + 1)))
        .collect()
}

pub fn to_lines<T: Serialize>(items: &[T]) -> Result<String> {
    let mut out = String::new();
    for item in items {
        out.push_str(&serde_json::to_string(item)?);
        out.push('\n');
    }
    Ok(out)
}

pub async fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    parse_lines(&raw).with_context(|| format!("in {}", path.display()))
}

/// Write to `path`, or to stdout when no path is given.
pub async fn write_lines<T: Serialize>(path: Option<&Path>, items: &[T]) -> Result<()> {
    let body = to_lines(items)?;
    match path {
        Some(p) => tokio::fs::write(p, body)
            .await
            .with_context(|| format!("write {}", p.display())),
        None => {
            let mut out = tokio::io::stdout();
            out.write_all(body.as_bytes()).await?;
            out.flush().await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Span, Window};

    #[test]
    fn blank_lines_are_skipped() {
        let spans: Vec<Span> = parse_lines("[0,3]\n\n  \n[4,9,\"LOC\"]\n").unwrap();
        assert_eq!(spans, vec![Span::new(0, 3), Span::labeled(4, 9, "LOC")]);
    }

    #[test]
    fn bad_line_is_reported_with_its_number() {
        let err = parse_lines::<Span>("[0,3]\nnot json\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn windows_survive_a_jsonl_pass() {
        let windows = vec![
            Window { doc_id: 0, offset: Some(0), text: "a b".into(), ..Window::default() },
            Window { doc_id: 1, offset: Some(5), ..Window::default() },
        ];
        let body = to_lines(&windows).unwrap();
        assert_eq!(body.lines().count(), 2);
        let back: Vec<Window> = parse_lines(&body).unwrap();
        assert_eq!(back, windows);
    }

    #[tokio::test]
    async fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("spanwin-jsonl-{}.jsonl", std::process::id()));
        let spans = vec![Span::new(1, 2)];
        write_lines(Some(path.as_path()), &spans).await.unwrap();
        let back: Vec<Span> = read_lines(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;
        assert_eq!(back, spans);
    }
}
