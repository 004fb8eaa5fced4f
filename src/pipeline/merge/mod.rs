use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use crate::output::types::Meta;
use crate::pipeline::jsonl::{read_lines, write_lines};
use crate::telemetry::{self};
use crate::telemetry::ops::merge::Phase as MergePhase;
use crate::window::{group_by_doc, merge_windows, Window};

#[derive(Args, Debug)]
pub struct MergeCmd {
    /// JSONL of windows carrying model output, any order, any number of documents
    #[arg(long)] input: PathBuf,
    #[arg(long)] out: Option<PathBuf>,
}

#[derive(Serialize)]
struct DocResult { doc_id: usize, windows: usize, tokens: usize, predicted_spans: usize, predicted_triples: usize }

#[derive(Serialize)]
struct MergeResult { windows: usize, documents: usize, per_doc: Vec<DocResult> }

pub async fn run(args: MergeCmd) -> Result<()> {
    let t0 = Instant::now();
    let log = telemetry::merge();
    let _g = log.root_span_kv([
        ("input", args.input.display().to_string()),
        ("out", format!("{:?}", args.out)),
    ]).entered();

    if telemetry::config::json_mode() && args.out.is_none() {
        bail!("--out is required with --json (stdout carries the result envelope)");
    }

    let windows: Vec<Window> = {
        let _s = log.span(&MergePhase::LoadInput).entered();
        read_lines(&args.input).await?
    };
    let n_windows = windows.len();
    if windows.is_empty() {
        log.info("ℹ️  No windows to merge");
    }

    let groups = {
        let _s = log.span(&MergePhase::Group).entered();
        group_by_doc(windows)
    };

    let merged = {
        let _s = log.span(&MergePhase::MergeDoc).entered();
        merge_groups(groups).await?
    };

    let per_doc: Vec<DocResult> = merged
        .iter()
        .map(|(w, n)| DocResult {
            doc_id: w.doc_id,
            windows: *n,
            tokens: w.words.len(),
            predicted_spans: w.predicted_spans.as_ref().map_or(0, |s| s.len()),
            predicted_triples: w.predicted_triples.as_ref().map_or(0, |t| t.len()),
        })
        .collect();
    let merged: Vec<Window> = merged.into_iter().map(|(w, _)| w).collect();

    {
        let _s = log.span(&MergePhase::WriteOutput).entered();
        write_lines(args.out.as_deref(), &merged).await?;
    }

    log.info_kv(
        &format!("✅ {} window(s) → {} document(s)", n_windows, merged.len()),
        [("windows", n_windows.to_string()), ("documents", merged.len().to_string())],
    );

    if telemetry::config::json_mode() {
        let res = MergeResult { windows: n_windows, documents: merged.len(), per_doc };
        log.result(&res, Some(Meta { duration_ms: Some(t0.elapsed().as_millis()) }))?;
    }
    Ok(())
}

/// Each document group goes through `merge_windows` on the blocking pool;
/// results come back in first-seen order.
async fn merge_groups(groups: Vec<(usize, Vec<Window>)>) -> Result<Vec<(Window, usize)>> {
    let handles: Vec<_> = groups
        .into_iter()
        .map(|(doc_id, doc_windows)| {
            let n = doc_windows.len();
            (doc_id, n, tokio::task::spawn_blocking(move || merge_windows(doc_windows)))
        })
        .collect();

    let mut out = Vec::with_capacity(handles.len());
    for (doc_id, n, handle) in handles {
        let merged = handle
            .await
            .with_context(|| format!("merge task for doc_id={}", doc_id))?
            .with_context(|| format!("merge doc_id={}", doc_id))?;
        out.extend(merged.into_iter().map(|window| (window, n)));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(doc_id: usize, offset: usize, words: &[&str]) -> Window {
        let words: Vec<String> = words.iter().map(|s| s.to_string()).collect();
        let mut tokens = vec!["[CLS]".to_string()];
        tokens.extend(words.iter().cloned());
        tokens.push("[SEP]".to_string());
        Window { doc_id, offset: Some(offset), tokens, words, ..Window::default() }
    }

    #[tokio::test]
    async fn parallel_merge_matches_sequential() {
        let windows = vec![
            window(1, 6, &["c", "d", "e"]),
            window(0, 0, &["x"]),
            window(1, 0, &["a", "b", "c"]),
            window(1, 3, &["b", "c", "d"]),
        ];
        let expected = merge_windows(windows.clone()).unwrap();
        let got = merge_groups(group_by_doc(windows)).await.unwrap();

        let counts: Vec<usize> = got.iter().map(|(_, n)| *n).collect();
        assert_eq!(counts, vec![3, 1]);
        let got: Vec<Window> = got.into_iter().map(|(w, _)| w).collect();
        assert_eq!(got, expected);
        assert_eq!(got[0].words, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn precondition_failure_names_the_document() {
        let windows = vec![window(4, 2, &["a"]), window(4, 2, &["b"])];
        let err = merge_groups(group_by_doc(windows)).await.unwrap_err();
        assert!(format!("{err:#}").contains("doc_id=4"));
    }
}
