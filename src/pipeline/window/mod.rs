mod input;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::output::types::Meta;
use crate::pipeline::jsonl::write_lines;
use crate::splitter::{BlankSplitter, SlidingWindowSplitter, Splitter};
use crate::telemetry::{self};
use crate::telemetry::ops::window::Phase as WindowPhase;
use crate::tokenizer::{HfTokenizer, RegexTokenizer, Tokenizer};
use crate::window::{BoundaryMarkers, WindowManager, WindowRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TokenizerKind { Regex, Hf }

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SplitterKind { Window, Blank }

#[derive(Args, Debug)]
pub struct WindowCmd {
    /// JSON array (or JSONL) of documents
    #[arg(long)] input: PathBuf,
    /// one list of [start, end] char spans per document
    #[arg(long)] mentions: Option<PathBuf>,
    #[arg(long)] window_size: Option<usize>,
    #[arg(long)] stride: Option<usize>,
    #[arg(long)] max_length: Option<usize>,
    #[arg(long)] doc_topic: Option<String>,
    #[arg(long, default_value_t = false)] split_into_words: bool,
    #[arg(long, value_enum, default_value_t = TokenizerKind::Regex)] tokenizer: TokenizerKind,
    /// regex for `--tokenizer regex`
    #[arg(long)] token_pattern: Option<String>,
    #[arg(long, default_value = "bert-base-cased")] hf_model: String,
    /// local tokenizer.json; skips the hub
    #[arg(long)] hf_file: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = SplitterKind::Window)] splitter: SplitterKind,
    #[arg(long, default_value = "[CLS]")] bos: String,
    #[arg(long, default_value = "[SEP]")] eos: String,
    #[arg(long)] out: Option<PathBuf>,
    #[arg(long)] blank_out: Option<PathBuf>,
}

#[derive(Serialize)]
struct WindowResult {
    documents: usize,
    windows: usize,
    blank: usize,
    out: Option<String>,
    blank_out: Option<String>,
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

pub async fn run(args: WindowCmd) -> Result<()> {
    let t0 = Instant::now();
    let log = telemetry::window();
    let window_size = args.window_size.or_else(|| env_usize("SPANWIN_WINDOW_SIZE"));
    let stride = args.stride.or_else(|| env_usize("SPANWIN_WINDOW_STRIDE"));
    let _g = log.root_span_kv([
        ("input", args.input.display().to_string()),
        ("window_size", format!("{:?}", window_size)),
        ("stride", format!("{:?}", stride)),
        ("max_length", format!("{:?}", args.max_length)),
        ("tokenizer", format!("{:?}", args.tokenizer)),
        ("splitter", format!("{:?}", args.splitter)),
        ("split_into_words", args.split_into_words.to_string()),
    ]).entered();

    if telemetry::config::json_mode() && args.out.is_none() {
        bail!("--out is required with --json (stdout carries the result envelope)");
    }

    let (documents, mentions) = {
        let _s = log.span(&WindowPhase::LoadInput).entered();
        let documents = input::load_documents(&args.input).await?;
        let mentions = match &args.mentions {
            Some(p) => Some(input::load_mentions(p).await?),
            None => None,
        };
        (documents, mentions)
    };
    if documents.is_empty() {
        log.info("ℹ️  No documents to window");
    }

    let (tokenizer, model_max_length): (Box<dyn Tokenizer>, Option<usize>) = {
        let _s = log.span(&WindowPhase::LoadTokenizer).entered();
        match args.tokenizer {
            TokenizerKind::Regex => {
                let tok = match &args.token_pattern {
                    Some(p) => RegexTokenizer::with_pattern(p).with_context(|| format!("token pattern {p}"))?,
                    None => RegexTokenizer::new(),
                };
                (Box::new(tok), None)
            }
            TokenizerKind::Hf => {
                let tok = match &args.hf_file {
                    Some(p) => HfTokenizer::from_file(p),
                    None => HfTokenizer::from_pretrained(&args.hf_model),
                }
                .with_context(|| format!("init tokenizer {}", args.hf_model))?;
                let max = tok.model_max_length();
                (Box::new(tok), max)
            }
        }
    };
    let splitter: Box<dyn Splitter> = match args.splitter {
        SplitterKind::Window => Box::new(SlidingWindowSplitter::default()),
        SplitterKind::Blank => Box::new(BlankSplitter),
    };

    // leave room for the boundary markers
    let max_length = args.max_length.or(model_max_length.map(|n| n.saturating_sub(2)));
    let manager = WindowManager::new(tokenizer, splitter)
        .with_markers(BoundaryMarkers { bos: args.bos.clone(), eos: args.eos.clone() });
    let req = WindowRequest::new(documents)
        .window_size(window_size)
        .stride(stride)
        .max_length(max_length)
        .doc_topic(args.doc_topic.clone())
        .split_into_words(args.split_into_words)
        .mentions(mentions);
    let n_docs = req.documents.len();

    let output = {
        let _s = log.span(&WindowPhase::Build).entered();
        manager.create_windows(req).context("create windows")?
    };

    {
        let _s = log.span(&WindowPhase::WriteOutput).entered();
        write_lines(args.out.as_deref(), &output.windows).await?;
        match &args.blank_out {
            Some(p) => write_lines(Some(p.as_path()), &output.blank).await?,
            None if !output.blank.is_empty() => {
                log.warn(format!("⚠️  {} blank window(s) dropped (no --blank-out)", output.blank.len()));
            }
            None => {}
        }
    }

    log.info_kv(
        &format!("✅ {} document(s) → {} window(s), {} blank", n_docs, output.windows.len(), output.blank.len()),
        [("documents", n_docs.to_string()), ("windows", output.windows.len().to_string())],
    );

    if telemetry::config::json_mode() {
        let res = WindowResult {
            documents: n_docs,
            windows: output.windows.len(),
            blank: output.blank.len(),
            out: args.out.as_ref().map(|p| p.display().to_string()),
            blank_out: args.blank_out.as_ref().map(|p| p.display().to_string()),
        };
        log.result(&res, Some(Meta { duration_ms: Some(t0.elapsed().as_millis()) }))?;
    }
    Ok(())
}
