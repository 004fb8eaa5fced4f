use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::splitter::{SplitParams, Splitter};
use crate::tokenizer::{DocumentInput, Tokenizer};

use super::offsets::{char_token_maps, token_char_maps, token_end, CharOffsets};
use super::{Result, Span, TokenRecord, Window, WindowError};

/// Non-content tokens placed around every window's `tokens`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryMarkers {
    pub bos: String,
    pub eos: String,
}

impl Default for BoundaryMarkers {
    fn default() -> Self {
        Self { bos: "[CLS]".to_string(), eos: "[SEP]".to_string() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WindowRequest {
    pub documents: Vec<DocumentInput>,
    pub window_size: Option<usize>,
    pub stride: Option<usize>,
    pub max_length: Option<usize>,
    pub doc_topic: Option<String>,
    pub is_split_into_words: bool,
    /// One list of `[start_char, end_char]` per document.
    pub mentions: Option<Vec<Vec<Span>>>,
}

impl WindowRequest {
    pub fn new(documents: Vec<DocumentInput>) -> Self {
        Self { documents, ..Self::default() }
    }

    #[cfg(test)]
    pub fn single(document: impl Into<DocumentInput>) -> Self {
        Self::new(vec![document.into()])
    }

    pub fn window_size(mut self, size: Option<usize>) -> Self { self.window_size = size; self }
    pub fn stride(mut self, stride: Option<usize>) -> Self { self.stride = stride; self }
    pub fn max_length(mut self, max: Option<usize>) -> Self { self.max_length = max; self }
    pub fn doc_topic(mut self, topic: Option<String>) -> Self { self.doc_topic = topic; self }
    pub fn split_into_words(mut self, yes: bool) -> Self { self.is_split_into_words = yes; self }
    pub fn mentions(mut self, mentions: Option<Vec<Vec<Span>>>) -> Self { self.mentions = mentions; self }
}

/// Windows holding at least one mention (or all windows when no mentions
/// were given) and windows that caught none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowOutput {
    pub windows: Vec<Window>,
    pub blank: Vec<Window>,
}

pub struct WindowManager<T, S> {
    tokenizer: T,
    splitter: S,
    markers: BoundaryMarkers,
}

impl<T: Tokenizer, S: Splitter> WindowManager<T, S> {
    pub fn new(tokenizer: T, splitter: S) -> Self {
        Self { tokenizer, splitter, markers: BoundaryMarkers::default() }
    }

    pub fn with_markers(mut self, markers: BoundaryMarkers) -> Self {
        self.markers = markers;
        self
    }

    pub fn create_windows(&self, req: WindowRequest) -> Result<WindowOutput> {
        let documents: Vec<DocumentInput> = if req.is_split_into_words {
            req.documents.into_iter().map(into_words).collect()
        } else {
            req.documents
        };

        if let Some(mentions) = &req.mentions {
            if mentions.len() != documents.len() {
                return Err(WindowError::MentionCountMismatch {
                    documents: documents.len(),
                    mentions: mentions.len(),
                });
            }
        }

        let documents_tokens = self.tokenizer.tokenize(&documents)?;
        let params = SplitParams {
            window_size: req.window_size,
            window_stride: req.stride,
            max_length: req.max_length,
        };

        let mut out = WindowOutput::default();
        for (doc_id, (document, tokens)) in documents.iter().zip(documents_tokens.iter()).enumerate() {
            let mentions = req.mentions.as_ref().map(|m| m[doc_id].as_slice());
            let doc_topic = req
                .doc_topic
                .clone()
                .or_else(|| tokens.first().map(|t| t.text.clone()))
                .unwrap_or_default();

            let raw_windows = self.splitter.split(tokens, &params);
            let (mut kept, mut blank) = (0usize, 0usize);
            for (window_id, raw) in raw_windows.iter().enumerate() {
                let Some(window) = self.build_window(doc_id, window_id, document, raw, &doc_topic, mentions) else {
                    continue;
                };
                if mentions.is_some() && window.spans.is_empty() {
                    out.blank.push(window);
                    blank += 1;
                } else {
                    out.windows.push(window);
                    kept += 1;
                }
            }
            debug!(doc_id, tokens = tokens.len(), windows = kept, blank, "document windowed");
        }

        info!(documents = documents.len(), windows = out.windows.len(), blank = out.blank.len(), "windows created");
        Ok(out)
    }

    fn build_window(
        &self,
        doc_id: usize,
        window_id: usize,
        document: &DocumentInput,
        raw: &[TokenRecord],
        doc_topic: &str,
        mentions: Option<&[Span]>,
    ) -> Option<Window> {
        let first = raw.first()?;
        let last = raw.last()?;
        let window_text_start = first.idx;
        let window_text_end = token_end(last);

        let text = match document {
            DocumentInput::Text(doc) => {
                CharOffsets::new(doc).slice(doc, window_text_start, window_text_end).to_string()
            }
            // offsets of pre-split input are not trusted for slicing
            DocumentInput::Words(_) => raw.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" "),
        };

        let words: Vec<String> = raw.iter().map(|t| t.text.clone()).collect();
        let mut tokens = Vec::with_capacity(words.len() + 2);
        tokens.push(self.markers.bos.clone());
        tokens.extend(words.iter().cloned());
        tokens.push(self.markers.eos.clone());

        let spans = mentions
            .unwrap_or_default()
            .iter()
            .filter(|m| m.within(window_text_start, window_text_end))
            .map(|m| Span::new(m.start, m.end))
            .collect();

        let (token2char_start, token2char_end) = token_char_maps(raw);
        let (char2token_start, char2token_end) = char_token_maps(raw);
        let token2word: BTreeMap<usize, usize> = raw.iter().enumerate().map(|(k, t)| (k, t.i)).collect();

        Some(Window {
            doc_id,
            window_id,
            offset: Some(window_text_start),
            text,
            tokens,
            words,
            doc_topic: Some(doc_topic.to_string()),
            spans,
            token2char_start,
            token2char_end,
            char2token_start,
            char2token_end,
            token2word_start: Some(token2word.clone()),
            token2word_end: Some(token2word),
            ..Window::default()
        })
    }
}

fn into_words(doc: DocumentInput) -> DocumentInput {
    match doc {
        DocumentInput::Text(text) => DocumentInput::Words(text.split_whitespace().map(str::to_string).collect()),
        words => words,
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;
    use crate::splitter::SlidingWindowSplitter;
    use crate::tokenizer::RegexTokenizer;
    use crate::window::merge_windows;

    fn document(n: usize) -> (String, Vec<String>) {
        let words: Vec<String> = (0..n).map(|i| format!("w{i}")).collect();
        (words.join(" "), words)
    }

    proptest! {
        #[test]
        fn windows_then_merge_restores_the_document(n in 1usize..60, size in 1usize..12, stride_seed in 0usize..12) {
            let stride = 1 + stride_seed % size;
            let (doc, words) = document(n);
            let mgr = WindowManager::new(RegexTokenizer::new(), SlidingWindowSplitter::default());
            let req = WindowRequest::single(doc.as_str()).window_size(Some(size)).stride(Some(stride));
            let out = mgr.create_windows(req).unwrap();

            let merged = merge_windows(out.windows).unwrap();
            prop_assert_eq!(merged.len(), 1);
            prop_assert_eq!(&merged[0].words, &words);
            prop_assert_eq!(&merged[0].text, &doc);
            prop_assert_eq!(merged[0].content_tokens(), words.as_slice());
        }

        #[test]
        fn kept_spans_lie_inside_their_window(n in 1usize..40, size in 1usize..10, picks in proptest::collection::vec((0usize..40, 1usize..4), 0..6)) {
            let (doc, _) = document(n);
            let tokens = RegexTokenizer::new().tokenize_one(&DocumentInput::Text(doc.clone())).unwrap();
            // mentions over runs of whole words
            let mentions: Vec<Span> = picks
                .into_iter()
                .filter(|(start, _)| *start < tokens.len())
                .map(|(start, len)| {
                    let last = (start + len - 1).min(tokens.len() - 1);
                    Span::new(tokens[start].idx, token_end(&tokens[last]))
                })
                .collect();

            let mgr = WindowManager::new(RegexTokenizer::new(), SlidingWindowSplitter::default());
            let req = WindowRequest::single(doc.as_str())
                .window_size(Some(size))
                .stride(Some(size))
                .mentions(Some(vec![mentions]));
            let out = mgr.create_windows(req).unwrap();

            for w in out.windows.iter().chain(&out.blank) {
                let start = w.offset.unwrap();
                let end = w.text_end().unwrap();
                prop_assert_eq!(w.text.chars().count(), end - start);
                for span in &w.spans {
                    prop_assert!(span.start >= start && span.end <= end);
                }
            }
            prop_assert!(out.blank.iter().all(|w| w.spans.is_empty()));
        }
    }
}
