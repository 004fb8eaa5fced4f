use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::debug;

use super::types::{SpanProbs, TripleProbs};
use super::{Result, Span, Triple, Window, WindowError};

/// Merge every document's windows into one window per document, in the
/// order documents are first seen.
pub fn merge_windows(windows: Vec<Window>) -> Result<Vec<Window>> {
    let mut merged = Vec::new();
    for (_, doc_windows) in group_by_doc(windows) {
        if let Some(window) = merge_doc_windows(doc_windows)? {
            merged.push(window);
        }
    }
    Ok(merged)
}

pub fn group_by_doc(windows: Vec<Window>) -> Vec<(usize, Vec<Window>)> {
    let mut slot: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<(usize, Vec<Window>)> = Vec::new();
    for window in windows {
        let i = *slot.entry(window.doc_id).or_insert_with(|| {
            groups.push((window.doc_id, Vec::new()));
            groups.len() - 1
        });
        groups[i].1.push(window);
    }
    groups
}

/// Left fold over the windows of one document in offset order. A single
/// window comes back untouched.
pub fn merge_doc_windows(mut windows: Vec<Window>) -> Result<Option<Window>> {
    windows.sort_by_key(|w| w.offset);
    let mut iter = windows.into_iter();
    let Some(first) = iter.next() else { return Ok(None) };
    iter.try_fold(first, |acc, next| merge_window_pair(&acc, &next)).map(Some)
}

/// Combine `a` with the later window `b` of the same document.
pub fn merge_window_pair(a: &Window, b: &Window) -> Result<Window> {
    if a.doc_id != b.doc_id {
        return Err(WindowError::DocIdMismatch { left: a.doc_id, right: b.doc_id });
    }
    if let (Some(left), Some(right)) = (a.offset, b.offset) {
        if left >= right {
            return Err(WindowError::OffsetOrder { left, right });
        }
    }

    let tokens = merge_tokens(a, b);
    let words = merge_words(a, b);
    let predictions = merge_predictions(a, b)?;
    debug!(doc_id = a.doc_id, token_overlap = tokens.overlap, word_overlap = words.overlap, "merged window pair");

    Ok(Window {
        doc_id: a.doc_id,
        window_id: a.window_id,
        offset: b.offset,
        text: merge_text(a, b),
        tokens: tokens.items,
        words: words.items,
        doc_topic: a.doc_topic.clone().or_else(|| b.doc_topic.clone()),
        spans: a.spans.iter().chain(&b.spans).cloned().collect::<BTreeSet<_>>().into_iter().collect(),
        token2char_start: tokens.start,
        token2char_end: tokens.end,
        char2token_start: union_first_wins(&a.char2token_start, &b.char2token_start),
        char2token_end: union_first_wins(&a.char2token_end, &b.char2token_end),
        token2word_start: words.start,
        token2word_end: words.end,
        candidates: merge_candidates(&a.candidates, &b.candidates),
        windows_candidates: merge_candidates(&a.windows_candidates, &b.windows_candidates),
        span_candidates: merge_candidates(&a.span_candidates, &b.span_candidates),
        triplet_candidates: merge_candidates(&a.triplet_candidates, &b.triplet_candidates),
        window_labels: merge_span_annotations(a.window_labels.as_deref(), b.window_labels.as_deref()),
        predicted_spans: predictions.spans,
        predicted_spans_probs: predictions.spans_probs,
        predicted_triples: predictions.triples,
        predicted_triples_probs: predictions.triples_probs,
    })
}

/// Longest `k` (at most `a.len() - 1`) such that `a` ends with the first `k`
/// items of `b`; 0 when nothing lines up.
pub fn overlap_len(a: &[String], b: &[String]) -> usize {
    (1..a.len())
        .rev()
        .find(|&k| k <= b.len() && a[a.len() - k..] == b[..k])
        .unwrap_or(0)
}

/// `a`'s entries as-is; `b`'s entries past the overlap, shifted into the
/// merged index space.
fn remap_index(
    a: &BTreeMap<usize, usize>,
    b: &BTreeMap<usize, usize>,
    overlap: usize,
    shift: usize,
) -> BTreeMap<usize, usize> {
    let mut out = a.clone();
    for (&t, &v) in b {
        if t < overlap {
            continue;
        }
        out.entry(t + shift).or_insert(v);
    }
    out
}

struct Merged<M> {
    items: Vec<String>,
    start: M,
    end: M,
    overlap: usize,
}

fn merge_tokens(a: &Window, b: &Window) -> Merged<BTreeMap<usize, usize>> {
    let a_content = a.content_tokens();
    let b_content = b.content_tokens();
    let overlap = overlap_len(a_content, b_content);
    let shift = a_content.len() - overlap;

    let mut items = Vec::with_capacity(a_content.len() + b_content.len() + 2);
    let markers = if a.tokens.len() >= 2 { Some(&a.tokens) } else if b.tokens.len() >= 2 { Some(&b.tokens) } else { None };
    if let Some(m) = markers {
        items.push(m[0].clone());
    }
    items.extend_from_slice(a_content);
    items.extend_from_slice(&b_content[overlap..]);
    if let Some(m) = markers {
        items.push(m[m.len() - 1].clone());
    }

    Merged {
        items,
        start: remap_index(&a.token2char_start, &b.token2char_start, overlap, shift),
        end: remap_index(&a.token2char_end, &b.token2char_end, overlap, shift),
        overlap,
    }
}

fn merge_words(a: &Window, b: &Window) -> Merged<Option<BTreeMap<usize, usize>>> {
    let overlap = overlap_len(&a.words, &b.words);
    let shift = a.words.len() - overlap;

    let mut items = a.words.clone();
    items.extend_from_slice(&b.words[overlap..]);

    let remap = |x: &Option<BTreeMap<usize, usize>>, y: &Option<BTreeMap<usize, usize>>| match (x, y) {
        (None, None) => None,
        _ => Some(remap_index(
            x.as_ref().unwrap_or(&BTreeMap::new()),
            y.as_ref().unwrap_or(&BTreeMap::new()),
            overlap,
            shift,
        )),
    };

    Merged {
        items,
        start: remap(&a.token2word_start, &b.token2word_start),
        end: remap(&a.token2word_end, &b.token2word_end),
        overlap,
    }
}

fn union_first_wins(a: &BTreeMap<usize, usize>, b: &BTreeMap<usize, usize>) -> BTreeMap<usize, usize> {
    let mut out = a.clone();
    for (&k, &v) in b {
        out.entry(k).or_insert(v);
    }
    out
}

/// `a` then the part of `b` it does not already cover. Windows that do not
/// touch are joined with one space.
fn merge_text(a: &Window, b: &Window) -> String {
    if a.text.is_empty() {
        return b.text.clone();
    }
    match (a.text_end(), b.offset) {
        (Some(a_end), Some(b_start)) if a_end >= b_start => {
            let tail: String = b.text.chars().skip(a_end - b_start).collect();
            format!("{}{}", a.text, tail)
        }
        _ if b.text.is_empty() => a.text.clone(),
        _ => format!("{} {}", a.text, b.text),
    }
}

/// Union of both label lists, exact duplicates dropped, sorted by start.
pub fn merge_span_annotations(a: Option<&[Span]>, b: Option<&[Span]>) -> Option<Vec<Span>> {
    if a.is_none() && b.is_none() {
        return None;
    }
    let mut seen: HashSet<&Span> = HashSet::new();
    let mut out: Vec<Span> = a
        .unwrap_or_default()
        .iter()
        .chain(b.unwrap_or_default())
        .filter(|s| seen.insert(*s))
        .cloned()
        .collect();
    out.sort_by_key(|s| s.start);
    Some(out)
}

pub fn merge_candidates(a: &Option<Vec<String>>, b: &Option<Vec<String>>) -> Option<Vec<String>> {
    if a.is_none() && b.is_none() {
        return None;
    }
    let set: BTreeSet<&String> = a.iter().flatten().chain(b.iter().flatten()).collect();
    Some(set.into_iter().cloned().collect())
}

#[derive(Debug, Default)]
struct Predictions {
    spans: Option<Vec<Span>>,
    spans_probs: Option<SpanProbs>,
    triples: Option<Vec<Triple>>,
    triples_probs: Option<TripleProbs>,
}

fn merge_predictions(a: &Window, b: &Window) -> Result<Predictions> {
    let (Some(a_spans), Some(b_spans)) = (&a.predicted_spans, &b.predicted_spans) else {
        return Ok(Predictions::default());
    };

    let spans: Vec<Span> = a_spans.iter().chain(b_spans).cloned().collect::<BTreeSet<_>>().into_iter().collect();

    let spans_probs = match (&a.predicted_spans_probs, &b.predicted_spans_probs) {
        (None, None) => None,
        (x, y) => {
            let mut probs = SpanProbs::new();
            // first writer wins on duplicate spans
            for (span, p) in x.iter().flatten().chain(y.iter().flatten()) {
                probs.entry(span.clone()).or_insert_with(|| p.clone());
            }
            Some(probs)
        }
    };

    let (triples, triples_probs) = match (&a.predicted_triples, &b.predicted_triples) {
        (Some(a_triples), Some(b_triples)) => {
            let index: HashMap<&Span, usize> = spans.iter().enumerate().map(|(i, s)| (s, i)).collect();
            let mut merged: BTreeSet<Triple> = BTreeSet::new();
            merged.extend(translate_triples(a_spans, a_triples, &index)?);
            merged.extend(translate_triples(b_spans, b_triples, &index)?);
            // triple probabilities are not carried across merges
            (Some(merged.into_iter().collect()), Some(TripleProbs::new()))
        }
        _ => (None, None),
    };

    Ok(Predictions { spans: Some(spans), spans_probs, triples, triples_probs })
}

/// Rewrite local span indices as positions in the merged span list.
fn translate_triples(
    local_spans: &[Span],
    triples: &[Triple],
    merged_index: &HashMap<&Span, usize>,
) -> Result<Vec<Triple>> {
    let lookup = |i: usize| -> Result<usize> {
        let span = local_spans
            .get(i)
            .ok_or(WindowError::TripleIndex { index: i, spans: local_spans.len() })?;
        Ok(merged_index[span])
    };
    triples
        .iter()
        .map(|t| Ok(Triple(lookup(t.head())?, t.1.clone(), lookup(t.tail())?, t.3.clone())))
        .collect()
}
