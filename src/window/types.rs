use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

/// One token as produced by a tokenizer: text, char offset, global index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub text: String,
    pub idx: usize,
    pub i: usize,
}

impl TokenRecord {
    pub fn new(text: impl Into<String>, idx: usize, i: usize) -> Self {
        Self { text: text.into(), idx, i }
    }
}

/// Extra member of a span: a class name, an entity id, a score.
/// Numbers order numerically and before text; anything else sorts last by
/// its JSON text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Number(Number),
    Text(String),
    Other(Value),
}

impl Label {
    fn rank(&self) -> u8 {
        match self {
            Label::Number(_) => 0,
            Label::Text(_) => 1,
            Label::Other(_) => 2,
        }
    }
}

fn number_key(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Label::Number(a), Label::Number(b)) => number_key(a).total_cmp(&number_key(b)),
            (Label::Text(a), Label::Text(b)) => a.cmp(b),
            (Label::Other(a), Label::Other(b)) => a.to_string().cmp(&b.to_string()),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Label::Number(n) => number_key(n).to_bits().hash(state),
            Label::Text(s) => s.hash(state),
            Label::Other(v) => v.to_string().hash(state),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self { Label::Text(s.to_string()) }
}

impl From<String> for Label {
    fn from(s: String) -> Self { Label::Text(s) }
}

impl From<u64> for Label {
    fn from(n: u64) -> Self { Label::Number(n.into()) }
}

/// `[start, end, label...]`. Ordered and hashed as the plain tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub labels: Vec<Label>,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end, labels: Vec::new() }
    }

    #[cfg(test)]
    pub fn labeled(start: usize, end: usize, label: impl Into<Label>) -> Self {
        Self { start, end, labels: vec![label.into()] }
    }

    /// Fully inside `[window_start, window_end)`.
    pub fn within(&self, window_start: usize, window_end: usize) -> bool {
        window_end > self.start
            && self.start >= window_start
            && window_end >= self.end
            && self.end >= window_start
    }
}

impl Serialize for Span {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2 + self.labels.len()))?;
        seq.serialize_element(&self.start)?;
        seq.serialize_element(&self.end)?;
        for label in &self.labels {
            seq.serialize_element(label)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Span {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SpanVisitor;

        impl<'de> Visitor<'de> for SpanVisitor {
            type Value = Span;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array [start, end, label...]")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Span, A::Error> {
                let start = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let end = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let mut labels = Vec::new();
                while let Some(label) = seq.next_element::<Label>()? {
                    labels.push(label);
                }
                Ok(Span { start, end, labels })
            }
        }

        deserializer.deserialize_seq(SpanVisitor)
    }
}

/// Last member of a predicted triple: a confidence or a label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Number(f64),
    Label(String),
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Score::Number(a), Score::Number(b)) => a.total_cmp(b),
            (Score::Number(_), Score::Label(_)) => Ordering::Less,
            (Score::Label(_), Score::Number(_)) => Ordering::Greater,
            (Score::Label(a), Score::Label(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl Hash for Score {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Score::Number(n) => {
                0u8.hash(state);
                n.to_bits().hash(state);
            }
            Score::Label(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

/// `(head_span_index, relation, tail_span_index, score)`; indices point into
/// the owning window's `predicted_spans`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple(pub usize, pub String, pub usize, pub Score);

impl Triple {
    pub fn head(&self) -> usize { self.0 }
    pub fn tail(&self) -> usize { self.2 }
}

pub type SpanProbs = BTreeMap<Span, Value>;
pub type TripleProbs = BTreeMap<Triple, Value>;

/// JSON object keys must be strings, so span/triple keyed maps travel as
/// `[[key, value], ...]`.
mod pairs {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<K, V, S>(map: &Option<BTreeMap<K, V>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        match map {
            Some(m) => serializer.collect_seq(m.iter()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<Option<BTreeMap<K, V>>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let pairs: Option<Vec<(K, V)>> = Option::deserialize(deserializer)?;
        Ok(pairs.map(|p| p.into_iter().collect()))
    }
}

/// A slice of a document prepared for the span/relation model, plus whatever
/// the model attached to it afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Window {
    pub doc_id: usize,
    #[serde(default)]
    pub window_id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default)]
    pub text: String,
    /// `[bos] + content + [eos]`
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_topic: Option<String>,
    #[serde(default)]
    pub spans: Vec<Span>,

    #[serde(default)]
    pub token2char_start: BTreeMap<usize, usize>,
    #[serde(default)]
    pub token2char_end: BTreeMap<usize, usize>,
    #[serde(default)]
    pub char2token_start: BTreeMap<usize, usize>,
    #[serde(default)]
    pub char2token_end: BTreeMap<usize, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token2word_start: Option<BTreeMap<usize, usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token2word_end: Option<BTreeMap<usize, usize>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows_candidates: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_candidates: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triplet_candidates: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_labels: Option<Vec<Span>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_spans: Option<Vec<Span>>,
    #[serde(
        default,
        alias = "probs_window_labels_chars",
        with = "pairs",
        skip_serializing_if = "Option::is_none"
    )]
    pub predicted_spans_probs: Option<SpanProbs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_triples: Option<Vec<Triple>>,
    #[serde(default, with = "pairs", skip_serializing_if = "Option::is_none")]
    pub predicted_triples_probs: Option<TripleProbs>,
}

impl Window {
    /// Tokens without the boundary markers.
    pub fn content_tokens(&self) -> &[String] {
        if self.tokens.len() < 2 {
            return &[];
        }
        &self.tokens[1..self.tokens.len() - 1]
    }

    /// Exclusive char end of the last content token, if the window has any.
    pub fn text_end(&self) -> Option<usize> {
        self.token2char_end.values().copied().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn span_travels_as_flat_array() {
        let span = Span::labeled(0, 3, "PER");
        assert_eq!(serde_json::to_value(&span).unwrap(), json!([0, 3, "PER"]));

        let back: Span = serde_json::from_value(json!([5, 8, "LOC", 2])).unwrap();
        assert_eq!(back.labels, vec![Label::from("LOC"), Label::from(2)]);
        assert_eq!(serde_json::to_value(&back).unwrap(), json!([5, 8, "LOC", 2]));

        assert!(serde_json::from_value::<Span>(json!([1])).is_err());
    }

    #[test]
    fn spans_order_like_tuples() {
        let mut spans = vec![Span::labeled(3, 5, "b"), Span::new(3, 5), Span::new(0, 9)];
        spans.sort();
        assert_eq!(spans, vec![Span::new(0, 9), Span::new(3, 5), Span::labeled(3, 5, "b")]);
    }

    #[test]
    fn numeric_labels_order_by_value() {
        let nine: Span = serde_json::from_value(json!([0, 3, 9])).unwrap();
        let ten: Span = serde_json::from_value(json!([0, 3, 10])).unwrap();
        let text: Span = serde_json::from_value(json!([0, 3, "1"])).unwrap();
        let mut spans = vec![text.clone(), ten.clone(), nine.clone()];
        spans.sort();
        assert_eq!(spans, vec![nine, ten, text]);

        let int: Label = serde_json::from_value(json!(2)).unwrap();
        let float: Label = serde_json::from_value(json!(2.0)).unwrap();
        assert_eq!(int, float);
        assert_eq!(serde_json::to_value(&int).unwrap(), json!(2));
    }

    #[test]
    fn odd_labels_survive_a_round_trip() {
        let span: Span = serde_json::from_value(json!([1, 2, true, null, "PER"])).unwrap();
        assert_eq!(span.labels[2], Label::from("PER"));
        assert_eq!(serde_json::to_value(&span).unwrap(), json!([1, 2, true, null, "PER"]));
    }

    #[test]
    fn doc_ids_must_be_integers() {
        let err = serde_json::from_value::<Window>(json!({"doc_id": "a"})).unwrap_err();
        assert!(err.to_string().contains("invalid type"));
    }

    #[test]
    fn containment_is_strict() {
        let span = Span::new(4, 9);
        assert!(span.within(4, 9));
        assert!(span.within(0, 20));
        assert!(!span.within(5, 20));
        assert!(!span.within(0, 8));
        assert!(!Span::new(9, 9).within(0, 9));
    }

    #[test]
    fn scores_order_numbers_before_labels() {
        let mut triples = vec![
            Triple(0, "r".into(), 1, Score::Label("yes".into())),
            Triple(0, "r".into(), 1, Score::Number(0.5)),
            Triple(0, "r".into(), 1, Score::Number(-1.0)),
        ];
        triples.sort();
        assert_eq!(triples[0].3, Score::Number(-1.0));
        assert_eq!(triples[2].3, Score::Label("yes".into()));
    }

    #[test]
    fn window_round_trips_through_json() {
        let mut probs = SpanProbs::new();
        probs.insert(Span::new(0, 3), json!({"PER": 0.9}));
        let window = Window {
            doc_id: 1,
            offset: Some(10),
            tokens: vec!["[CLS]".into(), "a".into(), "[SEP]".into()],
            predicted_spans: Some(vec![Span::new(0, 3)]),
            predicted_spans_probs: Some(probs),
            predicted_triples: Some(vec![Triple(0, "self".into(), 0, Score::Number(1.0))]),
            ..Window::default()
        };
        let encoded = serde_json::to_string(&window).unwrap();
        assert!(encoded.contains("\"predicted_spans_probs\":[[[0,3],{\"PER\":0.9}]]"));
        assert!(!encoded.contains("window_labels"));

        let decoded: Window = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, window);
    }

    #[test]
    fn legacy_probability_field_name_is_accepted() {
        let raw = json!({
            "doc_id": 0,
            "probs_window_labels_chars": [[[1, 2], [["PER", 0.7]]]]
        });
        let window: Window = serde_json::from_value(raw).unwrap();
        let probs = window.predicted_spans_probs.unwrap();
        assert_eq!(probs.get(&Span::new(1, 2)), Some(&json!([["PER", 0.7]])));
    }

    #[test]
    fn content_tokens_strip_markers() {
        let window = Window {
            tokens: vec!["[CLS]".into(), "x".into(), "y".into(), "[SEP]".into()],
            ..Window::default()
        };
        assert_eq!(window.content_tokens(), &["x".to_string(), "y".to_string()]);
        assert!(Window::default().content_tokens().is_empty());
    }
}
