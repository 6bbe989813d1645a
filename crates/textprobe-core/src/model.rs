//! Classification results and the wire shapes they are decoded from.

use std::fmt;

use serde::Deserialize;

/// Verdict returned by the classification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Ai,
    Human,
    Uncertain,
    Unknown,
}

impl Label {
    /// Case-insensitive parse; anything unrecognized (or missing) is `Unknown`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("ai") => Label::Ai,
            Some("human") => Label::Human,
            Some("uncertain") => Label::Uncertain,
            _ => Label::Unknown,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Label::Ai => "AI",
            Label::Human => "Human",
            Label::Uncertain => "Uncertain",
            Label::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Per-sentence AI probability, in document order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentenceScore {
    pub ai_probability_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub label: Label,
    pub confidence_pct: f64,
    pub human_pct: f64,
    pub ai_pct: f64,
    pub word_count: u64,
    pub needs_review: bool,
    pub warning: Option<String>,
    pub sentences: Vec<SentenceScore>,
}

/// Flat prediction fields, shared by the basic body and the `overall` object
/// of the richer body.
#[derive(Debug, Default, Deserialize)]
struct PredictionFields {
    prediction: Option<String>,
    label: Option<String>,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    human_probability: f64,
    #[serde(default)]
    ai_probability: f64,
    #[serde(default)]
    word_count: u64,
    #[serde(default)]
    needs_review: bool,
    warning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentenceWire {
    #[serde(default)]
    ai_probability: f64,
}

/// Success body of the classification endpoint, either variant.
#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    overall: Option<PredictionFields>,
    #[serde(flatten)]
    flat: PredictionFields,
    #[serde(default)]
    sentences: Vec<SentenceWire>,
}

fn pct(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

impl From<PredictResponse> for ClassificationResult {
    fn from(resp: PredictResponse) -> Self {
        let fields = resp.overall.unwrap_or(resp.flat);
        let raw_label = fields.prediction.as_deref().or(fields.label.as_deref());
        ClassificationResult {
            label: Label::parse(raw_label),
            confidence_pct: pct(fields.confidence),
            human_pct: pct(fields.human_probability),
            ai_pct: pct(fields.ai_probability),
            word_count: fields.word_count,
            needs_review: fields.needs_review,
            warning: fields.warning.filter(|w| !w.trim().is_empty()),
            sentences: resp
                .sentences
                .into_iter()
                .map(|s| SentenceScore {
                    ai_probability_pct: pct(s.ai_probability),
                })
                .collect(),
        }
    }
}
