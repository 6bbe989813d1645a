//! UI state and its projection onto display text.

use std::fmt;
use std::str::FromStr;

use crate::error::ScanError;
use crate::model::ClassificationResult;

/// Exactly one of these is active at a time; it drives everything rendered
/// in the result panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UiState {
    #[default]
    Idle,
    Extracting,
    Scanning,
    Downloading,
    Connected,
    Error(ScanError),
    Result(ClassificationResult),
}

impl UiState {
    pub fn is_error(&self) -> bool {
        matches!(self, UiState::Error(_))
    }

    pub fn error(&self) -> Option<&ScanError> {
        match self {
            UiState::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// Input tab shown next to the text box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputTab {
    #[default]
    Paste,
    Upload,
    Drive,
}

/// Whether results include the per-sentence highlighting pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    #[default]
    Basic,
    Highlighted,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(RenderMode::Basic),
            "highlighted" | "highlight" => Ok(RenderMode::Highlighted),
            other => Err(format!(
                "unknown render mode '{other}' (expected 'basic' or 'highlighted')"
            )),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Basic => f.write_str("basic"),
            RenderMode::Highlighted => f.write_str("highlighted"),
        }
    }
}

const PLACEHOLDER_PCT: &str = "--%";
const PLACEHOLDER: &str = "--";

/// Everything the result panel displays, as text.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub label: String,
    pub confidence: String,
    pub human: String,
    pub ai: String,
    pub note: String,
    pub words: String,
    pub review: String,
    /// Bar widths in percent; `None` renders an empty bar.
    pub human_width: Option<f64>,
    pub ai_width: Option<f64>,
}

impl ResultView {
    fn placeholder(label: &str, note: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            confidence: PLACEHOLDER_PCT.to_string(),
            human: PLACEHOLDER_PCT.to_string(),
            ai: PLACEHOLDER_PCT.to_string(),
            note: note.into(),
            words: PLACEHOLDER.to_string(),
            review: PLACEHOLDER.to_string(),
            human_width: None,
            ai_width: None,
        }
    }

    /// Project a state (plus any advisory notice) onto display text.
    pub fn project(state: &UiState, notice: Option<&str>) -> Self {
        match state {
            UiState::Idle => Self::placeholder(
                "Awaiting input",
                notice.unwrap_or("Paste or upload text to start."),
            ),
            UiState::Extracting => Self::placeholder("Extracting", "Reading file..."),
            UiState::Downloading => {
                Self::placeholder("Downloading", "Fetching document from Drive...")
            }
            UiState::Scanning => Self::placeholder("Scanning", "Running analysis..."),
            UiState::Connected => Self::placeholder(
                "Google Drive",
                "Drive connected. Enter a document ID to import.",
            ),
            UiState::Error(err) => Self::placeholder(err.title(), err.to_string()),
            UiState::Result(result) => Self::from_result(result),
        }
    }

    fn from_result(result: &ClassificationResult) -> Self {
        let note = match &result.warning {
            Some(w) => w.clone(),
            None if result.needs_review => "Moderate confidence. Consider manual review.".into(),
            None => "Result looks confident. No additional review needed.".into(),
        };
        Self {
            label: result.label.to_string(),
            confidence: format_pct(result.confidence_pct),
            human: format_pct(result.human_pct),
            ai: format_pct(result.ai_pct),
            note,
            words: result.word_count.to_string(),
            review: if result.needs_review { "Review" } else { "Clear" }.to_string(),
            human_width: Some(result.human_pct),
            ai_width: Some(result.ai_pct),
        }
    }
}

pub fn format_pct(value: f64) -> String {
    format!("{:.1}%", value)
}
