//! Sentence chunking and per-sentence annotation.
//!
//! Chunks are paired with the service's sentence scores by position only.
//! When the service splits sentences differently, the pairing drifts; extra
//! chunks fall back to [`SentenceClass::Mixed`].

use std::fmt::Write;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::SentenceScore;

/// A run of text ending with terminators followed by whitespace (or the end).
static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s).*?[.!?]+(?:\s+|$)").unwrap());

static WORD_CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w").unwrap());

/// Scores at or above this are attributed to AI.
pub const AI_THRESHOLD: f64 = 60.0;
/// Scores at or below this are attributed to a human writer.
pub const HUMAN_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceClass {
    Ai,
    Human,
    Mixed,
}

impl SentenceClass {
    pub fn from_score(ai_probability_pct: f64) -> Self {
        if ai_probability_pct >= AI_THRESHOLD {
            SentenceClass::Ai
        } else if ai_probability_pct <= HUMAN_THRESHOLD {
            SentenceClass::Human
        } else {
            SentenceClass::Mixed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentenceClass::Ai => "ai",
            SentenceClass::Human => "human",
            SentenceClass::Mixed => "mixed",
        }
    }
}

/// One chunk of the source text. `class` is `None` for chunks without any
/// word character (pure whitespace or punctuation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub text: String,
    pub class: Option<SentenceClass>,
}

/// Split `text` into sentence-like chunks. Concatenating the result yields
/// `text` exactly.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut end = 0;
    for m in SENTENCE_RE.find_iter(text) {
        chunks.push(m.as_str());
        end = m.end();
    }
    if end < text.len() {
        chunks.push(&text[end..]);
    }
    chunks
}

pub fn annotate(text: &str, sentences: &[SentenceScore]) -> Vec<Annotation> {
    let mut scores = sentences.iter();
    split_sentences(text)
        .into_iter()
        .map(|chunk| {
            let class = if WORD_CHAR_RE.is_match(chunk) {
                Some(
                    scores
                        .next()
                        .map(|s| SentenceClass::from_score(s.ai_probability_pct))
                        .unwrap_or(SentenceClass::Mixed),
                )
            } else {
                None
            };
            Annotation {
                text: chunk.to_string(),
                class,
            }
        })
        .collect()
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render annotations as markup. Every chunk is escaped; annotated chunks are
/// wrapped in a span carrying their class.
pub fn render_html(annotations: &[Annotation]) -> String {
    let mut out = String::new();
    for ann in annotations {
        let escaped = escape_html(&ann.text);
        match ann.class {
            Some(class) => {
                let _ = write!(
                    out,
                    "<span class=\"sentence sentence-{}\">{}</span>",
                    class.as_str(),
                    escaped
                );
            }
            None => out.push_str(&escaped),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[f64]) -> Vec<SentenceScore> {
        values
            .iter()
            .map(|&v| SentenceScore {
                ai_probability_pct: v,
            })
            .collect()
    }

    fn joined(annotations: &[Annotation]) -> String {
        annotations.iter().map(|a| a.text.as_str()).collect()
    }

    #[test]
    fn splits_on_terminators_keeping_whitespace() {
        let chunks = split_sentences("First one. Second!  Third?\nTail");
        assert_eq!(chunks, vec!["First one. ", "Second!  ", "Third?\n", "Tail"]);
    }

    #[test]
    fn terminator_runs_stay_together() {
        let chunks = split_sentences("Really?! Yes...");
        assert_eq!(chunks, vec!["Really?! ", "Yes..."]);
    }

    #[test]
    fn decimal_points_do_not_split() {
        let chunks = split_sentences("Pi is 3.14 roughly. Done.");
        assert_eq!(chunks, vec!["Pi is 3.14 roughly. ", "Done."]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_sentences("").is_empty());
        assert!(annotate("", &scores(&[90.0])).is_empty());
    }

    #[test]
    fn reconstruction_is_lossless() {
        let samples = [
            "",
            "   ",
            "No terminator at all",
            "  Leading space. Trailing space.  ",
            "Multi\nline.\n\nParagraph two!\n",
            "Unicode «déjà vu»? Ça va. 日本語。",
            "...",
            "<b>Tags</b> & \"quotes\". 'single'!",
        ];
        for text in samples {
            let ann = annotate(text, &scores(&[70.0, 20.0]));
            assert_eq!(joined(&ann), text, "lossy for {text:?}");
        }
    }

    #[test]
    fn thresholds_are_inclusive() {
        let ann = annotate("A. B. C. D. E.", &scores(&[60.0, 40.0, 59.9, 40.1, 100.0]));
        let classes: Vec<_> = ann.iter().map(|a| a.class).collect();
        assert_eq!(
            classes,
            vec![
                Some(SentenceClass::Ai),
                Some(SentenceClass::Human),
                Some(SentenceClass::Mixed),
                Some(SentenceClass::Mixed),
                Some(SentenceClass::Ai),
            ]
        );
    }

    #[test]
    fn exhausted_scores_fall_back_to_mixed() {
        let ann = annotate("One. Two. Three.", &scores(&[90.0]));
        assert_eq!(ann[0].class, Some(SentenceClass::Ai));
        assert_eq!(ann[1].class, Some(SentenceClass::Mixed));
        assert_eq!(ann[2].class, Some(SentenceClass::Mixed));
    }

    #[test]
    fn wordless_chunks_do_not_consume_scores() {
        let ann = annotate("... Real sentence.", &scores(&[10.0]));
        assert_eq!(ann.len(), 2);
        assert_eq!(ann[0].class, None);
        assert_eq!(ann[1].class, Some(SentenceClass::Human));
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn render_wraps_annotated_chunks_only() {
        let ann = annotate("<script>. ...", &scores(&[75.0]));
        let html = render_html(&ann);
        assert_eq!(
            html,
            "<span class=\"sentence sentence-ai\">&lt;script&gt;. </span>..."
        );
        assert!(!html.contains("<script>"));
    }
}
