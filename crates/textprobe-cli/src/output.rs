use std::io::Write;

use owo_colors::OwoColorize;
use textprobe_core::{Annotation, Label, ResultView, SentenceClass, UiState};

const BAR_WIDTH: usize = 24;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn bar(width: Option<f64>) -> String {
    let filled = width
        .map(|w| ((w / 100.0) * BAR_WIDTH as f64).round() as usize)
        .unwrap_or(0)
        .min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn write_label(
    w: &mut dyn Write,
    state: &UiState,
    label: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    if !color.enabled() {
        return writeln!(w, "{}", label);
    }
    match state {
        UiState::Result(result) => match result.label {
            Label::Ai => writeln!(w, "{}", label.bold().red()),
            Label::Human => writeln!(w, "{}", label.bold().green()),
            Label::Uncertain => writeln!(w, "{}", label.bold().yellow()),
            Label::Unknown => writeln!(w, "{}", label.bold()),
        },
        UiState::Error(_) => writeln!(w, "{}", label.bold().red()),
        _ => writeln!(w, "{}", label.dimmed()),
    }
}

/// Print the result panel.
pub fn print_view(
    w: &mut dyn Write,
    state: &UiState,
    view: &ResultView,
    color: ColorMode,
) -> std::io::Result<()> {
    write_label(w, state, &view.label, color)?;

    if !state.is_error() {
        writeln!(w, "  Confidence: {}", view.confidence)?;
        writeln!(w, "  Human:      {:>6} {}", view.human, bar(view.human_width))?;
        writeln!(w, "  AI:         {:>6} {}", view.ai, bar(view.ai_width))?;
        writeln!(w, "  Words:      {}", view.words)?;
        writeln!(w, "  Review:     {}", view.review)?;
    }

    if color.enabled() && state.is_error() {
        writeln!(w, "{}", view.note.red())?;
    } else if color.enabled() {
        writeln!(w, "{}", view.note.dimmed())?;
    } else {
        writeln!(w, "{}", view.note)?;
    }
    Ok(())
}

/// Print the analyzed text with each sentence colored by its class. Without
/// color, classes are shown as bracketed tags after each sentence.
pub fn print_highlight(
    w: &mut dyn Write,
    annotations: &[Annotation],
    color: ColorMode,
) -> std::io::Result<()> {
    if annotations.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    if color.enabled() {
        writeln!(
            w,
            "{} {} {}",
            "AI-like".red(),
            "human-like".green(),
            "mixed".yellow()
        )?;
    }
    for a in annotations {
        match (a.class, color.enabled()) {
            (None, _) => write!(w, "{}", a.text)?,
            (Some(SentenceClass::Ai), true) => write!(w, "{}", a.text.red())?,
            (Some(SentenceClass::Human), true) => write!(w, "{}", a.text.green())?,
            (Some(SentenceClass::Mixed), true) => write!(w, "{}", a.text.yellow())?,
            (Some(class), false) => {
                let body = a.text.trim_end();
                let tail = &a.text[body.len()..];
                write!(w, "{} [{}]{}", body, class.as_str(), tail)?;
            }
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Print an advisory line (import notices, connection status).
pub fn print_notice(w: &mut dyn Write, message: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", message.cyan())
    } else {
        writeln!(w, "{}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use textprobe_core::ScanError;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn bar_scales_and_clamps() {
        assert_eq!(bar(None), format!("[{}]", ".".repeat(BAR_WIDTH)));
        assert_eq!(bar(Some(50.0)).matches('#').count(), BAR_WIDTH / 2);
        assert_eq!(bar(Some(250.0)).matches('#').count(), BAR_WIDTH);
    }

    #[test]
    fn error_view_skips_metrics() {
        let state = UiState::Error(ScanError::NoFileSelected);
        let view = ResultView::project(&state, None);
        let out = render(|w| print_view(w, &state, &view, ColorMode(false)));
        assert_eq!(out, "File error\nNo file selected.\n");
    }

    #[test]
    fn plain_highlight_tags_sentences() {
        let annotations = vec![
            Annotation {
                text: "Machine words. ".into(),
                class: Some(SentenceClass::Ai),
            },
            Annotation {
                text: "...".into(),
                class: None,
            },
        ];
        let out = render(|w| print_highlight(w, &annotations, ColorMode(false)));
        assert_eq!(out, "\nMachine words. [ai] ...\n");
    }
}
