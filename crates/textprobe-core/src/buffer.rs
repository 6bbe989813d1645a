/// Word and character counts shown under the input box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextCounts {
    pub words: usize,
    pub chars: usize,
}

/// The text under analysis.
///
/// Only [`ScanOrchestrator`](crate::orchestrator::ScanOrchestrator) owns one;
/// acquisitions hand it complete strings, so it is never partially written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    content: String,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, text: impl Into<String>) {
        self.content = text.into();
    }

    pub fn read(&self) -> &str {
        &self.content
    }

    pub fn counts(&self) -> TextCounts {
        let words = if self.content.trim().is_empty() {
            0
        } else {
            self.content.split_whitespace().count()
        };
        TextCounts {
            words,
            chars: self.content.chars().count(),
        }
    }
}
