//! Top-level state machine: owns the text buffer, the UI state and the busy
//! flag that keeps network-bound operations from overlapping.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::buffer::{TextBuffer, TextCounts};
use crate::error::{BusyKind, ScanError, ServiceKind};
use crate::highlight::{Annotation, annotate};
use crate::model::ClassificationResult;
use crate::service::ClassificationService;
use crate::view::{InputTab, RenderMode, ResultView, UiState};

/// Trimmed input shorter than this is never sent to the classifier.
pub const MIN_SCAN_CHARS: usize = 10;

pub const EXAMPLE_TEXT: &str = "Artificial intelligence systems have become more capable in recent years, \
but the most effective assessments still blend automation with human review. \
This example text includes varied sentence length, natural phrasing, and \
consistent narrative flow to simulate a human-written paragraph.";

#[derive(Debug, Default)]
struct ScanState {
    buffer: TextBuffer,
    ui: UiState,
    busy: Option<BusyKind>,
    tab: InputTab,
    highlight: Vec<Annotation>,
    notice: Option<String>,
    drop_zone_hidden: bool,
    drag_active: bool,
}

/// Point-in-time copy of everything a front end renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub text: String,
    pub counts: TextCounts,
    pub ui: UiState,
    pub busy: Option<BusyKind>,
    pub tab: InputTab,
    pub highlight: Vec<Annotation>,
    pub notice: Option<String>,
    pub drop_zone_visible: bool,
    pub drag_active: bool,
}

pub struct ScanOrchestrator {
    state: Mutex<ScanState>,
    classifier: Arc<dyn ClassificationService>,
    render_mode: RenderMode,
}

/// Holds the busy flag for one operation and releases it on drop, whatever
/// the outcome (including the operation's future being dropped).
pub(crate) struct BusyGuard<'a> {
    scan: &'a ScanOrchestrator,
    kind: BusyKind,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.scan.lock();
        if state.busy == Some(self.kind) {
            state.busy = None;
        }
        // Abandoned mid-flight: the operation never reached a final state.
        if busy_ui(self.kind).is_some_and(|ui| state.ui == ui) {
            state.ui = UiState::Idle;
        }
        tracing::debug!(kind = ?self.kind, "busy released");
    }
}

fn busy_ui(kind: BusyKind) -> Option<UiState> {
    match kind {
        BusyKind::Extracting => Some(UiState::Extracting),
        BusyKind::Downloading => Some(UiState::Downloading),
        BusyKind::Scanning => Some(UiState::Scanning),
        BusyKind::Clipboard | BusyKind::Authenticating => None,
    }
}

impl ScanOrchestrator {
    pub fn new(classifier: Arc<dyn ClassificationService>, render_mode: RenderMode) -> Self {
        Self {
            state: Mutex::new(ScanState::default()),
            classifier,
            render_mode,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn busy(&self) -> Option<BusyKind> {
        self.lock().busy
    }

    pub fn text(&self) -> String {
        self.lock().buffer.read().to_string()
    }

    pub fn counts(&self) -> TextCounts {
        self.lock().buffer.counts()
    }

    pub fn ui_state(&self) -> UiState {
        self.lock().ui.clone()
    }

    pub fn view(&self) -> ResultView {
        let state = self.lock();
        ResultView::project(&state.ui, state.notice.as_deref())
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            text: state.buffer.read().to_string(),
            counts: state.buffer.counts(),
            ui: state.ui.clone(),
            busy: state.busy,
            tab: state.tab,
            highlight: state.highlight.clone(),
            notice: state.notice.clone(),
            drop_zone_visible: !state.drop_zone_hidden,
            drag_active: state.drag_active,
        }
    }

    /// Fail fast when another operation is in flight.
    pub(crate) fn ensure_idle(&self) -> Result<(), ScanError> {
        match self.lock().busy {
            Some(kind) => Err(ScanError::OperationInProgress(kind)),
            None => Ok(()),
        }
    }

    /// Take the busy flag. Set synchronously, before the caller's first await.
    pub(crate) fn begin(&self, kind: BusyKind) -> Result<BusyGuard<'_>, ScanError> {
        let mut state = self.lock();
        if let Some(current) = state.busy {
            return Err(ScanError::OperationInProgress(current));
        }
        state.busy = Some(kind);
        if let Some(ui) = busy_ui(kind) {
            state.ui = ui;
        }
        tracing::debug!(?kind, "busy acquired");
        Ok(BusyGuard { scan: self, kind })
    }

    /// Replace the buffer with a completed acquisition.
    pub(crate) fn commit_text(&self, text: String, tab: InputTab, notice: Option<String>) {
        let mut state = self.lock();
        state.buffer.replace(text);
        state.ui = UiState::Idle;
        state.tab = tab;
        state.highlight.clear();
        state.notice = notice;
    }

    /// Show a failure. `OperationInProgress` is reported to the caller only.
    pub(crate) fn fail(&self, err: ScanError) {
        if matches!(err, ScanError::OperationInProgress(_)) {
            return;
        }
        tracing::debug!(error = %err, "entering error state");
        let mut state = self.lock();
        state.ui = UiState::Error(err);
        state.highlight.clear();
    }

    pub(crate) fn set_tab(&self, tab: InputTab) {
        self.lock().tab = tab;
    }

    pub(crate) fn set_drag_active(&self, active: bool) {
        self.lock().drag_active = active;
    }

    pub(crate) fn show_connected(&self) {
        let mut state = self.lock();
        if state.busy.is_none() {
            state.ui = UiState::Connected;
            state.tab = InputTab::Drive;
        }
    }

    /// A direct user edit of the text box.
    pub fn edit(&self, text: impl Into<String>) {
        self.lock().buffer.replace(text);
    }

    /// Validate the buffer and send it to the classifier.
    pub async fn submit(&self) -> Result<ClassificationResult, ScanError> {
        self.ensure_idle()?;

        let text = self.lock().buffer.read().trim().to_string();
        let len = text.chars().count();
        if len < MIN_SCAN_CHARS {
            let err = ScanError::input_too_short(len);
            self.fail(err.clone());
            return Err(err);
        }

        let _busy = self.begin(BusyKind::Scanning)?;
        self.lock().highlight.clear();
        tracing::debug!(chars = len, mode = %self.render_mode, "submitting scan");

        match self.classifier.classify(&text).await {
            Ok(result) => {
                let highlight = match self.render_mode {
                    RenderMode::Highlighted => annotate(&text, &result.sentences),
                    RenderMode::Basic => Vec::new(),
                };
                tracing::info!(
                    label = %result.label,
                    confidence = result.confidence_pct,
                    sentences = result.sentences.len(),
                    "scan complete"
                );
                let mut state = self.lock();
                state.ui = UiState::Result(result.clone());
                state.highlight = highlight;
                state.drop_zone_hidden = true;
                state.notice = None;
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(error = %e, "classification failed");
                let err = ScanError::from_service(ServiceKind::Classification, e);
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Back to an empty buffer and the idle prompt, from any state.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.buffer.replace(String::new());
        state.ui = UiState::Idle;
        state.highlight.clear();
        state.notice = None;
        state.drop_zone_hidden = false;
        state.drag_active = false;
    }

    /// Load a fixed illustrative paragraph into the buffer.
    pub fn load_example(&self) -> Result<(), ScanError> {
        self.ensure_idle()?;
        self.commit_text(EXAMPLE_TEXT.to_string(), InputTab::Paste, None);
        Ok(())
    }
}
