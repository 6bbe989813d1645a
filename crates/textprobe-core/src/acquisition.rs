//! Clipboard, file-upload and drag-and-drop input channels.

use std::sync::Arc;

use crate::clipboard::{ClipboardError, ClipboardSource};
use crate::error::{BusyKind, ScanError, ServiceKind};
use crate::orchestrator::ScanOrchestrator;
use crate::service::{ExtractionService, FilePayload};
use crate::view::InputTab;

/// A dragover or drop event on the drop zone.
#[derive(Debug, Default)]
pub struct DragEvent {
    pub files: Vec<FilePayload>,
    default_prevented: bool,
}

impl DragEvent {
    pub fn new(files: Vec<FilePayload>) -> Self {
        Self {
            files,
            default_prevented: false,
        }
    }

    /// Suppress the host's native handling (navigating to the dropped file).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

pub struct AcquisitionController {
    scan: Arc<ScanOrchestrator>,
    extractor: Arc<dyn ExtractionService>,
    clipboard: Option<Arc<dyn ClipboardSource>>,
}

impl AcquisitionController {
    /// `clipboard` is `None` when the host has no clipboard capability.
    pub fn new(
        scan: Arc<ScanOrchestrator>,
        extractor: Arc<dyn ExtractionService>,
        clipboard: Option<Arc<dyn ClipboardSource>>,
    ) -> Self {
        Self {
            scan,
            extractor,
            clipboard,
        }
    }

    fn reject(&self, err: ScanError) -> Result<(), ScanError> {
        self.scan.fail(err.clone());
        Err(err)
    }

    pub async fn acquire_from_clipboard(&self) -> Result<(), ScanError> {
        self.scan.ensure_idle()?;
        let Some(clipboard) = self.clipboard.as_ref() else {
            return self.reject(ScanError::ClipboardUnavailable);
        };

        let _busy = self.scan.begin(BusyKind::Clipboard)?;
        match clipboard.read_text().await {
            Ok(text) => {
                tracing::debug!(chars = text.len(), "pasted from clipboard");
                self.scan.commit_text(text, InputTab::Paste, None);
                Ok(())
            }
            Err(ClipboardError::Unavailable) => self.reject(ScanError::ClipboardUnavailable),
            Err(ClipboardError::Empty) => self.reject(ScanError::ClipboardEmpty),
            Err(ClipboardError::Denied(reason)) => {
                tracing::warn!(%reason, "clipboard read denied");
                self.reject(ScanError::ClipboardDenied)
            }
        }
    }

    /// Upload `file` to the extraction service and load the returned text.
    pub async fn acquire_from_file(&self, file: Option<FilePayload>) -> Result<(), ScanError> {
        self.scan.ensure_idle()?;
        self.scan.set_tab(InputTab::Upload);
        let Some(file) = file else {
            return self.reject(ScanError::NoFileSelected);
        };

        let _busy = self.scan.begin(BusyKind::Extracting)?;
        match self.extractor.extract(&file).await {
            Ok(text) => {
                tracing::info!(filename = %file.filename, chars = text.len(), "extracted file text");
                self.scan.commit_text(text, InputTab::Upload, None);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(filename = %file.filename, error = %e, "extraction failed");
                self.reject(ScanError::from_service(ServiceKind::Extraction, e))
            }
        }
    }

    pub fn drag_over(&self, event: &mut DragEvent) {
        event.prevent_default();
        self.scan.set_drag_active(true);
    }

    pub fn drag_leave(&self) {
        self.scan.set_drag_active(false);
    }

    /// Handle a drop. Only the first file is used; an empty payload is
    /// `NoFileSelected`.
    pub async fn drop_files(&self, event: &mut DragEvent) -> Result<(), ScanError> {
        event.prevent_default();
        self.scan.set_drag_active(false);
        let file = if event.files.is_empty() {
            None
        } else {
            Some(event.files.remove(0))
        };
        self.acquire_from_file(file).await
    }
}
