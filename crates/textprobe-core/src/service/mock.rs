//! Mock services, clipboard and popup opener for unit tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::{
    ClassificationService, ExtractionService, FilePayload, RemoteDocument, RemoteDocumentService,
    ServiceFuture,
};
use crate::clipboard::{ClipboardError, ClipboardSource};
use crate::drive::{AuthMessage, AuthWindow, AuthWindowOpener};
use crate::error::ServiceError;
use crate::model::ClassificationResult;

fn not_configured(what: &str) -> ServiceError {
    ServiceError::Unavailable(format!("mock {what} not configured"))
}

/// A hand-rolled mock implementing all three service contracts.
///
/// Each contract returns a fixed, cloneable result and counts its calls.
pub struct MockBackend {
    classification: Result<ClassificationResult, ServiceError>,
    extraction: Result<String, ServiceError>,
    status: Result<bool, ServiceError>,
    auth_url: Result<String, ServiceError>,
    download: Result<RemoteDocument, ServiceError>,
    classify_calls: AtomicUsize,
    extract_calls: AtomicUsize,
    download_calls: AtomicUsize,
    last_classified: Mutex<Option<String>>,
    last_extracted: Mutex<Option<String>>,
    last_download: Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            classification: Err(not_configured("classification")),
            extraction: Err(not_configured("extraction")),
            status: Ok(false),
            auth_url: Ok("https://auth.example/consent".into()),
            download: Err(not_configured("download")),
            classify_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
            last_classified: Mutex::new(None),
            last_extracted: Mutex::new(None),
            last_download: Mutex::new(None),
        }
    }

    pub fn with_classification(mut self, result: Result<ClassificationResult, ServiceError>) -> Self {
        self.classification = result;
        self
    }

    pub fn with_extraction(mut self, result: Result<String, ServiceError>) -> Self {
        self.extraction = result;
        self
    }

    pub fn with_status(mut self, result: Result<bool, ServiceError>) -> Self {
        self.status = result;
        self
    }

    pub fn with_auth_url(mut self, result: Result<String, ServiceError>) -> Self {
        self.auth_url = result;
        self
    }

    pub fn with_download(mut self, result: Result<RemoteDocument, ServiceError>) -> Self {
        self.download = result;
        self
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn last_classified(&self) -> Option<String> {
        self.last_classified.lock().unwrap().clone()
    }

    pub fn last_extracted_filename(&self) -> Option<String> {
        self.last_extracted.lock().unwrap().clone()
    }

    pub fn last_download_id(&self) -> Option<String> {
        self.last_download.lock().unwrap().clone()
    }
}

impl ClassificationService for MockBackend {
    fn classify<'a>(&'a self, text: &'a str) -> ServiceFuture<'a, ClassificationResult> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_classified.lock().unwrap() = Some(text.to_string());
        let result = self.classification.clone();
        Box::pin(async move { result })
    }
}

impl ExtractionService for MockBackend {
    fn extract<'a>(&'a self, file: &'a FilePayload) -> ServiceFuture<'a, String> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_extracted.lock().unwrap() = Some(file.filename.clone());
        let result = self.extraction.clone();
        Box::pin(async move { result })
    }
}

impl RemoteDocumentService for MockBackend {
    fn status(&self) -> ServiceFuture<'_, bool> {
        let result = self.status.clone();
        Box::pin(async move { result })
    }

    fn auth_url(&self) -> ServiceFuture<'_, String> {
        let result = self.auth_url.clone();
        Box::pin(async move { result })
    }

    fn download<'a>(&'a self, file_id: &'a str) -> ServiceFuture<'a, RemoteDocument> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_download.lock().unwrap() = Some(file_id.to_string());
        let result = self.download.clone();
        Box::pin(async move { result })
    }
}

pub struct MockClipboard {
    result: Result<String, ClipboardError>,
}

impl MockClipboard {
    pub fn new(result: Result<String, ClipboardError>) -> Self {
        Self { result }
    }
}

impl ClipboardSource for MockClipboard {
    fn read_text(&self) -> Pin<Box<dyn Future<Output = Result<String, ClipboardError>> + Send + '_>> {
        let result = self.result.clone();
        Box::pin(async move { result })
    }
}

/// State shared between a [`MockOpener`] and the windows it hands out.
#[derive(Default)]
struct PopupProbe {
    closed: AtomicBool,
    opened: AtomicUsize,
    subscriptions: AtomicUsize,
    unsubscriptions: AtomicUsize,
    last_url: Mutex<Option<String>>,
    sender: Mutex<Option<mpsc::UnboundedSender<AuthMessage>>>,
}

/// Opens fake popups. Scripted messages are delivered as soon as the
/// session subscribes.
pub struct MockOpener {
    blocked: bool,
    script: Vec<AuthMessage>,
    probe: Arc<PopupProbe>,
}

impl MockOpener {
    fn build(blocked: bool, closed: bool, script: Vec<AuthMessage>) -> Self {
        let probe = PopupProbe::default();
        probe.closed.store(closed, Ordering::SeqCst);
        Self {
            blocked,
            script,
            probe: Arc::new(probe),
        }
    }

    /// A popup that stays open and posts `script` on subscribe.
    pub fn scripted(script: Vec<AuthMessage>) -> Self {
        Self::build(false, false, script)
    }

    /// A popup the user closes without finishing.
    pub fn closed() -> Self {
        Self::build(false, true, Vec::new())
    }

    /// The host refuses to open a popup.
    pub fn blocked() -> Self {
        Self::build(true, false, Vec::new())
    }

    /// Post a message from the popup to the current subscriber, if any.
    pub fn post(&self, message: AuthMessage) {
        if let Some(tx) = self.probe.sender.lock().unwrap().as_ref() {
            let _ = tx.send(message);
        }
    }

    pub fn opened(&self) -> usize {
        self.probe.opened.load(Ordering::SeqCst)
    }

    pub fn subscriptions(&self) -> usize {
        self.probe.subscriptions.load(Ordering::SeqCst)
    }

    pub fn unsubscriptions(&self) -> usize {
        self.probe.unsubscriptions.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<String> {
        self.probe.last_url.lock().unwrap().clone()
    }
}

impl AuthWindowOpener for MockOpener {
    fn open(&self, auth_url: &str) -> Option<Box<dyn AuthWindow>> {
        *self.probe.last_url.lock().unwrap() = Some(auth_url.to_string());
        if self.blocked {
            return None;
        }
        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(MockWindow {
            script: self.script.clone(),
            probe: self.probe.clone(),
        }))
    }
}

struct MockWindow {
    script: Vec<AuthMessage>,
    probe: Arc<PopupProbe>,
}

impl AuthWindow for MockWindow {
    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AuthMessage> {
        self.probe.subscriptions.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        for message in self.script.drain(..) {
            let _ = tx.send(message);
        }
        *self.probe.sender.lock().unwrap() = Some(tx);
        rx
    }

    fn unsubscribe(&mut self) {
        self.probe.unsubscriptions.fetch_add(1, Ordering::SeqCst);
        self.probe.sender.lock().unwrap().take();
    }

    fn is_closed(&self) -> bool {
        self.probe.closed.load(Ordering::SeqCst)
    }
}
