use std::sync::Arc;
use std::time::Duration;

pub mod acquisition;
pub mod buffer;
pub mod clipboard;
pub mod config_file;
pub mod drive;
pub mod error;
pub mod highlight;
pub mod model;
pub mod orchestrator;
pub mod service;
pub mod view;

// Re-export for convenience
pub use acquisition::{AcquisitionController, DragEvent};
pub use buffer::{TextBuffer, TextCounts};
pub use clipboard::{ClipboardError, ClipboardSource};
pub use drive::{AuthMessage, AuthWindow, AuthWindowOpener, DriveState, RemoteDocumentSession};
pub use error::{BusyKind, ScanError, ServiceError, ServiceKind};
pub use highlight::{Annotation, SentenceClass, annotate, escape_html, render_html};
pub use model::{ClassificationResult, Label, SentenceScore};
pub use orchestrator::{EXAMPLE_TEXT, MIN_SCAN_CHARS, ScanOrchestrator, Snapshot};
pub use service::{
    ClassificationService, ExtractionService, FilePayload, HttpBackend, RemoteDocument,
    RemoteDocumentService,
};
pub use view::{InputTab, RenderMode, ResultView, UiState};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Service paths, relative to [`Config::base_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Overrides the classification path; when unset it follows the render mode.
    pub predict: Option<String>,
    pub extract: String,
    pub drive_status: String,
    pub drive_auth: String,
    pub drive_download: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            predict: None,
            extract: "/api/extract".to_string(),
            drive_status: "/api/drive/status".to_string(),
            drive_auth: "/api/drive/auth".to_string(),
            drive_download: "/api/drive/download".to_string(),
        }
    }
}

impl Endpoints {
    /// Basic mode posts to `/api/predict`; highlighted mode needs per-sentence
    /// scores and posts to `/api/analyze`.
    pub fn predict_path(&self, mode: RenderMode) -> &str {
        match (&self.predict, mode) {
            (Some(path), _) => path.as_str(),
            (None, RenderMode::Basic) => "/api/predict",
            (None, RenderMode::Highlighted) => "/api/analyze",
        }
    }
}

/// Runtime configuration for the detector.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub endpoints: Endpoints,
    pub render_mode: RenderMode,
    /// Per-request timeout. `None` waits as long as the transport allows.
    pub request_timeout: Option<Duration>,
    /// How often the authorization popup is checked for closure.
    pub poll_interval: Duration,
    /// Message type the authorization page posts on success.
    pub auth_message_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoints: Endpoints::default(),
            render_mode: RenderMode::default(),
            request_timeout: None,
            poll_interval: drive::DEFAULT_POLL_INTERVAL,
            auth_message_type: drive::DEFAULT_AUTH_MESSAGE_TYPE.to_string(),
        }
    }
}

impl Config {
    /// Build a config from file values, falling back to defaults per field.
    pub fn from_file(file: &config_file::ConfigFile) -> Self {
        let mut config = Config::default();
        if let Some(service) = &file.service {
            if let Some(url) = &service.base_url {
                config.base_url = url.clone();
            }
            if let Some(path) = &service.predict_path {
                config.endpoints.predict = Some(path.clone());
            }
            if let Some(path) = &service.extract_path {
                config.endpoints.extract = path.clone();
            }
            if let Some(path) = &service.drive_status_path {
                config.endpoints.drive_status = path.clone();
            }
            if let Some(path) = &service.drive_auth_path {
                config.endpoints.drive_auth = path.clone();
            }
            if let Some(path) = &service.drive_download_path {
                config.endpoints.drive_download = path.clone();
            }
            config.request_timeout = service.request_timeout_secs.map(Duration::from_secs);
        }
        if let Some(mode) = file.display.as_ref().and_then(|d| d.render_mode.as_deref()) {
            match mode.parse() {
                Ok(mode) => config.render_mode = mode,
                Err(e) => tracing::warn!(error = %e, "ignoring display.render_mode"),
            }
        }
        if let Some(drive) = &file.drive {
            if let Some(ms) = drive.poll_interval_ms {
                config.poll_interval = Duration::from_millis(ms.max(1));
            }
            if let Some(kind) = &drive.auth_message_type {
                config.auth_message_type = kind.clone();
            }
        }
        config
    }
}

/// The whole client: one orchestrator shared by the acquisition channels and
/// the Drive session.
pub struct Detector {
    pub scan: Arc<ScanOrchestrator>,
    pub acquisition: AcquisitionController,
    pub drive: RemoteDocumentSession,
}

impl Detector {
    /// Wire the components around a single backend serving all three contracts.
    pub fn new<S>(
        config: &Config,
        services: Arc<S>,
        clipboard: Option<Arc<dyn ClipboardSource>>,
        opener: Arc<dyn AuthWindowOpener>,
    ) -> Self
    where
        S: ClassificationService + ExtractionService + RemoteDocumentService + 'static,
    {
        let scan = Arc::new(ScanOrchestrator::new(services.clone(), config.render_mode));
        let acquisition = AcquisitionController::new(scan.clone(), services.clone(), clipboard);
        let drive = RemoteDocumentSession::new(scan.clone(), services, opener)
            .with_poll_interval(config.poll_interval)
            .with_success_type(config.auth_message_type.clone());
        Self {
            scan,
            acquisition,
            drive,
        }
    }
}
