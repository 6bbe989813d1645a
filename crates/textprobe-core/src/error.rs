use std::fmt;

use thiserror::Error;

use crate::orchestrator::MIN_SCAN_CHARS;

/// Which network-bound operation is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyKind {
    Extracting,
    Downloading,
    Scanning,
    Clipboard,
    Authenticating,
}

impl fmt::Display for BusyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BusyKind::Extracting => "extracting text from a file",
            BusyKind::Downloading => "downloading a document",
            BusyKind::Scanning => "scanning",
            BusyKind::Clipboard => "reading the clipboard",
            BusyKind::Authenticating => "waiting for Drive authorization",
        };
        f.write_str(s)
    }
}

/// The external collaborator a request was sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Classification,
    Extraction,
    RemoteDocument,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceKind::Classification => "classification service",
            ServiceKind::Extraction => "extraction service",
            ServiceKind::RemoteDocument => "Drive service",
        };
        f.write_str(s)
    }
}

/// Failure reported by a service implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request never produced a response (connection refused, DNS, timeout).
    #[error("{0}")]
    Unavailable(String),
    /// The service answered with a non-success status or an unusable body.
    #[error("{message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },
}

/// Every failure an operation can surface. None of them is fatal: each one is
/// projected into `UiState::Error` and the user re-triggers the operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Please enter at least {min} characters to run a scan.")]
    InputTooShort { min: usize, actual: usize },

    #[error("Please wait: already {0}.")]
    OperationInProgress(BusyKind),

    #[error("Clipboard access isn't available in this environment.")]
    ClipboardUnavailable,

    #[error("Clipboard access was denied.")]
    ClipboardDenied,

    #[error("The clipboard has no text to paste.")]
    ClipboardEmpty,

    #[error("No file selected.")]
    NoFileSelected,

    #[error("Enter a Drive document ID to import.")]
    EmptyIdentifier,

    #[error("Connect Google Drive before importing a document.")]
    DriveNotConnected,

    #[error("{}", unavailable_message(.service, .reason))]
    ServiceUnavailable { service: ServiceKind, reason: String },

    #[error("{message}")]
    ServiceRejected { service: ServiceKind, message: String },
}

fn unavailable_message(service: &ServiceKind, reason: &str) -> String {
    match service {
        ServiceKind::Classification => format!(
            "Backend unavailable. The classification service is not reachable; start it and scan again. ({reason})"
        ),
        other => format!("The {other} is not reachable. ({reason})"),
    }
}

impl ScanError {
    pub fn input_too_short(actual: usize) -> Self {
        ScanError::InputTooShort {
            min: MIN_SCAN_CHARS,
            actual,
        }
    }

    /// Attach the originating service to a [`ServiceError`].
    pub fn from_service(service: ServiceKind, err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(reason) => ScanError::ServiceUnavailable { service, reason },
            ServiceError::Rejected { message, .. } => {
                ScanError::ServiceRejected { service, message }
            }
        }
    }

    /// Short heading shown above the message.
    pub fn title(&self) -> &'static str {
        match self {
            ScanError::InputTooShort { .. } => "Needs more text",
            ScanError::OperationInProgress(_) => "Busy",
            ScanError::ClipboardUnavailable | ScanError::ClipboardDenied => "Clipboard blocked",
            ScanError::ClipboardEmpty => "Clipboard empty",
            ScanError::NoFileSelected => "File error",
            ScanError::EmptyIdentifier | ScanError::DriveNotConnected => "Drive error",
            ScanError::ServiceUnavailable {
                service: ServiceKind::Classification,
                ..
            } => "Offline",
            ScanError::ServiceUnavailable { service, .. }
            | ScanError::ServiceRejected { service, .. } => match service {
                ServiceKind::Classification => "Scan failed",
                ServiceKind::Extraction => "File error",
                ServiceKind::RemoteDocument => "Drive error",
            },
        }
    }
}
