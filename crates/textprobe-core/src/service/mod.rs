//! Contracts for the remote collaborators and their HTTP implementation.

pub mod http;
#[cfg(test)]
pub(crate) mod mock;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::error::ServiceError;
use crate::model::ClassificationResult;

pub use http::HttpBackend;

/// Boxed future returned by every service call.
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ServiceError>> + Send + 'a>>;

/// A file picked or dropped by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl FilePayload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { filename, bytes })
    }
}

/// A document fetched from the remote document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub text: String,
    pub filename: String,
}

/// Scores a block of text.
pub trait ClassificationService: Send + Sync {
    fn classify<'a>(&'a self, text: &'a str) -> ServiceFuture<'a, ClassificationResult>;
}

/// Turns an uploaded file into plain text.
pub trait ExtractionService: Send + Sync {
    fn extract<'a>(&'a self, file: &'a FilePayload) -> ServiceFuture<'a, String>;
}

/// Google Drive style document store behind an OAuth handshake.
pub trait RemoteDocumentService: Send + Sync {
    /// Whether the backend already holds credentials for this session.
    fn status(&self) -> ServiceFuture<'_, bool>;

    /// URL of the interactive authorization page.
    fn auth_url(&self) -> ServiceFuture<'_, String>;

    fn download<'a>(&'a self, file_id: &'a str) -> ServiceFuture<'a, RemoteDocument>;
}
