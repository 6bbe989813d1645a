use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// The host has no readable clipboard at all.
    #[error("clipboard not available")]
    Unavailable,
    /// The clipboard holds nothing that reads as text.
    #[error("clipboard holds no text")]
    Empty,
    /// A clipboard exists but reading it was refused or failed.
    #[error("clipboard read denied: {0}")]
    Denied(String),
}

/// Read access to the system clipboard.
pub trait ClipboardSource: Send + Sync {
    fn read_text(&self) -> Pin<Box<dyn Future<Output = Result<String, ClipboardError>> + Send + '_>>;
}
