//! Terminal stand-ins for the browser capabilities the core expects.

use std::future::Future;
use std::io::{IsTerminal, Write};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use textprobe_core::{
    AuthMessage, AuthWindow, AuthWindowOpener, ClipboardError, ClipboardSource,
    RemoteDocumentService,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// System clipboard through arboard.
pub struct SystemClipboard;

impl ClipboardSource for SystemClipboard {
    fn read_text(&self) -> Pin<Box<dyn Future<Output = Result<String, ClipboardError>> + Send + '_>> {
        Box::pin(async move {
            let mut clipboard = arboard::Clipboard::new().map_err(|e| {
                tracing::debug!(error = %e, "no system clipboard");
                ClipboardError::Unavailable
            })?;
            clipboard.get_text().map_err(clipboard_error)
        })
    }
}

/// Separate "nothing to paste" from a refused read.
fn clipboard_error(e: arboard::Error) -> ClipboardError {
    match e {
        arboard::Error::ContentNotAvailable => ClipboardError::Empty,
        arboard::Error::ClipboardNotSupported => ClipboardError::Unavailable,
        other => ClipboardError::Denied(other.to_string()),
    }
}

/// Opens the authorization "popup" as a URL printed to stderr.
///
/// The terminal has no window to post a message back, so the popup emits the
/// success message itself once the status endpoint reports the session as
/// authenticated. When stdin is a terminal, pressing Enter closes it.
pub struct TerminalOpener {
    service: Arc<dyn RemoteDocumentService>,
    poll_interval: Duration,
    success_type: String,
    cancel_on_enter: bool,
}

impl TerminalOpener {
    pub fn new(
        service: Arc<dyn RemoteDocumentService>,
        poll_interval: Duration,
        success_type: impl Into<String>,
    ) -> Self {
        Self {
            service,
            poll_interval,
            success_type: success_type.into(),
            cancel_on_enter: std::io::stdin().is_terminal(),
        }
    }
}

impl AuthWindowOpener for TerminalOpener {
    fn open(&self, auth_url: &str) -> Option<Box<dyn AuthWindow>> {
        let hint = if self.cancel_on_enter {
            " (press Enter to cancel)"
        } else {
            ""
        };
        let mut err = std::io::stderr();
        let shown = writeln!(
            err,
            "Open this URL in a browser to connect Google Drive:\n\n  {auth_url}\n\nWaiting for authorization{hint}..."
        );
        if shown.is_err() {
            return None;
        }

        let closed = Arc::new(AtomicBool::new(false));
        // Piped or closed stdin hits EOF at once and would close the popup
        // before the user could authorize.
        if self.cancel_on_enter {
            let flag = closed.clone();
            // stdin reads block; keep them off the runtime's threads.
            std::thread::spawn(move || {
                let mut line = String::new();
                let _ = std::io::stdin().read_line(&mut line);
                flag.store(true, Ordering::SeqCst);
            });
        }

        Some(Box::new(TerminalPopup {
            service: self.service.clone(),
            poll_interval: self.poll_interval,
            success_type: self.success_type.clone(),
            closed,
            watcher: None,
        }))
    }
}

struct TerminalPopup {
    service: Arc<dyn RemoteDocumentService>,
    poll_interval: Duration,
    success_type: String,
    closed: Arc<AtomicBool>,
    watcher: Option<JoinHandle<()>>,
}

impl AuthWindow for TerminalPopup {
    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AuthMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = self.service.clone();
        let interval = self.poll_interval;
        let kind = self.success_type.clone();
        self.watcher = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match service.status().await {
                    Ok(true) => {
                        let _ = tx.send(AuthMessage::new(kind));
                        return;
                    }
                    Ok(false) => {}
                    Err(e) => tracing::debug!(error = %e, "status poll failed"),
                }
            }
        }));
        rx
    }

    fn unsubscribe(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use textprobe_core::service::ServiceFuture;
    use textprobe_core::{RemoteDocument, ServiceError};

    /// Reports unauthenticated until `authorized_after` status calls.
    struct StubDrive {
        authorized_after: usize,
        status_calls: AtomicUsize,
    }

    impl StubDrive {
        fn new(authorized_after: usize) -> Arc<Self> {
            Arc::new(Self {
                authorized_after,
                status_calls: AtomicUsize::new(0),
            })
        }
    }

    impl RemoteDocumentService for StubDrive {
        fn status(&self) -> ServiceFuture<'_, bool> {
            Box::pin(async move {
                let n = self.status_calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(n >= self.authorized_after)
            })
        }

        fn auth_url(&self) -> ServiceFuture<'_, String> {
            Box::pin(async { Ok("https://accounts.example/auth".to_string()) })
        }

        fn download<'a>(&'a self, _file_id: &'a str) -> ServiceFuture<'a, RemoteDocument> {
            Box::pin(async { Err(ServiceError::Unavailable("not used".into())) })
        }
    }

    fn opener(service: Arc<StubDrive>, cancel_on_enter: bool) -> TerminalOpener {
        TerminalOpener {
            service,
            poll_interval: Duration::from_millis(5),
            success_type: "drive-auth-success".into(),
            cancel_on_enter,
        }
    }

    #[test]
    fn popup_stays_open_without_a_terminal() {
        let popup = opener(StubDrive::new(1), false)
            .open("https://accounts.example/auth")
            .unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(!popup.is_closed());
    }

    #[tokio::test]
    async fn popup_posts_success_once_status_reports_connected() {
        let drive = StubDrive::new(3);
        let mut popup = opener(drive.clone(), false)
            .open("https://accounts.example/auth")
            .unwrap();
        let mut messages = popup.subscribe();

        let message = tokio::time::timeout(Duration::from_secs(5), messages.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.kind, "drive-auth-success");
        assert_eq!(drive.status_calls.load(Ordering::SeqCst), 3);
        popup.unsubscribe();
        assert!(!popup.is_closed());
    }

    #[test]
    fn missing_text_is_empty_not_denied() {
        assert_eq!(
            clipboard_error(arboard::Error::ContentNotAvailable),
            ClipboardError::Empty
        );
        assert_eq!(
            clipboard_error(arboard::Error::ClipboardNotSupported),
            ClipboardError::Unavailable
        );
        assert!(matches!(
            clipboard_error(arboard::Error::ClipboardOccupied),
            ClipboardError::Denied(_)
        ));
    }
}
