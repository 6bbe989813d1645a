//! Remote-document (Google Drive) session: status check, popup authorization
//! and document import.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::error::{BusyKind, ScanError, ServiceKind};
use crate::orchestrator::ScanOrchestrator;
use crate::service::RemoteDocumentService;
use crate::view::InputTab;

/// Message type the authorization page posts back on success.
pub const DEFAULT_AUTH_MESSAGE_TYPE: &str = "drive-auth-success";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Downloading,
}

impl DriveState {
    pub fn authenticated(&self) -> bool {
        matches!(self, DriveState::Authenticated | DriveState::Downloading)
    }
}

/// A cross-window message received from the authorization popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthMessage {
    pub kind: String,
}

impl AuthMessage {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

/// An open authorization popup.
pub trait AuthWindow: Send {
    /// Start listening for messages posted by the popup.
    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AuthMessage>;

    /// Stop listening. Called once for every `subscribe`.
    fn unsubscribe(&mut self);

    fn is_closed(&self) -> bool;
}

pub trait AuthWindowOpener: Send + Sync {
    /// Open the popup at `auth_url`. `None` when the host blocked it.
    fn open(&self, auth_url: &str) -> Option<Box<dyn AuthWindow>>;
}

/// Owns the popup while a message listener is attached; detaches on drop.
struct Listener {
    window: Box<dyn AuthWindow>,
    messages: mpsc::UnboundedReceiver<AuthMessage>,
}

impl Listener {
    fn attach(mut window: Box<dyn AuthWindow>) -> Self {
        let messages = window.subscribe();
        Self { window, messages }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.window.unsubscribe();
        tracing::debug!("authorization listener removed");
    }
}

pub struct RemoteDocumentSession {
    scan: Arc<ScanOrchestrator>,
    service: Arc<dyn RemoteDocumentService>,
    opener: Arc<dyn AuthWindowOpener>,
    state: Mutex<DriveState>,
    poll_interval: Duration,
    success_type: String,
}

/// On drop, moves the session from the transient `from` state to `settle`
/// if nothing else has moved it on.
struct StateRestore<'a> {
    session: &'a RemoteDocumentSession,
    from: DriveState,
    settle: DriveState,
}

impl Drop for StateRestore<'_> {
    fn drop(&mut self) {
        let mut state = self.session.lock();
        if *state == self.from {
            *state = self.settle;
        }
    }
}

impl RemoteDocumentSession {
    pub fn new(
        scan: Arc<ScanOrchestrator>,
        service: Arc<dyn RemoteDocumentService>,
        opener: Arc<dyn AuthWindowOpener>,
    ) -> Self {
        Self {
            scan,
            service,
            opener,
            state: Mutex::new(DriveState::Unauthenticated),
            poll_interval: DEFAULT_POLL_INTERVAL,
            success_type: DEFAULT_AUTH_MESSAGE_TYPE.to_string(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_success_type(mut self, kind: impl Into<String>) -> Self {
        self.success_type = kind.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, DriveState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> DriveState {
        *self.lock()
    }

    pub fn authenticated(&self) -> bool {
        self.state().authenticated()
    }

    /// Ask the service whether this session already has credentials.
    /// Failures are logged and leave the session unauthenticated.
    pub async fn check_status(&self) -> bool {
        let authenticated = match self.service.status().await {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(error = %e, "Drive status check failed");
                false
            }
        };
        let mut state = self.lock();
        if matches!(
            *state,
            DriveState::Unauthenticated | DriveState::Authenticated
        ) {
            *state = if authenticated {
                DriveState::Authenticated
            } else {
                DriveState::Unauthenticated
            };
        }
        tracing::debug!(authenticated, "Drive status");
        authenticated
    }

    /// Run the popup authorization flow. Resolves `true` once the popup posts
    /// a success message, `false` if it is closed (or blocked) first.
    pub async fn authenticate(&self) -> Result<bool, ScanError> {
        {
            let mut state = self.lock();
            match *state {
                DriveState::Authenticated | DriveState::Downloading => return Ok(true),
                DriveState::Authenticating => {
                    return Err(ScanError::OperationInProgress(BusyKind::Authenticating));
                }
                DriveState::Unauthenticated => *state = DriveState::Authenticating,
            }
        }
        let _restore = StateRestore {
            session: self,
            from: DriveState::Authenticating,
            settle: DriveState::Unauthenticated,
        };

        let outcome = self.await_authorization().await;
        match &outcome {
            Ok(true) => {
                *self.lock() = DriveState::Authenticated;
                self.scan.show_connected();
                tracing::info!("Drive connected");
            }
            Ok(false) => tracing::info!("Drive authorization closed without completing"),
            Err(e) => self.scan.fail(e.clone()),
        }
        outcome
    }

    async fn await_authorization(&self) -> Result<bool, ScanError> {
        let auth_url = self
            .service
            .auth_url()
            .await
            .map_err(|e| ScanError::from_service(ServiceKind::RemoteDocument, e))?;

        let Some(window) = self.opener.open(&auth_url) else {
            tracing::warn!("authorization popup was blocked");
            return Ok(false);
        };
        let mut listener = Listener::attach(window);

        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                msg = listener.messages.recv() => match msg {
                    Some(m) if m.kind == self.success_type => return Ok(true),
                    Some(m) => tracing::debug!(kind = %m.kind, "ignoring unrelated window message"),
                    None => return Ok(false),
                },
                _ = poll.tick() => {
                    if listener.window.is_closed() {
                        return Ok(false);
                    }
                }
            }
        }
    }

    /// Import a document by its identifier. Returns the document's filename.
    pub async fn select_and_download(&self, document_id: &str) -> Result<String, ScanError> {
        self.scan.ensure_idle()?;
        let id = document_id.trim();
        if id.is_empty() {
            self.scan.fail(ScanError::EmptyIdentifier);
            return Err(ScanError::EmptyIdentifier);
        }
        {
            let mut state = self.lock();
            if *state != DriveState::Authenticated {
                drop(state);
                self.scan.fail(ScanError::DriveNotConnected);
                return Err(ScanError::DriveNotConnected);
            }
            *state = DriveState::Downloading;
        }
        let _restore = StateRestore {
            session: self,
            from: DriveState::Downloading,
            settle: DriveState::Authenticated,
        };

        self.scan.set_tab(InputTab::Drive);
        let _busy = self.scan.begin(BusyKind::Downloading)?;
        match self.service.download(id).await {
            Ok(doc) => {
                tracing::info!(filename = %doc.filename, chars = doc.text.len(), "imported Drive document");
                let notice = format!("Imported \"{}\" from Drive.", doc.filename);
                self.scan.commit_text(doc.text, InputTab::Drive, Some(notice));
                Ok(doc.filename)
            }
            Err(e) => {
                tracing::warn!(file_id = id, error = %e, "Drive download failed");
                let err = ScanError::from_service(ServiceKind::RemoteDocument, e);
                self.scan.fail(err.clone());
                Err(err)
            }
        }
    }
}
