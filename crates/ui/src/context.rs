use std::sync::Arc;

use services::{NetworkStatus, PatrolSessionService, SessionProgressStore, SyncDispatcher};

use crate::capture::CaptureDialog;

pub trait UiApp: Send + Sync {
    fn patrol(&self) -> Arc<PatrolSessionService>;
    fn progress(&self) -> Arc<SessionProgressStore>;
    fn sync(&self) -> Arc<SyncDispatcher>;
    fn network(&self) -> NetworkStatus;
    fn capture_dialog(&self) -> Arc<dyn CaptureDialog>;
}

#[derive(Clone)]
pub struct AppContext {
    patrol: Arc<PatrolSessionService>,
    progress: Arc<SessionProgressStore>,
    sync: Arc<SyncDispatcher>,
    network: NetworkStatus,
    capture_dialog: Arc<dyn CaptureDialog>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            patrol: app.patrol(),
            progress: app.progress(),
            sync: app.sync(),
            network: app.network(),
            capture_dialog: app.capture_dialog(),
        }
    }

    #[must_use]
    pub fn patrol(&self) -> Arc<PatrolSessionService> {
        Arc::clone(&self.patrol)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<SessionProgressStore> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn sync(&self) -> Arc<SyncDispatcher> {
        Arc::clone(&self.sync)
    }

    /// Shared connectivity flag; the UI toggle writes it, sync reads it.
    #[must_use]
    pub fn network(&self) -> NetworkStatus {
        self.network.clone()
    }

    #[must_use]
    pub fn capture_dialog(&self) -> Arc<dyn CaptureDialog> {
        Arc::clone(&self.capture_dialog)
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
