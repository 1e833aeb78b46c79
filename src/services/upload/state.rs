//! Per-browser upload state shown on the tools page.
//!
//! Every transition is published to the browser's WebSocket clients.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::UploadError;
use super::validator::UploadRejection;
use crate::models::{AnalysisMode, SessionId, WsEvent};
use crate::services::EventBroadcaster;

/// Highest progress reported before every write has resolved.
pub const PROGRESS_CAP: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

/// Upload state of one browser session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadState {
    /// Active tools tab.
    pub mode: AnalysisMode,
    /// File names of the active batch.
    pub batch: Vec<String>,
    /// Percentage in [0, 100].
    pub progress: f64,
    pub phase: UploadPhase,
    /// Inline error, cleared by the next accepted batch or by dismissal.
    pub error: Option<String>,
    #[serde(skip)]
    pub(crate) generation: u64,
}

/// Handle to one running batch; stale handles no longer move the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchTicket(u64);

/// Upload state of every browser session.
#[derive(Clone)]
pub struct UploadBoard {
    states: Arc<Mutex<HashMap<SessionId, UploadState>>>,
    broadcaster: EventBroadcaster,
    display_window: Duration,
}

impl UploadBoard {
    pub fn new(broadcaster: EventBroadcaster, display_window: Duration) -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            broadcaster,
            display_window,
        }
    }

    /// Current state of a browser session.
    pub fn snapshot(&self, session: &SessionId) -> UploadState {
        self.lock().get(session).cloned().unwrap_or_default()
    }

    /// Switch the active tab.
    pub fn set_mode(&self, session: &SessionId, mode: AnalysisMode) {
        self.lock().entry(session.clone()).or_default().mode = mode;
    }

    /// Record a validation rejection; the batch and progress stay as they were.
    pub fn reject(&self, session: &SessionId, rejection: &UploadRejection) {
        self.lock().entry(session.clone()).or_default().error = Some(rejection.to_string());
        self.broadcaster
            .publish(session, WsEvent::upload_failed(rejection.to_string()));
    }

    /// Make `files` the active batch. Refused while another batch is uploading.
    pub fn begin(
        &self,
        session: &SessionId,
        mode: AnalysisMode,
        files: Vec<String>,
    ) -> Result<BatchTicket, UploadError> {
        let total = files.len();
        let ticket = {
            let mut states = self.lock();
            let state = states.entry(session.clone()).or_default();
            if state.phase == UploadPhase::Uploading {
                return Err(UploadError::InProgress);
            }
            state.generation += 1;
            state.mode = mode;
            state.batch = files;
            state.progress = 0.0;
            state.phase = UploadPhase::Uploading;
            state.error = None;
            BatchTicket(state.generation)
        };
        self.broadcaster
            .publish(session, WsEvent::upload_progress(0.0, total));
        Ok(ticket)
    }

    /// Move the progress of a running batch.
    pub fn progress(&self, session: &SessionId, ticket: BatchTicket, progress: f64) {
        let total = {
            let mut states = self.lock();
            let Some(state) = current(&mut states, session, ticket, UploadPhase::Uploading) else {
                return;
            };
            state.progress = progress;
            state.batch.len()
        };
        self.broadcaster
            .publish(session, WsEvent::upload_progress(progress, total));
    }

    /// Mark a batch stored and schedule its clearing after the display window.
    pub fn succeed(&self, session: &SessionId, ticket: BatchTicket) {
        let files = {
            let mut states = self.lock();
            let Some(state) = current(&mut states, session, ticket, UploadPhase::Uploading) else {
                return;
            };
            state.progress = 100.0;
            state.phase = UploadPhase::Succeeded;
            state.batch.clone()
        };
        self.broadcaster
            .publish(session, WsEvent::upload_completed(files));

        let board = self.clone();
        let session = session.clone();
        tokio::spawn(async move {
            tokio::time::sleep(board.display_window).await;
            board.clear(&session, ticket);
        });
    }

    /// Mark a batch failed: the batch empties, progress resets and the error shows.
    pub fn fail(&self, session: &SessionId, ticket: BatchTicket, message: &str) {
        {
            let mut states = self.lock();
            let Some(state) = current(&mut states, session, ticket, UploadPhase::Uploading) else {
                return;
            };
            state.batch.clear();
            state.progress = 0.0;
            state.phase = UploadPhase::Failed;
            state.error = Some(message.to_string());
        }
        self.broadcaster
            .publish(session, WsEvent::upload_failed(message));
    }

    /// Dismiss the inline error.
    pub fn dismiss(&self, session: &SessionId) {
        if let Some(state) = self.lock().get_mut(session) {
            state.error = None;
            if state.phase == UploadPhase::Failed {
                state.phase = UploadPhase::Idle;
            }
        }
    }

    /// Drop the state of a browser session that no longer exists.
    pub fn forget(&self, session: &SessionId) {
        self.lock().remove(session);
    }

    /// Number of browser sessions with upload state.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self, session: &SessionId, ticket: BatchTicket) {
        {
            let mut states = self.lock();
            let Some(state) = current(&mut states, session, ticket, UploadPhase::Succeeded) else {
                return;
            };
            state.batch.clear();
            state.progress = 0.0;
            state.phase = UploadPhase::Idle;
        }
        debug!(session = %session, "Upload batch cleared");
        self.broadcaster.publish(session, WsEvent::UploadCleared);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, UploadState>> {
        self.states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The state of `session` if `ticket` still names its batch and the phase matches.
fn current<'a>(
    states: &'a mut HashMap<SessionId, UploadState>,
    session: &SessionId,
    ticket: BatchTicket,
    phase: UploadPhase,
) -> Option<&'a mut UploadState> {
    states
        .get_mut(session)
        .filter(|state| state.generation == ticket.0 && state.phase == phase)
}

/// Progress after `encoded` of `total` files, capped until all writes resolve.
pub fn capped_progress(encoded: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (encoded as f64 / total as f64 * 100.0).min(PROGRESS_CAP)
}
