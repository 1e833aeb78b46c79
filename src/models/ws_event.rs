//! WebSocket event types for session and upload updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::{Identity, SessionId};

/// Event sent to the browser that owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
#[serde(rename_all = "snake_case")]
pub enum WsEvent {
    /// Signed-in identity changed (sign-in, sign-out, refresh invalidation).
    SessionChanged(SessionChangedPayload),
    /// Upload progress moved.
    UploadProgress(UploadProgressPayload),
    /// Every record of the batch was written.
    UploadCompleted(UploadCompletedPayload),
    /// The batch failed or was rejected.
    UploadFailed(UploadFailedPayload),
    /// The success display window elapsed and the batch was cleared.
    UploadCleared,
}

/// Payload for session_changed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionChangedPayload {
    pub user: Option<Identity>,
}

/// Payload for upload_progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadProgressPayload {
    /// Percentage in [0, 100].
    pub progress: f64,
    pub total_files: usize,
}

/// Payload for upload_completed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadCompletedPayload {
    pub files: Vec<String>,
}

/// Payload for upload_failed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFailedPayload {
    pub message: String,
}

impl WsEvent {
    pub fn session_changed(user: Option<Identity>) -> Self {
        Self::SessionChanged(SessionChangedPayload { user })
    }

    pub fn upload_progress(progress: f64, total_files: usize) -> Self {
        Self::UploadProgress(UploadProgressPayload {
            progress,
            total_files,
        })
    }

    pub fn upload_completed(files: Vec<String>) -> Self {
        Self::UploadCompleted(UploadCompletedPayload { files })
    }

    pub fn upload_failed(message: impl Into<String>) -> Self {
        Self::UploadFailed(UploadFailedPayload {
            message: message.into(),
        })
    }
}

/// Event addressed to one browser session.
#[derive(Debug, Clone, Serialize)]
pub struct WsEventMessage {
    /// Recipient; never serialized to the client.
    #[serde(skip)]
    pub session: SessionId,
    #[serde(flatten)]
    pub event: WsEvent,
    pub timestamp: DateTime<Utc>,
}

impl WsEventMessage {
    pub fn new(session: SessionId, event: WsEvent) -> Self {
        Self {
            session,
            event,
            timestamp: Utc::now(),
        }
    }
}
