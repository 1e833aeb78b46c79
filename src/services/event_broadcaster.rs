//! Per-browser event fan-out for WebSocket clients.
//!
//! One `tokio::sync::broadcast` channel carries the events of every browser
//! session. Connections read through [`SessionEvents`], which skips events
//! addressed to other sessions.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::models::{SessionId, WsEvent, WsEventMessage};

/// Events buffered per receiver before it starts lagging.
const CHANNEL_CAPACITY: usize = 1000;

#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<WsEventMessage>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Every event, whatever session it is addressed to.
    pub fn subscribe(&self) -> broadcast::Receiver<WsEventMessage> {
        self.sender.subscribe()
    }

    /// Events addressed to `session` only.
    pub fn subscribe_session(&self, session: SessionId) -> SessionEvents {
        SessionEvents {
            session,
            rx: self.sender.subscribe(),
        }
    }

    /// Publish an event to the clients of one browser session.
    ///
    /// Returns how many connections were listening; nobody listening is not
    /// an error.
    pub fn publish(&self, session: &SessionId, event: WsEvent) -> usize {
        self.sender
            .send(WsEventMessage::new(session.clone(), event))
            .unwrap_or(0)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver filtered to one browser session.
pub struct SessionEvents {
    session: SessionId,
    rx: broadcast::Receiver<WsEventMessage>,
}

impl SessionEvents {
    /// Next event for this session. Lag is reported like the raw receiver does.
    pub async fn recv(&mut self) -> Result<WsEventMessage, RecvError> {
        loop {
            let message = self.rx.recv().await?;
            if message.session == self.session {
                return Ok(message);
            }
        }
    }
}
