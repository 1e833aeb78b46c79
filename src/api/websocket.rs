//! WebSocket handler for real-time updates.
//!
//! Streams events for the caller's browser session only:
//! - `session_changed` from the session observer (one snapshot on connect,
//!   then every sign-in/sign-out)
//! - `upload_*` events published for the same session
//!
//! The browser session is taken from the session cookie like any page request.

use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;
use futures_util::StreamExt;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::auth::BrowserSession;
use crate::models::{SessionId, WsEvent, WsEventMessage};
use crate::services::{EventBroadcaster, SessionObserver, SessionRegistry};

/// Ping interval for keeping connections alive.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Timeout for receiving pong response.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// WebSocket handler - upgrades the HTTP connection and subscribes it to the
/// caller's session.
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    session: BrowserSession,
    registry: web::Data<SessionRegistry>,
    broadcaster: web::Data<EventBroadcaster>,
) -> Result<HttpResponse, actix_web::Error> {
    let observer = registry.observe(&session.id);
    let (response, ws, msg_stream) = actix_ws::handle(&req, stream)?;

    info!(session = %session.id, "WebSocket connection established");

    actix_web::rt::spawn(handle_websocket_connection(
        ws,
        msg_stream,
        session.id,
        observer,
        broadcaster.get_ref().clone(),
    ));

    Ok(response)
}

async fn send_event(ws: &mut actix_ws::Session, message: &WsEventMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(json) => ws.text(json).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize event");
            true
        }
    }
}

/// Handles an individual WebSocket connection.
async fn handle_websocket_connection(
    mut ws: actix_ws::Session,
    mut msg_stream: actix_ws::MessageStream,
    session: SessionId,
    mut observer: SessionObserver,
    broadcaster: EventBroadcaster,
) {
    // Subscribe before the snapshot so nothing falls between the two.
    let mut events = broadcaster.subscribe_session(session.clone());

    let snapshot = WsEventMessage::new(session.clone(), WsEvent::session_changed(observer.current()));
    if !send_event(&mut ws, &snapshot).await {
        return;
    }

    let mut last_pong = Instant::now();
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    let mut observing = true;

    loop {
        tokio::select! {
            Some(msg_result) = msg_stream.next() => {
                match msg_result {
                    Ok(Message::Ping(bytes)) => {
                        if ws.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Pong(_)) => {
                        last_pong = Instant::now();
                    }
                    Ok(Message::Text(text)) => {
                        debug!(session = %session, message = %text, "Ignoring client message");
                    }
                    Ok(Message::Close(reason)) => {
                        info!(session = %session, reason = ?reason, "Client requested close");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(session = %session, error = %e, "WebSocket message error");
                        break;
                    }
                }
            }

            changed = observer.changed(), if observing => {
                match changed {
                    Ok(identity) => {
                        let message = WsEventMessage::new(session.clone(), WsEvent::session_changed(identity));
                        if !send_event(&mut ws, &message).await {
                            break;
                        }
                    }
                    Err(_) => {
                        // Session pruned; upload events can still arrive.
                        debug!(session = %session, "Session observer ended");
                        observing = false;
                    }
                }
            }

            event_result = events.recv() => {
                match event_result {
                    Ok(event) => {
                        if !send_event(&mut ws, &event).await {
                            warn!(session = %session, "Failed to send event, closing connection");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(count)) => {
                        warn!(session = %session, missed = count, "Client lagged, missed events");
                    }
                    Err(RecvError::Closed) => {
                        info!(session = %session, "Broadcast channel closed");
                        break;
                    }
                }
            }

            _ = ping_interval.tick() => {
                if last_pong.elapsed() > PING_INTERVAL + PONG_TIMEOUT {
                    warn!(session = %session, "Pong timeout, closing connection");
                    break;
                }
                if ws.ping(b"").await.is_err() {
                    warn!(session = %session, "Failed to send ping, closing connection");
                    break;
                }
            }
        }
    }

    let _ = ws.close(None).await;
    info!(session = %session, "WebSocket connection closed");
}

/// Configure WebSocket routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(websocket_handler)));
}
