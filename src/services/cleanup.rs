//! Cleanup service for idle browser sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use crate::services::session::SessionRegistry;
use crate::services::upload::UploadBoard;

/// Configuration for the cleanup service.
#[derive(Clone)]
pub struct CleanupConfig {
    /// Sessions not seen for this long are removed
    pub max_idle: Duration,
    /// How often to run cleanup
    pub interval: Duration,
}

impl CleanupConfig {
    /// Sweep every `max_idle / 4`, at most hourly and at least once a minute.
    pub fn for_idle(max_idle: Duration) -> Self {
        let interval = (max_idle / 4).clamp(Duration::from_secs(60), Duration::from_secs(3600));
        Self { max_idle, interval }
    }
}

/// Start the cleanup background task.
///
/// This spawns a tokio task that periodically drops browser sessions idle
/// for longer than `max_idle`, together with their upload state.
pub fn start_cleanup_task(
    registry: Arc<SessionRegistry>,
    board: UploadBoard,
    config: CleanupConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cleanup service (max idle: {} seconds, interval: {} seconds)",
            config.max_idle.as_secs(),
            config.interval.as_secs()
        );

        let mut ticker = interval(config.interval);

        loop {
            ticker.tick().await;
            run_cleanup(&registry, &board, config.max_idle);
        }
    })
}

/// Run a single cleanup cycle; returns the number of sessions removed.
pub fn run_cleanup(registry: &SessionRegistry, board: &UploadBoard, max_idle: Duration) -> usize {
    let removed = registry.prune_idle(max_idle);
    for id in &removed {
        board.forget(id);
        debug!(session = %id, "Idle session removed");
    }

    if !removed.is_empty() {
        info!(
            "Idle sessions cleanup: {} removed, {} remaining",
            removed.len(),
            registry.len()
        );
    }
    removed.len()
}
