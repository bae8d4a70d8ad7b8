//! services/api/src/web/realtime_task.rs
//!
//! This module contains the asynchronous "worker" function that pumps the
//! realtime transport for one session.
//!
//! This is a long-running task that polls the transport on a fixed interval
//! and queues whatever updates arrive for the client's next fetch. It is
//! designed to be gracefully cancelled via a `CancellationToken`.

use crate::web::state::{AppState, SessionState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn realtime_pump(
    app_state: Arc<AppState>,
    session_state_lock: Arc<Mutex<SessionState>>,
    cancellation_token: CancellationToken,
) {
    info!("Realtime pump started.");

    let mut interval =
        tokio::time::interval(Duration::from_millis(app_state.config.poll_interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Realtime pump cancelled.");
                return;
            }
            _ = interval.tick() => {
                match app_state.transport.poll_updates().await {
                    Ok(updates) => {
                        if !updates.is_empty() {
                            let mut session = session_state_lock.lock().await;
                            for update in updates {
                                session.push_update(update);
                            }
                        }
                    }
                    // A failed poll keeps its cadence; the next tick retries.
                    Err(e) => warn!("Realtime poll failed: {e}"),
                }
            }
        }
    }
}
