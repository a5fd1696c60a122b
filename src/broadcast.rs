use crate::state::AppState;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// Spawn a background task that pushes the current time to every SSE client
/// at a fixed rate. The first push happens one period after startup.
pub fn spawn_time_broadcaster(state: Arc<AppState>) -> JoinHandle<()> {
    let period = state.config.sse_interval;

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            ticker.tick().await;

            tracing::info!(
                "Sending periodic time update to {} clients",
                state.emitters.len()
            );

            let report = state.send_time_update();
            if report.removed > 0 {
                tracing::debug!("Pruned {} dead emitters", report.removed);
            }
        }
    })
}
