use scada_tools::PlantInspector;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::state::AppState;

/// Ticks between heartbeat log lines (one minute at the stock rate).
const HEARTBEAT_TICKS: u64 = 600;

/// Drive the plant forward once per `period` until the task is aborted.
///
/// Late ticks are skipped rather than bunched, so a stalled runtime does not
/// make vehicles jump.
pub fn spawn_ticker(state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(period_ms = period.as_millis() as u64, "simulation ticker started");
        loop {
            interval.tick().await;
            let report = state.step().await;
            if report.tick % HEARTBEAT_TICKS == 0 {
                let summary = state.read(PlantInspector::summary).await;
                tracing::info!("{summary}");
            }
        }
    })
}
