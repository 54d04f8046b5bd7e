use crate::api::RoadmapApi;
use crate::core::models::TopicKey;
use crate::core::settings::SessionTimings;
use crate::session::timers::{SessionToken, TimerRegistry};
use crate::ui::panel::ResultsPanel;
use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior};

/// Starts the fixed-cadence refresh of `key` and its expiry, replacing any
/// previous refresh session. Both are measured from this call.
pub fn start_refresh_session(
    api: Arc<dyn RoadmapApi>,
    panel: ResultsPanel,
    registry: &TimerRegistry,
    key: TopicKey,
    timings: SessionTimings,
) -> SessionToken {
    let started = Instant::now();
    let owner = registry.clone();
    let refresh_key = key.clone();

    registry.start_refresh(
        key,
        move |token| run_refresh_ticks(api, panel, refresh_key, timings, started, token),
        move |token| async move {
            tokio::time::sleep_until(started + timings.refresh_window).await;
            owner.expire_refresh(token.generation());
        },
    )
}

async fn run_refresh_ticks(
    api: Arc<dyn RoadmapApi>,
    panel: ResultsPanel,
    key: TopicKey,
    timings: SessionTimings,
    started: Instant,
    token: SessionToken,
) {
    let period = timings.refresh_interval;
    let mut ticks = tokio::time::interval_at(started + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;
        if token.is_cancelled() || started.elapsed() >= timings.refresh_window {
            break;
        }

        tracing::debug!(%key, "Refreshing videos");
        let outcome = api.fetch_videos(&key).await;
        if token.is_cancelled() {
            break;
        }

        if let Err(e) = &outcome {
            tracing::debug!(%key, error = %e, "Refresh fetch failed, keeping schedule");
        }
        panel.show(&key, &outcome);
    }
}
