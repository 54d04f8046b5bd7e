use crate::api::RoadmapApi;
use crate::core::models::TopicKey;
use crate::core::retry::RetryState;
use crate::core::settings::SessionTimings;
use crate::session::timers::{SessionToken, TimerRegistry};
use crate::ui::panel::ResultsPanel;
use crate::ui::render::{FetchOutcome, View};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Triggering,
    Polling,
    Completed,
    TimedOut,
    Cancelled,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Completed | PollState::TimedOut | PollState::Cancelled
        )
    }
}

/// What the driver must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    Fetch,
    Wait(Duration),
    Done(PollState),
}

/// How a status fetch ended, as far as scheduling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchResult {
    Running,
    Finished,
    Failed,
}

impl FetchResult {
    pub fn classify(outcome: &FetchOutcome) -> Self {
        match outcome {
            Ok(results) if results.is_fetching() => FetchResult::Running,
            Ok(_) => FetchResult::Finished,
            Err(_) => FetchResult::Failed,
        }
    }
}

/// Transition rules of a poll session. Holds no I/O; `run_poll_session`
/// executes the steps it returns.
#[derive(Debug, Clone)]
pub struct PollMachine {
    state: PollState,
    max_duration: Duration,
    retry: RetryState,
}

impl PollMachine {
    pub fn new(timings: &SessionTimings) -> Self {
        Self {
            state: PollState::Idle,
            max_duration: timings.max_poll_duration,
            retry: RetryState::new(timings.poll_interval),
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    fn finish(&mut self, state: PollState) -> PollStep {
        self.state = state;
        PollStep::Done(state)
    }

    /// `Idle -> Triggering`. Returns false if the session already started.
    pub fn begin(&mut self) -> bool {
        if self.state != PollState::Idle {
            return false;
        }
        self.state = PollState::Triggering;
        true
    }

    /// `Triggering -> Polling`: the first status fetch is issued at once.
    pub fn triggered(&mut self) -> PollStep {
        match self.state {
            PollState::Triggering => {
                self.state = PollState::Polling;
                PollStep::Fetch
            }
            state => PollStep::Done(state),
        }
    }

    /// Guard in front of every follow-up fetch.
    pub fn before_fetch(&mut self, elapsed: Duration) -> PollStep {
        match self.state {
            PollState::Polling if elapsed >= self.max_duration => self.finish(PollState::TimedOut),
            PollState::Polling => PollStep::Fetch,
            state => PollStep::Done(state),
        }
    }

    pub fn on_result(&mut self, result: FetchResult, elapsed: Duration) -> PollStep {
        if self.state != PollState::Polling {
            return PollStep::Done(self.state);
        }

        match result {
            FetchResult::Finished => return self.finish(PollState::Completed),
            FetchResult::Running => self.retry.record_success(),
            FetchResult::Failed => self.retry.record_failure(),
        }

        if elapsed >= self.max_duration {
            return self.finish(PollState::TimedOut);
        }
        PollStep::Wait(self.retry.current_delay())
    }

    pub fn cancel(&mut self) -> PollStep {
        if self.state.is_terminal() {
            return PollStep::Done(self.state);
        }
        self.finish(PollState::Cancelled)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.retry.consecutive_failures()
    }
}

/// Starts a poll session for `key` through the registry, replacing any
/// previous one.
pub fn start_poll_session(
    api: Arc<dyn RoadmapApi>,
    panel: ResultsPanel,
    registry: &TimerRegistry,
    key: TopicKey,
    timings: SessionTimings,
) -> SessionToken {
    let owner = registry.clone();
    let session_key = key.clone();
    registry.start_poll(key, move |token| async move {
        run_poll_session(api, panel, owner, session_key, timings, token).await;
    })
}

fn spawn_trigger(api: Arc<dyn RoadmapApi>, key: TopicKey) {
    tokio::spawn(async move {
        match api.trigger_fetch(&key).await {
            Ok(ack) => tracing::info!(%key, %ack, "Background fetch started"),
            Err(e) => tracing::warn!(%key, error = %e, "Error triggering background fetch"),
        }
    });
}

pub async fn run_poll_session(
    api: Arc<dyn RoadmapApi>,
    panel: ResultsPanel,
    registry: TimerRegistry,
    key: TopicKey,
    timings: SessionTimings,
    token: SessionToken,
) -> PollState {
    let started = Instant::now();
    let mut machine = PollMachine::new(&timings);

    machine.begin();
    spawn_trigger(Arc::clone(&api), key.clone());
    let mut step = machine.triggered();

    loop {
        if token.is_cancelled() {
            step = machine.cancel();
        }

        match step {
            PollStep::Done(_) => break,
            PollStep::Wait(delay) => {
                tracing::debug!(%key, ?delay, "Scheduling next status fetch");
                tokio::select! {
                    _ = token.cancelled() => step = machine.cancel(),
                    _ = tokio::time::sleep(delay) => step = machine.before_fetch(started.elapsed()),
                }
            }
            PollStep::Fetch => {
                let outcome = tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    outcome = api.fetch_videos(&key) => Some(outcome),
                };

                let Some(outcome) = outcome.filter(|_| !token.is_cancelled()) else {
                    step = machine.cancel();
                    continue;
                };

                if let Err(e) = &outcome {
                    tracing::warn!(
                        %key,
                        error = %e,
                        failures = machine.consecutive_failures() + 1,
                        "Status fetch failed"
                    );
                }

                panel.show(&key, &outcome);
                step = machine.on_result(FetchResult::classify(&outcome), started.elapsed());
            }
        }
    }

    let state = machine.state();
    match state {
        PollState::TimedOut => {
            panel.show_view(&key, View::stopped());
            tracing::info!(%key, elapsed = ?started.elapsed(), "Polling stopped at duration limit");
        }
        PollState::Completed => tracing::info!(%key, "Video curation finished"),
        _ => tracing::debug!(%key, ?state, "Poll session ended"),
    }

    if state != PollState::Cancelled {
        registry.finish_poll(token.generation());
    }
    state
}
