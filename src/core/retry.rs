use std::time::Duration;

const MAX_DELAY: Duration = Duration::from_secs(600);
const BACKOFF_FACTOR: u32 = 2;

/// Follow-up delay for a polling loop: the base interval after a successful
/// fetch, doubling per consecutive failure up to `MAX_DELAY`.
#[derive(Debug, Clone)]
pub struct RetryState {
    base_delay: Duration,
    consecutive_failures: u32,
}

impl RetryState {
    pub fn new(base_delay: Duration) -> Self {
        Self {
            base_delay,
            consecutive_failures: 0,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    pub fn current_delay(&self) -> Duration {
        if self.consecutive_failures == 0 {
            return self.base_delay;
        }

        let factor = BACKOFF_FACTOR.saturating_pow(self.consecutive_failures - 1);
        let delay = self.base_delay.saturating_mul(factor);

        delay.min(MAX_DELAY.max(self.base_delay))
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_secs(60);

    #[test]
    fn test_initial_delay() {
        let state = RetryState::new(BASE);
        assert_eq!(state.current_delay(), Duration::from_secs(60));
        assert_eq!(state.consecutive_failures(), 0);
    }

    #[test]
    fn test_first_failure_retries_on_base_interval() {
        let mut state = RetryState::new(BASE);

        state.record_failure();
        assert_eq!(state.current_delay(), Duration::from_secs(60));
        assert_eq!(state.consecutive_failures(), 1);

        state.record_failure();
        assert_eq!(state.current_delay(), Duration::from_secs(120));

        state.record_failure();
        assert_eq!(state.current_delay(), Duration::from_secs(240));

        state.record_failure();
        assert_eq!(state.current_delay(), Duration::from_secs(480));
    }

    #[test]
    fn test_max_delay_cap() {
        let mut state = RetryState::new(BASE);

        for _ in 0..100 {
            state.record_failure();
        }

        assert_eq!(state.consecutive_failures(), 100);
        assert_eq!(state.current_delay(), Duration::from_secs(600));
    }

    #[test]
    fn test_base_above_cap_is_kept() {
        let mut state = RetryState::new(Duration::from_secs(900));
        state.record_failure();
        state.record_failure();
        assert_eq!(state.current_delay(), Duration::from_secs(900));
    }

    #[test]
    fn test_success_resets_backoff() {
        let mut state = RetryState::new(BASE);

        state.record_failure();
        state.record_failure();
        state.record_failure();
        assert_eq!(state.consecutive_failures(), 3);

        state.record_success();
        assert_eq!(state.consecutive_failures(), 0);
        assert_eq!(state.current_delay(), Duration::from_secs(60));
    }
}
