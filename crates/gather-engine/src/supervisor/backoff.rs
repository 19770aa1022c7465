use std::time::Duration;

use super::types::BackoffPolicy;

/// Reconnect delay tracker. Reset after every successful connect.
#[derive(Debug)]
pub(crate) struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    pub(crate) fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            current: Self::initial(policy),
        }
    }

    fn initial(policy: BackoffPolicy) -> Duration {
        match policy {
            BackoffPolicy::Fixed(delay) => delay,
            BackoffPolicy::Exponential { base, max } => base.min(max),
        }
    }

    /// Delay to wait now, advancing the schedule.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        if let BackoffPolicy::Exponential { max, .. } = self.policy {
            self.current = delay.saturating_mul(2).min(max);
        }
        delay
    }

    pub(crate) fn reset(&mut self) {
        self.current = Self::initial(self.policy);
    }
}
