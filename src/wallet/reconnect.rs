//! Reconnect policy for dropped sessions
//!
//! Bounded: a fixed number of restore attempts with exponential backoff. When
//! the attempts run out the session is reset and `SESSION_LOST` is published.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl ReconnectPolicy {
    /// Give up immediately on the first drop.
    pub fn disabled() -> Self { Self { max_attempts: 0, ..Self::default() } }

    pub fn with_attempts(mut self, attempts: u32) -> Self { self.max_attempts = attempts; self }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }

    /// Delay before `attempt` (1-based): initial * 2^(attempt-1), capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .checked_mul(1u32 << exp)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_attempts).map(|attempt| self.backoff(attempt))
    }

    /// Upper bound on time spent reconnecting, excluding restore calls.
    pub fn total_wait(&self) -> Duration { self.delays().sum() }
}
