//! Pacing for readiness checks against a booting dev server.

use std::time::Duration;

use rand::Rng;

use crate::config::DevServerConfig;

/// Delay schedule between checks: doubles from the base delay up to the
/// cap, with up to 10% jitter on top.
#[derive(Debug, Clone)]
pub struct ReadinessBackoff {
    attempt: u32,
    base_ms: u64,
    max_ms: u64,
}

impl ReadinessBackoff {
    pub fn new(config: &DevServerConfig) -> Self {
        Self {
            attempt: 0,
            base_ms: config.poll_base_delay_ms,
            max_ms: config.poll_max_delay_ms,
        }
    }

    /// Checks that have been delayed so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Delay before the next check.
    pub fn next_delay(&mut self) -> Duration {
        let step = 2u64.saturating_pow(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        let delay_ms = self.base_ms.saturating_mul(step).min(self.max_ms);
        let jitter_ms = match delay_ms / 10 {
            0 => 0,
            range => rand::thread_rng().gen_range(0..range),
        };
        Duration::from_millis(delay_ms + jitter_ms)
    }
}
