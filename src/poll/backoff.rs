// src/poll/backoff.rs

use std::time::Duration;

use crate::types::BackoffKind;

/// Inter-tick delay as a function of how many ticks in a row went by
/// without anything changing (or failed).
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub kind: BackoffKind,
    pub initial: Duration,
    pub max: Duration,
    /// Increment per tick for `Linear`.
    pub step: Duration,
    /// Multiplier per tick for `Exponential`; must be >= 1.0.
    pub factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            kind: BackoffKind::Exponential,
            initial: Duration::from_secs(2),
            max: Duration::from_secs(30),
            step: Duration::from_secs(2),
            factor: 2.0,
        }
    }
}

impl BackoffPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            kind: BackoffKind::Linear,
            initial: interval,
            max: interval,
            step: Duration::ZERO,
            factor: 1.0,
        }
    }

    /// Delay after `n` consecutive quiet ticks. `n = 0` gives `initial`.
    pub fn delay(&self, n: u32) -> Duration {
        let delay = match self.kind {
            BackoffKind::Linear => self.initial.saturating_add(self.step.saturating_mul(n)),
            BackoffKind::Exponential => {
                let exp = i32::try_from(n).unwrap_or(i32::MAX);
                let secs = self.initial.as_secs_f64() * self.factor.powi(exp);
                if secs.is_finite() && secs < self.max.as_secs_f64() {
                    Duration::from_secs_f64(secs)
                } else {
                    self.max
                }
            }
        };
        delay.min(self.max)
    }
}
