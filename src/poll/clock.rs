// src/poll/clock.rs

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

/// Time source for the polling driver.
///
/// The pure [`super::PollCore`] only ever sees the `Instant`s handed to it,
/// so swapping the clock is enough to drive it without real timers.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Tokio's timer. Honours `tokio::time::pause()` in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}
