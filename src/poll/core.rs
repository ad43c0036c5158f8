// src/poll/core.rs

//! Pure polling state machine.
//!
//! `PollCore` decides, tick by tick, whether to refresh, how long to wait,
//! and when to stop. It never sleeps, never touches the network and never
//! reads a clock: the async driver (`poll::driver::Poller`) feeds it
//! `Instant`s and refresh results and carries out the returned commands.
//!
//! ```text
//! Idle -> Polling -> { StoppedAllDone, StoppedCancelled, StoppedExhausted }
//! ```

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::errors::{ExhaustReason, SyncError};
use crate::poll::backoff::BackoffPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    StoppedAllDone,
    StoppedCancelled,
    StoppedExhausted,
}

impl PollState {
    pub fn is_stopped(self) -> bool {
        matches!(
            self,
            PollState::StoppedAllDone | PollState::StoppedCancelled | PollState::StoppedExhausted
        )
    }
}

/// Limits and backoff for one polling session.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub backoff: BackoffPolicy,
    /// Consecutive failures tolerated; one more moves to `StoppedExhausted`.
    pub max_consecutive_failures: u32,
    /// Total ticks allowed, if bounded.
    pub max_attempts: Option<u32>,
    /// Wall-clock budget since `start`, if bounded.
    pub max_duration: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            max_consecutive_failures: 5,
            max_attempts: None,
            max_duration: None,
        }
    }
}

/// Answer to `begin_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    Refresh,
    Stop(PollState),
}

/// What the driver should do after a refresh result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCommand {
    Sleep(Duration),
    Stop(PollState),
}

#[derive(Debug)]
pub struct PollCore {
    settings: PollSettings,
    state: PollState,
    started_at: Option<Instant>,
    attempts: u32,
    consecutive_failures: u32,
    quiet_ticks: u32,
    error: Option<SyncError>,
}

impl PollCore {
    pub fn new(settings: PollSettings) -> Self {
        Self {
            settings,
            state: PollState::Idle,
            started_at: None,
            attempts: 0,
            consecutive_failures: 0,
            quiet_ticks: 0,
            error: None,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Ticks that issued a refresh so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// The `PollExhausted` error once in `StoppedExhausted`.
    pub fn error(&self) -> Option<&SyncError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<SyncError> {
        self.error.take()
    }

    /// `Idle -> Polling`. Ignored in any other state.
    pub fn start(&mut self, now: Instant) {
        if self.state != PollState::Idle {
            warn!(state = ?self.state, "poll core already started; ignoring start");
            return;
        }
        self.state = PollState::Polling;
        self.started_at = Some(now);
        info!("polling started");
    }

    /// Checked at the top of every tick: cancellation first, then ceilings.
    pub fn begin_tick(&mut self, now: Instant, cancelled: bool) -> TickDecision {
        if self.state != PollState::Polling {
            return TickDecision::Stop(self.state);
        }

        if cancelled {
            info!(attempts = self.attempts, "polling cancelled");
            self.state = PollState::StoppedCancelled;
            return TickDecision::Stop(self.state);
        }

        if let Some(max) = self.settings.max_attempts {
            if self.attempts >= max {
                return TickDecision::Stop(self.exhaust(ExhaustReason::AttemptLimit(max)));
            }
        }

        if let (Some(max), Some(started)) = (self.settings.max_duration, self.started_at) {
            if now.saturating_duration_since(started) >= max {
                return TickDecision::Stop(self.exhaust(ExhaustReason::DeadlineElapsed(max)));
            }
        }

        self.attempts += 1;
        debug!(attempt = self.attempts, "poll tick");
        TickDecision::Refresh
    }

    /// A refresh succeeded. `changed` is whether the merge touched anything.
    pub fn on_refresh_ok(&mut self, changed: bool, all_terminal: bool) -> PollCommand {
        if self.state != PollState::Polling {
            return PollCommand::Stop(self.state);
        }

        self.consecutive_failures = 0;

        if all_terminal {
            info!(attempts = self.attempts, "all content terminal; polling done");
            self.state = PollState::StoppedAllDone;
            return PollCommand::Stop(self.state);
        }

        self.quiet_ticks = if changed { 0 } else { self.quiet_ticks.saturating_add(1) };
        let delay = self.settings.backoff.delay(self.quiet_ticks);
        debug!(quiet_ticks = self.quiet_ticks, ?delay, "scheduling next tick");
        PollCommand::Sleep(delay)
    }

    /// A refresh failed. Retries with backoff until the failure ceiling; a
    /// non-retryable error stops at once.
    pub fn on_refresh_err(&mut self, err: SyncError) -> PollCommand {
        if self.state != PollState::Polling {
            return PollCommand::Stop(self.state);
        }

        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let failures = self.consecutive_failures;

        if !err.is_retryable() {
            return PollCommand::Stop(self.exhaust(ExhaustReason::NonRetryable(Box::new(err))));
        }

        if failures > self.settings.max_consecutive_failures {
            return PollCommand::Stop(self.exhaust(ExhaustReason::TooManyFailures {
                failures,
                last: Box::new(err),
            }));
        }

        let delay = self.settings.backoff.delay(failures);
        warn!(%err, failures, ?delay, "refresh failed; retrying");
        PollCommand::Sleep(delay)
    }

    fn exhaust(&mut self, reason: ExhaustReason) -> PollState {
        let err = SyncError::PollExhausted {
            attempts: self.attempts,
            reason,
        };
        warn!(%err, "polling exhausted");
        self.error = Some(err);
        self.state = PollState::StoppedExhausted;
        self.state
    }
}
