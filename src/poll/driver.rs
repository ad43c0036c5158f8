// src/poll/driver.rs

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::collection::{ControlledFetchCollection, RefreshResult};
use crate::errors::SyncError;
use crate::poll::clock::{Clock, TokioClock};
use crate::poll::core::{PollCommand, PollCore, PollSettings, PollState, TickDecision};
use crate::poll::observer::{PollObserver, PollUpdate};

/// How a polling session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub state: PollState,
    /// Ticks that issued a refresh.
    pub ticks: u32,
    /// Set for `StoppedExhausted`.
    pub error: Option<SyncError>,
}

/// Async shell around [`PollCore`]: runs refreshes, sleeps between ticks,
/// and reports to a [`PollObserver`].
pub struct Poller<C: Clock = TokioClock> {
    collection: ControlledFetchCollection,
    settings: PollSettings,
    clock: C,
    cancel: CancellationToken,
}

impl<C: Clock> fmt::Debug for Poller<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller")
            .field("collection", &self.collection)
            .field("settings", &self.settings)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Poller<TokioClock> {
    pub fn new(collection: ControlledFetchCollection, settings: PollSettings) -> Self {
        Self::with_clock(collection, settings, TokioClock)
    }
}

impl<C: Clock> Poller<C> {
    pub fn with_clock(
        collection: ControlledFetchCollection,
        settings: PollSettings,
        clock: C,
    ) -> Self {
        Self {
            collection,
            settings,
            clock,
            cancel: CancellationToken::new(),
        }
    }

    pub fn collection(&self) -> &ControlledFetchCollection {
        &self.collection
    }

    /// Request a cooperative stop. Takes effect at the next tick boundary or
    /// immediately while sleeping.
    pub fn cancel(&self) {
        debug!("poller cancellation requested");
        self.cancel.cancel();
    }

    /// A handle that cancels this poller when cancelled. Cancelling the
    /// token is the same as calling [`Poller::cancel`].
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn [`Poller::run`] on the Tokio runtime.
    pub fn start<O>(self: Arc<Self>, mut observer: O) -> JoinHandle<PollOutcome>
    where
        C: 'static,
        O: PollObserver + 'static,
    {
        tokio::spawn(async move { self.run(&mut observer).await })
    }

    /// Poll until everything is terminal, the session is cancelled, or a
    /// ceiling is hit.
    pub async fn run<O: PollObserver + ?Sized>(&self, observer: &mut O) -> PollOutcome {
        let mut core = PollCore::new(self.settings.clone());
        core.start(self.clock.now());
        info!(history = %self.collection.history_id(), "poller started");

        loop {
            let decision = core.begin_tick(self.clock.now(), self.cancel.is_cancelled());
            if let TickDecision::Stop(state) = decision {
                return self.finish(core, state, observer);
            }

            let Some(result) = self.refresh_once().await else {
                continue;
            };

            let command = match result {
                Ok(summary) => {
                    let all_terminal = self.collection.all_terminal();
                    if summary.changed() {
                        observer.on_update(&PollUpdate {
                            tick: core.attempts(),
                            summary,
                            contents: self.collection.to_array(),
                            all_terminal,
                        });
                    }
                    core.on_refresh_ok(summary.changed(), all_terminal)
                }
                Err(err) => core.on_refresh_err(err),
            };

            match command {
                PollCommand::Stop(state) => return self.finish(core, state, observer),
                PollCommand::Sleep(delay) => {
                    tokio::select! {
                        _ = self.clock.sleep(delay) => {}
                        _ = self.cancel.cancelled() => {
                            debug!("cancelled while sleeping");
                        }
                    }
                }
            }
        }
    }

    /// One refresh, honouring cancellation. `None` means the result was
    /// dropped because the session was cancelled.
    async fn refresh_once(&self) -> Option<RefreshResult> {
        let mut refresh = self.collection.refresh();

        if self.collection.supports_abort() {
            tokio::select! {
                result = &mut refresh => Some(result),
                _ = self.cancel.cancelled() => {
                    // Release our handle first; the request is only dropped
                    // if no other consumer is waiting on it.
                    drop(refresh);
                    if !self.collection.abort_inflight() {
                        debug!("cancelled; in-flight refresh left to its other waiters");
                    }
                    None
                }
            }
        } else {
            let result = refresh.await;
            if self.cancel.is_cancelled() {
                debug!("cancelled during refresh; discarding result");
                None
            } else {
                Some(result)
            }
        }
    }

    fn finish<O: PollObserver + ?Sized>(
        &self,
        mut core: PollCore,
        state: PollState,
        observer: &mut O,
    ) -> PollOutcome {
        let error = core.take_error();
        match &error {
            Some(err) => observer.on_error(err),
            None => observer.on_done(state),
        }
        info!(?state, ticks = core.attempts(), "poller stopped");

        PollOutcome {
            state,
            ticks: core.attempts(),
            error,
        }
    }
}
