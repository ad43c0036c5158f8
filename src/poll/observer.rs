// src/poll/observer.rs

//! Callbacks from the polling driver to whoever renders the collection.

use tokio::sync::mpsc;
use tracing::debug;

use crate::collection::RefreshSummary;
use crate::content::ContentRecord;
use crate::errors::SyncError;
use crate::poll::core::PollState;

/// Delivered after every tick whose refresh changed the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollUpdate {
    pub tick: u32,
    pub summary: RefreshSummary,
    /// hid-ordered snapshot taken right after the merge.
    pub contents: Vec<ContentRecord>,
    pub all_terminal: bool,
}

/// Receives polling progress.
///
/// `on_done` fires once for `StoppedAllDone` / `StoppedCancelled`;
/// `on_error` fires once with the `PollExhausted` error for
/// `StoppedExhausted`. Exactly one of the two is called per session.
pub trait PollObserver: Send {
    fn on_update(&mut self, _update: &PollUpdate) {}

    fn on_done(&mut self, _state: PollState) {}

    fn on_error(&mut self, _err: &SyncError) {}
}

/// Adapts three closures into a [`PollObserver`].
pub struct Callbacks<U, D, E> {
    pub on_update: U,
    pub on_done: D,
    pub on_error: E,
}

impl<U, D, E> Callbacks<U, D, E>
where
    U: FnMut(&PollUpdate) + Send,
    D: FnMut(PollState) + Send,
    E: FnMut(&SyncError) + Send,
{
    pub fn new(on_update: U, on_done: D, on_error: E) -> Self {
        Self {
            on_update,
            on_done,
            on_error,
        }
    }
}

impl<U, D, E> PollObserver for Callbacks<U, D, E>
where
    U: FnMut(&PollUpdate) + Send,
    D: FnMut(PollState) + Send,
    E: FnMut(&SyncError) + Send,
{
    fn on_update(&mut self, update: &PollUpdate) {
        (self.on_update)(update)
    }

    fn on_done(&mut self, state: PollState) {
        (self.on_done)(state)
    }

    fn on_error(&mut self, err: &SyncError) {
        (self.on_error)(err)
    }
}

/// Events forwarded by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Updated(PollUpdate),
    Done(PollState),
    Failed(SyncError),
}

/// Forwards callbacks into an mpsc channel so an async loop can consume them.
///
/// The channel closes when the observer is dropped, i.e. when the polling
/// task ends.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<PollEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<PollEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PollEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, event: PollEvent) {
        if self.tx.send(event).is_err() {
            debug!("poll event receiver dropped");
        }
    }
}

impl PollObserver for ChannelObserver {
    fn on_update(&mut self, update: &PollUpdate) {
        self.send(PollEvent::Updated(update.clone()));
    }

    fn on_done(&mut self, state: PollState) {
        self.send(PollEvent::Done(state));
    }

    fn on_error(&mut self, err: &SyncError) {
        self.send(PollEvent::Failed(err.clone()));
    }
}
