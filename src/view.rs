// src/view.rs

//! Read-only adapter for rendering layers.
//!
//! `HistoryView` keeps the last known collection snapshot, the last
//! successfully built DAG and the last error side by side, so a renderer can
//! keep showing stale-but-valid data while offering a retry affordance.

use crate::content::ContentRecord;
use crate::dag::{JobDag, JobRecord, build_dag};
use crate::errors::SyncError;
use crate::poll::{PollEvent, PollObserver, PollState, PollUpdate};

#[derive(Debug, Clone)]
pub struct HistoryView {
    contents: Vec<ContentRecord>,
    all_terminal: bool,
    dag: Option<JobDag>,
    last_error: Option<SyncError>,
    state: PollState,
    updates: u32,
}

impl Default for HistoryView {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryView {
    pub fn new() -> Self {
        Self {
            contents: Vec::new(),
            all_terminal: true,
            dag: None,
            last_error: None,
            state: PollState::Idle,
            updates: 0,
        }
    }

    /// hid-ordered contents from the latest update.
    pub fn contents(&self) -> &[ContentRecord] {
        &self.contents
    }

    pub fn all_terminal(&self) -> bool {
        self.all_terminal
    }

    pub fn dag(&self) -> Option<&JobDag> {
        self.dag.as_ref()
    }

    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn updates(&self) -> u32 {
        self.updates
    }

    pub fn apply(&mut self, event: &PollEvent) {
        match event {
            PollEvent::Updated(update) => self.on_update(update),
            PollEvent::Done(state) => self.on_done(*state),
            PollEvent::Failed(err) => self.on_error(err),
        }
    }

    /// Rebuild the DAG from `jobs` and the current contents.
    ///
    /// On a cycle the previous DAG is kept and the error is both recorded and
    /// returned.
    pub fn rebuild_dag(&mut self, jobs: &[JobRecord]) -> Result<&JobDag, SyncError> {
        match build_dag(jobs, &self.contents) {
            Ok(dag) => Ok(&*self.dag.insert(dag)),
            Err(err) => {
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }
}

impl PollObserver for HistoryView {
    fn on_update(&mut self, update: &PollUpdate) {
        self.contents = update.contents.clone();
        self.all_terminal = update.all_terminal;
        self.state = PollState::Polling;
        self.last_error = None;
        self.updates += 1;
    }

    fn on_done(&mut self, state: PollState) {
        self.state = state;
    }

    fn on_error(&mut self, err: &SyncError) {
        self.state = PollState::StoppedExhausted;
        self.last_error = Some(err.clone());
    }
}
