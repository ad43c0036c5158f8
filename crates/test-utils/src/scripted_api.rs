use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use histdag::api::{ApiFuture, HistoryApi};
use histdag::collection::FetchFilter;
use histdag::content::ContentRecord;
use histdag::dag::JobRecord;
use histdag::errors::SyncError;

/// A fake [`HistoryApi`] that:
/// - answers content requests from a script, one entry per request
/// - answers with an empty page once the script runs out
/// - records every filter it was asked for
/// - can hold each response until a gate is notified, or delay it
#[derive(Default)]
pub struct ScriptedApi {
    pages: Mutex<VecDeque<Result<Vec<ContentRecord>, SyncError>>>,
    jobs: Mutex<Vec<JobRecord>>,
    requests: Mutex<Vec<FetchFilter>>,
    completed: AtomicUsize,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
    abortable: bool,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, records: Vec<ContentRecord>) -> Self {
        self.pages.lock().unwrap().push_back(Ok(records));
        self
    }

    pub fn error(self, err: SyncError) -> Self {
        self.pages.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn jobs(self, jobs: Vec<JobRecord>) -> Self {
        *self.jobs.lock().unwrap() = jobs;
        self
    }

    /// Every content request waits for `gate.notify_one()` before answering.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn abortable(mut self, val: bool) -> Self {
        self.abortable = val;
        self
    }

    pub fn push_page(&self, records: Vec<ContentRecord>) {
        self.pages.lock().unwrap().push_back(Ok(records));
    }

    pub fn push_error(&self, err: SyncError) {
        self.pages.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<FetchFilter> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Content requests that ran to completion (not dropped mid-flight).
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl HistoryApi for ScriptedApi {
    fn fetch_contents(&self, filter: FetchFilter) -> ApiFuture<'_, Vec<ContentRecord>> {
        self.requests.lock().unwrap().push(filter);

        Box::pin(async move {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let next = self.pages.lock().unwrap().pop_front();
            self.completed.fetch_add(1, Ordering::SeqCst);
            next.unwrap_or_else(|| Ok(Vec::new()))
        })
    }

    fn fetch_jobs(&self, _history_id: &str) -> ApiFuture<'_, Vec<JobRecord>> {
        let jobs = self.jobs.lock().unwrap().clone();
        Box::pin(async move { Ok(jobs) })
    }

    fn supports_abort(&self) -> bool {
        self.abortable
    }
}
