// src/collection/controlled.rs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info};

use crate::api::HistoryApi;
use crate::collection::filter::FetchFilter;
use crate::collection::store::{ContentStore, MergeSummary};
use crate::content::{ContentRecord, Timestamp};
use crate::errors::SyncError;

/// Outcome of one `refresh()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Number of pages requested.
    pub pages: usize,
    pub merge: MergeSummary,
}

impl RefreshSummary {
    pub fn changed(&self) -> bool {
        self.merge.changed()
    }
}

pub type RefreshResult = Result<RefreshSummary, SyncError>;

/// Handle to a refresh in flight. Every clone resolves to the same result.
pub type RefreshFuture = Shared<BoxFuture<'static, RefreshResult>>;

/// Locally cached, incrementally refreshed view of one history's contents.
///
/// Cloning is cheap and every clone shares the same records, cursor and
/// in-flight refresh, so several consumers can ask for a refresh at once
/// and only one request goes out.
#[derive(Clone)]
pub struct ControlledFetchCollection {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn HistoryApi>,
    /// Filter applied on every refresh; `since`/`limit`/`offset` are
    /// overwritten per request.
    base_filter: FetchFilter,
    page_size: Option<usize>,
    store: Mutex<ContentStore>,
    inflight: Mutex<Option<(u64, RefreshFuture)>>,
    generation: AtomicU64,
}

impl std::fmt::Debug for ControlledFetchCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlledFetchCollection")
            .field("filter", &self.inner.base_filter)
            .field("page_size", &self.inner.page_size)
            .field("len", &self.len())
            .field("cursor", &self.cursor())
            .finish_non_exhaustive()
    }
}

impl ControlledFetchCollection {
    pub fn new(api: Arc<dyn HistoryApi>, base_filter: FetchFilter) -> Self {
        Self::with_page_size(api, base_filter, None)
    }

    /// With `Some(n)`, each refresh pages through `limit = n` requests until
    /// the server returns a short page.
    pub fn with_page_size(
        api: Arc<dyn HistoryApi>,
        base_filter: FetchFilter,
        page_size: Option<usize>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                base_filter,
                page_size: page_size.filter(|n| *n > 0),
                store: Mutex::new(ContentStore::new()),
                inflight: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn history_id(&self) -> &str {
        &self.inner.base_filter.history_id
    }

    pub fn supports_abort(&self) -> bool {
        self.inner.api.supports_abort()
    }

    /// Issue one request for `filter` and return the decoded page without
    /// merging it.
    pub async fn fetch(&self, filter: FetchFilter) -> Result<Vec<ContentRecord>, SyncError> {
        self.inner.api.fetch_contents(filter).await
    }

    /// Merge records into the collection. See [`ContentStore::merge`].
    pub fn merge(&self, records: impl IntoIterator<Item = ContentRecord>) -> MergeSummary {
        lock(&self.inner.store).merge(records)
    }

    /// Fetch everything newer than the cursor and merge it.
    ///
    /// While a refresh is outstanding, further calls return a clone of the
    /// same future instead of issuing another request.
    pub fn refresh(&self) -> RefreshFuture {
        let mut slot = lock(&self.inner.inflight);
        if let Some((generation, fut)) = slot.as_ref() {
            debug!(
                generation,
                history = %self.history_id(),
                "coalescing refresh into in-flight request"
            );
            return fut.clone();
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let inner = Arc::clone(&self.inner);
        let fut = async move {
            let result = inner.refresh_pages().await;
            inner.clear_inflight(generation);
            result
        }
        .boxed()
        .shared();

        *slot = Some((generation, fut.clone()));
        fut
    }

    /// Drop the in-flight refresh, and the request with it, if the caller
    /// has already released its own handle and nobody else holds one.
    ///
    /// While another consumer is still awaiting the refresh the slot is left
    /// in place, so later `refresh()` calls keep coalescing into it and at
    /// most one request is ever outstanding. Returns `true` if the request
    /// was dropped.
    pub fn abort_inflight(&self) -> bool {
        let mut slot = lock(&self.inner.inflight);
        let (generation, handles) = match slot.as_ref() {
            Some((generation, fut)) => (*generation, fut.strong_count()),
            None => return false,
        };

        // The slot itself holds one handle.
        if let Some(n) = handles.filter(|n| *n > 1) {
            debug!(
                generation,
                waiters = n - 1,
                history = %self.history_id(),
                "refresh still awaited elsewhere; not aborting"
            );
            return false;
        }

        // Drop the request outside the lock.
        let aborted = slot.take();
        drop(slot);
        drop(aborted);
        info!(generation, history = %self.history_id(), "aborted in-flight refresh");
        true
    }

    pub fn is_refreshing(&self) -> bool {
        lock(&self.inner.inflight).is_some()
    }

    /// `true` iff every record is terminal. An empty collection counts as
    /// terminal.
    pub fn all_terminal(&self) -> bool {
        lock(&self.inner.store).all_terminal()
    }

    /// Snapshot in ascending `hid` order.
    pub fn to_array(&self) -> Vec<ContentRecord> {
        lock(&self.inner.store).to_vec()
    }

    pub fn get(&self, id: &str) -> Option<ContentRecord> {
        lock(&self.inner.store).get(id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.store).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner.store).is_empty()
    }

    pub fn cursor(&self) -> Option<Timestamp> {
        lock(&self.inner.store).cursor()
    }
}

impl Inner {
    async fn refresh_pages(&self) -> RefreshResult {
        let since = lock(&self.store).cursor().or(self.base_filter.since);
        let mut summary = RefreshSummary::default();
        let mut offset = 0;

        loop {
            let mut filter = self.base_filter.clone();
            filter.since = since;
            if let Some(limit) = self.page_size {
                filter = filter.page(limit, offset);
            }

            let page = self.api.fetch_contents(filter).await?;
            let received = page.len();
            summary.pages += 1;
            summary.merge += lock(&self.store).merge(page);

            match self.page_size {
                Some(limit) if received >= limit => offset += received,
                _ => break,
            }
        }

        debug!(
            history = %self.base_filter.history_id,
            pages = summary.pages,
            inserted = summary.merge.inserted,
            replaced = summary.merge.replaced,
            stale = summary.merge.stale_ignored,
            "refresh merged"
        );
        Ok(summary)
    }

    fn clear_inflight(&self, generation: u64) {
        let mut slot = lock(&self.inflight);
        if matches!(slot.as_ref(), Some((g, _)) if *g == generation) {
            *slot = None;
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
