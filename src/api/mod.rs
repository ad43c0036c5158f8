// src/api/mod.rs

//! Server transport.
//!
//! Everything above this module talks to a [`HistoryApi`] instead of an HTTP
//! client directly, so that tests can swap in a scripted fake while
//! production uses [`ReqwestHistoryApi`].

pub mod http;

use std::future::Future;
use std::pin::Pin;

use crate::collection::FetchFilter;
use crate::content::ContentRecord;
use crate::dag::JobRecord;
use crate::errors::SyncError;

pub use http::{HttpSettings, ReqwestHistoryApi};

/// Boxed future returned by [`HistoryApi`] methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SyncError>> + Send + 'a>>;

/// The two endpoints the sync layer consumes.
pub trait HistoryApi: Send + Sync {
    /// `GET` one page of history contents matching `filter`.
    fn fetch_contents(&self, filter: FetchFilter) -> ApiFuture<'_, Vec<ContentRecord>>;

    /// `GET` the jobs that ran in a history.
    fn fetch_jobs(&self, history_id: &str) -> ApiFuture<'_, Vec<JobRecord>>;

    /// Whether dropping an in-flight request frees its connection.
    ///
    /// When `false`, the polling driver lets a request finish after
    /// cancellation and discards the result.
    fn supports_abort(&self) -> bool {
        false
    }
}
