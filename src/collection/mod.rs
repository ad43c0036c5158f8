// src/collection/mod.rs

//! Incrementally fetched history contents.
//!
//! - [`filter`] describes one request (`FetchFilter`).
//! - [`store`] is the pure, lock-free merge logic (`ContentStore`).
//! - [`controlled`] wraps the store with an API client and refresh
//!   coalescing (`ControlledFetchCollection`).

pub mod controlled;
pub mod filter;
pub mod store;

pub use controlled::{ControlledFetchCollection, RefreshFuture, RefreshResult, RefreshSummary};
pub use filter::FetchFilter;
pub use store::{ContentStore, MergeSummary};
