#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;

use histdag::collection::{ControlledFetchCollection, FetchFilter};

pub use histdag_test_utils::builders::{
    ContentRecordBuilder, JobRecordBuilder, fixed_poll_settings, record,
};
pub use histdag_test_utils::{ScriptedApi, init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

pub const HISTORY: &str = "h1";

/// Collection over `api` for [`HISTORY`], without paging.
pub fn collection(api: &Arc<ScriptedApi>) -> ControlledFetchCollection {
    ControlledFetchCollection::new(api.clone(), FetchFilter::new(HISTORY))
}

pub fn ids(records: &[histdag::content::ContentRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}
