mod common;
use crate::common::{
    HISTORY, ScriptedApi, TestResult, collection, ids, init_tracing, record, with_timeout,
};

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tokio::sync::Notify;

use histdag::collection::{ControlledFetchCollection, FetchFilter};
use histdag::content::Timestamp;
use histdag::errors::SyncError;

async fn wait_for_requests(api: &ScriptedApi, n: usize) {
    with_timeout(async {
        while api.request_count() < n {
            tokio::task::yield_now().await;
        }
    })
    .await
}

#[tokio::test]
async fn cursor_is_sent_as_since_on_next_refresh() -> TestResult {
    init_tracing();
    let api = Arc::new(
        ScriptedApi::new()
            .page(vec![record("a", 1, "running", 300), record("b", 2, "queued", 100)])
            .page(vec![]),
    );
    let coll = ControlledFetchCollection::new(
        api.clone(),
        FetchFilter::new(HISTORY).deleted(false).visible(true),
    );

    coll.refresh().await?;
    coll.refresh().await?;

    let requests = api.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].since, None);
    assert_eq!(requests[1].since, Some(Timestamp::from_micros(300)));
    for req in &requests {
        assert_eq!(req.history_id, HISTORY);
        assert_eq!(req.deleted, Some(false));
        assert_eq!(req.visible, Some(true));
    }
    Ok(())
}

#[tokio::test]
async fn empty_page_leaves_collection_unchanged() -> TestResult {
    let api = Arc::new(ScriptedApi::new().page(vec![record("a", 1, "ok", 5)]));
    let coll = collection(&api);

    coll.refresh().await?;
    let summary = coll.refresh().await?;

    assert!(!summary.changed());
    assert_eq!(summary.pages, 1);
    assert_eq!(ids(&coll.to_array()), vec!["a"]);
    Ok(())
}

#[tokio::test]
async fn concurrent_refreshes_share_one_request() -> TestResult {
    init_tracing();
    let gate = Arc::new(Notify::new());
    let api = Arc::new(
        ScriptedApi::new()
            .page(vec![record("a", 1, "ok", 1)])
            .gated(gate.clone()),
    );
    let coll = collection(&api);

    let first = tokio::spawn(coll.refresh());
    wait_for_requests(&api, 1).await;
    assert!(coll.is_refreshing());

    let second = coll.refresh();
    gate.notify_one();

    let a = first.await??;
    let b = second.await?;
    assert_eq!(a, b);
    assert_eq!(api.request_count(), 1);
    assert!(!coll.is_refreshing());

    // Once settled, the next refresh goes out on its own.
    gate.notify_one();
    coll.refresh().await?;
    assert_eq!(api.request_count(), 2);
    Ok(())
}

#[tokio::test]
async fn coalesced_callers_see_the_same_error() {
    let gate = Arc::new(Notify::new());
    let api = Arc::new(
        ScriptedApi::new()
            .error(SyncError::http_status(503, "busy"))
            .gated(gate.clone()),
    );
    let coll = collection(&api);

    let first = coll.refresh();
    let second = coll.refresh();
    gate.notify_one();
    let (a, b) = tokio::join!(first, second);

    assert_eq!(a, Err(SyncError::http_status(503, "busy")));
    assert_eq!(a, b);
    assert_eq!(api.request_count(), 1);
}

#[tokio::test]
async fn pages_until_short_page() -> TestResult {
    init_tracing();
    let api = Arc::new(
        ScriptedApi::new()
            .page(vec![record("a", 1, "ok", 1), record("b", 2, "ok", 1)])
            .page(vec![record("c", 3, "ok", 1), record("d", 4, "ok", 1)])
            .page(vec![record("e", 5, "ok", 1)]),
    );
    let coll =
        ControlledFetchCollection::with_page_size(api.clone(), FetchFilter::new(HISTORY), Some(2));

    let summary = coll.refresh().await?;

    assert_eq!(summary.pages, 3);
    assert_eq!(summary.merge.inserted, 5);
    let pages: Vec<_> = api.requests().iter().map(|f| (f.limit, f.offset)).collect();
    assert_eq!(pages, vec![(Some(2), Some(0)), (Some(2), Some(2)), (Some(2), Some(4))]);
    assert_eq!(ids(&coll.to_array()), vec!["a", "b", "c", "d", "e"]);
    Ok(())
}

#[tokio::test]
async fn failed_refresh_keeps_previous_contents() -> TestResult {
    init_tracing();
    let api = Arc::new(
        ScriptedApi::new()
            .page(vec![record("a", 1, "running", 10)])
            .error(SyncError::network("connection reset"))
            .error(SyncError::Decode("expected an array".into()))
            .page(vec![record("a", 1, "ok", 20)]),
    );
    let coll = collection(&api);

    coll.refresh().await?;

    let err = coll.refresh().await.unwrap_err();
    assert!(matches!(err, SyncError::Network { status: None, .. }));
    assert_eq!(ids(&coll.to_array()), vec!["a"]);

    let err = coll.refresh().await.unwrap_err();
    assert_eq!(err, SyncError::Decode("expected an array".into()));
    assert!(!coll.all_terminal());

    coll.refresh().await?;
    assert!(coll.all_terminal());
    assert_eq!(api.requests()[3].since, Some(Timestamp::from_micros(10)));
    Ok(())
}

#[tokio::test]
async fn fetch_does_not_merge() -> TestResult {
    let api = Arc::new(ScriptedApi::new().page(vec![record("a", 1, "ok", 1)]));
    let coll = collection(&api);

    let page = coll.fetch(FetchFilter::new(HISTORY).visible(true)).await?;

    assert_eq!(ids(&page), vec!["a"]);
    assert!(coll.is_empty());
    assert_eq!(api.requests()[0].visible, Some(true));
    Ok(())
}

#[tokio::test]
async fn abort_keeps_a_refresh_another_caller_awaits() -> TestResult {
    init_tracing();
    let gate = Arc::new(Notify::new());
    let api = Arc::new(
        ScriptedApi::new()
            .page(vec![record("a", 1, "ok", 2)])
            .gated(gate.clone()),
    );
    let coll = collection(&api);

    let waiting = tokio::spawn(coll.refresh());
    wait_for_requests(&api, 1).await;

    assert!(!coll.abort_inflight());
    assert!(coll.is_refreshing());

    // Still coalesces into the request the other caller is waiting on.
    let again = tokio::spawn(coll.refresh());
    tokio::task::yield_now().await;
    assert_eq!(api.request_count(), 1);

    gate.notify_one();
    let a = waiting.await??;
    let b = again.await??;
    assert_eq!(a, b);
    assert_eq!(api.request_count(), 1);
    assert_eq!(api.completed_count(), 1);
    assert!(!coll.is_refreshing());
    assert!(coll.all_terminal());
    Ok(())
}

#[tokio::test]
async fn abort_drops_a_refresh_nobody_awaits() -> TestResult {
    init_tracing();
    let gate = Arc::new(Notify::new());
    let api = Arc::new(
        ScriptedApi::new()
            .page(vec![record("a", 1, "ok", 2)])
            .gated(gate.clone()),
    );
    let coll = collection(&api);

    let abandoned = tokio::spawn(coll.refresh());
    wait_for_requests(&api, 1).await;
    abandoned.abort();
    assert!(abandoned.await.is_err());

    assert!(coll.abort_inflight());
    assert!(!coll.abort_inflight());
    assert!(!coll.is_refreshing());
    assert_eq!(api.completed_count(), 0);

    let next = tokio::spawn(coll.refresh());
    wait_for_requests(&api, 2).await;
    gate.notify_one();
    next.await??;

    assert_eq!(api.completed_count(), 1);
    assert!(!coll.is_refreshing());
    assert!(coll.all_terminal());
    Ok(())
}
