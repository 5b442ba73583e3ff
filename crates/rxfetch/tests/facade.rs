//! End-to-end behavior of facade operations against a scripted engine.

use std::sync::{Arc, Mutex};
use std::thread;

use futures_util::StreamExt;
use rxfetch::{
    Download, FetchConfiguration, FetchError, FetchModule, Outcome, Priority, RejectReason,
    Request, RequestInfo, RxFetch, Status,
};
use rxfetch_testkit::ScriptedEngine;
use tokio_test::{assert_pending, assert_ready_eq, task};

fn facade(namespace: &str) -> (RxFetch, Arc<ScriptedEngine>) {
    let engine = ScriptedEngine::shared(namespace);
    let fetch = RxFetch::new(
        FetchConfiguration::new(namespace),
        FetchModule::new(engine.clone()),
    );
    (fetch, engine)
}

fn request(n: u32) -> Request {
    Request::new(format!("https://cdn.test/{n}.bin"), format!("/tmp/{n}.bin"))
}

type Seen<T> = Arc<Mutex<Vec<Outcome<T>>>>;

fn collect<T: Send + 'static>() -> (Seen<T>, impl FnOnce(Outcome<T>) + Send + 'static) {
    let seen: Seen<T> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |outcome| sink.lock().unwrap().push(outcome))
}

#[tokio::test]
async fn test_enqueue_yields_one_element_via_both_views() {
    let (fetch, _engine) = facade("media");
    let bridge = fetch.enqueue(request(1));

    let pushed = bridge.observable().await.unwrap();
    assert_eq!(pushed.url, "https://cdn.test/1.bin");
    assert_eq!(pushed.namespace, "media");
    assert_eq!(pushed.id, request(1).id());

    let pulled: Vec<Outcome<Download>> = bridge.flowable().collect().await;
    assert_eq!(pulled, vec![Ok(pushed)]);
}

#[tokio::test]
async fn test_closed_instance_fails_every_view() {
    let (fetch, engine) = facade("media");
    fetch.close();
    assert!(fetch.is_closed());

    let bridge = fetch.enqueue(request(1));
    let expected = Err(FetchError::instance_closed("media"));

    assert_eq!(bridge.observable().await, expected);
    let pulled: Vec<Outcome<Download>> = bridge.flowable().collect().await;
    assert_eq!(pulled, vec![expected]);

    let bulk = fetch.cancel_all().observable().await;
    assert!(bulk.unwrap_err().is_instance_closed());
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_batch_with_duplicate_fails_whole_batch() {
    let (fetch, engine) = facade("media");
    fetch.enqueue(request(2)).observable().await.unwrap();

    let batch = fetch.enqueue_all(vec![request(1), request(2), request(3)]);
    let pulled: Vec<Outcome<Vec<Download>>> = batch.flowable().collect().await;

    assert_eq!(pulled.len(), 1);
    let error = pulled[0].clone().unwrap_err();
    assert_eq!(
        error.reject_reason(),
        Some(RejectReason::RequestAlreadyExists)
    );
    assert!(engine.downloads().len() >= 2);
}

#[tokio::test]
async fn test_batch_all_accepted() {
    let (fetch, _engine) = facade("media");
    let downloads = fetch
        .enqueue_all(vec![request(1), request(2), request(3)])
        .observable()
        .await
        .unwrap();

    let ids: Vec<_> = downloads.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![request(1).id(), request(2).id(), request(3).id()]);
}

#[test]
fn test_late_flowable_subscriber_delivers_on_demand() {
    let (fetch, _engine) = facade("media");
    let bridge = fetch.has_active_downloads(false);
    assert!(bridge.is_resolved());

    let (seen, subscriber) = collect();
    let subscription = bridge.flowable().subscribe(subscriber);
    assert!(seen.lock().unwrap().is_empty());

    subscription.request(1);
    assert_eq!(*seen.lock().unwrap(), vec![Ok(false)]);
}

#[test]
fn test_cancelled_subscriber_does_not_affect_others() {
    let (fetch, engine) = facade("media");
    engine.set_deferred(true);
    let bridge = fetch.enqueue(request(7));

    let (dropped, first) = collect();
    let (kept, second) = collect();
    let cancelled = bridge.observable().subscribe(first);
    bridge.observable().subscribe(second);

    assert!(cancelled.cancel());
    engine.flush();

    assert!(dropped.lock().unwrap().is_empty());
    assert_eq!(kept.lock().unwrap().len(), 1);
}

#[test]
fn test_observer_runs_on_resolving_engine_thread() {
    let (fetch, engine) = facade("media");
    engine.set_deferred(true);

    let delivered_on = Arc::new(Mutex::new(None));
    let sink = delivered_on.clone();
    fetch.enqueue(request(4)).observable().subscribe(move |outcome| {
        assert!(outcome.is_ok());
        *sink.lock().unwrap() = Some(thread::current().id());
    });
    assert!(delivered_on.lock().unwrap().is_none());

    let worker = engine.flush_on_thread();
    let engine_thread = worker.thread().id();
    assert_eq!(worker.join().unwrap(), 1);

    assert_eq!(*delivered_on.lock().unwrap(), Some(engine_thread));
    assert_ne!(engine_thread, thread::current().id());
}

#[test]
fn test_stream_resolves_from_engine_thread() {
    let (fetch, engine) = facade("media");
    engine.set_deferred(true);

    let mut stream = task::spawn(fetch.get_downloads().flowable());
    assert_pending!(stream.poll_next());

    assert_eq!(engine.flush_on_thread().join().unwrap(), 1);
    assert!(stream.is_woken());
    assert_ready_eq!(stream.poll_next(), Some(Ok(Vec::new())));
    assert_ready_eq!(stream.poll_next(), None);
}

#[tokio::test]
async fn test_engine_failure_reaches_subscriber() {
    let (fetch, engine) = facade("media");
    engine.fail_next(FetchError::engine("database locked"));

    let outcome = fetch.get_downloads().observable().await;
    assert_eq!(outcome, Err(FetchError::engine("database locked")));
}

#[tokio::test]
async fn test_queries_filter_by_group_and_status() {
    let (fetch, _engine) = facade("media");
    fetch
        .enqueue_all(vec![
            request(1).with_group(5),
            request(2).with_group(5),
            request(3).with_group(6),
        ])
        .observable()
        .await
        .unwrap();

    let paused = fetch.pause_group(5).observable().await.unwrap();
    assert_eq!(paused.len(), 2);

    let group = fetch.get_downloads_in_group(5).observable().await.unwrap();
    assert!(group.iter().all(|d| d.status == Status::Paused));

    let queued = fetch
        .get_downloads_with_status(vec![Status::Queued])
        .observable()
        .await
        .unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].group, 6);

    let none = fetch
        .get_downloads_in_group_with_status(6, vec![Status::Paused])
        .observable()
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_update_request_and_lookup() {
    let (fetch, _engine) = facade("media");
    let download = fetch.enqueue(request(1)).observable().await.unwrap();

    let info = RequestInfo {
        priority: Some(Priority::High),
        tag: Some(Some("nightly".to_string())),
        ..RequestInfo::default()
    };
    let updated = fetch
        .update_request(download.id, info, true)
        .observable()
        .await
        .unwrap();
    assert_eq!(updated.priority, Priority::High);

    let fetched = fetch.get_download(download.id).observable().await.unwrap();
    assert_eq!(fetched.tag.as_deref(), Some("nightly"));

    let missing = fetch.update_request(-1, RequestInfo::default(), false);
    assert!(matches!(
        missing.observable().await,
        Err(FetchError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_delete_all_empties_engine() {
    let (fetch, engine) = facade("media");
    fetch
        .enqueue_all(vec![request(1), request(2)])
        .observable()
        .await
        .unwrap();
    assert!(fetch.has_active_downloads(false).observable().await.unwrap());

    let deleted = fetch.delete_all().observable().await.unwrap();
    assert!(deleted.iter().all(|d| d.status == Status::Deleted));
    assert!(engine.downloads().is_empty());
    assert!(!fetch.has_active_downloads(true).observable().await.unwrap());
}
