//! Integration tests for the callback-to-stream bridge.

use std::io;
use std::sync::{Arc, Mutex};
use std::thread;

use futures_util::StreamExt;
use rxfetch_convert::{Convertible, Outcome};
use rxfetch_core::FetchError;
use tokio_test::task;
use tokio_test::{assert_pending, assert_ready, assert_ready_eq};

type Seen<T> = Arc<Mutex<Vec<Outcome<T>>>>;

fn seen<T>() -> Seen<T> {
    Arc::new(Mutex::new(Vec::new()))
}

fn record<T: Send + 'static>(sink: &Seen<T>) -> impl FnOnce(Outcome<T>) + Send + 'static {
    let sink = sink.clone();
    move |outcome| sink.lock().unwrap().push(outcome)
}

#[test]
fn test_observable_notified_on_resolution() {
    let (bridge, resolver) = Convertible::<String>::pending();
    let received = seen();

    bridge.observable().subscribe(record(&received));
    assert!(received.lock().unwrap().is_empty());

    assert!(resolver.succeed("file.bin".to_string()));
    assert_eq!(*received.lock().unwrap(), vec![Ok("file.bin".to_string())]);
}

#[test]
fn test_observable_replays_after_resolution() {
    let bridge = Convertible::succeeded(5u32);
    let received = seen();

    let subscription = bridge.observable().subscribe(record(&received));
    assert_eq!(*received.lock().unwrap(), vec![Ok(5)]);
    assert!(!subscription.cancel());
}

#[test]
fn test_both_views_see_same_failure() {
    let (bridge, resolver) = Convertible::<u32>::pending();
    let eager = seen();
    let pulled = seen();

    bridge.observable().subscribe(record(&eager));
    let flow = bridge.flowable().subscribe(record(&pulled));

    resolver.fail(FetchError::not_found("download 9"));
    flow.request(1);

    let expected: Vec<Outcome<u32>> = vec![Err(FetchError::not_found("download 9"))];
    assert_eq!(*eager.lock().unwrap(), expected);
    assert_eq!(*pulled.lock().unwrap(), expected);
}

#[test]
fn test_second_resolution_is_rejected() {
    let (bridge, resolver) = Convertible::<u32>::pending();
    let (on_success, on_failure) = resolver.callbacks();

    on_success(1);
    on_failure(FetchError::engine("should be ignored"));
    assert!(!resolver.succeed(2));

    let received = seen();
    bridge.observable().subscribe(record(&received));
    assert_eq!(*received.lock().unwrap(), vec![Ok(1)]);
}

#[test]
fn test_flowable_holds_until_demand() {
    let bridge = Convertible::succeeded(11u32);
    let received = seen();

    let subscription = bridge.flowable().subscribe(record(&received));
    assert!(received.lock().unwrap().is_empty());

    subscription.request(0);
    assert!(received.lock().unwrap().is_empty());

    subscription.request(1);
    assert_eq!(*received.lock().unwrap(), vec![Ok(11)]);
}

#[test]
fn test_flowable_demand_before_resolution() {
    let (bridge, resolver) = Convertible::<u32>::pending();
    let received = seen();

    let subscription = bridge.flowable().subscribe(record(&received));
    subscription.request(u64::MAX);
    assert!(received.lock().unwrap().is_empty());

    resolver.succeed(3);
    assert_eq!(*received.lock().unwrap(), vec![Ok(3)]);
}

#[test]
fn test_cancel_is_isolated_per_subscriber() {
    let (bridge, resolver) = Convertible::<u32>::pending();
    let cancelled = seen();
    let kept = seen();
    let cancelled_flow = seen();
    let kept_flow = seen();

    let first = bridge.observable().subscribe(record(&cancelled));
    bridge.observable().subscribe(record(&kept));
    let third = bridge.flowable().subscribe(record(&cancelled_flow));
    let fourth = bridge.flowable().subscribe(record(&kept_flow));

    assert!(first.cancel());
    assert!(third.cancel());
    resolver.succeed(8);
    third.request(1);
    fourth.request(1);

    assert!(cancelled.lock().unwrap().is_empty());
    assert!(cancelled_flow.lock().unwrap().is_empty());
    assert_eq!(*kept.lock().unwrap(), vec![Ok(8)]);
    assert_eq!(*kept_flow.lock().unwrap(), vec![Ok(8)]);
}

#[test]
fn test_dropped_flow_subscription_releases_subscriber() {
    let (bridge, resolver) = Convertible::<u32>::pending();
    let marker = Arc::new(());
    let held = marker.clone();

    let subscription = bridge.flowable().subscribe(move |_| drop(held));
    assert_eq!(Arc::strong_count(&marker), 2);

    drop(subscription);
    assert_eq!(Arc::strong_count(&marker), 1);

    let received = seen();
    let kept = bridge.flowable().subscribe(record(&received));
    resolver.succeed(6);
    kept.request(1);
    assert_eq!(*received.lock().unwrap(), vec![Ok(6)]);
}

#[test]
fn test_flowable_stream_yields_once() {
    let (bridge, resolver) = Convertible::<u32>::pending();
    let mut stream = task::spawn(bridge.flowable());

    assert_pending!(stream.poll_next());
    resolver.succeed(21);
    assert!(stream.is_woken());

    assert_ready_eq!(stream.poll_next(), Some(Ok(21)));
    assert_ready_eq!(stream.poll_next(), None);
}

#[test]
fn test_dropped_stream_does_not_affect_others() {
    let (bridge, resolver) = Convertible::<u32>::pending();
    let mut kept = task::spawn(bridge.flowable());
    let mut dropped = task::spawn(bridge.flowable());

    assert_pending!(kept.poll_next());
    assert_pending!(dropped.poll_next());
    drop(dropped);

    resolver.succeed(4);
    assert_ready_eq!(kept.poll_next(), Some(Ok(4)));
}

#[test]
fn test_observable_future_completes() {
    let (bridge, resolver) = Convertible::<u32>::pending();
    let mut fut = task::spawn(bridge.observable().into_future());

    assert_pending!(fut.poll());
    resolver.fail(FetchError::instance_closed("default"));
    let outcome = assert_ready!(fut.poll());
    assert!(outcome.unwrap_err().is_instance_closed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_resolution_from_another_thread() {
    let (bridge, resolver) = Convertible::<Vec<u32>>::pending();

    let worker = thread::spawn(move || {
        resolver.succeed(vec![1, 2, 3]);
    });

    let mut stream = bridge.flowable();
    let first = stream.next().await;
    assert_eq!(first, Some(Ok(vec![1, 2, 3])));
    assert_eq!(stream.next().await, None);
    assert_eq!(bridge.observable().await, Ok(vec![1, 2, 3]));

    worker.join().unwrap();
}

#[tokio::test]
async fn test_success_callback_with_conversion() {
    let (bridge, resolver) = Convertible::<u32>::pending();
    let on_success = resolver.success_callback_with(|found: Option<u32>| {
        found.ok_or_else(|| FetchError::not_found("missing"))
    });

    on_success(None);
    assert_eq!(
        bridge.observable().await,
        Err(FetchError::not_found("missing"))
    );
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn with_captured_logs(body: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, body);
    logs.contents()
}

#[test]
fn test_unobserved_failure_is_logged() {
    let logs = with_captured_logs(|| {
        let (bridge, resolver) = Convertible::<u32>::pending();
        resolver.fail(FetchError::engine("disk exploded"));
        drop(resolver);
        drop(bridge);
    });

    assert!(logs.contains("dropped without being observed"));
    assert!(logs.contains("disk exploded"));
}

#[test]
fn test_observed_failure_is_not_logged() {
    let logs = with_captured_logs(|| {
        let bridge = Convertible::<u32>::failed(FetchError::engine("seen"));
        bridge.observable().subscribe(|_| {});
    });

    assert!(!logs.contains("dropped without being observed"));
}
