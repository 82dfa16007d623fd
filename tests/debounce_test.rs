//! Timing tests for the debouncer, run on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use formfield::Debouncer;
use parking_lot::Mutex;

fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> futures::future::BoxFuture<'static, ()>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let task = move |label: &'static str| {
        let sink = Arc::clone(&sink);
        let fut: futures::future::BoxFuture<'static, ()> = Box::pin(async move {
            sink.lock().push(label);
        });
        fut
    };
    (log, task)
}

#[tokio::test(start_paused = true)]
async fn test_only_last_schedule_runs() {
    let (log, task) = recorder();
    let debouncer = Debouncer::new(Duration::from_millis(300));

    debouncer.schedule(task("l"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    debouncer.schedule(task("lo"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    debouncer.schedule(task("log"));

    tokio::time::sleep(Duration::from_millis(299)).await;
    assert!(log.lock().is_empty());

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(*log.lock(), vec!["log"]);
    assert!(!debouncer.is_pending());
}

#[tokio::test(start_paused = true)]
async fn test_spaced_schedules_all_run() {
    let (log, task) = recorder();
    let debouncer = Debouncer::new(Duration::from_millis(50));

    debouncer.schedule(task("first"));
    tokio::time::sleep(Duration::from_millis(60)).await;
    debouncer.schedule(task("second"));
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(*log.lock(), vec!["first", "second"]);
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_pending_task() {
    let (log, task) = recorder();
    let debouncer = Debouncer::new(Duration::from_millis(50));
    debouncer.schedule(task("refresh"));
    drop(debouncer);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(log.lock().is_empty());
}
