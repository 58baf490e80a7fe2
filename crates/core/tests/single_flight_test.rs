//! Concurrent trigger tests for the single-flight guard.
//!
//! Many triggers fire at the same instant (auto-submit, a confirm button and
//! repeated taps); only one may reach the authorization service.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use tokio::sync::{Barrier, Notify};

use pingate_core::pin::SingleFlightGuard;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_triggers_collapse_to_one_call() {
    const TRIGGERS: usize = 32;

    let guard = SingleFlightGuard::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(TRIGGERS));
    let release = Arc::new(Notify::new());

    let handles: Vec<_> = (0..TRIGGERS)
        .map(|_| {
            let guard = guard.clone();
            let calls = Arc::clone(&calls);
            let barrier = Arc::clone(&barrier);
            let release = Arc::clone(&release);
            tokio::spawn(async move {
                barrier.wait().await;
                guard
                    .run(|| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        release.notified().await;
                    })
                    .await
                    .is_some()
            })
        })
        .collect();

    // Let every trigger attempt the latch before the winner finishes.
    while calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    release.notify_one();

    let winners = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!guard.is_held());
}

#[tokio::test]
async fn test_guard_reopens_for_manual_retry() {
    let guard = SingleFlightGuard::new();
    let calls = AtomicUsize::new(0);

    for _ in 0..3 {
        let outcome = guard
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("network error")
            })
            .await;
        assert_eq!(outcome, Some(Err("network error")));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(!guard.is_held());
}
