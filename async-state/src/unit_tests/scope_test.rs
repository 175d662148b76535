use crate::{AsyncError, Scope, ScopedFuture, TaskOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_launch_completes() {
    let scope = Scope::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();

    let handle = scope.launch(async move {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(handle.join().await, Ok(TaskOutcome::Completed));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancel_scope_cancels_all_units() {
    let scope = Scope::new();
    let first = scope.launch(sleep(Duration::from_secs(10)));
    let second = scope.launch(sleep(Duration::from_secs(10)));

    scope.cancel();

    assert!(scope.is_cancelled());
    assert!(first.is_cancelled());
    assert_eq!(first.join().await, Ok(TaskOutcome::Cancelled));
    assert_eq!(second.join().await, Ok(TaskOutcome::Cancelled));
}

#[tokio::test]
async fn test_cancel_handle_is_local_and_idempotent() {
    let scope = Scope::new();
    let cancelled = scope.launch(sleep(Duration::from_secs(10)));
    let survivor = scope.launch(sleep(Duration::from_millis(5)));

    cancelled.cancel();
    cancelled.cancel();

    assert!(!scope.is_cancelled());
    assert_eq!(cancelled.join().await, Ok(TaskOutcome::Cancelled));
    assert_eq!(survivor.join().await, Ok(TaskOutcome::Completed));
}

#[tokio::test]
async fn test_cancel_after_completion_does_nothing() {
    let scope = Scope::new();
    let handle = scope.launch(async {});
    sleep(Duration::from_millis(10)).await;

    assert!(handle.is_finished());
    handle.cancel();
    assert_eq!(handle.join().await, Ok(TaskOutcome::Completed));
}

#[tokio::test]
async fn test_child_scope() {
    let parent = Scope::new();
    let child = parent.child();
    let sibling = parent.child();

    child.cancel();
    assert!(!parent.is_cancelled());
    assert!(!sibling.is_cancelled());

    parent.cancel();
    assert!(sibling.is_cancelled());
    sibling.cancelled().await;
}

#[tokio::test]
async fn test_with_token_follows_external_token() {
    let token = CancellationToken::new();
    let scope = Scope::with_token(token.clone());
    let handle = scope.launch(sleep(Duration::from_secs(10)));

    token.cancel();

    assert!(scope.is_cancelled());
    assert_eq!(handle.join().await, Ok(TaskOutcome::Cancelled));
}

#[tokio::test]
async fn test_join_reports_panic() {
    let scope = Scope::new();
    let handle = scope.launch(async {
        panic!("unit exploded");
    });

    assert_eq!(
        handle.join().await,
        Err(AsyncError::Panicked("unit exploded".to_string()))
    );
}

#[tokio::test]
async fn test_deferred_value() {
    let scope = Scope::new();
    let deferred = scope.deferred(async {
        sleep(Duration::from_millis(1)).await;
        7
    });

    assert_eq!(deferred.await, Ok(7));
}

#[tokio::test]
async fn test_deferred_cancelled_with_scope() {
    let scope = Scope::new();
    let deferred = scope.deferred(async {
        sleep(Duration::from_secs(10)).await;
        7
    });

    scope.cancel();

    assert_eq!(deferred.await, Err(AsyncError::Cancelled));
}

#[tokio::test]
async fn test_deferred_cancel() {
    let scope = Scope::new();
    let deferred = scope.deferred(async {
        sleep(Duration::from_secs(10)).await;
        7
    });

    deferred.cancel();

    assert_eq!(deferred.await, Err(AsyncError::Cancelled));
    assert!(!scope.is_cancelled());
}

#[tokio::test]
async fn test_deferred_panic() {
    let scope = Scope::new();
    let deferred = scope.deferred(async {
        sleep(Duration::from_millis(1)).await;
        if scope_is_fine() {
            panic!("deferred exploded");
        }
        7
    });

    assert_eq!(
        deferred.await,
        Err(AsyncError::Panicked("deferred exploded".to_string()))
    );
}

fn scope_is_fine() -> bool {
    true
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_deferred_blocking() {
    let scope = Scope::new();

    let value = scope.deferred_blocking(|_token| {
        std::thread::sleep(Duration::from_millis(5));
        "done"
    });
    assert_eq!(value.await, Ok("done"));

    let panicked =
        scope.deferred_blocking(|_token| -> &'static str { panic!("blocking exploded") });
    assert_eq!(
        panicked.await,
        Err(AsyncError::Panicked("blocking exploded".to_string()))
    );
}

#[tokio::test]
async fn test_async_with_scope_pairs_the_scope() {
    let scope = Scope::new();
    let scoped: ScopedFuture<i32> = scope.async_with_scope(async { 3 });

    let (paired_scope, deferred) = scoped.into_parts();
    paired_scope.cancel();

    // The pairing shares the cancellation domain of the scope it was built from.
    assert!(scope.is_cancelled());
    let _ = deferred.await;
}
