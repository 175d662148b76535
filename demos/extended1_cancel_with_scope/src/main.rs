use crate::tracing_setup::tracing_init;
use async_state::{Async, Scope, State, StateStore, TaskOutcome};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod tracing_setup;

#[derive(Debug, Clone, Default, PartialEq)]
struct Counter {
    num: Async<u64>,
}

impl State for Counter {}

fn heavy_computation(token: CancellationToken) -> Option<u64> {
    let mut total: u64 = 0;
    for i in 0..200_000_000_u64 {
        if i % 1_000_000 == 0 && token.is_cancelled() {
            debug!("Worker thread | computation observed cancellation");
            return None;
        }
        total = total.wrapping_add(1);
    }
    Some(total)
}

#[tokio::main]
async fn main() {
    tracing_init();

    info!("==========================================");
    warn!("example: launch_as_state cancelled with its scope");

    let store = StateStore::new(Counter::default());
    let observer = Scope::new();
    let _subscription = store.select_subscribe(
        &observer,
        |state: &Counter| state.num.clone(),
        |num| info!("  Main thread | show num: {:?}", num),
    );

    let scope = Scope::new();
    let bridge = store.launch_as_state(
        &scope,
        |inner| async move {
            let partial = inner.deferred(async {
                sleep(Duration::from_millis(500)).await;
                21_u64
            });
            partial.await.ok().map(|value| value * 2)
        },
        |state, num| Counter { num, ..state },
    );
    sleep(Duration::from_millis(100)).await;
    scope.cancel();
    match bridge.join().await {
        Ok(TaskOutcome::Cancelled) => {
            info!("  Main thread | bridge cancelled, state: {:?}", store.get_state())
        }
        other => warn!("unexpected bridge outcome: {:?}", other),
    }

    info!("==========================================");
    warn!("example: execute_blocking_as_state cancelled through its handle");

    let scope = Scope::new();
    let bridge = store.execute_blocking_as_state(&scope, heavy_computation, |state, num| {
        debug!("Worker thread | update num: {:?}", num);
        Counter { num, ..state }
    });
    sleep(Duration::from_millis(50)).await;
    bridge.cancel();
    match bridge.join().await {
        Ok(outcome) => info!("  Main thread | bridge outcome: {:?}", outcome),
        Err(error) => warn!("bridge failed: {}", error),
    }

    info!("==========================================");
    warn!("example: execute_blocking_as_state to completion");

    let bridge = store.execute_blocking_as_state(&scope, heavy_computation, |state, num| {
        Counter { num, ..state }
    });
    if let Err(error) = bridge.join().await {
        warn!("bridge failed: {}", error);
    }
    sleep(Duration::from_millis(50)).await;
    info!("  Main thread | final state: {:?}", store.get_state());
    observer.cancel();
}
