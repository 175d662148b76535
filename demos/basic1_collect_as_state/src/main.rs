use crate::tracing_setup::tracing_init;
use async_state::{Async, AsyncError, AsyncStreamExt, Scope, State, StateStore};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

mod tracing_setup;

#[derive(Debug, Clone, Default, PartialEq)]
struct Feed {
    headline: Async<String>,
}

impl State for Feed {}

impl Feed {
    fn set_headline(self, headline: Async<String>) -> Self {
        Self { headline, ..self }
    }
}

fn headlines(fail_at: Option<usize>) -> impl futures::Stream<Item = Result<String, AsyncError>> {
    stream::iter(["foo", "foo", "bar", "baz"])
        .enumerate()
        .then(move |(index, headline)| async move {
            sleep(Duration::from_millis(100)).await;
            if Some(index) == fail_at {
                Err(AsyncError::error("feed connection reset"))
            } else {
                Ok(headline.to_string())
            }
        })
}

#[tokio::main]
async fn main() {
    tracing_init();

    info!("==========================================");
    warn!("example: collect_as_state");

    let store = StateStore::new(Feed::default());
    let scope = Scope::new();
    let subscription = store.select_subscribe(
        &scope,
        |state: &Feed| state.headline.clone(),
        |headline| info!("  Main thread | show headline: {:?}", headline),
    );

    let bridge = store.collect_as_state(&scope, headlines(None), |state, headline| {
        debug!("Worker thread | update headline: {:?}", headline);
        state.set_headline(headline)
    });
    if let Err(error) = bridge.join().await {
        warn!("bridge failed: {}", error);
    }
    sleep(Duration::from_millis(50)).await;
    subscription.cancel();

    info!("==========================================");
    warn!("example: collect_as_state with upstream error");

    let store = StateStore::new(Feed::default());
    let subscription = store.select_subscribe(
        &scope,
        |state: &Feed| state.headline.clone(),
        |headline| info!("  Main thread | show headline: {:?}", headline),
    );
    let bridge = store.collect_as_state(&scope, headlines(Some(2)), |state, headline| {
        state.set_headline(headline)
    });
    if let Err(error) = bridge.join().await {
        warn!("bridge failed: {}", error);
    }
    sleep(Duration::from_millis(50)).await;
    subscription.cancel();

    info!("==========================================");
    warn!("example: collect_reduce_as_state from Option items");

    let store = StateStore::new(Feed::default());
    let lookups = stream::iter([Some("found"), None, Some("found again")])
        .map(|item| item.map(str::to_string))
        .fallible::<AsyncError>();
    let bridge = store.collect_reduce_as_state_from(
        &scope,
        lookups,
        Some(Async::success("initial state".to_string())),
        |state, headline| {
            info!("  Main thread | reduce headline: {:?}", headline);
            state.set_headline(headline)
        },
    );
    if let Err(error) = bridge.join().await {
        warn!("bridge failed: {}", error);
    }
    info!("  Main thread | final state: {:?}", store.get_state());
}
