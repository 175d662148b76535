use crate::{Async, State};
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::time::{sleep, timeout};

mod scope_test;

#[derive(Clone, Debug, PartialEq, Default)]
pub struct TestState {
    pub count: i32,
    pub data: Async<String>,
}

impl State for TestState {}

impl TestState {
    pub fn set_async_data(self, async_data: Async<String>) -> Self {
        Self {
            data: async_data,
            ..self
        }
    }

    pub fn add_count(self, value: i32) -> Self {
        Self {
            count: self.count + value,
            ..self
        }
    }

    pub fn set_count(self, count: i32) -> Self {
        Self { count, ..self }
    }
}

/// Callback for `select_subscribe` that forwards every delivery to the
/// returned receiver.
pub fn recorder<P: Send + 'static>() -> (impl FnMut(P) + Send + 'static, UnboundedReceiver<P>) {
    let (tx, rx) = unbounded_channel();
    (
        move |value| {
            let _ = tx.send(value);
        },
        rx,
    )
}

/// Waits for `count` deliveries, giving up after two seconds.
pub async fn take<P>(received: &mut UnboundedReceiver<P>, count: usize) -> Vec<P> {
    let mut values = Vec::with_capacity(count);
    while values.len() < count {
        match timeout(Duration::from_secs(2), received.recv()).await {
            Ok(Some(value)) => values.push(value),
            _ => break,
        }
    }
    values
}

pub async fn assert_no_more<P: Debug>(received: &mut UnboundedReceiver<P>) {
    sleep(Duration::from_millis(50)).await;
    if let Ok(value) = received.try_recv() {
        panic!("unexpected delivery: {:?}", value);
    }
}
