use async_state::{Async, State};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

#[derive(Clone, Debug, PartialEq, Default)]
pub struct TestState {
    pub num: Async<u64>,
    pub text: Async<String>,
}

impl State for TestState {}

impl TestState {
    pub fn set_num(self, async_data: Async<u64>) -> Self {
        Self {
            num: async_data,
            ..self
        }
    }

    pub fn set_text(self, async_data: Async<String>) -> Self {
        Self {
            text: async_data,
            ..self
        }
    }
}

#[allow(dead_code)]
pub async fn receive<P>(received: &mut UnboundedReceiver<P>, count: usize) -> Vec<P> {
    let mut values = Vec::with_capacity(count);
    while values.len() < count {
        match timeout(Duration::from_secs(2), received.recv()).await {
            Ok(Some(value)) => values.push(value),
            _ => break,
        }
    }
    values
}
