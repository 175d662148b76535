use async_state::{Scope, StateStore, TaskOutcome};
use crate::common::TestState;
use std::time::Instant;

mod common;

const LOOP_COUNT: u64 = 100;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_launch_loop() {
    let store = StateStore::new(TestState::default());
    let scope = Scope::new();
    let tick = Instant::now();
    for i in 0..LOOP_COUNT {
        let handle = store.launch_as_state(
            &scope,
            move |_scope| async move { Some(i) },
            |state, num| state.set_num(num),
        );
        assert_eq!(handle.join().await, Ok(TaskOutcome::Completed));
        assert_eq!(store.get_state().num.value(), Some(i));
    }
    let elapsed = tick.elapsed();
    println!("  Main thread | elapsed: {:?}", elapsed);
}
