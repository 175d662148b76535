//! Reducer store that tracks the lifecycle of asynchronous work.
//!
//! A [`StateStore`] owns one application state value. Hosts change it with
//! pure reducers, observe slices of it with
//! [`StateStore::select_subscribe`], and hand it asynchronous computations
//! through the bridge operators (`collect_*_as_state`, `reduce_as_state`,
//! `catch_as_state`, `launch_as_state`, `execute_blocking_as_state`), which
//! record each computation's progress as an [`Async`] value.
//!
//! All concurrent work runs in an explicit [`Scope`]; cancelling it stops
//! the bridges and subscriptions launched there.

mod async_error;
mod async_value;
mod bridges;
mod execution_result;
mod scope;
mod scoped_future;
mod select;
mod state_store;
mod stream_ext;

#[cfg(test)]
mod unit_tests;

pub use async_error::*;
pub use async_value::*;
pub use execution_result::*;
pub use scope::*;
pub use scoped_future::*;
pub use state_store::*;
pub use stream_ext::*;

/// Marker for types that can live in a [`StateStore`].
pub trait State: Clone + Send + Sync + 'static {}
