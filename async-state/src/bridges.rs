//! Operators that drive reducers from asynchronous computations.
//!
//! Every bridge follows the same sequence: the initial reducer (by default
//! `Loading` without progress) is applied synchronously before the call
//! returns, then a unit of work launched in the given scope applies one
//! reducer per element or outcome, in arrival order. Upstream failures
//! become exactly one `Fail`; cancellation applies nothing further.
//!
//! Streams are push sequences of `Result<X, E>`: an `Err` item is the
//! sequence's own terminal error, after which nothing else is polled. A
//! stream that panics while being polled is treated the same way. Use
//! [`AsyncStreamExt::fallible`](crate::AsyncStreamExt::fallible) for streams
//! that cannot fail.

use crate::{
    Async, AsyncError, AsyncStreamExt, ExecutionResult, Scope, ScopedFuture, State, StateStore,
    TaskHandle, TaskOutcome,
};
use futures::{FutureExt, Stream, StreamExt};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

fn default_initial_state<V>() -> Option<Async<V>> {
    Some(Async::loading(None))
}

impl<S: State> StateStore<S> {
    // A bridge launched in a cancelled scope applies nothing, initial state included.
    fn reduce_initial<V, U>(&self, scope: &Scope, initial_state: Option<Async<V>>, reducer: &U)
    where
        U: Fn(S, Async<V>) -> S,
    {
        if scope.is_cancelled() {
            debug!("bridge launched in a cancelled scope, initial state skipped");
            return;
        }
        if let Some(initial) = initial_state {
            self.set_state(|state| reducer(state, initial));
        }
    }

    fn collect_core<X, E, V, St, U, C>(
        &self,
        scope: &Scope,
        stream: St,
        initial_state: Option<Async<V>>,
        reducer: U,
        classify: C,
    ) -> TaskHandle
    where
        St: Stream<Item = Result<X, E>> + Send + 'static,
        X: Send + 'static,
        E: ToString + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
        C: Fn(X) -> Async<V> + Send + 'static,
    {
        self.reduce_initial(scope, initial_state, &reducer);
        debug!("collect | bridge started");
        let store = self.clone();
        scope.launch_with(move |token| async move {
            // The first `Err` is the last item the upstream is polled for.
            let mut stream = std::pin::pin!(stream.stop_if(Result::is_err));
            loop {
                let next = AssertUnwindSafe(stream.next()).catch_unwind().await;
                let (async_value, poisoned) = match next {
                    Ok(None) => return TaskOutcome::Completed,
                    Ok(Some(Ok(element))) => (classify(element), false),
                    Ok(Some(Err(error))) => {
                        let error = AsyncError::error(error);
                        warn!(%error, "collect | upstream stream failed");
                        (Async::fail(error), false)
                    }
                    Err(payload) => {
                        let error = AsyncError::from_panic(payload);
                        warn!(%error, "collect | upstream stream panicked");
                        (Async::fail(error), true)
                    }
                };
                if token.is_cancelled() {
                    debug!("collect | cancelled, element discarded");
                    return TaskOutcome::Cancelled;
                }
                trace!("collect | reducing element");
                store.set_state(|state| reducer(state, async_value));
                if poisoned {
                    return TaskOutcome::Completed;
                }
            }
        })
    }

    fn await_core<T, V, U, C>(
        &self,
        scoped: ScopedFuture<T>,
        initial_state: Option<Async<V>>,
        reducer: U,
        classify: C,
    ) -> TaskHandle
    where
        T: Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
        C: FnOnce(T) -> Async<V> + Send + 'static,
    {
        let (scope, deferred) = scoped.into_parts();
        self.reduce_initial(&scope, initial_state, &reducer);
        debug!("await | bridge started");
        let store = self.clone();
        scope.launch_with(move |token| {
            // The bridge is the only consumer of the deferred result, so
            // stopping the bridge stops the computation as well.
            let computation_guard = deferred.cancel_on_drop();
            async move {
                let _computation_guard = computation_guard;
                let async_value = match deferred.await {
                    Ok(value) => classify(value),
                    Err(AsyncError::Cancelled) => {
                        debug!("await | computation cancelled, no outcome applied");
                        return TaskOutcome::Cancelled;
                    }
                    Err(error) => {
                        warn!(%error, "await | computation failed");
                        Async::fail(error)
                    }
                };
                if token.is_cancelled() {
                    debug!("await | cancelled, outcome discarded");
                    return TaskOutcome::Cancelled;
                }
                store.set_state(move |state| reducer(state, async_value));
                TaskOutcome::Completed
            }
        })
    }

    /// Reduces every lifecycle value pushed by `stream`, after an initial
    /// `Loading`.
    pub fn collect_async_as_state<V, E, St, U>(
        &self,
        scope: &Scope,
        stream: St,
        reducer: U,
    ) -> TaskHandle
    where
        St: Stream<Item = Result<Async<V>, E>> + Send + 'static,
        E: ToString + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        self.collect_async_as_state_from(scope, stream, default_initial_state(), reducer)
    }

    /// [`StateStore::collect_async_as_state`] with an explicit initial value;
    /// `None` skips the initial reducer.
    pub fn collect_async_as_state_from<V, E, St, U>(
        &self,
        scope: &Scope,
        stream: St,
        initial_state: Option<Async<V>>,
        reducer: U,
    ) -> TaskHandle
    where
        St: Stream<Item = Result<Async<V>, E>> + Send + 'static,
        E: ToString + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        self.collect_core(scope, stream, initial_state, reducer, |element: Async<V>| element)
    }

    /// Classifies each raw result pushed by `stream` into `Success` or
    /// `Fail`. A failed element does not end the bridge; only the stream's
    /// own error does.
    pub fn collect_reduce_as_state<V, R, E, St, U>(
        &self,
        scope: &Scope,
        stream: St,
        reducer: U,
    ) -> TaskHandle
    where
        St: Stream<Item = Result<R, E>> + Send + 'static,
        R: ExecutionResult<V> + Send + 'static,
        E: ToString + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        self.collect_reduce_as_state_from(scope, stream, default_initial_state(), reducer)
    }

    pub fn collect_reduce_as_state_from<V, R, E, St, U>(
        &self,
        scope: &Scope,
        stream: St,
        initial_state: Option<Async<V>>,
        reducer: U,
    ) -> TaskHandle
    where
        St: Stream<Item = Result<R, E>> + Send + 'static,
        R: ExecutionResult<V> + Send + 'static,
        E: ToString + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        self.collect_core(scope, stream, initial_state, reducer, |element: R| element.into_async())
    }

    /// Reduces every value pushed by `stream` as `Success`.
    pub fn collect_as_state<V, E, St, U>(&self, scope: &Scope, stream: St, reducer: U) -> TaskHandle
    where
        St: Stream<Item = Result<V, E>> + Send + 'static,
        E: ToString + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        self.collect_as_state_from(scope, stream, default_initial_state(), reducer)
    }

    pub fn collect_as_state_from<V, E, St, U>(
        &self,
        scope: &Scope,
        stream: St,
        initial_state: Option<Async<V>>,
        reducer: U,
    ) -> TaskHandle
    where
        St: Stream<Item = Result<V, E>> + Send + 'static,
        E: ToString + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        self.collect_core(scope, stream, initial_state, reducer, Async::success)
    }

    /// Awaits a raw result and reduces it as `Success` or `Fail`. The bridge
    /// runs in the scope paired with the pending result.
    pub fn reduce_as_state<V, R, U>(&self, scoped: ScopedFuture<R>, reducer: U) -> TaskHandle
    where
        R: ExecutionResult<V> + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        self.reduce_as_state_from(scoped, default_initial_state(), reducer)
    }

    pub fn reduce_as_state_from<V, R, U>(
        &self,
        scoped: ScopedFuture<R>,
        initial_state: Option<Async<V>>,
        reducer: U,
    ) -> TaskHandle
    where
        R: ExecutionResult<V> + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        self.await_core(scoped, initial_state, reducer, |result: R| result.into_async())
    }

    /// Awaits a plain value and reduces it as `Success`. A panic in the
    /// computation is reduced as `Fail`.
    pub fn catch_as_state<V, U>(&self, scoped: ScopedFuture<V>, reducer: U) -> TaskHandle
    where
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        self.catch_as_state_from(scoped, default_initial_state(), reducer)
    }

    pub fn catch_as_state_from<V, U>(
        &self,
        scoped: ScopedFuture<V>,
        initial_state: Option<Async<V>>,
        reducer: U,
    ) -> TaskHandle
    where
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        self.await_core(scoped, initial_state, reducer, Async::success)
    }

    /// Starts `computation` in `scope`, handing it the scope so it can launch
    /// nested work, and reduces its result.
    ///
    /// ```
    /// use async_state::{Async, Scope, State, StateStore};
    ///
    /// #[derive(Clone, Debug, Default)]
    /// struct Profile {
    ///     name: Async<String>,
    /// }
    ///
    /// impl State for Profile {}
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let store = StateStore::new(Profile::default());
    /// let scope = Scope::new();
    /// let handle = store.launch_as_state(
    ///     &scope,
    ///     |_scope| async { Ok::<_, String>("Ada".to_string()) },
    ///     |state, name| Profile { name, ..state },
    /// );
    /// assert!(store.get_state().name.is_loading());
    /// handle.join().await.unwrap();
    /// assert_eq!(store.get_state().name, Async::success("Ada".to_string()));
    /// # }
    /// ```
    pub fn launch_as_state<V, R, F, Fut, U>(
        &self,
        scope: &Scope,
        computation: F,
        reducer: U,
    ) -> TaskHandle
    where
        F: FnOnce(Scope) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
        R: ExecutionResult<V> + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        self.launch_as_state_from(scope, computation, default_initial_state(), reducer)
    }

    pub fn launch_as_state_from<V, R, F, Fut, U>(
        &self,
        scope: &Scope,
        computation: F,
        initial_state: Option<Async<V>>,
        reducer: U,
    ) -> TaskHandle
    where
        F: FnOnce(Scope) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
        R: ExecutionResult<V> + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        let scoped = scope.async_with_scope(computation(scope.clone()));
        self.reduce_as_state_from(scoped, initial_state, reducer)
    }

    /// Runs `computation` on the blocking pool and reduces its result. The
    /// closure receives a token that is cancelled with the bridge.
    pub fn execute_blocking_as_state<V, R, F, U>(
        &self,
        scope: &Scope,
        computation: F,
        reducer: U,
    ) -> TaskHandle
    where
        F: FnOnce(CancellationToken) -> R + Send + 'static,
        R: ExecutionResult<V> + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        self.execute_blocking_as_state_from(scope, computation, default_initial_state(), reducer)
    }

    pub fn execute_blocking_as_state_from<V, R, F, U>(
        &self,
        scope: &Scope,
        computation: F,
        initial_state: Option<Async<V>>,
        reducer: U,
    ) -> TaskHandle
    where
        F: FnOnce(CancellationToken) -> R + Send + 'static,
        R: ExecutionResult<V> + Send + 'static,
        V: Send + 'static,
        U: Fn(S, Async<V>) -> S + Send + 'static,
    {
        let scoped = ScopedFuture::new(scope.clone(), scope.deferred_blocking(computation));
        self.reduce_as_state_from(scoped, initial_state, reducer)
    }
}
