use crate::State;
use futures_core::Stream;
use futures_signals::signal::{Mutable, MutableSignalCloned, SignalExt, SignalStream};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

type Watchers<S> = Vec<UnboundedSender<S>>;

/// Holder of the current application state.
///
/// Reads are lock-free clones of the latest value. Every update goes through
/// [`StateStore::set_state`], which serializes writers on one mutex and
/// publishes the new value to all watchers before releasing it, so updates
/// are applied in a single total order and none is lost.
///
/// Clones share the same cell.
#[derive(Clone)]
pub struct StateStore<S: State> {
    state: Mutable<S>,
    watchers: Arc<Mutex<Watchers<S>>>,
}

impl<S: State> StateStore<S> {
    pub fn new(initial_state: S) -> Self {
        StateStore {
            state: Mutable::new(initial_state),
            watchers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    // A reducer that panicked poisons the mutex without having touched the
    // state, so the guard is still valid.
    fn writer(&self) -> MutexGuard<'_, Watchers<S>> {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(&self, watchers: &mut Watchers<S>, next_state: S) {
        watchers.retain(|watcher| watcher.send(next_state.clone()).is_ok());
        self.state.set(next_state);
    }

    pub fn get_state(&self) -> S {
        self.state.get_cloned()
    }

    /// Runs `block` against a snapshot of the current state.
    pub fn with_state<V, F>(&self, block: F) -> V
    where
        F: FnOnce(&S) -> V,
    {
        block(&self.state.get_cloned())
    }

    /// Replaces the state with `reducer(current)`.
    ///
    /// The reducer runs synchronously while writers are held off, so it must
    /// not call back into this store. If it panics, the panic reaches the
    /// caller and the state keeps its previous value.
    pub fn set_state<F>(&self, reducer: F)
    where
        F: FnOnce(S) -> S,
    {
        let mut watchers = self.writer();
        let next_state = reducer(self.state.get_cloned());
        self.commit(&mut watchers, next_state);
    }

    /// Like [`StateStore::set_state`] for reducers that can refuse the
    /// transition. On `Err` nothing is committed.
    pub fn try_set_state<F, E>(&self, reducer: F) -> Result<(), E>
    where
        F: FnOnce(S) -> Result<S, E>,
    {
        let mut watchers = self.writer();
        let next_state = reducer(self.state.get_cloned())?;
        self.commit(&mut watchers, next_state);
        Ok(())
    }

    /// Ordered feed of every committed state, starting with the value
    /// current at the time of the call.
    pub fn changes(&self) -> StateChanges<S> {
        let mut watchers = self.writer();
        let (tx, rx) = unbounded_channel();
        let _ = tx.send(self.state.get_cloned());
        watchers.push(tx);
        StateChanges { rx }
    }

    /// Conflating view of the state: a slow reader skips straight to the
    /// newest value.
    pub fn to_signal(&self) -> MutableSignalCloned<S> {
        self.state.signal_cloned()
    }

    pub fn to_stream(&self) -> SignalStream<MutableSignalCloned<S>> {
        self.state.signal_cloned().to_stream()
    }
}

/// Stream returned by [`StateStore::changes`]. Ends once every handle to
/// the store is dropped.
#[derive(Debug)]
#[must_use = "Streams do nothing unless polled"]
pub struct StateChanges<S> {
    rx: UnboundedReceiver<S>,
}

impl<S> Stream for StateChanges<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
