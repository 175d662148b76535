use crate::{Scope, State, StateStore, TaskHandle, TaskOutcome};
use futures::StreamExt;
use tracing::trace;

impl<S: State> StateStore<S> {
    /// Calls `callback` with `projection(state)` whenever the projected value
    /// changes.
    ///
    /// The current projection is delivered first. After that a change to the
    /// state that leaves the projection equal to the last delivered value is
    /// skipped. Delivery runs as one unit of work in `scope`, so callbacks
    /// never overlap and arrive in the order the states were committed.
    pub fn select_subscribe<P, M, C>(&self, scope: &Scope, projection: M, callback: C) -> TaskHandle
    where
        P: PartialEq + Clone + Send + 'static,
        M: Fn(&S) -> P + Send + 'static,
        C: FnMut(P) + Send + 'static,
    {
        self.select_subscribe_with(
            scope,
            projection,
            |previous: &P, next: &P| previous == next,
            callback,
        )
    }

    /// [`StateStore::select_subscribe`] with a caller supplied `equality`
    /// deciding whether two projections count as the same value.
    pub fn select_subscribe_with<P, M, Q, C>(
        &self,
        scope: &Scope,
        projection: M,
        equality: Q,
        mut callback: C,
    ) -> TaskHandle
    where
        P: Clone + Send + 'static,
        M: Fn(&S) -> P + Send + 'static,
        Q: Fn(&P, &P) -> bool + Send + 'static,
        C: FnMut(P) + Send + 'static,
    {
        // Attach now, so the subscription observes every update issued after
        // this call returns.
        let mut changes = self.changes();
        scope.launch_with(move |token| async move {
            let mut last_delivered: Option<P> = None;
            while let Some(state) = changes.next().await {
                let selected = projection(&state);
                if last_delivered
                    .as_ref()
                    .is_some_and(|previous| equality(previous, &selected))
                {
                    continue;
                }
                if token.is_cancelled() {
                    return TaskOutcome::Cancelled;
                }
                trace!("select_subscribe | delivering changed projection");
                last_delivered = Some(selected.clone());
                callback(selected);
            }
            TaskOutcome::Completed
        })
    }
}
