use crate::{Deferred, Scope};

/// A pending result together with the scope that owns it.
///
/// One-shot bridges launch their own unit of work in `scope`, so cancelling
/// that scope stops both the computation and the bridge waiting on it.
#[derive(Debug)]
pub struct ScopedFuture<T> {
    pub scope: Scope,
    pub deferred: Deferred<T>,
}

impl<T> ScopedFuture<T> {
    pub fn new(scope: Scope, deferred: Deferred<T>) -> Self {
        ScopedFuture { scope, deferred }
    }

    pub fn into_parts(self) -> (Scope, Deferred<T>) {
        (self.scope, self.deferred)
    }
}
