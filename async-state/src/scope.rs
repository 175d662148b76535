use crate::{AsyncError, ScopedFuture};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error};

/// How a unit of work launched in a [`Scope`] ended.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TaskOutcome {
    Completed,
    Cancelled,
}

/// A cancellable domain of concurrent work.
///
/// Every unit launched here runs as a tokio task under a child of the
/// scope's [`CancellationToken`]. Cancelling the scope cancels all of them;
/// cancelling one [`TaskHandle`] only stops that unit. Cloning a scope
/// shares the same cancellation domain.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    token: CancellationToken,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing token, so work launched here is cancelled together
    /// with whatever else observes it.
    pub fn with_token(token: CancellationToken) -> Self {
        Scope { token }
    }

    /// A nested scope. Cancelling `self` cancels the child, not the reverse.
    pub fn child(&self) -> Scope {
        Scope {
            token: self.token.child_token(),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the scope is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Launches `future` as a unit of work owned by this scope.
    pub fn launch<F>(&self, future: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.launch_with(|_| async move {
            future.await;
            TaskOutcome::Completed
        })
    }

    /// Launches the future built by `work`, handing it the unit's own token
    /// so it can check for cancellation between steps. The future reports
    /// how it ended; a unit whose token was cancelled always ends
    /// `Cancelled`.
    pub(crate) fn launch_with<W, F>(&self, work: W) -> TaskHandle
    where
        W: FnOnce(CancellationToken) -> F,
        F: Future<Output = TaskOutcome> + Send + 'static,
    {
        let token = self.token.child_token();
        let unit = work(token.clone());
        let unit_token = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = unit_token.cancelled() => TaskOutcome::Cancelled,
                outcome = unit => {
                    if unit_token.is_cancelled() {
                        TaskOutcome::Cancelled
                    } else {
                        outcome
                    }
                }
            }
        });
        TaskHandle { token, handle }
    }

    /// Starts `future` in this scope and returns its pending result.
    pub fn deferred<T, F>(&self, future: F) -> Deferred<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let token = self.token.child_token();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => None,
                value = future => Some(value),
            }
        });
        Deferred { token, handle }
    }

    /// Runs `computation` on the blocking pool. The closure receives the
    /// deferred's token; a blocking call cannot be interrupted, so long
    /// computations should poll it.
    pub fn deferred_blocking<T, F>(&self, computation: F) -> Deferred<T>
    where
        T: Send + 'static,
        F: FnOnce(CancellationToken) -> T + Send + 'static,
    {
        let token = self.token.child_token();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let blocking = tokio::task::spawn_blocking({
                let token = task_token.clone();
                move || computation(token)
            });
            tokio::select! {
                biased;
                _ = task_token.cancelled() => None,
                joined = blocking => match joined {
                    Ok(value) => Some(value),
                    Err(join_error) if join_error.is_panic() => {
                        std::panic::resume_unwind(join_error.into_panic())
                    }
                    Err(_) => None,
                },
            }
        });
        Deferred { token, handle }
    }

    /// Starts `future` and pairs its pending result with this scope, so a
    /// bridge consuming it launches in the same cancellation domain.
    pub fn async_with_scope<T, F>(&self, future: F) -> ScopedFuture<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        ScopedFuture::new(self.clone(), self.deferred(future))
    }
}

/// Handle to a unit of work launched in a [`Scope`].
///
/// Dropping the handle detaches the unit; it keeps running until it
/// finishes or its scope is cancelled.
#[derive(Debug)]
pub struct TaskHandle {
    token: CancellationToken,
    handle: JoinHandle<TaskOutcome>,
}

impl TaskHandle {
    /// Stops the unit. Calling it again, or after the unit finished, does
    /// nothing.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the unit to end. A panic inside the unit, such as a
    /// reducer that panicked, is reported as [`AsyncError::Panicked`].
    pub async fn join(self) -> Result<TaskOutcome, AsyncError> {
        match self.handle.await {
            Ok(outcome) => Ok(outcome),
            Err(join_error) if join_error.is_panic() => {
                let error = AsyncError::from_panic(join_error.into_panic());
                error!(%error, "unit of work panicked");
                Err(error)
            }
            Err(_) => {
                debug!("unit of work aborted by the runtime");
                Ok(TaskOutcome::Cancelled)
            }
        }
    }
}

/// Pending result of work started with [`Scope::deferred`].
///
/// Awaiting yields the value, [`AsyncError::Cancelled`] if the work was
/// cancelled first, or [`AsyncError::Panicked`] if it panicked.
#[derive(Debug)]
#[must_use = "a deferred result is lost unless awaited"]
pub struct Deferred<T> {
    token: CancellationToken,
    handle: JoinHandle<Option<T>>,
}

impl<T> Deferred<T> {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub(crate) fn cancel_on_drop(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, AsyncError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(AsyncError::Cancelled),
            Err(join_error) if join_error.is_panic() => {
                Err(AsyncError::from_panic(join_error.into_panic()))
            }
            Err(_) => Err(AsyncError::Cancelled),
        })
    }
}
