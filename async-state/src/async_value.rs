use crate::async_error::ABSENT_VALUE_MESSAGE;
use crate::{AsyncError, ExecutionResult};

/// Lifecycle of an asynchronous result.
///
/// A value is never mutated in place: a transition replaces the whole
/// `Async`, usually through a reducer handed to
/// [`StateStore::set_state`](crate::StateStore::set_state).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Async<T> {
    /// No computation has been started for this slot.
    Uninitialized,
    /// A computation is running. `progress` is advisory and expected in
    /// `[0.0, 1.0]`, but it is not checked.
    Loading { progress: Option<f32> },
    /// The computation completed with `value`.
    Success { value: T },
    /// The computation completed with `error`.
    Fail { error: AsyncError },
}

impl<T> Async<T> {
    pub fn loading(progress: Option<f32>) -> Self {
        Async::Loading { progress }
    }

    pub fn success(value: T) -> Self {
        Async::Success { value }
    }

    pub fn fail(error: AsyncError) -> Self {
        Async::Fail { error }
    }

    pub fn fail_with_message(message: impl Into<String>) -> Self {
        Async::Fail {
            error: AsyncError::Error(message.into()),
        }
    }

    pub fn fail_with_none() -> Self {
        Async::Fail {
            error: AsyncError::None,
        }
    }

    pub fn is_uninitialized(&self) -> bool {
        matches!(self, Async::Uninitialized)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Async::Loading { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Async::Success { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Async::Fail { .. })
    }

    /// True once a terminal value (`Success` or `Fail`) is held.
    pub fn is_complete(&self) -> bool {
        matches!(self, Async::Success { .. } | Async::Fail { .. })
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, Async::Uninitialized | Async::Loading { .. })
    }

    /// True when nothing is loaded and nothing is loading, or the last
    /// attempt failed.
    pub fn should_load(&self) -> bool {
        matches!(self, Async::Uninitialized | Async::Fail { .. })
    }

    pub fn value_ref(&self) -> Option<&T> {
        match self {
            Async::Success { value } => Some(value),
            _ => None,
        }
    }

    pub fn value(self) -> Option<T> {
        match self {
            Async::Success { value } => Some(value),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<f32> {
        match self {
            Async::Loading { progress } => *progress,
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AsyncError> {
        match self {
            Async::Fail { error } => Some(error),
            _ => None,
        }
    }

    /// Transforms the `Success` payload. Every other variant passes through
    /// with its progress or error intact.
    pub fn map<R, F>(self, transform: F) -> Async<R>
    where
        F: FnOnce(T) -> R,
    {
        match self {
            Async::Uninitialized => Async::Uninitialized,
            Async::Loading { progress } => Async::Loading { progress },
            Async::Success { value } => Async::Success {
                value: transform(value),
            },
            Async::Fail { error } => Async::Fail { error },
        }
    }

    /// Replaces a `Fail` with whatever `recover` builds from its error.
    pub fn or<F>(self, recover: F) -> Async<T>
    where
        F: FnOnce(AsyncError) -> Async<T>,
    {
        match self {
            Async::Fail { error } => recover(error),
            other => other,
        }
    }

    /// Returns the `Success` payload, or [`AsyncError::IllegalState`] for any
    /// other variant.
    pub fn unwrap(self) -> Result<T, AsyncError> {
        self.unwrap_with(ABSENT_VALUE_MESSAGE)
    }

    /// Like [`Async::unwrap`], with a caller supplied error message.
    pub fn unwrap_with(self, message: impl Into<String>) -> Result<T, AsyncError> {
        match self {
            Async::Success { value } => Ok(value),
            _ => Err(AsyncError::IllegalState(message.into())),
        }
    }
}

impl<T> Default for Async<T> {
    fn default() -> Self {
        Async::Uninitialized
    }
}

impl<T, E: ToString> From<Result<T, E>> for Async<T> {
    fn from(value: Result<T, E>) -> Self {
        value.into_async()
    }
}

impl<T> From<Option<T>> for Async<T> {
    fn from(value: Option<T>) -> Self {
        value.into_async()
    }
}
