use crate::Async;

/// Classifies a raw outcome into a lifecycle value.
///
/// Implemented for `Result` and `Option`, the two shapes a computation
/// reports success or failure with. Bridges that accept raw results are
/// generic over this trait.
pub trait ExecutionResult<T> {
    fn into_async(self) -> Async<T>;
}

impl<T, E> ExecutionResult<T> for Result<T, E>
where
    E: ToString,
{
    fn into_async(self) -> Async<T> {
        match self {
            Ok(value) => Async::success(value),
            Err(error) => Async::fail_with_message(error.to_string()),
        }
    }
}

impl<T> ExecutionResult<T> for Option<T> {
    fn into_async(self) -> Async<T> {
        match self {
            Some(value) => Async::success(value),
            None => Async::fail_with_none(),
        }
    }
}
