use std::any::Any;
use thiserror::Error;

pub(crate) const ABSENT_VALUE_MESSAGE: &str = "required value was absent";

/// Errors carried by [`Async::Fail`](crate::Async::Fail) and returned by the
/// fallible operations of this crate.
///
/// Every upstream failure a bridge observes is flattened into one of these
/// variants, so a failed slot in the state always compares structurally.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsyncError {
    /// A general error with a message describing what went wrong.
    #[error("{0}")]
    Error(String),

    /// An operation returned None when a value was expected.
    #[error("Operation returned None!")]
    None,

    /// The computation or stream panicked; holds the panic message.
    #[error("computation panicked: {0}")]
    Panicked(String),

    /// The awaited work was cancelled before it produced a result.
    #[error("Task was cancelled!")]
    Cancelled,

    /// A value was requested from a lifecycle value that holds none.
    #[error("illegal state: {0}")]
    IllegalState(String),
}

impl AsyncError {
    /// Builds an [`AsyncError::Error`] from anything printable.
    pub fn error(message: impl ToString) -> Self {
        AsyncError::Error(message.to_string())
    }

    /// Returns true if this error is a general error with a message.
    pub fn is_error(&self) -> bool {
        matches!(self, AsyncError::Error(_))
    }

    /// Returns true if this error represents a None result.
    pub fn is_none(&self) -> bool {
        matches!(self, AsyncError::None)
    }

    pub fn is_panicked(&self) -> bool {
        matches!(self, AsyncError::Panicked(_))
    }

    /// Returns true if this error represents a cancelled operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AsyncError::Cancelled)
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, AsyncError::IllegalState(_))
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        AsyncError::Panicked(panic_message(payload.as_ref()))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(AsyncError::error("boom").is_error());
        assert!(AsyncError::None.is_none());
        assert!(AsyncError::Panicked("p".to_string()).is_panicked());
        assert!(AsyncError::Cancelled.is_cancelled());
        assert!(AsyncError::IllegalState("s".to_string()).is_illegal_state());
        assert!(!AsyncError::Cancelled.is_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(AsyncError::error("Connection failed").to_string(), "Connection failed");
        assert_eq!(AsyncError::None.to_string(), "Operation returned None!");
        assert_eq!(
            AsyncError::Panicked("oops".to_string()).to_string(),
            "computation panicked: oops"
        );
    }

    #[test]
    fn test_from_panic_payloads() {
        let static_str: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(
            AsyncError::from_panic(static_str),
            AsyncError::Panicked("static message".to_string())
        );

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(
            AsyncError::from_panic(owned),
            AsyncError::Panicked("owned message".to_string())
        );

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert!(AsyncError::from_panic(other).is_panicked());
    }
}
