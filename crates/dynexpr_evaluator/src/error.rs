//! Evaluation errors.

use dynexpr_types::FactoryError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("Object reference not set to an instance of an object")]
    NullReference,
    #[error("Nullable object must have a value")]
    NoValue,
    #[error("Arithmetic operation resulted in an overflow")]
    Overflow,
    #[error("Attempted to divide by zero")]
    DivideByZero,
    #[error("Index was outside the bounds of the array")]
    IndexOutOfRange,
    #[error("Sequence contains no elements")]
    EmptySequence,
    #[error("The string '{0}' was not in a correct format")]
    InvalidFormat(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unable to cast a value of type '{from}' to type '{to}'")]
    InvalidCast { from: String, to: String },
    #[error("Expected {expected} arguments, found {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("Member '{0}' has no value on this instance")]
    MissingMember(String),
    #[error("Host member '{name}' failed: {message}")]
    Host { name: String, message: String },
    #[error("'{0}' cannot be evaluated")]
    Unsupported(String),
    #[error(transparent)]
    Record(#[from] FactoryError),
}

pub type EvalResult<T> = Result<T, EvalError>;
