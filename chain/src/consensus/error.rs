use std::fmt;

/// Error type returned when a block fails validation.
#[derive(Debug)]
pub enum ValidationError {
    /// Block is invalid according to a validity predicate.
    Invalid(&'static str),
    /// Block is invalid with a dynamic error message.
    Custom(String),
}

/// High-level errors that can occur in the consensus engine.
#[derive(Debug)]
pub enum ConsensusError {
    /// Underlying validation failure.
    Validation(ValidationError),
    /// Storage-related failure, e.g. a row that cannot be written.
    Storage(String),
    /// The engine was asked to act on a chain state it cannot see,
    /// e.g. assembling a candidate with no tip.
    MissingParent,
    /// Catch-all for other issues.
    Other(String),
}

impl From<ValidationError> for ConsensusError {
    fn from(e: ValidationError) -> Self {
        ConsensusError::Validation(e)
    }
}

impl From<crate::storage::StorageError> for ConsensusError {
    fn from(e: crate::storage::StorageError) -> Self {
        ConsensusError::Storage(e.to_string())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Invalid(msg) => write!(f, "invalid block: {msg}"),
            ValidationError::Custom(msg) => write!(f, "invalid block: {msg}"),
        }
    }
}

impl fmt::Display for ConsensusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsensusError::Validation(e) => write!(f, "{e}"),
            ConsensusError::Storage(msg) => write!(f, "storage error: {msg}"),
            ConsensusError::MissingParent => write!(f, "no parent block available"),
            ConsensusError::Other(msg) => write!(f, "consensus error: {msg}"),
        }
    }
}

impl std::error::Error for ValidationError {}
impl std::error::Error for ConsensusError {}
