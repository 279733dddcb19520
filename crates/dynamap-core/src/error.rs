//! Error types for the mapper.

use crate::codec::EncodingError;
use crate::expression::ConditionError;
use crate::schema::SchemaError;

/// Any error the mapper reports.
#[derive(Debug, thiserror::Error)]
pub enum DynamapError {
    /// A condition could not be built.
    #[error(transparent)]
    Condition(#[from] ConditionError),

    /// A value could not be encoded or decoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// A model is invalid or could not be registered.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Convenience result type for mapper operations.
pub type DynamapResult<T> = Result<T, DynamapError>;
