//! Remote DynamoDB error decoding.
//!
//! DynamoDB error responses are JSON bodies with a `__type` field holding the
//! fully-qualified error type name (`com.amazonaws.dynamodb.v20120810#Code`)
//! and a `message` (or `Message`) field. The mapper never raises these errors
//! itself; a transport decodes them so callers can tell a failed
//! compare-and-swap guard apart from every other failure.

use std::fmt;

use serde::Deserialize;

/// DynamoDB error codes a write path can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum DynamoDBErrorCode {
    /// Condition expression evaluated to false.
    ConditionalCheckFailedException,
    /// Table not found.
    ResourceNotFoundException,
    /// Write throttled by the table's provisioned capacity.
    ProvisionedThroughputExceededException,
    /// Request limit exceeded.
    RequestLimitExceeded,
    /// Validation error.
    #[default]
    ValidationException,
    /// Internal server error.
    InternalServerError,
    /// Any code this crate does not model.
    Unknown,
}

impl DynamoDBErrorCode {
    /// Parse a `__type` value, with or without its namespace prefix.
    #[must_use]
    pub fn from_type(error_type: &str) -> Self {
        let code = error_type.rsplit('#').next().unwrap_or(error_type);
        match code {
            "ConditionalCheckFailedException" => Self::ConditionalCheckFailedException,
            "ResourceNotFoundException" => Self::ResourceNotFoundException,
            "ProvisionedThroughputExceededException" => {
                Self::ProvisionedThroughputExceededException
            }
            "RequestLimitExceeded" => Self::RequestLimitExceeded,
            "ValidationException" => Self::ValidationException,
            "InternalServerError" => Self::InternalServerError,
            _ => Self::Unknown,
        }
    }

    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConditionalCheckFailedException => "ConditionalCheckFailedException",
            Self::ResourceNotFoundException => "ResourceNotFoundException",
            Self::ProvisionedThroughputExceededException => {
                "ProvisionedThroughputExceededException"
            }
            Self::RequestLimitExceeded => "RequestLimitExceeded",
            Self::ValidationException => "ValidationException",
            Self::InternalServerError => "InternalServerError",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DynamoDBErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded DynamoDB error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDBError {
    /// The error code.
    pub code: DynamoDBErrorCode,
    /// The raw `__type` string as sent by the service.
    pub error_type: String,
    /// A human-readable error message.
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

impl DynamoDBError {
    /// Decode an error response body.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let body: ErrorBody = serde_json::from_slice(body)?;
        Ok(Self {
            code: DynamoDBErrorCode::from_type(&body.error_type),
            error_type: body.error_type,
            message: body.message,
        })
    }

    /// `true` when the service rejected a conditional write because the item
    /// no longer matched the guard. Callers treat this as "refresh and retry".
    #[must_use]
    pub fn is_conditional_check_failed(&self) -> bool {
        self.code == DynamoDBErrorCode::ConditionalCheckFailedException
    }
}

impl fmt::Display for DynamoDBError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DynamoDBError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for DynamoDBError {}
