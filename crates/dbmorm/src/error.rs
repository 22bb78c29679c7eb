//! Error types for dbmorm

use thiserror::Error;

/// Result type alias for dbmorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// The driver rejected the credentials or could not reach the data source
    #[error("Connection error: {0}")]
    Connection(String),

    /// The driver rejected the statement text
    #[error("Prepare error: {0}")]
    Prepare(String),

    /// Bind or execute failure, including a malformed insert batch
    #[error("Execution error: {0}")]
    Execution(String),

    /// Generated-key retrieval failure
    #[error("Processor error: {0}")]
    Processor(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Create a processor error
    pub fn processor(message: impl Into<String>) -> Self {
        Self::Processor(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is a prepare error
    pub fn is_prepare(&self) -> bool {
        matches!(self, Self::Prepare(_))
    }

    /// Check if this is an execution error
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }
}

impl From<tokio::task::JoinError> for OrmError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Other(format!("driver task failed: {err}"))
    }
}

#[cfg(feature = "odbc")]
impl OrmError {
    /// Map an `odbc-api` error raised while connecting.
    pub fn from_connect_error(err: odbc_api::Error) -> Self {
        Self::Connection(err.to_string())
    }

    /// Map an `odbc-api` error raised while preparing a statement.
    pub fn from_prepare_error(err: odbc_api::Error) -> Self {
        Self::Prepare(err.to_string())
    }

    /// Map an `odbc-api` error raised while binding, executing or fetching.
    pub fn from_driver_error(err: odbc_api::Error) -> Self {
        Self::Execution(err.to_string())
    }
}
