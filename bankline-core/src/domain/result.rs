//! Result and error types for the core library

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
///
/// Domain failures (`InvalidAmount`, `InsufficientFunds`, `UnknownAccountType`,
/// `AccountNotFound`) are always detected before any state is touched.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid amount: {0} (must be greater than zero)")]
    InvalidAmount(Decimal),

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Decimal, available: Decimal },

    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create an account not found error
    pub fn account_not_found(id: impl ToString) -> Self {
        Self::AccountNotFound(id.to_string())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// The kind of this error, for callers that map errors to statuses
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Error::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Error::UnknownAccountType(_) => ErrorKind::UnknownAccountType,
            Error::AccountNotFound(_) => ErrorKind::AccountNotFound,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Database(_) => ErrorKind::Database,
            Error::Io(_) | Error::Json(_) | Error::Other(_) => ErrorKind::Internal,
        }
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced to transport layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidAmount,
    InsufficientFunds,
    UnknownAccountType,
    AccountNotFound,
    Validation,
    Conflict,
    Database,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidAmount => "invalid_amount",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::UnknownAccountType => "unknown_account_type",
            ErrorKind::AccountNotFound => "account_not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Database => "database",
            ErrorKind::Internal => "internal",
        }
    }

    /// HTTP-style status code for this kind
    ///
    /// Client mistakes map to 400, missing accounts to 404 and lost
    /// optimistic-version races to 409.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::InvalidAmount
            | ErrorKind::InsufficientFunds
            | ErrorKind::UnknownAccountType
            | ErrorKind::Validation => 400,
            ErrorKind::AccountNotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Database | ErrorKind::Internal => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error payload: kind plus human-readable message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for ErrorPayload {
    fn from(e: &Error) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Operation result envelope (for JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorPayload>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorPayload::from(error)),
        }
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_result_ok() {
        let result: OperationResult<i32> = OperationResult::ok(42);
        assert!(result.success);
        assert_eq!(result.data, Some(42));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_operation_result_fail_carries_kind() {
        let err = Error::InsufficientFunds {
            requested: Decimal::new(60, 0),
            available: Decimal::new(50, 0),
        };
        let result: OperationResult<i32> = OperationResult::fail(&err);
        assert!(!result.success);
        assert!(result.data.is_none());
        let payload = result.error.unwrap();
        assert_eq!(payload.kind, ErrorKind::InsufficientFunds);
        assert!(payload.message.contains("available 50"));
    }

    #[test]
    fn test_from_result() {
        let ok: Result<i32> = Ok(42);
        let result: OperationResult<i32> = ok.into();
        assert!(result.success);

        let err: Result<i32> = Err(Error::validation("bad input"));
        let result: OperationResult<i32> = err.into();
        assert!(!result.success);
        assert!(result.error.unwrap().message.contains("Validation error"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::InvalidAmount(Decimal::ZERO).kind().status_code(), 400);
        assert_eq!(Error::account_not_found("x").kind().status_code(), 404);
        assert_eq!(Error::conflict("stale").kind().status_code(), 409);
        assert_eq!(Error::database("boom").kind().status_code(), 500);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::UnknownAccountType).unwrap();
        assert_eq!(json, "\"unknown_account_type\"");
    }
}
