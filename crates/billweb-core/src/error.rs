//! Error types for billweb-core
//!
//! Every error carries a programmatic code, a severity and a coarse kind. The
//! HTTP layer picks response statuses from the kind alone.

use billweb_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record not found
    RecordNotFound,
    /// Account not found
    AccountNotFound,
    /// Category not found
    CategoryNotFound,
    /// Validation error
    ValidationError,
    /// Storage or index failure
    StoreError,
    /// Stored data could not be encoded or decoded
    InvalidFormat,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::RecordNotFound => write!(f, "RECORD_NOT_FOUND"),
            ErrorCode::AccountNotFound => write!(f, "ACCOUNT_NOT_FOUND"),
            ErrorCode::CategoryNotFound => write!(f, "CATEGORY_NOT_FOUND"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::StoreError => write!(f, "STORE_ERROR"),
            ErrorCode::InvalidFormat => write!(f, "INVALID_FORMAT"),
        }
    }
}

/// Coarse error classification used to choose a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Rejected input, nothing was written
    Validation,
    /// The addressed entity does not exist
    NotFound,
    /// The store or the index failed
    Collaborator,
    /// Corrupted stored state
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::NotFound => write!(f, "not-found"),
            ErrorKind::Collaborator => write!(f, "collaborator"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for billweb-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    #[error("Account not found: {id}")]
    AccountNotFound { id: String },

    #[error("Category not found: {id}")]
    CategoryNotFound { id: String },

    #[error("{message}")]
    ValidationError { message: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid stored data: {0}")]
    InvalidFormat(#[from] serde_json::Error),
}

impl CoreError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::ValidationError {
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            CoreError::AccountNotFound { .. } => ErrorCode::AccountNotFound,
            CoreError::CategoryNotFound { .. } => ErrorCode::CategoryNotFound,
            CoreError::ValidationError { .. } => ErrorCode::ValidationError,
            CoreError::Store(_) => ErrorCode::StoreError,
            CoreError::InvalidFormat(_) => ErrorCode::InvalidFormat,
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ValidationError { .. } => ErrorKind::Validation,
            CoreError::RecordNotFound { .. }
            | CoreError::AccountNotFound { .. }
            | CoreError::CategoryNotFound { .. } => ErrorKind::NotFound,
            CoreError::Store(_) => ErrorKind::Collaborator,
            CoreError::InvalidFormat(_) => ErrorKind::Internal,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::RecordNotFound { .. } => ErrorSeverity::Info,
            CoreError::AccountNotFound { .. } => ErrorSeverity::Info,
            CoreError::CategoryNotFound { .. } => ErrorSeverity::Info,
            CoreError::ValidationError { .. } => ErrorSeverity::Warning,
            CoreError::Store(_) => ErrorSeverity::Error,
            CoreError::InvalidFormat(_) => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::RecordNotFound { .. } => {
                details = details.with_suggestion(
                    "Record ids look like 'record:<millis>-<seq>'.".to_string(),
                );
            }
            CoreError::AccountNotFound { .. } => {
                details = details.with_suggestion(
                    "Use the /api/account endpoint to list all accounts.".to_string(),
                );
            }
            CoreError::CategoryNotFound { .. } => {
                details = details.with_suggestion(
                    "Use the /api/category endpoint to list all categories.".to_string(),
                );
            }
            CoreError::ValidationError { message } => {
                details = details
                    .with_detail(serde_json::json!({ "validation_message": message }));
            }
            CoreError::Store(_) => {
                details = details.with_suggestion(
                    "Check that the storage path is writable and not corrupted.".to_string(),
                );
            }
            CoreError::InvalidFormat(_) => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Request ID for tracing
    pub request_id: Option<String>,
    /// Operation being performed
    pub operation: String,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: None,
            operation: operation.into(),
            data: serde_json::json!({}),
        }
    }

    /// Add request ID
    pub fn with_request_id(mut self, request_id: String) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add context data
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger {
    /// Log an error
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    /// Log a warning
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        match error.severity() {
            ErrorSeverity::Info | ErrorSeverity::Warning => log::warn!(
                target: "billweb::error",
                "[{}] {} - Operation: {} - Data: {}",
                error.code(),
                error,
                context.operation,
                context.data
            ),
            ErrorSeverity::Error => log::error!(
                target: "billweb::error",
                "ERROR [{}] {} - Operation: {} - Request: {:?} - Data: {}",
                error.code(),
                error.to_details(),
                context.operation,
                context.request_id,
                context.data
            ),
        }
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "billweb::error",
            "WARNING: {} - Operation: {} - Request: {:?}",
            message,
            context.operation,
            context.request_id
        );
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::RecordNotFound.to_string(), "RECORD_NOT_FOUND");
        assert_eq!(ErrorCode::ValidationError.to_string(), "VALIDATION_ERROR");
        assert_eq!(ErrorCode::StoreError.to_string(), "STORE_ERROR");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(CoreError::validation("amount is required").kind(), ErrorKind::Validation);
        assert_eq!(
            CoreError::AccountNotFound { id: "account:1".to_string() }.kind(),
            ErrorKind::NotFound
        );
        let store = CoreError::from(StoreError::Index { message: "corrupt".to_string() });
        assert_eq!(store.kind(), ErrorKind::Collaborator);
        assert_eq!(store.code(), ErrorCode::StoreError);

        let decode = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let decode = CoreError::from(decode);
        assert_eq!(decode.kind(), ErrorKind::Internal);
        assert_eq!(decode.code(), ErrorCode::InvalidFormat);
        assert_eq!(decode.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let error = CoreError::validation("category is required");
        assert_eq!(error.to_string(), "category is required");
        assert_eq!(error.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_error_details() {
        let details = CoreError::RecordNotFound { id: "record:9".to_string() }.to_details();
        assert_eq!(details.code, ErrorCode::RecordNotFound);
        assert!(details.message.contains("record:9"));
        assert!(!details.suggestions.is_empty());

        let details = CoreError::validation("bad date").to_details();
        assert!(details.details.is_some());
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("add_record")
            .with_request_id("req-1".to_string())
            .with_data("id", serde_json::json!("record:1"));
        assert_eq!(context.operation, "add_record");
        assert_eq!(context.data["id"], "record:1");
    }
}
