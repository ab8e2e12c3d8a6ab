//! Error types for billweb-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use billweb_core::error::{DefaultErrorLogger, ErrorContext, ErrorLogger};
use billweb_core::{CoreError, ErrorKind};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    /// Log a failed ledger operation and wrap the error
    pub fn logged(operation: &str, error: CoreError) -> Self {
        DefaultErrorLogger.log_error(&error, &ErrorContext::new(operation));
        ApiError::Core(error)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Core(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Collaborator | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> String {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST".to_string(),
            ApiError::Core(e) => e.code().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Server-side failures are logged in full; the client only gets the code
        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            error,
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billweb_store::StoreError;

    #[test]
    fn test_status_by_kind() {
        assert_eq!(ApiError::bad_request("q is required").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(CoreError::validation("category is required")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CoreError::RecordNotFound { id: "record:1".to_string() }).status(),
            StatusCode::NOT_FOUND
        );
        let store = CoreError::from(StoreError::Backend { message: "disk full".to_string() });
        assert_eq!(ApiError::from(store).status(), StatusCode::INTERNAL_SERVER_ERROR);

        let corrupt = CoreError::from(serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err());
        let corrupt = ApiError::from(corrupt);
        assert_eq!(corrupt.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(corrupt.code(), "INVALID_FORMAT");
    }

    #[test]
    fn test_codes() {
        assert_eq!(ApiError::bad_request("x").code(), "BAD_REQUEST");
        assert_eq!(ApiError::from(CoreError::validation("x")).code(), "VALIDATION_ERROR");
    }
}
