//! The uniform response envelope
//!
//! Every endpoint answers with `{"success": bool, ...}` carrying either
//! `data` or `error`, never both.
//!
//! ```rust
//! use posts_service::handlers::{Envelope, ErrorBody};
//!
//! let ok = serde_json::to_value(Envelope::success(vec![1, 2])).unwrap();
//! assert_eq!(ok, serde_json::json!({ "success": true, "data": [1, 2] }));
//!
//! let failed = serde_json::to_value(Envelope::<()>::failure(ErrorBody::new(
//!     "Resource not found",
//!     "NOT_FOUND",
//! )))
//! .unwrap();
//! assert_eq!(failed["success"], false);
//! assert_eq!(failed["error"]["errorCode"], "NOT_FOUND");
//! assert!(failed.get("data").is_none());
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// One field-level validation failure
///
/// `field` is a dotted path (`title`, `tags.3`); the empty string marks an
/// error about the input as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the error is about the input as a whole
    pub fn is_root(&self) -> bool {
        self.field.is_empty()
    }
}

/// The `error` member of a failed response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    pub error_code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: error_code.into(),
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }
}

/// Top-level response object
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    /// `{"success": true, "data": ...}`
    Success { success: bool, data: T },
    /// `{"success": false, "error": {...}}`
    Failure { success: bool, error: ErrorBody },
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self::Success {
            success: true,
            data,
        }
    }

    pub fn failure(error: ErrorBody) -> Self {
        Self::Failure {
            success: false,
            error,
        }
    }
}

/// A successful response with its status code
///
/// ```rust
/// use axum::{http::StatusCode, response::IntoResponse};
/// use posts_service::handlers::ApiSuccess;
///
/// let response = ApiSuccess::created("new").into_response();
/// assert_eq!(response.status(), StatusCode::CREATED);
/// ```
#[derive(Debug, Clone)]
pub struct ApiSuccess<T> {
    status: StatusCode,
    data: T,
}

impl<T> ApiSuccess<T> {
    /// 200 OK
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    /// 201 Created
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.status, Json(Envelope::success(self.data))).into_response()
    }
}

/// 204 No Content with a null-data envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct Deleted;

impl IntoResponse for Deleted {
    fn into_response(self) -> Response {
        (StatusCode::NO_CONTENT, Json(Envelope::success(()))).into_response()
    }
}
