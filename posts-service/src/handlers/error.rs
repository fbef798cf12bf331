//! API error types for handler operations
//!
//! [`ApiError`] is the only error a handler returns. Its kind fixes the HTTP
//! status and the machine-readable code; rendering always produces the
//! failure [`Envelope`].
//!
//! # Example
//!
//! ```rust
//! use axum::http::StatusCode;
//! use posts_service::handlers::{ApiError, ApiErrorKind, ApiOperation};
//!
//! let error = ApiError::operation_failed(ApiOperation::Create, "Post");
//! assert_eq!(error.kind, ApiErrorKind::OperationFailed);
//! assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
//! assert_eq!(error.error_code(), "POST_CREATE_FAILED");
//! assert_eq!(error.message, "Failed to create Post");
//! ```

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};

use super::response::{Envelope, ErrorBody, FieldError};

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Listing entities
    List,
    /// Reading a single entity
    Retrieve,
    /// Creating a new entity
    Create,
    /// Updating an existing entity
    Update,
    /// Deleting an entity
    Delete,
}

impl ApiOperation {
    const fn verb(&self) -> &'static str {
        match self {
            Self::List | Self::Retrieve => "retrieve",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Retrieve => write!(f, "retrieve"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl From<RepositoryOperation> for ApiOperation {
    fn from(op: RepositoryOperation) -> Self {
        match op {
            RepositoryOperation::FindById => Self::Retrieve,
            RepositoryOperation::FindAll | RepositoryOperation::Count => Self::List,
            RepositoryOperation::Create => Self::Create,
            RepositoryOperation::Update => Self::Update,
            RepositoryOperation::Delete => Self::Delete,
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Request input failed validation
    Validation,
    /// Resource does not exist
    NotFound,
    /// A uniqueness constraint rejected the write
    Duplicate,
    /// The datastore is unreachable
    Database,
    /// Identifier is not well-formed
    InvalidId,
    /// A datastore call failed for a reason that was not normalized
    OperationFailed,
    /// Malformed request
    BadRequest,
    /// Anything unexpected
    Internal,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Database => write!(f, "database"),
            Self::InvalidId => write!(f, "invalid_id"),
            Self::OperationFailed => write!(f, "operation_failed"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Duplicate => StatusCode::CONFLICT,
            Self::Database => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidId | Self::OperationFailed | Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Structured API error with operation context
///
/// Constructed where the failure is detected and rendered once, at the
/// boundary. The message is user-facing; driver detail never reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The type of entity involved (e.g. "Post")
    pub entity_type: Option<String>,
    /// Field-level validation failures
    pub errors: Vec<FieldError>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            errors: Vec::new(),
        }
    }

    /// Create a validation error from field failures
    ///
    /// The message is the first whole-input error when there is one, so a
    /// rule like "at least one field" surfaces directly.
    ///
    /// ```rust
    /// use posts_service::handlers::{ApiError, FieldError};
    ///
    /// let error = ApiError::validation(vec![FieldError::new("title", "Title is required")]);
    /// assert_eq!(error.message, "Validation failed");
    ///
    /// let error = ApiError::validation(vec![FieldError::new("", "Body must not be empty")]);
    /// assert_eq!(error.message, "Body must not be empty");
    /// ```
    pub fn validation(errors: Vec<FieldError>) -> Self {
        let message = errors
            .iter()
            .find(|e| e.is_root())
            .map_or_else(|| "Validation failed".to_string(), |e| e.message.clone());
        Self {
            errors,
            ..Self::new(ApiOperation::Create, ApiErrorKind::Validation, message)
        }
    }

    /// Create a "not found" error
    pub fn not_found(entity_type: impl Into<String>) -> Self {
        Self::new(
            ApiOperation::Retrieve,
            ApiErrorKind::NotFound,
            "Resource not found",
        )
        .with_entity_type(entity_type)
    }

    /// Create a "duplicate" error
    pub fn duplicate(operation: ApiOperation) -> Self {
        Self::new(operation, ApiErrorKind::Duplicate, "Resource already exists")
    }

    /// Create a datastore-unavailable error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Retrieve, ApiErrorKind::Database, message)
    }

    /// Create a malformed-identifier error
    pub fn invalid_id(operation: ApiOperation) -> Self {
        Self::new(operation, ApiErrorKind::InvalidId, "Invalid Id format")
    }

    /// Create a per-operation failure, e.g. "Failed to update Post"
    pub fn operation_failed(operation: ApiOperation, entity_type: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        Self::new(
            operation,
            ApiErrorKind::OperationFailed,
            format!("Failed to {} {}", operation.verb(), entity_type),
        )
        .with_entity_type(entity_type)
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Retrieve, ApiErrorKind::BadRequest, message)
    }

    /// Create the generic internal error; never carries detail
    pub fn internal() -> Self {
        Self::new(
            ApiOperation::Retrieve,
            ApiErrorKind::Internal,
            "An unexpected error occurred",
        )
    }

    /// 404 for a path no route matches
    pub fn route_not_found(path: &str) -> Self {
        Self::new(
            ApiOperation::Retrieve,
            ApiErrorKind::NotFound,
            format!("Route {path} not found"),
        )
    }

    /// Name the entity involved
    #[must_use]
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: ApiOperation) -> Self {
        self.operation = operation;
        self
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Machine-readable code
    pub fn error_code(&self) -> String {
        match self.kind {
            ApiErrorKind::Validation => "VALIDATION_ERROR".to_string(),
            ApiErrorKind::NotFound => "NOT_FOUND".to_string(),
            ApiErrorKind::Duplicate => "DUPLICATE".to_string(),
            ApiErrorKind::Database => "DATABASE_ERROR".to_string(),
            ApiErrorKind::InvalidId => "INVALID_ID".to_string(),
            ApiErrorKind::OperationFailed => format!(
                "{}_{}_FAILED",
                self.entity_type.as_deref().unwrap_or("RESOURCE").to_uppercase(),
                self.operation.verb().to_uppercase()
            ),
            ApiErrorKind::BadRequest => "BAD_REQUEST".to_string(),
            ApiErrorKind::Internal => "INTERNAL_SERVER_ERROR".to_string(),
        }
    }

    /// Check if this error is retriable (transient errors that may succeed on retry)
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind, ApiErrorKind::Database)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref entity_type) = self.entity_type {
            write!(f, " [{}]", entity_type)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                code = %code,
                retriable = self.is_retriable(),
                "API error: {}", self.message
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                kind = %self.kind,
                code = %code,
                field_errors = self.errors.len(),
                "API error: {}", self.message
            );
        }

        let body = ErrorBody::new(self.message, code).with_errors(self.errors);
        (status, Json(Envelope::<()>::failure(body))).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let operation = ApiOperation::from(err.operation);
        let entity_type = err.entity_type.clone().unwrap_or_else(|| "Resource".to_string());

        match err.kind {
            RepositoryErrorKind::NotFound => {
                Self::not_found(entity_type).with_operation(operation)
            }
            RepositoryErrorKind::Duplicate => {
                Self::duplicate(operation).with_entity_type(entity_type)
            }
            RepositoryErrorKind::ConnectionFailed => {
                Self::database("Database connection failed").with_operation(operation)
            }
            RepositoryErrorKind::InvalidId => {
                Self::invalid_id(operation).with_entity_type(entity_type)
            }
            RepositoryErrorKind::Database => {
                tracing::error!(
                    %operation,
                    entity = %entity_type,
                    cause = %err.message,
                    "Datastore operation failed"
                );
                Self::operation_failed(operation, entity_type)
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::validation(crate::validation::field_errors(&errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_codes() {
        let cases = [
            (ApiError::validation(vec![]), 422, "VALIDATION_ERROR"),
            (ApiError::not_found("Post"), 404, "NOT_FOUND"),
            (ApiError::duplicate(ApiOperation::Create), 409, "DUPLICATE"),
            (ApiError::database("Database connection failed"), 503, "DATABASE_ERROR"),
            (ApiError::invalid_id(ApiOperation::Delete), 400, "INVALID_ID"),
            (ApiError::bad_request("bad"), 400, "BAD_REQUEST"),
            (ApiError::internal(), 500, "INTERNAL_SERVER_ERROR"),
        ];
        for (error, status, code) in cases {
            assert_eq!(error.status_code().as_u16(), status, "{code}");
            assert_eq!(error.error_code(), code);
        }
    }

    #[test]
    fn test_operation_failed_codes() {
        let codes: Vec<String> = [
            ApiOperation::Retrieve,
            ApiOperation::Create,
            ApiOperation::Update,
            ApiOperation::Delete,
        ]
        .into_iter()
        .map(|op| ApiError::operation_failed(op, "Post").error_code())
        .collect();
        assert_eq!(
            codes,
            [
                "POST_RETRIEVE_FAILED",
                "POST_CREATE_FAILED",
                "POST_UPDATE_FAILED",
                "POST_DELETE_FAILED"
            ]
        );
        assert_eq!(
            ApiError::operation_failed(ApiOperation::List, "Post").message,
            "Failed to retrieve Post"
        );
    }

    #[test]
    fn test_from_repository_error() {
        let err = RepositoryError::new(
            RepositoryOperation::Create,
            RepositoryErrorKind::Duplicate,
            "Resource already exists",
        )
        .with_entity_type("Post");
        let api = ApiError::from(err);
        assert_eq!(api.kind, ApiErrorKind::Duplicate);
        assert_eq!(api.status_code(), StatusCode::CONFLICT);

        let err = RepositoryError::invalid_id(RepositoryOperation::Update, "Post", "x");
        assert_eq!(ApiError::from(err).error_code(), "INVALID_ID");

        let err = RepositoryError::new(
            RepositoryOperation::FindAll,
            RepositoryErrorKind::ConnectionFailed,
            "Database connection failed",
        );
        let api = ApiError::from(err);
        assert_eq!(api.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api.message, "Database connection failed");
    }

    #[test]
    fn test_unnormalized_failure_hides_cause() {
        let err = RepositoryError::database(
            RepositoryOperation::Update,
            "relation \"posts\" does not exist",
        )
        .with_entity_type("Post");

        let api = ApiError::from(err);
        assert_eq!(api.error_code(), "POST_UPDATE_FAILED");
        assert_eq!(api.message, "Failed to update Post");
    }

    #[tokio::test]
    async fn test_renders_failure_envelope() {
        let response = ApiError::validation(vec![FieldError::new("title", "Title is required")])
            .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["message"], "Validation failed");
        assert_eq!(json["error"]["errorCode"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["errors"][0]["field"], "title");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_from_validator_errors() {
        let mut errors = validator::ValidationErrors::new();
        errors.add(
            "__all__",
            validator::ValidationError::new("empty_update")
                .with_message("At least one field must be provided for update".into()),
        );

        let error = ApiError::from(errors);
        assert_eq!(error.kind, ApiErrorKind::Validation);
        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error.errors[0].is_root());
        assert_eq!(error.message, "At least one field must be provided for update");
    }
}
