//! Request body validation
//!
//! Bodies are deserialized into the request DTOs in [`crate::models`] and
//! checked with their `validator` rules. Every rule failure is reported as a
//! [`FieldError`]; unknown keys are ignored.

use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::handlers::{ApiError, FieldError};
use crate::models::{CreatePost, CreatePostRequest, UpdatePost, UpdatePostRequest};

/// Field failures for one request
pub type FieldErrors = Vec<FieldError>;

/// Key `validator` files struct-level failures under
const STRUCT_LEVEL: &str = "__all__";

/// Render order of known fields; the root comes first
const FIELD_ORDER: &[&str] = &["", "title", "content", "tags"];

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn label(field: &str) -> String {
    let mut chars = field.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

fn describe(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    match error.code.as_ref() {
        "length" => {
            let empty = error
                .params
                .get("value")
                .and_then(Value::as_str)
                .is_some_and(str::is_empty);
            match error.params.get("max") {
                Some(max) if !empty => {
                    format!("{} must be less than {max} characters", label(field))
                }
                _ => format!("{} is required", label(field)),
            }
        }
        "required" => "Required".to_string(),
        code => format!("Invalid {field} ({code})"),
    }
}

/// Flatten `validator` failures into field errors, in a stable order
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut rendered: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, failures)| {
            let field = if field == STRUCT_LEVEL { "" } else { field.as_ref() };
            failures
                .iter()
                .map(|failure| FieldError::new(field, describe(field, failure)))
                .collect::<Vec<_>>()
        })
        .collect();

    rendered.sort_by_key(|error| {
        let rank = FIELD_ORDER
            .iter()
            .position(|known| *known == error.field)
            .unwrap_or(FIELD_ORDER.len());
        (rank, error.field.clone())
    });
    rendered
}

/// Deserialize and validate a body
///
/// A body that is not an object, or whose fields have the wrong JSON type,
/// fails with a single root error.
pub fn parse_body<T>(body: Value) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    if !body.is_object() {
        let message = format!("Expected object, received {}", type_name(&body));
        return Err(ApiError::validation(vec![FieldError::new("", message)]));
    }

    let request: T = serde_json::from_value(body)
        .map_err(|err| ApiError::validation(vec![FieldError::new("", err.to_string())]))?;
    request.validate()?;
    Ok(request)
}

/// Validate a create body: `{title, content, tags?}`
///
/// Missing `tags` becomes an empty list.
///
/// ```rust
/// use posts_service::validation::validate_create;
/// use serde_json::json;
///
/// let post = validate_create(json!({ "title": "Hi", "content": "There" })).unwrap();
/// assert!(post.tags.is_empty());
///
/// let error = validate_create(json!({ "title": "", "content": "x" })).unwrap_err();
/// assert_eq!(error.errors[0].field, "title");
/// assert_eq!(error.errors[0].message, "Title is required");
/// ```
pub fn validate_create(body: Value) -> Result<CreatePost, ApiError> {
    parse_body::<CreatePostRequest>(body)?
        .into_create()
        .ok_or_else(|| ApiError::validation(vec![FieldError::new("", "Validation failed")]))
}

/// Validate a partial update body; at least one known field must be present
pub fn validate_update(body: Value) -> Result<UpdatePost, ApiError> {
    parse_body::<UpdatePostRequest>(body).map(UpdatePost::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ApiErrorKind;
    use crate::models::TAG_MAX_CHARS;
    use serde_json::json;

    fn fields(error: &ApiError) -> Vec<&str> {
        error.errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_create_collects_every_failure() {
        let error = validate_create(json!({ "title": "", "tags": ["x".repeat(51)] })).unwrap_err();
        assert_eq!(error.kind, ApiErrorKind::Validation);
        assert_eq!(fields(&error), ["title", "content", "tags"]);
        assert_eq!(error.errors[0].message, "Title is required");
        assert_eq!(error.errors[1].message, "Required");
        assert_eq!(error.errors[2].message, "Tag must be less than 50 characters");
        assert_eq!(error.message, "Validation failed");
    }

    #[test]
    fn test_length_bounds() {
        let ok = validate_create(json!({
            "title": "t".repeat(255),
            "content": "c".repeat(1000),
        }));
        assert!(ok.is_ok());

        let error = validate_create(json!({
            "title": "t".repeat(256),
            "content": "c".repeat(1001),
        }))
        .unwrap_err();
        assert_eq!(error.errors[0].message, "Title must be less than 255 characters");
        assert_eq!(error.errors[1].message, "Content must be less than 1000 characters");
    }

    #[test]
    fn test_tag_rules() {
        let at_limit = "x".repeat(TAG_MAX_CHARS);
        assert!(validate_create(json!({ "title": "t", "content": "c", "tags": [at_limit] })).is_ok());

        let many: Vec<String> = (0..=10).map(|i| i.to_string()).collect();
        let error = validate_create(json!({ "title": "t", "content": "c", "tags": many }))
            .unwrap_err();
        assert_eq!(fields(&error), ["tags"]);
        assert_eq!(error.errors[0].message, "Maximum 10 tags allowed");
    }

    #[test]
    fn test_wrong_types_are_root_errors() {
        let error = validate_create(json!([1])).unwrap_err();
        assert!(error.errors[0].is_root());
        assert_eq!(error.message, "Expected object, received array");

        let error = validate_create(json!({ "title": 7, "content": "c" })).unwrap_err();
        assert_eq!(error.kind, ApiErrorKind::Validation);
        assert!(error.errors[0].is_root());
        assert!(error.message.contains("invalid type"));
    }

    #[test]
    fn test_update_requires_a_field() {
        for body in [json!({}), json!({ "unknown": 1 })] {
            let error = validate_update(body).unwrap_err();
            assert_eq!(error.errors.len(), 1);
            assert!(error.errors[0].is_root());
            assert_eq!(error.message, "At least one field must be provided for update");
        }
    }

    #[test]
    fn test_update_partial() {
        let update = validate_update(json!({ "tags": [] })).unwrap();
        assert_eq!(update.tags, Some(vec![]));
        assert!(update.title.is_none());

        let error = validate_update(json!({ "title": "" })).unwrap_err();
        assert_eq!(error.errors[0].message, "Title is required");
    }
}
