//! HTTP handlers and the response envelope
//!
//! Handlers validate input, call the [`Repository`](crate::repository::Repository)
//! and return either [`ApiSuccess`] or [`ApiError`]. Both render the same
//! envelope:
//!
//! ```json
//! { "success": true,  "data": { ... } }
//! { "success": false, "error": { "message": "...", "errorCode": "...", "errors": [ ... ] } }
//! ```
//!
//! Error rendering follows three rules, in order: validation failures become
//! 422 with field errors; errors with a declared kind render that kind's
//! status and code; anything else is a generic 500 with no detail.

mod error;
mod extract;
pub mod posts;
mod query;
mod response;

pub use error::{ApiError, ApiErrorKind, ApiOperation};
pub use extract::{ApiQuery, JsonBody};
pub use posts::PostDelegate;
pub use query::ListQuery;
pub use response::{ApiSuccess, Deleted, Envelope, ErrorBody, FieldError};
