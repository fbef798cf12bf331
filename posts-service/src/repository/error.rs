//! Repository error types
//!
//! Every datastore failure leaves the repository as a [`RepositoryError`].
//! The delegate normalizes the failures it recognizes (missing rows, unique
//! violations, lost connections) into dedicated kinds; anything else is kept
//! as [`RepositoryErrorKind::Database`] with its driver message so the HTTP
//! layer can log it without rendering it.
//!
//! ```rust
//! use posts_service::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
//!
//! let error = RepositoryError::invalid_id(RepositoryOperation::Delete, "Post", "nope");
//! assert_eq!(error.kind, RepositoryErrorKind::InvalidId);
//! assert_eq!(error.message, "Invalid Id format");
//! assert_eq!(error.entity_id.as_deref(), Some("nope"));
//! ```

use std::fmt;

/// Repository call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    FindById,
    /// The page read of `find_all`
    FindAll,
    /// The count read of `find_all`
    Count,
    Create,
    Update,
    Delete,
}

impl RepositoryOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FindById => "find_by_id",
            Self::FindAll => "find_all",
            Self::Count => "count",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// The record addressed by a write does not exist
    NotFound,
    /// A unique constraint rejected the write
    Duplicate,
    /// The datastore could not be reached or initialized
    ConnectionFailed,
    /// The identifier failed its shape precondition; no I/O was attempted
    InvalidId,
    /// Any other datastore failure, passed through un-normalized
    Database,
}

impl RepositoryErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Duplicate => "duplicate",
            Self::ConnectionFailed => "connection_failed",
            Self::InvalidId => "invalid_id",
            Self::Database => "database",
        }
    }
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    pub operation: RepositoryOperation,
    pub kind: RepositoryErrorKind,
    /// Fixed message for normalized kinds; the driver message for `Database`
    pub message: String,
    /// Entity name, e.g. "Post"
    pub entity_type: Option<String>,
    /// Offending identifier, or the violated constraint for `Duplicate`
    pub entity_id: Option<String>,
}

impl RepositoryError {
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Malformed identifier; raised before any datastore call
    pub fn invalid_id(
        operation: RepositoryOperation,
        entity_type: impl Into<String>,
        raw_id: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(operation, RepositoryErrorKind::InvalidId, "Invalid Id format")
            .with_entity_type(entity_type);
        error.entity_id = Some(raw_id.into());
        error
    }

    /// A datastore failure the normalizer does not recognize
    pub fn database(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Database, message)
    }

    #[must_use]
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        match (&self.entity_type, &self.entity_id) {
            (Some(entity), Some(id)) => write!(f, " [{entity}: {id}]"),
            (Some(entity), None) => write!(f, " [{entity}]"),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for RepositoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(RepositoryOperation::FindById.to_string(), "find_by_id");
        assert_eq!(RepositoryOperation::Count.to_string(), "count");
        assert_eq!(
            RepositoryErrorKind::ConnectionFailed.to_string(),
            "connection_failed"
        );
        assert_eq!(RepositoryErrorKind::InvalidId.to_string(), "invalid_id");
    }

    #[test]
    fn test_invalid_id_carries_raw_identifier() {
        let error = RepositoryError::invalid_id(RepositoryOperation::Update, "Post", "abc");
        assert_eq!(error.entity_type.as_deref(), Some("Post"));
        assert_eq!(error.entity_id.as_deref(), Some("abc"));
        assert_eq!(
            error.to_string(),
            "Repository invalid_id error during update: Invalid Id format [Post: abc]"
        );
    }

    #[test]
    fn test_database_error_keeps_driver_message() {
        let error = RepositoryError::database(RepositoryOperation::Create, "deadlock detected")
            .with_entity_type("Post");
        assert_eq!(error.kind, RepositoryErrorKind::Database);
        assert_eq!(
            error.to_string(),
            "Repository database error during create: deadlock detected [Post]"
        );
    }
}
