//! Datastore error normalization
//!
//! Every physical call a delegate makes runs through [`execute_query`]. It is
//! a narrow allow-list translator:
//!
//! | driver failure | repository kind |
//! |---|---|
//! | connection / initialization | `ConnectionFailed` ("Database connection failed") |
//! | unique constraint violation | `Duplicate` ("Resource already exists") |
//! | record missing on write | `NotFound` ("Resource not found") |
//!
//! Anything else is passed through as `Database` with the driver's message
//! untouched. No retries and no backoff happen here.

use std::future::Future;

use crate::error::{DatabaseError, DatabaseErrorKind};

use super::error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
use super::traits::RepositoryResult;

/// Run one datastore call, normalizing its failure
pub async fn execute_query<T, F>(
    operation: RepositoryOperation,
    entity_type: &'static str,
    query: F,
) -> RepositoryResult<T>
where
    F: Future<Output = Result<T, DatabaseError>>,
{
    query
        .await
        .map_err(|err| normalize(operation, entity_type, err))
}

/// Map a driver failure onto the repository taxonomy
pub fn normalize(
    operation: RepositoryOperation,
    entity_type: &'static str,
    err: DatabaseError,
) -> RepositoryError {
    let (kind, message) = if err.is_connection_error() {
        (RepositoryErrorKind::ConnectionFailed, "Database connection failed")
    } else {
        match err.kind {
            DatabaseErrorKind::UniqueViolation => {
                (RepositoryErrorKind::Duplicate, "Resource already exists")
            }
            DatabaseErrorKind::NotFound => (RepositoryErrorKind::NotFound, "Resource not found"),
            _ => {
                return RepositoryError::database(operation, err.to_string())
                    .with_entity_type(entity_type);
            }
        }
    };

    tracing::warn!(
        %operation,
        entity = entity_type,
        kind = %kind,
        cause = %err,
        "Normalized datastore failure"
    );

    let mut error = RepositoryError::new(operation, kind, message).with_entity_type(entity_type);
    if kind == RepositoryErrorKind::Duplicate {
        error.entity_id = err.context;
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatabaseOperation;

    #[tokio::test]
    async fn test_success_passes_through() {
        let value = execute_query(RepositoryOperation::Count, "Post", async {
            Ok::<_, DatabaseError>(7u64)
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_connection_failure_normalized() {
        let err = execute_query(RepositoryOperation::FindAll, "Post", async {
            Err::<(), _>(DatabaseError::connection_failed("connection refused"))
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind, RepositoryErrorKind::ConnectionFailed);
        assert_eq!(err.operation, RepositoryOperation::FindAll);
        assert_eq!(err.message, "Database connection failed");
    }

    #[tokio::test]
    async fn test_pool_exhaustion_counts_as_connection_failure() {
        let err = execute_query(RepositoryOperation::Create, "Post", async {
            Err::<(), _>(DatabaseError::pool_exhausted("timed out"))
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ConnectionFailed);
    }

    #[tokio::test]
    async fn test_unique_violation_normalized() {
        let err = execute_query(RepositoryOperation::Create, "Post", async {
            Err::<(), _>(
                DatabaseError::unique_violation(DatabaseOperation::Insert, "duplicate key")
                    .add_context("posts_title_key"),
            )
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind, RepositoryErrorKind::Duplicate);
        assert_eq!(err.message, "Resource already exists");
        assert_eq!(err.entity_id.as_deref(), Some("posts_title_key"));
    }

    #[tokio::test]
    async fn test_missing_record_on_write_normalized() {
        let err = execute_query(RepositoryOperation::Update, "Post", async {
            Err::<(), _>(DatabaseError::not_found(DatabaseOperation::Update, "Row not found"))
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::NotFound);
        assert_eq!(err.operation, RepositoryOperation::Update);
    }

    #[test]
    fn test_other_failures_propagate_unchanged() {
        let cause = DatabaseError::new(
            DatabaseOperation::Insert,
            DatabaseErrorKind::ConstraintViolation,
            "violates foreign key constraint",
        );
        let err = normalize(RepositoryOperation::Create, "Post", cause.clone());

        assert_eq!(err.kind, RepositoryErrorKind::Database);
        assert_eq!(err.message, cause.to_string());
        assert_eq!(err.entity_type.as_deref(), Some("Post"));
    }
}
