//! The delegate trait: the narrow seam between the generic repository and a
//! concrete datastore driver
//!
//! A delegate offers exactly the physical operations the repository needs:
//! five CRUD calls, a count and the list of fields free-text search runs over.
//! Implementations wrap every call in [`execute_query`](super::execute_query)
//! so driver failures leave the delegate already normalized.

use std::fmt::Display;
use std::future::Future;
use std::str::FromStr;

use super::error::RepositoryError;
use super::filter::{EntitySchema, FindManyArgs, WhereClause};

/// Result type for repository and delegate operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Relations to load alongside an entity
///
/// # Example
///
/// ```rust
/// use posts_service::repository::Include;
///
/// let include = Include::relations(&["comments"]);
/// assert!(include.contains("comments"));
/// assert!(!Include::none().contains("comments"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Include {
    relations: &'static [&'static str],
}

impl Include {
    /// Load no relations
    #[must_use]
    pub const fn none() -> Self {
        Self { relations: &[] }
    }

    /// Load the named relations
    #[must_use]
    pub const fn relations(relations: &'static [&'static str]) -> Self {
        Self { relations }
    }

    /// Whether the named relation should be loaded
    pub fn contains(&self, relation: &str) -> bool {
        self.relations.contains(&relation)
    }
}

/// Datastore adapter for one entity type
///
/// `Id` parsing is the repository's shape precondition: a raw identifier that
/// fails `Id::from_str` never reaches the delegate.
pub trait Delegate: Send + Sync {
    /// Typed identifier
    type Id: FromStr + Display + Send + Sync;
    /// Stored entity
    type Entity: EntitySchema + Send;
    /// Payload for creation
    type Create: Send;
    /// Payload for partial updates
    type Update: Send;

    /// Look up one entity by identifier
    fn find_unique(
        &self,
        id: &Self::Id,
        include: Include,
    ) -> impl Future<Output = RepositoryResult<Option<Self::Entity>>> + Send;

    /// Read one page of entities
    fn find_many(
        &self,
        args: &FindManyArgs,
    ) -> impl Future<Output = RepositoryResult<Vec<Self::Entity>>> + Send;

    /// Count entities selected by a filter
    fn count(&self, filter: &WhereClause) -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// Insert an entity; uniqueness is enforced by the datastore
    fn create(
        &self,
        data: Self::Create,
        include: Include,
    ) -> impl Future<Output = RepositoryResult<Self::Entity>> + Send;

    /// Apply a partial update; a missing record surfaces as not-found
    fn update(
        &self,
        id: &Self::Id,
        data: Self::Update,
        include: Include,
    ) -> impl Future<Output = RepositoryResult<Self::Entity>> + Send;

    /// Delete an entity; a missing record surfaces as not-found
    fn delete(&self, id: &Self::Id) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// External names of the fields free-text search runs over
    fn search_fields(&self) -> &'static [&'static str];
}
