//! Generic paginated repository over a [`Delegate`]

use std::str::FromStr;

use super::error::{RepositoryError, RepositoryOperation};
use super::filter::{translate, EntitySchema};
use super::pagination::{PageRequest, PaginatedResult};
use super::traits::{Delegate, Include, RepositoryResult};

/// CRUD plus paginated listing for one entity type
///
/// Identifier shape checks happen here, before any I/O. Everything else is
/// delegated; the delegate has already normalized datastore failures.
#[derive(Debug)]
pub struct Repository<D> {
    delegate: D,
}

impl<D: Delegate> Repository<D> {
    /// Wrap a delegate
    pub fn new(delegate: D) -> Self {
        Self { delegate }
    }

    /// The wrapped delegate
    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    fn entity_type() -> &'static str {
        <D::Entity as EntitySchema>::schema().entity
    }

    fn parse_id(raw: &str) -> Option<D::Id> {
        D::Id::from_str(raw).ok()
    }

    /// Look up an entity
    ///
    /// A malformed identifier is not an error: it returns `None` without
    /// touching the datastore.
    pub async fn find_by_id(&self, id: &str, include: Include) -> RepositoryResult<Option<D::Entity>> {
        let Some(id) = Self::parse_id(id) else {
            tracing::debug!(entity = Self::entity_type(), id, "Malformed id, skipping lookup");
            return Ok(None);
        };

        tracing::debug!(entity = Self::entity_type(), %id, "find_by_id");
        self.delegate.find_unique(&id, include).await
    }

    /// Read one page plus the total count
    ///
    /// The page read and the count run concurrently against the same filter;
    /// if either fails the whole call fails.
    pub async fn find_all(&self, request: &PageRequest) -> RepositoryResult<PaginatedResult<D::Entity>> {
        let schema = <D::Entity as EntitySchema>::schema();
        let args = translate(schema, request, self.delegate.search_fields());

        tracing::debug!(
            entity = schema.entity,
            skip = args.pagination.skip,
            take = args.pagination.take,
            conditions = args.filter.conditions.len(),
            search = args.filter.search.is_some(),
            sort = args.order_by.field.name,
            order = %args.order_by.direction,
            "find_all"
        );

        let (items, total) = futures::try_join!(
            self.delegate.find_many(&args),
            self.delegate.count(&args.filter)
        )?;

        Ok(PaginatedResult::new(
            items,
            total,
            request.page,
            args.pagination.take,
        ))
    }

    /// Insert an entity
    ///
    /// No uniqueness pre-check; the datastore's constraints decide.
    pub async fn create(&self, data: D::Create, include: Include) -> RepositoryResult<D::Entity> {
        tracing::debug!(entity = Self::entity_type(), "create");
        self.delegate.create(data, include).await
    }

    /// Apply a partial update
    ///
    /// Fails with `InvalidId` before any I/O when the identifier is malformed.
    pub async fn update(
        &self,
        id: &str,
        data: D::Update,
        include: Include,
    ) -> RepositoryResult<D::Entity> {
        let id = Self::parse_id(id).ok_or_else(|| {
            RepositoryError::invalid_id(RepositoryOperation::Update, Self::entity_type(), id)
        })?;

        tracing::debug!(entity = Self::entity_type(), %id, "update");
        self.delegate.update(&id, data, include).await
    }

    /// Delete an entity
    ///
    /// Fails with `InvalidId` before any I/O when the identifier is malformed.
    pub async fn delete(&self, id: &str) -> RepositoryResult<()> {
        let id = Self::parse_id(id).ok_or_else(|| {
            RepositoryError::invalid_id(RepositoryOperation::Delete, Self::entity_type(), id)
        })?;

        tracing::debug!(entity = Self::entity_type(), %id, "delete");
        self.delegate.delete(&id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatabaseError;
    use crate::ids::PostId;
    use crate::models::{CreatePost, UpdatePost};
    use crate::repository::{MemoryPostDelegate, RepositoryErrorKind};
    use serde_json::json;

    fn repository() -> Repository<MemoryPostDelegate> {
        Repository::new(MemoryPostDelegate::new())
    }

    fn create_payload(title: &str) -> CreatePost {
        CreatePost {
            title: title.to_string(),
            content: "Test Content".to_string(),
            tags: vec!["test".to_string()],
        }
    }

    #[tokio::test]
    async fn test_malformed_id_skips_datastore() {
        let repo = repository();

        for raw in ["invalid-id", "507f1f77bcf86cd799439011", "comment_01h455vb4pex5vsknk084sn02q"] {
            assert!(repo.find_by_id(raw, Include::none()).await.unwrap().is_none());
        }
        assert_eq!(repo.delegate().calls(), 0);
    }

    #[tokio::test]
    async fn test_update_and_delete_fail_fast_on_malformed_id() {
        let repo = repository();

        let err = repo
            .update("invalid-id", UpdatePost::default(), Include::none())
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidId);
        assert_eq!(err.operation, RepositoryOperation::Update);
        assert_eq!(err.message, "Invalid Id format");

        let err = repo.delete("invalid-id").await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidId);
        assert_eq!(err.operation, RepositoryOperation::Delete);

        assert_eq!(repo.delegate().calls(), 0);
    }

    #[tokio::test]
    async fn test_create_then_find_round_trip() {
        let repo = repository();
        let created = repo.create(create_payload("Test Post"), Include::none()).await.unwrap();

        let found = repo
            .find_by_id(created.id.as_str(), Include::none())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.title, "Test Post");
        assert_eq!(found.content, "Test Content");
        assert!(found.tags.contains(&"test".to_string()));
        assert_eq!(found.views, 0);
        assert!(found.updated_at >= found.created_at);
    }

    #[tokio::test]
    async fn test_well_formed_unknown_id_is_none() {
        let repo = repository();
        let missing = PostId::new();
        assert!(repo
            .find_by_id(missing.as_str(), Include::none())
            .await
            .unwrap()
            .is_none());
        assert_eq!(repo.delegate().calls(), 1);
    }

    #[tokio::test]
    async fn test_find_all_paginates_and_counts() {
        let repo = repository();
        for i in 0..25 {
            repo.create(create_payload(&format!("Post {i:02}")), Include::none())
                .await
                .unwrap();
        }

        let page = repo.find_all(&PageRequest::new(3, 10)).await.unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.meta.total(), 25);
        assert_eq!(page.meta.total_pages(), 3);
        assert!(!page.meta.has_next());
        assert!(page.meta.has_prev());
    }

    #[tokio::test]
    async fn test_find_all_filter_applies_to_count() {
        let repo = repository();
        for i in 0..4 {
            repo.create(create_payload(&format!("alpha {i}")), Include::none())
                .await
                .unwrap();
            repo.create(create_payload(&format!("beta {i}")), Include::none())
                .await
                .unwrap();
        }

        let filter = json!({ "title": { "$regex": "beta" } });
        let request = PageRequest::new(1, 3).with_filter(filter.as_object().cloned().unwrap());
        let page = repo.find_all(&request).await.unwrap();

        assert_eq!(page.items.len(), 3);
        assert_eq!(page.meta.total(), 4);
        assert!(page.items.iter().all(|p| p.title.starts_with("beta")));
    }

    #[tokio::test]
    async fn test_find_all_fails_when_either_read_fails() {
        let repo = repository();
        repo.create(create_payload("only"), Include::none()).await.unwrap();

        repo.delegate()
            .fail_next(DatabaseError::connection_failed("connection reset"));
        let err = repo.find_all(&PageRequest::default()).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ConnectionFailed);
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let repo = repository();
        let err = repo
            .update(
                PostId::new().as_str(),
                UpdatePost {
                    title: Some("x".into()),
                    ..UpdatePost::default()
                },
                Include::none(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_removes_entity() {
        let repo = repository();
        let created = repo.create(create_payload("gone"), Include::none()).await.unwrap();

        repo.delete(created.id.as_str()).await.unwrap();
        assert!(repo
            .find_by_id(created.id.as_str(), Include::none())
            .await
            .unwrap()
            .is_none());

        let err = repo.delete(created.id.as_str()).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::NotFound);
    }
}
