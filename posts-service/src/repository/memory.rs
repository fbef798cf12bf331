//! In-process post datastore
//!
//! Used when no database is configured, and by the test suites. It mirrors
//! the PostgreSQL schema's rules: titles are unique, comments cascade with
//! their post, and a write to a missing record is a not-found failure.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{DatabaseError, DatabaseErrorKind, DatabaseOperation};
use crate::ids::PostId;
use crate::models::{Comment, CreatePost, Post, UpdatePost, POST_SEARCH_FIELDS};

use super::delegate::execute_query;
use super::error::RepositoryOperation;
use super::filter::{FilterValue, FindManyArgs, WhereClause};
use super::pagination::OrderDirection;
use super::traits::{Delegate, Include, RepositoryResult};

const ENTITY: &str = "Post";
/// Mirrors the unique title index of the Postgres schema
const TITLE_CONSTRAINT: &str = "posts_title_key";

#[derive(Debug, Default)]
struct Store {
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl Store {
    fn title_taken(&self, title: &str, except: Option<&PostId>) -> bool {
        self.posts
            .iter()
            .any(|p| p.title == title && Some(&p.id) != except)
    }

    fn comments_for(&self, post_id: &PostId) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| &c.post_id == post_id)
            .cloned()
            .map(Comment::normalized)
            .collect();
        comments.sort_by_key(|c| c.created_at);
        comments
    }

    fn with_include(&self, post: Post, include: Include) -> Post {
        if include.contains("comments") {
            let comments = self.comments_for(&post.id);
            Post {
                comments: Some(comments),
                ..post
            }
        } else {
            post.without_comments()
        }
    }
}

/// Post delegate backed by process memory
///
/// Counts every datastore call and can be told to fail the next one, which is
/// how the repository's no-I/O and error-mapping paths are exercised.
#[derive(Debug, Default)]
pub struct MemoryPostDelegate {
    store: RwLock<Store>,
    calls: AtomicUsize,
    failure: Mutex<Option<DatabaseError>>,
}

impl MemoryPostDelegate {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of datastore calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Fail the next datastore call with `error`
    pub fn fail_next(&self, error: DatabaseError) {
        if let Ok(mut slot) = self.failure.lock() {
            *slot = Some(error);
        }
    }

    /// Attach a comment to a stored post
    pub async fn add_comment(&self, comment: Comment) -> Result<Comment, DatabaseError> {
        let mut store = self.store.write().await;
        if !store.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(DatabaseError::new(
                DatabaseOperation::Insert,
                DatabaseErrorKind::ConstraintViolation,
                "insert on table \"comments\" violates foreign key constraint",
            ));
        }
        let comment = comment.normalized();
        store.comments.push(comment.clone());
        Ok(comment)
    }

    fn begin(&self) -> Result<(), DatabaseError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        match self.failure.lock() {
            Ok(mut slot) => slot.take().map_or(Ok(()), Err),
            Err(_) => Err(DatabaseError::query_failed("memory store lock poisoned")),
        }
    }
}

fn selects(post: &Post, filter: &WhereClause) -> bool {
    let conditions = filter.conditions.iter().all(|condition| {
        post.field_value(condition.field.name)
            .is_some_and(|actual| condition.matches(&actual))
    });

    conditions
        && filter.search.as_ref().map_or(true, |search| {
            let texts: Vec<String> = search
                .fields
                .iter()
                .filter_map(|field| match post.field_value(field.name) {
                    Some(FilterValue::Text(text)) => Some(text),
                    _ => None,
                })
                .collect();
            let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
            search.matches_text(&texts)
        })
}

fn compare(a: &Post, b: &Post, args: &FindManyArgs) -> Ordering {
    let field = args.order_by.field.name;
    let primary = match (a.field_value(field), b.field_value(field)) {
        (Some(x), Some(y)) => x.compare(&y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    };
    let ordering = primary.then_with(|| a.id.as_str().cmp(b.id.as_str()));
    match args.order_by.direction {
        OrderDirection::Ascending => ordering,
        OrderDirection::Descending => ordering.reverse(),
    }
}

impl Delegate for MemoryPostDelegate {
    type Id = PostId;
    type Entity = Post;
    type Create = CreatePost;
    type Update = UpdatePost;

    async fn find_unique(&self, id: &PostId, include: Include) -> RepositoryResult<Option<Post>> {
        execute_query(RepositoryOperation::FindById, ENTITY, async {
            self.begin()?;
            let store = self.store.read().await;
            let post = store.posts.iter().find(|p| &p.id == id).cloned();
            Ok(post.map(|p| store.with_include(p, include)))
        })
        .await
    }

    async fn find_many(&self, args: &FindManyArgs) -> RepositoryResult<Vec<Post>> {
        execute_query(RepositoryOperation::FindAll, ENTITY, async {
            self.begin()?;
            let store = self.store.read().await;
            let mut selected: Vec<&Post> = store
                .posts
                .iter()
                .filter(|p| selects(p, &args.filter))
                .collect();
            selected.sort_by(|a, b| compare(a, b, args));

            let skip = usize::try_from(args.pagination.skip).unwrap_or(usize::MAX);
            let take = usize::try_from(args.pagination.take).unwrap_or(usize::MAX);
            Ok(selected
                .into_iter()
                .skip(skip)
                .take(take)
                .map(|p| p.clone().without_comments())
                .collect())
        })
        .await
    }

    async fn count(&self, filter: &WhereClause) -> RepositoryResult<u64> {
        execute_query(RepositoryOperation::Count, ENTITY, async {
            self.begin()?;
            let store = self.store.read().await;
            let total = store.posts.iter().filter(|p| selects(p, filter)).count();
            Ok(total as u64)
        })
        .await
    }

    async fn create(&self, data: CreatePost, include: Include) -> RepositoryResult<Post> {
        execute_query(RepositoryOperation::Create, ENTITY, async {
            self.begin()?;
            let mut store = self.store.write().await;
            if store.title_taken(&data.title, None) {
                return Err(DatabaseError::unique_violation(
                    DatabaseOperation::Insert,
                    "duplicate key value violates unique constraint",
                )
                .add_context(TITLE_CONSTRAINT));
            }

            let now = Utc::now();
            let post = Post {
                id: PostId::new(),
                title: data.title,
                content: data.content,
                tags: data.tags,
                views: 0,
                created_at: now,
                updated_at: now,
                comments: None,
            };
            store.posts.push(post.clone());
            Ok(store.with_include(post, include))
        })
        .await
    }

    async fn update(&self, id: &PostId, data: UpdatePost, include: Include) -> RepositoryResult<Post> {
        execute_query(RepositoryOperation::Update, ENTITY, async {
            self.begin()?;
            let mut store = self.store.write().await;
            if let Some(title) = &data.title {
                if store.title_taken(title, Some(id)) {
                    return Err(DatabaseError::unique_violation(
                        DatabaseOperation::Update,
                        "duplicate key value violates unique constraint",
                    )
                    .add_context(TITLE_CONSTRAINT));
                }
            }

            let post = store
                .posts
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or_else(|| {
                    DatabaseError::not_found(DatabaseOperation::Update, "Record to update not found")
                })?;

            if let Some(title) = data.title {
                post.title = title;
            }
            if let Some(content) = data.content {
                post.content = content;
            }
            if let Some(tags) = data.tags {
                post.tags = tags;
            }
            post.updated_at = Utc::now().max(post.created_at);

            let post = post.clone();
            Ok(store.with_include(post, include))
        })
        .await
    }

    async fn delete(&self, id: &PostId) -> RepositoryResult<()> {
        execute_query(RepositoryOperation::Delete, ENTITY, async {
            self.begin()?;
            let mut store = self.store.write().await;
            let before = store.posts.len();
            store.posts.retain(|p| &p.id != id);
            if store.posts.len() == before {
                return Err(DatabaseError::not_found(
                    DatabaseOperation::Delete,
                    "Record to delete does not exist",
                ));
            }
            store.comments.retain(|c| &c.post_id != id);
            Ok(())
        })
        .await
    }

    fn search_fields(&self) -> &'static [&'static str] {
        POST_SEARCH_FIELDS
    }
}
