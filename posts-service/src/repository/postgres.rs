//! PostgreSQL post delegate
//!
//! Queries are assembled with [`sqlx::QueryBuilder`]. Column names only ever
//! come from the field allow-list; every operand is a bind parameter.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::{DatabaseError, DatabaseErrorKind, DatabaseOperation};
use crate::ids::{CommentId, PostId};
use crate::models::{Comment, CreatePost, Post, UpdatePost, POST_SEARCH_FIELDS};

use super::delegate::execute_query;
use super::error::RepositoryOperation;
use super::filter::{FilterOperator, FilterValue, FindManyArgs, WhereClause};
use super::traits::{Delegate, Include, RepositoryResult};

const ENTITY: &str = "Post";
const POST_COLUMNS: &str = "id, title, content, tags, views, created_at, updated_at";

/// Statements creating the tables this delegate reads and writes
pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        title VARCHAR(255) NOT NULL,
        content TEXT NOT NULL,
        tags TEXT[] NOT NULL DEFAULT '{}',
        views BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    // The only unique constraint besides primary keys; writes that hit it map to DUPLICATE
    "CREATE UNIQUE INDEX IF NOT EXISTS posts_title_key ON posts (title)",
    r#"CREATE TABLE IF NOT EXISTS comments (
        id TEXT PRIMARY KEY,
        content TEXT NOT NULL,
        author TEXT,
        is_anonymous BOOLEAN NOT NULL DEFAULT FALSE,
        post_id TEXT NOT NULL REFERENCES posts (id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS comments_post_id_idx ON comments (post_id, created_at)",
];

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: String,
    title: String,
    content: String,
    tags: Vec<String>,
    views: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = DatabaseError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: parse_stored_id(&row.id)?,
            title: row.title,
            content: row.content,
            tags: row.tags,
            views: row.views,
            created_at: row.created_at,
            updated_at: row.updated_at,
            comments: None,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: String,
    content: String,
    author: Option<String>,
    is_anonymous: bool,
    post_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = DatabaseError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let comment = Comment {
            id: parse_stored_id::<CommentId>(&row.id)?,
            content: row.content,
            author: row.author,
            is_anonymous: row.is_anonymous,
            post_id: parse_stored_id(&row.post_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Ok(comment.normalized())
    }
}

fn parse_stored_id<T>(raw: &str) -> Result<T, DatabaseError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| {
        DatabaseError::new(
            DatabaseOperation::Query,
            DatabaseErrorKind::TypeConversion,
            format!("Stored id '{raw}' is not valid: {e}"),
        )
    })
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(text) => qb.push_bind(text.clone()),
        FilterValue::Integer(n) => qb.push_bind(*n),
        FilterValue::Timestamp(at) => qb.push_bind(*at),
        FilterValue::TextList(items) => qb.push_bind(items.clone()),
    };
}

/// Append a WHERE clause; nothing is appended for an empty filter
fn push_where(qb: &mut QueryBuilder<'_, Postgres>, filter: &WhereClause) {
    let mut keyword = " WHERE ";

    for condition in &filter.conditions {
        qb.push(keyword);
        keyword = " AND ";

        let column = condition.field.column;
        match condition.operator {
            FilterOperator::Contains => {
                qb.push("strpos(").push(column).push(", ");
                push_value(qb, &condition.value);
                qb.push(") > 0");
            }
            operator => {
                qb.push(column).push(" ").push(operator).push(" ");
                push_value(qb, &condition.value);
            }
        }
    }

    if let Some(search) = filter.search.as_ref().filter(|s| !s.fields.is_empty()) {
        qb.push(keyword).push("(");
        for (i, field) in search.fields.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("strpos(lower(")
                .push(field.column)
                .push("), lower(")
                .push_bind(search.term.clone())
                .push(")) > 0");
        }
        qb.push(")");
    }
}

fn limit_param(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Post delegate backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgPostDelegate {
    pool: PgPool,
}

impl PgPostDelegate {
    /// Wrap a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_comments(&self, post_id: &PostId) -> Result<Vec<Comment>, DatabaseError> {
        let rows: Vec<CommentRow> = sqlx::query_as(
            "SELECT id, content, author, is_anonymous, post_id, created_at, updated_at \
             FROM comments WHERE post_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Query))?;

        rows.into_iter().map(Comment::try_from).collect()
    }

    async fn with_include(&self, post: Post, include: Include) -> Result<Post, DatabaseError> {
        if !include.contains("comments") {
            return Ok(post);
        }
        let comments = self.load_comments(&post.id).await?;
        Ok(Post {
            comments: Some(comments),
            ..post
        })
    }
}

impl Delegate for PgPostDelegate {
    type Id = PostId;
    type Entity = Post;
    type Create = CreatePost;
    type Update = UpdatePost;

    async fn find_unique(&self, id: &PostId, include: Include) -> RepositoryResult<Option<Post>> {
        execute_query(RepositoryOperation::FindById, ENTITY, async {
            let row: Option<PostRow> =
                sqlx::query_as(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
                    .bind(id.as_str())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Query))?;

            match row {
                Some(row) => Ok(Some(self.with_include(row.try_into()?, include).await?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn find_many(&self, args: &FindManyArgs) -> RepositoryResult<Vec<Post>> {
        execute_query(RepositoryOperation::FindAll, ENTITY, async {
            let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts"));
            push_where(&mut qb, &args.filter);

            let direction = args.order_by.direction.as_sql();
            qb.push(" ORDER BY ")
                .push(args.order_by.field.column)
                .push(" ")
                .push(direction)
                .push(", id ")
                .push(direction)
                .push(" LIMIT ")
                .push_bind(limit_param(args.pagination.take))
                .push(" OFFSET ")
                .push_bind(limit_param(args.pagination.skip));

            let rows: Vec<PostRow> = qb
                .build_query_as()
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Query))?;

            rows.into_iter().map(Post::try_from).collect()
        })
        .await
    }

    async fn count(&self, filter: &WhereClause) -> RepositoryResult<u64> {
        execute_query(RepositoryOperation::Count, ENTITY, async {
            let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
            push_where(&mut qb, filter);

            let total: i64 = qb
                .build_query_scalar()
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Query))?;

            Ok(u64::try_from(total).unwrap_or_default())
        })
        .await
    }

    async fn create(&self, data: CreatePost, include: Include) -> RepositoryResult<Post> {
        execute_query(RepositoryOperation::Create, ENTITY, async {
            let row: PostRow = sqlx::query_as(&format!(
                "INSERT INTO posts (id, title, content, tags) VALUES ($1, $2, $3, $4) \
                 RETURNING {POST_COLUMNS}"
            ))
            .bind(PostId::new().as_str())
            .bind(data.title)
            .bind(data.content)
            .bind(data.tags)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Insert))?;

            self.with_include(row.try_into()?, include).await
        })
        .await
    }

    async fn update(&self, id: &PostId, data: UpdatePost, include: Include) -> RepositoryResult<Post> {
        execute_query(RepositoryOperation::Update, ENTITY, async {
            let mut qb = QueryBuilder::<Postgres>::new("UPDATE posts SET ");
            let mut set = qb.separated(", ");
            if let Some(title) = data.title {
                set.push("title = ").push_bind_unseparated(title);
            }
            if let Some(content) = data.content {
                set.push("content = ").push_bind_unseparated(content);
            }
            if let Some(tags) = data.tags {
                set.push("tags = ").push_bind_unseparated(tags);
            }
            set.push("updated_at = GREATEST(now(), created_at)");

            qb.push(" WHERE id = ")
                .push_bind(id.as_str().to_string())
                .push(format!(" RETURNING {POST_COLUMNS}"));

            let row: PostRow = qb
                .build_query_as()
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Update))?;

            self.with_include(row.try_into()?, include).await
        })
        .await
    }

    async fn delete(&self, id: &PostId) -> RepositoryResult<()> {
        execute_query(RepositoryOperation::Delete, ENTITY, async {
            let result = sqlx::query("DELETE FROM posts WHERE id = $1")
                .bind(id.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Delete))?;

            if result.rows_affected() == 0 {
                return Err(DatabaseError::not_found(
                    DatabaseOperation::Delete,
                    format!("No post with id {id}"),
                ));
            }
            Ok(())
        })
        .await
    }

    fn search_fields(&self) -> &'static [&'static str] {
        POST_SEARCH_FIELDS
    }
}
