//! Post endpoints
//!
//! | method | path | success |
//! |---|---|---|
//! | GET | `/` | 200, one page of posts |
//! | POST | `/` | 201, the created post |
//! | GET | `/{id}` | 200, the post with its comments |
//! | PATCH | `/{id}` | 200, the updated post |
//! | DELETE | `/{id}` | 204, null data |

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};

use crate::ids::PostId;
use crate::models::{CreatePost, Post, UpdatePost};
use crate::repository::{Delegate, Include, PaginatedResult};
use crate::state::AppState;
use crate::validation::{validate_create, validate_update};

use super::error::{ApiError, ApiOperation};
use super::extract::{ApiQuery, JsonBody};
use super::query::ListQuery;
use super::response::{ApiSuccess, Deleted};

const ENTITY: &str = "Post";
const WITH_COMMENTS: Include = Include::relations(&["comments"]);

/// A delegate that stores posts
pub trait PostDelegate:
    Delegate<Id = PostId, Entity = Post, Create = CreatePost, Update = UpdatePost> + 'static
{
}

impl<T> PostDelegate for T where
    T: Delegate<Id = PostId, Entity = Post, Create = CreatePost, Update = UpdatePost> + 'static
{
}

/// Post routes, to be nested under a prefix
pub fn routes<D: PostDelegate>() -> Router<AppState<D>> {
    Router::new()
        .route("/", get(list_posts::<D>).post(create_post::<D>))
        .route(
            "/{id}",
            get(get_post::<D>)
                .patch(update_post::<D>)
                .delete(delete_post::<D>),
        )
}

/// List posts with paging, search, sort and filter
pub async fn list_posts<D: PostDelegate>(
    State(state): State<AppState<D>>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<ApiSuccess<PaginatedResult<Post>>, ApiError> {
    let request = query
        .into_page_request(&state.config().pagination)
        .map_err(|errors| ApiError::validation(errors).with_operation(ApiOperation::List))?;

    let page = state.repository().find_all(&request).await?;
    Ok(ApiSuccess::ok(page))
}

/// Create a post
pub async fn create_post<D: PostDelegate>(
    State(state): State<AppState<D>>,
    JsonBody(body): JsonBody,
) -> Result<ApiSuccess<Post>, ApiError> {
    let data = validate_create(body)?;

    let post = state.repository().create(data, Include::none()).await?;
    tracing::info!(id = %post.id, "Post created");
    Ok(ApiSuccess::created(post))
}

/// Fetch one post with its comments
pub async fn get_post<D: PostDelegate>(
    State(state): State<AppState<D>>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<Post>, ApiError> {
    state
        .repository()
        .find_by_id(&id, WITH_COMMENTS)
        .await?
        .map(ApiSuccess::ok)
        .ok_or_else(|| ApiError::not_found(ENTITY))
}

/// Apply a partial update
pub async fn update_post<D: PostDelegate>(
    State(state): State<AppState<D>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<ApiSuccess<Post>, ApiError> {
    let data = validate_update(body).map_err(|err| err.with_operation(ApiOperation::Update))?;

    let post = state.repository().update(&id, data, Include::none()).await?;
    tracing::info!(id = %post.id, "Post updated");
    Ok(ApiSuccess::ok(post))
}

/// Delete a post and its comments
pub async fn delete_post<D: PostDelegate>(
    State(state): State<AppState<D>>,
    Path(id): Path<String>,
) -> Result<Deleted, ApiError> {
    state.repository().delete(&id).await?;
    tracing::info!(%id, "Post deleted");
    Ok(Deleted)
}
