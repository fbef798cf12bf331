//! Router assembly

use axum::{http::Uri, routing::get, Router};

use crate::handlers::{posts, ApiError, PostDelegate};
use crate::health::{health, readiness};
use crate::state::AppState;

/// All routes, without the server's middleware stack
///
/// - `GET /health`, `GET /ready`
/// - the post routes under `/api/posts`
/// - any other path: 404 error envelope
pub fn build_router<D: PostDelegate>(state: AppState<D>) -> Router {
    Router::new()
        .route("/health", get(health::<D>))
        .route("/ready", get(readiness::<D>))
        .nest("/api/posts", posts::routes::<D>())
        .fallback(route_not_found)
        .with_state(state)
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::route_not_found(uri.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::repository::MemoryPostDelegate;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(AppState::new(Config::default(), MemoryPostDelegate::new()))
    }

    #[tokio::test]
    async fn test_unknown_route_is_enveloped_404() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["errorCode"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "Route /api/nope not found");
    }

    #[tokio::test]
    async fn test_health_routes() {
        for uri in ["/health", "/ready"] {
            let response = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }
}
