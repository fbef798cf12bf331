//! Health check handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Readiness check response with dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Service name
    pub service: String,

    /// Dependency statuses
    pub dependencies: HashMap<String, DependencyStatus>,
}

/// Individual dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    /// Dependency is healthy
    pub healthy: bool,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness probe; 200 whenever the process is serving
pub async fn health<D>(State(state): State<AppState<D>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness probe
///
/// Pings the database when the service runs on one; 503 when the ping
/// fails. The in-memory store is always ready.
pub async fn readiness<D>(State(state): State<AppState<D>>) -> impl IntoResponse {
    let mut dependencies = HashMap::new();

    let status = match state.db() {
        Some(pool) => match sqlx::query("SELECT 1").execute(&pool).await {
            Ok(_) => DependencyStatus {
                healthy: true,
                message: Some("Connected".to_string()),
            },
            Err(e) => {
                tracing::error!("Database health check failed: {}", e);
                DependencyStatus {
                    healthy: false,
                    message: Some("Database connection failed".to_string()),
                }
            }
        },
        None => DependencyStatus {
            healthy: true,
            message: Some("In-memory store".to_string()),
        },
    };
    let ready = status.healthy;
    dependencies.insert("datastore".to_string(), status);

    let response = ReadinessResponse {
        ready,
        service: state.config().service.name.clone(),
        dependencies,
    };

    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::repository::MemoryPostDelegate;

    #[tokio::test]
    async fn test_memory_store_is_ready() {
        let state = AppState::new(Config::default(), MemoryPostDelegate::new());

        let response = readiness(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = health(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
