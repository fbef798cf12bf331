//! # posts-service
//!
//! REST service for blog posts and their comments, built on a generic
//! repository that pages, filters and sorts any entity through a datastore
//! delegate.
//!
//! ## Layers
//!
//! - **Repository**: [`Repository`](repository::Repository) translates list
//!   queries into datastore arguments, runs data and count queries
//!   concurrently, and normalizes every datastore failure into a
//!   [`RepositoryError`](repository::RepositoryError)
//! - **Delegates**: PostgreSQL ([`PgPostDelegate`](repository::PgPostDelegate))
//!   or in-memory ([`MemoryPostDelegate`](repository::MemoryPostDelegate))
//! - **HTTP**: axum handlers under `/api/posts` that render a uniform
//!   `{ success, data | error }` envelope
//! - **Middleware**: request ids, sensitive header masking, body limits,
//!   timeouts, compression, CORS and panic recovery
//!
//! ## Example
//!
//! ```rust,no_run
//! use posts_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::new(config.clone(), MemoryPostDelegate::new());
//!     Server::new(config).serve(build_router(state)).await
//! }
//! ```

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repository;
pub mod server;
pub mod state;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::app::build_router;
    pub use crate::config::{Config, DatabaseConfig, PaginationConfig};
    pub use crate::database::{bootstrap_schema, create_pool};
    pub use crate::error::{DatabaseError, DatabaseErrorKind, DatabaseOperation, Error, Result};
    pub use crate::handlers::{ApiError, ApiSuccess, PostDelegate};
    pub use crate::health::{health, readiness};
    pub use crate::ids::{CommentId, PostId, RequestId};
    pub use crate::models::{Comment, CreatePost, Post, UpdatePost};
    pub use crate::observability::{init_tracing, shutdown_tracing};
    pub use crate::repository::{
        Delegate, FindManyArgs, Include, MemoryPostDelegate, PageRequest, PaginatedResult,
        PgPostDelegate, Repository, RepositoryError,
    };
    pub use crate::server::Server;
    pub use crate::state::AppState;

    pub use axum::Router;
    pub use tracing::{debug, error, info, warn};
}
