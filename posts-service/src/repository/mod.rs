//! Generic data access for paginated CRUD
//!
//! The layers, from the HTTP side down:
//!
//! - [`Repository`]: identifier shape checks, filter translation and the
//!   concurrent page-plus-count read
//! - [`translate`]: turns a [`PageRequest`] into [`FindManyArgs`] over an
//!   entity's field allow-list ([`EntitySchema`])
//! - [`Delegate`]: the physical operations of one datastore; every call runs
//!   through [`execute_query`], which normalizes driver failures into
//!   [`RepositoryError`]
//!
//! Two post delegates ship with the crate: [`PgPostDelegate`] over a
//! PostgreSQL pool and [`MemoryPostDelegate`] in process memory.
//!
//! # Example
//!
//! ```rust,no_run
//! use posts_service::models::CreatePost;
//! use posts_service::repository::{Include, MemoryPostDelegate, PageRequest, Repository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = Repository::new(MemoryPostDelegate::new());
//! repository
//!     .create(
//!         CreatePost {
//!             title: "Hello".into(),
//!             content: "World".into(),
//!             tags: vec![],
//!         },
//!         Include::none(),
//!     )
//!     .await?;
//!
//! let page = repository.find_all(&PageRequest::new(1, 10)).await?;
//! assert_eq!(page.meta.total(), 1);
//! # Ok(())
//! # }
//! ```

mod base;
mod delegate;
mod error;
mod filter;
mod memory;
mod pagination;
mod postgres;
mod traits;

pub use base::Repository;
pub use delegate::{execute_query, normalize};
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use filter::{
    translate, EntitySchema, FieldKind, FieldSpec, FilterCondition, FilterOperator, FilterValue,
    FindManyArgs, OrderBy, Schema, SearchClause, WhereClause,
};
pub use memory::MemoryPostDelegate;
pub use pagination::{
    OrderDirection, PageMeta, PageRequest, PaginatedResult, Pagination, DEFAULT_LIMIT,
    DEFAULT_PAGE, MAX_LIMIT,
};
pub use postgres::{PgPostDelegate, SCHEMA_STATEMENTS};
pub use traits::{Delegate, Include, RepositoryResult};
