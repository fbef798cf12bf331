//! Pagination request and paginated result types
//!
//! A [`PageRequest`] is what the HTTP layer hands to the repository: 1-based
//! page, page size, free-text search, a sort directive and a free-form filter
//! map. The repository turns it into a [`Pagination`] window (skip/take) and
//! returns a [`PaginatedResult`] whose [`PageMeta`] is always computed from
//! `total`, `page` and `limit`.
//!
//! ```rust
//! use posts_service::repository::{PageMeta, PageRequest};
//!
//! let request = PageRequest::new(3, 10);
//! assert_eq!(request.pagination().skip, 20);
//!
//! let meta = PageMeta::new(45, 3, 10);
//! assert_eq!(meta.total_pages(), 5);
//! assert!(meta.has_next());
//! assert!(meta.has_prev());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Page used when the request does not name one
pub const DEFAULT_PAGE: u64 = 1;

/// Page size used when the request does not name one
pub const DEFAULT_LIMIT: u64 = 10;

/// Upper bound for the page size
pub const MAX_LIMIT: u64 = 100;

/// Direction for ordering results
///
/// Defaults to descending: newest first when sorting by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[serde(rename = "asc")]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl OrderDirection {
    /// Parse `asc` / `desc`, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Ascending),
            "desc" => Some(Self::Descending),
            _ => None,
        }
    }

    /// SQL keyword for this direction
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// Window of rows handed to the datastore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of rows to skip
    pub skip: u64,
    /// Maximum number of rows to return
    pub take: u64,
}

impl Pagination {
    /// Window for a 1-based page number
    ///
    /// Page 0 is treated as page 1.
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        Self {
            skip: page_number.saturating_sub(1).saturating_mul(page_size),
            take: page_size,
        }
    }
}

/// A request for one page of entities
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u64,
    /// Page size
    pub limit: u64,
    /// Free-text search across the delegate's search fields
    pub search: Option<String>,
    /// External name of the field to sort by
    pub sort: Option<String>,
    /// Sort direction; descending when absent
    pub order: Option<OrderDirection>,
    /// Free-form filter map, field name to value or operator object
    pub filter: Map<String, Value>,
}

impl PageRequest {
    /// Build a request, normalizing page and limit into range
    #[must_use]
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_LIMIT),
            ..Self::default()
        }
    }

    /// Set the search string; blank strings clear it
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search)
        };
        self
    }

    /// Set the sort field and direction
    #[must_use]
    pub fn with_sort(mut self, field: impl Into<String>, order: OrderDirection) -> Self {
        self.sort = Some(field.into());
        self.order = Some(order);
        self
    }

    /// Set the sort direction only
    #[must_use]
    pub fn with_order(mut self, order: OrderDirection) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the filter map
    #[must_use]
    pub fn with_filter(mut self, filter: Map<String, Value>) -> Self {
        self.filter = filter;
        self
    }

    /// The skip/take window for this request
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::page(self.page.max(1), self.limit.max(1))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
            sort: None,
            order: None,
            filter: Map::new(),
        }
    }
}

/// Derived pagination metadata
///
/// Only `total`, `page` and `limit` are inputs; the remaining fields are
/// computed in [`PageMeta::new`] and cannot be set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    total: u64,
    page: u64,
    limit: u64,
    total_pages: u64,
    has_next: bool,
    has_prev: bool,
}

impl PageMeta {
    /// Compute metadata for `total` rows viewed `limit` at a time
    #[must_use]
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total_pages = calculate_total_pages(total, limit);

        Self {
            total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Total rows matching the filter
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Current 1-based page
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Page size
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// `ceil(total / limit)`
    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// Whether a later page exists
    pub fn has_next(&self) -> bool {
        self.has_next
    }

    /// Whether an earlier page exists
    pub fn has_prev(&self) -> bool {
        self.has_prev
    }
}

fn calculate_total_pages(total: u64, limit: u64) -> u64 {
    total.div_ceil(limit)
}

/// One page of entities plus its metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResult<T> {
    /// Entities on this page
    pub items: Vec<T>,
    /// Derived pagination metadata
    pub meta: PageMeta,
}

impl<T> PaginatedResult<T> {
    /// Assemble a page, deriving its metadata
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        Self {
            items,
            meta: PageMeta::new(total, page, limit),
        }
    }

    /// Transform the items, keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
