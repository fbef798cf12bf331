//! Query parameters for list operations
//!
//! Parameters arrive as strings and are coerced here, so a bad value becomes a
//! field error instead of an extractor rejection.
//!
//! # Example
//!
//! ```rust
//! use posts_service::config::PaginationConfig;
//! use posts_service::handlers::ListQuery;
//! use posts_service::repository::OrderDirection;
//!
//! let query = ListQuery {
//!     page: Some("0".into()),
//!     limit: Some("500".into()),
//!     order: Some("asc".into()),
//!     ..ListQuery::default()
//! };
//!
//! let request = query.into_page_request(&PaginationConfig::default()).unwrap();
//! assert_eq!(request.page, 1);
//! assert_eq!(request.limit, 100);
//! assert_eq!(request.order, Some(OrderDirection::Ascending));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PaginationConfig;
use crate::repository::{OrderDirection, PageRequest, DEFAULT_PAGE};
use crate::validation::FieldErrors;

use super::response::FieldError;

/// Raw list query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Page number (1-indexed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    /// Page size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,

    /// Free-text search term
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    /// Field to sort by, by external name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// `asc` or `desc`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,

    /// JSON object mapping fields to values or operator objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

fn parse_number(field: &str, raw: Option<&str>, errors: &mut FieldErrors) -> Option<i64> {
    let raw = raw?.trim();
    match raw.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            let received = if raw.parse::<f64>().is_ok_and(f64::is_finite) {
                "Expected integer, received float"
            } else {
                "Expected number, received nan"
            };
            errors.push(FieldError::new(field, received));
            None
        }
    }
}

impl ListQuery {
    /// Coerce into a [`PageRequest`], applying the configured limits
    ///
    /// `page` below 1 becomes 1 and `limit` is clamped into
    /// `1..=max_limit`. Non-numeric numbers, an unknown `order` and a
    /// `filter` that is not a JSON object are field errors.
    pub fn into_page_request(
        self,
        config: &PaginationConfig,
    ) -> Result<PageRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        let page = parse_number("page", self.page.as_deref(), &mut errors);
        let limit = parse_number("limit", self.limit.as_deref(), &mut errors);

        let order = match self.order.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = OrderDirection::parse(raw);
                if parsed.is_none() {
                    errors.push(FieldError::new(
                        "order",
                        format!("Invalid enum value. Expected 'asc' | 'desc', received '{raw}'"),
                    ));
                }
                parsed
            }
        };

        let filter = match self.filter.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => Some(map),
                Ok(other) => {
                    let kind = match other {
                        Value::Array(_) => "array",
                        Value::String(_) => "string",
                        Value::Number(_) => "number",
                        Value::Bool(_) => "boolean",
                        _ => "null",
                    };
                    errors.push(FieldError::new(
                        "filter",
                        format!("Expected object, received {kind}"),
                    ));
                    None
                }
                Err(_) => {
                    errors.push(FieldError::new("filter", "Invalid JSON"));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let page = page.map_or(DEFAULT_PAGE, |p| u64::try_from(p).unwrap_or(0).max(1));
        let limit = limit.map_or(config.default_limit, |l| u64::try_from(l).unwrap_or(0));

        let mut request = PageRequest {
            page,
            limit: limit.clamp(1, config.max_limit.max(1)),
            sort: self.sort.filter(|s| !s.trim().is_empty()),
            order,
            ..PageRequest::default()
        };
        if let Some(search) = self.search {
            request = request.with_search(search);
        }
        if let Some(filter) = filter {
            request = request.with_filter(filter);
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig::default()
    }

    #[test]
    fn test_defaults() {
        let request = ListQuery::default().into_page_request(&config()).unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.limit, 10);
        assert!(request.order.is_none());
        assert!(request.search.is_none());
        assert!(request.filter.is_empty());
    }

    #[test]
    fn test_numbers_are_coerced_and_bounded() {
        let query = ListQuery {
            page: Some("-4".into()),
            limit: Some("0".into()),
            ..ListQuery::default()
        };
        let request = query.into_page_request(&config()).unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.limit, 1);

        let query = ListQuery {
            page: Some("3".into()),
            limit: Some("25".into()),
            ..ListQuery::default()
        };
        let request = query.into_page_request(&config()).unwrap();
        assert_eq!(request.pagination().skip, 50);
    }

    #[test]
    fn test_bad_values_are_field_errors() {
        let query = ListQuery {
            page: Some("two".into()),
            limit: Some("2.5".into()),
            order: Some("sideways".into()),
            filter: Some("[1]".into()),
            ..ListQuery::default()
        };
        let errors = query.into_page_request(&config()).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["page", "limit", "order", "filter"]);
        assert_eq!(errors[0].message, "Expected number, received nan");
        assert_eq!(errors[1].message, "Expected integer, received float");
        assert_eq!(errors[3].message, "Expected object, received array");
    }

    #[test]
    fn test_filter_and_search_pass_through() {
        let query = ListQuery {
            search: Some("  ".into()),
            filter: Some(r#"{"views":{"$gt":3}}"#.into()),
            sort: Some("views".into()),
            ..ListQuery::default()
        };
        let request = query.into_page_request(&config()).unwrap();
        assert!(request.search.is_none());
        assert_eq!(request.sort.as_deref(), Some("views"));
        assert!(request.filter.contains_key("views"));
    }

    #[test]
    fn test_configured_max_limit() {
        let config = PaginationConfig {
            default_limit: 5,
            max_limit: 20,
        };
        let query = ListQuery {
            limit: Some("50".into()),
            ..ListQuery::default()
        };
        assert_eq!(query.into_page_request(&config).unwrap().limit, 20);
        assert_eq!(
            ListQuery::default().into_page_request(&config).unwrap().limit,
            5
        );
    }
}
