//! Filter and sort translation
//!
//! Turns a datastore-agnostic [`PageRequest`] into [`FindManyArgs`]: a closed
//! set of typed conditions over allow-listed fields, an optional search
//! clause, an order-by and a skip/take window.
//!
//! The filter map is free-form JSON. Keys name fields by their external
//! (camelCase) name; values are either a bare value (equality, or "contains
//! all of" for array fields) or an operator object:
//!
//! | operator | field kinds |
//! |---|---|
//! | `$eq` | string, integer, date |
//! | `$gt` `$gte` `$lt` `$lte` | integer, date |
//! | `$regex` / `$contains` | string |
//! | `$all` / `$hasEvery` | string array |
//!
//! Translation is lenient: unknown fields, unknown operators, operators that
//! do not apply to a field's kind and values that fail coercion are dropped.
//! A filter map with an unknown key translates exactly as if the key were
//! absent.
//!
//! ```rust
//! use posts_service::models::Post;
//! use posts_service::repository::{translate, EntitySchema, FilterOperator, PageRequest};
//! use serde_json::json;
//!
//! let filter = json!({
//!     "title": { "$regex": "test" },
//!     "views": { "$gte": 5 },
//!     "password": "ignored"
//! });
//! let request = PageRequest::new(1, 10)
//!     .with_filter(filter.as_object().unwrap().clone());
//!
//! let args = translate(<Post as EntitySchema>::schema(), &request, &["title", "content"]);
//! assert_eq!(args.filter.conditions.len(), 2);
//! assert_eq!(args.filter.conditions[0].operator, FilterOperator::Contains);
//! assert_eq!(args.order_by.field.name, "createdAt");
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use super::pagination::{OrderDirection, PageRequest, Pagination};

/// Type of an allow-listed field, which decides the operators it accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Text column
    String,
    /// Integer column
    Integer,
    /// Timestamp column
    Date,
    /// Array of text values
    StringArray,
}

/// An allow-listed field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// External name used in filters and `sort`
    pub name: &'static str,
    /// Datastore column
    pub column: &'static str,
    /// Value type
    pub kind: FieldKind,
    /// Whether the field may be sorted on
    pub sortable: bool,
}

impl FieldSpec {
    /// A filterable, non-sortable field
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column,
            kind,
            sortable: false,
        }
    }

    /// Mark the field as sortable
    pub const fn sortable(self) -> Self {
        Self {
            sortable: true,
            ..self
        }
    }
}

/// Per-entity allow-list
#[derive(Debug)]
pub struct Schema {
    /// Entity name used in errors and logs
    pub entity: &'static str,
    /// Allow-listed fields
    pub fields: &'static [FieldSpec],
    /// External name of the field used when no valid sort is requested
    pub default_sort: &'static str,
}

impl Schema {
    /// Look up an allow-listed field by external name
    pub fn field(&self, name: &str) -> Option<FieldSpec> {
        self.fields.iter().find(|f| f.name == name).copied()
    }

    fn default_sort_field(&self) -> FieldSpec {
        self.field(self.default_sort)
            .or_else(|| self.fields.first().copied())
            .unwrap_or(FieldSpec::new("id", "id", FieldKind::String))
    }
}

/// Entities that expose a filter/sort allow-list
pub trait EntitySchema {
    /// The entity's allow-list
    fn schema() -> &'static Schema;
}

/// Comparison operator of a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal (<=)
    LessThanOrEqual,
    /// Substring match
    Contains,
    /// Array contains every listed value
    HasEvery,
}

impl FilterOperator {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "$eq" => Some(Self::Equal),
            "$gt" => Some(Self::GreaterThan),
            "$gte" => Some(Self::GreaterThanOrEqual),
            "$lt" => Some(Self::LessThan),
            "$lte" => Some(Self::LessThanOrEqual),
            "$regex" | "$contains" => Some(Self::Contains),
            "$all" | "$hasEvery" => Some(Self::HasEvery),
            _ => None,
        }
    }

    fn applies_to(&self, kind: FieldKind) -> bool {
        match self {
            Self::Equal => !matches!(kind, FieldKind::StringArray),
            Self::GreaterThan
            | Self::GreaterThanOrEqual
            | Self::LessThan
            | Self::LessThanOrEqual => matches!(kind, FieldKind::Integer | FieldKind::Date),
            Self::Contains => matches!(kind, FieldKind::String),
            Self::HasEvery => matches!(kind, FieldKind::StringArray),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::Contains => write!(f, "contains"),
            Self::HasEvery => write!(f, "@>"),
        }
    }
}

/// A coerced filter operand, or a stored field value being compared
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Text value
    Text(String),
    /// Integer value
    Integer(i64),
    /// Timestamp value
    Timestamp(DateTime<Utc>),
    /// List of text values
    TextList(Vec<String>),
}

impl FilterValue {
    /// Order two values of the same variant; `None` across variants or for lists
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        Self::TextList(value)
    }
}

/// A typed condition over an allow-listed field
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// Field being filtered
    pub field: FieldSpec,
    /// Comparison operator
    pub operator: FilterOperator,
    /// Coerced operand
    pub value: FilterValue,
}

impl FilterCondition {
    /// Evaluate the condition against a stored value
    ///
    /// Used by datastores that filter in process.
    pub fn matches(&self, actual: &FilterValue) -> bool {
        match self.operator {
            FilterOperator::Equal => actual == &self.value,
            FilterOperator::GreaterThan => {
                actual.compare(&self.value) == Some(Ordering::Greater)
            }
            FilterOperator::GreaterThanOrEqual => matches!(
                actual.compare(&self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::LessThan => actual.compare(&self.value) == Some(Ordering::Less),
            FilterOperator::LessThanOrEqual => matches!(
                actual.compare(&self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Contains => match (actual, &self.value) {
                (FilterValue::Text(haystack), FilterValue::Text(needle)) => {
                    haystack.contains(needle.as_str())
                }
                _ => false,
            },
            FilterOperator::HasEvery => match (actual, &self.value) {
                (FilterValue::TextList(have), FilterValue::TextList(want)) => {
                    want.iter().all(|w| have.contains(w))
                }
                _ => false,
            },
        }
    }
}

/// Case-insensitive substring search OR-ed across fields
#[derive(Debug, Clone, PartialEq)]
pub struct SearchClause {
    /// Search term as given
    pub term: String,
    /// Fields searched
    pub fields: Vec<FieldSpec>,
}

impl SearchClause {
    /// Whether any searched field contains the term, ignoring case
    pub fn matches_text(&self, values: &[&str]) -> bool {
        let needle = self.term.to_lowercase();
        values.iter().any(|v| v.to_lowercase().contains(&needle))
    }
}

/// The row-selecting part of a query, shared by the page read and the count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    /// Conditions AND-ed together
    pub conditions: Vec<FilterCondition>,
    /// Optional search, AND-ed with the conditions
    pub search: Option<SearchClause>,
}

impl WhereClause {
    /// Whether the clause selects every row
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.search.is_none()
    }
}

/// Sort directive over an allow-listed field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBy {
    /// Field sorted on
    pub field: FieldSpec,
    /// Direction
    pub direction: OrderDirection,
}

/// Datastore-native arguments for a paged read
#[derive(Debug, Clone, PartialEq)]
pub struct FindManyArgs {
    /// Row selection
    pub filter: WhereClause,
    /// Ordering
    pub order_by: OrderBy,
    /// Skip/take window
    pub pagination: Pagination,
}

/// Translate a page request into datastore arguments
///
/// Pure; never fails. See the module docs for the leniency rules.
pub fn translate(schema: &Schema, request: &PageRequest, search_fields: &[&str]) -> FindManyArgs {
    let mut conditions = Vec::new();

    for (key, value) in &request.filter {
        let Some(field) = schema.field(key) else {
            tracing::debug!(entity = schema.entity, field = %key, "Ignoring filter on unknown field");
            continue;
        };
        collect_conditions(field, value, &mut conditions);
    }

    let search = request.search.as_ref().and_then(|term| {
        let fields: Vec<FieldSpec> = search_fields
            .iter()
            .filter_map(|name| schema.field(name))
            .filter(|f| f.kind == FieldKind::String)
            .collect();
        (!fields.is_empty()).then(|| SearchClause {
            term: term.clone(),
            fields,
        })
    });

    let sort_field = request
        .sort
        .as_deref()
        .and_then(|name| schema.field(name))
        .filter(|f| f.sortable)
        .unwrap_or_else(|| schema.default_sort_field());

    FindManyArgs {
        filter: WhereClause { conditions, search },
        order_by: OrderBy {
            field: sort_field,
            direction: request.order.unwrap_or_default(),
        },
        pagination: request.pagination(),
    }
}

fn collect_conditions(field: FieldSpec, value: &Value, out: &mut Vec<FilterCondition>) {
    match value {
        Value::Object(ops) => {
            for (op_key, operand) in ops {
                let Some(operator) = FilterOperator::from_key(op_key) else {
                    tracing::debug!(field = field.name, operator = %op_key, "Ignoring unknown filter operator");
                    continue;
                };
                push_condition(field, operator, operand, out);
            }
        }
        _ => {
            let operator = if field.kind == FieldKind::StringArray {
                FilterOperator::HasEvery
            } else {
                FilterOperator::Equal
            };
            push_condition(field, operator, value, out);
        }
    }
}

fn push_condition(
    field: FieldSpec,
    operator: FilterOperator,
    operand: &Value,
    out: &mut Vec<FilterCondition>,
) {
    if !operator.applies_to(field.kind) {
        tracing::debug!(field = field.name, %operator, "Ignoring operator not valid for field");
        return;
    }
    match coerce(field.kind, operand) {
        Some(value) => out.push(FilterCondition {
            field,
            operator,
            value,
        }),
        None => {
            tracing::debug!(field = field.name, %operator, "Ignoring filter value that failed coercion");
        }
    }
}

fn coerce(kind: FieldKind, value: &Value) -> Option<FilterValue> {
    match kind {
        FieldKind::String => value.as_str().map(FilterValue::from),
        FieldKind::Integer => coerce_integer(value).map(FilterValue::Integer),
        FieldKind::Date => coerce_date(value).map(FilterValue::Timestamp),
        FieldKind::StringArray => coerce_string_list(value).map(FilterValue::TextList),
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            }),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn coerce_string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}
