use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::ids::PostId;
use crate::repository::{EntitySchema, FieldKind, FieldSpec, FilterValue, Schema};

use super::Comment;

/// Fields free-text search runs over
pub const POST_SEARCH_FIELDS: &[&str] = &["title", "content"];

static POST_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "id", FieldKind::String),
    FieldSpec::new("title", "title", FieldKind::String).sortable(),
    FieldSpec::new("content", "content", FieldKind::String),
    FieldSpec::new("views", "views", FieldKind::Integer).sortable(),
    FieldSpec::new("tags", "tags", FieldKind::StringArray),
    FieldSpec::new("createdAt", "created_at", FieldKind::Date).sortable(),
    FieldSpec::new("updatedAt", "updated_at", FieldKind::Date).sortable(),
];

static POST_SCHEMA: Schema = Schema {
    entity: "Post",
    fields: POST_FIELDS,
    default_sort: "createdAt",
};

/// A post
///
/// `comments` is only present when the read asked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl Post {
    /// Stored value of an allow-listed field, by external name
    pub fn field_value(&self, name: &str) -> Option<FilterValue> {
        match name {
            "id" => Some(FilterValue::from(self.id.as_str())),
            "title" => Some(FilterValue::from(self.title.as_str())),
            "content" => Some(FilterValue::from(self.content.as_str())),
            "views" => Some(FilterValue::Integer(self.views)),
            "tags" => Some(FilterValue::TextList(self.tags.clone())),
            "createdAt" => Some(FilterValue::Timestamp(self.created_at)),
            "updatedAt" => Some(FilterValue::Timestamp(self.updated_at)),
            _ => None,
        }
    }

    /// Drop loaded relations
    #[must_use]
    pub fn without_comments(mut self) -> Self {
        self.comments = None;
        self
    }
}

impl EntitySchema for Post {
    fn schema() -> &'static Schema {
        &POST_SCHEMA
    }
}

/// Longest accepted tag, in characters
pub const TAG_MAX_CHARS: usize = 50;

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|tag| tag.chars().count() > TAG_MAX_CHARS) {
        return Err(ValidationError::new("tag_length").with_message(Cow::Owned(format!(
            "Tag must be less than {TAG_MAX_CHARS} characters"
        ))));
    }
    Ok(())
}

fn at_least_one_field(request: &UpdatePostRequest) -> Result<(), ValidationError> {
    if request.title.is_none() && request.content.is_none() && request.tags.is_none() {
        return Err(ValidationError::new("empty_update")
            .with_message(Cow::Borrowed("At least one field must be provided for update")));
    }
    Ok(())
}

/// Body of `POST /api/posts`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(required(message = "Required"), length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(required(message = "Required"), length(min = 1, max = 1000))]
    pub content: Option<String>,

    #[serde(default)]
    #[validate(
        length(max = 10, message = "Maximum 10 tags allowed"),
        custom(function = "validate_tags")
    )]
    pub tags: Vec<String>,
}

impl CreatePostRequest {
    /// The payload, once `title` and `content` are present
    pub fn into_create(self) -> Option<CreatePost> {
        Some(CreatePost {
            title: self.title?,
            content: self.content?,
            tags: self.tags,
        })
    }
}

/// Body of `PATCH /api/posts/{id}`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "at_least_one_field"))]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 1000))]
    pub content: Option<String>,

    #[validate(
        length(max = 10, message = "Maximum 10 tags allowed"),
        custom(function = "validate_tags")
    )]
    pub tags: Option<Vec<String>>,
}

impl From<UpdatePostRequest> for UpdatePost {
    fn from(request: UpdatePostRequest) -> Self {
        Self {
            title: request.title,
            content: request.content,
            tags: request.tags,
        }
    }
}

/// Validated payload for creating a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    /// Empty when the request omitted tags
    pub tags: Vec<String>,
}

/// Validated payload for a partial update; at least one field is set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Post {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Post {
            id: "post_01h455vb4pex5vsknk084sn02q".parse().unwrap(),
            title: "Test Post".into(),
            content: "Test Content".into(),
            tags: vec!["test".into()],
            views: 3,
            created_at: at,
            updated_at: at,
            comments: None,
        }
    }

    #[test]
    fn test_serializes_camel_case_without_comments() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["id"], "post_01h455vb4pex5vsknk084sn02q");
        assert_eq!(json["createdAt"], "2024-05-01T12:00:00Z");
        assert_eq!(json["tags"], serde_json::json!(["test"]));
        assert!(json.get("comments").is_none());
    }

    #[test]
    fn test_serializes_loaded_comments() {
        let post = Post {
            comments: Some(vec![]),
            ..sample()
        };
        let json = serde_json::to_value(post).unwrap();
        assert_eq!(json["comments"], serde_json::json!([]));
    }

    #[test]
    fn test_every_schema_field_has_a_value() {
        let post = sample();
        for field in Post::schema().fields {
            assert!(post.field_value(field.name).is_some(), "{}", field.name);
        }
        assert!(post.field_value("password").is_none());
    }

    #[test]
    fn test_create_request_rules() {
        let request = CreatePostRequest {
            title: Some("t".repeat(256)),
            content: None,
            tags: vec!["x".repeat(TAG_MAX_CHARS + 1)],
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert_eq!(fields["content"][0].code, "required");
        assert_eq!(fields["tags"][0].code, "tag_length");
    }

    #[test]
    fn test_update_request_needs_a_field() {
        let errors = UpdatePostRequest::default().validate().unwrap_err();
        let all = &errors.field_errors()["__all__"];
        assert_eq!(all[0].code, "empty_update");

        let request = UpdatePostRequest {
            tags: Some(vec![]),
            ..UpdatePostRequest::default()
        };
        assert!(request.validate().is_ok());
        assert_eq!(UpdatePost::from(request).tags, Some(vec![]));
    }
}
