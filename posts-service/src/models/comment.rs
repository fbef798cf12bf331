use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CommentId, PostId};

/// A comment owned by a post
///
/// Comments are deleted with their post. When `is_anonymous` is set the
/// author is never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author: Option<String>,
    pub is_anonymous: bool,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// A new comment on `post_id`; no author means anonymous
    pub fn new(post_id: PostId, content: impl Into<String>, author: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CommentId::new(),
            content: content.into(),
            is_anonymous: author.is_none(),
            author,
            post_id,
            created_at: now,
            updated_at: now,
        }
        .normalized()
    }

    /// Clear the author of anonymous comments
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.is_anonymous {
            self.author = None;
        }
        self
    }
}
