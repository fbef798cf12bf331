//! Domain models: posts and their comments

mod comment;
mod post;

pub use comment::Comment;
pub use post::{
    CreatePost, CreatePostRequest, Post, UpdatePost, UpdatePostRequest, POST_SEARCH_FIELDS,
    TAG_MAX_CHARS,
};
