//! Type-safe identifiers using the TypeID format
//!
//! Every identifier is a prefix plus a base32-encoded UUIDv7, so ids sort by
//! creation time and carry the kind of thing they point at:
//!
//! ```rust
//! use posts_service::ids::PostId;
//! use std::str::FromStr;
//!
//! let id = PostId::new();
//! assert!(id.as_str().starts_with("post_"));
//!
//! let parsed = PostId::from_str(id.as_str()).unwrap();
//! assert_eq!(parsed, id);
//! ```
//!
//! Parsing doubles as the repository's shape precondition: a string that does
//! not parse as a TypeID with the right prefix can never name a stored row.

use http::Request;
use mti::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};

/// Error type for identifier parsing.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The value could not be parsed as a valid TypeID.
    #[error("failed to parse identifier: {0}")]
    Parse(#[from] MagicTypeIdError),

    /// The prefix was not the expected value.
    #[error("invalid prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        /// The expected prefix.
        expected: String,
        /// The actual prefix found.
        actual: String,
    },
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(MagicTypeId);

        impl $name {
            /// The TypeID prefix for this identifier kind
            pub const PREFIX: &'static str = $prefix;

            /// Creates a new time-sortable identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Self::PREFIX.create_type_id::<V7>())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Returns the prefix portion of the identifier.
            #[must_use]
            pub fn prefix(&self) -> &str {
                self.0.prefix().as_str()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let mti = MagicTypeId::from_str(s)?;

                if mti.prefix().as_str() != Self::PREFIX {
                    return Err(IdError::InvalidPrefix {
                        expected: Self::PREFIX.to_string(),
                        actual: mti.prefix().as_str().to_string(),
                    });
                }

                Ok(Self(mti))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::from_str(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

typed_id!(
    /// Identifier of a post, e.g. `post_01h455vb4pex5vsknk084sn02q`.
    PostId,
    "post"
);

typed_id!(
    /// Identifier of a comment, e.g. `comment_01h455vb4pex5vsknk084sn02q`.
    CommentId,
    "comment"
);

typed_id!(
    /// Request identifier used for log correlation, e.g. `req_01h455vb4pex5vsknk084sn02q`.
    RequestId,
    "req"
);

/// A `MakeRequestId` implementation that generates [`RequestId`]s for tower-http.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTypedRequestId;

impl MakeRequestId for MakeTypedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let id = RequestId::new();
        let header_value = http::HeaderValue::from_str(id.as_str()).ok()?;
        Some(TowerRequestId::new(header_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_id_new() {
        let id = PostId::new();
        assert!(id.as_str().starts_with("post_"));
        assert_eq!(id.prefix(), "post");
        // prefix (4) + underscore (1) + suffix (26)
        assert_eq!(id.as_str().len(), 31);
    }

    #[test]
    fn test_post_id_parse() {
        let id_str = "post_01h455vb4pex5vsknk084sn02q";
        let id = PostId::from_str(id_str).unwrap();
        assert_eq!(id.as_str(), id_str);
    }

    #[test]
    fn test_post_id_rejects_other_prefix() {
        let result = PostId::from_str("comment_01h455vb4pex5vsknk084sn02q");

        match result.unwrap_err() {
            IdError::InvalidPrefix { expected, actual } => {
                assert_eq!(expected, "post");
                assert_eq!(actual, "comment");
            }
            other => panic!("Expected InvalidPrefix error, got {other:?}"),
        }
    }

    #[test]
    fn test_post_id_rejects_malformed_values() {
        assert!(PostId::from_str("invalid-id").is_err());
        assert!(PostId::from_str("post_invalid").is_err());
        assert!(PostId::from_str("507f1f77bcf86cd799439011").is_err());
        assert!(PostId::from_str("").is_err());
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let id1 = PostId::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let id2 = PostId::new();
        assert!(id1 < id2);
    }

    #[test]
    fn test_serde_uses_plain_string() {
        let id = CommentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));

        let back: CommentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<CommentId>("\"post_01h455vb4pex5vsknk084sn02q\"").is_err());
    }

    #[test]
    fn test_make_typed_request_id() {
        let mut maker = MakeTypedRequestId;
        let request = http::Request::builder().body(()).unwrap();

        let id = maker.make_request_id(&request).unwrap();
        let header_value = id.into_header_value();
        assert!(header_value.to_str().unwrap().starts_with("req_"));
    }
}
