use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time::deserialize_timestamp;
use super::{CommentId, UserId};
use crate::lenient::{lenient_seq, null_as_default};

/// Denormalized snapshot of the comment author, read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    pub author_id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// A comment as delivered by the post resource. Only top-level comments
/// carry `children`; replies never nest further.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: CommentId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    pub author: CommentAuthor,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_updated: bool,
    #[serde(default)]
    pub parent_comment_id: Option<CommentId>,
    #[serde(default, deserialize_with = "lenient_seq", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Comment>,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_comment_id.is_none()
    }

    pub fn edited_marker(&self) -> Option<&'static str> {
        self.is_updated.then_some("(edited)")
    }
}
