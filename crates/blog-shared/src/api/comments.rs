use serde::{Deserialize, Serialize};

use crate::{CommentId, PostId};

/// Body of `POST /comment`. `parent_comment_id` is always sent, as `null`
/// for a top-level comment, and must already be resolved to a root id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: PostId,
    pub content: String,
    pub parent_comment_id: Option<CommentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn top_level_create_sends_explicit_null_parent() {
        let req = CreateCommentRequest {
            post_id: PostId::from("7"),
            content: "hello".to_string(),
            parent_comment_id: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "postId": "7", "content": "hello", "parentCommentId": null })
        );
    }
}
