use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::time::parse_timestamp;
use super::{Comment, PostId};
use crate::content::PostContent;
use crate::lenient::{lenient_seq, null_as_default};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(alias = "id")]
    pub post_id: PostId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub content: PostContent,
    /// Malformed comments are dropped individually.
    #[serde(default, deserialize_with = "lenient_seq")]
    pub comments: Vec<Comment>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // Only shown in the header, so an unreadable date is simply left out
    Ok(Value::deserialize(deserializer)?.as_str().and_then(parse_timestamp))
}
