//! Two-level comment threads.
//!
//! The backend delivers top-level comments with their replies attached as
//! `children`. A reply to a reply is stored against the top-level comment,
//! so a thread is never deeper than root + replies.

mod access;
mod index;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Comment, CommentId};

pub use access::{InFlight, MutationError, MutationState, Viewer};
pub use index::ThreadIndex;

/// Returns the id a new reply to `target` must be stored under.
///
/// Walks the delivered list: a top-level hit returns itself, a hit among a
/// top-level comment's children returns the top-level id. An id that is not
/// loaded is returned unchanged. [`ThreadIndex`] answers the same question
/// without rescanning.
pub fn resolve_root_parent(comments: &[Comment], target: &CommentId) -> CommentId {
    for comment in comments {
        if &comment.comment_id == target {
            return comment.comment_id.clone();
        }
        if comment.children.iter().any(|child| &child.comment_id == target) {
            return comment.comment_id.clone();
        }
    }
    target.clone()
}

/// Text a reply composer starts with.
pub fn reply_prefill(username: &str) -> String {
    format!("@{} ", username)
}

pub fn reply_count_label(count: usize) -> String {
    if count == 1 {
        "1 reply".to_string()
    } else {
        format!("{} replies", count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            Self::Newest => Self::Oldest,
            Self::Oldest => Self::Newest,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest First",
            Self::Oldest => "Oldest First",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown sort order: {0}")]
pub struct UnknownSortOrder(String);

impl FromStr for SortOrder {
    type Err = UnknownSortOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            other => Err(UnknownSortOrder(other.to_string())),
        }
    }
}

/// A reply inside a thread. It carries no children of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub comment: Comment,
    pub parent_id: CommentId,
}

/// A root comment and its replies, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    pub root: Comment,
    pub replies: Vec<Reply>,
}

/// Borrowed view of either level of a thread.
#[derive(Debug, Clone, Copy)]
pub enum CommentNode<'a> {
    Root(&'a Thread),
    Reply(&'a Reply),
}

impl<'a> CommentNode<'a> {
    pub fn comment(&self) -> &'a Comment {
        match self {
            Self::Root(thread) => &thread.root,
            Self::Reply(reply) => &reply.comment,
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply(_))
    }
}

impl Thread {
    fn from_root(comment: &Comment) -> Self {
        let mut thread = Self {
            root: Comment {
                children: Vec::new(),
                ..comment.clone()
            },
            replies: Vec::with_capacity(comment.children.len()),
        };
        for child in &comment.children {
            thread.adopt(child);
        }
        thread
    }

    /// Attaches `comment` and anything delivered beneath it as flat replies.
    fn adopt(&mut self, comment: &Comment) {
        self.replies.push(Reply {
            comment: Comment {
                children: Vec::new(),
                ..comment.clone()
            },
            parent_id: self.root.comment_id.clone(),
        });
        for child in &comment.children {
            self.adopt(child);
        }
    }

    pub fn id(&self) -> &CommentId {
        &self.root.comment_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.root.created_at
    }

    pub fn reply_count(&self) -> usize {
        self.replies.len()
    }

    /// Root first, then replies.
    pub fn nodes(&self) -> impl Iterator<Item = CommentNode<'_>> {
        std::iter::once(CommentNode::Root(self)).chain(self.replies.iter().map(CommentNode::Reply))
    }
}

/// Shapes the delivered comment list into threads.
///
/// Replies that arrive at top level with a `parentCommentId` are moved under
/// the root of that parent. Replies whose parent is not loaded stay as their
/// own thread rather than being dropped.
pub fn build_threads(comments: &[Comment]) -> Vec<Thread> {
    let index = ThreadIndex::build(comments);
    let mut threads: Vec<Thread> = Vec::new();
    let mut positions: HashMap<CommentId, usize> = HashMap::new();
    let mut detached: Vec<(&Comment, &CommentId)> = Vec::new();

    for comment in comments {
        match index.root_of(&comment.comment_id) {
            Some(root) if root != &comment.comment_id => detached.push((comment, root)),
            _ => {
                positions.insert(comment.comment_id.clone(), threads.len());
                threads.push(Thread::from_root(comment));
            }
        }
    }

    for (comment, root) in detached {
        match positions.get(root) {
            Some(&pos) => threads[pos].adopt(comment),
            None => {
                tracing::debug!(comment_id = %comment.comment_id, root = %root, "root not loaded, keeping reply as its own thread");
                positions.insert(comment.comment_id.clone(), threads.len());
                threads.push(Thread::from_root(comment));
            }
        }
    }

    threads
}

/// Stable sort of threads by root creation time. Replies keep their order.
pub fn sort_threads(mut threads: Vec<Thread>, order: SortOrder) -> Vec<Thread> {
    match order {
        SortOrder::Newest => threads.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
        SortOrder::Oldest => threads.sort_by(|a, b| a.created_at().cmp(&b.created_at())),
    }
    threads
}
