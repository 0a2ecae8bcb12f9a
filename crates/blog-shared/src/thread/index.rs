use std::collections::{HashMap, HashSet};

use crate::{Comment, CommentId};

/// Lookup from any loaded comment or reply id to the id of its root.
///
/// Built once per refresh so reply targets resolve without rescanning the
/// comment list.
#[derive(Debug, Clone, Default)]
pub struct ThreadIndex {
    roots: HashMap<CommentId, CommentId>,
}

impl ThreadIndex {
    pub fn build(comments: &[Comment]) -> Self {
        let mut roots = HashMap::with_capacity(comments.len());

        // Same visiting order as the linear scan, so the first match wins
        // when ids repeat.
        for comment in comments {
            roots
                .entry(comment.comment_id.clone())
                .or_insert_with(|| comment.comment_id.clone());
            for child in &comment.children {
                roots
                    .entry(child.comment_id.clone())
                    .or_insert_with(|| comment.comment_id.clone());
            }
        }

        let flat_parents: HashMap<&CommentId, &CommentId> = comments
            .iter()
            .filter_map(|c| c.parent_comment_id.as_ref().map(|p| (&c.comment_id, p)))
            .collect();

        if flat_parents.is_empty() {
            return Self { roots };
        }

        let rerooted: Vec<(&Comment, CommentId)> = comments
            .iter()
            .filter(|c| flat_parents.contains_key(&c.comment_id))
            .map(|c| (c, follow_to_root(&roots, &flat_parents, &c.comment_id)))
            .collect();

        for (comment, root) in rerooted {
            for child in &comment.children {
                roots.insert(child.comment_id.clone(), root.clone());
            }
            roots.insert(comment.comment_id.clone(), root);
        }

        Self { roots }
    }

    pub fn root_of(&self, id: &CommentId) -> Option<&CommentId> {
        self.roots.get(id)
    }

    /// Id a reply to `target` is stored under; unknown targets come back
    /// unchanged.
    pub fn resolve_root_parent(&self, target: &CommentId) -> CommentId {
        match self.roots.get(target) {
            Some(root) => root.clone(),
            None => {
                tracing::debug!(comment_id = %target, "reply target not loaded, using it as parent");
                target.clone()
            }
        }
    }

    pub fn contains(&self, id: &CommentId) -> bool {
        self.roots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Follows `parentCommentId` links of top-level entries until reaching one
/// without a loaded parent. A cycle leaves `start` as its own root.
fn follow_to_root(
    roots: &HashMap<CommentId, CommentId>,
    flat_parents: &HashMap<&CommentId, &CommentId>,
    start: &CommentId,
) -> CommentId {
    let mut visited: HashSet<&CommentId> = HashSet::new();
    let mut current = start;

    loop {
        visited.insert(current);
        let Some(parent) = flat_parents.get(current) else {
            return current.clone();
        };
        let Some(parent_root) = roots.get(*parent) else {
            return current.clone();
        };
        if visited.contains(parent_root) {
            return start.clone();
        }
        current = parent_root;
    }
}
