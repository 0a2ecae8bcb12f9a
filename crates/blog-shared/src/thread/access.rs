use std::collections::HashMap;

use crate::{Comment, CommentId, User, UserId};

/// What the signed-in user is allowed to do with comments. Passed into
/// thread operations explicitly instead of being looked up from a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Viewer {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            is_admin: user.is_admin,
        }
    }

    /// Gates the edit and delete affordances. The backend still decides.
    pub fn can_modify(&self, comment: &Comment) -> bool {
        self.is_admin || self.user_id == comment.author.author_id
    }
}

/// Progress of an edit or delete for one comment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Submitting,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    #[error("a change to comment {0} is already being submitted")]
    AlreadySubmitting(CommentId),
}

/// Per-comment mutation states. Comments without an entry are idle.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    states: HashMap<CommentId, MutationState>,
}

static IDLE: MutationState = MutationState::Idle;

impl InFlight {
    pub fn state(&self, id: &CommentId) -> &MutationState {
        self.states.get(id).unwrap_or(&IDLE)
    }

    pub fn is_submitting(&self, id: &CommentId) -> bool {
        matches!(self.state(id), MutationState::Submitting)
    }

    /// Marks `id` as submitting, refusing if a change is already underway.
    pub fn begin(&mut self, id: &CommentId) -> Result<(), MutationError> {
        if self.is_submitting(id) {
            tracing::debug!(comment_id = %id, "change already in flight, refusing");
            return Err(MutationError::AlreadySubmitting(id.clone()));
        }
        self.states.insert(id.clone(), MutationState::Submitting);
        Ok(())
    }

    pub fn succeed(&mut self, id: &CommentId) {
        self.states.remove(id);
    }

    pub fn fail(&mut self, id: &CommentId, message: impl Into<String>) {
        self.states
            .insert(id.clone(), MutationState::Failed(message.into()));
    }

    /// Drops entries for comments that no longer exist after a refresh.
    pub fn retain(&mut self, mut keep: impl FnMut(&CommentId) -> bool) {
        self.states.retain(|id, _| keep(id));
    }
}
