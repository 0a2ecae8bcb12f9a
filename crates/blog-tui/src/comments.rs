use blog_shared::{
    api::{CreateCommentRequest, UpdateCommentRequest},
    thread::{
        build_threads, sort_threads, InFlight, MutationError, MutationState,
        SortOrder, Thread, ThreadIndex, Viewer,
    },
    Comment, CommentId, PostId,
};

use crate::api::{ApiClient, ApiError};

/// The remote comment resource. Request and response bodies belong to the
/// backend; the session only decides what to send and when to refetch.
#[allow(async_fn_in_trait)]
pub trait CommentBackend {
    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>, ApiError>;
    async fn create_comment(&self, req: &CreateCommentRequest) -> Result<Comment, ApiError>;
    async fn update_comment(&self, id: &CommentId, req: &UpdateCommentRequest) -> Result<(), ApiError>;
    async fn delete_comment(&self, id: &CommentId) -> Result<(), ApiError>;
}

impl CommentBackend for ApiClient {
    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>, ApiError> {
        ApiClient::list_comments(self, post_id).await
    }

    async fn create_comment(&self, req: &CreateCommentRequest) -> Result<Comment, ApiError> {
        ApiClient::create_comment(self, req).await
    }

    async fn update_comment(&self, id: &CommentId, req: &UpdateCommentRequest) -> Result<(), ApiError> {
        ApiClient::update_comment(self, id, req).await
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<(), ApiError> {
        ApiClient::delete_comment(self, id).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Comment cannot be empty")]
    EmptyContent,
    #[error("You can only change your own comments")]
    NotPermitted,
    #[error("Comment {0} is not loaded")]
    UnknownComment(CommentId),
    #[error(transparent)]
    InFlight(#[from] MutationError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Comment state for one post: the raw list as last fetched and the
/// threads derived from it. Every successful mutation refetches the list
/// instead of patching it locally.
pub struct CommentSession {
    post_id: PostId,
    comments: Vec<Comment>,
    threads: Vec<Thread>,
    index: ThreadIndex,
    order: SortOrder,
    viewer: Option<Viewer>,
    in_flight: InFlight,
}

impl CommentSession {
    pub fn new(post_id: PostId, comments: Vec<Comment>, viewer: Option<Viewer>) -> Self {
        let mut session = Self {
            post_id,
            comments,
            threads: Vec::new(),
            index: ThreadIndex::default(),
            order: SortOrder::default(),
            viewer,
            in_flight: InFlight::default(),
        };
        session.rederive();
        session
    }

    fn rederive(&mut self) {
        self.index = ThreadIndex::build(&self.comments);
        self.threads = sort_threads(build_threads(&self.comments), self.order);
        let index = &self.index;
        self.in_flight.retain(|id| index.contains(id));
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    /// Top-level comment count, as shown in the section header.
    pub fn comment_count(&self) -> usize {
        self.threads.len()
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn set_order(&mut self, order: SortOrder) {
        if self.order != order {
            self.order = order;
            self.threads = sort_threads(std::mem::take(&mut self.threads), order);
        }
    }

    pub fn toggle_order(&mut self) {
        self.set_order(self.order.toggle());
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    pub fn set_viewer(&mut self, viewer: Option<Viewer>) {
        self.viewer = viewer;
    }

    pub fn can_modify(&self, comment: &Comment) -> bool {
        self.viewer.as_ref().is_some_and(|v| v.can_modify(comment))
    }

    pub fn mutation_state(&self, id: &CommentId) -> &MutationState {
        self.in_flight.state(id)
    }

    pub fn find(&self, id: &CommentId) -> Option<&Comment> {
        self.threads
            .iter()
            .flat_map(|thread| thread.nodes())
            .map(|node| node.comment())
            .find(|c| &c.comment_id == id)
    }

    /// Replaces the list with a fresh copy from the backend.
    pub async fn refresh<B: CommentBackend>(&mut self, backend: &B) -> Result<(), SessionError> {
        self.comments = backend.list_comments(&self.post_id).await?;
        self.rederive();
        tracing::debug!(post_id = %self.post_id, comments = self.comments.len(), "comments refreshed");
        Ok(())
    }

    /// Posts a top-level comment.
    pub async fn submit_comment<B: CommentBackend>(
        &mut self,
        backend: &B,
        content: &str,
    ) -> Result<Comment, SessionError> {
        self.create(backend, content, None).await
    }

    /// Posts a reply to `target`, stored against the target's root.
    pub async fn submit_reply<B: CommentBackend>(
        &mut self,
        backend: &B,
        target: &CommentId,
        content: &str,
    ) -> Result<Comment, SessionError> {
        let parent = self.index.resolve_root_parent(target);
        self.create(backend, content, Some(parent)).await
    }

    async fn create<B: CommentBackend>(
        &mut self,
        backend: &B,
        content: &str,
        parent_comment_id: Option<CommentId>,
    ) -> Result<Comment, SessionError> {
        if content.trim().is_empty() {
            return Err(SessionError::EmptyContent);
        }

        let req = CreateCommentRequest {
            post_id: self.post_id.clone(),
            content: content.to_string(),
            parent_comment_id,
        };
        let created = backend.create_comment(&req).await?;
        tracing::info!(comment_id = %created.comment_id, parent = ?req.parent_comment_id, "comment created");

        self.refresh(backend).await?;
        Ok(created)
    }

    fn authorize(&self, id: &CommentId) -> Result<(), SessionError> {
        let comment = self
            .find(id)
            .ok_or_else(|| SessionError::UnknownComment(id.clone()))?;
        if !self.can_modify(comment) {
            return Err(SessionError::NotPermitted);
        }
        Ok(())
    }

    pub async fn update<B: CommentBackend>(
        &mut self,
        backend: &B,
        id: &CommentId,
        content: &str,
    ) -> Result<(), SessionError> {
        if content.trim().is_empty() {
            return Err(SessionError::EmptyContent);
        }
        self.authorize(id)?;
        self.in_flight.begin(id)?;

        let req = UpdateCommentRequest {
            content: content.to_string(),
        };
        let result = backend.update_comment(id, &req).await;
        self.settle(backend, id, result).await
    }

    pub async fn delete<B: CommentBackend>(
        &mut self,
        backend: &B,
        id: &CommentId,
    ) -> Result<(), SessionError> {
        self.authorize(id)?;
        self.in_flight.begin(id)?;

        let result = backend.delete_comment(id).await;
        self.settle(backend, id, result).await
    }

    async fn settle<B: CommentBackend>(
        &mut self,
        backend: &B,
        id: &CommentId,
        result: Result<(), ApiError>,
    ) -> Result<(), SessionError> {
        match result {
            Ok(()) => {
                self.in_flight.succeed(id);
                self.refresh(backend).await
            }
            Err(e) => {
                tracing::warn!(comment_id = %id, error = %e, "comment change failed");
                self.in_flight.fail(id, e.to_string());
                Err(e.into())
            }
        }
    }

    #[cfg(test)]
    fn begin_for_test(&mut self, id: &CommentId) -> Result<(), MutationError> {
        self.in_flight.begin(id)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use blog_shared::{CommentAuthor, UserId};
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn comment(id: &str, author: &str, minutes: i64, parent: Option<&str>) -> Comment {
        Comment {
            comment_id: CommentId::from(id),
            content: format!("comment {}", id),
            author: CommentAuthor {
                author_id: UserId::from(author),
                username: author.to_string(),
                profile_image_url: None,
            },
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes),
            is_updated: false,
            parent_comment_id: parent.map(CommentId::from),
            children: Vec::new(),
        }
    }

    /// In-memory stand-in for the REST resource. Nests replies under
    /// their parent the way the post endpoint does.
    #[derive(Default)]
    struct FakeBackend {
        stored: RefCell<Vec<Comment>>,
        created: RefCell<Vec<CreateCommentRequest>>,
        list_calls: RefCell<usize>,
        fail_with_forbidden: bool,
    }

    impl FakeBackend {
        fn with(comments: Vec<Comment>) -> Self {
            Self {
                stored: RefCell::new(comments),
                ..Self::default()
            }
        }

        fn nested(&self) -> Vec<Comment> {
            let stored = self.stored.borrow();
            stored
                .iter()
                .filter(|c| c.parent_comment_id.is_none())
                .map(|root| Comment {
                    children: stored
                        .iter()
                        .filter(|c| c.parent_comment_id.as_ref() == Some(&root.comment_id))
                        .cloned()
                        .collect(),
                    ..root.clone()
                })
                .collect()
        }
    }

    impl CommentBackend for FakeBackend {
        async fn list_comments(&self, _post_id: &PostId) -> Result<Vec<Comment>, ApiError> {
            *self.list_calls.borrow_mut() += 1;
            Ok(self.nested())
        }

        async fn create_comment(&self, req: &CreateCommentRequest) -> Result<Comment, ApiError> {
            if self.fail_with_forbidden {
                return Err(ApiError::Forbidden);
            }
            let next = self.stored.borrow().len() + 100;
            let created = Comment {
                content: req.content.clone(),
                ..comment(
                    &next.to_string(),
                    "me",
                    next as i64,
                    req.parent_comment_id.as_ref().map(CommentId::as_str),
                )
            };
            self.created.borrow_mut().push(req.clone());
            self.stored.borrow_mut().push(created.clone());
            Ok(created)
        }

        async fn update_comment(&self, id: &CommentId, req: &UpdateCommentRequest) -> Result<(), ApiError> {
            if self.fail_with_forbidden {
                return Err(ApiError::Forbidden);
            }
            let mut stored = self.stored.borrow_mut();
            let c = stored
                .iter_mut()
                .find(|c| &c.comment_id == id)
                .ok_or(ApiError::NotFound)?;
            c.content = req.content.clone();
            c.is_updated = true;
            Ok(())
        }

        async fn delete_comment(&self, id: &CommentId) -> Result<(), ApiError> {
            if self.fail_with_forbidden {
                return Err(ApiError::Forbidden);
            }
            self.stored.borrow_mut().retain(|c| &c.comment_id != id);
            Ok(())
        }
    }

    fn me() -> Option<Viewer> {
        Some(Viewer {
            user_id: UserId::from("me"),
            is_admin: false,
        })
    }

    async fn loaded(backend: &FakeBackend, viewer: Option<Viewer>) -> CommentSession {
        let mut session = CommentSession::new(PostId::from("post-1"), Vec::new(), viewer);
        session.refresh(backend).await.unwrap();
        session
    }

    #[tokio::test]
    async fn reply_to_reply_is_posted_against_root_and_refetched() {
        let backend = FakeBackend::with(vec![
            comment("1", "ada", 0, None),
            comment("2", "linus", 1, Some("1")),
        ]);
        let mut session = loaded(&backend, me()).await;
        let calls_before = *backend.list_calls.borrow();

        session
            .submit_reply(&backend, &"2".into(), "@linus agreed")
            .await
            .unwrap();

        let sent = backend.created.borrow();
        assert_eq!(sent[0].parent_comment_id, Some(CommentId::from("1")));
        assert_eq!(*backend.list_calls.borrow(), calls_before + 1);
        assert_eq!(session.threads()[0].reply_count(), 2);
    }

    #[tokio::test]
    async fn top_level_comment_has_no_parent() {
        let backend = FakeBackend::default();
        let mut session = loaded(&backend, me()).await;

        session.submit_comment(&backend, "hello").await.unwrap();

        assert_eq!(backend.created.borrow()[0].parent_comment_id, None);
        assert_eq!(session.comment_count(), 1);
    }

    #[tokio::test]
    async fn blank_content_is_not_sent() {
        let backend = FakeBackend::default();
        let mut session = loaded(&backend, me()).await;

        let err = session.submit_comment(&backend, "   \n").await.unwrap_err();
        assert!(matches!(err, SessionError::EmptyContent));
        assert!(backend.created.borrow().is_empty());
    }

    #[tokio::test]
    async fn update_marks_edited_after_refresh() {
        let backend = FakeBackend::with(vec![comment("1", "me", 0, None)]);
        let mut session = loaded(&backend, me()).await;

        session.update(&backend, &"1".into(), "better words").await.unwrap();

        let updated = session.find(&"1".into()).unwrap();
        assert_eq!(updated.content, "better words");
        assert_eq!(updated.edited_marker(), Some("(edited)"));
        assert_eq!(session.mutation_state(&"1".into()), &MutationState::Idle);
    }

    #[tokio::test]
    async fn strangers_cannot_edit_or_delete() {
        let backend = FakeBackend::with(vec![comment("1", "ada", 0, None)]);
        let mut session = loaded(&backend, me()).await;

        assert!(matches!(
            session.update(&backend, &"1".into(), "mine now").await,
            Err(SessionError::NotPermitted)
        ));
        assert!(matches!(
            session.delete(&backend, &"1".into()).await,
            Err(SessionError::NotPermitted)
        ));

        let mut anonymous = loaded(&backend, None).await;
        assert!(matches!(
            anonymous.delete(&backend, &"1".into()).await,
            Err(SessionError::NotPermitted)
        ));
    }

    #[tokio::test]
    async fn admin_can_delete_any_comment() {
        let backend = FakeBackend::with(vec![
            comment("1", "ada", 0, None),
            comment("2", "linus", 1, Some("1")),
        ]);
        let admin = Some(Viewer {
            user_id: UserId::from("root"),
            is_admin: true,
        });
        let mut session = loaded(&backend, admin).await;

        session.delete(&backend, &"2".into()).await.unwrap();

        assert_eq!(session.threads()[0].reply_count(), 0);
        assert!(session.find(&"2".into()).is_none());
    }

    #[tokio::test]
    async fn failed_mutation_is_recorded_and_propagated() {
        let backend = FakeBackend {
            fail_with_forbidden: true,
            ..FakeBackend::with(vec![comment("1", "me", 0, None)])
        };
        let mut session = loaded(&backend, me()).await;

        let err = session.delete(&backend, &"1".into()).await.unwrap_err();
        assert!(matches!(err, SessionError::Api(ApiError::Forbidden)));
        assert!(matches!(
            session.mutation_state(&"1".into()),
            MutationState::Failed(_)
        ));
    }

    #[tokio::test]
    async fn concurrent_change_to_same_comment_is_refused() {
        let backend = FakeBackend::with(vec![comment("1", "me", 0, None)]);
        let mut session = loaded(&backend, me()).await;

        session.begin_for_test(&"1".into()).unwrap();
        let err = session.update(&backend, &"1".into(), "again").await.unwrap_err();
        assert!(matches!(err, SessionError::InFlight(_)));
    }

    #[tokio::test]
    async fn toggling_order_resorts_threads() {
        let backend = FakeBackend::with(vec![
            comment("old", "ada", 0, None),
            comment("new", "ada", 10, None),
        ]);
        let mut session = loaded(&backend, None).await;

        assert_eq!(session.threads()[0].id().as_str(), "new");
        session.toggle_order();
        assert_eq!(session.order(), SortOrder::Oldest);
        assert_eq!(session.threads()[0].id().as_str(), "old");
    }
}
