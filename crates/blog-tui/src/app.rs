use std::collections::HashSet;

use anyhow::Result;
use blog_shared::{
    content::{render_document, RenderNode},
    thread::{reply_prefill, CommentNode, Thread, Viewer},
    Comment, CommentId, PostId, User,
};
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::TextArea;

use crate::api::{ApiClient, ApiError};
use crate::comments::{CommentSession, SessionError};
use crate::editor::{create_textarea, launch_external_editor, textarea_content};

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    LoadPost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Content,
    Comments,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerKind {
    NewComment,
    Reply { target: CommentId, username: String },
    Edit { id: CommentId },
}

impl ComposerKind {
    pub fn title(&self) -> String {
        match self {
            Self::NewComment => " New Comment ".to_string(),
            Self::Reply { username, .. } => format!(" Reply to {} ", username),
            Self::Edit { .. } => " Edit Comment ".to_string(),
        }
    }
}

pub struct Composer {
    pub kind: ComposerKind,
    pub textarea: TextArea<'static>,
}

impl Composer {
    fn new(kind: ComposerKind, content: &str) -> Self {
        Self {
            kind,
            textarea: create_textarea(content),
        }
    }
}

/// One selectable line of the comments pane.
#[derive(Debug, Clone, Copy)]
pub struct CommentRow<'a> {
    pub node: CommentNode<'a>,
    pub thread: &'a Thread,
    pub expanded: bool,
}

impl<'a> CommentRow<'a> {
    pub fn comment(&self) -> &'a Comment {
        self.node.comment()
    }
}

pub struct App {
    pub api: ApiClient,
    pub post_id: PostId,

    // Loading state
    pub loading: bool,
    pub loading_message: String,
    pub error_message: Option<String>,

    // Current user
    pub user: Option<User>,

    // Post
    pub title: String,
    pub published: Option<DateTime<Utc>>,
    pub content: Vec<RenderNode>,
    pub content_scroll: u16,

    // Comments
    pub session: Option<CommentSession>,
    pub focus: Focus,
    pub selected: usize,
    pub expanded: HashSet<CommentId>,
    pub composer: Option<Composer>,
    pub confirm_delete: Option<CommentId>,

    // Set after the external editor hands the terminal back
    pub needs_terminal_clear: bool,
}

impl App {
    pub fn new(api: ApiClient, post_id: PostId) -> Self {
        Self {
            api,
            post_id,
            loading: true,
            loading_message: "Loading post...".to_string(),
            error_message: None,
            user: None,
            title: String::new(),
            published: None,
            content: Vec::new(),
            content_scroll: 0,
            session: None,
            focus: Focus::Comments,
            selected: 0,
            expanded: HashSet::new(),
            composer: None,
            confirm_delete: None,
            needs_terminal_clear: false,
        }
    }

    pub fn set_loading(&mut self, loading: bool, message: &str) {
        self.loading = loading;
        self.loading_message = message.to_string();
    }

    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.session.as_ref().and_then(|s| s.viewer())
    }

    /// Roots always, replies only under expanded roots.
    pub fn visible_rows(&self) -> Vec<CommentRow<'_>> {
        let Some(session) = &self.session else {
            return Vec::new();
        };

        let mut rows = Vec::new();
        for thread in session.threads() {
            let expanded = self.expanded.contains(thread.id());
            for node in thread.nodes() {
                if node.is_reply() && !expanded {
                    continue;
                }
                rows.push(CommentRow {
                    node,
                    thread,
                    expanded,
                });
            }
        }
        rows
    }

    pub fn selected_row(&self) -> Option<CommentRow<'_>> {
        self.visible_rows().get(self.selected).copied()
    }

    fn selected_comment(&self) -> Option<Comment> {
        self.selected_row().map(|row| row.comment().clone())
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_rows().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn select_comment(&mut self, id: &CommentId) {
        let pos = self
            .visible_rows()
            .iter()
            .position(|row| &row.comment().comment_id == id);
        if let Some(pos) = pos {
            self.selected = pos;
        }
    }

    /// Handle key events, returns true if app should quit
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Clear error on any key press
        if self.error_message.is_some() {
            self.clear_error();
            return Ok(false);
        }

        // Global quit with Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(true);
        }

        if self.loading {
            return Ok(false);
        }

        if self.composer.is_some() {
            self.handle_composer_key(key).await;
            return Ok(false);
        }

        if self.confirm_delete.is_some() {
            self.handle_confirm_key(key).await;
            return Ok(false);
        }

        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Content => Focus::Comments,
                    Focus::Comments => Focus::Content,
                };
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),
            KeyCode::Enter => self.toggle_expanded(),
            KeyCode::Char('s') => self.toggle_sort(),
            KeyCode::Char('c') => self.open_new_comment(),
            KeyCode::Char('E') => self.compose_in_external_editor(),
            KeyCode::Char('r') => self.open_reply(),
            KeyCode::Char('e') => self.open_edit(),
            KeyCode::Char('d') => self.ask_delete(),
            KeyCode::Char('g') => self.load_post().await,
            KeyCode::Char('L') => self.do_logout().await,
            _ => {}
        }

        Ok(false)
    }

    pub fn move_down(&mut self) {
        match self.focus {
            Focus::Content => self.content_scroll = self.content_scroll.saturating_add(1),
            Focus::Comments => {
                if self.selected < self.visible_rows().len().saturating_sub(1) {
                    self.selected += 1;
                }
            }
        }
    }

    pub fn move_up(&mut self) {
        match self.focus {
            Focus::Content => self.content_scroll = self.content_scroll.saturating_sub(1),
            Focus::Comments => self.selected = self.selected.saturating_sub(1),
        }
    }

    /// Expands or collapses the replies of the selected comment's thread.
    pub fn toggle_expanded(&mut self) {
        let Some(root) = self.selected_row().map(|row| row.thread.id().clone()) else {
            return;
        };

        if !self.expanded.remove(&root) {
            self.expanded.insert(root.clone());
        }
        self.select_comment(&root);
    }

    pub fn toggle_sort(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.toggle_order();
            self.selected = 0;
        }
    }

    fn require_viewer(&mut self, action: &str) -> bool {
        if self.viewer().is_some() {
            return true;
        }
        self.set_error(format!("Sign in to {} (set BLOG_AUTH_TOKEN).", action));
        false
    }

    pub fn open_new_comment(&mut self) {
        if self.require_viewer("comment") {
            self.composer = Some(Composer::new(ComposerKind::NewComment, ""));
        }
    }

    pub fn open_reply(&mut self) {
        let Some(target) = self.selected_comment() else {
            return;
        };
        if !self.require_viewer("reply") {
            return;
        }

        let username = target.author.username.clone();
        self.composer = Some(Composer::new(
            ComposerKind::Reply {
                target: target.comment_id,
                username: username.clone(),
            },
            &reply_prefill(&username),
        ));
    }

    fn modifiable_selection(&mut self) -> Option<Comment> {
        let comment = self.selected_comment()?;
        let allowed = self
            .session
            .as_ref()
            .is_some_and(|s| s.can_modify(&comment));
        if !allowed {
            self.set_error("You can only change your own comments.".to_string());
            return None;
        }
        Some(comment)
    }

    pub fn open_edit(&mut self) {
        if let Some(comment) = self.modifiable_selection() {
            self.composer = Some(Composer::new(
                ComposerKind::Edit {
                    id: comment.comment_id,
                },
                &comment.content,
            ));
        }
    }

    pub fn ask_delete(&mut self) {
        if let Some(comment) = self.modifiable_selection() {
            self.confirm_delete = Some(comment.comment_id);
        }
    }

    fn compose_in_external_editor(&mut self) {
        if !self.require_viewer("comment") {
            return;
        }
        self.composer = Some(Composer::new(ComposerKind::NewComment, ""));
        self.edit_composer_externally();
    }

    fn edit_composer_externally(&mut self) {
        let Some(composer) = self.composer.as_mut() else {
            return;
        };

        let current = textarea_content(&composer.textarea);
        match launch_external_editor(&current) {
            Ok(edited) => composer.textarea = create_textarea(&edited),
            Err(e) => self.error_message = Some(format!("Editor failed: {}", e)),
        }
        self.needs_terminal_clear = true;
    }

    async fn handle_composer_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.composer = None,
            KeyCode::Char('s') if ctrl => self.submit_composer().await,
            KeyCode::Char('e') if ctrl => self.edit_composer_externally(),
            _ => {
                if let Some(composer) = self.composer.as_mut() {
                    composer.textarea.input(key);
                }
            }
        }
    }

    async fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(id) = self.confirm_delete.take() {
                    self.do_delete(id).await;
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm_delete = None;
            }
            _ => {}
        }
    }

    fn root_of(&self, id: &CommentId) -> Option<CommentId> {
        let session = self.session.as_ref()?;
        session
            .threads()
            .iter()
            .find(|thread| thread.nodes().any(|node| &node.comment().comment_id == id))
            .map(|thread| thread.id().clone())
    }

    async fn submit_composer(&mut self) {
        let Some(composer) = self.composer.as_ref() else {
            return;
        };
        let content = textarea_content(&composer.textarea);
        let kind = composer.kind.clone();

        // Whitespace-only drafts are never sent
        if content.trim().is_empty() {
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };

        self.loading = true;
        self.loading_message = "Saving comment...".to_string();

        let result = match &kind {
            ComposerKind::NewComment => session.submit_comment(&self.api, &content).await.map(|c| Some(c.comment_id)),
            ComposerKind::Reply { target, .. } => {
                session.submit_reply(&self.api, target, &content).await.map(|c| Some(c.comment_id))
            }
            ComposerKind::Edit { id } => session.update(&self.api, id, &content).await.map(|_| None),
        };

        match result {
            Ok(created) => {
                self.composer = None;
                if let ComposerKind::Reply { target, .. } = &kind {
                    if let Some(root) = self.root_of(target) {
                        self.expanded.insert(root);
                    }
                }
                self.clamp_selection();
                if let Some(id) = created {
                    self.select_comment(&id);
                }
            }
            // The draft stays open so nothing typed is lost
            Err(e) => self.on_session_error("Failed to save comment", e).await,
        }

        self.set_loading(false, "");
    }

    async fn do_delete(&mut self, id: CommentId) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        self.loading = true;
        self.loading_message = "Deleting comment...".to_string();

        match session.delete(&self.api, &id).await {
            Ok(()) => {
                self.expanded.remove(&id);
                self.clamp_selection();
            }
            Err(e) => self.on_session_error("Failed to delete comment", e).await,
        }

        self.set_loading(false, "");
    }

    async fn on_session_error(&mut self, context: &str, error: SessionError) {
        // An expired session drops back to read-only
        if matches!(error, SessionError::Api(ApiError::Unauthorized)) {
            self.do_logout().await;
        }
        self.set_error(format!("{}: {}", context, error));
    }

    /// Fetches the post and rebuilds everything derived from it.
    pub async fn load_post(&mut self) {
        self.set_loading(true, "Loading post...");

        match self.api.get_post(&self.post_id).await {
            Ok(post) => {
                let viewer = self.load_viewer().await;
                let order = self.session.as_ref().map(|s| s.order()).unwrap_or_default();

                self.title = post.title;
                self.published = post.created_at;
                self.content = render_document(&post.content.document_lenient());

                let mut session = CommentSession::new(post.post_id, post.comments, viewer);
                session.set_order(order);
                self.session = Some(session);
                self.clamp_selection();

                tracing::info!(post_id = %self.post_id, blocks = self.content.len(), "post loaded");
            }
            Err(e) => {
                tracing::warn!(post_id = %self.post_id, error = %e, "failed to load post");
                self.set_error(format!("Failed to load post: {}", e));
            }
        }

        self.set_loading(false, "");
    }

    async fn load_viewer(&mut self) -> Option<Viewer> {
        if !self.api.is_authenticated() {
            self.user = None;
            return None;
        }

        match self.api.me().await {
            Ok(user) => {
                let viewer = Viewer::from_user(&user);
                self.user = Some(user);
                Some(viewer)
            }
            Err(ApiError::Unauthorized) => {
                // Token rejected, forget it
                let _ = self.api.logout().await;
                self.user = None;
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load current user, reading anonymously");
                self.user = None;
                None
            }
        }
    }

    async fn do_logout(&mut self) {
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "logout failed");
        }
        self.user = None;
        self.composer = None;
        self.confirm_delete = None;
        if let Some(session) = self.session.as_mut() {
            session.set_viewer(None);
        }
    }
}
