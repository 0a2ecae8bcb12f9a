use blog_shared::content::{render_block, render_document, Alignment, Block, Document, PostContent, RenderNode, TextSize};
use blog_shared::thread::{build_threads, resolve_root_parent, sort_threads, SortOrder, ThreadIndex};
use blog_shared::{Comment, CommentId, Post};
use serde_json::json;

fn post_fixture() -> Post {
    serde_json::from_value(json!({
        "postId": 12,
        "title": "Shipping a block editor",
        "content": json!([
            {"id": "h", "type": "heading", "props": {"level": 2},
             "content": [{"type": "text", "text": "Hi", "styles": {"bold": true}}]},
            {"id": "p0", "type": "paragraph", "content": []},
            {"id": "t", "type": "table", "content": {"rows": [
                {"cells": [[{"type": "text", "text": "A", "styles": {}}]]},
                {"cells": [[{"type": "text", "text": "B", "styles": {}}]]}
            ]}},
            {"id": "x", "type": "bogus"}
        ]).to_string(),
        "comments": [
            {
                "commentId": 1,
                "content": "First!",
                "author": {"authorId": 10, "username": "ada", "profileImageUrl": "https://img/ada.png"},
                "createdAt": "2024-05-01T10:00:00",
                "isUpdated": false,
                "parentCommentId": null,
                "children": [
                    {
                        "commentId": 2,
                        "content": "@ada hello",
                        "author": {"authorId": 11, "username": "linus"},
                        "createdAt": "2024-05-01T10:05:00",
                        "isUpdated": true,
                        "parentCommentId": 1
                    }
                ]
            },
            {
                "commentId": 3,
                "content": "Later comment",
                "author": {"authorId": 12, "username": "grace"},
                "createdAt": "2024-05-02T08:00:00Z",
                "parentCommentId": null
            }
        ]
    }))
    .unwrap()
}

#[test]
fn replying_to_a_reply_targets_its_root() {
    let post = post_fixture();
    let target = CommentId::from("2");

    assert_eq!(resolve_root_parent(&post.comments, &target), CommentId::from("1"));
    assert_eq!(ThreadIndex::build(&post.comments).resolve_root_parent(&target), CommentId::from("1"));
}

#[test]
fn threads_sort_by_root_creation() {
    let post = post_fixture();
    let threads = build_threads(&post.comments);

    let newest: Vec<_> = sort_threads(threads.clone(), SortOrder::Newest)
        .iter()
        .map(|t| t.id().to_string())
        .collect();
    assert_eq!(newest, vec!["3", "1"]);

    let oldest = sort_threads(threads, SortOrder::Oldest);
    assert_eq!(oldest[0].id().as_str(), "1");
    assert_eq!(oldest[0].reply_count(), 1);
    assert_eq!(oldest[0].replies[0].comment.edited_marker(), Some("(edited)"));
}

#[test]
fn heading_renders_sized_bold_and_left_aligned() {
    let doc = post_fixture().content.document().unwrap();
    let nodes = render_document(&doc);

    match &nodes[0] {
        RenderNode::Heading { level, size, align, runs } => {
            assert_eq!(level.get(), 2);
            assert_eq!(*size, TextSize::ThreeXl);
            assert_eq!(*align, Alignment::Left);
            assert_eq!(runs.len(), 1);
            assert_eq!(runs[0].text, "Hi");
            assert!(runs[0].marks.bold);
        }
        other => panic!("expected heading, got {:?}", other),
    }
}

#[test]
fn empty_and_unknown_blocks_are_skipped() {
    let doc = post_fixture().content.document().unwrap();
    assert_eq!(doc.len(), 4);

    let nodes = render_document(&doc);
    assert_eq!(nodes.len(), 2);
    assert!(render_block(&doc.blocks[1]).is_none());
    assert!(render_block(&doc.blocks[3]).is_none());
}

#[test]
fn table_first_row_is_the_header() {
    let doc = post_fixture().content.document().unwrap();
    let RenderNode::Table { rows } = &render_document(&doc)[1] else {
        panic!("expected table");
    };

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cells[0].content.text, "A");
    assert!(rows[0].cells[0].header);
    assert_eq!(rows[1].cells[0].content.text, "B");
    assert!(!rows[1].cells[0].header);
}

#[test]
fn unparseable_content_renders_nothing() {
    let content = PostContent::from("not json".to_string());
    assert!(content.document().is_err());
    assert!(render_document(&content.document_lenient()).is_empty());

    let bogus = Block::from_value(json!({"type": "bogus"}));
    assert!(render_block(&bogus).is_none());
    assert!(Document::parse_lenient("").is_empty());
}

#[test]
fn top_level_comments_have_no_parent() {
    let post = post_fixture();
    assert!(post.comments.iter().all(Comment::is_top_level));
    assert_eq!(post.comments[0].children[0].parent_comment_id, Some(CommentId::from("1")));
}

#[test]
fn malformed_comments_are_dropped_without_losing_the_post() {
    let post: Post = serde_json::from_value(json!({
        "postId": 5,
        "title": null,
        "content": json!([{"type": "paragraph", "content": [{"text": "Body"}]}]).to_string(),
        "createdAt": "not a date",
        "comments": [
            {
                "commentId": 1,
                "content": "Fine",
                "author": {"authorId": 10, "username": "ada"},
                "createdAt": "2024-05-01T10:00:00Z",
                "children": [
                    {"commentId": 2, "content": "ok", "author": {"authorId": 11, "username": "linus"},
                     "createdAt": "2024-05-01T10:01:00Z", "parentCommentId": 1},
                    {"commentId": 4, "content": "no author", "createdAt": "2024-05-01T10:02:00Z"}
                ]
            },
            {
                "commentId": 3,
                "content": null,
                "author": {"authorId": 12, "username": "grace"},
                "createdAt": "2024-05-01 10:00:00",
                "isUpdated": null
            },
            {"commentId": 5, "content": "missing author", "createdAt": "2024-05-01T10:00:00Z"},
            {"commentId": 6, "content": "bad date", "author": {"authorId": 13, "username": "x"}, "createdAt": "soon"},
            "not a comment"
        ]
    }))
    .unwrap();

    assert_eq!(post.title, "");
    assert_eq!(post.created_at, None);
    assert_eq!(render_document(&post.content.document_lenient()).len(), 1);

    let ids: Vec<_> = post.comments.iter().map(|c| c.comment_id.to_string()).collect();
    assert_eq!(ids, vec!["1", "3"]);
    assert_eq!(post.comments[0].children.len(), 1);
    assert_eq!(post.comments[1].content, "");
    assert!(!post.comments[1].is_updated);

    let threads = build_threads(&post.comments);
    assert_eq!(threads.len(), 2);
}
