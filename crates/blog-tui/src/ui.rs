use blog_shared::thread::{reply_count_label, MutationState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, CommentRow, Composer, ComposerKind, Focus};
use crate::content::render_content;
use crate::format::format_timestamp;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    draw_content(f, body[0], app);
    draw_comments(f, body[1], app);
    draw_status_bar(f, chunks[2], app);

    if let Some(ref composer) = app.composer {
        draw_composer_popup(f, composer);
    }

    if app.confirm_delete.is_some() {
        draw_delete_confirm_popup(f, app);
    }

    // Draw error overlay if present
    if let Some(ref error) = app.error_message {
        draw_error_popup(f, error);
    }

    // Draw loading overlay if loading
    if app.loading {
        draw_loading_overlay(f, &app.loading_message);
    }
}

fn focus_style(app: &App, pane: Focus) -> Style {
    if app.focus == pane {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let title = if app.title.is_empty() {
        format!("Post {}", app.post_id)
    } else {
        app.title.clone()
    };

    let mut spans = vec![Span::styled(
        title,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if let Some(published) = &app.published {
        spans.push(Span::styled(
            format!("  {}", format_timestamp(published)),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let user = match &app.user {
        Some(user) => format!(" {} ", user.username),
        None => " anonymous ".to_string(),
    };

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title_bottom(Line::from(user).right_aligned()),
    );

    f.render_widget(header, area);
}

fn draw_content(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Post ")
        .borders(Borders::ALL)
        .border_style(focus_style(app, Focus::Content));

    let inner = block.inner(area);
    let lines = if app.content.is_empty() {
        vec![Line::from(Span::styled(
            "This post has no content.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        render_content(&app.content, inner.width.saturating_sub(1) as usize)
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((app.content_scroll, 0));

    f.render_widget(paragraph, area);
}

fn draw_comments(f: &mut Frame, area: Rect, app: &App) {
    let (count, order) = match &app.session {
        Some(session) => (session.comment_count(), session.order().label()),
        None => (0, ""),
    };

    let block = Block::default()
        .title(format!(" Comments ({}) ", count))
        .title_top(Line::from(format!(" {} ", order)).right_aligned())
        .borders(Borders::ALL)
        .border_style(focus_style(app, Focus::Comments));

    let inner = block.inner(area);
    let rows = app.visible_rows();

    if rows.is_empty() {
        let empty = Paragraph::new("No comments yet. Press c to write one.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let width = inner.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| comment_item(app, row, idx == app.selected, width))
        .collect();

    let list = List::new(items).block(block);
    let mut state = ListState::default().with_selected(Some(app.selected));

    f.render_stateful_widget(list, area, &mut state);
}

fn comment_item<'a>(app: &App, row: &CommentRow<'_>, selected: bool, width: usize) -> ListItem<'a> {
    let comment = row.comment();
    let is_reply = row.node.is_reply();
    let indent = if is_reply { "    " } else { "" };

    let name_style = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };

    let mut heading = vec![
        Span::raw(indent.to_string()),
        Span::raw(if selected { "> " } else { "  " }),
        Span::styled(comment.author.username.clone(), name_style),
        Span::styled(
            format!("  {}", format_timestamp(&comment.created_at)),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if let Some(marker) = comment.edited_marker() {
        heading.push(Span::styled(
            format!(" {}", marker),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    }

    if let Some(session) = &app.session {
        match session.mutation_state(&comment.comment_id) {
            MutationState::Idle => {}
            MutationState::Submitting => {
                heading.push(Span::styled(" saving...", Style::default().fg(Color::Yellow)));
            }
            MutationState::Failed(msg) => {
                heading.push(Span::styled(format!(" failed: {}", msg), Style::default().fg(Color::Red)));
            }
        }
    }

    let mut lines = vec![Line::from(heading)];

    let body_indent = format!("{}    ", indent);
    let body_width = width.saturating_sub(indent.len()).max(10);
    for text in wrap_plain(&comment.content, body_width) {
        lines.push(Line::from(format!("{}{}", body_indent, text)));
    }

    if !is_reply && row.thread.reply_count() > 0 {
        let arrow = if row.expanded { "▾" } else { "▸" };
        lines.push(Line::from(Span::styled(
            format!("{}{} {}", body_indent, arrow, reply_count_label(row.thread.reply_count())),
            Style::default().fg(Color::Magenta),
        )));
    }

    lines.push(Line::from(""));
    ListItem::new(lines)
}

/// Greedy word wrap for comment bodies, keeping blank lines.
fn wrap_plain(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if line.is_empty() { word.chars().count() } else { line.chars().count() + 1 + word.chars().count() };
            if needed > width && !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        out.push(line);
    }

    out
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (mode, mode_color) = if app.composer.is_some() {
        ("COMPOSE", Color::Green)
    } else if app.confirm_delete.is_some() {
        ("DELETE", Color::Red)
    } else {
        match app.focus {
            Focus::Content => ("POST", Color::Blue),
            Focus::Comments => ("COMMENTS", Color::Blue),
        }
    };

    let hints = if app.composer.is_some() {
        "Ctrl+S: submit | Ctrl+E: $EDITOR | Esc: cancel"
    } else if app.confirm_delete.is_some() {
        "y: confirm | n/Esc: cancel"
    } else if app.viewer().is_some() {
        "j/k: move | Enter: replies | c: comment | r: reply | e: edit | d: delete | s: sort | E: $EDITOR | g: reload | L: logout | q: quit"
    } else {
        "j/k: move | Tab: pane | Enter: replies | s: sort | g: reload | q: quit"
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", mode),
            Style::default().bg(mode_color).fg(Color::White),
        ),
        Span::raw(" "),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]));

    f.render_widget(status, area);
}

fn draw_composer_popup(f: &mut Frame, composer: &Composer) {
    let area = centered_rect(70, 40, f.area());

    f.render_widget(Clear, area);

    let border_color = match composer.kind {
        ComposerKind::Edit { .. } => Color::Yellow,
        _ => Color::Cyan,
    };
    let block = Block::default()
        .title(composer.kind.title())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Editor
            Constraint::Length(1), // Hint
        ])
        .split(inner);

    f.render_widget(&composer.textarea, chunks[0]);

    let hint = Paragraph::new("Ctrl+S: submit | Ctrl+E: open in $EDITOR | Esc: cancel")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(hint, chunks[1]);
}

fn draw_delete_confirm_popup(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 20, f.area());

    f.render_widget(Clear, area);

    let author = app
        .confirm_delete
        .as_ref()
        .and_then(|id| app.session.as_ref()?.find(id))
        .map(|c| c.author.username.as_str())
        .unwrap_or("Unknown");

    let block = Block::default()
        .title(" Confirm Delete ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Message
            Constraint::Length(2), // Hint
            Constraint::Min(0),    // Spacer
        ])
        .split(inner);

    let message = Paragraph::new(vec![
        Line::from(Span::raw("Are you sure you want to delete this comment?")),
        Line::from(Span::styled(
            format!("by {}", author),
            Style::default().fg(Color::Yellow),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(message, chunks[0]);

    let hint = Paragraph::new("y: yes, delete | n: no, cancel")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(hint, chunks[1]);
}

fn draw_loading_overlay(f: &mut Frame, message: &str) {
    let area = centered_rect(40, 10, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Loading ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let text = Paragraph::new(message)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(block);

    f.render_widget(text, area);
}

fn draw_error_popup(f: &mut Frame, error: &str) {
    let area = centered_rect(60, 20, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = Paragraph::new(error)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(block);

    f.render_widget(text, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use blog_shared::PostId;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn wrap_plain_breaks_on_words_and_keeps_blank_lines() {
        assert_eq!(
            wrap_plain("one two three\n\nfour", 8),
            vec!["one two", "three", "", "four"]
        );
    }

    #[test]
    fn draws_empty_post_without_panicking() {
        let mut app = App::new(ApiClient::new("http://localhost:0/api"), PostId::new("7"));
        app.set_loading(false, "");

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Post 7"));
        assert!(text.contains("No comments yet"));
    }
}
