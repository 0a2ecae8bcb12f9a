use blog_shared::content::{Alignment, InlineNode, ListKind, RenderNode, TableRowNode, TextSize};
use ratatui::{
    layout::Alignment as LineAlignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Render post content nodes to ratatui Lines
pub fn render_content(nodes: &[RenderNode], width: usize) -> Vec<Line<'static>> {
    let mut renderer = ContentRenderer::new(width.max(10));
    for node in nodes {
        renderer.render_node(node);
    }
    renderer.lines
}

struct ContentRenderer {
    width: usize,
    lines: Vec<Line<'static>>,
}

fn base_style() -> Style {
    Style::default().fg(Color::White)
}

fn text_width(text: &str) -> usize {
    Span::raw(text).width()
}

fn line_alignment(align: Alignment) -> LineAlignment {
    match align {
        Alignment::Left => LineAlignment::Left,
        Alignment::Center => LineAlignment::Center,
        Alignment::Right => LineAlignment::Right,
    }
}

/// Terminal approximation of the editor's named text colors
fn named_color(name: &str) -> Option<Color> {
    match name {
        "gray" => Some(Color::Gray),
        "brown" => Some(Color::Rgb(150, 100, 60)),
        "red" => Some(Color::Red),
        "orange" => Some(Color::Rgb(255, 165, 0)),
        "yellow" => Some(Color::Yellow),
        "green" => Some(Color::Green),
        "blue" => Some(Color::Blue),
        "purple" => Some(Color::Magenta),
        "pink" => Some(Color::LightMagenta),
        _ => None,
    }
}

fn inline_style(base: Style, node: &InlineNode) -> Style {
    let mut modifier = Modifier::empty();
    if node.marks.bold {
        modifier |= Modifier::BOLD;
    }
    if node.marks.italic {
        modifier |= Modifier::ITALIC;
    }
    if node.marks.underline {
        modifier |= Modifier::UNDERLINED;
    }
    if node.marks.strike {
        modifier |= Modifier::CROSSED_OUT;
    }

    let style = base.add_modifier(modifier);
    match node.color.as_deref().and_then(named_color) {
        Some(color) => style.fg(color),
        None => style,
    }
}

fn heading_style(size: TextSize) -> (Style, &'static str) {
    match size {
        TextSize::FourXl => (
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            "# ",
        ),
        TextSize::ThreeXl => (
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            "## ",
        ),
        TextSize::TwoXl => (
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            "### ",
        ),
        TextSize::Xl | TextSize::Lg | TextSize::Base => (
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            "",
        ),
    }
}

impl ContentRenderer {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
        }
    }

    fn blank(&mut self) {
        self.lines.push(Line::from(""));
    }

    /// Word-wraps styled runs behind an optional marker. Continuation lines
    /// are indented to the marker's width.
    fn push_wrapped(&mut self, marker: Option<Span<'static>>, runs: &[InlineNode], base: Style, align: Alignment) {
        let indent = marker.as_ref().map(|m| m.width()).unwrap_or(0);
        let mut current: Vec<Span<'static>> = marker.into_iter().collect();
        let mut current_len = indent;
        let mut wrapped = Vec::new();

        for run in runs {
            let style = inline_style(base, run);

            if run.text.is_empty() {
                current.push(Span::styled(String::new(), style));
                continue;
            }

            for word in run.text.split_inclusive(char::is_whitespace) {
                let word_len = text_width(word);
                let visible_len = text_width(word.trim_end());

                if current_len + visible_len > self.width && current_len > indent {
                    wrapped.push(std::mem::take(&mut current));
                    current.push(Span::raw(" ".repeat(indent)));
                    current_len = indent;
                    if word.trim().is_empty() {
                        continue;
                    }
                }

                current.push(Span::styled(word.to_string(), style));
                current_len += word_len;
            }
        }

        if !current.is_empty() {
            wrapped.push(current);
        }

        let alignment = line_alignment(align);
        self.lines
            .extend(wrapped.into_iter().map(|spans| Line::from(spans).alignment(alignment)));
    }

    fn render_node(&mut self, node: &RenderNode) {
        match node {
            RenderNode::Heading { size, align, runs, .. } => {
                let (style, prefix) = heading_style(*size);
                let marker = (!prefix.is_empty()).then(|| Span::styled(prefix.to_string(), style));
                self.push_wrapped(marker, runs, style, *align);
                self.blank();
            }
            RenderNode::Paragraph { align, runs } => {
                self.push_wrapped(None, runs, base_style(), *align);
                self.blank();
            }
            RenderNode::List { kind, items } => {
                for (index, item) in items.iter().enumerate() {
                    let marker = match kind {
                        ListKind::Unordered => "• ".to_string(),
                        ListKind::Ordered => format!("{}. ", index + 1),
                    };
                    let marker = Span::styled(marker, Style::default().fg(Color::Cyan));
                    self.push_wrapped(Some(marker), &item.runs, base_style(), item.align);
                }
                self.blank();
            }
            RenderNode::CheckItem { checked, align, runs } => {
                let marker = if *checked { "☑ " } else { "☐ " };
                // Display only; the box is never interactive.
                let marker = Span::styled(marker.to_string(), Style::default().fg(Color::DarkGray));
                self.push_wrapped(Some(marker), runs, base_style(), *align);
            }
            RenderNode::Image { url, alt, caption } => {
                let label = if alt.is_empty() { "image".to_string() } else { format!("image: {}", alt) };
                let mut spans = vec![Span::styled(
                    format!("[{}]", label),
                    Style::default().fg(Color::Yellow),
                )];
                if let Some(url) = url {
                    spans.push(Span::raw(" "));
                    spans.push(Span::styled(
                        url.clone(),
                        Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                    ));
                }
                self.lines.push(Line::from(spans));
                if let Some(caption) = caption {
                    self.lines.push(
                        Line::from(Span::styled(caption.clone(), Style::default().fg(Color::DarkGray)))
                            .alignment(LineAlignment::Center),
                    );
                }
                self.blank();
            }
            RenderNode::Table { rows } => {
                self.render_table(rows);
            }
        }
    }

    fn render_table(&mut self, rows: &[TableRowNode]) {
        if rows.is_empty() {
            return;
        }

        // Calculate column widths
        let col_count = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
        let mut col_widths: Vec<usize> = vec![0; col_count];

        for row in rows {
            for (i, cell) in row.cells.iter().enumerate() {
                col_widths[i] = col_widths[i].max(text_width(&cell.content.text));
            }
        }

        let border_style = Style::default().fg(Color::DarkGray);
        let header_style = Style::default()
            .fg(Color::Cyan)
            .bg(Color::Rgb(50, 50, 50))
            .add_modifier(Modifier::BOLD);
        let cell_style = base_style();

        let border = |left: &str, mid: &str, right: &str| {
            format!(
                "{}{}{}",
                left,
                col_widths
                    .iter()
                    .map(|w| "─".repeat(w + 2))
                    .collect::<Vec<_>>()
                    .join(mid),
                right
            )
        };

        let top_border = border("┌", "┬", "┐");
        let separator = border("├", "┼", "┤");
        let bottom_border = border("└", "┴", "┘");

        self.lines.push(Line::from(Span::styled(top_border, border_style)));

        for (row_idx, row) in rows.iter().enumerate() {
            let mut spans = vec![Span::styled("│", border_style)];

            for (col_idx, width) in col_widths.iter().enumerate() {
                let (text, style) = match row.cells.get(col_idx) {
                    Some(cell) => {
                        let base = if cell.header { header_style } else { cell_style };
                        (cell.content.text.as_str(), inline_style(base, &cell.content))
                    }
                    None => ("", cell_style),
                };
                let padding = width.saturating_sub(text_width(text));
                spans.push(Span::styled(format!(" {}{} ", text, " ".repeat(padding)), style));
                spans.push(Span::styled("│", border_style));
            }

            self.lines.push(Line::from(spans));

            // Header separator
            if row_idx == 0 && row.header && rows.len() > 1 {
                self.lines.push(Line::from(Span::styled(separator.clone(), border_style)));
            }
        }

        self.lines.push(Line::from(Span::styled(bottom_border, border_style)));
        self.blank();
    }
}
