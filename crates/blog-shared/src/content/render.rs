use super::{Alignment, Block, BlockKind, Document, HeadingLevel, TableContent, TextRun};

/// Discrete text size a heading level maps to, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    FourXl,
    ThreeXl,
    TwoXl,
    Xl,
    Lg,
    Base,
}

const HEADING_SIZES: [TextSize; 6] = [
    TextSize::FourXl,
    TextSize::ThreeXl,
    TextSize::TwoXl,
    TextSize::Xl,
    TextSize::Lg,
    TextSize::Base,
];

impl HeadingLevel {
    pub fn size(self) -> TextSize {
        HEADING_SIZES[usize::from(self.get() - HeadingLevel::MIN)]
    }
}

/// Independent inline style flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
}

impl Marks {
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineNode {
    pub text: String,
    pub marks: Marks,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItemNode {
    pub align: Alignment,
    pub runs: Vec<InlineNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCellNode {
    pub header: bool,
    pub content: InlineNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowNode {
    pub header: bool,
    pub cells: Vec<TableCellNode>,
}

/// Display-ready form of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderNode {
    Image {
        url: Option<String>,
        alt: String,
        caption: Option<String>,
    },
    Heading {
        level: HeadingLevel,
        size: TextSize,
        align: Alignment,
        runs: Vec<InlineNode>,
    },
    Paragraph {
        align: Alignment,
        runs: Vec<InlineNode>,
    },
    /// Every list item block becomes its own single-item list; consecutive
    /// items are not merged.
    List {
        kind: ListKind,
        items: Vec<ListItemNode>,
    },
    CheckItem {
        checked: bool,
        align: Alignment,
        runs: Vec<InlineNode>,
    },
    Table {
        rows: Vec<TableRowNode>,
    },
}

pub fn render_text_run(run: &TextRun) -> InlineNode {
    InlineNode {
        text: run.text.clone(),
        marks: Marks {
            bold: run.styles.bold,
            italic: run.styles.italic,
            underline: run.styles.underline,
            strike: run.styles.strike,
        },
        color: run.styles.color().map(str::to_string),
    }
}

fn render_runs(content: &[TextRun]) -> Option<Vec<InlineNode>> {
    if content.is_empty() {
        return None;
    }
    Some(content.iter().map(render_text_run).collect())
}

fn single_item_list(kind: ListKind, align: Alignment, content: &[TextRun]) -> Option<RenderNode> {
    Some(RenderNode::List {
        kind,
        items: vec![ListItemNode {
            align,
            runs: render_runs(content)?,
        }],
    })
}

fn render_table(content: &TableContent) -> RenderNode {
    let rows = content
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            // Header styling is positional: the first row, whatever it holds.
            let header = index == 0;
            let cells = row
                .cells
                .first()
                .map(|group| {
                    group
                        .iter()
                        .map(|run| TableCellNode {
                            header,
                            content: render_text_run(run),
                        })
                        .collect()
                })
                .unwrap_or_default();
            TableRowNode { header, cells }
        })
        .collect();

    RenderNode::Table { rows }
}

/// Renders one block, or nothing for unsupported and empty text blocks.
pub fn render_block(block: &Block) -> Option<RenderNode> {
    match &block.kind {
        BlockKind::Image { props } => Some(RenderNode::Image {
            url: props.url.clone(),
            alt: props.name.clone().unwrap_or_default(),
            caption: props.caption.clone().filter(|c| !c.is_empty()),
        }),
        BlockKind::Heading { props, content } => Some(RenderNode::Heading {
            level: props.level,
            size: props.level.size(),
            align: props.text_alignment,
            runs: render_runs(content)?,
        }),
        BlockKind::Paragraph { props, content } => Some(RenderNode::Paragraph {
            align: props.text_alignment,
            runs: render_runs(content)?,
        }),
        BlockKind::BulletListItem { props, content } => {
            single_item_list(ListKind::Unordered, props.text_alignment, content)
        }
        BlockKind::NumberedListItem { props, content } => {
            single_item_list(ListKind::Ordered, props.text_alignment, content)
        }
        BlockKind::CheckListItem { props, content } => Some(RenderNode::CheckItem {
            checked: props.checked,
            align: props.text_alignment,
            runs: render_runs(content)?,
        }),
        BlockKind::Table { content } => Some(render_table(content)),
        BlockKind::Unsupported => None,
    }
}

pub fn render_document(document: &Document) -> Vec<RenderNode> {
    document.blocks.iter().filter_map(render_block).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{CheckListProps, HeadingProps, ImageProps, TableRow, TextProps, TextStyles};

    fn styled(text: &str, styles: TextStyles) -> TextRun {
        TextRun {
            text: text.to_string(),
            styles,
        }
    }

    #[test]
    fn empty_paragraph_renders_nothing() {
        let block = Block::new(BlockKind::Paragraph {
            props: TextProps::default(),
            content: vec![],
        });
        assert_eq!(render_block(&block), None);
    }

    #[test]
    fn empty_text_blocks_of_every_kind_render_nothing() {
        let blocks = [
            BlockKind::Heading { props: HeadingProps::default(), content: vec![] },
            BlockKind::BulletListItem { props: TextProps::default(), content: vec![] },
            BlockKind::NumberedListItem { props: TextProps::default(), content: vec![] },
            BlockKind::CheckListItem { props: CheckListProps::default(), content: vec![] },
        ];
        for kind in blocks {
            assert_eq!(render_block(&Block::new(kind)), None);
        }
    }

    #[test]
    fn unsupported_renders_nothing() {
        assert_eq!(render_block(&Block::new(BlockKind::Unsupported)), None);
    }

    #[test]
    fn text_run_styles_combine() {
        let node = render_text_run(&styled(
            "x",
            TextStyles {
                bold: true,
                strike: true,
                text_color: Some("blue".into()),
                ..TextStyles::default()
            },
        ));
        assert_eq!(
            node.marks,
            Marks { bold: true, italic: false, underline: false, strike: true }
        );
        assert_eq!(node.color.as_deref(), Some("blue"));
    }

    #[test]
    fn empty_text_run_keeps_its_span() {
        let node = render_text_run(&TextRun::default());
        assert_eq!(node.text, "");
        assert!(node.marks.is_plain());
    }

    #[test]
    fn heading_sizes_follow_level() {
        let sizes: Vec<_> = (1..=6).map(|l| HeadingLevel::new(l).size()).collect();
        assert_eq!(sizes, HEADING_SIZES.to_vec());
        assert_eq!(HeadingLevel::new(12).size(), TextSize::Base);
    }

    #[test]
    fn list_items_are_wrapped_individually() {
        let item = |kind| Block::new(kind);
        let doc = Document::new(vec![
            item(BlockKind::BulletListItem { props: TextProps::default(), content: vec![TextRun::plain("a")] }),
            item(BlockKind::BulletListItem { props: TextProps::default(), content: vec![TextRun::plain("b")] }),
            item(BlockKind::NumberedListItem { props: TextProps::default(), content: vec![TextRun::plain("c")] }),
        ]);
        let nodes = render_document(&doc);
        assert_eq!(nodes.len(), 3);
        for (node, expected) in nodes.iter().zip([ListKind::Unordered, ListKind::Unordered, ListKind::Ordered]) {
            match node {
                RenderNode::List { kind, items } => {
                    assert_eq!(*kind, expected);
                    assert_eq!(items.len(), 1);
                }
                other => panic!("expected list, got {:?}", other),
            }
        }
    }

    #[test]
    fn checklist_reflects_checked_flag() {
        let block = Block::new(BlockKind::CheckListItem {
            props: CheckListProps { checked: true, text_alignment: Alignment::Right },
            content: vec![TextRun::plain("done")],
        });
        match render_block(&block) {
            Some(RenderNode::CheckItem { checked, align, runs }) => {
                assert!(checked);
                assert_eq!(align, Alignment::Right);
                assert_eq!(runs[0].text, "done");
            }
            other => panic!("expected check item, got {:?}", other),
        }
    }

    #[test]
    fn image_caption_only_when_present() {
        let image = |caption: Option<&str>| {
            render_block(&Block::new(BlockKind::Image {
                props: ImageProps {
                    url: Some("https://cdn/x.png".into()),
                    name: Some("x.png".into()),
                    caption: caption.map(str::to_string),
                },
            }))
        };

        assert_eq!(
            image(None),
            Some(RenderNode::Image { url: Some("https://cdn/x.png".into()), alt: "x.png".into(), caption: None })
        );
        assert!(matches!(image(Some("")), Some(RenderNode::Image { caption: None, .. })));
        assert!(matches!(image(Some("A cat")), Some(RenderNode::Image { caption: Some(_), .. })));
    }

    #[test]
    fn table_uses_first_cell_group_and_marks_first_row() {
        let table = TableContent {
            rows: vec![
                TableRow { cells: vec![vec![TextRun::plain("h1"), TextRun::plain("h2")], vec![TextRun::plain("ignored")]] },
                TableRow { cells: vec![vec![TextRun::plain("v1"), TextRun::plain("v2")]] },
                TableRow { cells: vec![] },
            ],
        };
        let RenderNode::Table { rows } = render_block(&Block::new(BlockKind::Table { content: table })).unwrap() else {
            panic!("expected table");
        };

        assert_eq!(rows.len(), 3);
        assert!(rows[0].header && rows[0].cells.iter().all(|c| c.header));
        assert_eq!(rows[0].cells.len(), 2);
        assert!(!rows[1].header && rows[1].cells.iter().all(|c| !c.header));
        assert!(rows[2].cells.is_empty());
    }
}
