use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::lenient::{decode_each, lenient_seq, null_as_default};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("content is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("content is not a block sequence")]
    NotASequence,
}

/// Horizontal alignment of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Lookup of a `textAlignment` prop. Anything unrecognized is left.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("center") => Self::Center,
            Some("right") => Self::Right,
            _ => Self::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

impl<'de> Deserialize<'de> for Alignment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_name(value.as_str()))
    }
}

/// Alignment of a block from its raw `props` object.
pub fn get_alignment(props: &Value) -> Alignment {
    Alignment::from_name(props.get("textAlignment").and_then(Value::as_str))
}

/// Heading level, always within 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(level: i64) -> Self {
        Self(level.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for HeadingLevel {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl<'de> Deserialize<'de> for HeadingLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Editors have been seen writing the level as a string.
        let level = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        Ok(level.map(Self::new).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyles {
    #[serde(deserialize_with = "null_as_default")]
    pub bold: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub italic: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub underline: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub strike: bool,
    pub text_color: Option<String>,
}

impl TextStyles {
    /// Named text color; `"default"` is the editor's way of saying none.
    pub fn color(&self) -> Option<&str> {
        self.text_color
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "default")
    }
}

/// Styled inline text. Runs without `text` (links, mentions) keep an empty
/// string so they still occupy a span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TextRun {
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub styles: TextStyles,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            styles: TextStyles::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProps {
    pub text_alignment: Alignment,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadingProps {
    pub level: HeadingLevel,
    pub text_alignment: Alignment,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckListProps {
    #[serde(deserialize_with = "null_as_default")]
    pub checked: bool,
    pub text_alignment: Alignment,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImageProps {
    pub url: Option<String>,
    pub name: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableRow {
    /// Only the first group is rendered; each run in it is one cell.
    #[serde(deserialize_with = "lenient_seq")]
    pub cells: Vec<Vec<TextRun>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableContent {
    #[serde(deserialize_with = "lenient_seq")]
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph {
        props: TextProps,
        content: Vec<TextRun>,
    },
    Heading {
        props: HeadingProps,
        content: Vec<TextRun>,
    },
    BulletListItem {
        props: TextProps,
        content: Vec<TextRun>,
    },
    NumberedListItem {
        props: TextProps,
        content: Vec<TextRun>,
    },
    CheckListItem {
        props: CheckListProps,
        content: Vec<TextRun>,
    },
    Image {
        props: ImageProps,
    },
    Table {
        content: TableContent,
    },
    /// Unknown, missing or uninterpretable `type`.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: Option<String>,
    pub kind: BlockKind,
}

#[derive(Deserialize)]
struct RawBlock {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    props: Value,
    #[serde(default)]
    content: Value,
}

fn field<T: DeserializeOwned + Default>(value: Value) -> Option<T> {
    match value {
        Value::Null => Some(T::default()),
        other => serde_json::from_value(other).ok(),
    }
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Self { id: None, kind }
    }

    /// Interprets one element of the block array. Never fails: whatever
    /// cannot be understood becomes [`BlockKind::Unsupported`].
    pub fn from_value(value: Value) -> Self {
        let raw: RawBlock = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed block");
                return Self::new(BlockKind::Unsupported);
            }
        };

        let id = raw.id.and_then(|id| match id {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let kind = raw
            .kind
            .as_deref()
            .and_then(|kind| Self::interpret(kind, raw.props, raw.content))
            .unwrap_or(BlockKind::Unsupported);

        if kind == BlockKind::Unsupported {
            tracing::debug!(block_id = ?id, block_type = ?raw.kind, "unsupported block");
        }

        Self { id, kind }
    }

    fn interpret(kind: &str, props: Value, content: Value) -> Option<BlockKind> {
        Some(match kind {
            "paragraph" => BlockKind::Paragraph {
                props: field(props)?,
                content: decode_each(content),
            },
            "heading" => BlockKind::Heading {
                props: field(props)?,
                content: decode_each(content),
            },
            "bulletListItem" => BlockKind::BulletListItem {
                props: field(props)?,
                content: decode_each(content),
            },
            "numberedListItem" => BlockKind::NumberedListItem {
                props: field(props)?,
                content: decode_each(content),
            },
            "checkListItem" => BlockKind::CheckListItem {
                props: field(props)?,
                content: decode_each(content),
            },
            "image" => BlockKind::Image {
                props: field(props)?,
            },
            "table" => BlockKind::Table {
                content: field(content)?,
            },
            _ => return None,
        })
    }
}

/// An ordered block sequence. Block order is render order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn parse(serialized: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(serialized)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Array(items) => Ok(Self::new(items.into_iter().map(Block::from_value).collect())),
            _ => Err(ParseError::NotASequence),
        }
    }

    /// Like [`Document::parse`] but degrades to an empty document.
    pub fn parse_lenient(serialized: &str) -> Self {
        Self::parse(serialized).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to parse post content, showing nothing");
            Self::default()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}

/// A post's `content` field: normally the serialized document, but some
/// responses embed the block array directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostContent {
    Serialized(String),
    Structured(Document),
}

impl Default for PostContent {
    fn default() -> Self {
        Self::Structured(Document::default())
    }
}

impl From<Document> for PostContent {
    fn from(document: Document) -> Self {
        Self::Structured(document)
    }
}

impl From<String> for PostContent {
    fn from(serialized: String) -> Self {
        Self::Serialized(serialized)
    }
}

impl PostContent {
    pub fn document(&self) -> Result<Document, ParseError> {
        match self {
            Self::Serialized(s) => Document::parse(s),
            Self::Structured(document) => Ok(document.clone()),
        }
    }

    pub fn document_lenient(&self) -> Document {
        match self {
            Self::Serialized(s) => Document::parse_lenient(s),
            Self::Structured(document) => document.clone(),
        }
    }
}

impl<'de> Deserialize<'de> for PostContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Self::Serialized(s),
            Value::Null => Self::default(),
            Value::Array(items) => {
                Self::Structured(Document::new(items.into_iter().map(Block::from_value).collect()))
            }
            // Kept serialized so the parse failure surfaces where the
            // document is read.
            other => Self::Serialized(other.to_string()),
        })
    }
}
