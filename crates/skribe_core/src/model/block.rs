//! Block and list-item domain model.
//!
//! # Responsibility
//! - Define the typed block variants a note body is made of.
//! - Provide constructors that stamp timestamps for new content and accept
//!   explicit timestamps for content restored from disk.
//!
//! # Invariants
//! - `id` is stable and never reused for another block or item.
//! - Stamping constructors set `created == modified`; restoring constructors
//!   take persisted values verbatim so round-trips never perturb them.
//!
//! # See also
//! - docs/architecture/data-model.md

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for blocks and list items.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type BlockId = Uuid;

/// Current wall clock as Unix epoch milliseconds.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

/// Structural category of one body block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Plain text paragraph.
    Paragraph,
    /// Section header, levels 1 through 6.
    Header(u8),
    /// Thematic break with no content of its own.
    HorizontalRule,
    /// Quoted text.
    Blockquote,
    /// Source code with an optional language annotation.
    Code,
    /// Math markup rendered by the host surface.
    Math,
    /// Numbered list of items.
    OrderedList,
    /// Bulleted list of items.
    UnorderedList,
    /// Reference to an embedded resource by filename.
    Image,
}

impl BlockKind {
    /// Serialized element name for this kind.
    pub fn tag_name(self) -> &'static str {
        match self {
            Self::Paragraph => "p",
            Self::Header(1) => "h1",
            Self::Header(2) => "h2",
            Self::Header(3) => "h3",
            Self::Header(4) => "h4",
            Self::Header(5) => "h5",
            Self::Header(6) => "h6",
            // Header levels are clamped at construction; this arm is
            // unreachable for blocks built through `Block` constructors.
            Self::Header(_) => "h6",
            Self::HorizontalRule => "hr",
            Self::Blockquote => "blockquote",
            Self::Code => "code",
            Self::Math => "math",
            Self::OrderedList => "ol",
            Self::UnorderedList => "ul",
            Self::Image => "img",
        }
    }

    /// Maps a serialized element name back to a kind.
    ///
    /// Returns `None` for names this schema generation does not know, which
    /// decoders treat as skippable rather than fatal.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p" => Some(Self::Paragraph),
            "h1" => Some(Self::Header(1)),
            "h2" => Some(Self::Header(2)),
            "h3" => Some(Self::Header(3)),
            "h4" => Some(Self::Header(4)),
            "h5" => Some(Self::Header(5)),
            "h6" => Some(Self::Header(6)),
            "hr" => Some(Self::HorizontalRule),
            "blockquote" => Some(Self::Blockquote),
            "code" => Some(Self::Code),
            "math" => Some(Self::Math),
            "ol" => Some(Self::OrderedList),
            "ul" => Some(Self::UnorderedList),
            "img" => Some(Self::Image),
            _ => None,
        }
    }

    /// Whether this kind owns an `items` sequence instead of text content.
    pub fn is_list(self) -> bool {
        matches!(self, Self::OrderedList | Self::UnorderedList)
    }
}

/// One entry inside an ordered or unordered list block.
///
/// Same identity and timestamp lifecycle as a block, scoped under its parent
/// list and addressed by a secondary index there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Stable item id, never reassigned.
    pub id: BlockId,
    /// Plain text content.
    pub content: String,
    /// Unix epoch milliseconds, set once.
    pub created: i64,
    /// Unix epoch milliseconds, updated on every content change.
    pub modified: i64,
}

impl ListItem {
    /// Creates a new item stamped with the current time.
    pub fn new(content: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            created: now,
            modified: now,
        }
    }

    /// Rebuilds an item from persisted timestamps.
    pub fn restored(content: impl Into<String>, created: i64, modified: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            created,
            modified,
        }
    }

    /// Replaces the content and bumps `modified`.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.modified = now_ms().max(self.created);
    }
}

/// One structural unit of a note body.
///
/// The shape is canonical across kinds: `content` carries paragraph/header/
/// quote/code/math text and the referenced filename for images; `language`
/// is meaningful only for code; `items` only for the two list kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Stable block id, never reassigned. Not persisted by either on-disk
    /// schema; identity is positional across save/load.
    pub id: BlockId,
    /// Structural category.
    pub kind: BlockKind,
    /// Text payload, or resource filename for `Image`. Empty for
    /// `HorizontalRule` and list kinds.
    pub content: String,
    /// Language annotation. Meaningful only when `kind == Code`.
    pub language: Option<String>,
    /// Child items. Meaningful only for list kinds.
    pub items: Vec<ListItem>,
    /// Unix epoch milliseconds, set once.
    pub created: i64,
    /// Unix epoch milliseconds, updated on every content change.
    pub modified: i64,
}

impl Block {
    fn stamped(kind: BlockKind, content: String) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4(),
            kind,
            content,
            language: None,
            items: Vec::new(),
            created: now,
            modified: now,
        }
    }

    /// New paragraph stamped with the current time.
    pub fn paragraph(content: impl Into<String>) -> Self {
        Self::stamped(BlockKind::Paragraph, content.into())
    }

    /// New header. `level` is clamped into `1..=6`.
    pub fn header(level: u8, content: impl Into<String>) -> Self {
        Self::stamped(BlockKind::Header(level.clamp(1, 6)), content.into())
    }

    /// New horizontal rule.
    pub fn horizontal_rule() -> Self {
        Self::stamped(BlockKind::HorizontalRule, String::new())
    }

    /// New blockquote.
    pub fn blockquote(content: impl Into<String>) -> Self {
        Self::stamped(BlockKind::Blockquote, content.into())
    }

    /// New code block. `language` is `None` for plain, unannotated code.
    pub fn code(content: impl Into<String>, language: Option<String>) -> Self {
        let mut block = Self::stamped(BlockKind::Code, content.into());
        block.language = language;
        block
    }

    /// New math block.
    pub fn math(content: impl Into<String>) -> Self {
        Self::stamped(BlockKind::Math, content.into())
    }

    /// New ordered list from pre-built items.
    pub fn ordered_list(items: Vec<ListItem>) -> Self {
        let mut block = Self::stamped(BlockKind::OrderedList, String::new());
        block.items = items;
        block
    }

    /// New unordered list from pre-built items.
    pub fn unordered_list(items: Vec<ListItem>) -> Self {
        let mut block = Self::stamped(BlockKind::UnorderedList, String::new());
        block.items = items;
        block
    }

    /// New image block referencing an embedded resource by filename.
    ///
    /// The reference is soft: the resource may be registered later or be
    /// missing entirely without invalidating the block.
    pub fn image(filename: impl Into<String>) -> Self {
        Self::stamped(BlockKind::Image, filename.into())
    }

    /// Rebuilds a block from persisted form. Timestamps are taken verbatim.
    pub fn restored(
        kind: BlockKind,
        content: impl Into<String>,
        language: Option<String>,
        items: Vec<ListItem>,
        created: i64,
        modified: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            language,
            items,
            created,
            modified,
        }
    }

    /// Replaces the text payload and bumps `modified`.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.modified = now_ms().max(self.created);
    }

    /// Whether this block owns an `items` sequence.
    pub fn is_list(&self) -> bool {
        self.kind.is_list()
    }
}
