//! Block types: identity, kind, and the stored block record.
//!
//! A block is one typed unit of document content. The record shape is the
//! storage format, so it is kept deliberately loose on the way in:
//!
//! - the kind is written under `type` (what existing documents carry) and
//!   `kind` is accepted as an alias on read;
//! - `content` defaults to empty when absent (dividers often omit it);
//! - unknown fields are collected into `extra` and written back untouched,
//!   so a newer client's additions survive an older client's autosave;
//! - an unrecognized kind edits as a paragraph but keeps its stored tag, and
//!   is written back under that tag until the block is retyped.
//!
//! ## Design: closed BlockKind
//!
//! `BlockKind` is a closed enum. Every place that styles or labels a block
//! matches on it exhaustively, so adding a kind is a compile error until every
//! table is updated.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Opaque, stable block identifier, unique within its document.
///
/// Stored ids are kept verbatim (`"b1"`, `"b-1718035200000"`, ...). Fresh ids
/// come from [`BlockId::generate`] and are never reused.
#[derive(Clone, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh id: `b-` followed by a UUIDv7 in simple hex form.
    ///
    /// Time-ordered and globally unique, so two calls never collide even
    /// within the same millisecond.
    pub fn generate() -> Self {
        Self(format!("b-{}", uuid::Uuid::now_v7().as_simple()))
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

/// What a block *is*: selects its editing and rendering behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum BlockKind {
    /// Plain text. Also how blocks of an unrecognized stored kind edit.
    #[default]
    #[strum(serialize = "paragraph", serialize = "text")]
    Paragraph,
    #[strum(serialize = "heading1", serialize = "h1")]
    Heading1,
    #[strum(serialize = "heading2", serialize = "h2")]
    Heading2,
    #[strum(serialize = "heading3", serialize = "h3")]
    Heading3,
    #[strum(serialize = "bullet", serialize = "list")]
    Bullet,
    /// Collapsible: `content` is the title, `children` the hidden body.
    Toggle,
    /// Horizontal rule. No editable text.
    Divider,
    /// Highlighted aside with an icon.
    Callout,
}

impl BlockKind {
    /// Every kind, in command palette order.
    pub const ALL: [BlockKind; 8] = [
        BlockKind::Paragraph,
        BlockKind::Heading1,
        BlockKind::Heading2,
        BlockKind::Heading3,
        BlockKind::Bullet,
        BlockKind::Toggle,
        BlockKind::Divider,
        BlockKind::Callout,
    ];

    /// Parse from string (case-insensitive).
    ///
    /// Supports aliases: "text" -> Paragraph, "h1".."h3", "list" -> Bullet.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Exact match against the stored names. No aliases, no case folding.
    pub fn from_stored(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Convert to the stored string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading1 => "heading1",
            BlockKind::Heading2 => "heading2",
            BlockKind::Heading3 => "heading3",
            BlockKind::Bullet => "bullet",
            BlockKind::Toggle => "toggle",
            BlockKind::Divider => "divider",
            BlockKind::Callout => "callout",
        }
    }

    /// Display label, as shown in the command palette.
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "Text",
            BlockKind::Heading1 => "Heading 1",
            BlockKind::Heading2 => "Heading 2",
            BlockKind::Heading3 => "Heading 3",
            BlockKind::Bullet => "Bullet List",
            BlockKind::Toggle => "Toggle",
            BlockKind::Divider => "Divider",
            BlockKind::Callout => "Callout",
        }
    }

    /// Placeholder shown in an empty block of this kind.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            BlockKind::Paragraph => Some("Type '/' for commands..."),
            BlockKind::Heading1 => Some("Heading 1..."),
            BlockKind::Heading2 => Some("Heading 2..."),
            BlockKind::Heading3 => Some("Heading 3..."),
            BlockKind::Bullet => Some("Bullet List..."),
            BlockKind::Toggle => Some("Toggle title..."),
            BlockKind::Divider => None,
            BlockKind::Callout => Some("Callout text..."),
        }
    }

    /// Placeholder for the toggle body.
    pub const TOGGLE_BODY_PLACEHOLDER: &'static str = "Toggle content...";

    /// Whether blocks of this kind carry editable `content`.
    pub fn has_text(&self) -> bool {
        !matches!(self, BlockKind::Divider)
    }

    /// Whether `children` is meaningful for this kind.
    pub fn has_children(&self) -> bool {
        matches!(self, BlockKind::Toggle)
    }

    /// Check if this is one of the three heading levels.
    pub fn is_heading(&self) -> bool {
        matches!(
            self,
            BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3
        )
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One block as stored and edited.
///
/// `expanded` (toggle disclosure) is deliberately absent: it is UI state and
/// lives in the editor's interaction state, keyed by block id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "BlockRecord", into = "BlockRecord")]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Primary text. Ignored for dividers.
    pub content: String,
    /// Toggle body text. Only rendered for toggles; retained otherwise.
    pub children: Option<String>,
    /// Unknown stored fields, passed through unchanged.
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// Stored kind tag this build does not know. Set only while `kind` is
    /// `Paragraph`; cleared by [`Block::set_kind`].
    stored_kind: Option<String>,
}

/// The block as it sits in storage.
#[derive(Serialize, Deserialize)]
struct BlockRecord {
    id: BlockId,
    #[serde(rename = "type", alias = "kind")]
    kind: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl From<BlockRecord> for Block {
    fn from(record: BlockRecord) -> Self {
        let (kind, stored_kind) = match BlockKind::from_stored(&record.kind) {
            Some(kind) => (kind, None),
            None => (BlockKind::Paragraph, Some(record.kind)),
        };
        Self {
            id: record.id,
            kind,
            content: record.content,
            children: record.children,
            extra: record.extra,
            stored_kind,
        }
    }
}

impl From<Block> for BlockRecord {
    fn from(block: Block) -> Self {
        let kind = match block.stored_kind {
            Some(tag) if block.kind == BlockKind::Paragraph => tag,
            _ => block.kind.as_str().to_string(),
        };
        Self {
            id: block.id,
            kind,
            content: block.content,
            children: block.children,
            extra: block.extra,
        }
    }
}

impl Block {
    /// Create an empty block of the given kind.
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Self {
            id,
            kind,
            content: String::new(),
            children: None,
            extra: serde_json::Map::new(),
            stored_kind: None,
        }
    }

    /// Change the kind. Drops any unrecognized stored tag.
    pub fn set_kind(&mut self, kind: BlockKind) {
        self.kind = kind;
        self.stored_kind = None;
    }

    /// The stored kind tag when it was not one this build knows.
    pub fn unknown_kind(&self) -> Option<&str> {
        self.stored_kind.as_deref()
    }

    /// Create a paragraph with content.
    pub fn paragraph(id: impl Into<BlockId>, content: impl Into<String>) -> Self {
        Self::new(id.into(), BlockKind::Paragraph).with_content(content)
    }

    /// Set content (builder style).
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set toggle body (builder style).
    pub fn with_children(mut self, children: impl Into<String>) -> Self {
        self.children = Some(children.into());
        self
    }

    /// Whether the primary text is empty.
    ///
    /// This is what Backspace-merge and the `/` palette trigger test.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Toggle body text, or empty when unset.
    pub fn children_text(&self) -> &str {
        self.children.as_deref().unwrap_or_default()
    }
}

/// Partial update merged into a block by `update_block`.
///
/// `None` fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockPatch {
    pub kind: Option<BlockKind>,
    pub content: Option<String>,
    pub children: Option<String>,
}

impl BlockPatch {
    /// Patch that only replaces content.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Patch that only replaces the toggle body.
    pub fn children(children: impl Into<String>) -> Self {
        Self {
            children: Some(children.into()),
            ..Self::default()
        }
    }

    /// Patch that only changes the kind.
    pub fn kind(kind: BlockKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Check whether the patch would leave `block` as it is.
    pub fn is_noop_for(&self, block: &Block) -> bool {
        self.kind.is_none_or(|k| k == block.kind)
            && self.content.as_ref().is_none_or(|c| *c == block.content)
            && self
                .children
                .as_ref()
                .is_none_or(|c| block.children.as_ref() == Some(c))
    }

    /// Merge this patch into a copy of `block`.
    pub fn apply(&self, block: &Block) -> Block {
        let mut next = block.clone();
        if let Some(kind) = self.kind.filter(|k| *k != block.kind) {
            next.set_kind(kind);
        }
        if let Some(content) = &self.content {
            next.content = content.clone();
        }
        if let Some(children) = &self.children {
            next.children = Some(children.clone());
        }
        next
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── BlockId ─────────────────────────────────────────────────────────

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: std::collections::HashSet<BlockId> =
            (0..1000).map(|_| BlockId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_generated_id_prefix() {
        let id = BlockId::generate();
        assert!(id.as_str().starts_with("b-"));
        assert_eq!(id.as_str().len(), 2 + 32);
    }

    #[test]
    fn test_block_id_serde_is_plain_string() {
        let id = BlockId::from("b1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"b1\"");
        assert_eq!(id.to_string(), "b1");
    }

    // ── BlockKind ───────────────────────────────────────────────────────

    #[test]
    fn test_block_kind_parsing() {
        assert_eq!(BlockKind::from_str("paragraph"), Some(BlockKind::Paragraph));
        assert_eq!(BlockKind::from_str("TEXT"), Some(BlockKind::Paragraph));
        assert_eq!(BlockKind::from_str("Heading1"), Some(BlockKind::Heading1));
        assert_eq!(BlockKind::from_str("h2"), Some(BlockKind::Heading2));
        assert_eq!(BlockKind::from_str("list"), Some(BlockKind::Bullet));
        assert_eq!(BlockKind::from_str("callout"), Some(BlockKind::Callout));
        assert_eq!(BlockKind::from_str("table"), None);
    }

    #[test]
    fn test_block_kind_as_str_roundtrips_through_parse() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_block_kind_labels() {
        assert_eq!(BlockKind::Paragraph.label(), "Text");
        assert_eq!(BlockKind::Heading1.label(), "Heading 1");
        assert_eq!(BlockKind::Bullet.label(), "Bullet List");
        assert_eq!(BlockKind::Toggle.label(), "Toggle");
        assert_eq!(BlockKind::Divider.label(), "Divider");
        assert_eq!(BlockKind::Callout.label(), "Callout");
    }

    #[test]
    fn test_block_kind_placeholders() {
        assert_eq!(
            BlockKind::Paragraph.placeholder(),
            Some("Type '/' for commands...")
        );
        assert_eq!(BlockKind::Heading2.placeholder(), Some("Heading 2..."));
        assert_eq!(BlockKind::Divider.placeholder(), None);
    }

    #[test]
    fn test_block_kind_capabilities() {
        assert!(!BlockKind::Divider.has_text());
        assert!(BlockKind::Callout.has_text());
        assert!(BlockKind::Toggle.has_children());
        assert!(!BlockKind::Paragraph.has_children());
        assert!(BlockKind::Heading3.is_heading());
        assert!(!BlockKind::Bullet.is_heading());
    }

    #[test]
    fn test_block_kind_serde_lowercase() {
        let json = serde_json::to_string(&BlockKind::Heading1).unwrap();
        assert_eq!(json, "\"heading1\"");
    }

    #[test]
    fn test_from_stored_is_exact() {
        assert_eq!(BlockKind::from_stored("heading2"), Some(BlockKind::Heading2));
        assert_eq!(BlockKind::from_stored("h2"), None);
        assert_eq!(BlockKind::from_stored("Bullet"), None);
    }

    // ── Block record ────────────────────────────────────────────────────

    #[test]
    fn test_block_serializes_kind_as_type() {
        let block = Block::paragraph("b1", "hello");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value, json!({"id": "b1", "type": "paragraph", "content": "hello"}));
    }

    #[test]
    fn test_block_reads_kind_alias() {
        let block: Block =
            serde_json::from_value(json!({"id": "b1", "kind": "bullet", "content": "x"})).unwrap();
        assert_eq!(block.kind, BlockKind::Bullet);
    }

    #[test]
    fn test_block_missing_content_defaults_empty() {
        let block: Block = serde_json::from_value(json!({"id": "d", "type": "divider"})).unwrap();
        assert_eq!(block.kind, BlockKind::Divider);
        assert!(block.content.is_empty());
        assert!(block.children.is_none());
    }

    #[test]
    fn test_block_toggle_children_roundtrip() {
        let block = Block::new(BlockId::from("t"), BlockKind::Toggle)
            .with_content("title")
            .with_children("body");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["children"], "body");
        let back: Block = serde_json::from_value(value).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_block_unknown_fields_pass_through() {
        let stored = json!({
            "id": "b7",
            "type": "callout",
            "content": "note",
            "color": "yellow",
            "meta": {"pinned": true}
        });
        let block: Block = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(block.extra.get("color"), Some(&json!("yellow")));
        let written = serde_json::to_value(&block).unwrap();
        assert_eq!(written, stored);
    }

    #[test]
    fn test_unknown_kind_edits_as_paragraph_and_writes_back_unchanged() {
        let stored = json!({"id": "b9", "type": "quote", "content": "to be"});
        let mut block: Block = serde_json::from_value(stored).unwrap();
        assert_eq!(block.kind, BlockKind::Paragraph);
        assert_eq!(block.unknown_kind(), Some("quote"));

        block.content = "to be or not".into();
        let written = serde_json::to_value(&block).unwrap();
        assert_eq!(written, json!({"id": "b9", "type": "quote", "content": "to be or not"}));
    }

    #[test]
    fn test_retyping_unknown_kind_drops_stored_tag() {
        let mut block: Block =
            serde_json::from_value(json!({"id": "b9", "type": "quote"})).unwrap();
        block.set_kind(BlockKind::Callout);
        assert_eq!(block.unknown_kind(), None);
        assert_eq!(serde_json::to_value(&block).unwrap()["type"], "callout");

        let block: Block = serde_json::from_value(json!({"id": "b9", "type": "quote"})).unwrap();
        let patched = BlockPatch::kind(BlockKind::Heading1).apply(&block);
        assert_eq!(serde_json::to_value(&patched).unwrap()["type"], "heading1");
    }

    // ── BlockPatch ──────────────────────────────────────────────────────

    #[test]
    fn test_patch_merges_only_supplied_fields() {
        let block = Block::paragraph("b1", "abc");
        let patched = BlockPatch::kind(BlockKind::Heading1).apply(&block);
        assert_eq!(patched.kind, BlockKind::Heading1);
        assert_eq!(patched.content, "abc");
        assert_eq!(patched.id, block.id);
    }

    #[test]
    fn test_patch_noop_detection() {
        let block = Block::paragraph("b1", "abc");
        assert!(BlockPatch::content("abc").is_noop_for(&block));
        assert!(!BlockPatch::content("abcd").is_noop_for(&block));
        assert!(BlockPatch::default().is_noop_for(&block));
        assert!(!BlockPatch::children("").is_noop_for(&block));
    }
}
