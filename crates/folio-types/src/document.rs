//! Document records: the unit the store persists and the editor opens.
//!
//! Notes and journal entries share one record. Notes carry `tags`; journal
//! entries carry the `date` they belong to and a `mood`. Listings order
//! journal entries by `date`, everything else by `updated_at`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::block::{Block, BlockId, BlockKind};
use crate::ids::DocumentId;
use crate::sequence::normalize_blocks;

/// Which feature a document belongs to. Both host the same block editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DocumentKind {
    #[default]
    Note,
    Journal,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Note => "note",
            DocumentKind::Journal => "journal",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a journal day felt. Stored under its capitalized name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Mood {
    Amazing,
    #[default]
    Good,
    Okay,
    Tough,
    Bad,
}

impl Mood {
    /// Shown for entries that have no mood.
    pub const NO_MOOD_EMOJI: &'static str = "📝";

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Amazing => "Amazing",
            Mood::Good => "Good",
            Mood::Okay => "Okay",
            Mood::Tough => "Tough",
            Mood::Bad => "Bad",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Amazing => "🌟",
            Mood::Good => "😊",
            Mood::Okay => "😐",
            Mood::Tough => "😔",
            Mood::Bad => "😢",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document.
///
/// `blocks` is the opaque payload replaced wholesale on every autosave.
/// Timestamps are Unix milliseconds and are owned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub kind: DocumentKind,
    #[serde(default)]
    pub title: String,
    pub blocks: Vec<Block>,
    /// Note tags, in the order given.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    /// The day a journal entry belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Document {
    /// Listing row for this document.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            kind: self.kind,
            title: self.title.clone(),
            block_count: self.blocks.len(),
            tags: self.tags.clone(),
            mood: self.mood,
            date: self.date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Blocks in editable shape (seeded if empty, duplicate ids renamed).
    pub fn normalized_blocks(&self) -> Vec<Block> {
        normalize_blocks(self.blocks.clone())
    }
}

/// A document as listed, without its block payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub kind: DocumentKind,
    pub title: String,
    pub block_count: usize,
    pub tags: Vec<String>,
    pub mood: Option<Mood>,
    pub date: Option<NaiveDate>,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Input to `create_document`. The store assigns id and timestamps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewDocument {
    pub kind: DocumentKind,
    pub title: String,
    /// Initial blocks; normalized by the store (empty becomes one paragraph).
    pub blocks: Vec<Block>,
    pub tags: Vec<String>,
    pub mood: Option<Mood>,
    /// Journal day. A journal entry without one gets the local date of its
    /// creation.
    pub date: Option<NaiveDate>,
}

impl NewDocument {
    pub fn note(title: impl Into<String>) -> Self {
        Self {
            kind: DocumentKind::Note,
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn journal(title: impl Into<String>) -> Self {
        Self {
            kind: DocumentKind::Journal,
            title: title.into(),
            ..Self::default()
        }
    }

    /// A journal entry for `date` with the daily reflection template.
    pub fn journal_for(date: NaiveDate, mood: Mood) -> Self {
        let section = |id: &str, text: &str| {
            Block::new(BlockId::from(id), BlockKind::Heading2).with_content(text)
        };
        let blocks = vec![
            section("b1", "Morning Reflection"),
            Block::paragraph("b2", ""),
            section("b3", "Gratitude"),
            Block::new(BlockId::from("b4"), BlockKind::Bullet),
            section("b5", "Intentions"),
            Block::new(BlockId::from("b6"), BlockKind::Bullet),
        ];
        Self::journal(format!("Journal - {}", date.format("%B %-d, %Y")))
            .with_blocks(blocks)
            .with_mood(mood)
            .with_date(date)
    }

    /// Set initial blocks (builder style).
    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = Some(mood);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Build the stored record with the given id and creation time.
    pub fn into_document(self, id: DocumentId, now: u64) -> Document {
        let date = match (self.kind, self.date) {
            (DocumentKind::Journal, None) => local_date(now),
            (_, date) => date,
        };
        Document {
            id,
            kind: self.kind,
            title: self.title,
            blocks: normalize_blocks(self.blocks),
            tags: self.tags,
            mood: self.mood,
            date,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Local calendar date of a Unix-millisecond instant.
fn local_date(millis: u64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp_millis(millis as i64)
        .map(|t| t.with_timezone(&chrono::Local).date_naive())
}
