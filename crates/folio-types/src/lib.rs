//! Shared block and document types for Folio.
//!
//! This crate is the leaf of the workspace: typed ids, the block record, the
//! document record, and total accessors over an ordered block sequence. It
//! does no I/O and has **no internal folio dependencies**.
//!
//! # Model Overview
//!
//! ```text
//! Document (DocumentId) ← a note or a journal entry
//!     └── title, kind, created_at / updated_at
//!     └── tags (notes), date + mood (journal entries)
//!     └── blocks: ordered, flat, never empty
//!           └── Block (BlockId) ← paragraph, heading, bullet, toggle, ...
//!                 └── content   (primary text)
//!                 └── children  (toggle body text, not nested blocks)
//! ```
//!
//! # Key Types
//!
//! |--------------------|----------------------------------------------|
//! | Type               | Purpose                                      |
//! |--------------------|----------------------------------------------|
//! | [`Block`]          | One stored block (id + kind + text)          |
//! | [`BlockId`]        | Opaque block identity, stable across edits   |
//! | [`BlockKind`]      | Closed set of eight kinds + label table      |
//! | [`BlockPatch`]     | Partial update for `update_block`            |
//! | [`Document`]       | Stored document (blocks + metadata)          |
//! | [`DocumentId`]     | Which document (UUIDv7)                      |
//! | [`DocumentSummary`]| Listing row without the block payload        |
//! | [`Mood`]           | How a journal day felt (five levels)         |
//! | [`SessionId`]      | Which editing session                        |
//! |--------------------|----------------------------------------------|

pub mod block;
pub mod document;
pub mod ids;
pub mod sequence;

// Re-export primary types at crate root for convenience.
pub use block::{Block, BlockId, BlockKind, BlockPatch};
pub use document::{Document, DocumentKind, DocumentSummary, Mood, NewDocument};
pub use ids::{DocumentId, PrefixError, SessionId, resolve_document_prefix};
pub use sequence::{find, index_of, is_last, is_only, normalize_blocks, previous, seed_blocks};

/// Current time as Unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
