//! Structural editing operations over a block sequence.
//!
//! Every operation takes `&[Block]` and never mutates it. Operations that may
//! decline return `Cow<'_, [Block]>`: `Cow::Borrowed` is the input handed back
//! as-is (a no-op), `Cow::Owned` is a new sequence. Callers detect "nothing
//! happened" by matching on the variant instead of comparing sequences.
//!
//! The sequence invariants hold across every operation here:
//! - never empty (deleting the last block declines);
//! - ids pairwise distinct (fresh ids come from [`BlockId::generate`]);
//! - order only changes by insertion or removal.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use folio_types::{Block, BlockId, BlockKind, BlockPatch, index_of, previous};

/// What happens to a toggle's body when the block is retyped away from toggle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildrenPolicy {
    /// Keep `children` on the block; it reappears if retyped back to toggle.
    #[default]
    Retain,
    /// Drop `children` when the block stops being a toggle.
    Clear,
}

/// Insert an empty block of `kind` directly after `after`.
///
/// Appends at the end when `after` is not in the sequence. Never declines.
/// Returns the new sequence and the new block's id.
pub fn insert_after(blocks: &[Block], after: &BlockId, kind: BlockKind) -> (Vec<Block>, BlockId) {
    let new_id = BlockId::generate();
    let at = index_of(blocks, after).map_or(blocks.len(), |i| i + 1);

    let mut next = Vec::with_capacity(blocks.len() + 1);
    next.extend_from_slice(&blocks[..at]);
    next.push(Block::new(new_id.clone(), kind));
    next.extend_from_slice(&blocks[at..]);

    tracing::debug!(after = %after, new = %new_id, ?kind, "insert block");
    (next, new_id)
}

/// Remove the block with `id`.
///
/// Declines when the id is missing or the sequence has one block left.
pub fn delete_block<'a>(blocks: &'a [Block], id: &BlockId) -> Cow<'a, [Block]> {
    if blocks.len() <= 1 {
        return Cow::Borrowed(blocks);
    }
    let Some(at) = index_of(blocks, id) else {
        return Cow::Borrowed(blocks);
    };

    let mut next = blocks.to_vec();
    next.remove(at);
    tracing::debug!(%id, "delete block");
    Cow::Owned(next)
}

/// Merge `patch` into the block with `id`.
///
/// Declines when the id is missing or the patch changes nothing.
pub fn update_block<'a>(blocks: &'a [Block], id: &BlockId, patch: &BlockPatch) -> Cow<'a, [Block]> {
    let Some(at) = index_of(blocks, id) else {
        return Cow::Borrowed(blocks);
    };
    if patch.is_noop_for(&blocks[at]) {
        return Cow::Borrowed(blocks);
    }

    let mut next = blocks.to_vec();
    next[at] = patch.apply(&blocks[at]);
    Cow::Owned(next)
}

/// Change the kind of the block with `id`, keeping its content.
///
/// When leaving `toggle`, `policy` decides the fate of the body text.
pub fn retype<'a>(
    blocks: &'a [Block],
    id: &BlockId,
    kind: BlockKind,
    policy: ChildrenPolicy,
) -> Cow<'a, [Block]> {
    let Some(at) = index_of(blocks, id) else {
        return Cow::Borrowed(blocks);
    };
    let current = &blocks[at];
    if current.kind == kind {
        return Cow::Borrowed(blocks);
    }

    let mut block = current.clone();
    block.set_kind(kind);
    if policy == ChildrenPolicy::Clear && current.kind.has_children() && !kind.has_children() {
        block.children = None;
    }

    tracing::debug!(%id, from = ?current.kind, to = ?kind, ?policy, "retype block");
    let mut next = blocks.to_vec();
    next[at] = block;
    Cow::Owned(next)
}

/// Enter: open a new empty paragraph directly after `id`.
///
/// The triggering block keeps its text. `None` when `id` is missing.
pub fn split_at_cursor(blocks: &[Block], id: &BlockId) -> Option<(Vec<Block>, BlockId)> {
    index_of(blocks, id)?;
    Some(insert_after(blocks, id, BlockKind::Paragraph))
}

/// Backspace on an empty block: remove it and focus the block before it.
///
/// Only fires when the block's content is empty and a previous block exists.
/// Returns the new sequence and the previous block's id.
pub fn merge_on_backspace(blocks: &[Block], id: &BlockId) -> Option<(Vec<Block>, BlockId)> {
    let at = index_of(blocks, id)?;
    if !blocks[at].is_empty() {
        return None;
    }
    let focus = previous(blocks, id)?.id.clone();

    let mut next = blocks.to_vec();
    next.remove(at);
    tracing::debug!(%id, %focus, "merge on backspace");
    Some((next, focus))
}
