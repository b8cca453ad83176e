//! Total accessors over an ordered block sequence.
//!
//! Every function here takes a slice and a block id and never panics: a
//! missing id yields `None` or `false`. Nothing allocates except
//! [`normalize_blocks`], which runs once on load.

use std::collections::HashSet;

use crate::block::{Block, BlockId, BlockKind};

/// Id given to the seed paragraph of an empty document.
pub const SEED_BLOCK_ID: &str = "b1";

/// The block with `id`, if present.
pub fn find<'a>(blocks: &'a [Block], id: &BlockId) -> Option<&'a Block> {
    blocks.iter().find(|b| &b.id == id)
}

/// Position of the block with `id`, if present.
pub fn index_of(blocks: &[Block], id: &BlockId) -> Option<usize> {
    blocks.iter().position(|b| &b.id == id)
}

/// Whether `id` names the final block.
pub fn is_last(blocks: &[Block], id: &BlockId) -> bool {
    blocks.last().is_some_and(|b| &b.id == id)
}

/// Whether `id` names the only block.
pub fn is_only(blocks: &[Block], id: &BlockId) -> bool {
    matches!(blocks, [only] if &only.id == id)
}

/// The block immediately before `id`. `None` for the first block or a missing id.
pub fn previous<'a>(blocks: &'a [Block], id: &BlockId) -> Option<&'a Block> {
    match index_of(blocks, id)? {
        0 => None,
        i => blocks.get(i - 1),
    }
}

/// The sequence an empty document starts with: one empty paragraph.
pub fn seed_blocks() -> Vec<Block> {
    vec![Block::new(BlockId::from(SEED_BLOCK_ID), BlockKind::Paragraph)]
}

/// Bring a stored payload into editable shape.
///
/// - An empty sequence is seeded with [`seed_blocks`].
/// - A block whose id repeats an earlier block's id gets a fresh id.
///
/// Order is never changed.
pub fn normalize_blocks(blocks: Vec<Block>) -> Vec<Block> {
    if blocks.is_empty() {
        return seed_blocks();
    }

    let mut seen: HashSet<BlockId> = HashSet::with_capacity(blocks.len());
    blocks
        .into_iter()
        .map(|mut block| {
            if !seen.insert(block.id.clone()) {
                block.id = BlockId::generate();
                seen.insert(block.id.clone());
            }
            block
        })
        .collect()
}
