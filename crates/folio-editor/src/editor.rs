//! The editor host: current blocks plus interaction state.
//!
//! `Editor` is what a view layer holds. It feeds events through the state
//! machine, swaps in the new blocks, and reports an [`EditEffect`] so the
//! caller knows whether to re-render and whether to notify autosave.

use serde::{Deserialize, Serialize};

use folio_types::{Block, BlockId, BlockKind, normalize_blocks};

use crate::interaction::{EditorEvent, InteractionState};
use crate::ops::ChildrenPolicy;

/// Editor behavior knobs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// What retyping away from toggle does with the body text.
    #[serde(default)]
    pub children_policy: ChildrenPolicy,
}

/// What a dispatched event did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditEffect {
    /// The blocks changed. Forward them to autosave.
    Changed,
    /// Only UI state changed (menu, disclosure, focus). Re-render, don't save.
    StateOnly,
    /// Nothing happened.
    Ignored,
}

impl EditEffect {
    pub fn is_changed(&self) -> bool {
        matches!(self, EditEffect::Changed)
    }
}

/// Render-ready view of one block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockView<'a> {
    pub block: &'a Block,
    pub label: &'static str,
    /// Placeholder for the primary text; `None` once the block has text.
    pub placeholder: Option<&'static str>,
    /// Placeholder for an empty toggle body.
    pub children_placeholder: Option<&'static str>,
    pub menu_open: bool,
    pub expanded: bool,
}

/// One command palette entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteEntry {
    pub kind: BlockKind,
    pub label: &'static str,
}

/// Command palette entries, in display order.
pub fn palette() -> Vec<PaletteEntry> {
    BlockKind::ALL
        .iter()
        .map(|&kind| PaletteEntry {
            kind,
            label: kind.label(),
        })
        .collect()
}

/// An open document's editable state.
#[derive(Clone, Debug)]
pub struct Editor {
    blocks: Vec<Block>,
    state: InteractionState,
    config: EditorConfig,
}

impl Editor {
    /// Start editing `blocks`. The sequence is normalized first.
    pub fn new(blocks: Vec<Block>, config: EditorConfig) -> Self {
        Self {
            blocks: normalize_blocks(blocks),
            state: InteractionState::new(),
            config,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Apply one event.
    pub fn dispatch(&mut self, event: &EditorEvent) -> EditEffect {
        let transition = self
            .state
            .handle_with(&self.blocks, event, self.config.children_policy);

        let effect = match (&transition.blocks, transition.state == self.state) {
            (Some(_), _) => EditEffect::Changed,
            (None, false) => EditEffect::StateOnly,
            (None, true) => EditEffect::Ignored,
        };

        self.state = transition.state;
        if let Some(blocks) = transition.blocks {
            self.blocks = blocks;
        }

        tracing::trace!(?event, ?effect, "dispatch");
        effect
    }

    /// Consume the pending focus target, if its block still exists.
    pub fn take_focus(&mut self) -> Option<BlockId> {
        self.state.take_focus(&self.blocks)
    }

    /// Render-ready rows, in document order.
    pub fn rows(&self) -> Vec<BlockView<'_>> {
        self.blocks
            .iter()
            .map(|block| {
                let is_toggle = block.kind == BlockKind::Toggle;
                BlockView {
                    block,
                    label: block.kind.label(),
                    placeholder: block.kind.placeholder().filter(|_| block.is_empty()),
                    children_placeholder: (is_toggle && block.children_text().is_empty())
                        .then_some(BlockKind::TOGGLE_BODY_PLACEHOLDER),
                    menu_open: self.state.menu_open_on(&block.id),
                    expanded: is_toggle && self.state.is_expanded(&block.id),
                }
            })
            .collect()
    }

    /// Command palette entries.
    pub fn palette(&self) -> Vec<PaletteEntry> {
        palette()
    }
}
