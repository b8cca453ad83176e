//! Per-session UI state and event routing.
//!
//! [`InteractionState`] is a plain value. [`InteractionState::handle`] reads
//! the current blocks and one [`EditorEvent`] and returns a [`Transition`]:
//! the next state plus, when the event mutated the document, the new blocks.
//! Nothing here touches ambient state, so every transition is testable as a
//! pure function.
//!
//! Events the machine does not recognize, events naming a missing block, and
//! anything but the delete button aimed at a divider are ignored: the
//! transition carries the state unchanged and no blocks.

use std::borrow::Cow;
use std::collections::HashMap;

use folio_types::{Block, BlockId, BlockKind, BlockPatch, find};

use crate::ops::{self, ChildrenPolicy};

/// A key pressed while a block has focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter { shift: bool },
    Backspace,
    Escape,
    /// The `/` palette trigger.
    Slash,
}

/// Everything the host can report to the editor.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    /// The block's primary text is now `text`.
    Input { id: BlockId, text: String },
    /// A toggle's body text is now `text`.
    ChildrenInput { id: BlockId, text: String },
    /// A key went down in the block before the text changed.
    Key { id: BlockId, key: Key },
    /// A kind was picked from the command palette open on `id`.
    SelectKind { id: BlockId, kind: BlockKind },
    /// The disclosure triangle of a toggle was clicked.
    Disclosure { id: BlockId },
    /// The block's menu button was clicked.
    MenuButton { id: BlockId },
    /// The block's delete affordance (the divider's ×) was clicked.
    DeleteButton { id: BlockId },
    /// "Add block" at the end of the document.
    AddBlock,
    /// A click landed outside any open menu.
    ClickOutside,
}

/// Result of handling one event.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: InteractionState,
    /// New blocks when the event changed the document.
    pub blocks: Option<Vec<Block>>,
}

impl Transition {
    fn unchanged(state: &InteractionState) -> Self {
        Self {
            state: state.clone(),
            blocks: None,
        }
    }

    fn state_only(state: InteractionState) -> Self {
        Self {
            state,
            blocks: None,
        }
    }
}

/// UI state for one editing session. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractionState {
    /// Block whose command palette is open. At most one.
    pub active_menu: Option<BlockId>,
    /// Toggle disclosure, keyed by block id. Missing means collapsed.
    pub expanded: HashMap<BlockId, bool>,
    /// Block to focus after the next render. Consumed by [`Self::take_focus`].
    pub pending_focus: Option<BlockId>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the toggle `id` is open.
    pub fn is_expanded(&self, id: &BlockId) -> bool {
        self.expanded.get(id).copied().unwrap_or(false)
    }

    /// Whether the palette is open on `id`.
    pub fn menu_open_on(&self, id: &BlockId) -> bool {
        self.active_menu.as_ref() == Some(id)
    }

    /// Consume the pending focus target.
    ///
    /// The target is dropped, not returned, when the block no longer exists.
    pub fn take_focus(&mut self, blocks: &[Block]) -> Option<BlockId> {
        self.pending_focus
            .take()
            .filter(|id| find(blocks, id).is_some())
    }

    /// Handle `event` with the default children policy.
    pub fn handle(&self, blocks: &[Block], event: &EditorEvent) -> Transition {
        self.handle_with(blocks, event, ChildrenPolicy::default())
    }

    /// Handle `event`, applying `policy` to palette retypes.
    pub fn handle_with(
        &self,
        blocks: &[Block],
        event: &EditorEvent,
        policy: ChildrenPolicy,
    ) -> Transition {
        match event {
            EditorEvent::Input { id, text } => {
                let Some(block) = editable(blocks, id) else {
                    return Transition::unchanged(self);
                };
                if block.content == *text {
                    return Transition::unchanged(self);
                }
                self.mutated(ops::update_block(blocks, id, &BlockPatch::content(text.as_str())))
            }

            EditorEvent::ChildrenInput { id, text } => {
                match find(blocks, id) {
                    Some(block) if block.kind.has_children() => {}
                    _ => return Transition::unchanged(self),
                }
                self.mutated(ops::update_block(blocks, id, &BlockPatch::children(text.as_str())))
            }

            EditorEvent::Key { id, key } => self.handle_key(blocks, id, *key),

            EditorEvent::SelectKind { id, kind } => {
                if editable(blocks, id).is_none() {
                    return Transition::unchanged(self);
                }
                let mut next = self.mutated(ops::retype(blocks, id, *kind, policy));
                next.state.active_menu = None;
                next
            }

            EditorEvent::Disclosure { id } => {
                match find(blocks, id) {
                    Some(block) if block.kind == BlockKind::Toggle => {}
                    _ => return Transition::unchanged(self),
                }
                let mut state = self.clone();
                let open = !self.is_expanded(id);
                state.expanded.insert(id.clone(), open);
                tracing::debug!(%id, open, "toggle disclosure");
                Transition::state_only(state)
            }

            EditorEvent::MenuButton { id } => {
                if editable(blocks, id).is_none() {
                    return Transition::unchanged(self);
                }
                let mut state = self.clone();
                state.active_menu = if self.menu_open_on(id) {
                    None
                } else {
                    Some(id.clone())
                };
                Transition::state_only(state)
            }

            EditorEvent::DeleteButton { id } => {
                let mut next = self.mutated(ops::delete_block(blocks, id));
                if next.blocks.is_some() && next.state.menu_open_on(id) {
                    next.state.active_menu = None;
                }
                next
            }

            EditorEvent::AddBlock => {
                let Some(last) = blocks.last() else {
                    return Transition::unchanged(self);
                };
                let (next_blocks, new_id) =
                    ops::insert_after(blocks, &last.id, BlockKind::Paragraph);
                let mut state = self.clone();
                state.pending_focus = Some(new_id);
                Transition {
                    state: state.pruned(&next_blocks),
                    blocks: Some(next_blocks),
                }
            }

            EditorEvent::ClickOutside => self.close_menu(),
        }
    }

    fn handle_key(&self, blocks: &[Block], id: &BlockId, key: Key) -> Transition {
        if key == Key::Escape {
            return self.close_menu();
        }
        let Some(block) = editable(blocks, id) else {
            return Transition::unchanged(self);
        };

        match key {
            Key::Enter { shift: false } => {
                let Some((next_blocks, new_id)) = ops::split_at_cursor(blocks, id) else {
                    return Transition::unchanged(self);
                };
                let mut state = self.clone();
                state.pending_focus = Some(new_id);
                state.active_menu = None;
                Transition {
                    state: state.pruned(&next_blocks),
                    blocks: Some(next_blocks),
                }
            }

            Key::Backspace => {
                let Some((next_blocks, focus)) = ops::merge_on_backspace(blocks, id) else {
                    return Transition::unchanged(self);
                };
                let mut state = self.clone();
                state.pending_focus = Some(focus);
                Transition {
                    state: state.pruned(&next_blocks),
                    blocks: Some(next_blocks),
                }
            }

            Key::Slash if block.is_empty() => {
                let mut state = self.clone();
                state.active_menu = Some(id.clone());
                Transition::state_only(state)
            }

            // Shift+Enter and `/` in non-empty text are plain text input.
            Key::Enter { shift: true } | Key::Slash | Key::Escape => Transition::unchanged(self),
        }
    }

    fn close_menu(&self) -> Transition {
        if self.active_menu.is_none() {
            return Transition::unchanged(self);
        }
        let mut state = self.clone();
        state.active_menu = None;
        Transition::state_only(state)
    }

    /// Wrap an engine result. A declined op leaves the state untouched.
    fn mutated(&self, result: Cow<'_, [Block]>) -> Transition {
        match result {
            Cow::Borrowed(_) => Transition::unchanged(self),
            Cow::Owned(next_blocks) => Transition {
                state: self.clone().pruned(&next_blocks),
                blocks: Some(next_blocks),
            },
        }
    }

    /// Drop menu and disclosure entries naming blocks that are gone.
    ///
    /// `pending_focus` is left for [`Self::take_focus`] to validate.
    fn pruned(mut self, blocks: &[Block]) -> Self {
        if self
            .active_menu
            .as_ref()
            .is_some_and(|id| find(blocks, id).is_none())
        {
            self.active_menu = None;
        }
        self.expanded.retain(|id, _| find(blocks, id).is_some());
        self
    }
}

/// The block with `id` if it accepts text and key events.
fn editable<'a>(blocks: &'a [Block], id: &BlockId) -> Option<&'a Block> {
    find(blocks, id).filter(|b| b.kind.has_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str, key: Key) -> EditorEvent {
        EditorEvent::Key { id: id.into(), key }
    }

    fn enter(id: &str) -> EditorEvent {
        key(id, Key::Enter { shift: false })
    }

    #[test]
    fn test_initial_state_is_empty() {
        let state = InteractionState::new();
        assert!(state.active_menu.is_none());
        assert!(state.expanded.is_empty());
        assert!(state.pending_focus.is_none());
    }

    #[test]
    fn test_input_updates_content() {
        let blocks = vec![Block::paragraph("b1", "")];
        let t = InteractionState::new().handle(
            &blocks,
            &EditorEvent::Input { id: "b1".into(), text: "hi".into() },
        );
        assert_eq!(t.blocks.unwrap()[0].content, "hi");
    }

    #[test]
    fn test_input_keeps_menu_open() {
        let blocks = vec![Block::paragraph("b1", "")];
        let state = InteractionState {
            active_menu: Some("b1".into()),
            ..Default::default()
        };
        let t = state.handle(
            &blocks,
            &EditorEvent::Input { id: "b1".into(), text: "h".into() },
        );
        assert!(t.blocks.is_some());
        assert_eq!(t.state.active_menu, Some("b1".into()));
    }

    #[test]
    fn test_enter_splits_and_focuses_new_block() {
        let blocks = vec![Block::paragraph("b1", "")];
        let t = InteractionState::new().handle(&blocks, &enter("b1"));
        let next = t.blocks.unwrap();
        assert_eq!(next.len(), 2);
        assert_eq!(next[0].id.as_str(), "b1");
        assert_eq!(next[1].kind, BlockKind::Paragraph);
        assert_eq!(t.state.pending_focus.as_ref(), Some(&next[1].id));
    }

    #[test]
    fn test_enter_closes_menu() {
        let blocks = vec![Block::paragraph("b1", "x")];
        let state = InteractionState {
            active_menu: Some("b1".into()),
            ..Default::default()
        };
        let t = state.handle(&blocks, &enter("b1"));
        assert!(t.state.active_menu.is_none());
    }

    #[test]
    fn test_shift_enter_is_ignored() {
        let blocks = vec![Block::paragraph("b1", "x")];
        let state = InteractionState::new();
        let t = state.handle(&blocks, &key("b1", Key::Enter { shift: true }));
        assert!(t.blocks.is_none());
        assert_eq!(t.state, state);
    }

    #[test]
    fn test_backspace_on_nonempty_is_ignored() {
        let blocks = vec![Block::paragraph("b1", "a"), Block::paragraph("b2", "b")];
        let t = InteractionState::new().handle(&blocks, &key("b2", Key::Backspace));
        assert!(t.blocks.is_none());
        assert!(t.state.pending_focus.is_none());
    }

    #[test]
    fn test_slash_on_empty_opens_menu_closing_other() {
        let blocks = vec![Block::paragraph("b1", "x"), Block::paragraph("b2", "")];
        let state = InteractionState {
            active_menu: Some("b1".into()),
            ..Default::default()
        };
        let t = state.handle(&blocks, &key("b2", Key::Slash));
        assert_eq!(t.state.active_menu, Some("b2".into()));
        assert!(t.blocks.is_none());
    }

    #[test]
    fn test_slash_on_text_is_ignored() {
        let blocks = vec![Block::paragraph("b1", "x")];
        let t = InteractionState::new().handle(&blocks, &key("b1", Key::Slash));
        assert!(t.state.active_menu.is_none());
    }

    #[test]
    fn test_escape_and_click_outside_close_menu() {
        let blocks = vec![Block::paragraph("b1", "")];
        let state = InteractionState {
            active_menu: Some("b1".into()),
            ..Default::default()
        };
        assert!(state.handle(&blocks, &key("b1", Key::Escape)).state.active_menu.is_none());
        assert!(state.handle(&blocks, &EditorEvent::ClickOutside).state.active_menu.is_none());
    }

    #[test]
    fn test_menu_button_toggles() {
        let blocks = vec![Block::paragraph("b1", "x")];
        let menu = EditorEvent::MenuButton { id: "b1".into() };
        let open = InteractionState::new().handle(&blocks, &menu);
        assert_eq!(open.state.active_menu, Some("b1".into()));
        let closed = open.state.handle(&blocks, &menu);
        assert!(closed.state.active_menu.is_none());
    }

    #[test]
    fn test_select_kind_retypes_and_closes_menu() {
        let blocks = vec![Block::paragraph("b1", "abc")];
        let state = InteractionState {
            active_menu: Some("b1".into()),
            ..Default::default()
        };
        let t = state.handle(
            &blocks,
            &EditorEvent::SelectKind { id: "b1".into(), kind: BlockKind::Heading1 },
        );
        let next = t.blocks.unwrap();
        assert_eq!(next[0].kind, BlockKind::Heading1);
        assert_eq!(next[0].content, "abc");
        assert!(t.state.active_menu.is_none());
    }

    #[test]
    fn test_select_same_kind_still_closes_menu() {
        let blocks = vec![Block::paragraph("b1", "abc")];
        let state = InteractionState {
            active_menu: Some("b1".into()),
            ..Default::default()
        };
        let t = state.handle(
            &blocks,
            &EditorEvent::SelectKind { id: "b1".into(), kind: BlockKind::Paragraph },
        );
        assert!(t.blocks.is_none());
        assert!(t.state.active_menu.is_none());
    }

    #[test]
    fn test_select_kind_honors_clear_policy() {
        let blocks = vec![
            Block::new("t".into(), BlockKind::Toggle).with_children("hidden"),
        ];
        let t = InteractionState::new().handle_with(
            &blocks,
            &EditorEvent::SelectKind { id: "t".into(), kind: BlockKind::Bullet },
            ChildrenPolicy::Clear,
        );
        assert_eq!(t.blocks.unwrap()[0].children, None);
    }

    #[test]
    fn test_disclosure_flips_toggle_only() {
        let blocks = vec![
            Block::new("t".into(), BlockKind::Toggle),
            Block::paragraph("p", ""),
        ];
        let state = InteractionState::new();
        let opened = state.handle(&blocks, &EditorEvent::Disclosure { id: "t".into() });
        assert!(opened.state.is_expanded(&"t".into()));
        let closed = opened.state.handle(&blocks, &EditorEvent::Disclosure { id: "t".into() });
        assert!(!closed.state.is_expanded(&"t".into()));

        let ignored = state.handle(&blocks, &EditorEvent::Disclosure { id: "p".into() });
        assert_eq!(ignored.state, state);
    }

    #[test]
    fn test_children_input_only_on_toggle() {
        let blocks = vec![
            Block::new("t".into(), BlockKind::Toggle),
            Block::paragraph("p", ""),
        ];
        let state = InteractionState::new();
        let body = |id: &str| EditorEvent::ChildrenInput {
            id: id.into(),
            text: "body".into(),
        };
        let t = state.handle(&blocks, &body("t"));
        assert_eq!(t.blocks.unwrap()[0].children.as_deref(), Some("body"));

        let p = state.handle(&blocks, &body("p"));
        assert!(p.blocks.is_none());
    }

    #[test]
    fn test_divider_ignores_text_and_keys() {
        let blocks = vec![
            Block::paragraph("b1", "a"),
            Block::new("d".into(), BlockKind::Divider),
        ];
        let state = InteractionState::new();
        let input = EditorEvent::Input { id: "d".into(), text: "x".into() };
        assert!(state.handle(&blocks, &input).blocks.is_none());
        assert!(state.handle(&blocks, &enter("d")).blocks.is_none());
        assert!(state.handle(&blocks, &key("d", Key::Backspace)).blocks.is_none());
        assert!(state.handle(&blocks, &key("d", Key::Slash)).state.active_menu.is_none());
    }

    #[test]
    fn test_divider_has_no_menu_and_keeps_its_kind() {
        let blocks = vec![
            Block::paragraph("b1", "a"),
            Block::new("d".into(), BlockKind::Divider),
        ];
        let state = InteractionState::new();

        let menu = state.handle(&blocks, &EditorEvent::MenuButton { id: "d".into() });
        assert!(menu.state.active_menu.is_none());
        assert_eq!(menu.state, state);

        let retype = state.handle(
            &blocks,
            &EditorEvent::SelectKind { id: "d".into(), kind: BlockKind::Heading1 },
        );
        assert!(retype.blocks.is_none());
        assert_eq!(retype.state, state);
    }

    #[test]
    fn test_delete_button_removes_divider() {
        let blocks = vec![
            Block::paragraph("b1", "a"),
            Block::new("d".into(), BlockKind::Divider),
        ];
        let state = InteractionState {
            active_menu: Some("d".into()),
            pending_focus: Some("b1".into()),
            ..Default::default()
        };
        let t = state.handle(&blocks, &EditorEvent::DeleteButton { id: "d".into() });
        assert_eq!(t.blocks.unwrap().len(), 1);
        assert!(t.state.active_menu.is_none());
        assert_eq!(t.state.pending_focus, Some("b1".into()));
    }

    #[test]
    fn test_add_block_appends_and_focuses() {
        let blocks = vec![Block::paragraph("b1", "a")];
        let t = InteractionState::new().handle(&blocks, &EditorEvent::AddBlock);
        let next = t.blocks.unwrap();
        assert_eq!(next.len(), 2);
        assert_eq!(t.state.pending_focus.as_ref(), Some(&next[1].id));
    }

    #[test]
    fn test_missing_block_events_are_ignored() {
        let blocks = vec![Block::paragraph("b1", "a")];
        let state = InteractionState::new();
        for event in [
            EditorEvent::Input { id: "x".into(), text: "t".into() },
            enter("x"),
            EditorEvent::MenuButton { id: "x".into() },
            EditorEvent::SelectKind { id: "x".into(), kind: BlockKind::Callout },
            EditorEvent::DeleteButton { id: "x".into() },
        ] {
            let t = state.handle(&blocks, &event);
            assert!(t.blocks.is_none(), "{event:?}");
            assert_eq!(t.state, state, "{event:?}");
        }
    }

    #[test]
    fn test_prune_drops_state_for_deleted_blocks() {
        let blocks = vec![
            Block::paragraph("b1", "a"),
            Block::new("t".into(), BlockKind::Toggle),
        ];
        let mut expanded = HashMap::new();
        expanded.insert(BlockId::from("t"), true);
        let state = InteractionState {
            active_menu: Some("t".into()),
            expanded,
            pending_focus: None,
        };
        let t = state.handle(&blocks, &EditorEvent::DeleteButton { id: "t".into() });
        assert!(t.state.expanded.is_empty());
        assert!(t.state.active_menu.is_none());
    }

    #[test]
    fn test_take_focus_is_one_shot_and_drops_stale() {
        let blocks = vec![Block::paragraph("b1", "")];
        let mut state = InteractionState {
            pending_focus: Some("b1".into()),
            ..Default::default()
        };
        assert_eq!(state.take_focus(&blocks), Some("b1".into()));
        assert_eq!(state.take_focus(&blocks), None);

        state.pending_focus = Some("gone".into());
        assert_eq!(state.take_focus(&blocks), None);
        assert!(state.pending_focus.is_none());
    }
}
