//! Block editing core for Folio.
//!
//! Three layers, each usable on its own:
//!
//! - [`ops`]: pure structural operations over `&[Block]` (insert, delete,
//!   update, retype, split, merge). Declined operations hand back the input.
//! - [`interaction`]: the per-session UI state machine that routes keyboard
//!   and pointer events to those operations.
//! - [`editor`]: the host object a view holds, which applies transitions and
//!   reports whether autosave needs to hear about them.
//!
//! # Sequence Invariants
//!
//! After any sequence of operations:
//! - there is at least one block;
//! - block ids are pairwise distinct;
//! - the sequence is flat (toggle bodies are text, not nested blocks).
//!
//! Nothing here does I/O or holds locks. The engine and state machine are
//! total: there is no error type, only declined operations.

pub mod editor;
pub mod interaction;
pub mod ops;

pub use editor::{BlockView, EditEffect, Editor, EditorConfig, PaletteEntry, palette};
pub use interaction::{EditorEvent, InteractionState, Key, Transition};
pub use ops::ChildrenPolicy;
