//! Line-oriented editing scripts for `folio edit`.
//!
//! One command per line; blocks are addressed by 1-based position in the
//! document as it stands when the line runs. Blank lines and `#` comments
//! are skipped.
//!
//! ```text
//! type 1 Groceries          set block 1's text
//! enter 1                   Enter in block 1 (new paragraph after it)
//! type 2 milk
//! slash 2                   open the palette on an empty block
//! kind 2 bullet             pick a kind from the palette
//! body 3 hidden text        set a toggle's body
//! toggle 3                  open/close a toggle
//! backspace 2               Backspace in block 2
//! delete 4                  the block's delete button
//! add                       add a block at the end
//! title Shopping            rename the document
//! wait 800                  pause (milliseconds)
//! flush                     save now
//! show                      print the document
//! ```

use std::time::Duration;

use folio_editor::{EditorEvent, Key};
use folio_types::{Block, BlockId, BlockKind};

/// A parse failure, with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

/// What a script line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// An editor event aimed at a block position.
    Block { position: usize, action: BlockAction },
    AddBlock,
    ClickOutside,
    Title(String),
    Wait(Duration),
    Flush,
    Show,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockAction {
    Type(String),
    Body(String),
    Key(Key),
    Kind(BlockKind),
    Toggle,
    Menu,
    Delete,
}

impl BlockAction {
    /// The editor event for this action on `id`.
    pub fn event(&self, id: BlockId) -> EditorEvent {
        match self {
            BlockAction::Type(text) => EditorEvent::Input {
                id,
                text: text.clone(),
            },
            BlockAction::Body(text) => EditorEvent::ChildrenInput {
                id,
                text: text.clone(),
            },
            BlockAction::Key(key) => EditorEvent::Key { id, key: *key },
            BlockAction::Kind(kind) => EditorEvent::SelectKind { id, kind: *kind },
            BlockAction::Toggle => EditorEvent::Disclosure { id },
            BlockAction::Menu => EditorEvent::MenuButton { id },
            BlockAction::Delete => EditorEvent::DeleteButton { id },
        }
    }
}

/// A parsed command and the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub command: Command,
}

/// Resolve a 1-based position to a block id.
pub fn block_at(blocks: &[Block], position: usize) -> Option<BlockId> {
    position
        .checked_sub(1)
        .and_then(|i| blocks.get(i))
        .map(|b| b.id.clone())
}

/// Parse a whole script. Stops at the first bad line.
pub fn parse(text: &str) -> Result<Vec<Line>, ScriptError> {
    text.lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let number = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            Some(parse_line(line).map(|command| Line { number, command }).map_err(|message| {
                ScriptError {
                    line: number,
                    message,
                }
            }))
        })
        .collect()
}

fn parse_line(line: &str) -> Result<Command, String> {
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim_start();

    let block = |action: fn(&str) -> Result<BlockAction, String>| -> Result<Command, String> {
        let (pos, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let position = pos
            .parse::<usize>()
            .map_err(|_| format!("expected a block position, got {pos:?}"))?;
        Ok(Command::Block {
            position,
            action: action(arg.trim_start())?,
        })
    };

    match verb.to_ascii_lowercase().as_str() {
        "type" => block(|text| Ok(BlockAction::Type(text.to_string()))),
        "body" => block(|text| Ok(BlockAction::Body(text.to_string()))),
        "enter" => block(|_| Ok(BlockAction::Key(Key::Enter { shift: false }))),
        "backspace" => block(|_| Ok(BlockAction::Key(Key::Backspace))),
        "slash" => block(|_| Ok(BlockAction::Key(Key::Slash))),
        "escape" => block(|_| Ok(BlockAction::Key(Key::Escape))),
        "kind" => block(|name| {
            BlockKind::from_str(name)
                .map(BlockAction::Kind)
                .ok_or_else(|| format!("unknown block kind {name:?}"))
        }),
        "toggle" => block(|_| Ok(BlockAction::Toggle)),
        "menu" => block(|_| Ok(BlockAction::Menu)),
        "delete" => block(|_| Ok(BlockAction::Delete)),
        "add" => Ok(Command::AddBlock),
        "outside" => Ok(Command::ClickOutside),
        "title" => Ok(Command::Title(rest.to_string())),
        "wait" => rest
            .parse::<u64>()
            .map(|ms| Command::Wait(Duration::from_millis(ms)))
            .map_err(|_| format!("expected milliseconds, got {rest:?}")),
        "flush" => Ok(Command::Flush),
        "show" => Ok(Command::Show),
        other => Err(format!("unknown command {other:?}")),
    }
}
