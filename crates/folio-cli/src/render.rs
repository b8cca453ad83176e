//! Plain-text rendering of documents and editor rows.

use std::fmt::Write as _;

use folio_editor::{BlockView, PaletteEntry};
use folio_sync::{SaveState, SaveStatus};
use chrono::NaiveDate;

use folio_types::{Block, BlockKind, Document, DocumentKind, DocumentSummary, Mood};

/// Render one block the way `folio show` prints it.
fn block_text(block: &Block, expanded: bool, out: &mut String) {
    let content = block.content.as_str();
    match block.kind {
        BlockKind::Paragraph => out.push_str(content),
        BlockKind::Heading1 => {
            let _ = write!(out, "# {content}");
        }
        BlockKind::Heading2 => {
            let _ = write!(out, "## {content}");
        }
        BlockKind::Heading3 => {
            let _ = write!(out, "### {content}");
        }
        BlockKind::Bullet => {
            let _ = write!(out, "• {content}");
        }
        BlockKind::Toggle => {
            let marker = if expanded { '▾' } else { '▸' };
            let _ = write!(out, "{marker} {content}");
            if expanded {
                for line in block.children_text().lines() {
                    let _ = write!(out, "\n    {line}");
                }
            }
        }
        BlockKind::Divider => out.push_str("────────"),
        BlockKind::Callout => {
            let _ = write!(out, "💡 {content}");
        }
    }
}

fn mood_emoji(mood: Option<Mood>) -> &'static str {
    mood.map_or(Mood::NO_MOOD_EMOJI, |m| m.emoji())
}

/// The first `limit` tags as `#tag`.
fn hashtags(tags: &[String], limit: usize) -> String {
    tags.iter()
        .take(limit)
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Full document: header, then every block (toggles shown open).
pub fn document(doc: &Document) -> String {
    let mut out = String::new();
    let title = if doc.title.is_empty() { "(untitled)" } else { doc.title.as_str() };
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{} {} · updated {}", doc.kind, doc.id, doc.updated_at);
    if let Some(date) = doc.date {
        let _ = write!(out, "{}", long_date(date));
        if let Some(mood) = doc.mood {
            let _ = write!(out, " · Feeling {mood} {}", mood.emoji());
        }
        out.push('\n');
    }
    if !doc.tags.is_empty() {
        let _ = writeln!(out, "tags: {}", hashtags(&doc.tags, doc.tags.len()));
    }
    out.push('\n');
    for block in &doc.blocks {
        block_text(block, true, &mut out);
        out.push('\n');
    }
    out
}

/// One `folio list` row.
pub fn summary(s: &DocumentSummary) -> String {
    let title = if s.title.is_empty() { "(untitled)" } else { s.title.as_str() };
    let mut row = format!(
        "{}  {:<7}  {:>3} blocks  {}",
        s.id.short(),
        s.kind.as_str(),
        s.block_count,
        title
    );
    match s.kind {
        DocumentKind::Journal => {
            if let Some(date) = s.date {
                let _ = write!(row, "  {date}");
            }
            let _ = write!(row, " {}", mood_emoji(s.mood));
        }
        DocumentKind::Note if !s.tags.is_empty() => {
            let _ = write!(row, "  {}", hashtags(&s.tags, 2));
        }
        DocumentKind::Note => {}
    }
    row
}

/// Numbered editor rows with placeholders and UI state, for `show` in scripts.
pub fn rows(rows: &[BlockView<'_>], palette: &[PaletteEntry]) -> String {
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        let mut line = String::new();
        match row.placeholder {
            Some(placeholder) => {
                let _ = write!(line, "[{placeholder}]");
            }
            None => block_text(row.block, row.expanded, &mut line),
        }
        if row.expanded {
            if let Some(placeholder) = row.children_placeholder {
                let _ = write!(line, "\n    [{placeholder}]");
            }
        }
        let marker = if row.menu_open { '*' } else { ' ' };
        let body = line.replace('\n', "\n                  ");
        let _ = writeln!(out, "{:>3}{marker} {:<11} │ {body}", i + 1, row.label);

        if row.menu_open {
            for entry in palette {
                let _ = writeln!(out, "                  / {}", entry.label);
            }
        }
    }
    out
}

/// Save indicator line.
pub fn status(state: &SaveState) -> String {
    let word = match state.status {
        SaveStatus::Saved if state.pending => "unsaved changes",
        SaveStatus::Saved => "saved",
        SaveStatus::Saving => "saving…",
        SaveStatus::Error => "save failed",
    };
    match (&state.last_error, state.last_saved_at) {
        (Some(err), _) if state.status == SaveStatus::Error => format!("{word}: {err}"),
        (_, Some(at)) => format!("{word} (last saved {at})"),
        _ => word.to_string(),
    }
}
