//! Folio command-line front end.
//!
//! Usage:
//!   folio new --title "Groceries"
//!   folio new --title "Standup" --tag work --tag daily
//!   folio new --journal --mood tough --date 2024-03-05
//!   folio list --kind journal
//!   folio show 0191c3a2
//!   folio edit 0191c3a2 < edits.txt
//!   folio delete 0191c3a2
//!
//! Documents are addressed by full id or any unique prefix of it.

mod commands;
mod config;
mod render;
mod script;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use folio_store::{DocumentStore, MemoryStore, SqliteStore};
use folio_types::{DocumentKind, Mood};

use crate::commands::NewOptions;
use crate::config::Config;

/// Block notes and journal with autosave.
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Block-based notes and journal with debounced autosave")]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/folio/config.ron)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database, overriding the config
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Use an ephemeral in-memory store
    #[arg(long, global = true, conflicts_with = "database")]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a note (or journal entry) and print its id
    ///
    /// A journal entry for a day that already has one prints the existing id.
    New {
        /// Create a journal entry instead of a note
        #[arg(long)]
        journal: bool,
        #[arg(long, default_value = "")]
        title: String,
        /// Note tag (repeatable)
        #[arg(long = "tag", conflicts_with = "journal")]
        tags: Vec<String>,
        /// Journal mood (amazing, good, okay, tough, bad)
        #[arg(long, requires = "journal")]
        mood: Option<Mood>,
        /// Journal day as YYYY-MM-DD (default: today)
        #[arg(long, requires = "journal")]
        date: Option<NaiveDate>,
    },
    /// List documents, newest first (journal entries by day)
    List {
        /// Only this kind (note or journal)
        #[arg(long)]
        kind: Option<DocumentKind>,
    },
    /// Print a document
    Show { id: String },
    /// Delete a document
    Delete { id: String },
    /// Apply an editing script (stdin by default) with autosave
    Edit {
        id: String,
        /// Read the script from this file instead of stdin
        #[arg(long)]
        script: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

fn init_tracing(config: &Config) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.log_filter.as_deref().unwrap_or("info"))
            .context("invalid log_filter in config")?,
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn open_store(args: &Args, config: &Config) -> Result<Arc<dyn DocumentStore>> {
    if args.memory {
        tracing::info!("using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let path = match &args.database {
        Some(path) => path.clone(),
        None => config.database_path()?,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(Arc::new(SqliteStore::open(&path)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    init_tracing(&config)?;

    if let Command::Config = args.command {
        print!("{}", config.to_ron()?);
        return Ok(());
    }

    let mut out = std::io::stdout().lock();
    let store = open_store(&args, &config)?;

    match &args.command {
        Command::New {
            journal,
            title,
            tags,
            mood,
            date,
        } => {
            let options = NewOptions {
                journal: *journal,
                title: title.clone(),
                tags: tags.clone(),
                mood: *mood,
                date: *date,
            };
            commands::new_document(store.as_ref(), options, &mut out).await?;
        }
        Command::List { kind } => commands::list(store.as_ref(), *kind, &mut out).await?,
        Command::Show { id } => commands::show(store.as_ref(), id, &mut out).await?,
        Command::Delete { id } => commands::delete(store.as_ref(), id, &mut out).await?,
        Command::Edit { id, script } => {
            let text = match script {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    text
                }
            };
            commands::edit(store, id, config.session_config(), &text, &mut out).await?;
        }
        Command::Config => {}
    }

    Ok(())
}
