//! journal-catalog
//!
//! Rebuild and query the message catalog database

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use journal_catalog::{
    list_all, list_by_ids, locale_from_env, open_optional, render_entry, update_from_config,
    CatalogConfig, Id128, Language, ListFormat,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "journal-catalog")]
#[command(about = "Build and query the message catalog database")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Operate on catalogs and database under an alternate root
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Database path (overrides the configuration)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the database from catalog source directories
    Update {
        /// Source directories, highest priority first (overrides the configuration)
        dirs: Vec<PathBuf>,
    },

    /// List catalog entries, all of them or the given ids
    List {
        /// Print one line per entry
        #[arg(long)]
        oneline: bool,

        /// Print entries as JSON
        #[arg(long, conflicts_with = "oneline")]
        json: bool,

        /// Message ids to show
        ids: Vec<String>,
    },

    /// Print full catalog entries, all of them or the given ids
    Dump {
        /// Message ids to show
        ids: Vec<String>,
    },

    /// Print the text for one id
    Show {
        /// Message id
        id: String,

        /// Exact language tag instead of locale fallback ("" for the default entry)
        #[arg(long)]
        language: Option<String>,
    },
}

fn load_config(args: &Args) -> anyhow::Result<CatalogConfig> {
    let mut config = match &args.config {
        Some(path) => CatalogConfig::load(path)?,
        None => CatalogConfig::default(),
    };

    if let Some(root) = &args.root {
        config.root = Some(root.clone());
    }
    if let Some(database) = &args.database {
        config.database = database.clone();
    }
    Ok(config)
}

/// Print entries; returns false when any requested id failed
fn list(
    config: &CatalogConfig,
    ids: &[String],
    format: ListFormat,
    json: bool,
) -> anyhow::Result<bool> {
    let database = config.database_path();
    let catalog = match open_optional(&database)? {
        Some(catalog) => catalog,
        None => {
            info!("No catalog database at {}", database.display());
            return Ok(ids.is_empty());
        }
    };
    let view = catalog.view();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if ids.is_empty() {
        let entries = list_all(&view)?;
        if json {
            serde_json::to_writer_pretty(&mut out, &entries)?;
            writeln!(out)?;
        } else {
            for entry in &entries {
                render_entry(&mut out, entry.id, entry.text, format)?;
            }
        }
        return Ok(true);
    }

    let locale = locale_from_env();
    let listing = list_by_ids(&view, ids, locale.as_deref());

    if json {
        let entries: Vec<_> = listing.entries().collect();
        serde_json::to_writer_pretty(&mut out, &entries)?;
        writeln!(out)?;
    } else {
        for entry in listing.entries() {
            render_entry(&mut out, entry.id, entry.text, format)?;
        }
    }

    Ok(listing.is_success())
}

fn show(config: &CatalogConfig, id: &str, language: Option<&str>) -> anyhow::Result<()> {
    let id: Id128 = id.parse()?;
    let database = config.database_path();
    let catalog = match open_optional(&database)? {
        Some(catalog) => catalog,
        None => bail!("No catalog database at {}", database.display()),
    };

    let text = match language {
        Some(tag) => {
            let language = Language::new(tag).with_context(|| format!("invalid language '{}'", tag))?;
            catalog.lookup_language(id, language)?
        }
        None => catalog.lookup(id, locale_from_env().as_deref())?,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "{}", text)?;
    Ok(())
}

fn run(args: Args) -> anyhow::Result<bool> {
    let mut config = load_config(&args)?;

    match args.command {
        Command::Update { dirs } => {
            if !dirs.is_empty() {
                config.directories = dirs;
            }
            let report = update_from_config(&config)
                .with_context(|| format!("Failed to update {}", config.database_path().display()))?;
            info!(
                "Catalog has {} items ({} bytes of strings)",
                report.items, report.string_bytes
            );
            Ok(true)
        }
        Command::List { oneline, json, ids } => {
            let format = if oneline {
                ListFormat::Oneline
            } else {
                ListFormat::Full
            };
            list(&config, &ids, format, json)
        }
        Command::Dump { ids } => list(&config, &ids, ListFormat::Full, false),
        Command::Show { id, language } => {
            show(&config, &id, language.as_deref())?;
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
