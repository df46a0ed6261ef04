//! # journal-catalog - Locale-Aware Message Catalog
//!
//! `journal-catalog` compiles message catalog sources into a compact binary
//! database and answers lookups from it:
//!
//! - **Compiler**: merges many `*.catalog` text files into one sorted,
//!   deduplicated database, published with an atomic rename
//! - **Reader**: memory-maps the database and resolves a 128-bit message id
//!   to text, falling back from `lang_TERRITORY` to `lang` to the default
//! - **Listing**: one-entry-per-id dumps and one-line summaries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use journal_catalog::{Catalog, CatalogBuilder, Id128, Result};
//! use std::path::Path;
//!
//! # fn main() -> Result<()> {
//! let mut builder = CatalogBuilder::new();
//! builder.import_file(Path::new("/usr/lib/systemd/catalog/systemd.catalog"))?;
//! let report = builder.write(Path::new("/var/lib/systemd/catalog/database"))?;
//! println!("wrote {} items", report.items);
//!
//! let catalog = Catalog::open("/var/lib/systemd/catalog/database")?;
//! let id: Id128 = "fc2e22bc6ee647b6b90729ab34a250b1".parse()?;
//! println!("{}", catalog.lookup(id, Some("de_DE.UTF-8"))?);
//! # Ok(())
//! # }
//! ```

pub mod core;

// Re-export core modules internally so crate:: paths in core still work
#[allow(unused_imports)]
pub(crate) use self::core::{
    builder, config, error, header, id128, item, listing, locale, merge, parser, reader, sources,
    strbuf,
};

pub use crate::core::{
    builder::{update_catalog, BuildReport, CatalogBuilder, CatalogImage},
    config::CatalogConfig,
    error::{CatalogError, CorruptKind, ParseErrorKind, Result},
    id128::Id128,
    item::{CatalogItem, CatalogKey, Language},
    listing::{find_header, list_all, list_by_ids, render_entry, CatalogEntry, ListFormat},
    locale::{candidate_languages, locale_from_env},
    merge::MergeStore,
    reader::{catalog_get, Catalog, CatalogView},
    sources::discover_sources,
};

use std::path::Path;
use tracing::{debug, info};

/// Rebuild the database described by `config`
///
/// Discovers sources in the configured directories (highest priority first),
/// merges them, and publishes the database. An empty source set writes
/// nothing and reports zero items.
pub fn update_from_config(config: &CatalogConfig) -> Result<BuildReport> {
    let root = config.root.as_deref();
    let sources = discover_sources(root, &config.directories)?;
    debug!("Found {} catalog source files", sources.len());

    let mut builder = CatalogBuilder::new();
    if let Some(staging) = config.staging_path() {
        builder = builder.staging_dir(staging);
    }
    builder.import_files(&sources)?;

    let database = config.database_path();
    let report = builder.write(&database)?;
    if report.items > 0 {
        info!(
            "{}: {} items, {} bytes",
            database.display(),
            report.items,
            report.total_size
        );
    }
    Ok(report)
}

/// Open the database at `path`, treating a missing file as "no catalog"
pub fn open_optional(path: &Path) -> Result<Option<Catalog>> {
    match Catalog::open(path) {
        Ok(catalog) => Ok(Some(catalog)),
        Err(CatalogError::DatabaseNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
