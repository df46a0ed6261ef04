//! Catalog listing and rendering

use crate::error::{CatalogError, Result};
use crate::id128::Id128;
use crate::reader::CatalogView;
use serde::Serialize;
use std::io::{self, Write};
use tracing::{error, info};

/// One catalog entry selected for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry<'a> {
    pub id: Id128,
    /// Matched language tag; empty for the default entry
    pub language: String,
    pub text: &'a str,
}

/// Output style for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFormat {
    /// `-- <id>` line followed by the full text
    #[default]
    Full,
    /// `<id> <Defined-By>: <Subject>`
    Oneline,
}

/// One entry per id, in id order
///
/// Items are sorted with the default language first, so the first item of
/// each id is its default entry when there is one. The listing is not
/// locale-aware.
pub fn list_all<'a>(view: &CatalogView<'a>) -> Result<Vec<CatalogEntry<'a>>> {
    let mut entries = Vec::new();
    let mut last_id: Option<Id128> = None;

    for item in view.items() {
        if last_id == Some(item.key.id) {
            continue;
        }
        last_id = Some(item.key.id);

        entries.push(CatalogEntry {
            id: item.key.id,
            language: item.key.language.as_str().into_owned(),
            text: view.text(&item)?,
        });
    }

    Ok(entries)
}

/// Per-id results of [`list_by_ids`]
#[derive(Debug)]
pub struct BatchListing<'a> {
    /// Requested id string and its outcome, in request order
    pub results: Vec<(String, Result<CatalogEntry<'a>>)>,
}

impl<'a> BatchListing<'a> {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }

    /// Entries that resolved, in request order
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry<'a>> {
        self.results.iter().filter_map(|(_, r)| r.as_ref().ok())
    }
}

/// Locale-aware lookup of each requested id
///
/// Invalid and missing ids are reported individually; the batch always runs
/// to the end.
pub fn list_by_ids<'a, S: AsRef<str>>(
    view: &CatalogView<'a>,
    ids: &[S],
    locale: Option<&str>,
) -> BatchListing<'a> {
    let results = ids
        .iter()
        .map(|requested| {
            let requested = requested.as_ref();
            let result = Id128::parse(requested).and_then(|id| {
                view.resolve(id, locale).map(|(language, text)| CatalogEntry {
                    id,
                    language: language.as_str().into_owned(),
                    text,
                })
            });

            match &result {
                Err(e) if e.is_not_found() => {
                    info!("Failed to retrieve catalog entry for '{}': {}", requested, e)
                }
                Err(CatalogError::InvalidId(_)) => {
                    error!("Failed to parse id128 '{}'", requested)
                }
                Err(e) => error!("Failed to retrieve catalog entry for '{}': {}", requested, e),
                Ok(_) => {}
            }

            (requested.to_string(), result)
        })
        .collect();

    BatchListing { results }
}

/// Value of header `name` (e.g. `"Subject:"`) in the leading header run
pub fn find_header<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    for line in text.split_inclusive('\n') {
        if line == "\n" {
            break;
        }

        if let Some(value) = line.strip_prefix(name) {
            let value = value.trim_start_matches([' ', '\t']);
            let end = value.find(['\n', '\r']).unwrap_or(value.len());
            return Some(&value[..end]);
        }

        if !line.ends_with('\n') {
            break;
        }
    }
    None
}

/// Write one entry in the requested style
pub fn render_entry<W: Write>(out: &mut W, id: Id128, text: &str, format: ListFormat) -> io::Result<()> {
    match format {
        ListFormat::Oneline => writeln!(
            out,
            "{} {}: {}",
            id,
            find_header(text, "Defined-By:").unwrap_or("n/a"),
            find_header(text, "Subject:").unwrap_or("n/a")
        ),
        ListFormat::Full => writeln!(out, "-- {}\n{}", id, text),
    }
}

/// Render a sequence of entries
pub fn render_entries<'e, 'a: 'e, W, I>(out: &mut W, entries: I, format: ListFormat) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'e CatalogEntry<'a>>,
{
    for entry in entries {
        render_entry(out, entry.id, entry.text, format)?;
    }
    Ok(())
}
