//! Catalog source file parser
//!
//! Source files hold blank-line separated entries:
//!
//! ```text
//! # comment
//! -- fc2e22bc6ee647b6b90729ab34a250b1
//! Subject: Process dumped core
//! Defined-By: systemd
//!
//! Free-form explanation follows the blank line.
//!
//! -- fc2e22bc6ee647b6b90729ab34a250b1 de
//! Subject: Speicherabbild erzeugt
//! ```
//!
//! A file named `name.<lang>.catalog` has `<lang>` as its default language.

use crate::error::{CatalogError, ParseErrorKind, Result};
use crate::id128::Id128;
use crate::item::{Language, LANGUAGE_MAX};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

pub const CATALOG_SUFFIX: &str = ".catalog";

const COMMENTS: &[u8] = b"#;";

/// `-- ` + 32 hex digits
const ID_LINE_LEN: usize = 3 + 32;

/// One parsed entry, before merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: Id128,
    pub language: Language,
    pub payload: String,
}

/// Default language encoded in a catalog file name
///
/// `foo.de_DE.catalog` yields `de_DE`; `foo.catalog` yields nothing. The
/// segment must be 1-31 bytes and must not contain `.` or `/`.
pub fn file_language(filename: &str) -> Option<String> {
    let stem = filename.strip_suffix(CATALOG_SUFFIX)?;
    let bytes = stem.as_bytes();
    let end = bytes.len();

    let mut beg = end.checked_sub(1)?;
    while beg > 0 && !matches!(bytes[beg], b'.' | b'/') && end - beg < LANGUAGE_MAX + 1 {
        beg -= 1;
    }

    if bytes[beg] != b'.' || end <= beg + 1 {
        return None;
    }

    stem.get(beg + 1..end).map(str::to_string)
}

/// Parser state for one source file
struct EntryParser<'a> {
    path: &'a Path,
    default_language: Option<String>,
    entries: Vec<Entry>,
    current: Option<(Id128, Language)>,
    payload: String,
}

impl<'a> EntryParser<'a> {
    fn new(path: &'a Path) -> Self {
        let default_language = file_language(&path.to_string_lossy());
        if let Some(lang) = &default_language {
            debug!("File {} has language {}.", path.display(), lang);
        }

        EntryParser {
            path,
            default_language,
            entries: Vec::new(),
            current: None,
            payload: String::new(),
        }
    }

    fn error(&self, line: usize, kind: ParseErrorKind) -> CatalogError {
        CatalogError::Parse {
            path: self.path.to_path_buf(),
            line,
            kind,
        }
    }

    fn default_language(&self) -> Language {
        self.default_language
            .as_deref()
            .map(Language::truncated)
            .unwrap_or_default()
    }

    /// Resolve an explicit per-entry tag against the file default
    fn entry_language(&self, line: usize, tag: &str) -> Result<Option<Language>> {
        if tag.is_empty() {
            return Err(self.error(line, ParseErrorKind::LanguageTooShort));
        }
        if tag.len() > LANGUAGE_MAX {
            return Err(self.error(line, ParseErrorKind::LanguageTooLong));
        }

        if let Some(default) = &self.default_language {
            if tag == default {
                warn!(
                    "[{}:{}] language specified unnecessarily",
                    self.path.display(),
                    line
                );
                return Ok(None);
            }
            warn!(
                "[{}:{}] language differs from default for file",
                self.path.display(),
                line
            );
        }

        Ok(Language::new(tag))
    }

    fn finish_entry(&mut self, line: usize) -> Result<()> {
        if let Some((id, language)) = self.current.take() {
            if self.payload.is_empty() {
                return Err(self.error(line, ParseErrorKind::NoPayload));
            }
            self.entries.push(Entry {
                id,
                language,
                payload: std::mem::take(&mut self.payload),
            });
        }
        Ok(())
    }

    /// Recognize `-- <id>[ <lang>]`; anything else is payload
    fn entry_header(line: &str) -> Option<(Id128, Option<&str>)> {
        let bytes = line.as_bytes();
        if bytes.len() < ID_LINE_LEN || !line.starts_with("-- ") {
            return None;
        }

        let tag = match bytes.get(ID_LINE_LEN) {
            None => None,
            Some(b' ') => Some(line[ID_LINE_LEN + 1..].trim()),
            Some(_) => return None,
        };

        let id = std::str::from_utf8(&bytes[3..ID_LINE_LEN]).ok()?;
        let id = Id128::parse(id).ok()?;

        Some((id, tag))
    }

    fn parse<R: BufRead>(mut self, reader: R) -> Result<Vec<Entry>> {
        let mut empty_line = true;
        let mut n = 0;

        for line in reader.lines() {
            let line = line.map_err(|e| CatalogError::io(self.path, e))?;
            n += 1;

            if line.is_empty() {
                empty_line = true;
                continue;
            }

            if COMMENTS.contains(&line.as_bytes()[0]) {
                continue;
            }

            if empty_line {
                if let Some((id, tag)) = Self::entry_header(&line) {
                    self.finish_entry(n)?;

                    let language = match tag {
                        Some(tag) => self.entry_language(n, tag)?,
                        None => None,
                    }
                    .unwrap_or_else(|| self.default_language());

                    self.current = Some((id, language));
                    empty_line = false;
                    continue;
                }
            }

            if self.current.is_none() {
                return Err(self.error(n, ParseErrorKind::PayloadBeforeId));
            }

            if empty_line {
                self.payload.push('\n');
            }
            self.payload.push_str(&line);
            self.payload.push('\n');

            empty_line = false;
        }

        self.finish_entry(n)?;

        Ok(self.entries)
    }
}

/// Parse catalog text read from `reader`; `path` names the source in errors
/// and supplies the default language
pub fn parse_entries<R: BufRead>(reader: R, path: &Path) -> Result<Vec<Entry>> {
    EntryParser::new(path).parse(reader)
}

/// Parse one catalog source file from disk
pub fn parse_file(path: &Path) -> Result<Vec<Entry>> {
    let file = File::open(path).map_err(|e| CatalogError::io(path, e))?;
    parse_entries(BufReader::new(file), path)
}
