//! Merge store: one payload per (id, language)
//!
//! Catalog directories may carry several entries for the same key, e.g. a
//! vendor file and a local override. Later entries are combined into the
//! stored one instead of replacing it outright.

use crate::id128::Id128;
use crate::item::{CatalogKey, Language};
use crate::parser::Entry;
use std::collections::btree_map::{self, BTreeMap};

/// Split a payload into its leading header lines and the remaining body
///
/// The header run ends before the first empty line, or before a final line
/// that lacks a newline. The split point belongs to the body, so a body
/// normally starts with the separating `\n`.
pub fn split_headers(payload: &str) -> (&str, &str) {
    let mut pos = 0;
    while let Some(nl) = payload[pos..].find('\n') {
        if nl == 0 {
            break;
        }
        pos += nl + 1;
    }
    payload.split_at(pos)
}

/// Combine a newly parsed payload with the one already stored
///
/// Headers of `new` come first, then headers of `existing`; same-named
/// headers are kept twice. The body of `new` wins unless it is empty.
pub fn combine_entries(new: &str, existing: &str) -> String {
    let (new_headers, new_body) = split_headers(new);
    let (old_headers, old_body) = split_headers(existing);

    let body = if new_body.is_empty() { old_body } else { new_body };

    let mut combined =
        String::with_capacity(new_headers.len() + old_headers.len() + body.len());
    combined.push_str(new_headers);
    combined.push_str(old_headers);
    combined.push_str(body);
    combined
}

/// Deduplicating store of parsed entries, ordered by catalog key
#[derive(Debug, Default)]
pub struct MergeStore {
    entries: BTreeMap<CatalogKey, String>,
}

impl MergeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a payload, combining with any payload stored under the same key
    pub fn put(&mut self, id: Id128, language: Language, payload: String) {
        match self.entries.entry(CatalogKey::new(id, language)) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(payload);
            }
            btree_map::Entry::Occupied(mut slot) => {
                let combined = combine_entries(&payload, slot.get());
                slot.insert(combined);
            }
        }
    }

    pub fn put_entry(&mut self, entry: Entry) {
        self.put(entry.id, entry.language, entry.payload);
    }

    pub fn get(&self, id: Id128, language: Language) -> Option<&str> {
        self.entries
            .get(&CatalogKey::new(id, language))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in catalog key order
    pub fn iter(&self) -> impl Iterator<Item = (&CatalogKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }
}

impl Extend<Entry> for MergeStore {
    fn extend<I: IntoIterator<Item = Entry>>(&mut self, iter: I) {
        for entry in iter {
            self.put_entry(entry);
        }
    }
}
