//! Fixed-size item records and the key ordering shared by builder and reader

use crate::header::read_u64;
use crate::id128::Id128;
use std::cmp::Ordering;
use std::fmt;

/// Bytes reserved for a language tag, including the NUL terminator
pub const LANGUAGE_FIELD: usize = 32;

/// Longest language tag that fits the field
pub const LANGUAGE_MAX: usize = LANGUAGE_FIELD - 1;

/// On-disk size of one item record: id + language + offset
pub const ITEM_SIZE: usize = Id128::SIZE + LANGUAGE_FIELD + 8;

/// Language tag stored in a NUL-padded 32-byte field
///
/// The empty tag is the default (untranslated) entry. Ordering is byte-wise
/// over the bytes before the first NUL, so the empty tag sorts first.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language([u8; LANGUAGE_FIELD]);

impl Language {
    pub const DEFAULT: Language = Language([0; LANGUAGE_FIELD]);

    /// Build a tag, truncating anything past 31 bytes
    pub fn truncated(tag: &str) -> Self {
        let mut field = [0u8; LANGUAGE_FIELD];
        let bytes = tag.as_bytes();
        let n = bytes.len().min(LANGUAGE_MAX);
        field[..n].copy_from_slice(&bytes[..n]);
        Language(field)
    }

    /// Build a tag that must fit without truncation
    pub fn new(tag: &str) -> Option<Self> {
        if tag.len() > LANGUAGE_MAX || tag.as_bytes().contains(&0) {
            return None;
        }
        Some(Self::truncated(tag))
    }

    pub(crate) fn from_field(field: [u8; LANGUAGE_FIELD]) -> Self {
        Language(field)
    }

    /// Tag bytes up to the first NUL
    pub fn as_bytes(&self) -> &[u8] {
        field_str(&self.0)
    }

    /// Tag as text; non-UTF-8 tags from a foreign writer render lossily
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn is_default(&self) -> bool {
        self.0[0] == 0
    }

    pub fn field(&self) -> &[u8; LANGUAGE_FIELD] {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::DEFAULT
    }
}

impl PartialOrd for Language {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Language {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Language({:?})", self.as_str())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            f.write_str("C")
        } else {
            f.write_str(&self.as_str())
        }
    }
}

fn field_str(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

/// Lookup key: the merge key of the builder and the search key of the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CatalogKey {
    pub id: Id128,
    pub language: Language,
}

impl CatalogKey {
    pub fn new(id: Id128, language: Language) -> Self {
        CatalogKey { id, language }
    }
}

impl PartialOrd for CatalogKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CatalogKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_raw(self.id.as_bytes(), self.language.field(), other)
    }
}

/// Compare a raw record key against `key` with the catalog ordering
///
/// This is the single comparator used to sort items at build time and to
/// binary-search them at read time.
pub fn compare_raw(id: &[u8], language: &[u8], key: &CatalogKey) -> Ordering {
    id.cmp(key.id.as_bytes().as_slice())
        .then_with(|| field_str(language).cmp(key.language.as_bytes()))
}

/// One item record: key plus the payload offset into the string blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogItem {
    pub key: CatalogKey,
    pub offset: u64,
}

impl CatalogItem {
    pub fn new(key: CatalogKey, offset: u64) -> Self {
        CatalogItem { key, offset }
    }

    /// Serialize to exactly `ITEM_SIZE` bytes
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.key.id.as_bytes());
        out.extend_from_slice(self.key.language.field());
        out.extend_from_slice(&self.offset.to_le_bytes());
    }

    /// Decode the known prefix of a record; trailing bytes are ignored
    ///
    /// `record` must hold at least `ITEM_SIZE` bytes, which the header
    /// validation guarantees for every record inside the item array.
    pub fn from_record(record: &[u8]) -> Self {
        let mut id = [0u8; Id128::SIZE];
        id.copy_from_slice(&record[..Id128::SIZE]);

        let mut language = [0u8; LANGUAGE_FIELD];
        language.copy_from_slice(&record[Id128::SIZE..Id128::SIZE + LANGUAGE_FIELD]);

        CatalogItem {
            key: CatalogKey::new(Id128(id), Language::from_field(language)),
            offset: read_u64(record, Id128::SIZE + LANGUAGE_FIELD),
        }
    }
}
