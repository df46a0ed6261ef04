//! Catalog database reader
//!
//! [`Catalog`] maps a database file read-only; [`CatalogView`] does all of
//! the work over a plain byte slice, so every access is bounds-checked
//! against the mapped length and the same code runs on in-memory images.

use crate::error::{CatalogError, CorruptKind, Result};
use crate::header::CatalogHeader;
use crate::id128::Id128;
use crate::item::{compare_raw, CatalogItem, CatalogKey, Language, ITEM_SIZE};
use crate::locale::candidate_languages;
use memmap2::Mmap;
use std::cmp::Ordering;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validated positions inside a database image
#[derive(Debug, Clone, Copy)]
struct Layout {
    header: CatalogHeader,
    items_start: usize,
    record_size: usize,
    n_items: usize,
    strings_start: usize,
}

impl Layout {
    fn parse(data: &[u8]) -> Result<Self> {
        let header = CatalogHeader::from_bytes(data)?;

        // validate() bounded all of these by data.len()
        let to_usize = |v: u64| {
            usize::try_from(v).map_err(|_| {
                CatalogError::from(CorruptKind::ItemsOutOfBounds {
                    needed: v,
                    len: data.len() as u64,
                })
            })
        };

        let strings_start = header.strings_offset().ok_or(CorruptKind::ItemsOutOfBounds {
            needed: u64::MAX,
            len: data.len() as u64,
        })?;

        Ok(Layout {
            header,
            items_start: to_usize(header.header_size)?,
            record_size: to_usize(header.item_record_size)?,
            n_items: to_usize(header.n_items)?,
            strings_start: to_usize(strings_start)?,
        })
    }
}

/// Read-only view of a validated database image
#[derive(Debug, Clone, Copy)]
pub struct CatalogView<'a> {
    data: &'a [u8],
    layout: Layout,
}

impl<'a> CatalogView<'a> {
    /// Validate `data` as a complete database image
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let layout = Layout::parse(data)?;
        Ok(CatalogView { data, layout })
    }

    pub fn header(&self) -> &CatalogHeader {
        &self.layout.header
    }

    /// Number of item records
    pub fn len(&self) -> usize {
        self.layout.n_items
    }

    pub fn is_empty(&self) -> bool {
        self.layout.n_items == 0
    }

    /// Known prefix of record `index`; any trailing bytes of a larger record
    /// are skipped
    fn record(&self, index: usize) -> &'a [u8] {
        let start = self.layout.items_start + index * self.layout.record_size;
        &self.data[start..start + ITEM_SIZE]
    }

    /// Decode record `index`, or `None` past the end of the array
    pub fn item(&self, index: usize) -> Option<CatalogItem> {
        if index >= self.layout.n_items {
            return None;
        }
        Some(CatalogItem::from_record(self.record(index)))
    }

    /// All item records in stored order
    pub fn items(&self) -> impl Iterator<Item = CatalogItem> + 'a {
        let view = *self;
        (0..view.layout.n_items).map(move |i| CatalogItem::from_record(view.record(i)))
    }

    /// Binary search for an exact key
    pub fn find(&self, key: &CatalogKey) -> Option<CatalogItem> {
        let mut lo = 0;
        let mut hi = self.layout.n_items;

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let record = self.record(mid);
            let (id, rest) = record.split_at(Id128::SIZE);
            match compare_raw(id, &rest[..crate::item::LANGUAGE_FIELD], key) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Some(CatalogItem::from_record(record)),
            }
        }

        None
    }

    /// Payload text of `item`
    pub fn text(&self, item: &CatalogItem) -> Result<&'a str> {
        let start = usize::try_from(item.offset)
            .ok()
            .and_then(|off| off.checked_add(self.layout.strings_start))
            .filter(|&start| start <= self.data.len())
            .ok_or(CorruptKind::OffsetOutOfRange(item.offset))?;

        let tail = &self.data[start..];
        let len = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(CorruptKind::Unterminated(item.offset))?;

        std::str::from_utf8(&tail[..len]).map_err(|_| CorruptKind::InvalidUtf8(item.offset).into())
    }

    /// Exact (id, language) lookup, no fallback
    pub fn lookup_language(&self, id: Id128, language: Language) -> Result<&'a str> {
        let item = self
            .find(&CatalogKey::new(id, language))
            .ok_or(CatalogError::NotFound(id))?;
        self.text(&item)
    }

    /// Best match for `id` under the message `locale`, with the language
    /// that matched
    pub fn resolve(&self, id: Id128, locale: Option<&str>) -> Result<(Language, &'a str)> {
        for language in candidate_languages(locale) {
            if let Some(item) = self.find(&CatalogKey::new(id, language)) {
                return Ok((language, self.text(&item)?));
            }
        }
        Err(CatalogError::NotFound(id))
    }

    /// Best match for `id` under the message `locale`
    ///
    /// Tries `lang_TERRITORY`, then `lang`, then the default entry.
    pub fn lookup(&self, id: Id128, locale: Option<&str>) -> Result<&'a str> {
        self.resolve(id, locale).map(|(_, text)| text)
    }
}

/// Memory-mapped catalog database
///
/// Dropping the handle unmaps the file. Handles are independent; opening
/// the same path twice maps it twice.
#[derive(Debug)]
pub struct Catalog {
    mmap: Mmap,
    layout: Layout,
    path: PathBuf,
}

impl Catalog {
    /// Map and validate the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CatalogError::DatabaseNotFound(path.to_path_buf()),
            _ => CatalogError::io(path, e),
        })?;

        let len = file
            .metadata()
            .map_err(|e| CatalogError::io(path, e))?
            .len();
        if len < crate::header::HEADER_SIZE as u64 {
            return Err(CorruptKind::Truncated { len }.into());
        }

        // SAFETY: databases are replaced by rename and never written in
        // place, so the mapped bytes stay fixed for the life of the map.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| CatalogError::io(path, e))?;

        let layout = Layout::parse(&mmap)?;
        debug!(
            "Opened catalog {} with {} items",
            path.display(),
            layout.n_items
        );

        Ok(Catalog {
            mmap,
            layout,
            path: path.to_path_buf(),
        })
    }

    pub fn view(&self) -> CatalogView<'_> {
        CatalogView {
            data: &self.mmap,
            layout: self.layout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.layout.n_items
    }

    pub fn is_empty(&self) -> bool {
        self.layout.n_items == 0
    }

    pub fn lookup(&self, id: Id128, locale: Option<&str>) -> Result<&str> {
        self.view().lookup(id, locale)
    }

    pub fn lookup_language(&self, id: Id128, language: Language) -> Result<&str> {
        self.view().lookup_language(id, language)
    }
}

/// Open `database`, look up `id` for `locale`, and copy the text out
pub fn catalog_get(database: &Path, id: Id128, locale: Option<&str>) -> Result<String> {
    let catalog = Catalog::open(database)?;
    let text = catalog.lookup(id, locale)?;
    Ok(text.to_string())
}
