//! Catalog compiler
//!
//! Parses source files into a [`MergeStore`], lays out the sorted item array
//! and string blob, and publishes the database with a single atomic rename.

use crate::error::{CatalogError, Result};
use crate::header::CatalogHeader;
use crate::item::{CatalogItem, ITEM_SIZE};
use crate::merge::MergeStore;
use crate::parser;
use crate::strbuf::StringInterner;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of a successful build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildReport {
    /// Number of item records written (0 means no database was written)
    pub items: usize,
    /// Size of the string blob
    pub string_bytes: usize,
    /// Size of the whole database file
    pub total_size: u64,
}

/// In-memory database image produced by [`CatalogBuilder::build_bytes`]
#[derive(Debug, Clone)]
pub struct CatalogImage {
    pub bytes: Vec<u8>,
    pub items: usize,
    pub string_bytes: usize,
}

/// Accumulates catalog sources and writes the binary database
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    store: MergeStore,
    staging_dir: Option<PathBuf>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory for the temporary file; defaults to the database's directory
    ///
    /// Must be on the same file system as the database, or the final rename
    /// fails.
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Parse one source file into the store
    pub fn import_file(&mut self, path: &Path) -> Result<usize> {
        debug!("Reading file '{}'", path.display());
        let entries = parser::parse_file(path)?;
        let n = entries.len();
        self.store.extend(entries);
        Ok(n)
    }

    /// Parse source text from a reader; `path` names it and sets its language
    pub fn import_reader<R: BufRead>(&mut self, reader: R, path: &Path) -> Result<usize> {
        let entries = parser::parse_entries(reader, path)?;
        let n = entries.len();
        self.store.extend(entries);
        Ok(n)
    }

    /// Parse sources in precedence order; stops at the first error
    pub fn import_files<I, P>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            self.import_file(path.as_ref())?;
        }
        Ok(())
    }

    pub fn store(&self) -> &MergeStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MergeStore {
        &mut self.store
    }

    /// Lay out the database in memory
    ///
    /// Returns `None` when no entries were imported.
    pub fn build_bytes(&self) -> Option<CatalogImage> {
        if self.store.is_empty() {
            return None;
        }

        let mut strings = StringInterner::new();
        let mut items = Vec::with_capacity(self.store.len());

        for (key, payload) in self.store.iter() {
            debug!("Found {}, language {}", key.id, key.language);
            let offset = strings.intern(payload);
            items.push(CatalogItem::new(*key, offset));
        }

        items.sort_unstable_by(|a, b| a.key.cmp(&b.key));

        let header = CatalogHeader::new(items.len() as u64);
        let header_bytes = header.to_bytes();

        let mut bytes =
            Vec::with_capacity(header_bytes.len() + items.len() * ITEM_SIZE + strings.len());
        bytes.extend_from_slice(&header_bytes);
        for item in &items {
            item.write_to(&mut bytes);
        }
        bytes.extend_from_slice(strings.as_bytes());

        if strings.dedup_hits() > 0 {
            debug!("Shared {} identical payloads", strings.dedup_hits());
        }

        Some(CatalogImage {
            bytes,
            items: items.len(),
            string_bytes: strings.len(),
        })
    }

    /// Build and atomically publish the database at `database`
    ///
    /// With nothing imported, no file is touched and a zero report is
    /// returned.
    pub fn write(&self, database: &Path) -> Result<BuildReport> {
        let image = match self.build_bytes() {
            Some(image) => image,
            None => {
                info!("No items in catalog.");
                return Ok(BuildReport::default());
            }
        };
        debug!("Found {} items in catalog.", image.items);

        let staging = match &self.staging_dir {
            Some(dir) => dir.clone(),
            None => database
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };

        write_atomic(database, &staging, &image.bytes)?;

        let report = BuildReport {
            items: image.items,
            string_bytes: image.string_bytes,
            total_size: image.bytes.len() as u64,
        };

        debug!(
            "{}: wrote {} items, with {} bytes of strings, {} total size.",
            database.display(),
            report.items,
            report.string_bytes,
            report.total_size
        );

        Ok(report)
    }
}

/// Write `bytes` to a temporary file in `staging` and rename it over `database`
///
/// The temporary file is removed on every failure path, so `database` is
/// either the old file or the complete new one.
fn write_atomic(database: &Path, staging: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
    }
    std::fs::create_dir_all(staging).map_err(|e| CatalogError::io(staging, e))?;

    let prefix = format!(
        ".#{}",
        database
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "database".to_string())
    );

    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .tempfile_in(staging)
        .map_err(|e| CatalogError::io(staging, e))?;
    let tmp_path = tmp.path().to_path_buf();

    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| CatalogError::io(&tmp_path, e))?;

    let written = tmp
        .as_file()
        .metadata()
        .map_err(|e| CatalogError::io(&tmp_path, e))?
        .len();
    if written != bytes.len() as u64 {
        return Err(CatalogError::io(
            &tmp_path,
            io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", written, bytes.len()),
            ),
        ));
    }

    set_world_readable(tmp.as_file()).map_err(|e| CatalogError::io(&tmp_path, e))?;

    tmp.persist(database).map_err(|e| {
        CatalogError::io(
            database,
            io::Error::new(
                e.error.kind(),
                format!("rename {} failed: {}", tmp_path.display(), e.error),
            ),
        )
    })?;

    Ok(())
}

#[cfg(unix)]
fn set_world_readable(file: &std::fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_world_readable(_file: &std::fs::File) -> io::Result<()> {
    Ok(())
}

/// Rebuild `database` from `sources`, processed in the given order
pub fn update_catalog<P: AsRef<Path>>(database: &Path, sources: &[P]) -> Result<BuildReport> {
    let mut builder = CatalogBuilder::new();
    builder.import_files(sources)?;
    builder.write(database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{read_u64, HEADER_SIZE_ALIGNED};
    use crate::id128::Id128;
    use crate::item::Language;
    use tempfile::TempDir;

    const ID_A: &str = "00000000000000000000000000000002";
    const ID_B: &str = "00000000000000000000000000000001";

    fn builder_with(text: &str, name: &str) -> CatalogBuilder {
        let mut builder = CatalogBuilder::new();
        builder.import_reader(text.as_bytes(), Path::new(name)).unwrap();
        builder
    }

    #[test]
    fn test_empty_builder_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("catalog/database");

        let report = CatalogBuilder::new().write(&db).unwrap();
        assert_eq!(report, BuildReport::default());
        assert!(!db.exists());
    }

    #[test]
    fn test_layout_is_sorted() {
        let text = format!(
            "-- {} fr\nSubject: a-fr\n\n-- {}\nSubject: a\n\n-- {}\nSubject: b\n",
            ID_A, ID_A, ID_B
        );
        let image = builder_with(&text, "x.catalog").build_bytes().unwrap();
        assert_eq!(image.items, 3);

        let items: Vec<_> = (0..3)
            .map(|i| {
                let start = HEADER_SIZE_ALIGNED + i * ITEM_SIZE;
                CatalogItem::from_record(&image.bytes[start..start + ITEM_SIZE])
            })
            .collect();

        assert_eq!(items[0].key.id, Id128::parse(ID_B).unwrap());
        assert_eq!(items[1].key.id, Id128::parse(ID_A).unwrap());
        assert_eq!(items[1].key.language, Language::DEFAULT);
        assert_eq!(items[2].key.language.as_bytes(), b"fr");

        let strings = HEADER_SIZE_ALIGNED + 3 * ITEM_SIZE;
        assert_eq!(read_u64(&image.bytes, 24), 3);
        assert_eq!(image.bytes.len(), strings + image.string_bytes);

        let text_at = |offset: u64| {
            let start = strings + offset as usize;
            let end = start + image.bytes[start..].iter().position(|&b| b == 0).unwrap();
            std::str::from_utf8(&image.bytes[start..end]).unwrap().to_string()
        };
        assert_eq!(text_at(items[0].offset), "Subject: b\n");
        assert_eq!(text_at(items[2].offset), "Subject: a-fr\n");
    }

    #[test]
    fn test_identical_payloads_share_offset() {
        let text = format!("-- {}\nSame\n\n-- {}\nSame\n", ID_A, ID_B);
        let image = builder_with(&text, "x.catalog").build_bytes().unwrap();
        let first = CatalogItem::from_record(&image.bytes[HEADER_SIZE_ALIGNED..]);
        let second = CatalogItem::from_record(&image.bytes[HEADER_SIZE_ALIGNED + ITEM_SIZE..]);
        assert_eq!(first.offset, second.offset);
        assert_eq!(image.string_bytes, "Same\n".len() + 1);
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("var/lib/catalog/database");
        let text = format!("-- {}\nSubject: a\n", ID_A);

        let report = builder_with(&text, "x.catalog").write(&db).unwrap();
        assert_eq!(report.items, 1);
        assert_eq!(std::fs::metadata(&db).unwrap().len(), report.total_size);
    }

    #[cfg(unix)]
    #[test]
    fn test_database_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let db = dir.path().join("database");
        let text = format!("-- {}\nSubject: a\n", ID_A);
        builder_with(&text, "x.catalog").write(&db).unwrap();

        let mode = std::fs::metadata(&db).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("database");
        std::fs::create_dir(&db).unwrap();
        std::fs::write(db.join("keep"), b"x").unwrap();

        let text = format!("-- {}\nSubject: a\n", ID_A);
        let err = builder_with(&text, "x.catalog").write(&db).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("database")]);
        assert_eq!(std::fs::read(db.join("keep")).unwrap(), b"x");
    }
}
