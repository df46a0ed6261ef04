//! Catalog source discovery
//!
//! Directories are given highest priority first. A file name seen in an
//! earlier directory hides the same name in later ones, which lets an admin
//! override or mask a vendor catalog from `/usr/local`.

use crate::error::{CatalogError, Result};
use crate::parser::CATALOG_SUFFIX;
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Place `dir` under `root`, if a root is set
pub fn prefix_root(root: Option<&Path>, dir: &Path) -> PathBuf {
    match root {
        Some(root) => root.join(dir.strip_prefix("/").unwrap_or(dir)),
        None => dir.to_path_buf(),
    }
}

fn is_mask(path: &Path) -> bool {
    std::fs::read_link(path)
        .map(|target| target == Path::new("/dev/null"))
        .unwrap_or(false)
}

/// Catalog source files in build order
///
/// Returns one path per distinct file name, taken from the first directory
/// that has it, sorted by file name. Masked names (symlinks to `/dev/null`)
/// are dropped. Hidden files and missing directories are skipped.
pub fn discover_sources<P: AsRef<Path>>(root: Option<&Path>, dirs: &[P]) -> Result<Vec<PathBuf>> {
    let mut found: BTreeMap<OsString, PathBuf> = BTreeMap::new();
    let mut masked: HashSet<OsString> = HashSet::new();

    for dir in dirs {
        let dir = prefix_root(root, dir.as_ref());

        let read = match std::fs::read_dir(&dir) {
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Skipping missing catalog directory {}", dir.display());
                continue;
            }
            Err(e) => return Err(CatalogError::io(&dir, e)),
        };

        for dirent in read {
            let dirent = dirent.map_err(|e| CatalogError::io(&dir, e))?;
            let name = dirent.file_name();
            let name_str = name.to_string_lossy();

            if name_str.starts_with('.') || !name_str.ends_with(CATALOG_SUFFIX) {
                continue;
            }

            if found.contains_key(&name) || masked.contains(&name) {
                debug!("Skipping overridden file {}", dirent.path().display());
                continue;
            }

            let path = dirent.path();
            if is_mask(&path) {
                debug!("Catalog file {} is masked", path.display());
                masked.insert(name);
                continue;
            }

            let metadata = std::fs::metadata(&path).map_err(|e| CatalogError::io(&path, e))?;
            if !metadata.is_file() {
                continue;
            }

            found.insert(name, path);
        }
    }

    Ok(found.into_values().collect())
}
