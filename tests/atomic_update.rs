//! Database publication: a failed rebuild never disturbs the current file

use journal_catalog::{
    update_catalog, update_from_config, Catalog, CatalogConfig, CatalogError, Id128,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ID: &str = "fc2e22bc6ee647b6b90729ab34a250b1";

fn write_source(dir: &Path, name: &str, text: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_parse_error_keeps_previous_database() {
    let tmp = TempDir::new().unwrap();
    let good = write_source(tmp.path(), "good.catalog", &format!("-- {}\nSubject: v1\n", ID));
    let db_dir = tmp.path().join("db");
    let db = db_dir.join("database");

    update_catalog(&db, &[&good]).unwrap();
    let before = std::fs::read(&db).unwrap();

    let bad = write_source(tmp.path(), "bad.catalog", "Subject: no id line\n");
    let err = update_catalog(&db, &[&good, &bad]).unwrap_err();
    match err {
        CatalogError::Parse { path, line, .. } => {
            assert_eq!(path, bad);
            assert_eq!(line, 1);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(std::fs::read(&db).unwrap(), before);
    assert_eq!(dir_names(&db_dir), vec!["database"]);
}

#[test]
fn test_open_reader_survives_rebuild() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("database");
    let v1 = write_source(tmp.path(), "v1.catalog", &format!("-- {}\nSubject: v1\n", ID));
    update_catalog(&db, &[&v1]).unwrap();

    let old = Catalog::open(&db).unwrap();

    let v2 = write_source(tmp.path(), "v2.catalog", &format!("-- {}\nSubject: v2\n\nNew body.\n", ID));
    update_catalog(&db, &[&v2]).unwrap();

    let id = Id128::parse(ID).unwrap();
    // The old mapping still sees the replaced inode
    assert_eq!(old.lookup(id, None).unwrap(), "Subject: v1\n");

    let new = Catalog::open(&db).unwrap();
    assert_eq!(new.lookup(id, None).unwrap(), "Subject: v2\n\nNew body.\n");
}

#[test]
fn test_staging_dir_is_left_clean() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("usr/lib/systemd/catalog");
    write_source(&src, "a.catalog", &format!("-- {}\nSubject: a\n", ID));

    let config = CatalogConfig::from_toml_str(&format!(
        "root = {:?}\ndirectories = [\"/usr/lib/systemd/catalog\"]\ndatabase = \"/var/db/database\"\nstaging_dir = \"/var/staging\"\n",
        tmp.path().display().to_string()
    ))
    .unwrap();

    let report = update_from_config(&config).unwrap();
    assert_eq!(report.items, 1);

    let db = tmp.path().join("var/db/database");
    assert!(Catalog::open(&db).is_ok());
    assert!(dir_names(&tmp.path().join("var/staging")).is_empty());
}

#[test]
fn test_update_from_config_honours_override() {
    let tmp = TempDir::new().unwrap();
    let local = tmp.path().join("local");
    let vendor = tmp.path().join("vendor");
    write_source(&local, "systemd.catalog", &format!("-- {}\nSubject: local\n", ID));
    write_source(&vendor, "systemd.catalog", &format!("-- {}\nSubject: vendor\n", ID));

    let config = CatalogConfig {
        root: None,
        directories: vec![local, vendor],
        database: tmp.path().join("database"),
        staging_dir: None,
    };
    update_from_config(&config).unwrap();

    let catalog = Catalog::open(config.database_path()).unwrap();
    assert_eq!(
        catalog.lookup(Id128::parse(ID).unwrap(), None).unwrap(),
        "Subject: local\n"
    );
}
