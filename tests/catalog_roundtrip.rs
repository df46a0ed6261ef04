//! End-to-end build and lookup tests
//!
//! Source files are written to a temporary catalog directory, compiled, and
//! read back through the memory-mapped reader.

use journal_catalog::{
    discover_sources, list_all, update_catalog, Catalog, CatalogBuilder, Id128, Language,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const COREDUMP: &str = "fc2e22bc6ee647b6b90729ab34a250b1";
const SHUTDOWN: &str = "98268866d1d54a499c4e98921d93bc40";

fn id(s: &str) -> Id128 {
    Id128::parse(s).unwrap()
}

fn write_source(dir: &Path, name: &str, text: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_build_and_lookup_every_key() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("catalog");

    let neutral = write_source(
        &src,
        "systemd.catalog",
        &format!(
            "# systemd messages\n\n-- {}\nSubject: Process dumped core\nDefined-By: systemd\n\nA process crashed.\n\n-- {}\nSubject: System shutdown\n\nThe system is going down.\n",
            COREDUMP, SHUTDOWN
        ),
    );
    let german = write_source(
        &src,
        "systemd.de.catalog",
        &format!(
            "-- {}\nSubject: Speicherabbild erzeugt\n\nEin Prozess ist abgestuerzt.\n\n-- {} fr\nSubject: Arret du systeme\n\nLe systeme s'arrete.\n",
            COREDUMP, SHUTDOWN
        ),
    );

    let db = tmp.path().join("db/database");
    let report = update_catalog(&db, &[&neutral, &german]).unwrap();
    assert_eq!(report.items, 4);

    let catalog = Catalog::open(&db).unwrap();
    assert_eq!(catalog.len(), 4);

    let cases = [
        (COREDUMP, "", "A process crashed."),
        (COREDUMP, "de", "Ein Prozess ist abgestuerzt."),
        (SHUTDOWN, "", "The system is going down."),
        (SHUTDOWN, "fr", "Le systeme s'arrete."),
    ];
    for (msg, lang, body) in cases {
        let text = catalog
            .lookup_language(id(msg), Language::new(lang).unwrap())
            .unwrap();
        assert!(text.contains(body), "{} [{}]: {:?}", msg, lang, text);
    }

    assert!(catalog
        .lookup(id(COREDUMP), Some("de_DE.UTF-8"))
        .unwrap()
        .contains("Speicherabbild"));
    assert!(catalog
        .lookup(id(SHUTDOWN), Some("de_DE.UTF-8"))
        .unwrap()
        .contains("going down"));
}

#[test]
fn test_merge_across_files() {
    let tmp = TempDir::new().unwrap();
    let vendor = write_source(
        tmp.path(),
        "a-vendor.catalog",
        &format!(
            "-- {}\nSubject: Process dumped core\nDefined-By: systemd\n\nVendor body.\n",
            COREDUMP
        ),
    );
    let local = write_source(
        tmp.path(),
        "b-local.catalog",
        &format!(
            "-- {}\nDocumentation: man:core(5)\nSubject: Local subject\n",
            COREDUMP
        ),
    );

    let db = tmp.path().join("database");
    update_catalog(&db, &[&vendor, &local]).unwrap();
    let catalog = Catalog::open(&db).unwrap();
    let text = catalog.lookup(id(COREDUMP), None).unwrap();

    // Later file's headers first, earlier file's headers kept, body preserved
    assert_eq!(
        text,
        "Documentation: man:core(5)\nSubject: Local subject\nSubject: Process dumped core\nDefined-By: systemd\n\nVendor body.\n"
    );
}

#[test]
fn test_merge_prefers_later_body() {
    let tmp = TempDir::new().unwrap();
    let first = write_source(
        tmp.path(),
        "1.catalog",
        &format!("-- {}\nSubject: one\n\nFirst body.\n", COREDUMP),
    );
    let second = write_source(
        tmp.path(),
        "2.catalog",
        &format!("-- {}\nSubject: two\n\nSecond body.\n", COREDUMP),
    );

    let mut builder = CatalogBuilder::new();
    builder.import_files([&first, &second]).unwrap();
    let image = builder.build_bytes().unwrap();
    let view = journal_catalog::CatalogView::parse(&image.bytes).unwrap();

    assert_eq!(
        view.lookup(id(COREDUMP), None).unwrap(),
        "Subject: two\nSubject: one\n\nSecond body.\n"
    );
}

#[test]
fn test_rebuild_is_byte_identical() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    write_source(
        &src,
        "x.catalog",
        &format!("-- {}\nSubject: a\n\n-- {} de\nSubject: b\n", SHUTDOWN, COREDUMP),
    );
    write_source(
        &src,
        "y.fr.catalog",
        &format!("-- {}\nSubject: c\n\n-- {}\nSubject: a\n", SHUTDOWN, COREDUMP),
    );

    let sources = discover_sources(None, &[&src]).unwrap();
    let first = tmp.path().join("first");
    let second = tmp.path().join("second");
    update_catalog(&first, &sources).unwrap();
    update_catalog(&second, &sources).unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn test_list_all_dedups_languages() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(
        tmp.path(),
        "x.catalog",
        &format!(
            "-- {id} de\nSubject: Deutsch\n\n-- {id}\nSubject: English\n",
            id = COREDUMP
        ),
    );
    let db = tmp.path().join("database");
    update_catalog(&db, &[src]).unwrap();

    let catalog = Catalog::open(&db).unwrap();
    let entries = list_all(&catalog.view()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "Subject: English\n");
}

#[test]
fn test_empty_sources_write_no_database() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(tmp.path(), "empty.catalog", "# nothing here\n");
    let db = tmp.path().join("database");

    let report = update_catalog(&db, &[src]).unwrap();
    assert_eq!(report.items, 0);
    assert!(!db.exists());
    assert!(Catalog::open(&db).unwrap_err().is_not_found());
}

#[test]
fn test_independent_handles() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(
        tmp.path(),
        "x.catalog",
        &format!("-- {}\nSubject: shared\n", COREDUMP),
    );
    let db = tmp.path().join("database");
    update_catalog(&db, &[src]).unwrap();

    let a = Catalog::open(&db).unwrap();
    let b = Catalog::open(&db).unwrap();
    drop(a);
    assert_eq!(b.lookup(id(COREDUMP), None).unwrap(), "Subject: shared\n");
}
