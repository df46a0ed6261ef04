#![no_main]
use journal_catalog::{list_all, CatalogView, Id128};
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes as a database image: parsing and every lookup must fail
// cleanly instead of panicking or reading out of bounds.
fuzz_target!(|data: &[u8]| {
    let view = match CatalogView::parse(data) {
        Ok(view) => view,
        Err(_) => return,
    };

    for item in view.items() {
        let _ = view.text(&item);
        let _ = view.lookup(item.key.id, Some("de_DE.UTF-8"));
    }

    let _ = view.lookup(Id128([0u8; 16]), None);
    let _ = list_all(&view);
});
