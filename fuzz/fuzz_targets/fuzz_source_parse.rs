#![no_main]
use journal_catalog::{CatalogBuilder, CatalogView};
use libfuzzer_sys::fuzz_target;
use std::path::Path;

// Arbitrary source text: whatever parses must compile into an image that
// reads back.
fuzz_target!(|data: &[u8]| {
    let mut builder = CatalogBuilder::new();
    if builder
        .import_reader(data, Path::new("fuzz.de.catalog"))
        .is_err()
    {
        return;
    }

    if let Some(image) = builder.build_bytes() {
        let view = CatalogView::parse(&image.bytes).expect("built image must parse");
        for (key, payload) in builder.store().iter() {
            // Payloads are NUL-terminated in the blob
            if payload.contains('\0') {
                continue;
            }
            let text = view
                .lookup_language(key.id, key.language)
                .expect("built key must resolve");
            assert_eq!(text, payload);
        }
    }
});
