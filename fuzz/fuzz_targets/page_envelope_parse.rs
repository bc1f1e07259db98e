//! Fuzz target for list response parsing.
//!
//! Feeds arbitrary bytes to the page envelope decoder and, when they decode,
//! renders the records as a table.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mytardis::model::{Page, ResourceKind};
use mytardis::render::records_table;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    for kind in ResourceKind::ALL {
        if let Ok(page) = Page::from_slice(kind, data, "fuzz") {
            let _ = records_table(kind, &page.records).render();
        }
    }
});
