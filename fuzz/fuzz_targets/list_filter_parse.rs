//! Fuzz target for `--filter FIELD=VALUE` terms and the query URLs built from them.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mytardis::api::{parse_filter, ListQuery};
use mytardis::model::ResourceKind;

fuzz_target!(|data: &[u8]| {
    let Ok(term) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok((field, value)) = parse_filter(term) {
        let url = ListQuery::new()
            .filter(field, value)
            .request_url("https://mytardis.example.com", ResourceKind::Dataset);
        assert!(url.starts_with("https://mytardis.example.com/api/v1/dataset/?format=json&"));
    }
});
