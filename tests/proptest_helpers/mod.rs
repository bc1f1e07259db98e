#![allow(dead_code)]

use std::cell::RefCell;

use mytardis::model::PageSource;
use mytardis::MytardisError;
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::{json, Value};

pub const QUERY_URL: &str = "https://mytardis-test.example.com/api/v1/dataset/?format=json";

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A server holding `total` datasets whose ids equal their position.
pub struct FakeServer {
    pub total: usize,
    pub requests: RefCell<Vec<String>>,
}

impl FakeServer {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn page(&self, limit: usize, offset: usize) -> Value {
        let end = if limit == 0 {
            self.total
        } else {
            (offset + limit).min(self.total)
        };
        let objects: Vec<Value> = (offset.min(end)..end)
            .map(|i| json!({"id": i, "description": format!("dataset {i}")}))
            .collect();
        json!({
            "meta": {
                "limit": limit,
                "next": null,
                "offset": offset,
                "previous": null,
                "total_count": self.total
            },
            "objects": objects
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

fn query_param(url: &str, name: &str) -> Option<usize> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .and_then(|value| value.parse().ok())
}

impl PageSource for FakeServer {
    fn fetch_page(&self, url: &str) -> Result<Value, MytardisError> {
        self.requests.borrow_mut().push(url.to_string());
        let limit = query_param(url, "limit").unwrap_or(20);
        let offset = query_param(url, "offset").unwrap_or(0);
        Ok(self.page(limit, offset))
    }
}

/// Total count, page size and first-page offset, with the offset inside the result.
pub fn arb_pagination() -> impl Strategy<Value = (usize, usize, usize)> {
    (0usize..120, 1usize..25).prop_flat_map(|(total, limit)| {
        let max_offset = total.max(1);
        (Just(total), Just(limit), 0..max_offset)
    })
}
