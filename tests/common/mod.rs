#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;

use mytardis::api::{HttpRequest, HttpResponse, Method, Transport};
use mytardis::config::Config;
use mytardis::MytardisError;
use serde_json::{json, Value};

pub const BASE: &str = "https://mytardis-test.example.com";

pub fn test_config() -> Config {
    Config::new(BASE, "demofacility", "secret")
}

/// Serves canned responses keyed by exact "METHOD url" and records requests.
#[derive(Default)]
pub struct MockTransport {
    routes: BTreeMap<String, HttpResponse>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, method: Method, url: &str, status: u16, body: &Value) -> Self {
        self.routes.insert(
            format!("{method} {url}"),
            HttpResponse::new(status, body.to_string()),
        );
        self
    }

    /// Route answering with `body` as is, which need not be JSON.
    pub fn on_raw(mut self, method: Method, url: &str, status: u16, body: &str) -> Self {
        self.routes
            .insert(format!("{method} {url}"), HttpResponse::new(status, body));
        self
    }

    pub fn on_get(self, url: &str, body: &Value) -> Self {
        self.on(Method::Get, url, 200, body)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, MytardisError> {
        self.requests.borrow_mut().push(request.clone());
        self.routes
            .get(&request.signature())
            .cloned()
            .ok_or_else(|| MytardisError::Transport {
                url: request.url.clone(),
                message: format!("no mock route for {}", request.signature()),
            })
    }
}

pub fn envelope(total: usize, limit: usize, offset: usize, objects: Vec<Value>) -> Value {
    json!({
        "meta": {
            "limit": limit,
            "next": null,
            "offset": offset,
            "previous": null,
            "total_count": total
        },
        "objects": objects
    })
}

pub fn sample_datafile() -> Value {
    json!({
        "id": 1,
        "created_time": "2016-11-10T13:50:25.258483",
        "dataset": "/api/v1/dataset/1/",
        "directory": "",
        "filename": "testfile1.txt",
        "md5sum": "bogus",
        "mimetype": "text/plain",
        "modification_time": null,
        "parameter_sets": [],
        "replicas": [
            {
                "datafile": "/api/v1/dataset_file/1/",
                "id": 1,
                "location": "local box at /home/mytardis/var/local",
                "resource_uri": "/api/v1/replica/1/",
                "uri": "subdir/testfile1.txt",
                "verified": true
            }
        ],
        "resource_uri": "/api/v1/dataset_file/1/",
        "size": 32
    })
}
