//! Optional GET response cache.
//!
//! Successful GET responses are stored under the request signature (method and
//! URL) plus a checksum of the `Authorization` header, for a fixed expiration
//! window, in memory and optionally in a JSON file so that repeated CLI
//! invocations can share them. Any successful write empties the cache.
//! Nothing depends on the cache being present or warm: a miss, a stale entry
//! or an unreadable cache file all fall through to the wrapped transport.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::transport::{HttpRequest, HttpResponse, Method, Transport};
use crate::error::MytardisError;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CacheEntry {
    stored_at: u64,
    status: u16,
    body: String,
}

/// Signature-keyed response store with a fixed expiration window.
#[derive(Debug)]
pub struct ResponseCache {
    path: Option<PathBuf>,
    expiration: Duration,
    entries: RefCell<BTreeMap<String, CacheEntry>>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

impl ResponseCache {
    /// A cache that lives only as long as this value.
    pub fn in_memory(expiration: Duration) -> Self {
        Self {
            path: None,
            expiration,
            entries: RefCell::new(BTreeMap::new()),
        }
    }

    /// A cache persisted at `path`. An unreadable file starts an empty cache.
    pub fn open(path: PathBuf, expiration: Duration) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                log::warn!("Ignoring unreadable cache file {}: {}", path.display(), err);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: Some(path),
            expiration,
            entries: RefCell::new(entries),
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: u64) -> bool {
        now.saturating_sub(entry.stored_at) < self.expiration.as_secs()
    }

    /// Fresh response stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<HttpResponse> {
        let entries = self.entries.borrow();
        let entry = entries.get(key)?;
        if self.is_fresh(entry, now_secs()) {
            Some(HttpResponse::new(entry.status, entry.body.clone()))
        } else {
            None
        }
    }

    /// Stores `response` under `key`, dropping stale entries.
    pub fn put(&self, key: &str, response: &HttpResponse) {
        let now = now_secs();
        {
            let mut entries = self.entries.borrow_mut();
            entries.retain(|_, entry| now.saturating_sub(entry.stored_at) < self.expiration.as_secs());
            entries.insert(
                key.to_string(),
                CacheEntry {
                    stored_at: now,
                    status: response.status,
                    body: response.body.clone(),
                },
            );
        }
        self.persist();
    }

    /// Drops every entry.
    pub fn clear(&self) {
        if self.is_empty() {
            return;
        }
        self.entries.borrow_mut().clear();
        self.persist();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let result = serde_json::to_string(&*self.entries.borrow())
            .map_err(|err| err.to_string())
            .and_then(|text| {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|err| err.to_string())?;
                }
                write_private(path, &text).map_err(|err| err.to_string())
            });
        if let Err(err) = result {
            log::warn!("Could not write cache file {}: {}", path.display(), err);
        }
    }
}

/// Creates or truncates `path` readable by its owner only.
fn write_private(path: &std::path::Path, text: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(text.as_bytes())
}

/// Cache key for `request`: its signature and a checksum of its credentials.
fn cache_key(request: &HttpRequest) -> String {
    let credentials = request.header("Authorization").unwrap_or_default();
    format!(
        "{} {:08x}",
        request.signature(),
        crc32c::crc32c(credentials.as_bytes())
    )
}

/// A [`Transport`] that answers repeated GETs from a [`ResponseCache`].
pub struct CachedTransport<T> {
    inner: T,
    cache: ResponseCache,
}

impl<T: Transport> CachedTransport<T> {
    pub fn new(inner: T, cache: ResponseCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

impl<T: Transport> Transport for CachedTransport<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, MytardisError> {
        if request.method != Method::Get {
            let response = self.inner.send(request)?;
            if response.is_success() {
                log::debug!("cache cleared after {}", request.signature());
                self.cache.clear();
            }
            return Ok(response);
        }

        let key = cache_key(request);
        if let Some(response) = self.cache.get(&key) {
            log::debug!("cache hit: {key}");
            return Ok(response);
        }

        log::debug!("cache miss: {key}");
        let response = self.inner.send(request)?;
        if response.is_success() {
            self.cache.put(&key, &response);
        }
        Ok(response)
    }
}
