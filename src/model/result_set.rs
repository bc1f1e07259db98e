//! Lazily-paginated query results.
//!
//! A [`ResultSet`] is created from the first page of a list query and
//! behaves like an indexable sequence over the *whole* result: its length is
//! the server's `total_count`, and records beyond the buffered page are
//! fetched one page at a time with `limit`/`offset` appended to the query URL.

use std::cell::RefCell;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use super::{ResourceKind, ResourceRecord};
use crate::error::MytardisError;

/// Pagination metadata of a list response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PageMeta {
    pub limit: usize,
    pub offset: usize,
    pub total_count: usize,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    meta: PageMeta,
    objects: Vec<Value>,
}

/// One list response: metadata plus decoded records.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub meta: PageMeta,
    pub records: Vec<ResourceRecord>,
}

impl Page {
    /// Decodes a `{"meta": {...}, "objects": [...]}` envelope.
    pub fn from_json(kind: ResourceKind, value: &Value, url: &str) -> Result<Self, MytardisError> {
        let envelope =
            Envelope::deserialize(value).map_err(|source| MytardisError::MalformedResponse {
                url: url.to_string(),
                source,
            })?;
        let records = envelope
            .objects
            .into_iter()
            .map(|object| ResourceRecord::from_json(kind, object, url))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            meta: envelope.meta,
            records,
        })
    }

    /// Decodes an envelope from raw response bytes.
    pub fn from_slice(kind: ResourceKind, data: &[u8], url: &str) -> Result<Self, MytardisError> {
        let value: Value =
            serde_json::from_slice(data).map_err(|source| MytardisError::MalformedResponse {
                url: url.to_string(),
                source,
            })?;
        Self::from_json(kind, &value, url)
    }

    fn record_at(&self, index: usize) -> Option<&ResourceRecord> {
        index
            .checked_sub(self.meta.offset)
            .and_then(|position| self.records.get(position))
    }
}

/// Where a [`ResultSet`] gets its further pages from.
pub trait PageSource {
    /// GETs `url` and returns the decoded JSON body.
    fn fetch_page(&self, url: &str) -> Result<Value, MytardisError>;
}

/// A possibly multi-page query result.
pub struct ResultSet<'a> {
    source: &'a dyn PageSource,
    kind: ResourceKind,
    url: String,
    first_json: Value,
    first: Page,
    buffered: RefCell<Page>,
}

impl<'a> ResultSet<'a> {
    /// Wraps the first page of a query.
    ///
    /// `url` is the query URL without `limit` and `offset`; further pages
    /// are requested from it through `source`.
    pub fn new(
        source: &'a dyn PageSource,
        kind: ResourceKind,
        url: impl Into<String>,
        first_json: Value,
    ) -> Result<Self, MytardisError> {
        let url = url.into();
        let first = Page::from_json(kind, &first_json, &url)?;
        Ok(Self {
            source,
            kind,
            url,
            first_json,
            buffered: RefCell::new(first.clone()),
            first,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The query URL, without pagination parameters.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The server-reported total, regardless of how much has been fetched.
    pub fn len(&self) -> usize {
        self.first.meta.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn limit(&self) -> usize {
        self.first.meta.limit
    }

    pub fn offset(&self) -> usize {
        self.first.meta.offset
    }

    /// The first page exactly as the server returned it.
    pub fn first_page_json(&self) -> &Value {
        &self.first_json
    }

    pub fn first_page_records(&self) -> &[ResourceRecord] {
        &self.first.records
    }

    /// The `index`-th record of the whole result, fetching its page if needed.
    pub fn get(&self, index: usize) -> Result<ResourceRecord, MytardisError> {
        if index >= self.len() {
            return Err(MytardisError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        if let Some(record) = self.buffered.borrow().record_at(index) {
            return Ok(record.clone());
        }

        let page = self.fetch_page_at(self.page_offset_for(index))?;
        let record = page.record_at(index).cloned().ok_or_else(|| {
            MytardisError::PaginationConsistency {
                url: self.url.clone(),
                detail: format!(
                    "page at offset {} with {} record(s) does not contain record {}",
                    page.meta.offset,
                    page.records.len(),
                    index
                ),
            }
        })?;
        *self.buffered.borrow_mut() = page;
        Ok(record)
    }

    /// Iterates over every record of the result, in order.
    ///
    /// Each call starts again from the first record.
    pub fn iter(&self) -> ResultSetIter<'_, 'a> {
        self.iter_from(0)
    }

    /// Iterates from absolute position `start` to the end of the result.
    pub fn iter_from(&self, start: usize) -> ResultSetIter<'_, 'a> {
        ResultSetIter {
            set: self,
            next: start,
        }
    }

    /// URL of the page starting at `offset`.
    pub fn page_url(&self, offset: usize) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}limit={}&offset={}",
            self.url,
            separator,
            self.page_size(),
            offset
        )
    }

    fn page_size(&self) -> usize {
        if self.first.meta.limit > 0 {
            self.first.meta.limit
        } else {
            // limit=0 asks the server for everything at once
            self.first.records.len().max(1)
        }
    }

    /// Start of the page containing `index`, on the first page's grid.
    fn page_offset_for(&self, index: usize) -> usize {
        let size = self.page_size() as i64;
        let first = self.first.meta.offset as i64;
        let aligned = first + (index as i64 - first).div_euclid(size) * size;
        aligned.max(0) as usize
    }

    fn fetch_page_at(&self, offset: usize) -> Result<Page, MytardisError> {
        let url = self.page_url(offset);
        log::debug!("fetching {} page at offset {}", self.kind, offset);
        let json = self.source.fetch_page(&url)?;
        let page = Page::from_json(self.kind, &json, &url)?;
        if page.meta.total_count != self.len() {
            return Err(MytardisError::PaginationConsistency {
                url,
                detail: format!(
                    "total_count was {}, page reported {}",
                    self.len(),
                    page.meta.total_count
                ),
            });
        }
        Ok(page)
    }
}

impl fmt::Debug for ResultSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("total_count", &self.len())
            .field("limit", &self.limit())
            .field("offset", &self.offset())
            .finish()
    }
}

impl<'r, 'a> IntoIterator for &'r ResultSet<'a> {
    type Item = Result<ResourceRecord, MytardisError>;
    type IntoIter = ResultSetIter<'r, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`ResultSet`]; stops after the first error.
pub struct ResultSetIter<'r, 'a> {
    set: &'r ResultSet<'a>,
    next: usize,
}

impl Iterator for ResultSetIter<'_, '_> {
    type Item = Result<ResourceRecord, MytardisError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.set.len() {
            return None;
        }
        let item = self.set.get(self.next);
        self.next = if item.is_ok() {
            self.next + 1
        } else {
            self.set.len()
        };
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.set.len().saturating_sub(self.next);
        (0, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;

    /// Serves pages of `total` synthetic records, `id == position`.
    struct Synthetic {
        total: usize,
        requested: RefCell<Vec<String>>,
    }

    fn page_json(total: usize, limit: usize, offset: usize) -> Value {
        let end = (offset + limit).min(total);
        let objects: Vec<Value> = (offset..end)
            .map(|i| json!({"id": i, "description": format!("record {i}")}))
            .collect();
        json!({
            "meta": {"limit": limit, "next": null, "offset": offset, "previous": null, "total_count": total},
            "objects": objects
        })
    }

    impl PageSource for Synthetic {
        fn fetch_page(&self, url: &str) -> Result<Value, MytardisError> {
            self.requested.borrow_mut().push(url.to_string());
            let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
            let param = |name: &str| {
                query
                    .split('&')
                    .find_map(|pair| pair.strip_prefix(&format!("{name}=")))
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0)
            };
            Ok(page_json(self.total, param("limit"), param("offset")))
        }
    }

    fn synthetic(total: usize) -> Synthetic {
        Synthetic {
            total,
            requested: RefCell::new(Vec::new()),
        }
    }

    const URL: &str = "https://h/api/v1/dataset/?format=json";

    #[test]
    fn len_does_not_fetch() {
        let source = synthetic(45);
        let set = ResultSet::new(&source, ResourceKind::Dataset, URL, page_json(45, 20, 0))
            .expect("result set");
        assert_eq!(set.len(), 45);
        assert_eq!(set.limit(), 20);
        assert!(source.requested.borrow().is_empty());
    }

    #[test]
    fn get_fetches_aligned_page() {
        let source = synthetic(45);
        let set = ResultSet::new(&source, ResourceKind::Dataset, URL, page_json(45, 20, 0))
            .expect("result set");
        assert_eq!(set.get(3).expect("buffered").id(), 3);
        assert_eq!(set.get(41).expect("third page").id(), 41);
        assert_eq!(
            source.requested.borrow().as_slice(),
            [format!("{URL}&limit=20&offset=40")]
        );
    }

    #[test]
    fn page_grid_follows_first_offset() {
        let source = synthetic(30);
        let set = ResultSet::new(&source, ResourceKind::Dataset, URL, page_json(30, 10, 5))
            .expect("result set");
        assert_eq!(set.get(2).expect("before first page").id(), 2);
        assert_eq!(set.get(17).expect("next page").id(), 17);
        assert_eq!(
            source.requested.borrow().as_slice(),
            [
                format!("{URL}&limit=10&offset=0"),
                format!("{URL}&limit=10&offset=15")
            ]
        );
    }

    #[test]
    fn iter_from_skips_earlier_pages() {
        let source = synthetic(30);
        let set = ResultSet::new(&source, ResourceKind::Dataset, URL, page_json(30, 10, 5))
            .expect("result set");
        let ids: Vec<i64> = set
            .iter_from(set.offset())
            .map(|r| r.expect("record").id())
            .collect();
        assert_eq!(ids, (5..30).collect::<Vec<_>>());
        assert_eq!(
            source.requested.borrow().as_slice(),
            [
                format!("{URL}&limit=10&offset=15"),
                format!("{URL}&limit=10&offset=25")
            ]
        );
    }

    #[test]
    fn out_of_range() {
        let source = synthetic(3);
        let set = ResultSet::new(&source, ResourceKind::Dataset, URL, page_json(3, 20, 0))
            .expect("result set");
        match set.get(3) {
            Err(MytardisError::OutOfRange { index: 3, len: 3 }) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn iteration_walks_all_pages_and_restarts() {
        let source = synthetic(25);
        let set = ResultSet::new(&source, ResourceKind::Dataset, URL, page_json(25, 10, 0))
            .expect("result set");
        let ids: Vec<i64> = set.iter().map(|r| r.expect("record").id()).collect();
        assert_eq!(ids, (0..25).collect::<Vec<_>>());
        assert_eq!(source.requested.borrow().len(), 2);

        let again = set.iter().count();
        assert_eq!(again, 25);
    }

    #[test]
    fn unbounded_limit_uses_page_length() {
        let source = synthetic(4);
        let first = json!({
            "meta": {"limit": 0, "next": null, "offset": 0, "previous": null, "total_count": 4},
            "objects": [{"id": 0}, {"id": 1}, {"id": 2}, {"id": 3}]
        });
        let set = ResultSet::new(&source, ResourceKind::Dataset, URL, first).expect("result set");
        assert_eq!(set.iter().count(), 4);
        assert!(source.requested.borrow().is_empty());
        assert_eq!(set.page_url(4), format!("{URL}&limit=4&offset=4"));
    }

    #[test]
    fn missing_meta_is_malformed() {
        let source = synthetic(0);
        let err = ResultSet::new(&source, ResourceKind::Dataset, URL, json!({"objects": []}))
            .expect_err("should fail");
        assert!(matches!(err, MytardisError::MalformedResponse { .. }));
    }

    #[test]
    fn page_from_slice_rejects_garbage() {
        let err = Page::from_slice(ResourceKind::Dataset, b"{not json", URL).expect_err("garbage");
        assert!(matches!(err, MytardisError::MalformedResponse { .. }));
    }
}
