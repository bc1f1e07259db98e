//! List query construction.

use url::form_urlencoded::byte_serialize;

use crate::model::ResourceKind;

/// Filters and pagination for a `list` call.
///
/// ```
/// use mytardis::api::ListQuery;
/// use mytardis::model::ResourceKind;
///
/// let query = ListQuery::new().filter("dataset__id", "1").limit(50);
/// assert_eq!(
///     query.request_url("https://mytardis.example.com", ResourceKind::DataFile),
///     "https://mytardis.example.com/api/v1/dataset_file/?format=json&dataset__id=1&limit=50"
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// `field=value` terms, sent in this order.
    pub filters: Vec<(String, String)>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub order_by: Option<String>,
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    fn prefix(&self, api_base: &str, kind: ResourceKind) -> String {
        let mut url = format!("{}/api/v1/{}/?format=json", api_base, kind.path());
        for (field, value) in &self.filters {
            url.push('&');
            url.push_str(&encode(field));
            url.push('=');
            url.push_str(&encode(value));
        }
        url
    }

    fn push_order_by(&self, url: &mut String) {
        if let Some(order_by) = &self.order_by {
            url.push_str("&order_by=");
            url.push_str(&encode(order_by));
        }
    }

    /// The URL of the first request, including `limit` and `offset`.
    pub fn request_url(&self, api_base: &str, kind: ResourceKind) -> String {
        let mut url = self.prefix(api_base, kind);
        if let Some(limit) = self.limit {
            url.push_str(&format!("&limit={limit}"));
        }
        if let Some(offset) = self.offset {
            url.push_str(&format!("&offset={offset}"));
        }
        self.push_order_by(&mut url);
        url
    }

    /// The query URL without pagination, used for further pages and display.
    pub fn base_url(&self, api_base: &str, kind: ResourceKind) -> String {
        let mut url = self.prefix(api_base, kind);
        self.push_order_by(&mut url);
        url
    }
}

/// Parses a `field=value` filter term.
pub fn parse_filter(term: &str) -> Result<(String, String), String> {
    match term.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got '{term}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://mytardis.example.com";

    #[test]
    fn single_filter_appears_exactly_once() {
        let url = ListQuery::new()
            .filter("dataset__id", "1")
            .request_url(BASE, ResourceKind::DataFile);
        assert_eq!(
            url,
            "https://mytardis.example.com/api/v1/dataset_file/?format=json&dataset__id=1"
        );
        assert_eq!(url.matches('&').count(), 1);
    }

    #[test]
    fn pagination_and_ordering_follow_filters() {
        let query = ListQuery::new()
            .filter("experiments__id", "4")
            .filter("description", "raw data")
            .limit(10)
            .offset(20)
            .order_by("-id");
        assert_eq!(
            query.request_url(BASE, ResourceKind::Dataset),
            "https://mytardis.example.com/api/v1/dataset/?format=json&experiments__id=4&description=raw+data&limit=10&offset=20&order_by=-id"
        );
        assert_eq!(
            query.base_url(BASE, ResourceKind::Dataset),
            "https://mytardis.example.com/api/v1/dataset/?format=json&experiments__id=4&description=raw+data&order_by=-id"
        );
    }

    #[test]
    fn values_are_percent_encoded() {
        let url = ListQuery::new()
            .filter("filename", "a&b=c.txt")
            .request_url(BASE, ResourceKind::DataFile);
        assert!(url.ends_with("&filename=a%26b%3Dc.txt"));
    }

    #[test]
    fn filter_terms() {
        assert_eq!(
            parse_filter("dataset__id=1"),
            Ok(("dataset__id".to_string(), "1".to_string()))
        );
        assert_eq!(
            parse_filter("directory="),
            Ok(("directory".to_string(), String::new()))
        );
        assert!(parse_filter("no-equals").is_err());
        assert!(parse_filter("=value").is_err());
    }
}
