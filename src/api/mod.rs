//! Access to the MyTardis REST API.
//!
//! [`Client`] is the HTTP accessor: it attaches the configured headers to
//! every request, turns non-2xx responses into [`MytardisError::ApiRequest`]
//! and decodes JSON bodies. [`ResourceClient`] is the list/get/create/update
//! surface shared by every [`ResourceKind`].

pub mod cache;
mod query;
pub mod transport;

pub use cache::{CachedTransport, ResponseCache};
pub use query::{parse_filter, ListQuery};
pub use transport::{HttpRequest, HttpResponse, Method, Transport, UreqTransport};

use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::MytardisError;
use crate::model::{ApiEndpoints, PageSource, ResourceKind, ResourceRecord, ResultSet};

/// list/get/create/update over any resource kind.
pub trait ResourceClient {
    /// Runs a list query and wraps its first page in a [`ResultSet`].
    fn list(&self, kind: ResourceKind, query: &ListQuery) -> Result<ResultSet<'_>, MytardisError>;

    /// Fetches one record; a 404 is [`MytardisError::NotFound`].
    fn get(&self, kind: ResourceKind, id: i64) -> Result<ResourceRecord, MytardisError>;

    /// POSTs a new record and returns it as echoed by the server.
    fn create(
        &self,
        kind: ResourceKind,
        fields: Map<String, Value>,
    ) -> Result<ResourceRecord, MytardisError>;

    /// PATCHes the given fields and returns the updated record.
    fn update(
        &self,
        kind: ResourceKind,
        id: i64,
        fields: Map<String, Value>,
    ) -> Result<ResourceRecord, MytardisError>;
}

/// HTTP accessor bound to one validated [`Config`].
pub struct Client<'c, T> {
    config: &'c Config,
    transport: T,
}

impl<'c, T: Transport> Client<'c, T> {
    /// Validates `config`; no request is possible with an invalid one.
    pub fn new(config: &'c Config, transport: T) -> Result<Self, MytardisError> {
        config.validate()?;
        log::debug!(
            "MyTardis server {} as {}",
            config.hostname().unwrap_or_default(),
            config.username
        );
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn resource_url(&self, kind: ResourceKind) -> String {
        format!("{}/api/v1/{}/", self.config.api_base(), kind.path())
    }

    fn record_url(&self, kind: ResourceKind, id: i64) -> String {
        format!("{}/api/v1/{}/{}/", self.config.api_base(), kind.path(), id)
    }

    fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value, MytardisError> {
        let request = HttpRequest {
            method,
            url: url.to_string(),
            headers: self.config.default_headers(),
            body: body.map(Value::to_string),
        };
        let response = self.transport.send(&request)?;
        if !response.is_success() {
            log::debug!("{} {} failed with {}", method, url, response.status);
            return Err(MytardisError::ApiRequest {
                status: response.status,
                url: url.to_string(),
                body: response.body,
            });
        }
        serde_json::from_str(&response.body).map_err(|source| MytardisError::MalformedResponse {
            url: url.to_string(),
            source,
        })
    }

    /// GETs `url` and decodes the JSON body.
    pub fn get_json(&self, url: &str) -> Result<Value, MytardisError> {
        self.send(Method::Get, url, None)
    }

    /// Lists the resources the server exposes (`/api/v1/?format=json`).
    pub fn list_api_endpoints(&self) -> Result<ApiEndpoints, MytardisError> {
        let url = format!("{}/api/v1/?format=json", self.config.api_base());
        let json = self.get_json(&url)?;
        ApiEndpoints::from_json(json, &url)
    }
}

impl<T: Transport> PageSource for Client<'_, T> {
    fn fetch_page(&self, url: &str) -> Result<Value, MytardisError> {
        self.get_json(url)
    }
}

impl<T: Transport> ResourceClient for Client<'_, T> {
    fn list(&self, kind: ResourceKind, query: &ListQuery) -> Result<ResultSet<'_>, MytardisError> {
        let api_base = self.config.api_base();
        let url = query.request_url(api_base, kind);
        let first = self.get_json(&url)?;
        ResultSet::new(self, kind, query.base_url(api_base, kind), first)
    }

    fn get(&self, kind: ResourceKind, id: i64) -> Result<ResourceRecord, MytardisError> {
        let url = format!("{}?format=json", self.record_url(kind, id));
        let json = self.get_json(&url).map_err(|err| match err {
            MytardisError::ApiRequest {
                status: 404,
                url,
                body,
            } => MytardisError::NotFound { url, body },
            other => other,
        })?;
        ResourceRecord::from_json(kind, json, &url)
    }

    fn create(
        &self,
        kind: ResourceKind,
        fields: Map<String, Value>,
    ) -> Result<ResourceRecord, MytardisError> {
        let url = self.resource_url(kind);
        let json = self.send(Method::Post, &url, Some(&Value::Object(fields)))?;
        log::info!("created {} at {}", kind, url);
        ResourceRecord::from_json(kind, json, &url)
    }

    fn update(
        &self,
        kind: ResourceKind,
        id: i64,
        fields: Map<String, Value>,
    ) -> Result<ResourceRecord, MytardisError> {
        let url = self.record_url(kind, id);
        let json = self.send(Method::Patch, &url, Some(&Value::Object(fields)))?;
        log::info!("updated {} {}", kind, id);
        ResourceRecord::from_json(kind, json, &url)
    }
}
