use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MytardisError;

/// One entry of the API root listing (`/api/v1/?format=json`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    /// Resource name, the key in the root listing, e.g. `dataset_file`.
    #[serde(skip)]
    pub model: String,
    pub list_endpoint: String,
    pub schema: String,
}

impl ApiEndpoint {
    /// The entry as the server returned it, without the model key.
    pub fn response_dict(&self) -> Value {
        serde_json::json!({
            "list_endpoint": self.list_endpoint,
            "schema": self.schema,
        })
    }
}

/// The API root listing: decoded endpoints plus the raw response.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiEndpoints {
    pub endpoints: Vec<ApiEndpoint>,
    pub json: Value,
}

impl ApiEndpoints {
    pub fn from_json(json: Value, url: &str) -> Result<Self, MytardisError> {
        let Value::Object(entries) = &json else {
            return Err(MytardisError::UnexpectedResponse {
                url: url.to_string(),
                message: "expected an object mapping resource names to endpoints".to_string(),
            });
        };

        let mut endpoints = Vec::with_capacity(entries.len());
        for (model, entry) in entries {
            let mut endpoint = ApiEndpoint::deserialize(entry).map_err(|source| {
                MytardisError::MalformedResponse {
                    url: url.to_string(),
                    source,
                }
            })?;
            endpoint.model = model.clone();
            endpoints.push(endpoint);
        }

        Ok(Self { endpoints, json })
    }
}
