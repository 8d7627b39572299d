//! HTTP Entity Store client
//!
//! Talks to a generic CRUD endpoint: `POST {base}/{table}/{operation}` with a
//! JSON body. Response shapes vary between deployments, so bodies are
//! normalized before records are extracted.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use url::Url;

use super::{EntityStore, Filter, Record, StoreError};

const USER_AGENT: &str = concat!("agentpack/", env!("CARGO_PKG_VERSION"));

/// Entity Store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpStore {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, StoreError> {
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "store url cannot be used as a base: {}",
                base_url
            )));
        }
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the endpoint URL for one operation on one table.
    pub fn endpoint(&self, table: &str, operation: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Config(format!("invalid store url: {}", self.base_url)))?
            .pop_if_empty()
            .push(table)
            .push(operation);
        Ok(url)
    }

    async fn post(&self, table: &str, operation: &str, body: Value) -> Result<Value, StoreError> {
        let url = self.endpoint(table, operation)?;
        tracing::debug!(%url, "store request");

        let mut request = self.client.post(url.clone()).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Unauthorized(format!("HTTP {}: {}", status.as_u16(), text)));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            StoreError::InvalidResponse(format!("failed to parse response from {}: {}", url, e))
        })
    }
}

#[async_trait]
impl EntityStore for HttpStore {
    async fn create(&self, table: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        let body = self.post(table, "create", json!({ "fields": fields })).await?;
        let record = normalize_record(body)?;
        if record.id().is_none() {
            return Err(StoreError::MissingId(table.to_string()));
        }
        Ok(record)
    }

    async fn list(&self, table: &str, filters: &[Filter]) -> Result<Vec<Record>, StoreError> {
        let body = self.post(table, "list", json!({ "filters": filters })).await?;
        normalize_records(body)
    }

    async fn update(&self, table: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        let body = self.post(table, "update", json!({ "fields": fields })).await?;
        normalize_record(body)
    }
}

/// Strip known envelope keys. Objects carrying an `id` are records already.
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(map) if map.contains_key(super::ID) => Value::Object(map),
        Value::Object(mut map) => {
            for key in ["data", "record", "records", "rows", "result"] {
                if let Some(inner) = map.remove(key) {
                    return unwrap_envelope(inner);
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Extract a single record from a response body.
pub(crate) fn normalize_record(body: Value) -> Result<Record, StoreError> {
    match unwrap_envelope(body) {
        Value::Object(fields) => Ok(Record::new(fields)),
        Value::Array(items) => match items.into_iter().next() {
            Some(Value::Object(fields)) => Ok(Record::new(fields)),
            _ => Err(StoreError::InvalidResponse(
                "expected a record, got an empty list".to_string(),
            )),
        },
        other => Err(StoreError::InvalidResponse(format!(
            "expected a record, got {}",
            type_name(&other)
        ))),
    }
}

/// Extract a record list from a response body.
pub(crate) fn normalize_records(body: Value) -> Result<Vec<Record>, StoreError> {
    match unwrap_envelope(body) {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(fields) => Ok(Record::new(fields)),
                other => Err(StoreError::InvalidResponse(format!(
                    "expected list items to be objects, got {}",
                    type_name(&other)
                ))),
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        Value::Object(fields) if fields.contains_key(super::ID) => Ok(vec![Record::new(fields)]),
        Value::Object(fields) => Err(StoreError::InvalidResponse(format!(
            "expected a record list, got an object with keys [{}]",
            fields.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
        ))),
        other => Err(StoreError::InvalidResponse(format!(
            "expected a record list, got {}",
            type_name(&other)
        ))),
    }
}

/// Prefer a JSON `message`/`error` field over the raw body.
fn error_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| {
            ["message", "error"].iter().find_map(|key| {
                value
                    .get(*key)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            })
        })
        .unwrap_or_else(|| text.trim().to_string())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
