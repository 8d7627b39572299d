//! Entity Store boundary
//!
//! The engines talk to persisted state only through [`EntityStore`], a
//! generic create/list/update service keyed by table name.

pub mod http;
pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use http::HttpStore;
pub use memory::MemoryStore;

/// Column holding the soft-delete timestamp.
pub const DELETED_AT: &str = "deleted_at";

/// Column holding the store-assigned identifier.
pub const ID: &str = "id";

/// Column scoping rows to a tenant.
pub const TENANT_ID: &str = "tenant_id";

/// Errors surfaced by an [`EntityStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store refused the request.
    #[error("store rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Credentials were missing or refused.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The response body could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A created record came back without an identifier.
    #[error("record in table '{0}' has no id")]
    MissingId(String),

    /// An update targeted a row that does not exist.
    #[error("no row with id '{id}' in table '{table}'")]
    NotFound { table: String, id: String },

    /// The client itself is misconfigured.
    #[error("store configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Fatal errors abort a whole apply/clear run instead of one entity.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Unauthorized(_) | StoreError::Config(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            StoreError::Config(err.to_string())
        } else if err.is_decode() {
            StoreError::InvalidResponse(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

/// Store-assigned identifier. Numeric ids are normalized to their decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret a JSON value as an id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row returned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn id(&self) -> Option<RecordId> {
        self.fields.get(ID).and_then(RecordId::from_value)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Whether the row carries a soft-delete timestamp.
    pub fn is_deleted(&self) -> bool {
        !matches!(self.fields.get(DELETED_AT), None | Some(Value::Null))
    }
}

/// Equality filter for [`EntityStore::list`].
///
/// A `null` value matches rows where the field is missing or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: Value::Null,
        }
    }

    /// Evaluate the filter against a row.
    pub fn matches(&self, record: &Record) -> bool {
        match (&self.value, record.get(&self.field)) {
            (Value::Null, None | Some(Value::Null)) => true,
            (_, None) => false,
            (expected, Some(actual)) => values_equal(expected, actual),
        }
    }
}

/// Ids may round-trip as numbers or strings; compare them loosely.
fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            n.to_string() == *s
        }
        _ => expected == actual,
    }
}

/// Generic remote CRUD service.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Insert a row, returning it with its assigned id.
    async fn create(&self, table: &str, fields: Map<String, Value>) -> Result<Record, StoreError>;

    /// List rows matching every filter.
    async fn list(&self, table: &str, filters: &[Filter]) -> Result<Vec<Record>, StoreError>;

    /// Update the row identified by `fields["id"]`.
    async fn update(&self, table: &str, fields: Map<String, Value>) -> Result<Record, StoreError>;
}
