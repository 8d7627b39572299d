//! In-memory Entity Store used for dry runs and tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{EntityStore, Filter, ID, Record, RecordId, StoreError};

#[derive(Debug, Default)]
struct Tables {
    next_id: u64,
    rows: BTreeMap<String, Vec<Record>>,
}

/// Process-local store with sequential ids shared across tables.
///
/// Rows are never physically removed; soft-deleted rows stay visible to
/// `list` unless the caller filters on `deleted_at`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Config("memory store lock poisoned".to_string()))
    }

    /// Snapshot of every row in `table`, including soft-deleted ones.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.lock()
            .map(|tables| tables.rows.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Rows in `table` without a soft-delete timestamp.
    pub fn live_rows(&self, table: &str) -> Vec<Record> {
        self.rows(table)
            .into_iter()
            .filter(|row| !row.is_deleted())
            .collect()
    }

    /// Insert a row verbatim, keeping any id it already carries.
    pub fn seed(&self, table: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        let mut tables = self.lock()?;
        let mut record = Record::new(fields);
        if record.id().is_none() {
            tables.next_id += 1;
            let id = tables.next_id.to_string();
            record.fields.insert(ID.to_string(), Value::String(id));
        }
        tables
            .rows
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create(&self, table: &str, mut fields: Map<String, Value>) -> Result<Record, StoreError> {
        fields.remove(ID);
        self.seed(table, fields)
    }

    async fn list(&self, table: &str, filters: &[Filter]) -> Result<Vec<Record>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .rows
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filters.iter().all(|filter| filter.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update(&self, table: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        let id = fields
            .get(ID)
            .and_then(RecordId::from_value)
            .ok_or_else(|| StoreError::Rejected {
                status: 400,
                message: format!("update on '{}' requires an id", table),
            })?;

        let mut tables = self.lock()?;
        let row = tables
            .rows
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| row.id().as_ref() == Some(&id)))
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;

        for (key, value) in fields {
            if key != ID {
                row.fields.insert(key, value);
            }
        }
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DELETED_AT, TENANT_ID};
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let first = store.create("agents", fields(json!({"name": "a"}))).await.unwrap();
        let second = store
            .create("automations", fields(json!({"id": "ignored"})))
            .await
            .unwrap();

        assert_eq!(first.id(), Some(RecordId::new("1")));
        assert_eq!(second.id(), Some(RecordId::new("2")));
    }

    #[tokio::test]
    async fn test_list_applies_all_filters() {
        let store = MemoryStore::new();
        store
            .create("agents", fields(json!({TENANT_ID: "t1"})))
            .await
            .unwrap();
        store
            .create("agents", fields(json!({TENANT_ID: "t2"})))
            .await
            .unwrap();
        store
            .create("agents", fields(json!({TENANT_ID: "t1", DELETED_AT: "2024-01-01T00:00:00Z"})))
            .await
            .unwrap();

        let rows = store
            .list(
                "agents",
                &[Filter::equals(TENANT_ID, "t1"), Filter::is_null(DELETED_AT)],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id(), Some(RecordId::new("1")));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let row = store.create("agents", fields(json!({"name": "a"}))).await.unwrap();
        let id = row.id().unwrap();

        let updated = store
            .update("agents", fields(json!({"id": id.as_str(), DELETED_AT: "now"})))
            .await
            .unwrap();

        assert!(updated.is_deleted());
        assert_eq!(updated.get("name"), Some(&json!("a")));
        assert!(store.live_rows("agents").is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_row_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update("agents", fields(json!({"id": "42"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
