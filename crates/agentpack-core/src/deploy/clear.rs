//! Clear engine: soft-deletes everything a tenant has deployed.
//!
//! Tables are walked in reverse dependency order. Each live row is marked
//! with a `deleted_at` timestamp through an individual update; row-level
//! failures are logged and skipped.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::report::{ClearResult, Counts, ProgressReporter, fatal_message, stage_fraction};
use crate::store::{DELETED_AT, EntityStore, Filter, ID, StoreError, TENANT_ID};
use crate::types::EntityKind;

/// Soft-deletes every entity belonging to a tenant.
#[derive(Debug)]
pub struct ClearEngine<'a, S: EntityStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: EntityStore + ?Sized> ClearEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn clear(&self, tenant_id: &str, progress: &mut dyn ProgressReporter) -> ClearResult {
        tracing::info!(tenant = tenant_id, "clearing tenant");

        let mut counts = Counts::default();
        let mut errors = Vec::new();

        for (index, kind) in EntityKind::CLEAR_ORDER.into_iter().enumerate() {
            progress.report(&format!("Clearing {}", kind.plural()), stage_fraction(index + 1));

            let mut cleared = 0;
            let finished = if kind.is_tenant_scoped() {
                self.clear_tenant_table(kind, tenant_id, &mut cleared, &mut errors)
                    .await
            } else {
                self.clear_agent_states(tenant_id, &mut cleared, &mut errors)
                    .await
            };
            counts.add(kind, cleared);

            match finished {
                Ok(()) => {
                    tracing::info!(table = kind.table(), cleared, "table cleared");
                }
                Err(err) => {
                    tracing::error!(tenant = tenant_id, error = %err, "clear aborted");
                    return ClearResult {
                        success: false,
                        tenant_id: tenant_id.to_string(),
                        counts,
                        errors: vec![fatal_message(err)],
                    };
                }
            }
        }

        ClearResult {
            success: errors.is_empty(),
            tenant_id: tenant_id.to_string(),
            counts,
            errors,
        }
    }

    async fn clear_tenant_table(
        &self,
        kind: EntityKind,
        tenant_id: &str,
        cleared: &mut usize,
        errors: &mut Vec<String>,
    ) -> Result<(), StoreError> {
        let filters = [
            Filter::equals(TENANT_ID, tenant_id),
            Filter::is_null(DELETED_AT),
        ];
        self.soft_delete_matching(kind.table(), &filters, cleared, errors)
            .await
    }

    /// Agent states carry no tenant column; reach them through the tenant's agents.
    async fn clear_agent_states(
        &self,
        tenant_id: &str,
        cleared: &mut usize,
        errors: &mut Vec<String>,
    ) -> Result<(), StoreError> {
        let agent_filters = [
            Filter::equals(TENANT_ID, tenant_id),
            Filter::is_null(DELETED_AT),
        ];
        let agents = match self
            .store
            .list(EntityKind::Agent.table(), &agent_filters)
            .await
        {
            Ok(agents) => agents,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "failed to list agents for agent states");
                errors.push(format!("{}: {}", EntityKind::AgentState.table(), err));
                return Ok(());
            }
        };

        for agent_id in agents.iter().filter_map(|agent| agent.id()) {
            let filters = [
                Filter::equals("agent_id", agent_id.to_value()),
                Filter::is_null(DELETED_AT),
            ];
            self.soft_delete_matching(EntityKind::AgentState.table(), &filters, cleared, errors)
                .await?;
        }
        Ok(())
    }

    /// List rows matching `filters` and soft-delete each one, counting into `deleted`.
    ///
    /// A failed listing is recorded in `errors`; failed row updates are only
    /// logged. Fatal store errors propagate after the rows deleted so far
    /// have been counted.
    async fn soft_delete_matching(
        &self,
        table: &str,
        filters: &[Filter],
        deleted: &mut usize,
        errors: &mut Vec<String>,
    ) -> Result<(), StoreError> {
        let rows = match self.store.list(table, filters).await {
            Ok(rows) => rows,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                tracing::warn!(table, error = %err, "failed to list rows");
                errors.push(format!("{}: {}", table, err));
                return Ok(());
            }
        };

        for row in rows {
            let Some(id) = row.id() else {
                tracing::debug!(table, "skipping row without id");
                continue;
            };

            let mut fields = Map::new();
            fields.insert(ID.to_string(), id.to_value());
            fields.insert(
                DELETED_AT.to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            );

            match self.store.update(table, fields).await {
                Ok(_) => *deleted += 1,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    tracing::warn!(table, %id, error = %err, "failed to soft-delete row");
                }
            }
        }
        Ok(())
    }
}
