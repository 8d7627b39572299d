//! Apply engine: materializes a template pack into the Entity Store.
//!
//! Stages run in dependency order. Each stage folds over its spec collection
//! into a [`StageOutcome`], which is merged into the run's [`Ledger`] before
//! the next stage starts, so later stages resolve references against every
//! id created so far.

use serde_json::Value;

use super::refmap::RefMap;
use super::report::{
    Counts, DeploymentResult, ProgressReporter, fatal_message, stage_fraction,
};
use crate::pack::{EntitySpec, Fields, TemplatePack};
use crate::store::{EntityStore, RecordId, StoreError, TENANT_ID};
use crate::types::EntityKind;

/// A store failure that ends the whole run.
#[derive(Debug)]
struct Fatal(StoreError);

/// Result of processing one stage's collection.
#[derive(Debug, Default)]
struct StageOutcome {
    created: usize,
    refs: Vec<(String, RecordId)>,
    errors: Vec<String>,
}

/// Accumulators threaded through the stages of one run.
#[derive(Debug, Default)]
struct Ledger {
    refs: RefMap,
    counts: Counts,
    errors: Vec<String>,
}

impl Ledger {
    fn merge(&mut self, kind: EntityKind, outcome: StageOutcome) {
        self.counts.add(kind, outcome.created);
        for (ref_key, id) in outcome.refs {
            self.refs.insert(kind, ref_key, id);
        }
        self.errors.extend(outcome.errors);
    }
}

/// Why a spec was not submitted to the store.
#[derive(Debug, PartialEq, Eq)]
struct Unresolved {
    field: &'static str,
}

/// Creates every entity of a pack for one tenant.
#[derive(Debug)]
pub struct ApplyEngine<'a, S: EntityStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: EntityStore + ?Sized> ApplyEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Apply `pack` to `tenant_id`.
    ///
    /// Per-entity failures are collected into the result; only a fatal store
    /// error stops the run early. The pack is not validated here.
    pub async fn apply(
        &self,
        pack: &TemplatePack,
        tenant_id: &str,
        progress: &mut dyn ProgressReporter,
    ) -> DeploymentResult {
        tracing::info!(
            tenant = tenant_id,
            pack = %pack.metadata.key,
            specs = pack.total_specs(),
            "applying template pack"
        );

        let mut ledger = Ledger::default();
        let outcome = self
            .run_stages(pack, tenant_id, progress, &mut ledger)
            .await;

        let (success, errors) = match outcome {
            Ok(()) => (ledger.errors.is_empty(), ledger.errors),
            Err(Fatal(err)) => {
                tracing::error!(tenant = tenant_id, error = %err, "apply aborted");
                (false, vec![fatal_message(err)])
            }
        };

        tracing::info!(
            tenant = tenant_id,
            created = ledger.counts.total(),
            errors = errors.len(),
            "apply finished"
        );

        DeploymentResult {
            success,
            tenant_id: tenant_id.to_string(),
            pack_key: pack.metadata.key.clone(),
            counts: ledger.counts,
            errors,
        }
    }

    async fn run_stages(
        &self,
        pack: &TemplatePack,
        tenant_id: &str,
        progress: &mut dyn ProgressReporter,
        ledger: &mut Ledger,
    ) -> Result<(), Fatal> {
        self.stage(1, &pack.agents, tenant_id, progress, ledger).await?;
        self.stage(2, &pack.playbooks, tenant_id, progress, ledger).await?;
        self.stage(3, &pack.playbook_rules, tenant_id, progress, ledger).await?;
        self.stage(4, &pack.playbook_tables, tenant_id, progress, ledger).await?;
        self.stage(5, &pack.agent_states, tenant_id, progress, ledger).await?;
        self.stage(6, &pack.agent_state_steps, tenant_id, progress, ledger).await?;
        self.stage(7, &pack.channel_bindings, tenant_id, progress, ledger).await?;
        self.stage(8, &pack.handoff_policies, tenant_id, progress, ledger).await?;
        self.stage(9, &pack.automations, tenant_id, progress, ledger).await?;
        Ok(())
    }

    async fn stage<T: EntitySpec + Sync>(
        &self,
        index: usize,
        specs: &[T],
        tenant_id: &str,
        progress: &mut dyn ProgressReporter,
        ledger: &mut Ledger,
    ) -> Result<(), Fatal> {
        progress.report(&format!("Creating {}", T::KIND.plural()), stage_fraction(index));

        // Merged even when the stage stops early, so partial creates are counted.
        let mut outcome = StageOutcome::default();
        let finished = self
            .run_stage(specs, tenant_id, &ledger.refs, &mut outcome)
            .await;
        tracing::info!(
            stage = index,
            table = T::KIND.table(),
            created = outcome.created,
            skipped_or_failed = outcome.errors.len(),
            "stage complete"
        );
        ledger.merge(T::KIND, outcome);
        finished
    }

    /// Fold one collection into `outcome`.
    ///
    /// Specs within a stage never reference each other, so `refs` is read-only here.
    async fn run_stage<T: EntitySpec + Sync>(
        &self,
        specs: &[T],
        tenant_id: &str,
        refs: &RefMap,
        outcome: &mut StageOutcome,
    ) -> Result<(), Fatal> {
        for spec in specs {
            let fields = match resolve_fields(spec, tenant_id, refs) {
                Ok(fields) => fields,
                Err(unresolved) => {
                    let message = format!("{}: {} not resolved", spec.describe(), unresolved.field);
                    tracing::warn!(table = T::KIND.table(), "{}", message);
                    outcome.errors.push(message);
                    continue;
                }
            };

            let created = self
                .store
                .create(T::KIND.table(), fields)
                .await
                .and_then(|record| {
                    record
                        .id()
                        .ok_or_else(|| StoreError::MissingId(T::KIND.table().to_string()))
                });

            match created {
                Ok(id) => {
                    tracing::debug!(table = T::KIND.table(), spec = %spec.describe(), %id, "created");
                    if let Some(ref_key) = spec.ref_key() {
                        outcome.refs.push((ref_key.to_string(), id));
                    }
                    outcome.created += 1;
                }
                Err(err) if err.is_fatal() => return Err(Fatal(err)),
                Err(err) => {
                    let message = format!("{} {}: {}", T::KIND.label(), spec.describe(), err);
                    tracing::warn!(table = T::KIND.table(), "{}", message);
                    outcome.errors.push(message);
                }
            }
        }

        Ok(())
    }
}

/// Build the store fields for a spec, resolving its references.
///
/// A missing required reference yields [`Unresolved`] for the first such
/// field; a missing optional reference is written as `null`.
fn resolve_fields<T: EntitySpec>(
    spec: &T,
    tenant_id: &str,
    refs: &RefMap,
) -> Result<Fields, Unresolved> {
    let mut fields = spec.base_fields();
    if T::KIND.is_tenant_scoped() {
        fields.insert(TENANT_ID.to_string(), Value::String(tenant_id.to_string()));
    }

    for reference in spec.references() {
        match refs.get(reference.target, reference.key) {
            Some(id) => {
                fields.insert(reference.column.to_string(), id.to_value());
            }
            None if reference.required => {
                return Err(Unresolved {
                    field: reference.field,
                });
            }
            None => {
                fields.insert(reference.column.to_string(), Value::Null);
            }
        }
    }

    Ok(fields)
}
