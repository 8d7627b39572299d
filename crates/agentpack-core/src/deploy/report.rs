//! Progress signalling and final result records for apply/clear runs.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::EntityKind;

/// Number of stages in both apply and clear runs.
pub const STAGE_COUNT: usize = 9;

/// Receives one signal per stage, before the stage runs.
pub trait ProgressReporter {
    /// `fraction` is `stage_index / 9` with `stage_index` starting at 1.
    fn report(&mut self, label: &str, fraction: f64);
}

impl<F: FnMut(&str, f64)> ProgressReporter for F {
    fn report(&mut self, label: &str, fraction: f64) {
        self(label, fraction)
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _label: &str, _fraction: f64) {}
}

/// Emits progress as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&mut self, label: &str, fraction: f64) {
        tracing::info!(stage = label, fraction, "stage started");
    }
}

pub(crate) fn stage_fraction(stage_index: usize) -> f64 {
    stage_index as f64 / STAGE_COUNT as f64
}

/// Per-type counts. Every entity type is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counts {
    by_kind: BTreeMap<EntityKind, usize>,
}

impl Default for Counts {
    fn default() -> Self {
        Self {
            by_kind: EntityKind::APPLY_ORDER
                .into_iter()
                .map(|kind| (kind, 0))
                .collect(),
        }
    }
}

impl Counts {
    pub fn get(&self, kind: EntityKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub fn add(&mut self, kind: EntityKind, amount: usize) {
        *self.by_kind.entry(kind).or_insert(0) += amount;
    }

    /// Look up a count by store table name.
    pub fn by_table(&self, table: &str) -> Option<usize> {
        EntityKind::from_table(table).map(|kind| self.get(kind))
    }

    pub fn total(&self) -> usize {
        self.by_kind.values().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    /// Counts in apply order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, usize)> + '_ {
        self.by_kind.iter().map(|(kind, count)| (*kind, *count))
    }
}

impl Serialize for Counts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.by_kind.len()))?;
        for (kind, count) in &self.by_kind {
            map.serialize_entry(kind.table(), count)?;
        }
        map.end()
    }
}

/// Outcome of applying a pack to a tenant.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub success: bool,
    pub tenant_id: String,
    pub pack_key: String,
    pub counts: Counts,
    pub errors: Vec<String>,
}

/// Outcome of clearing a tenant.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResult {
    pub success: bool,
    pub tenant_id: String,
    pub counts: Counts,
    pub errors: Vec<String>,
}

/// Format the single error entry of a fatally terminated run.
pub(crate) fn fatal_message(message: impl std::fmt::Display) -> String {
    format!("Fatal: {}", message)
}
