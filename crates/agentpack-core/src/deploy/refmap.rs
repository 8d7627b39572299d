//! Symbolic reference resolution for one apply run.

use std::collections::HashMap;

use crate::store::RecordId;
use crate::types::EntityKind;

/// Maps pack-local `ref_key`s to store-assigned ids, per entity kind.
///
/// Entries are only ever added during a run.
#[derive(Debug, Clone, Default)]
pub struct RefMap {
    entries: HashMap<EntityKind, HashMap<String, RecordId>>,
}

impl RefMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: EntityKind, ref_key: impl Into<String>, id: RecordId) {
        self.entries
            .entry(kind)
            .or_default()
            .insert(ref_key.into(), id);
    }

    pub fn get(&self, kind: EntityKind, ref_key: &str) -> Option<&RecordId> {
        self.entries.get(&kind).and_then(|keys| keys.get(ref_key))
    }

    pub fn contains(&self, kind: EntityKind, ref_key: &str) -> bool {
        self.get(kind, ref_key).is_some()
    }

    /// Number of resolved keys for `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.entries.get(&kind).map(HashMap::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(HashMap::is_empty)
    }
}
