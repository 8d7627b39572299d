//! Shared core types used across the pack, store and deploy layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The nine entity types a template pack can declare.
///
/// Variants are listed in apply order; each parent precedes its dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Agent,
    Playbook,
    PlaybookRule,
    PlaybookTable,
    AgentState,
    AgentStateStep,
    ChannelBinding,
    HandoffPolicy,
    Automation,
}

impl EntityKind {
    /// All kinds in apply (dependency) order.
    pub const APPLY_ORDER: [EntityKind; 9] = [
        EntityKind::Agent,
        EntityKind::Playbook,
        EntityKind::PlaybookRule,
        EntityKind::PlaybookTable,
        EntityKind::AgentState,
        EntityKind::AgentStateStep,
        EntityKind::ChannelBinding,
        EntityKind::HandoffPolicy,
        EntityKind::Automation,
    ];

    /// All kinds in teardown order (reverse of apply order).
    pub const CLEAR_ORDER: [EntityKind; 9] = [
        EntityKind::Automation,
        EntityKind::HandoffPolicy,
        EntityKind::ChannelBinding,
        EntityKind::AgentStateStep,
        EntityKind::AgentState,
        EntityKind::PlaybookTable,
        EntityKind::PlaybookRule,
        EntityKind::Playbook,
        EntityKind::Agent,
    ];

    /// Entity Store table backing this kind.
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Agent => "agents",
            EntityKind::Playbook => "agent_playbooks",
            EntityKind::PlaybookRule => "playbook_rules",
            EntityKind::PlaybookTable => "playbook_tables",
            EntityKind::AgentState => "agent_states",
            EntityKind::AgentStateStep => "agent_state_steps",
            EntityKind::ChannelBinding => "channel_bindings",
            EntityKind::HandoffPolicy => "handoff_policies",
            EntityKind::Automation => "automations",
        }
    }

    /// Human-readable singular label.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Agent => "Agent",
            EntityKind::Playbook => "Playbook",
            EntityKind::PlaybookRule => "Playbook rule",
            EntityKind::PlaybookTable => "Playbook table",
            EntityKind::AgentState => "Agent state",
            EntityKind::AgentStateStep => "Agent state step",
            EntityKind::ChannelBinding => "Channel binding",
            EntityKind::HandoffPolicy => "Handoff policy",
            EntityKind::Automation => "Automation",
        }
    }

    /// Plural label used for progress stages.
    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::Agent => "agents",
            EntityKind::Playbook => "playbooks",
            EntityKind::PlaybookRule => "playbook rules",
            EntityKind::PlaybookTable => "playbook tables",
            EntityKind::AgentState => "agent states",
            EntityKind::AgentStateStep => "agent state steps",
            EntityKind::ChannelBinding => "channel bindings",
            EntityKind::HandoffPolicy => "handoff policies",
            EntityKind::Automation => "automations",
        }
    }

    /// Whether rows of this kind carry a `tenant_id` column.
    ///
    /// Agent states are scoped only through their owning agent.
    pub fn is_tenant_scoped(self) -> bool {
        !matches!(self, EntityKind::AgentState)
    }

    /// Whether other specs may reference this kind by `ref_key`.
    pub fn is_referenceable(self) -> bool {
        matches!(
            self,
            EntityKind::Agent | EntityKind::Playbook | EntityKind::AgentState
        )
    }

    /// Look up a kind by its store table name.
    pub fn from_table(table: &str) -> Option<Self> {
        Self::APPLY_ORDER.into_iter().find(|kind| kind.table() == table)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}
