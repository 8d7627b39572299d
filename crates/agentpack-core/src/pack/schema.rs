//! Template pack schema
//!
//! Typed description of the entities a pack deploys and the symbolic
//! references between them. Attributes the engine does not interpret are
//! kept in a flattened `fields` object and passed to the store untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::EntityKind;

/// Free-form attributes carried by a spec.
pub type Fields = Map<String, Value>;

/// Pack-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackMetadata {
    /// Unique pack identifier
    #[serde(default)]
    pub key: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Optional semver version of the pack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The deployment unit: metadata plus one ordered collection per entity type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplatePack {
    #[serde(default)]
    pub metadata: PackMetadata,
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub playbooks: Vec<PlaybookSpec>,
    #[serde(default)]
    pub playbook_rules: Vec<PlaybookRuleSpec>,
    #[serde(default)]
    pub playbook_tables: Vec<PlaybookTableSpec>,
    #[serde(default)]
    pub agent_states: Vec<AgentStateSpec>,
    #[serde(default)]
    pub agent_state_steps: Vec<AgentStateStepSpec>,
    #[serde(default)]
    pub channel_bindings: Vec<ChannelBindingSpec>,
    #[serde(default)]
    pub handoff_policies: Vec<HandoffPolicySpec>,
    #[serde(default)]
    pub automations: Vec<AutomationSpec>,
}

impl TemplatePack {
    /// Number of specs declared for `kind`.
    pub fn spec_count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Agent => self.agents.len(),
            EntityKind::Playbook => self.playbooks.len(),
            EntityKind::PlaybookRule => self.playbook_rules.len(),
            EntityKind::PlaybookTable => self.playbook_tables.len(),
            EntityKind::AgentState => self.agent_states.len(),
            EntityKind::AgentStateStep => self.agent_state_steps.len(),
            EntityKind::ChannelBinding => self.channel_bindings.len(),
            EntityKind::HandoffPolicy => self.handoff_policies.len(),
            EntityKind::Automation => self.automations.len(),
        }
    }

    /// Total number of specs across all types.
    pub fn total_specs(&self) -> usize {
        EntityKind::APPLY_ORDER
            .into_iter()
            .map(|kind| self.spec_count(kind))
            .sum()
    }
}

/// A symbolic reference declared by a spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecRef<'a> {
    /// Pack field holding the reference, e.g. `agent_ref`
    pub field: &'static str,
    /// Store column the resolved id is written to, e.g. `agent_id`
    pub column: &'static str,
    pub target: EntityKind,
    pub key: &'a str,
    /// Optional references never block creation
    pub required: bool,
}

impl<'a> SpecRef<'a> {
    fn required(field: &'static str, column: &'static str, target: EntityKind, key: &'a str) -> Self {
        Self {
            field,
            column,
            target,
            key,
            required: true,
        }
    }

    fn agent(key: &'a str) -> Self {
        Self::required("agent_ref", "agent_id", EntityKind::Agent, key)
    }

    fn playbook(key: &'a str) -> Self {
        Self::required("playbook_ref", "playbook_id", EntityKind::Playbook, key)
    }
}

/// Common view over the nine spec types.
pub trait EntitySpec {
    const KIND: EntityKind;

    /// Name of the field identifying the spec in messages (`ref_key`, `title`, ...).
    const IDENTITY_FIELD: &'static str;

    /// Value of the identity field.
    fn identity(&self) -> &str;

    /// Key under which dependents reference this spec, for referenceable kinds.
    fn ref_key(&self) -> Option<&str> {
        None
    }

    /// References this spec declares, required ones first.
    fn references(&self) -> Vec<SpecRef<'_>>;

    /// Pass-through attributes.
    fn extra_fields(&self) -> &Fields;

    /// Identity formatted for error messages.
    fn describe(&self) -> String {
        let identity = self.identity();
        if identity.trim().is_empty() {
            format!("(unnamed {})", Self::KIND.label().to_lowercase())
        } else {
            identity.to_string()
        }
    }

    /// Attributes written to the store before references and tenant are added.
    ///
    /// The identity field is included unless it is the pack-local `ref_key`.
    fn base_fields(&self) -> Fields {
        let mut fields = self.extra_fields().clone();
        if Self::IDENTITY_FIELD != "ref_key" {
            fields.insert(
                Self::IDENTITY_FIELD.to_string(),
                Value::String(self.identity().to_string()),
            );
        }
        fields
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    #[serde(default)]
    pub ref_key: String,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybookSpec {
    #[serde(default)]
    pub ref_key: String,
    #[serde(default)]
    pub agent_ref: String,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybookRuleSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub playbook_ref: String,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybookTableSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub playbook_ref: String,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStateSpec {
    #[serde(default)]
    pub ref_key: String,
    #[serde(default)]
    pub agent_ref: String,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStateStepSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state_ref: String,
    #[serde(default)]
    pub agent_ref: String,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelBindingSpec {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub agent_ref: String,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandoffPolicySpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub agent_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playbook_ref: Option<String>,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutomationSpec {
    #[serde(default)]
    pub trigger: String,
    #[serde(default)]
    pub agent_ref: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl EntitySpec for AgentSpec {
    const KIND: EntityKind = EntityKind::Agent;
    const IDENTITY_FIELD: &'static str = "ref_key";

    fn identity(&self) -> &str {
        &self.ref_key
    }

    fn ref_key(&self) -> Option<&str> {
        Some(&self.ref_key)
    }

    fn references(&self) -> Vec<SpecRef<'_>> {
        Vec::new()
    }

    fn extra_fields(&self) -> &Fields {
        &self.fields
    }
}

impl EntitySpec for PlaybookSpec {
    const KIND: EntityKind = EntityKind::Playbook;
    const IDENTITY_FIELD: &'static str = "ref_key";

    fn identity(&self) -> &str {
        &self.ref_key
    }

    fn ref_key(&self) -> Option<&str> {
        Some(&self.ref_key)
    }

    fn references(&self) -> Vec<SpecRef<'_>> {
        vec![SpecRef::agent(&self.agent_ref)]
    }

    fn extra_fields(&self) -> &Fields {
        &self.fields
    }
}

impl EntitySpec for PlaybookRuleSpec {
    const KIND: EntityKind = EntityKind::PlaybookRule;
    const IDENTITY_FIELD: &'static str = "title";

    fn identity(&self) -> &str {
        &self.title
    }

    fn references(&self) -> Vec<SpecRef<'_>> {
        vec![SpecRef::playbook(&self.playbook_ref)]
    }

    fn extra_fields(&self) -> &Fields {
        &self.fields
    }
}

impl EntitySpec for PlaybookTableSpec {
    const KIND: EntityKind = EntityKind::PlaybookTable;
    const IDENTITY_FIELD: &'static str = "name";

    fn identity(&self) -> &str {
        &self.name
    }

    fn references(&self) -> Vec<SpecRef<'_>> {
        vec![SpecRef::playbook(&self.playbook_ref)]
    }

    fn extra_fields(&self) -> &Fields {
        &self.fields
    }
}

impl EntitySpec for AgentStateSpec {
    const KIND: EntityKind = EntityKind::AgentState;
    const IDENTITY_FIELD: &'static str = "ref_key";

    fn identity(&self) -> &str {
        &self.ref_key
    }

    fn ref_key(&self) -> Option<&str> {
        Some(&self.ref_key)
    }

    fn references(&self) -> Vec<SpecRef<'_>> {
        vec![SpecRef::agent(&self.agent_ref)]
    }

    fn extra_fields(&self) -> &Fields {
        &self.fields
    }
}

impl EntitySpec for AgentStateStepSpec {
    const KIND: EntityKind = EntityKind::AgentStateStep;
    const IDENTITY_FIELD: &'static str = "title";

    fn identity(&self) -> &str {
        &self.title
    }

    fn references(&self) -> Vec<SpecRef<'_>> {
        vec![
            SpecRef::required("state_ref", "state_id", EntityKind::AgentState, &self.state_ref),
            SpecRef::agent(&self.agent_ref),
        ]
    }

    fn extra_fields(&self) -> &Fields {
        &self.fields
    }
}

impl EntitySpec for ChannelBindingSpec {
    const KIND: EntityKind = EntityKind::ChannelBinding;
    const IDENTITY_FIELD: &'static str = "channel";

    fn identity(&self) -> &str {
        &self.channel
    }

    fn references(&self) -> Vec<SpecRef<'_>> {
        vec![SpecRef::agent(&self.agent_ref)]
    }

    fn extra_fields(&self) -> &Fields {
        &self.fields
    }
}

impl EntitySpec for HandoffPolicySpec {
    const KIND: EntityKind = EntityKind::HandoffPolicy;
    const IDENTITY_FIELD: &'static str = "name";

    fn identity(&self) -> &str {
        &self.name
    }

    fn references(&self) -> Vec<SpecRef<'_>> {
        let mut refs = vec![SpecRef::agent(&self.agent_ref)];
        if let Some(playbook_ref) = self
            .playbook_ref
            .as_deref()
            .filter(|key| !key.trim().is_empty())
        {
            refs.push(SpecRef {
                required: false,
                ..SpecRef::playbook(playbook_ref)
            });
        }
        refs
    }

    fn extra_fields(&self) -> &Fields {
        &self.fields
    }
}

impl EntitySpec for AutomationSpec {
    const KIND: EntityKind = EntityKind::Automation;
    const IDENTITY_FIELD: &'static str = "trigger";

    fn identity(&self) -> &str {
        &self.trigger
    }

    fn references(&self) -> Vec<SpecRef<'_>> {
        vec![SpecRef::agent(&self.agent_ref)]
    }

    fn extra_fields(&self) -> &Fields {
        &self.fields
    }
}
