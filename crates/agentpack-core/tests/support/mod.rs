#![allow(dead_code)]

use std::sync::Mutex;

use agentpack_core::pack::{
    AgentSpec, AgentStateSpec, AgentStateStepSpec, AutomationSpec, ChannelBindingSpec, Fields,
    HandoffPolicySpec, PackMetadata, PlaybookRuleSpec, PlaybookSpec, PlaybookTableSpec,
    TemplatePack,
};
use agentpack_core::store::{EntityStore, Filter, ID, MemoryStore, Record, RecordId, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// How a matching create call misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreateFault {
    Reject,
    Unauthorized,
    /// The row is stored but the returned record has no id.
    OmitId,
}

/// A create call the store should fail.
#[derive(Debug, Clone)]
struct CreateFailure {
    table: String,
    field: String,
    value: Value,
    fault: CreateFault,
}

/// Memory store that records calls and fails on demand.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    creates: Mutex<Vec<(String, Map<String, Value>)>>,
    lists: Mutex<Vec<(String, Vec<Filter>)>>,
    create_failures: Mutex<Vec<CreateFailure>>,
    failing_lists: Mutex<Vec<String>>,
    fatal_lists: Mutex<Vec<String>>,
    failing_updates: Mutex<Vec<String>>,
    fatal_updates: Mutex<Vec<(String, RecordId)>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    /// Reject creates on `table` whose `field` equals `value`.
    pub fn fail_create_where(&self, table: &str, field: &str, value: impl Into<Value>) {
        self.push_failure(table, field, value.into(), CreateFault::Reject);
    }

    /// Fail creates on `table` whose `field` equals `value` with an unauthorized error.
    pub fn fail_create_fatally_where(&self, table: &str, field: &str, value: impl Into<Value>) {
        self.push_failure(table, field, value.into(), CreateFault::Unauthorized);
    }

    /// Store creates on `table` whose `field` equals `value`, but answer without an id.
    pub fn omit_id_where(&self, table: &str, field: &str, value: impl Into<Value>) {
        self.push_failure(table, field, value.into(), CreateFault::OmitId);
    }

    fn push_failure(&self, table: &str, field: &str, value: Value, fault: CreateFault) {
        self.create_failures.lock().unwrap().push(CreateFailure {
            table: table.to_string(),
            field: field.to_string(),
            value,
            fault,
        });
    }

    pub fn fail_list(&self, table: &str) {
        self.failing_lists.lock().unwrap().push(table.to_string());
    }

    /// Fail lists on `table` with an unauthorized error.
    pub fn fail_list_fatally(&self, table: &str) {
        self.fatal_lists.lock().unwrap().push(table.to_string());
    }

    pub fn fail_updates(&self, table: &str) {
        self.failing_updates.lock().unwrap().push(table.to_string());
    }

    /// Fail the update of row `id` in `table` with an unauthorized error.
    pub fn fail_update_fatally(&self, table: &str, id: RecordId) {
        self.fatal_updates
            .lock()
            .unwrap()
            .push((table.to_string(), id));
    }

    /// Tables of every create call, in call order.
    pub fn create_tables(&self) -> Vec<String> {
        self.creates
            .lock()
            .unwrap()
            .iter()
            .map(|(table, _)| table.clone())
            .collect()
    }

    pub fn creates_on(&self, table: &str) -> Vec<Map<String, Value>> {
        self.creates
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, fields)| fields.clone())
            .collect()
    }

    pub fn lists(&self) -> Vec<(String, Vec<Filter>)> {
        self.lists.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntityStore for RecordingStore {
    async fn create(&self, table: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        self.creates
            .lock()
            .unwrap()
            .push((table.to_string(), fields.clone()));

        let failure = self
            .create_failures
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.table == table && fields.get(&f.field) == Some(&f.value))
            .cloned();
        match failure.map(|f| f.fault) {
            Some(CreateFault::Reject) => Err(StoreError::Rejected {
                status: 500,
                message: "insert failed".to_string(),
            }),
            Some(CreateFault::Unauthorized) => {
                Err(StoreError::Unauthorized("token expired".to_string()))
            }
            Some(CreateFault::OmitId) => {
                let mut record = self.inner.create(table, fields).await?;
                record.fields.remove(ID);
                Ok(record)
            }
            None => self.inner.create(table, fields).await,
        }
    }

    async fn list(&self, table: &str, filters: &[Filter]) -> Result<Vec<Record>, StoreError> {
        self.lists
            .lock()
            .unwrap()
            .push((table.to_string(), filters.to_vec()));
        if self.fatal_lists.lock().unwrap().iter().any(|t| t == table) {
            return Err(StoreError::Unauthorized("token expired".to_string()));
        }
        if self.failing_lists.lock().unwrap().iter().any(|t| t == table) {
            return Err(StoreError::Transport("connection reset".to_string()));
        }
        self.inner.list(table, filters).await
    }

    async fn update(&self, table: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        let id = fields.get(ID).and_then(RecordId::from_value);
        let fatal = self
            .fatal_updates
            .lock()
            .unwrap()
            .iter()
            .any(|(t, fatal_id)| t == table && id.as_ref() == Some(fatal_id));
        if fatal {
            return Err(StoreError::Unauthorized("token expired".to_string()));
        }
        if self.failing_updates.lock().unwrap().iter().any(|t| t == table) {
            return Err(StoreError::Rejected {
                status: 409,
                message: "row locked".to_string(),
            });
        }
        self.inner.update(table, fields).await
    }
}

pub fn fields(pairs: &[(&str, &str)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

pub fn metadata() -> PackMetadata {
    PackMetadata {
        key: "support-pack".to_string(),
        name: "Support Pack".to_string(),
        version: Some("1.0.0".to_string()),
        description: None,
    }
}

pub fn agent(ref_key: &str) -> AgentSpec {
    AgentSpec {
        ref_key: ref_key.to_string(),
        fields: fields(&[("name", ref_key)]),
    }
}

pub fn playbook(ref_key: &str, agent_ref: &str) -> PlaybookSpec {
    PlaybookSpec {
        ref_key: ref_key.to_string(),
        agent_ref: agent_ref.to_string(),
        fields: fields(&[("name", ref_key)]),
    }
}

pub fn rule(title: &str, playbook_ref: &str) -> PlaybookRuleSpec {
    PlaybookRuleSpec {
        title: title.to_string(),
        playbook_ref: playbook_ref.to_string(),
        fields: Fields::new(),
    }
}

pub fn table(name: &str, playbook_ref: &str) -> PlaybookTableSpec {
    PlaybookTableSpec {
        name: name.to_string(),
        playbook_ref: playbook_ref.to_string(),
        fields: Fields::new(),
    }
}

pub fn state(ref_key: &str, agent_ref: &str) -> AgentStateSpec {
    AgentStateSpec {
        ref_key: ref_key.to_string(),
        agent_ref: agent_ref.to_string(),
        fields: fields(&[("name", ref_key)]),
    }
}

pub fn step(title: &str, state_ref: &str, agent_ref: &str) -> AgentStateStepSpec {
    AgentStateStepSpec {
        title: title.to_string(),
        state_ref: state_ref.to_string(),
        agent_ref: agent_ref.to_string(),
        fields: Fields::new(),
    }
}

pub fn binding(channel: &str, agent_ref: &str) -> ChannelBindingSpec {
    ChannelBindingSpec {
        channel: channel.to_string(),
        agent_ref: agent_ref.to_string(),
        fields: Fields::new(),
    }
}

pub fn handoff(name: &str, agent_ref: &str, playbook_ref: Option<&str>) -> HandoffPolicySpec {
    HandoffPolicySpec {
        name: name.to_string(),
        agent_ref: agent_ref.to_string(),
        playbook_ref: playbook_ref.map(str::to_string),
        fields: Fields::new(),
    }
}

pub fn automation(trigger: &str, agent_ref: &str) -> AutomationSpec {
    AutomationSpec {
        trigger: trigger.to_string(),
        agent_ref: agent_ref.to_string(),
        fields: Fields::new(),
    }
}

/// One spec of every type, all references resolvable.
pub fn full_pack() -> TemplatePack {
    TemplatePack {
        metadata: metadata(),
        agents: vec![agent("a1")],
        playbooks: vec![playbook("pb1", "a1")],
        playbook_rules: vec![rule("greet first", "pb1")],
        playbook_tables: vec![table("prices", "pb1")],
        agent_states: vec![state("s1", "a1")],
        agent_state_steps: vec![step("ask name", "s1", "a1")],
        channel_bindings: vec![binding("whatsapp", "a1")],
        handoff_policies: vec![handoff("escalate", "a1", Some("pb1"))],
        automations: vec![automation("on_message", "a1")],
    }
}
