//! Template pack model, loading and validation.

pub mod loader;
pub mod schema;
pub mod validate;

pub use loader::{PackFormat, load_pack, parse_pack_str};
pub use schema::{
    AgentSpec, AgentStateSpec, AgentStateStepSpec, AutomationSpec, ChannelBindingSpec,
    EntitySpec, Fields, HandoffPolicySpec, PackMetadata, PlaybookRuleSpec, PlaybookSpec,
    PlaybookTableSpec, SpecRef, TemplatePack,
};
pub use validate::{ValidationReport, validate};
