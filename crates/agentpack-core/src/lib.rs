//! agentpack Core Library
//!
//! Validates template packs and deploys them into a multi-tenant Entity
//! Store, or tears a tenant's deployment down again.

pub mod commands;
pub mod config;
pub mod context;
pub mod deploy;
pub mod pack;
pub mod store;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Pack model
    pub use crate::pack::{EntitySpec, TemplatePack, ValidationReport, load_pack, validate};

    // Engines
    pub use crate::deploy::{
        ApplyEngine, ClearEngine, ClearResult, Counts, DeploymentResult, NoProgress,
        ProgressReporter,
    };

    // Store
    pub use crate::store::{EntityStore, Filter, HttpStore, MemoryStore, Record, RecordId, StoreError};

    // Configuration
    pub use crate::config::{AgentpackConfig, StoreKind};
    pub use crate::context::AppContext;

    pub use crate::types::EntityKind;
}
