//! High-level commands for agentpack operations.
//!
//! These wire the pack loader, validator, engines and configured store
//! together for frontends such as the CLI.

pub mod apply;
pub mod clear;
pub mod validate;

pub use apply::{ApplyCommand, ApplyOptions, ApplyReport};
pub use clear::{ClearCommand, ClearOptions};
pub use validate::ValidateCommand;
