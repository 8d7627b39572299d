//! Apply and clear engines for template packs.

pub mod apply;
pub mod clear;
pub mod refmap;
pub mod report;

pub use apply::ApplyEngine;
pub use clear::ClearEngine;
pub use refmap::RefMap;
pub use report::{
    ClearResult, Counts, DeploymentResult, LogProgress, NoProgress, ProgressReporter, STAGE_COUNT,
};
