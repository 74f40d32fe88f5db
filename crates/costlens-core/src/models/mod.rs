//! Data models: the pricing-output wire document and the entity tree
//! (workspace -> project -> file -> block) built from it.

pub mod block;
pub mod breakdown;
pub mod config;
pub mod file;
pub mod project;

pub use block::Block;
pub use breakdown::{BreakdownDocument, CallSite, ProjectBreakdown, Resource};
pub use config::{ConfigFile, ConfigProject};
pub use file::File;
pub use project::Project;
