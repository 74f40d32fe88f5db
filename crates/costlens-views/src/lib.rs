//! costlens-views - Read-only view adapters over the costlens core
//!
//! Turns the orchestrator's entity tree into plain display data: inline
//! code lenses, cost tree items, and a status bar model. Nothing here
//! mutates workspace state except the tree provider's explicit refresh.

pub mod lens;
pub mod status;
pub mod tree;

pub use lens::{CodeLens, LensProvider};
pub use status::StatusBar;
pub use tree::{TreeItem, TreeItemKind, TreeProvider};
