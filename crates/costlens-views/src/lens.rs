//! Code-lens provider
//!
//! Produces the inline cost annotations for one source file. Anchors come
//! from the call-site start lines the pricing CLI reported, so no symbol
//! lookup is needed here.

use costlens_core::models::block::Block;
use costlens_core::paths::clean_filename;
use costlens_core::Workspace;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One inline annotation: a title anchored at a source line, carrying the
/// block key so the host can open the detail panel on activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLens {
    pub line: u32,
    pub title: String,
    pub block_key: String,
}

pub struct LensProvider {
    workspace: Arc<Workspace>,
}

impl LensProvider {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }

    /// Lenses for a document, ordered by line. Empty while logged out or
    /// for files no project references.
    pub fn code_lenses(&self, filename: &str) -> Vec<CodeLens> {
        if !self.workspace.context().is_logged_in() {
            return Vec::new();
        }

        let filename = clean_filename(filename);
        debug!(file = %filename, "providing code lenses");

        let blocks = self.workspace.project(&filename);
        let loading = self.workspace.is_loading();

        let mut lenses = lenses_for_blocks(&blocks, &filename, loading);
        lenses.sort_by_key(|lens| lens.line);
        lenses
    }
}

/// Build lens entries from a flattened block map, keeping only blocks that
/// belong to the queried file and carry a source line.
pub fn lenses_for_blocks(
    blocks: &HashMap<String, Block>,
    filename: &str,
    loading: bool,
) -> Vec<CodeLens> {
    blocks
        .values()
        .filter(|block| block.filename() == filename)
        .filter_map(|block| {
            let line = block.line()?;
            let title = if loading {
                "loading...".to_string()
            } else {
                format!("Total monthly cost: {}", block.cost())
            };

            Some(CodeLens {
                line,
                title,
                block_key: block.key(),
            })
        })
        .collect()
}
