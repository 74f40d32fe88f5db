//! Project - one independently priced unit
//!
//! Owns the files (and through them the blocks) rebuilt from one CLI run,
//! plus a flattened declaration-name index for fast lens lookups. When two
//! files declare a block with the same local name the index keeps the first
//! insertion; costs are always summed through the file map so the collision
//! never drops money.

use crate::currency::format_cost;
use crate::models::block::Block;
use crate::models::file::File;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    name: String,
    path: String,
    currency: String,
    files: HashMap<String, File>,
    /// Declaration name -> owning filename; first insertion wins.
    block_index: HashMap<String, String>,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            currency: currency.into(),
            files: HashMap::new(),
            block_index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Look up or create the block for a (filename, declaration name) pair,
    /// creating the owning file on first reference.
    pub fn ensure_block(&mut self, filename: &str, name: &str, line: Option<u32>) -> &mut Block {
        self.block_index
            .entry(name.to_string())
            .or_insert_with(|| filename.to_string());

        let file = self
            .files
            .entry(filename.to_string())
            .or_insert_with(|| File::new(filename, self.currency.clone()));

        file.ensure_block(name, line)
    }

    /// Resolve a declaration name through the flattened index.
    pub fn block(&self, name: &str) -> Option<&Block> {
        let filename = self.block_index.get(name)?;
        self.files.get(filename)?.block(name)
    }

    /// Direct lookup without the flattened index.
    pub fn block_at(&self, filename: &str, name: &str) -> Option<&Block> {
        self.files.get(filename)?.block(name)
    }

    /// Flattened declaration-name view used by the lens provider.
    pub fn blocks(&self) -> HashMap<String, Block> {
        self.block_index
            .iter()
            .filter_map(|(name, filename)| {
                self.files
                    .get(filename)
                    .and_then(|file| file.block(name))
                    .map(|block| (name.clone(), block.clone()))
            })
            .collect()
    }

    pub fn files(&self) -> &HashMap<String, File> {
        &self.files
    }

    /// Every distinct block counted exactly once, through the file map.
    pub fn raw_cost(&self) -> f64 {
        self.files.values().map(File::raw_cost).sum()
    }

    /// Display-formatted total in this project's currency.
    pub fn cost(&self) -> String {
        format_cost(&self.currency, self.raw_cost())
    }
}
