//! File - groups the blocks declared in one source file

use crate::currency::format_cost;
use crate::models::block::Block;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct File {
    name: String,
    currency: String,
    blocks: HashMap<String, Block>,
}

impl File {
    pub fn new(name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            currency: currency.into(),
            blocks: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Look up or create the block with the given declaration name. The
    /// source line is only set on creation; later references to the same
    /// block keep the first line seen.
    pub fn ensure_block(&mut self, name: &str, line: Option<u32>) -> &mut Block {
        self.blocks
            .entry(name.to_string())
            .or_insert_with(|| Block::new(name, self.name.clone(), self.currency.clone(), line))
    }

    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.get(name)
    }

    pub fn blocks(&self) -> &HashMap<String, Block> {
        &self.blocks
    }

    /// Sum of child block raw costs.
    pub fn raw_cost(&self) -> f64 {
        self.blocks.values().map(Block::raw_cost).sum()
    }

    /// Display-formatted cost in this file's currency.
    pub fn cost(&self) -> String {
        format_cost(&self.currency, self.raw_cost())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::breakdown::Resource;

    fn resource(cost: f64) -> Resource {
        Resource {
            monthly_cost: Some(cost),
            ..Default::default()
        }
    }

    #[test]
    fn test_raw_cost_sums_child_blocks() {
        let mut file = File::new("/root/main.tf", "USD");
        file.ensure_block("a", Some(1)).push_resource(resource(1.5));
        file.ensure_block("b", Some(5)).push_resource(resource(2.0));

        assert_eq!(file.raw_cost(), 3.5);
        assert_eq!(file.cost(), "$3.50");
    }

    #[test]
    fn test_ensure_block_reuses_existing() {
        let mut file = File::new("/root/main.tf", "USD");
        file.ensure_block("a", Some(1)).push_resource(resource(1.0));
        file.ensure_block("a", Some(99)).push_resource(resource(1.0));

        assert_eq!(file.blocks().len(), 1);
        let block = file.block("a").unwrap();
        assert_eq!(block.raw_cost(), 2.0);
        // First line seen wins.
        assert_eq!(block.line(), Some(1));
    }
}
