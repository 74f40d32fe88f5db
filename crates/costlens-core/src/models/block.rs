//! Block - the smallest priced unit
//!
//! One block corresponds to one resource-declaring construct in one source
//! file. Blocks are rebuilt wholesale on every run; resources are only ever
//! appended during a single aggregation pass.

use crate::currency::format_cost;
use crate::display::{block_key, DisplayRegistry};
use crate::models::breakdown::Resource;

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    name: String,
    filename: String,
    currency: String,
    line: Option<u32>,
    resources: Vec<Resource>,
}

impl Block {
    pub fn new(
        name: impl Into<String>,
        filename: impl Into<String>,
        currency: impl Into<String>,
        line: Option<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            currency: currency.into(),
            line,
            resources: Vec::new(),
        }
    }

    /// Composite identity within the workspace: `"{filename}|{name}"`.
    pub fn key(&self) -> String {
        block_key(&self.filename, &self.name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Source line for annotation placement, when the CLI reported one.
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Attach a priced resource. Resources are appended, never removed,
    /// during one aggregation pass.
    pub fn push_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    /// Sum of all attached resource monthly costs, absent cost counted as 0.
    pub fn raw_cost(&self) -> f64 {
        self.resources
            .iter()
            .map(|r| r.monthly_cost.unwrap_or(0.0))
            .sum()
    }

    /// Display-formatted cost in this block's own currency.
    pub fn cost(&self) -> String {
        format_cost(&self.currency, self.raw_cost())
    }

    /// Re-render the open display surface bound to this block's key, if any;
    /// with a factory-backed registry, open one.
    pub fn display(&self, displays: &DisplayRegistry) {
        if let Some(surface) = displays.open(self) {
            surface.render(self);
            surface.reveal();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(cost: Option<f64>) -> Resource {
        Resource {
            name: "r".to_string(),
            monthly_cost: cost,
            ..Default::default()
        }
    }

    #[test]
    fn test_raw_cost_sums_resources() {
        let mut block = Block::new("aws_instance.x", "/root/main.tf", "USD", Some(1));
        block.push_resource(resource(Some(10.0)));
        block.push_resource(resource(Some(2.5)));

        assert_eq!(block.raw_cost(), 12.5);
    }

    #[test]
    fn test_absent_cost_counts_as_zero() {
        let mut block = Block::new("aws_instance.x", "/root/main.tf", "USD", None);
        block.push_resource(resource(None));
        block.push_resource(resource(Some(3.0)));

        assert_eq!(block.raw_cost(), 3.0);
    }

    #[test]
    fn test_cost_formats_with_own_currency() {
        let mut block = Block::new("aws_instance.x", "/root/main.tf", "EUR", None);
        block.push_resource(resource(Some(12.5)));

        assert_eq!(block.cost(), "\u{20ac}12.50");
    }

    #[test]
    fn test_key_is_filename_and_name() {
        let block = Block::new("aws_instance.x", "/root/main.tf", "USD", None);
        assert_eq!(block.key(), "/root/main.tf|aws_instance.x");
    }
}
