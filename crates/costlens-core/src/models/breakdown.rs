//! Pricing-output document emitted by `cloudcost breakdown --format json`
//!
//! This is the subprocess contract: every field the CLI may omit carries a
//! default so schema drift degrades gracefully instead of failing the parse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level document for one breakdown invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownDocument {
    #[serde(default)]
    pub version: String,

    /// Currency code all monetary values are expressed in
    #[serde(default)]
    pub currency: String,

    /// Non-empty when the CLI completed but could not price the input
    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub projects: Vec<ProjectBreakdown>,

    #[serde(default)]
    pub total_hourly_cost: Option<String>,

    #[serde(default)]
    pub total_monthly_cost: Option<String>,

    #[serde(default)]
    pub time_generated: Option<DateTime<Utc>>,

    #[serde(default)]
    pub summary: Option<Summary>,
}

/// One priced project inside the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBreakdown {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub metadata: ProjectMetadata,

    #[serde(default)]
    pub breakdown: Breakdown,

    #[serde(default)]
    pub past_breakdown: Option<Breakdown>,

    #[serde(default)]
    pub diff: Option<Breakdown>,

    #[serde(default)]
    pub summary: Option<Summary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    /// Filesystem path of the priced directory; the project key
    #[serde(default)]
    pub path: String,

    #[serde(default, rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub vcs_repo_url: String,

    #[serde(default)]
    pub vcs_sub_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    #[serde(default)]
    pub resources: Vec<Resource>,

    #[serde(default)]
    pub total_hourly_cost: Option<String>,

    #[serde(default)]
    pub total_monthly_cost: Option<String>,
}

/// One priced resource. Subresources recurse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub metadata: ResourceMetadata,

    #[serde(default)]
    pub hourly_cost: Option<String>,

    /// Absent or null means the resource is free (or unpriceable)
    #[serde(default)]
    pub monthly_cost: Option<f64>,

    #[serde(default)]
    pub cost_components: Vec<CostComponent>,

    #[serde(default)]
    pub subresources: Vec<Resource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    /// File the resource is declared in
    #[serde(default)]
    pub filename: String,

    #[serde(default)]
    pub start_line: Option<u32>,

    /// Call sites referencing the declaration; one resource may have several
    #[serde(default)]
    pub calls: Vec<CallSite>,
}

/// A reference from a priced resource back to the source construct that
/// produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSite {
    #[serde(default)]
    pub block_name: String,

    #[serde(default)]
    pub filename: String,

    #[serde(default)]
    pub start_line: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostComponent {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub unit: String,

    #[serde(default)]
    pub hourly_quantity: Option<f64>,

    #[serde(default)]
    pub monthly_quantity: Option<f64>,

    #[serde(default)]
    pub price: Option<String>,

    #[serde(default)]
    pub hourly_cost: Option<f64>,

    #[serde(default)]
    pub monthly_cost: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(default)]
    pub total_detected_resources: u64,

    #[serde(default)]
    pub total_supported_resources: u64,

    #[serde(default)]
    pub total_unsupported_resources: u64,

    #[serde(default)]
    pub total_usage_based_resources: u64,

    #[serde(default)]
    pub total_no_price_resources: u64,

    #[serde(default)]
    pub unsupported_resource_counts: HashMap<String, u64>,

    #[serde(default)]
    pub no_price_resource_counts: HashMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_document() {
        let raw = r#"{
            "currency": "USD",
            "projects": [{
                "name": "p",
                "metadata": {"path": "/root"},
                "breakdown": {
                    "resources": [{
                        "name": "r",
                        "monthlyCost": 12.5,
                        "metadata": {
                            "filename": "/root/main.tf",
                            "calls": [{"blockName": "aws_instance.x"}]
                        }
                    }]
                }
            }]
        }"#;

        let doc: BreakdownDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.currency, "USD");
        assert_eq!(doc.projects.len(), 1);

        let project = &doc.projects[0];
        assert_eq!(project.metadata.path, "/root");

        let resource = &project.breakdown.resources[0];
        assert_eq!(resource.monthly_cost, Some(12.5));
        assert_eq!(resource.metadata.calls[0].block_name, "aws_instance.x");
        assert_eq!(resource.metadata.calls[0].start_line, None);
    }

    #[test]
    fn test_null_monthly_cost_deserializes_as_none() {
        let raw = r#"{"name": "r", "monthlyCost": null}"#;
        let resource: Resource = serde_json::from_str(raw).unwrap();
        assert_eq!(resource.monthly_cost, None);
    }

    #[test]
    fn test_full_document_fields() {
        let raw = r#"{
            "version": "0.2",
            "currency": "EUR",
            "projects": [],
            "totalMonthlyCost": "99.50",
            "timeGenerated": "2024-06-01T12:00:00Z",
            "summary": {"totalDetectedResources": 4}
        }"#;

        let doc: BreakdownDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.total_monthly_cost.as_deref(), Some("99.50"));
        assert!(doc.time_generated.is_some());
        assert_eq!(doc.summary.unwrap().total_detected_resources, 4);
    }

    #[test]
    fn test_top_level_error_indicator() {
        let raw = r#"{"error": "invalid project", "projects": []}"#;
        let doc: BreakdownDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.error.as_deref(), Some("invalid project"));
    }
}
