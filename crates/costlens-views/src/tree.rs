//! Cost tree provider
//!
//! Renders the workspace as project -> file -> block items with formatted
//! costs, files and blocks ordered by descending raw cost. Files are listed
//! only when they sit directly under the project directory; nested modules
//! still contribute to the project total.

use costlens_core::models::file::File;
use costlens_core::models::project::Project;
use costlens_core::Workspace;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeItemKind {
    Project,
    File,
    Block,
}

/// One row of the cost tree. `key` addresses the element for child queries:
/// the project path, `"{project}|{file}"`, or the block key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub key: String,
    pub label: String,
    pub description: String,
    pub kind: TreeItemKind,
}

pub struct TreeProvider {
    workspace: Arc<Workspace>,
}

impl TreeProvider {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }

    /// Re-initialize the workspace and thereby the whole tree.
    pub async fn refresh(&self) {
        self.workspace.init().await;
    }

    /// Top-level rows: one per known project.
    pub fn projects(&self) -> Vec<TreeItem> {
        self.workspace
            .projects()
            .iter()
            .map(|project| TreeItem {
                key: project.path().to_string(),
                label: project.name().to_string(),
                description: project.cost(),
                kind: TreeItemKind::Project,
            })
            .collect()
    }

    /// File rows under one project, most expensive first.
    pub fn files(&self, project_path: &str) -> Vec<TreeItem> {
        self.workspace
            .project_by_path(project_path)
            .map(|project| file_items(&project))
            .unwrap_or_default()
    }

    /// Block rows under one file of one project, most expensive first.
    pub fn blocks(&self, project_path: &str, filename: &str) -> Vec<TreeItem> {
        self.workspace
            .project_by_path(project_path)
            .map(|project| block_items(&project, filename))
            .unwrap_or_default()
    }
}

/// Build the file rows for a project.
pub fn file_items(project: &Project) -> Vec<TreeItem> {
    let mut files: Vec<&File> = project
        .files()
        .values()
        .filter(|file| is_direct_child(project.path(), file.name()))
        .collect();
    files.sort_by(|a, b| {
        b.raw_cost()
            .partial_cmp(&a.raw_cost())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    files
        .into_iter()
        .map(|file| TreeItem {
            key: format!("{}|{}", project.path(), file.name()),
            label: basename(file.name()),
            description: file.cost(),
            kind: TreeItemKind::File,
        })
        .collect()
}

/// Build the block rows for one file of a project.
pub fn block_items(project: &Project, filename: &str) -> Vec<TreeItem> {
    let Some(file) = project.files().get(filename) else {
        return Vec::new();
    };

    let mut blocks: Vec<_> = file.blocks().values().collect();
    blocks.sort_by(|a, b| {
        b.raw_cost()
            .partial_cmp(&a.raw_cost())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    blocks
        .into_iter()
        .map(|block| TreeItem {
            key: block.key(),
            label: block.name().to_string(),
            description: block.cost(),
            kind: TreeItemKind::Block,
        })
        .collect()
}

fn is_direct_child(project_path: &str, filename: &str) -> bool {
    Path::new(filename)
        .parent()
        .map(|parent| parent == Path::new(project_path))
        .unwrap_or(false)
}

fn basename(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use costlens_core::models::breakdown::Resource;

    fn resource(cost: f64) -> Resource {
        Resource {
            monthly_cost: Some(cost),
            ..Default::default()
        }
    }

    fn sample_project() -> Project {
        let mut project = Project::new("app", "/work/app", "USD");
        project
            .ensure_block("/work/app/main.tf", "cheap", Some(1))
            .push_resource(resource(1.0));
        project
            .ensure_block("/work/app/main.tf", "pricey", Some(9))
            .push_resource(resource(40.0));
        project
            .ensure_block("/work/app/db.tf", "db", Some(2))
            .push_resource(resource(10.0));
        project
            .ensure_block("/work/app/modules/vpc/vpc.tf", "vpc", Some(3))
            .push_resource(resource(2.0));
        project
    }

    #[test]
    fn test_file_items_sorted_by_cost_desc() {
        let items = file_items(&sample_project());

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, "main.tf");
        assert_eq!(items[0].description, "$41.00");
        assert_eq!(items[1].label, "db.tf");
        assert_eq!(items[1].key, "/work/app|/work/app/db.tf");
    }

    #[test]
    fn test_nested_files_are_not_listed_but_still_counted() {
        let project = sample_project();
        let items = file_items(&project);

        assert!(items.iter().all(|item| item.label != "vpc.tf"));
        // The nested module still contributes to the project total.
        assert_eq!(project.cost(), "$53.00");
    }

    #[test]
    fn test_block_items_sorted_by_cost_desc() {
        let project = sample_project();
        let items = block_items(&project, "/work/app/main.tf");

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, "pricey");
        assert_eq!(items[0].description, "$40.00");
        assert_eq!(items[1].label, "cheap");
        assert_eq!(items[0].key, "/work/app/main.tf|pricey");
    }

    #[test]
    fn test_block_items_unknown_file_empty() {
        assert!(block_items(&sample_project(), "/work/app/missing.tf").is_empty());
    }
}
