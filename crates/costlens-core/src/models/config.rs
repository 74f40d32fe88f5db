//! Project-config and usage-file model
//!
//! The root-level `cloudcost.yml` names the projects passed to the pricing
//! CLI; `cloudcost.yml.tmpl` is expanded into it by `generate config`; a
//! `cloudcost-usage.yml` found project-local or at the root is handed to the
//! CLI untouched.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root-level project-config document filename.
pub const CONFIG_FILE_NAME: &str = "cloudcost.yml";

/// Template expanded into the config document by `generate config`.
pub const CONFIG_TEMPLATE_NAME: &str = "cloudcost.yml.tmpl";

/// Usage-data file passed through to the CLI untouched.
pub const USAGE_FILE_NAME: &str = "cloudcost-usage.yml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub projects: Vec<ConfigProject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigProject {
    pub path: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub skip_autodetect: bool,
}

impl ConfigFile {
    /// Keep only the projects whose path is in `paths` (paths are config
    /// entries, i.e. relative to the workspace root).
    pub fn retain_paths(&mut self, paths: &[String]) {
        self.projects.retain(|p| paths.contains(&p.path));
    }
}

/// Locate the usage file for a project: project-local first, then the
/// workspace root.
pub fn find_usage_file(project_path: &Path, root: &Path) -> Option<PathBuf> {
    let project_usage = project_path.join(USAGE_FILE_NAME);
    if project_usage.exists() {
        return Some(project_usage);
    }

    let root_usage = root.join(USAGE_FILE_NAME);
    if root_usage.exists() {
        return Some(root_usage);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_document() {
        let raw = "version: \"0.1\"\nprojects:\n  - path: dev\n    name: development\n  - path: prod\n";
        let config: ConfigFile = serde_yaml::from_str(raw).unwrap();

        assert_eq!(config.version, "0.1");
        assert_eq!(config.projects.len(), 2);
        assert_eq!(config.projects[0].name, "development");
        assert!(!config.projects[1].skip_autodetect);
    }

    #[test]
    fn test_retain_paths_filters_projects() {
        let mut config: ConfigFile =
            serde_yaml::from_str("projects:\n  - path: dev\n  - path: prod\n").unwrap();

        config.retain_paths(&["prod".to_string()]);

        assert_eq!(config.projects.len(), 1);
        assert_eq!(config.projects[0].path, "prod");
    }

    #[test]
    fn test_round_trip_preserves_entries() {
        let config = ConfigFile {
            version: "0.1".to_string(),
            projects: vec![ConfigProject {
                path: "dev".to_string(),
                name: "development".to_string(),
                skip_autodetect: true,
            }],
        };

        let dumped = serde_yaml::to_string(&config).unwrap();
        let parsed: ConfigFile = serde_yaml::from_str(&dumped).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_find_usage_file_prefers_project_local() {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join("dev");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(root.path().join(USAGE_FILE_NAME), "").unwrap();
        std::fs::write(project.join(USAGE_FILE_NAME), "").unwrap();

        let found = find_usage_file(&project, root.path()).unwrap();
        assert_eq!(found, project.join(USAGE_FILE_NAME));
    }

    #[test]
    fn test_find_usage_file_falls_back_to_root() {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join("dev");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(root.path().join(USAGE_FILE_NAME), "").unwrap();

        let found = find_usage_file(&project, root.path()).unwrap();
        assert_eq!(found, root.path().join(USAGE_FILE_NAME));
    }

    #[test]
    fn test_find_usage_file_absent() {
        let root = tempfile::tempdir().unwrap();
        assert!(find_usage_file(&root.path().join("dev"), root.path()).is_none());
    }
}
