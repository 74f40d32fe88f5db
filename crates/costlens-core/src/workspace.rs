//! Workspace orchestrator
//!
//! The stateful engine behind the whole extension: runs the pricing CLI,
//! parses its output, rebuilds the project/file/block tree, tracks which
//! projects reference which files, and reacts to save and login events.
//! All failures are absorbed into session state here; nothing is thrown
//! past this boundary.

use crate::cli::{CliOutput, PricingCli, AUTH_SUCCESS_MARKER, NO_API_KEY_ENV_MARKER};
use crate::context::SessionContext;
use crate::display::{split_block_key, DisplayRegistry};
use crate::error::CoreError;
use crate::event::{EventBus, WorkspaceEvent};
use crate::models::block::Block;
use crate::models::breakdown::{BreakdownDocument, ProjectBreakdown};
use crate::models::config::{
    find_usage_file, ConfigFile, CONFIG_FILE_NAME, CONFIG_TEMPLATE_NAME, USAGE_FILE_NAME,
};
use crate::models::project::Project;
use crate::paths::{clean_filename, is_source_file};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

const INITIAL_RUN_FAILED_MSG: &str = "Could not fetch cloud costs for the workspace. \
     This is usually caused by a syntax error or an invalid project configuration. \
     Check the costlens debug output for details.";

const INCREMENTAL_RUN_FAILED_MSG: &str = "Could not refresh cloud costs for the changed \
     project. Save the file again or reopen the workspace to retry. Check the costlens \
     debug output for details.";

#[derive(Default)]
struct WorkspaceState {
    /// Project path -> rebuilt project tree
    projects: HashMap<String, Project>,
    /// Normalized filename -> paths of the projects that reference it
    files_to_projects: HashMap<String, BTreeSet<String>>,
}

/// Top-level session state for one root directory.
pub struct Workspace {
    root: PathBuf,
    cli: Arc<PricingCli>,
    context: Arc<SessionContext>,
    displays: Arc<DisplayRegistry>,
    currency: String,
    events: EventBus,
    state: RwLock<WorkspaceState>,
    loading: AtomicBool,
    is_error: AtomicBool,
    initial_populate_done: AtomicBool,
    /// Exclusive gate over every mutating run. Two saves must never
    /// interleave their rebuilds of the same project.
    run_gate: Mutex<()>,
}

impl Workspace {
    pub fn new(
        root: impl Into<PathBuf>,
        cli: Arc<PricingCli>,
        context: Arc<SessionContext>,
        displays: Arc<DisplayRegistry>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            cli,
            context,
            displays,
            currency: currency.into(),
            events: EventBus::default_capacity(),
            state: RwLock::new(WorkspaceState::default()),
            loading: AtomicBool::new(false),
            is_error: AtomicBool::new(false),
            initial_populate_done: AtomicBool::new(false),
            run_gate: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn displays(&self) -> &Arc<DisplayRegistry> {
        &self.displays
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_error(&self) -> bool {
        self.is_error.load(Ordering::SeqCst)
    }

    /// Open (or re-render) the detail panel for one block.
    pub fn show(&self, block: &Block) {
        block.display(&self.displays);
    }

    /// Run the CLI's authentication subcommand. On success the workspace
    /// initializes itself; on failure or ambiguous output the login state is
    /// set false and nothing else changes, so repeated attempts are
    /// idempotent.
    pub async fn login(&self) {
        let _gate = self.run_gate.lock().await;

        debug!("executing pricing CLI login");
        let out = match self.cli.exec(["auth", "login"], None).await {
            Ok(out) => out,
            Err(err) => {
                error!(error = %err, "login invocation failed");
                self.context.set_logged_in(false);
                return;
            }
        };

        if out.stdout.contains(AUTH_SUCCESS_MARKER) {
            debug!("successful login response received");
            self.context.set_logged_in(true);
            self.events.publish(WorkspaceEvent::LoggedIn);
            self.init_locked().await;
            return;
        }

        debug!(stdout = %out.stdout, "failed login response");
        self.context.set_logged_in(false);
    }

    /// Full (re)initialization: clears the project maps and re-runs the CLI
    /// across the whole root. Guarded on the session being authenticated.
    pub async fn init(&self) {
        let _gate = self.run_gate.lock().await;
        self.init_locked().await;
    }

    /// React to a saved document. Ignores files that are neither recognized
    /// source files nor config/usage files; escalates root-level config and
    /// usage changes (and any change while in the error state) to a full
    /// re-initialization; otherwise re-runs only the affected projects.
    pub async fn file_change(&self, path: &str) {
        let _gate = self.run_gate.lock().await;
        self.file_change_locked(path).await;
    }

    /// Mapping of declaration name to block for the first project that
    /// references the given (normalized) filename. Empty when unknown.
    pub fn project(&self, filename: &str) -> HashMap<String, Block> {
        let state = self.state.read();

        if let Some(owners) = state.files_to_projects.get(filename) {
            if let Some(first) = owners.iter().next() {
                if let Some(project) = state.projects.get(first) {
                    return project.blocks();
                }
            }
        }

        debug!(file = %filename, "no projects found for filename");
        HashMap::new()
    }

    /// Snapshot of all known projects, ordered by path.
    pub fn projects(&self) -> Vec<Project> {
        let state = self.state.read();
        let mut projects: Vec<Project> = state.projects.values().cloned().collect();
        projects.sort_by(|a, b| a.path().cmp(b.path()));
        projects
    }

    /// Snapshot of one project by its path key.
    pub fn project_by_path(&self, path: &str) -> Option<Project> {
        self.state.read().projects.get(path).cloned()
    }

    // ===================
    // State machine internals (run gate held)
    // ===================

    async fn init_locked(&self) {
        if !self.context.is_logged_in() {
            info!("pricing CLI session is not authenticated, prompting for login");
            self.events.publish(WorkspaceEvent::AuthRequired);
            return;
        }

        debug!(root = %self.root.display(), "initializing workspace");
        self.context.set_active(true);
        self.set_loading(true);

        {
            let mut state = self.state.write();
            state.projects.clear();
            state.files_to_projects.clear();
        }
        self.is_error.store(false, Ordering::SeqCst);

        let out = self.run_locked(&[]).await;
        if out.is_none() {
            self.is_error.store(true, Ordering::SeqCst);
        }

        self.set_loading(false);
        self.initial_populate_done.store(true, Ordering::SeqCst);
    }

    async fn file_change_locked(&self, path: &str) {
        let filename = clean_filename(path);
        let is_config_change = filename == self.root_file(CONFIG_FILE_NAME)
            || filename == self.root_file(CONFIG_TEMPLATE_NAME);
        let is_usage_change = Path::new(&filename)
            .file_name()
            .map(|name| name == USAGE_FILE_NAME)
            .unwrap_or(false);

        if !is_source_file(&filename) && !is_config_change && !is_usage_change {
            debug!(file = %filename, "ignoring file change");
            return;
        }

        if self.is_error() {
            // All projects were dropped by the failed run and cannot be
            // resolved to costs; only a full re-init recovers.
            self.init_locked().await;
            return;
        }

        if is_config_change || filename == self.root_file(USAGE_FILE_NAME) {
            // The set of projects affected by a root-level config or usage
            // change cannot be determined cheaply.
            self.init_locked().await;
            return;
        }

        self.set_loading(true);
        self.events.publish(WorkspaceEvent::CodeLensChanged);
        debug!(file = %filename, "detected file change");

        let known: Vec<String> = {
            let state = self.state.read();
            state
                .files_to_projects
                .get(&filename)
                .map(|owners| owners.iter().cloned().collect())
                .unwrap_or_default()
        };

        let targets = if known.is_empty() {
            debug!(file = %filename, "no known projects for file, trying directory adjacency");
            self.adjacent_projects(&filename)
        } else {
            known
        };

        if targets.is_empty() {
            debug!(file = %filename, "no project matches the changed file");
        } else {
            self.run_locked(&targets).await;
        }

        self.set_loading(false);
        self.events.publish(WorkspaceEvent::CodeLensChanged);
    }

    /// The aggregation run. Returns the parsed projects on success, `None`
    /// on any failure; failures are recorded as session state, with the
    /// auth refusal surfaced as a prompt rather than an error.
    async fn run_locked(&self, changed: &[String]) -> Option<Vec<ProjectBreakdown>> {
        match self.try_run(changed).await {
            Ok(projects) => {
                self.context.set_error(None);
                Some(projects)
            }
            Err(CoreError::AuthRequired) => {
                info!("pricing CLI refused to run without an API key");
                self.events.publish(WorkspaceEvent::AuthRequired);
                None
            }
            Err(CoreError::ConfigGenerate { message }) => {
                error!(error = %message, "config generation failed");
                self.context.set_error(Some(format!("{}.", message.trim())));
                None
            }
            Err(err) => {
                error!(error = %err, "pricing run failed");
                let message = if changed.is_empty() {
                    INITIAL_RUN_FAILED_MSG
                } else {
                    INCREMENTAL_RUN_FAILED_MSG
                };
                self.context.set_error(Some(message.to_string()));
                None
            }
        }
    }

    async fn try_run(&self, changed: &[String]) -> Result<Vec<ProjectBreakdown>, CoreError> {
        let template_path = self.root.join(CONFIG_TEMPLATE_NAME);
        let mut config_path = self.root.join(CONFIG_FILE_NAME);

        if template_path.exists() {
            config_path = std::env::temp_dir().join(CONFIG_FILE_NAME);
            let args: Vec<String> = vec![
                "generate".into(),
                "config".into(),
                "--template-path".into(),
                template_path.to_string_lossy().into_owned(),
                "--repo-path".into(),
                self.root.to_string_lossy().into_owned(),
                "--out-file".into(),
                config_path.to_string_lossy().into_owned(),
            ];
            let out = self.cli.exec(&args, None).await?;
            if !out.stderr.trim().is_empty() {
                return Err(CoreError::ConfigGenerate {
                    message: out.stderr,
                });
            }
        }

        let has_config = config_path.exists();
        let projects = if has_config {
            self.run_config_file(changed, &config_path).await?
        } else {
            self.run_breakdown(changed).await?
        };

        self.rebuild(&projects, changed, has_config);
        Ok(projects)
    }

    /// One CLI invocation against the project-config document, filtered down
    /// to the changed projects via a temporary copy when a subset was
    /// requested.
    async fn run_config_file(
        &self,
        changed: &[String],
        config_path: &Path,
    ) -> Result<Vec<ProjectBreakdown>, CoreError> {
        let mut effective = config_path.to_path_buf();

        if !changed.is_empty() {
            debug!("filtering config file projects to only those that have changed");

            let raw = tokio::fs::read_to_string(config_path).await.map_err(|source| {
                CoreError::ConfigRead {
                    path: config_path.to_path_buf(),
                    source,
                }
            })?;
            let mut doc: ConfigFile =
                serde_yaml::from_str(&raw).map_err(|source| CoreError::ConfigParse {
                    path: config_path.to_path_buf(),
                    source,
                })?;

            let changed_rel: Vec<String> = changed
                .iter()
                .map(|path| self.relative_to_root(path))
                .collect();
            doc.retain_paths(&changed_rel);

            let tmp = std::env::temp_dir().join(CONFIG_FILE_NAME);
            let dumped =
                serde_yaml::to_string(&doc).map_err(|source| CoreError::ConfigParse {
                    path: tmp.clone(),
                    source,
                })?;
            tokio::fs::write(&tmp, dumped)
                .await
                .map_err(|source| CoreError::ConfigWrite {
                    path: tmp.clone(),
                    source,
                })?;
            effective = tmp;
        }

        debug!(config = %effective.display(), "running pricing breakdown with config file");
        let args: Vec<String> = vec![
            "breakdown".into(),
            "--config-file".into(),
            effective.to_string_lossy().into_owned(),
            "--format".into(),
            "json".into(),
            "--log-level".into(),
            "info".into(),
        ];
        let out = self.cli.exec(&args, Some(&self.root)).await?;
        parse_output(&out)
    }

    /// One CLI invocation per target project path, sequentially. Later
    /// projects' index updates must not race earlier ones.
    async fn run_breakdown(&self, changed: &[String]) -> Result<Vec<ProjectBreakdown>, CoreError> {
        let targets: Vec<String> = if changed.is_empty() {
            vec![self.root.to_string_lossy().into_owned()]
        } else {
            changed.to_vec()
        };

        let mut projects = Vec::new();
        for project_path in &targets {
            debug!(path = %project_path, "running pricing breakdown");

            let mut args: Vec<String> = vec![
                "breakdown".into(),
                "--path".into(),
                project_path.clone(),
                "--format".into(),
                "json".into(),
                "--log-level".into(),
                "info".into(),
            ];
            if let Some(usage) = find_usage_file(Path::new(project_path), &self.root) {
                args.push("--usage-file".into());
                args.push(usage.to_string_lossy().into_owned());
            }

            let out = self.cli.exec(&args, None).await?;
            projects.extend(parse_output(&out)?);
        }

        Ok(projects)
    }

    /// Map the parsed output back onto source positions and swap each
    /// rebuilt project into the workspace. The new tree is assembled off to
    /// the side; the swap plus reverse-index update happens in one
    /// write-lock section, so no observer sees a half-built project.
    fn rebuild(&self, projects: &[ProjectBreakdown], changed: &[String], has_config: bool) {
        let full_run = changed.is_empty();

        for parsed in projects {
            debug!(project = %parsed.name, "found project in pricing output");
            let project_path = parsed.metadata.path.clone();

            let mut referenced_files: BTreeSet<String> = BTreeSet::new();
            let usage_path = Path::new(&project_path).join(USAGE_FILE_NAME);
            if usage_path.exists() {
                // Saving the project's usage file should re-run the project.
                referenced_files.insert(clean_filename(&usage_path.to_string_lossy()));
            }

            let name = if has_config {
                parsed.name.clone()
            } else {
                let rel = self.relative_to_root(&project_path);
                if rel.is_empty() {
                    parsed.name.clone()
                } else {
                    rel
                }
            };

            let mut formatted = Project::new(name, project_path.clone(), self.currency.clone());
            for resource in &parsed.breakdown.resources {
                for call in &resource.metadata.calls {
                    let filename = clean_filename(&call.filename);
                    debug!(file = %filename, project = %project_path, "adding file to project");

                    formatted
                        .ensure_block(&filename, &call.block_name, call.start_line)
                        .push_resource(resource.clone());
                    referenced_files.insert(filename);
                }
            }

            {
                let mut state = self.state.write();
                state.files_to_projects.retain(|file, owners| {
                    if !referenced_files.contains(file) {
                        owners.remove(&project_path);
                    }
                    !owners.is_empty()
                });
                for file in &referenced_files {
                    state
                        .files_to_projects
                        .entry(file.clone())
                        .or_default()
                        .insert(project_path.clone());
                }
                state.projects.insert(project_path.clone(), formatted);
            }

            // Reload any open detail panels against the fresh tree.
            {
                let state = self.state.read();
                if let Some(project) = state.projects.get(&project_path) {
                    for key in self.displays.keys() {
                        if let Some((file, block_name)) = split_block_key(&key) {
                            if let Some(block) = project.block_at(file, block_name) {
                                block.display(&self.displays);
                            }
                        }
                    }
                }
            }

            if full_run && self.initial_populate_done.load(Ordering::SeqCst) {
                self.events
                    .publish(WorkspaceEvent::TreeChanged(project_path));
                debug!("rebuilding cost tree view after project run");
            }
        }
    }

    /// Fallback attribution for a file no project is known to reference:
    /// any project whose normalized root directory equals the file's parent
    /// directory claims it.
    fn adjacent_projects(&self, filename: &str) -> Vec<String> {
        let Some(parent) = Path::new(filename).parent() else {
            return Vec::new();
        };

        let state = self.state.read();
        state
            .projects
            .keys()
            .filter(|project| {
                let project_dir = PathBuf::from(clean_filename(project));
                debug!(file = %filename, project = %project, "evaluating directory adjacency");
                project_dir == parent
            })
            .cloned()
            .collect()
    }

    fn relative_to_root(&self, path: &str) -> String {
        Path::new(path)
            .strip_prefix(&self.root)
            .map(|rel| rel.to_string_lossy().into_owned())
            .unwrap_or_else(|_| path.to_string())
    }

    fn root_file(&self, name: &str) -> String {
        clean_filename(&self.root.join(name).to_string_lossy())
    }

    fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
        self.events.publish(WorkspaceEvent::LoadingChanged(loading));
    }
}

fn parse_output(out: &CliOutput) -> Result<Vec<ProjectBreakdown>, CoreError> {
    if out.stderr.contains(NO_API_KEY_ENV_MARKER) {
        return Err(CoreError::AuthRequired);
    }

    let doc: BreakdownDocument =
        serde_json::from_str(&out.stdout).map_err(|source| CoreError::OutputParse {
            message: "stdout was not a valid pricing document".to_string(),
            source,
        })?;

    if let Some(message) = &doc.error {
        if !message.is_empty() {
            return Err(CoreError::CliReported {
                message: message.clone(),
            });
        }
    }

    Ok(doc.projects)
}
