//! Save watcher for workspace source and config files
//!
//! Stands in for an editor host's document-save event when the engine runs
//! standalone. Uses notify with per-path debouncing and forwards relevant
//! changes to the workspace orchestrator, which applies its own validity
//! and attribution rules.

use crate::event::WorkspaceEvent;
use crate::models::config::{CONFIG_FILE_NAME, CONFIG_TEMPLATE_NAME, USAGE_FILE_NAME};
use crate::paths::is_source_file;
use crate::workspace::Workspace;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace};

/// Configuration for the save watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Base debounce delay
    pub debounce_delay: Duration,

    /// Maximum debounce delay during burst
    pub max_debounce_delay: Duration,

    /// Burst detection threshold (events per second)
    pub burst_threshold: u32,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_delay: Duration::from_millis(500),
            max_debounce_delay: Duration::from_secs(3),
            burst_threshold: 10,
        }
    }
}

/// File watcher that monitors the workspace root for saves
pub struct SaveWatcher {
    /// Notify watcher instance
    _watcher: RecommendedWatcher,

    /// Shutdown signal
    shutdown_tx: mpsc::Sender<()>,
}

impl SaveWatcher {
    /// Start watching the workspace root.
    pub fn start(workspace: Arc<Workspace>, config: WatcherConfig) -> Result<Self, notify::Error> {
        let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(100);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.blocking_send(res);
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(workspace.root(), RecursiveMode::Recursive)?;
        info!(root = %workspace.root().display(), "save watcher started");

        let save_watcher = Self {
            _watcher: watcher,
            shutdown_tx,
        };

        tokio::spawn(async move {
            let mut debounce = DebounceState::new(config);

            loop {
                tokio::select! {
                    Some(result) = event_rx.recv() => {
                        match result {
                            Ok(event) => {
                                for path in Self::relevant_paths(&event) {
                                    if debounce.should_emit(&path) {
                                        debug!(path = %path, "dispatching save event");
                                        workspace.file_change(&path).await;
                                    }
                                }
                            }
                            Err(e) => {
                                error!(error = %e, "save watcher error");
                                workspace
                                    .events()
                                    .publish(WorkspaceEvent::WatcherError(e.to_string()));
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("save watcher shutting down");
                        break;
                    }
                }
            }
        });

        Ok(save_watcher)
    }

    /// Filter a notify event down to paths the orchestrator cares about.
    fn relevant_paths(event: &Event) -> Vec<String> {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => {}
            _ => return Vec::new(),
        }

        event
            .paths
            .iter()
            .filter_map(|path| {
                let raw = path.to_string_lossy().into_owned();
                trace!(path = %raw, "processing file event");

                if is_source_file(&raw) || Self::is_config_name(path) {
                    Some(raw)
                } else {
                    None
                }
            })
            .collect()
    }

    fn is_config_name(path: &Path) -> bool {
        path.file_name()
            .map(|name| {
                name == CONFIG_FILE_NAME || name == CONFIG_TEMPLATE_NAME || name == USAGE_FILE_NAME
            })
            .unwrap_or(false)
    }

    /// Stop the watcher
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Debounce state for adaptive per-path debouncing
struct DebounceState {
    config: WatcherConfig,
    last_events: std::collections::HashMap<String, std::time::Instant>,
    event_count_window: std::collections::VecDeque<std::time::Instant>,
}

impl DebounceState {
    fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            last_events: std::collections::HashMap::new(),
            event_count_window: std::collections::VecDeque::new(),
        }
    }

    fn should_emit(&mut self, path: &str) -> bool {
        let now = std::time::Instant::now();

        // Track event rate for burst detection
        self.event_count_window.push_back(now);
        while self
            .event_count_window
            .front()
            .map(|t| now.duration_since(*t) > Duration::from_secs(1))
            .unwrap_or(false)
        {
            self.event_count_window.pop_front();
        }

        // Calculate adaptive delay
        let delay = if self.event_count_window.len() as u32 > self.config.burst_threshold {
            self.config.max_debounce_delay
        } else {
            self.config.debounce_delay
        };

        // Check if enough time has passed
        if let Some(last) = self.last_events.get(path) {
            if now.duration_since(*last) < delay {
                trace!(path = %path, "debouncing event");
                return false;
            }
        }

        self.last_events.insert(path.to_string(), now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_debounce_state_basic() {
        let config = WatcherConfig {
            debounce_delay: Duration::from_millis(100),
            max_debounce_delay: Duration::from_millis(500),
            burst_threshold: 5,
        };
        let mut state = DebounceState::new(config);

        // First event should pass
        assert!(state.should_emit("/work/main.tf"));

        // Immediate second should be debounced
        assert!(!state.should_emit("/work/main.tf"));

        // Different path should pass
        assert!(state.should_emit("/work/db.tf"));
    }

    #[test]
    fn test_relevant_paths_source_file() {
        let event = Event {
            kind: EventKind::Modify(notify::event::ModifyKind::Data(
                notify::event::DataChange::Content,
            )),
            paths: vec![PathBuf::from("/work/app/main.tf")],
            ..Default::default()
        };

        assert_eq!(
            SaveWatcher::relevant_paths(&event),
            vec!["/work/app/main.tf".to_string()]
        );
    }

    #[test]
    fn test_relevant_paths_config_and_usage() {
        let event = Event {
            kind: EventKind::Create(notify::event::CreateKind::File),
            paths: vec![
                PathBuf::from("/work/cloudcost.yml"),
                PathBuf::from("/work/app/cloudcost-usage.yml"),
                PathBuf::from("/work/app/readme.md"),
            ],
            ..Default::default()
        };

        assert_eq!(
            SaveWatcher::relevant_paths(&event),
            vec![
                "/work/cloudcost.yml".to_string(),
                "/work/app/cloudcost-usage.yml".to_string()
            ]
        );
    }

    #[test]
    fn test_relevant_paths_ignores_removal() {
        let event = Event {
            kind: EventKind::Remove(notify::event::RemoveKind::File),
            paths: vec![PathBuf::from("/work/app/main.tf")],
            ..Default::default()
        };

        assert!(SaveWatcher::relevant_paths(&event).is_empty());
    }
}
