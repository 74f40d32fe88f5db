//! Event bus for costlens using tokio::broadcast
//!
//! Carries the change notifications consumed by the view adapters: inline
//! annotation (code lens) refresh, cost tree refresh, loading state, and
//! auth prompts.

use tokio::sync::broadcast;

/// Events emitted by the workspace orchestrator
#[derive(Debug, Clone)]
pub enum WorkspaceEvent {
    /// Inline cost annotations must be re-queried
    CodeLensChanged,
    /// The cost tree for one project path was rebuilt
    TreeChanged(String),
    /// The workspace entered or left its loading state
    LoadingChanged(bool),
    /// The pricing CLI requires authentication; the host should surface a
    /// login prompt
    AuthRequired,
    /// A login attempt succeeded
    LoggedIn,
    /// The save watcher encountered an error
    WatcherError(String),
}

/// Event bus for broadcasting workspace events
///
/// Uses tokio::broadcast for multi-consumer support. The lens provider,
/// tree provider, and status bar each hold their own receiver.
pub struct EventBus {
    sender: broadcast::Sender<WorkspaceEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (256 events)
    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: WorkspaceEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.sender.subscribe()
    }

    /// Get current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
