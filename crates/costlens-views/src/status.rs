//! Status bar model
//!
//! A tiny loading/ready indicator fed by the workspace event bus. Hosts
//! render `text()` however they like.

use costlens_core::{EventBus, WorkspaceEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct StatusBar {
    loading: AtomicBool,
}

impl StatusBar {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_loading(&self) {
        self.loading.store(true, Ordering::SeqCst);
    }

    pub fn set_ready(&self) {
        self.loading.store(false, Ordering::SeqCst);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn text(&self) -> &'static str {
        if self.is_loading() {
            "costlens: refreshing costs..."
        } else {
            "costlens: ready"
        }
    }

    /// Follow the workspace loading state until the event bus closes.
    pub fn observe(self: &Arc<Self>, bus: &EventBus) {
        let status = Arc::clone(self);
        let mut rx = bus.subscribe();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(WorkspaceEvent::LoadingChanged(true)) => status.set_loading(),
                    Ok(WorkspaceEvent::LoadingChanged(false)) => status.set_ready(),
                    Ok(_) => {}
                    // Lagged receivers just pick up the next state change.
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_follows_state() {
        let status = StatusBar::new();
        assert_eq!(status.text(), "costlens: ready");

        status.set_loading();
        assert_eq!(status.text(), "costlens: refreshing costs...");

        status.set_ready();
        assert!(!status.is_loading());
    }

    #[tokio::test]
    async fn test_observe_tracks_loading_events() {
        let bus = EventBus::default_capacity();
        let status = StatusBar::new();
        status.observe(&bus);

        bus.publish(WorkspaceEvent::LoadingChanged(true));
        tokio::task::yield_now().await;
        // Give the listener a beat to drain the channel.
        for _ in 0..50 {
            if status.is_loading() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(status.is_loading());

        bus.publish(WorkspaceEvent::LoadingChanged(false));
        for _ in 0..50 {
            if !status.is_loading() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!status.is_loading());
    }
}
