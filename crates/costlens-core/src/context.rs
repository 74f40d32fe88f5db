//! Process-wide session context
//!
//! A small typed record (login state, active flag, last error) shared by the
//! orchestrator and the view adapters. Injected explicitly wherever login
//! state is read, so the aggregation engine is testable without a UI host.

use crate::cli::{PricingCli, NO_API_KEY_MARKER};
use parking_lot::RwLock;
use tracing::debug;

/// Snapshot of the session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextState {
    pub logged_in: bool,
    pub active: bool,
    pub last_error: Option<String>,
}

/// Shared session context. Reset at every workspace initialization;
/// individual fields are set as side effects of login attempts and run
/// failures.
#[derive(Default)]
pub struct SessionContext {
    state: RwLock<ContextState>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe the CLI for an existing authenticated session and the configured
    /// currency. The "No API key" stderr signature means not logged in; the
    /// currency code is read from stdout, defaulting to USD.
    pub async fn detect(&self, cli: &PricingCli) -> String {
        self.reset();

        let currency = match cli.exec(["configure", "get", "currency"], None).await {
            Ok(out) => {
                let logged_in = !out.stderr.contains(NO_API_KEY_MARKER);
                debug!(logged_in, "detected pricing CLI session state");
                self.set_logged_in(logged_in);

                let code = out.stdout.trim();
                if code.is_empty() {
                    "USD".to_string()
                } else {
                    code.to_string()
                }
            }
            Err(err) => {
                debug!(error = %err, "could not probe pricing CLI, assuming logged out");
                self.set_logged_in(false);
                "USD".to_string()
            }
        };

        currency
    }

    /// Clear all state back to the defaults.
    pub fn reset(&self) {
        *self.state.write() = ContextState::default();
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.read().logged_in
    }

    pub fn set_logged_in(&self, logged_in: bool) {
        debug!(logged_in, "setting context login state");
        self.state.write().logged_in = logged_in;
    }

    pub fn is_active(&self) -> bool {
        self.state.read().active
    }

    pub fn set_active(&self, active: bool) {
        self.state.write().active = active;
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    /// Record or clear the user-facing error message.
    pub fn set_error(&self, error: Option<String>) {
        debug!(error = ?error, "setting context error state");
        self.state.write().last_error = error;
    }

    pub fn snapshot(&self) -> ContextState {
        self.state.read().clone()
    }
}
