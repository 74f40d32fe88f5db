//! Pricing CLI subprocess runner
//!
//! Invokes the external cloudcost binary and captures its complete output.
//! Exit codes are never interpreted here: callers parse stdout as JSON and
//! inspect stderr for the known auth signatures. Retries, if any, are a
//! caller policy.

use crate::error::CoreError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Marker printed to stdout by `auth login` on success.
pub const AUTH_SUCCESS_MARKER: &str = "Your account has been authenticated";

/// Stderr signature meaning no API key is configured (login-state probe).
pub const NO_API_KEY_MARKER: &str = "No API key";

/// Stderr signature meaning a run was refused for want of an API key.
/// Surfaced as an auth prompt, never as a run failure.
pub const NO_API_KEY_ENV_MARKER: &str = "No API key environment";

/// Captured output of one CLI invocation.
#[derive(Debug, Clone, Default)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Handle on the external pricing binary.
pub struct PricingCli {
    binary_path: PathBuf,
}

impl PricingCli {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Run the pricing binary with the fixed environment overrides, capturing
    /// all stdout/stderr bytes. Resolves only once the process has closed;
    /// there are no partial reads and no timeout at this layer.
    pub async fn exec<I, S>(&self, args: I, cwd: Option<&Path>) -> Result<CliOutput, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(args)
            .env("CLOUDCOST_CLI_PLATFORM", "editor")
            .env("CLOUDCOST_NO_COLOR", "true")
            .env("CLOUDCOST_SKIP_UPDATE_CHECK", "true")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!(binary = %self.binary_path.display(), "executing pricing CLI");

        let output = cmd.output().await.map_err(|source| CoreError::CliSpawn {
            binary: self.binary_path.clone(),
            source,
        })?;

        Ok(CliOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
