//! Error types for costlens-core
//!
//! All pricing-run failures are converted to session state at the
//! orchestrator boundary; nothing here escapes to the host process.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for costlens operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Subprocess Errors
    // ===================
    #[error("Failed to launch pricing CLI: {binary}")]
    CliSpawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Pricing CLI reported an error: {message}")]
    CliReported { message: String },

    /// The CLI refused to run because no API key is configured. This is an
    /// auth prompt, not a run failure: it must never set the error state.
    #[error("Pricing CLI requires authentication")]
    AuthRequired,

    // ===================
    // Parse Errors
    // ===================
    #[error("Failed to parse pricing output: {message}")]
    OutputParse {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    // ===================
    // Config Errors
    // ===================
    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write config file: {path}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config generation failed: {message}")]
    ConfigGenerate { message: String },
}

impl CoreError {
    /// True for the auth short-circuit, which bypasses the generic
    /// error-state handling in the orchestrator.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, CoreError::AuthRequired)
    }
}
