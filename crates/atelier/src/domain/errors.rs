//! Domain-specific errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("location provider `{provider}` failed")]
    ProviderFailed {
        provider: String,
        #[source]
        source: ProviderError,
    },
    #[error("location lookup was canceled")]
    AggregationCanceled,
    #[error("action `{action}` not found for `{location}`")]
    UnknownAction { action: String, location: String },
    #[error("cannot derive a session name for `{}`", path.display())]
    UnnamedLocation { path: PathBuf },
}

/// Failures raised inside a single provider's fetch.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to run `{tool}`")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
    #[error("`{tool}` exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("invalid project path `{}`: {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: String },
    #[error("remote request failed: {0}")]
    Remote(String),
    #[error("provider task aborted: {0}")]
    Task(String),
}
