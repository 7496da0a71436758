//! Typed error taxonomy for the orchestrator core.
//!
//! Call sites raise an [`OrchestratorError`] variant and usually wrap it in
//! an `anyhow::Error` via `.context(...)` so the fatal message keeps both the
//! machine-checkable kind and a human-readable chain.

use thiserror::Error;

/// One of the six error kinds named by the orchestrator's error-handling
/// design. Each variant corresponds to a distinct propagation rule.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Wrong OS, missing required binary, missing plan path. Always fatal
    /// before the executor tree is built.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Unknown controller type, invalid entity name, unparseable cgroup
    /// stat file shape.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Non-zero exit status or spawn failure.
    #[error("subprocess failed: {0}")]
    Subprocess(String),

    /// A hard `timeout` wait cap was exceeded.
    #[error("timeout exceeded after {seconds}s running `{cmd}`")]
    Timeout { cmd: String, seconds: u64 },

    /// A `{m:<ns>:<key>}` placeholder could not be bound against the
    /// context chain.
    #[error("unresolved placeholder `{0}` in command template")]
    UnresolvedPlaceholder(String),

    /// An invariant was violated by the caller (e.g. a `StatTimer` was
    /// started while already active).
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl OrchestratorError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn subprocess(msg: impl Into<String>) -> Self {
        Self::Subprocess(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn unresolved_placeholder(token: impl Into<String>) -> Self {
        Self::UnresolvedPlaceholder(token.into())
    }
}
