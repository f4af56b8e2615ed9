//! Execution-error taxonomy surfaced to callers.

use thiserror::Error;

/// Tagged outcome of a failed dispatch.
///
/// Every variant carries the engine's diagnostic text verbatim; failure is
/// always user-visible and never silently swallowed or converted into a
/// partially-populated result.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    /// Malformed SQL. Fatal, surfaced verbatim.
    #[error("parse error: {0}")]
    ParseError(String),

    /// The statement shape cannot go through the prepared API. Recoverable:
    /// triggers the direct-path fallback exactly once.
    #[error("statement cannot be prepared: {0}")]
    PrepareUnsupported(String),

    /// Parameter arity or type mismatch. Caller error, not retried.
    #[error("parameter binding error: {0}")]
    ParameterBindingError(String),

    /// Engine-side failure during actual execution. Never retried or fallen
    /// back: it may indicate partial side effects.
    #[error("execution error: {0}")]
    RuntimeExecutionError(String),

    /// Engine resources exhausted. Fatal for this call; any retry policy
    /// belongs to the caller.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl ExecutionError {
    /// The engine's underlying diagnostic message.
    pub fn engine_message(&self) -> &str {
        match self {
            Self::ParseError(message)
            | Self::PrepareUnsupported(message)
            | Self::ParameterBindingError(message)
            | Self::RuntimeExecutionError(message)
            | Self::ResourceExhausted(message) => message,
        }
    }

    /// Whether this failure makes the statement eligible for fallback.
    pub fn is_prepare_unsupported(&self) -> bool {
        matches!(self, Self::PrepareUnsupported(_))
    }
}
