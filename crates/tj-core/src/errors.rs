//! Cross-cutting error types.
//!
//! Crate-specific errors (`BaasError`, `AuthError`, `InboxError`) live in their
//! own crates. They converge into `anyhow` only inside the `tj` binary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A role tag outside {requester, worker, affiliate}.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A path that does not map to any known route.
    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
