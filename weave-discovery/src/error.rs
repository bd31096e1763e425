//! Errors surfaced by the discovery layer (spec §7).

use thiserror::Error;

/// Errors raised while running the discovery tasks. All of these are
/// recovered internally per spec §7 — callers observe discovery only
/// through [`crate::DiscoveryEvent`] and logs, never through a `Result`
/// returned from a long-running task.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A required listener socket could not be bound at startup.
    #[error("fatal: cannot bind {0}")]
    Fatal(String),

    /// A send/recv/connect attempt failed transiently.
    #[error("transport error: {0}")]
    TransportTransient(String),
}
