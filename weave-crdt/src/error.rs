//! Errors surfaced across the CRDT apply boundary.
//!
//! Only the two caller-visible kinds from the error taxonomy live here:
//! invalid arguments and precondition failures. Transient/protocol/wire
//! errors belong to the sync and transport layers, which see the network.

use thiserror::Error;

/// Errors returned by the local mutation paths of [`crate::GridCrdt`] and
/// [`crate::ChatCrdt`]. Never raised for remote op application — that
/// path only ever accepts or rejects via the LWW rule, silently.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CrdtError {
    /// Out-of-bounds coordinate, empty clue/answer, or similar caller mistake.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A well-formed request that cannot be satisfied given current state:
    /// writing to a black cell, placing a word that doesn't fit or crosses
    /// a black cell, editing/deleting a message authored by someone else.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
}
