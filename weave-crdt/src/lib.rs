//! CRDT data models for WeaveMesh: a crossword grid and a chat transcript,
//! both converging under last-writer-wins rules driven by Lamport time.
//!
//! All merge operations in this crate satisfy the usual CRDT properties:
//! - **Commutative**: `apply(a); apply(b)` ≡ `apply(b); apply(a)`
//! - **Idempotent**: `apply(a); apply(a)` ≡ `apply(a)`
//! - **Convergent**: replicas that have seen the same set of ops agree on
//!   observable state, independent of delivery order.

mod chat;
mod error;
mod grid;
mod vector_clock;

pub use chat::{
    ChatCrdt, ChatOp, ChatOpKey, ChatOpKind, ChatStateDigest, Message, CANONICAL_CHANNEL,
};
pub use error::CrdtError;
pub use grid::{Cell, Direction, GridCellEntry, GridCrdt, GridOp, GridSnapshot, GridStateDigest, Word};
pub use vector_clock::{CausalOrder, VectorClock};
