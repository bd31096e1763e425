//! Sync engine — pure logic for producing and ingesting sync payloads.
//!
//! Holds no CRDT state of its own; every method takes the caller's
//! `GridCrdt`/`ChatCrdt` by reference, so ownership of that state stays
//! with the replica (a single serializing boundary per spec §5) rather
//! than being duplicated here.

use crate::protocol::SyncPayload;
use tracing::warn;
use weave_crdt::{ChatCrdt, GridCrdt};
use weave_types::LamportTimestamp;

/// Builds and ingests [`SyncPayload`]s against a replica's CRDT state.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncEngine;

impl SyncEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds a delta payload: every op generated after `since` on both
    /// documents, each mapped into its wire-level `WireOp`.
    #[must_use]
    pub fn make_delta_payload(&self, grid: &GridCrdt, chat: &ChatCrdt, since: Option<LamportTimestamp>) -> SyncPayload {
        let mut ops: Vec<_> = grid.ops_since(since).into_iter().map(Into::into).collect();
        ops.extend(chat.ops_since(since).into_iter().map(Into::into));
        SyncPayload::Ops { since, ops }
    }

    /// Builds a full-state payload covering both documents.
    #[must_use]
    pub fn make_state_payload(&self, grid: &GridCrdt, chat: &ChatCrdt) -> SyncPayload {
        SyncPayload::State {
            grid: Some(grid.state_digest()),
            chat: Some(chat.state_digest()),
        }
    }

    /// Ingests a payload into the caller's CRDT state, returning whether
    /// anything actually changed. Per spec §4.4, a payload that fails to
    /// deserialize is rejected before it ever reaches this function
    /// (handled at the transport boundary); an op within an otherwise
    /// well-formed payload that matches neither the grid nor chat wire
    /// shape is skipped individually rather than failing the batch.
    pub fn ingest_payload(&self, grid: &mut GridCrdt, chat: &mut ChatCrdt, payload: &SyncPayload) -> bool {
        match payload {
            SyncPayload::Ops { ops, .. } => {
                let mut changed = false;
                for op in ops {
                    if let Some(grid_op) = op.clone().into_grid_op() {
                        if grid.apply_remote_op(grid_op) {
                            changed = true;
                        }
                    } else if let Some(chat_op) = op.clone().into_chat_op() {
                        if chat.apply_remote_op(chat_op) {
                            changed = true;
                        }
                    } else {
                        warn!("dropping wire op that matches neither grid nor chat shape");
                    }
                }
                changed
            }
            SyncPayload::State { grid: grid_digest, chat: chat_digest } => {
                let mut changed = false;
                if let Some(digest) = grid_digest {
                    changed |= grid.merge_state(digest);
                }
                if let Some(digest) = chat_digest {
                    changed |= chat.merge_state(digest);
                }
                changed
            }
        }
    }
}
