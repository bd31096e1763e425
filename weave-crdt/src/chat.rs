//! Chat transcript CRDT: single-channel message log with last-writer-wins
//! edit/delete ordering plus a wall-clock full-state merge path.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use weave_types::{LamportClock, LamportTimestamp, MessageId, ReplicaId};

use crate::error::CrdtError;
use crate::vector_clock::VectorClock;

/// Every message lands in this channel; `create-channel` is accepted but
/// never actually creates a second one (spec §9 open question).
pub const CANONICAL_CHANNEL: &str = "chat";

const DELETED_CONTENT: &str = "[Message deleted]";
const EDITED_SUFFIX: &str = " (edited)";
const ACTIVE_WINDOW: i64 = 600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub author: String,
    pub content: String,
    pub wall_timestamp: DateTime<Utc>,
    pub channel: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatOpKind {
    Send,
    Edit,
    Delete,
    CreateChannel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatOpKey {
    Message(MessageId),
    Channel(String),
}

/// A single applied (or attempted) chat operation. `value` is the whole
/// new `Message` for `send`/`edit`; `None` for `delete`/`create-channel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOp {
    pub kind: ChatOpKind,
    pub key: ChatOpKey,
    pub value: Option<Message>,
    pub timestamp: LamportTimestamp,
    pub author: String,
}

/// Full-state digest: everything needed for a one-round sync per spec §4.3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStateDigest {
    pub replica_id: ReplicaId,
    pub vector_clock: VectorClock,
    pub messages: HashMap<MessageId, Message>,
    pub channel_index: Vec<MessageId>,
    pub wall_timestamp: DateTime<Utc>,
}

pub struct ChatCrdt {
    replica_id: ReplicaId,
    clock: LamportClock,
    vector_clock: VectorClock,
    messages: HashMap<MessageId, (Message, LamportTimestamp)>,
    channel_index: Vec<MessageId>,
    op_log: Vec<ChatOp>,
    seen: HashSet<(ReplicaId, u64)>,
}

impl ChatCrdt {
    #[must_use]
    pub fn new(replica_id: ReplicaId) -> Self {
        Self {
            replica_id,
            clock: LamportClock::new(replica_id),
            vector_clock: VectorClock::for_replica(replica_id),
            messages: HashMap::new(),
            channel_index: Vec::new(),
            op_log: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Sends a new message to the single channel.
    pub fn send(&mut self, content: &str, author: &str) -> ChatOp {
        let message_id = MessageId::new();
        let message = Message {
            message_id,
            author: author.to_string(),
            content: content.to_string(),
            wall_timestamp: Utc::now(),
            channel: CANONICAL_CHANNEL.to_string(),
        };
        self.vector_clock.increment(self.replica_id);
        self.apply_local(ChatOpKind::Send, ChatOpKey::Message(message_id), Some(message), author)
    }

    /// Edits a message this replica authored. Remote edits never go
    /// through this path, so they never see this author check (spec §4.3).
    pub fn edit(&mut self, message_id: MessageId, new_content: &str, author: &str) -> Result<ChatOp, CrdtError> {
        let (existing, _) = self
            .messages
            .get(&message_id)
            .ok_or_else(|| CrdtError::InvalidArgument(format!("no such message {message_id}")))?;
        if existing.author != author {
            return Err(CrdtError::PreconditionFailed(format!(
                "{author} is not the author of {message_id}"
            )));
        }
        let edited = Message {
            message_id,
            author: existing.author.clone(),
            content: format!("{new_content}{EDITED_SUFFIX}"),
            wall_timestamp: existing.wall_timestamp,
            channel: existing.channel.clone(),
        };
        self.vector_clock.increment(self.replica_id);
        Ok(self.apply_local(ChatOpKind::Edit, ChatOpKey::Message(message_id), Some(edited), author))
    }

    /// Soft-deletes a message this replica authored.
    pub fn delete(&mut self, message_id: MessageId, author: &str) -> Result<ChatOp, CrdtError> {
        let (existing, _) = self
            .messages
            .get(&message_id)
            .ok_or_else(|| CrdtError::InvalidArgument(format!("no such message {message_id}")))?;
        if existing.author != author {
            return Err(CrdtError::PreconditionFailed(format!(
                "{author} is not the author of {message_id}"
            )));
        }
        self.vector_clock.increment(self.replica_id);
        Ok(self.apply_local(ChatOpKind::Delete, ChatOpKey::Message(message_id), None, author))
    }

    /// `create-channel` exists in the protocol for forward compatibility
    /// but this crate runs single-channel mode, so it is always a no-op.
    pub fn create_channel(&mut self, _name: &str, _author: &str) -> Result<(), CrdtError> {
        Ok(())
    }

    fn apply_local(&mut self, kind: ChatOpKind, key: ChatOpKey, value: Option<Message>, author: &str) -> ChatOp {
        let timestamp = self.clock.tick();
        let op = ChatOp {
            kind,
            key,
            value,
            timestamp,
            author: author.to_string(),
        };
        self.apply(op.clone());
        op
    }

    /// Applies a remote op. Returns whether it changed observable state
    /// (`false` also covers duplicate delivery and no-op `create-channel`).
    pub fn apply_remote_op(&mut self, op: ChatOp) -> bool {
        self.clock.observe(op.timestamp);
        self.apply(op)
    }

    fn apply(&mut self, op: ChatOp) -> bool {
        if !self.seen.insert((op.timestamp.replica_id(), op.timestamp.counter())) {
            return false;
        }

        let accepted = match &op.key {
            ChatOpKey::Channel(_) => false, // create-channel: logged, never mutates state
            ChatOpKey::Message(message_id) => {
                let message_id = *message_id;
                let accept = match self.messages.get(&message_id) {
                    None => true,
                    Some((_, last)) => op.timestamp > *last,
                };
                if accept {
                    if let Some(applied) = self.resolve_applied_message(&op, message_id) {
                        let is_new = !self.messages.contains_key(&message_id);
                        self.messages.insert(message_id, (applied, op.timestamp));
                        if is_new && !self.channel_index.contains(&message_id) {
                            self.channel_index.push(message_id);
                        }
                        true
                    } else {
                        false
                    }
                } else {
                    false
                }
            }
        };

        self.op_log.push(op);
        accepted
    }

    /// Builds the `Message` that should be stored for an accepted op.
    /// `send`/`edit` carry the whole message on the wire; `delete`
    /// reconstructs a tombstone from whatever is already stored locally
    /// (and is skipped if nothing is known about the message yet).
    fn resolve_applied_message(&self, op: &ChatOp, message_id: MessageId) -> Option<Message> {
        match op.kind {
            ChatOpKind::Send | ChatOpKind::Edit => op.value.clone().map(|mut m| {
                m.channel = CANONICAL_CHANNEL.to_string();
                m
            }),
            ChatOpKind::Delete => {
                let (existing, _) = self.messages.get(&message_id)?;
                Some(Message {
                    message_id,
                    author: existing.author.clone(),
                    content: DELETED_CONTENT.to_string(),
                    wall_timestamp: existing.wall_timestamp,
                    channel: existing.channel.clone(),
                })
            }
            ChatOpKind::CreateChannel => None,
        }
    }

    #[must_use]
    pub fn get_message(&self, message_id: MessageId) -> Option<&Message> {
        self.messages.get(&message_id).map(|(m, _)| m)
    }

    /// Messages in the single channel, ordered by Lamport timestamp of
    /// their last-accepted op (a total order, unlike wall-clock time).
    #[must_use]
    pub fn messages_in_channel(&self) -> Vec<Message> {
        let mut entries: Vec<_> = self
            .channel_index
            .iter()
            .filter_map(|id| self.messages.get(id))
            .collect();
        entries.sort_by_key(|(_, ts)| *ts);
        entries.into_iter().map(|(m, _)| m.clone()).collect()
    }

    /// The highest Lamport timestamp across every op this replica has
    /// ever applied — see [`crate::GridCrdt::latest_timestamp`] for why.
    #[must_use]
    pub fn latest_timestamp(&self) -> Option<LamportTimestamp> {
        self.op_log.iter().map(|op| op.timestamp).max()
    }

    #[must_use]
    pub fn ops_since(&self, since: Option<LamportTimestamp>) -> Vec<ChatOp> {
        match since {
            None => self.op_log.clone(),
            Some(t0) => self.op_log.iter().filter(|op| op.timestamp > t0).cloned().collect(),
        }
    }

    /// Substring match against content and author, ranked by descending
    /// occurrence count then descending wall timestamp (spec §4.3).
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Message> {
        let needle = query.to_lowercase();
        let mut hits: Vec<Message> = self
            .messages
            .values()
            .filter(|(m, _)| {
                m.content.to_lowercase().contains(&needle) || m.author.to_lowercase().contains(&needle)
            })
            .map(|(m, _)| m.clone())
            .collect();
        hits.sort_by(|a, b| {
            let count_a = a.content.to_lowercase().matches(&needle).count();
            let count_b = b.content.to_lowercase().matches(&needle).count();
            count_b
                .cmp(&count_a)
                .then_with(|| b.wall_timestamp.cmp(&a.wall_timestamp))
        });
        hits
    }

    /// Authors who sent a message in the last 600 seconds of local wall time.
    #[must_use]
    pub fn active_users(&self) -> Vec<String> {
        let now = Utc::now();
        let mut authors: Vec<String> = self
            .messages
            .values()
            .filter(|(m, _)| now.signed_duration_since(m.wall_timestamp) < Duration::seconds(ACTIVE_WINDOW))
            .map(|(m, _)| m.author.clone())
            .collect();
        authors.sort();
        authors.dedup();
        authors
    }

    /// Every author who has ever sent a message, regardless of how long ago
    /// or whether that message was later edited or deleted (unlike
    /// [`Self::active_users`], this has no time window).
    #[must_use]
    pub fn known_authors(&self) -> Vec<String> {
        let mut authors: Vec<String> = self.messages.values().map(|(m, _)| m.author.clone()).collect();
        authors.sort();
        authors.dedup();
        authors
    }

    /// Builds the full-state digest this replica would send for a state sync.
    #[must_use]
    pub fn state_digest(&self) -> ChatStateDigest {
        ChatStateDigest {
            replica_id: self.replica_id,
            vector_clock: self.vector_clock.clone(),
            messages: self.messages.iter().map(|(id, (m, _))| (*id, m.clone())).collect(),
            channel_index: self.channel_index.clone(),
            wall_timestamp: Utc::now(),
        }
    }

    /// Merges a remote full-state digest. Unlike [`Self::apply_remote_op`],
    /// this path compares `wall_timestamp` rather than Lamport order for
    /// already-known messages — a known weakness carried over verbatim
    /// from the source behavior (spec §9): clock skew between replicas can
    /// make this branch keep the wrong side. Prefer the delta/op path
    /// wherever a Lamport-ordered history is available.
    ///
    /// The digest carries no Lamport timestamps at all (spec §4.4's state
    /// payload shape has none), so a freshly-inserted message is stored
    /// with the lowest possible timestamp for its origin replica rather
    /// than one derived from our own clock — that keeps a later delta-path
    /// op for the same id free to supersede it on arrival, and never
    /// forges a timestamp we didn't actually observe.
    pub fn merge_state(&mut self, remote: &ChatStateDigest) -> bool {
        let mut changed = self.vector_clock.merge(&remote.vector_clock);

        for (message_id, remote_message) in &remote.messages {
            match self.messages.get(message_id) {
                None => {
                    let mut inserted = remote_message.clone();
                    inserted.channel = CANONICAL_CHANNEL.to_string();
                    let placeholder_ts = LamportTimestamp::new(remote.replica_id, 0);
                    self.messages.insert(*message_id, (inserted, placeholder_ts));
                    changed = true;
                }
                Some((local_message, last_ts)) => {
                    if remote_message.wall_timestamp > local_message.wall_timestamp {
                        let mut replacement = remote_message.clone();
                        replacement.channel = CANONICAL_CHANNEL.to_string();
                        self.messages.insert(*message_id, (replacement, *last_ts));
                        changed = true;
                    }
                }
            }
        }

        for message_id in self.messages.keys().copied().collect::<Vec<_>>() {
            if !self.channel_index.contains(&message_id) {
                self.channel_index.push(message_id);
                changed = true;
            }
        }

        changed
    }
}
