//! The inter-agent message bus envelope.
//!
//! Every agent owns an inbox and an outbox of [`Msg`]. The world's delivery
//! phase moves each outbox message into the recipient's inbox — either a
//! single `dst`, or every agent subscribed to `topic` — then clears outboxes.
//! Messages sent during tick N's decide phase are only visible to the
//! recipient's decide phase on tick N+1 (see dt-world's tick loop).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AgentId;

/// A message passed between two agents, or broadcast to topic subscribers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Msg {
    /// Sending agent.
    pub src: AgentId,
    /// Direct recipient. `None` means "broadcast via `topic`".
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dst: Option<AgentId>,
    /// Topic to broadcast on when `dst` is absent.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub topic: Option<String>,
    /// Message discriminator, e.g. `"proposal"`, `"accept"`, `"assignment_confirmed"`.
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Arbitrary structured payload.
    #[serde(default)]
    pub body: Value,
}

impl Msg {
    /// Build a point-to-point message.
    pub fn to(src: AgentId, dst: AgentId, msg_type: impl Into<String>, body: Value) -> Self {
        Self { src, dst: Some(dst), topic: None, msg_type: msg_type.into(), body }
    }

    /// Build a topic broadcast message.
    pub fn broadcast(src: AgentId, topic: impl Into<String>, msg_type: impl Into<String>, body: Value) -> Self {
        Self { src, dst: None, topic: Some(topic.into()), msg_type: msg_type.into(), body }
    }
}

/// Per-agent inbox/outbox pair, drained and filled once per tick.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MsgQueue {
    pub inbox: Vec<Msg>,
    pub outbox: Vec<Msg>,
}

impl MsgQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message for delivery on the next tick boundary.
    pub fn send(&mut self, msg: Msg) {
        self.outbox.push(msg);
    }

    /// Drain the inbox for processing during `decide`.
    pub fn drain_inbox(&mut self) -> Vec<Msg> {
        std::mem::take(&mut self.inbox)
    }
}
