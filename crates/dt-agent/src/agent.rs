//! The common agent envelope (`id`, `kind`, message queues, tags) wrapping
//! the two concrete agent bodies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dt_core::{AgentId, AgentKind, MsgQueue};

use crate::broker::Broker;
use crate::truck::Truck;

/// Tagged union of the two concrete agent kinds the world and broker
/// dispatch over.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentBody {
    Truck(Truck),
    Broker(Broker),
}

impl AgentBody {
    pub fn kind(&self) -> AgentKind {
        match self {
            AgentBody::Truck(_) => AgentKind::Truck,
            AgentBody::Broker(_) => AgentKind::Broker,
        }
    }

    pub fn as_truck(&self) -> Option<&Truck> {
        match self {
            AgentBody::Truck(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_truck_mut(&mut self) -> Option<&mut Truck> {
        match self {
            AgentBody::Truck(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_broker(&self) -> Option<&Broker> {
        match self {
            AgentBody::Broker(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_broker_mut(&mut self) -> Option<&mut Broker> {
        match self {
            AgentBody::Broker(b) => Some(b),
            _ => None,
        }
    }
}

/// An agent record: the shared envelope (`id`, message queues, tags) around
/// a [`AgentBody`] variant payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub msgs: MsgQueue,
    #[serde(default)]
    pub tags: HashMap<String, Value>,
    pub body: AgentBody,
}

impl Agent {
    pub fn new_truck(truck: Truck) -> Self {
        Self { id: truck.id.clone(), msgs: MsgQueue::new(), tags: HashMap::new(), body: AgentBody::Truck(truck) }
    }

    pub fn new_broker(broker: Broker) -> Self {
        Self { id: broker.id.clone(), msgs: MsgQueue::new(), tags: HashMap::new(), body: AgentBody::Broker(broker) }
    }

    pub fn kind(&self) -> AgentKind {
        self.body.kind()
    }

    /// Topics this agent is subscribed to for broadcast delivery, stored
    /// under the `"topics"` tag as a JSON array of strings.
    pub fn topics(&self) -> Vec<String> {
        match self.tags.get("topics") {
            Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect(),
            _ => Vec::new(),
        }
    }

    pub fn subscribe(&mut self, topic: impl Into<String>) {
        let mut topics = self.topics();
        let topic = topic.into();
        if !topics.contains(&topic) {
            topics.push(topic);
        }
        self.tags.insert("topics".to_string(), Value::Array(topics.into_iter().map(Value::String).collect()));
    }
}
