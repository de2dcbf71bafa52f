//! Action/signal wire shapes. An action is `{action, params}`; a signal
//! is `{signal, data}`. The action name must match `^[a-z_]+\.[a-z_]+$` — one
//! dot, lower-snake-case on both sides.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One inbound client message, parsed off a WebSocket text frame.
#[derive(Clone, Debug, Deserialize)]
pub struct ActionMessage {
    pub action: String,
    #[serde(default = "Value::default")]
    pub params: Value,
}

/// One outbound message, serialized to a WebSocket text frame.
#[derive(Clone, Debug, Serialize)]
pub struct SignalMessage {
    pub signal: String,
    pub data: Value,
}

impl SignalMessage {
    pub fn new(signal: impl Into<String>, data: Value) -> Self {
        Self { signal: signal.into(), data }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::new("error", serde_json::json!({ "code": code, "message": message.into() }))
    }
}

/// Validate an action name against `^[a-z_]+\.[a-z_]+$` without pulling in a
/// regex dependency the workspace doesn't otherwise need.
pub fn is_valid_action_name(name: &str) -> bool {
    let Some((domain, verb)) = name.split_once('.') else { return false };
    if domain.is_empty() || verb.is_empty() || verb.contains('.') {
        return false;
    }
    let is_lower_snake = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c == '_');
    is_lower_snake(domain) && is_lower_snake(verb)
}
