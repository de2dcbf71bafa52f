//! `dt-transport` — the action/signal wire protocol, the bounded queues
//! crossing the controller/transport thread boundary, the tick-paced
//! [`SimulationController`], and the Axum WebSocket server that is the only
//! async boundary in the system.
//!
//! | module        | responsibility                                          |
//! |---------------|-----------------------------------------------------------|
//! | [`protocol`]  | `ActionMessage`/`SignalMessage` wire shapes               |
//! | [`actions`]   | `ActionType` — parses `"<domain>.<verb>"` action names     |
//! | [`queue`]     | `BoundedQueue<T>` — the shared `ActionQueue`/`SignalQueue`  |
//! | [`controller`]| `SimulationController` — owns `World`, runs the tick loop  |
//! | [`signals`]   | converts world outputs into outbound `SignalMessage`s      |
//! | [`server`]    | the Axum app: `GET /health`, `WS /ws`                      |
//! | [`error`]     | `TransportError`, `TransportResult<T>`                     |

pub mod actions;
pub mod controller;
pub mod error;
pub mod protocol;
pub mod queue;
pub mod server;
pub mod signals;

pub use controller::{ActionQueue, SignalQueue, SimulationController};
pub use error::{TransportError, TransportResult};
pub use protocol::{is_valid_action_name, ActionMessage, SignalMessage};
pub use queue::{BoundedQueue, DEFAULT_CAPACITY};
pub use server::{build_app, serve};
