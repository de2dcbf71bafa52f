//! `dt-behavior` — the truck and broker decision ladders.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|---------------------------------------------------------------|
//! | [`context`] | `TruckContext`/`BrokerContext` — the world slice each ladder sees |
//! | [`msg`]     | Typed message bodies carried over the `dt_core::MsgQueue` bus  |
//! | [`truck`]   | `truck::decide` — the truck's nine-step priority ladder        |
//! | [`broker`]  | `broker::decide` — the single-negotiation-at-a-time matcher    |
//! | [`error`]   | `BehaviorError`, `BehaviorResult<T>`                            |
//!
//! # Design notes
//!
//! Neither ladder owns the world; both take an explicit context borrowed
//! from it for the duration of one `decide` call. `dt-world`'s tick loop is
//! what actually holds an `AgentStore`, rotates messages through the bus,
//! and invokes these functions agent by agent, in iteration order.

pub mod broker;
pub mod context;
pub mod error;
pub mod msg;
pub mod truck;

#[cfg(test)]
mod tests;

pub use context::{BrokerContext, TruckContext};
pub use error::{BehaviorError, BehaviorResult};
