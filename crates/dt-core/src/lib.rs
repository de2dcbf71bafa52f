//! `dt-core` — foundational types for the logistics simulation engine.
//!
//! This crate is a dependency of every other `dt-*` crate.  It intentionally
//! has no `dt-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `NodeId`, `EdgeId`, `BuildingId`, `PackageId`, `SiteId` |
//! | [`geo`]         | `GeoPoint`, planar Euclidean distance                 |
//! | [`time`]        | `Tick`, `TickData`, `SimClock`, `SimConfig`           |
//! | [`rng`]         | `AgentRng` (per-agent), `SimRng` (world-owned)        |
//! | [`msg`]         | `Msg` — the inter-agent message-bus envelope   |
//! | [`transport`]   | `RoadMode`, `RoadClass` — edge-attribute enums        |
//! | [`event`]       | `SimEvent` — the world's per-tick event log entries   |
//! | [`collections`] | `OrderedMap` — insertion-ordered id -> value map       |
//! | [`error`]       | `DtError`, `DtResult`                                 |

pub mod collections;
pub mod error;
pub mod event;
pub mod geo;
pub mod ids;
pub mod kind;
pub mod msg;
pub mod rng;
pub mod time;
pub mod transport;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use collections::OrderedMap;
pub use error::{DtError, DtResult};
pub use event::SimEvent;
pub use geo::GeoPoint;
pub use ids::{AgentId, BuildingId, EdgeId, NodeId, PackageId, SiteId};
pub use kind::{AgentKind, BuildingKind};
pub use msg::{Msg, MsgQueue};
pub use rng::{AgentRng, SimRng};
pub use time::{SimClock, SimConfig, Tick, TickData};
pub use transport::{RoadClass, RoadMode};
