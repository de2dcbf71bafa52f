//! `dt-world` — world state and the per-tick orchestration loop.
//!
//! # Crate layout
//!
//! | Module   | Contents                                                      |
//! |----------|-----------------------------------------------------------------|
//! | [`world`]| `World`, `TickReport` — the tick loop (`World::step`)          |
//! | [`diff`] | `AgentDiff`/`BuildingUpdate` watch-field diffing|
//! | [`save`] | `SaveDocument`/`MapDocument` export/import              |
//! | [`error`]| `WorldError`, `WorldResult<T>`                                 |
//!
//! `dt-world` is the only crate that owns a full simulation: it holds the
//! road graph, the three entity stores, the clock, and the per-agent RNGs,
//! and is the sole caller of `dt-behavior`'s truck/broker decision ladders.
//! `dt-transport` drives a `World` from the outside — it never reaches past
//! this crate's public API into `dt-agent`/`dt-spatial` directly.

pub mod diff;
pub mod error;
pub mod save;
pub mod world;

#[cfg(test)]
mod tests;

pub use diff::{AgentDiff, BuildingUpdate};
pub use error::{WorldError, WorldResult};
pub use save::{export_map, import_map, BuildingRecord, EdgeRecord, MapDocument, NodeRecord, SaveDocument, SaveMetadata};
pub use world::{TickReport, World};
