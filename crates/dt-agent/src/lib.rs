//! `dt-agent` — the data model shared by agents and buildings: packages,
//! buildings (parking / gas station / site), delivery tasks, and the tagged
//! `Agent` enum (truck / broker).
//!
//! # Crate layout
//!
//! | Module      | Contents                                                |
//! |-------------|----------------------------------------------------------|
//! | [`agent`]   | `Agent`, `AgentBody` — the truck/broker envelope         |
//! | [`truck`]   | `Truck`, `Tachograph`, `FuelState`, `DeliveryTask`        |
//! | [`broker`]  | `Broker`, `Negotiation`                                  |
//! | [`package`] | `Package`, `Priority`, `Urgency`, `PackageStatus`         |
//! | [`site`]    | `Site`, package-generation config and statistics          |
//! | [`building`]| `Building` (`Parking`/`GasStation`/`Site`), `Occupiable`  |
//! | [`store`]   | `AgentStore`, `BuildingStore`, `PackageStore`             |
//! | [`error`]   | `AgentError`, `AgentResult`                               |
//!
//! The decision logic that drives a truck or broker each tick — the nine-step
//! priority ladder, the negotiation state machine — lives in `dt-behavior`;
//! this crate owns only the data and its local invariants (capacity checks,
//! occupancy bookkeeping, status transitions).

pub mod agent;
pub mod broker;
pub mod building;
pub mod error;
pub mod package;
pub mod site;
pub mod store;
pub mod truck;

#[cfg(test)]
mod tests;

pub use agent::{Agent, AgentBody};
pub use broker::{Broker, Negotiation, NegotiationStatus};
pub use building::{Building, GasStation, Occupiable, Parking};
pub use error::{AgentError, AgentResult};
pub use package::{Package, PackageStatus, Priority, Urgency};
pub use site::{PackageGenConfig, PackageParams, Site, SiteStats};
pub use store::{AgentStore, BuildingStore, PackageStore};
pub use truck::{DeliveryTask, FuelState, Position, Tachograph, TaskStatus, TaskType, Truck, TruckFlags};
