//! Domain events recorded during a tick and drained into the world's event
//! log at the end of `World::step`.
//!
//! These are distinct from [`crate::msg::Msg`]: a `Msg` is addressed
//! agent-to-agent and delivered with a one-tick delay; a `SimEvent` is a
//! fire-and-forget record of something that happened, destined for the
//! transport layer's `event.created`/`package.*`/`site.stats_update` signals
//! and for save-file history. Nothing in the engine ever reads a `SimEvent`
//! back.

use serde::{Deserialize, Serialize};

use crate::{AgentId, BuildingId, PackageId, SiteId, Tick};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    PackageCreated { package_id: PackageId, site_id: SiteId, tick: Tick },
    PackageExpired { package_id: PackageId, site_id: SiteId, value: f64, tick: Tick },
    PackagePickedUp { package_id: PackageId, truck_id: AgentId, tick: Tick },
    PackageDelivered { package_id: PackageId, truck_id: AgentId, on_time: bool, payment: f64, tick: Tick },

    NegotiationStarted { package_id: PackageId, tick: Tick },
    NegotiationFinalized { package_id: PackageId, truck_id: AgentId, tick: Tick },
    PickupExpiryFine { package_id: PackageId, amount: f64, tick: Tick },

    OutOfFuel { truck_id: AgentId, tick: Tick },
    FuelPurchased { truck_id: AgentId, gas_station_id: BuildingId, liters: f64, cost: f64, tick: Tick },
    TachographFine { truck_id: AgentId, amount: f64, over_hours: f64, tick: Tick },
    RestStarted { truck_id: AgentId, required_rest_s: f64, tick: Tick },
    RestEnded { truck_id: AgentId, tick: Tick },

    SiteStatsUpdate { site_id: SiteId, tick: Tick },
    BuildingCreated { building_id: BuildingId, tick: Tick },

    /// A handler failed while servicing an external action.
    Error { code: String, message: String, tick: Tick },
}

impl SimEvent {
    pub fn tick(&self) -> Tick {
        match self {
            SimEvent::PackageCreated { tick, .. }
            | SimEvent::PackageExpired { tick, .. }
            | SimEvent::PackagePickedUp { tick, .. }
            | SimEvent::PackageDelivered { tick, .. }
            | SimEvent::NegotiationStarted { tick, .. }
            | SimEvent::NegotiationFinalized { tick, .. }
            | SimEvent::PickupExpiryFine { tick, .. }
            | SimEvent::OutOfFuel { tick, .. }
            | SimEvent::FuelPurchased { tick, .. }
            | SimEvent::TachographFine { tick, .. }
            | SimEvent::RestStarted { tick, .. }
            | SimEvent::RestEnded { tick, .. }
            | SimEvent::SiteStatsUpdate { tick, .. }
            | SimEvent::BuildingCreated { tick, .. }
            | SimEvent::Error { tick, .. } => *tick,
        }
    }
}
