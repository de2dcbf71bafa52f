//! Converts world-side outputs ([`SimEvent`], [`AgentDiff`], [`BuildingUpdate`])
//! into the outbound [`SignalMessage`]s the wire protocol promises.

use serde_json::json;

use dt_core::SimEvent;
use dt_world::{AgentDiff, BuildingUpdate};

use crate::protocol::SignalMessage;

/// `agent.updated` — a truck or the broker whose watched state changed.
pub fn agent_diff_signal(diff: &AgentDiff) -> SignalMessage {
    SignalMessage::new(
        "agent.updated",
        json!({ "agent_id": diff.agent_id, "kind": diff.kind, "state": diff.state }),
    )
}

/// `building.created` is emitted directly off [`SimEvent::BuildingCreated`];
/// any other building mutation (parking/fuel occupancy) is reported the same
/// generic way, under `building.updated`, so the signal stream never misses
/// state subscribers would otherwise have to poll for.
pub fn building_update_signal(update: &BuildingUpdate) -> SignalMessage {
    SignalMessage::new(
        "building.updated",
        json!({ "building_id": update.building_id, "state": update.state }),
    )
}

/// One domain event becomes one signal. Events with a dedicated wire name
/// get it; everything else rides on the generic `event.created` envelope so
/// nothing the engine records is ever dropped on the floor.
pub fn event_signal(event: &SimEvent) -> SignalMessage {
    let data = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
    let name = match event {
        SimEvent::PackageCreated { .. } => "package.created",
        SimEvent::PackageExpired { .. } => "package.expired",
        SimEvent::PackagePickedUp { .. } => "package.picked_up",
        SimEvent::PackageDelivered { .. } => "package.delivered",
        SimEvent::SiteStatsUpdate { .. } => "site.stats_update",
        SimEvent::BuildingCreated { .. } => "building.created",
        SimEvent::Error { code, message, .. } => return SignalMessage::error(code, message.clone()),
        SimEvent::NegotiationStarted { .. }
        | SimEvent::NegotiationFinalized { .. }
        | SimEvent::PickupExpiryFine { .. }
        | SimEvent::OutOfFuel { .. }
        | SimEvent::FuelPurchased { .. }
        | SimEvent::TachographFine { .. }
        | SimEvent::RestStarted { .. }
        | SimEvent::RestEnded { .. } => "event.created",
    };
    SignalMessage::new(name, data)
}
