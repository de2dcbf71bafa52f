//! Watch-field diffing: decide which agents/buildings changed enough this
//! tick to warrant emitting their full state to subscribers, rather than
//! pushing every agent's state on every tick regardless of whether anything
//! moved, ahead of the `agent.diff`/`building.update` signals.

use serde_json::{json, Value};

use dt_agent::Truck;
use dt_core::{AgentId, AgentKind, BuildingId};
use dt_spatial::RoadGraph;

/// A truck or broker's full state, queued for emission because one of its
/// watched fields (trucks) — or any field (broker, which has no watch-list
/// carve-out, being a singleton) — changed since the last tick it was
/// reported.
#[derive(Clone, Debug)]
pub struct AgentDiff {
    pub agent_id: AgentId,
    pub kind: AgentKind,
    pub state: Value,
}

#[derive(Clone, Debug)]
pub struct BuildingUpdate {
    pub building_id: BuildingId,
    pub state: Value,
}

/// The subset of a truck's fields whose change triggers a full-state
/// emission: position, route, cargo, and the building it currently occupies.
/// Compared structurally tick over tick rather than diffed field by field,
/// since a `Value` equality check is cheap next to a full truck serialization
/// anyway.
pub fn truck_watch_snapshot(truck: &Truck, graph: &RoadGraph) -> Value {
    use dt_agent::Position;

    let (current_node, current_edge) = match truck.position {
        Position::AtNode(n) => (Some(n), None),
        Position::OnEdge { edge, .. } => (None, Some(edge)),
    };
    json!({
        "current_node": current_node,
        "current_edge": current_edge,
        "current_speed_kph": dt_mobility::current_speed_kph(truck, graph),
        "route": truck.route,
        "route_start_node": truck.route_start_node,
        "route_end_node": truck.route_end_node,
        "loaded_packages": truck.loaded_packages,
        "current_building_id": truck.current_building_id,
    })
}
