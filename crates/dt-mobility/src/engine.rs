//! Continuous edge-traversal kinematics: the truck's speed/distance/fuel/CO2
//! accounting for one tick, and the administrative step of starting onto the
//! next edge of a route.
//!
//! This crate owns only the *mechanics* of motion; the decision of *when* to
//! move, park, fuel, or rest is `dt-behavior`'s — it calls [`start_leg`] and
//! [`advance_edge`] from the truck's priority ladder (steps 8/9).

use dt_agent::truck::{Position, Truck};
use dt_spatial::RoadGraph;

use crate::error::{MobilityError, MobilityResult};

/// Weight of an unladen truck, for the fuel-consumption formula. The
/// proposal-evaluation weight estimate in `dt-behavior` deliberately omits
/// this term — it only ever compares loads against each other, not absolute
/// fuel burn.
pub const BASE_TRUCK_WEIGHT_TONNES: f64 = 5.0;

/// What happened to a truck positioned on an edge this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgeOutcome {
    /// Fuel is exhausted; the truck did not move this tick.
    Stranded,
    /// The truck advanced along the edge but has not reached `to` yet.
    Moving,
    /// The truck reached the edge's destination node this tick.
    Arrived { node: dt_core::NodeId, reached_destination: bool },
}

/// If `truck` is at a node with a pending route, move it onto the edge
/// toward `route[0]` (zero progress — the distance covered this tick is
/// accounted for separately, by a subsequent [`advance_edge`] call next
/// tick). Returns `Ok(false)` if there is no pending route (nothing to do).
pub fn start_leg(truck: &mut Truck, graph: &RoadGraph) -> MobilityResult<bool> {
    let Position::AtNode(here) = truck.position else { return Ok(false) };
    let Some(&next) = truck.route.first() else { return Ok(false) };

    let edge_id = graph
        .out_edges(here)
        .iter()
        .copied()
        .find(|&e| graph.edge(e).map(|edge| edge.to) == Some(next))
        .ok_or(MobilityError::NoEdgeToNextWaypoint)?;

    truck.position = Position::OnEdge { edge: edge_id, progress_m: 0.0 };
    Ok(true)
}

/// Advance a truck positioned on an edge by `dt_s` seconds.
///
/// `loaded_weight_tonnes` should be [`BASE_TRUCK_WEIGHT_TONNES`] plus the
/// truck's current cargo weight (`Truck::cargo_weight_tonnes`); the caller
/// supplies it rather than this function recomputing it so callers that
/// already resolved package sizes for other purposes this tick don't pay
/// twice.
pub fn advance_edge(
    truck: &mut Truck,
    graph: &RoadGraph,
    dt_s: f64,
    loaded_weight_tonnes: f64,
) -> MobilityResult<EdgeOutcome> {
    let Position::OnEdge { edge: edge_id, progress_m } = truck.position else {
        return Err(MobilityError::NotOnEdge);
    };
    let edge = graph.edge(edge_id).ok_or(MobilityError::EdgeNotFound(edge_id))?;

    if truck.fuel.current_fuel_l <= 0.0 {
        return Ok(EdgeOutcome::Stranded);
    }

    let speed_kph = truck.max_speed_kph.min(edge.max_speed_kph);
    let distance_m = speed_kph * (1000.0 / 3600.0) * dt_s;
    let distance_km = distance_m / 1000.0;
    truck.fuel.consume(distance_km, loaded_weight_tonnes);
    truck.tachograph.add_driving(dt_s);

    let new_progress = progress_m + distance_m;
    if new_progress >= edge.length_m {
        let to = edge.to;
        truck.position = Position::AtNode(to);
        if truck.route.first() == Some(&to) {
            truck.route.remove(0);
        }
        let reached_destination = truck.destination == Some(to);
        if reached_destination {
            truck.destination = None;
        }
        Ok(EdgeOutcome::Arrived { node: to, reached_destination })
    } else {
        truck.position = Position::OnEdge { edge: edge_id, progress_m: new_progress };
        Ok(EdgeOutcome::Moving)
    }
}

/// Current speed of a truck, `0` if stranded or not on an edge.
pub fn current_speed_kph(truck: &Truck, graph: &RoadGraph) -> f64 {
    match truck.position {
        Position::OnEdge { edge, .. } if truck.fuel.current_fuel_l > 0.0 => {
            graph.edge(edge).map(|e| truck.max_speed_kph.min(e.max_speed_kph)).unwrap_or(0.0)
        }
        _ => 0.0,
    }
}
