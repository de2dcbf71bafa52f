//! Unit tests for edge-traversal kinematics.

use dt_agent::truck::{Position, Truck};
use dt_core::{AgentId, GeoPoint, RoadClass, RoadMode};
use dt_spatial::RoadGraph;

use crate::engine::{advance_edge, current_speed_kph, start_leg, EdgeOutcome, BASE_TRUCK_WEIGHT_TONNES};

fn two_node_graph(length_m: f64, max_speed_kph: f64) -> (RoadGraph, dt_core::NodeId, dt_core::NodeId) {
    let mut g = RoadGraph::new();
    let a = g.add_node(GeoPoint { x: 0.0, y: 0.0 });
    let b = g.add_node(GeoPoint { x: 1.0, y: 0.0 });
    g.add_edge(a, b, length_m, max_speed_kph, RoadClass::Arterial, 1, RoadMode::Road).unwrap();
    (g, a, b)
}

#[test]
fn start_leg_moves_truck_onto_edge_with_zero_progress() {
    let (graph, a, b) = two_node_graph(1000.0, 50.0);
    let mut truck = Truck::new(AgentId::new("t1"), a, 80.0, 24, 400.0);
    truck.route = vec![b];

    let started = start_leg(&mut truck, &graph).unwrap();
    assert!(started);
    assert!(matches!(truck.position, Position::OnEdge { progress_m, .. } if progress_m == 0.0));
}

#[test]
fn start_leg_is_noop_with_empty_route() {
    let (graph, a, _b) = two_node_graph(1000.0, 50.0);
    let mut truck = Truck::new(AgentId::new("t1"), a, 80.0, 24, 400.0);
    assert!(!start_leg(&mut truck, &graph).unwrap());
    assert_eq!(truck.position, Position::AtNode(a));
}

#[test]
fn advance_edge_covers_expected_distance_per_tick() {
    let (graph, a, b) = two_node_graph(10_000.0, 60.0);
    let mut truck = Truck::new(AgentId::new("t1"), a, 80.0, 24, 400.0);
    truck.route = vec![b];
    start_leg(&mut truck, &graph).unwrap();

    let outcome = advance_edge(&mut truck, &graph, 60.0, BASE_TRUCK_WEIGHT_TONNES).unwrap();
    assert_eq!(outcome, EdgeOutcome::Moving);
    // 60 km/h for 60s = 1000m.
    match truck.position {
        Position::OnEdge { progress_m, .. } => assert!((progress_m - 1000.0).abs() < 1e-6),
        _ => panic!("expected still on edge"),
    }
}

#[test]
fn advance_edge_caps_speed_at_edge_limit() {
    let (graph, a, b) = two_node_graph(10_000.0, 40.0);
    let mut truck = Truck::new(AgentId::new("t1"), a, 120.0, 24, 400.0);
    truck.route = vec![b];
    start_leg(&mut truck, &graph).unwrap();

    advance_edge(&mut truck, &graph, 3600.0, BASE_TRUCK_WEIGHT_TONNES).unwrap();
    // Capped at the edge's 40 km/h even though the truck could do 120.
    match truck.position {
        Position::OnEdge { progress_m, .. } => assert!((progress_m - 40_000.0).abs() < 1.0),
        Position::AtNode(_) => panic!("edge too short for this assertion"),
    }
}

#[test]
fn arriving_clears_edge_pops_route_and_destination() {
    let (graph, a, b) = two_node_graph(500.0, 50.0);
    let mut truck = Truck::new(AgentId::new("t1"), a, 50.0, 24, 400.0);
    truck.route = vec![b];
    truck.destination = Some(b);
    start_leg(&mut truck, &graph).unwrap();

    let outcome = advance_edge(&mut truck, &graph, 3600.0, BASE_TRUCK_WEIGHT_TONNES).unwrap();
    assert_eq!(outcome, EdgeOutcome::Arrived { node: b, reached_destination: true });
    assert_eq!(truck.position, Position::AtNode(b));
    assert!(truck.route.is_empty());
    assert!(truck.destination.is_none());
}

#[test]
fn out_of_fuel_strands_the_truck_mid_edge() {
    let (graph, a, b) = two_node_graph(100_000.0, 80.0);
    let mut truck = Truck::new(AgentId::new("t1"), a, 80.0, 24, 400.0);
    truck.route = vec![b];
    start_leg(&mut truck, &graph).unwrap();
    truck.fuel.current_fuel_l = 0.0;

    let outcome = advance_edge(&mut truck, &graph, 60.0, BASE_TRUCK_WEIGHT_TONNES).unwrap();
    assert_eq!(outcome, EdgeOutcome::Stranded);
    assert_eq!(current_speed_kph(&truck, &graph), 0.0);
    match truck.position {
        Position::OnEdge { progress_m, .. } => assert_eq!(progress_m, 0.0),
        _ => panic!("truck should not have moved"),
    }
}

#[test]
fn heavier_cargo_burns_more_fuel_over_the_same_distance() {
    let (graph, a, b) = two_node_graph(10_000.0, 60.0);
    let mut light = Truck::new(AgentId::new("t1"), a, 80.0, 24, 400.0);
    let mut heavy = Truck::new(AgentId::new("t2"), a, 80.0, 24, 400.0);
    light.route = vec![b];
    heavy.route = vec![b];
    start_leg(&mut light, &graph).unwrap();
    start_leg(&mut heavy, &graph).unwrap();

    advance_edge(&mut light, &graph, 600.0, BASE_TRUCK_WEIGHT_TONNES).unwrap();
    advance_edge(&mut heavy, &graph, 600.0, BASE_TRUCK_WEIGHT_TONNES + 2.0).unwrap();

    assert!(heavy.fuel.current_fuel_l < light.fuel.current_fuel_l);
}
