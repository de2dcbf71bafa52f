//! `dt-spatial` — the road graph and routing services that sit between the
//! world model and truck behavior.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|-------------------------------------------------------------|
//! | [`graph`]    | `RoadGraph`, `Node`, `Edge` — mutable directed graph        |
//! | [`criteria`] | `NodeCriteria` and its building/edge-count/composite impls  |
//! | [`router`]   | A*, Dijkstra-to-criteria, waypoint search, `RouteCache`      |
//! | [`error`]    | `SpatialError`, `SpatialResult<T>`                          |
//!
//! The graph is mutable between simulation runs (admin actions such as
//! `map.create`) but never mutated mid-tick; routing and caching assume a
//! stable graph for the duration of a tick.

pub mod criteria;
pub mod error;
pub mod graph;
pub mod router;

#[cfg(test)]
mod tests;

pub use criteria::{BuildingTypeCriteria, CompositeCriteria, CompositeOp, EdgeCountCriteria, MatchedItem, NodeCriteria};
pub use error::{SpatialError, SpatialResult};
pub use graph::{Edge, Node, RoadGraph};
pub use router::{
    estimate_travel_time_h, find_closest_node, find_closest_node_on_route, find_route, find_route_to_building,
    ClosestNodeMatch, RouteCache, RoutePath, WaypointMatch,
};
