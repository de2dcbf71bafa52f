//! The slice of world state each decision ladder needs, threaded through
//! explicitly rather than via a god `World` reference — `dt-behavior` has no
//! dependency on `dt-world` (the dependency runs the other way: the world's
//! tick loop calls into these ladders).

use dt_agent::{AgentStore, BuildingStore, PackageStore};
use dt_core::{AgentId, AgentRng, SimEvent, Tick};
use dt_spatial::{RoadGraph, RouteCache};

/// Context available to a truck's `decide` step.
pub struct TruckContext<'a> {
    pub graph: &'a RoadGraph,
    pub cache: &'a RouteCache,
    pub buildings: &'a mut BuildingStore,
    pub packages: &'a mut PackageStore,
    pub broker_id: &'a AgentId,
    pub global_fuel_price: f64,
    pub tick: Tick,
    pub dt_s: f64,
    pub rng: &'a mut AgentRng,
    pub events: &'a mut Vec<SimEvent>,
}

/// Context available to the broker's `decide` step. `trucks` is read-only —
/// the broker only ever *observes* truck state (positions, flags) to rank
/// candidates; mutating a truck happens exclusively inside that truck's own
/// `decide` call, never from the broker's.
pub struct BrokerContext<'a> {
    pub graph: &'a RoadGraph,
    pub trucks: &'a AgentStore,
    pub buildings: &'a mut BuildingStore,
    pub packages: &'a mut PackageStore,
    pub tick: Tick,
    pub dt_s: f64,
    pub events: &'a mut Vec<SimEvent>,
}
