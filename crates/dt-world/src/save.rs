//! Save/restore and map-only export/import document shapes for the "save /
//! load" administrative actions.
//!
//! A save document's map section lists nodes and edges in ascending id order
//! rather than assuming contiguous ids; import replays them through
//! [`RoadGraph::add_node`]/[`add_edge`] in that order and keeps an explicit
//! old-id -> new-id remap table. This keeps a round trip correct even when
//! the original graph had gaps from earlier `map.remove_node` admin actions —
//! `RoadGraph` has no "insert with this exact id" constructor, only
//! auto-incrementing counters, so a remap is unavoidable regardless of
//! whether the ids happened to still be contiguous.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use dt_agent::{Agent, AgentBody, AgentStore, Building, BuildingStore};
use dt_core::{AgentRng, GeoPoint, RoadClass, RoadMode, SimConfig, Tick};
use dt_spatial::RoadGraph;

use crate::error::{WorldError, WorldResult};
use crate::World;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: u32,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: u32,
    pub from: u32,
    pub to: u32,
    pub length_m: f64,
    pub max_speed_kph: f64,
    pub road_class: RoadClass,
    pub lanes: u8,
    pub mode: RoadMode,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub node_id: u32,
    pub building: Building,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MapDocument {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub buildings: Vec<BuildingRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub tick: u64,
    pub dt_s: f64,
    pub now_s: f64,
    pub global_fuel_price: f64,
    pub current_day: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveDocument {
    pub map: MapDocument,
    pub agents: Vec<Agent>,
    pub packages: Vec<dt_agent::Package>,
    pub metadata: SaveMetadata,
}

/// Snapshot `graph`/`buildings` into a [`MapDocument`], nodes and edges
/// sorted ascending by id.
pub fn export_map(graph: &RoadGraph, buildings: &BuildingStore) -> MapDocument {
    let mut node_ids: Vec<_> = graph.node_ids().collect();
    node_ids.sort_by_key(|n| n.0);
    let nodes = node_ids
        .iter()
        .filter_map(|&id| graph.node(id).map(|n| NodeRecord { id: id.0, x: n.pos.x, y: n.pos.y }))
        .collect();

    let mut edge_ids: Vec<_> = graph.edge_ids().collect();
    edge_ids.sort_by_key(|e| e.0);
    let edges = edge_ids
        .iter()
        .filter_map(|&id| {
            graph.edge(id).map(|e| EdgeRecord {
                id: id.0,
                from: e.from.0,
                to: e.to.0,
                length_m: e.length_m,
                max_speed_kph: e.max_speed_kph,
                road_class: e.road_class,
                lanes: e.lanes,
                mode: e.mode,
            })
        })
        .collect();

    let mut building_records = Vec::new();
    for kind in dt_core::BuildingKind::ALL {
        for (node, building_id) in graph.buildings_of_kind(kind) {
            if let Some(building) = buildings.get(&building_id) {
                building_records.push(BuildingRecord { node_id: node.0, building: building.clone() });
            }
        }
    }

    MapDocument { nodes, edges, buildings: building_records }
}

/// Rebuild a [`RoadGraph`]/[`BuildingStore`] pair from a [`MapDocument`],
/// remapping ids through a fresh set of `add_node`/`add_edge` calls.
pub fn import_map(doc: &MapDocument) -> WorldResult<(RoadGraph, BuildingStore)> {
    let mut graph = RoadGraph::new();
    let mut node_remap: HashMap<u32, dt_core::NodeId> = HashMap::new();

    let mut sorted_nodes = doc.nodes.clone();
    sorted_nodes.sort_by_key(|n| n.id);
    for record in &sorted_nodes {
        let new_id = graph.add_node(GeoPoint::new(record.x, record.y));
        node_remap.insert(record.id, new_id);
    }

    let mut sorted_edges = doc.edges.clone();
    sorted_edges.sort_by_key(|e| e.id);
    for record in &sorted_edges {
        let from = *node_remap
            .get(&record.from)
            .ok_or_else(|| WorldError::SaveFormat(format!("edge {} references unknown node {}", record.id, record.from)))?;
        let to = *node_remap
            .get(&record.to)
            .ok_or_else(|| WorldError::SaveFormat(format!("edge {} references unknown node {}", record.id, record.to)))?;
        graph.add_edge(from, to, record.length_m, record.max_speed_kph, record.road_class, record.lanes, record.mode)?;
    }

    let mut buildings = BuildingStore::new();
    for record in &doc.buildings {
        let node = *node_remap
            .get(&record.node_id)
            .ok_or_else(|| WorldError::SaveFormat(format!("building {} references unknown node {}", record.building.id(), record.node_id)))?;
        graph.attach_building(node, record.building.kind(), record.building.id())?;
        buildings.insert(record.building.clone());
    }

    Ok((graph, buildings))
}

impl World {
    pub fn to_save_document(&self) -> SaveDocument {
        let map = export_map(&self.graph, &self.buildings);
        let agents = self.agents.values().cloned().collect();
        let packages = self.packages.values().cloned().collect();
        let td = self.clock.tick_data();
        SaveDocument {
            map,
            agents,
            packages,
            metadata: SaveMetadata {
                tick: self.clock.current_tick.0,
                dt_s: self.clock.dt_s,
                now_s: self.clock.now_s(),
                global_fuel_price: self.global_fuel_price,
                current_day: td.day,
            },
        }
    }

    /// Rebuild a world from a save document. RNG streams are not part of the
    /// document — per-agent and per-site RNGs are re-derived deterministically
    /// from `(config.seed, id)` and will diverge from whatever draw sequence
    /// produced the saved state from that point on. Acceptable: determinism
    /// only promises a reproducible *future*, not a resumed *past* sequence.
    pub fn restore(config: SimConfig, doc: &SaveDocument) -> WorldResult<World> {
        let (graph, buildings) = import_map(&doc.map)?;
        let mut world = World::new(config, graph);
        world.buildings = buildings;
        world.clock.current_tick = Tick(doc.metadata.tick);
        world.global_fuel_price = doc.metadata.global_fuel_price;
        world.last_fuel_price_day = doc.metadata.current_day;

        world.agents = AgentStore::new();
        world.agent_rngs.clear();
        for agent in &doc.agents {
            if matches!(agent.body, AgentBody::Broker(_)) {
                world.broker_id = agent.id.clone();
            }
            world.agent_rngs.entry(agent.id.clone()).or_insert_with(|| AgentRng::new(world.seed, &agent.id));
            world.agents.insert(agent.clone());
        }

        for package in &doc.packages {
            world.packages.insert(package.clone());
        }

        Ok(world)
    }
}
