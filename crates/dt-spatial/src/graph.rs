//! Mutable directed road graph with per-node building attachments.
//!
//! Unlike a geographic digital twin built over static OSM data, this graph is
//! synthetic and occasionally mutated by admin actions (`map.create`,
//! `map.import`) between simulation runs — never during a tick. Nodes
//! and edges therefore live in `FxHashMap`s keyed by dense integer ids rather
//! than a CSR array that would need a full rebuild on every edit.

use rustc_hash::FxHashMap;

use dt_core::{BuildingId, BuildingKind, EdgeId, GeoPoint, NodeId, RoadClass, RoadMode};

use crate::SpatialError;

/// A road-network node: a position plus a type-keyed index of the buildings
/// attached to it. `buildings_by_type[kind]` gives O(1) "has a gas station
/// here?" / "list all parkings here" answers without scanning `buildings`.
#[derive(Clone, Debug, Default)]
pub struct Node {
    pub pos: GeoPoint,
    pub buildings: Vec<BuildingId>,
    buildings_by_type: FxHashMap<BuildingKind, Vec<BuildingId>>,
}

impl Node {
    fn new(pos: GeoPoint) -> Self {
        Self { pos, buildings: Vec::new(), buildings_by_type: FxHashMap::default() }
    }

    /// Buildings of `kind` attached to this node. O(1) lookup.
    pub fn buildings_of(&self, kind: BuildingKind) -> &[BuildingId] {
        self.buildings_by_type.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of buildings of `kind` attached to this node. O(1).
    pub fn count_of(&self, kind: BuildingKind) -> usize {
        self.buildings_by_type.get(&kind).map(Vec::len).unwrap_or(0)
    }

    fn attach(&mut self, kind: BuildingKind, id: BuildingId) {
        self.buildings.push(id.clone());
        self.buildings_by_type.entry(kind).or_default().push(id);
    }

    fn detach(&mut self, kind: BuildingKind, id: &BuildingId) {
        self.buildings.retain(|b| b != id);
        if let Some(v) = self.buildings_by_type.get_mut(&kind) {
            v.retain(|b| b != id);
        }
    }
}

/// A directed road segment.
#[derive(Clone, Debug)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub length_m: f64,
    pub max_speed_kph: f64,
    pub road_class: RoadClass,
    pub lanes: u8,
    pub mode: RoadMode,
}

impl Edge {
    /// Time in hours to traverse this edge at `min(max_speed_kph, agent_speed_kph)`.
    pub fn travel_time_h(&self, agent_max_speed_kph: f64) -> f64 {
        let speed = self.max_speed_kph.min(agent_max_speed_kph).max(f64::EPSILON);
        (self.length_m / 1000.0) / speed
    }
}

/// Directed node/edge network with per-node building attachments.
///
/// Invariants maintained by every mutator:
/// - every edge references existing nodes;
/// - `length_m > 0`;
/// - removing a node removes all incident (in and out) edges;
/// - a building's id is unique across the entire graph.
#[derive(Clone, Debug, Default)]
pub struct RoadGraph {
    nodes: FxHashMap<NodeId, Node>,
    edges: FxHashMap<EdgeId, Edge>,
    out_edges: FxHashMap<NodeId, Vec<EdgeId>>,
    in_edges: FxHashMap<NodeId, Vec<EdgeId>>,
    building_location: FxHashMap<BuildingId, (NodeId, BuildingKind)>,
    next_node: u32,
    next_edge: u32,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Node mutation ──────────────────────────────────────────────────────

    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, Node::new(pos));
        self.out_edges.entry(id).or_default();
        self.in_edges.entry(id).or_default();
        id
    }

    /// Remove a node and every edge incident to it. Attached buildings are
    /// detached from the node's index but not deleted (callers own building
    /// lifecycle separately, via `dt-agent`/`dt-world`).
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), SpatialError> {
        if !self.nodes.contains_key(&node) {
            return Err(SpatialError::NodeNotFound(node));
        }
        let incident: Vec<EdgeId> = self
            .out_edges
            .get(&node)
            .into_iter()
            .flatten()
            .chain(self.in_edges.get(&node).into_iter().flatten())
            .copied()
            .collect();
        for e in incident {
            let _ = self.remove_edge(e);
        }
        self.building_location.retain(|_, (n, _)| *n != node);
        self.nodes.remove(&node);
        self.out_edges.remove(&node);
        self.in_edges.remove(&node);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    // ── Edge mutation ──────────────────────────────────────────────────────

    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        length_m: f64,
        max_speed_kph: f64,
        road_class: RoadClass,
        lanes: u8,
        mode: RoadMode,
    ) -> Result<EdgeId, SpatialError> {
        if length_m <= 0.0 {
            return Err(SpatialError::InvalidEdge("length_m must be > 0".into()));
        }
        if !self.nodes.contains_key(&from) {
            return Err(SpatialError::NodeNotFound(from));
        }
        if !self.nodes.contains_key(&to) {
            return Err(SpatialError::NodeNotFound(to));
        }
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(id, Edge { from, to, length_m, max_speed_kph, road_class, lanes, mode });
        self.out_edges.entry(from).or_default().push(id);
        self.in_edges.entry(to).or_default().push(id);
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<(), SpatialError> {
        let edge = self.edges.remove(&id).ok_or(SpatialError::EdgeNotFound(id))?;
        if let Some(v) = self.out_edges.get_mut(&edge.from) {
            v.retain(|e| *e != id);
        }
        if let Some(v) = self.in_edges.get_mut(&edge.to) {
            v.retain(|e| *e != id);
        }
        Ok(())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.keys().copied()
    }

    pub fn out_edges(&self, node: NodeId) -> &[EdgeId] {
        self.out_edges.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn in_edges(&self, node: NodeId) -> &[EdgeId] {
        self.in_edges.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    // ── Building attachment ─────────────────────────────────────────────────

    /// Attach a building of `kind` to `node`. Returns an error if the
    /// building id is already attached anywhere in the graph (uniqueness
    /// invariant) or the node doesn't exist.
    pub fn attach_building(&mut self, node: NodeId, kind: BuildingKind, id: BuildingId) -> Result<(), SpatialError> {
        if self.building_location.contains_key(&id) {
            return Err(SpatialError::DuplicateBuilding(id));
        }
        let n = self.nodes.get_mut(&node).ok_or(SpatialError::NodeNotFound(node))?;
        n.attach(kind, id.clone());
        self.building_location.insert(id, (node, kind));
        Ok(())
    }

    pub fn detach_building(&mut self, id: &BuildingId) -> Option<(NodeId, BuildingKind)> {
        let (node, kind) = self.building_location.remove(id)?;
        if let Some(n) = self.nodes.get_mut(&node) {
            n.detach(kind, id);
        }
        Some((node, kind))
    }

    pub fn building_node(&self, id: &BuildingId) -> Option<NodeId> {
        self.building_location.get(id).map(|(n, _)| *n)
    }

    /// All buildings of `kind` across the whole graph, paired with their node.
    pub fn buildings_of_kind(&self, kind: BuildingKind) -> impl Iterator<Item = (NodeId, BuildingId)> + '_ {
        self.building_location
            .iter()
            .filter(move |(_, (_, k))| *k == kind)
            .map(|(id, (n, _))| (*n, id.clone()))
    }
}
