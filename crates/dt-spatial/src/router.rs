//! Routing services: A* point-to-point, Dijkstra closest-node-by-criteria,
//! and waypoint-aware "closest node on the way to a destination" search.
//!
//! Edge traversal cost is **time in hours**: `length_m / (1000 * min(edge.max_speed_kph,
//! agent.max_speed_kph))`. All public search entry points take an agent's
//! `max_speed_kph` cap so heavier/slower trucks see correspondingly higher costs.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use rustc_hash::FxHashMap;

use dt_core::NodeId;

use crate::criteria::{MatchedItem, NodeCriteria};
use crate::graph::RoadGraph;
use crate::SpatialError;

/// A* + Dijkstra heap entry, ordered by ascending priority then insertion
/// order for deterministic tie-breaking (lowest counter wins).
#[derive(Copy, Clone, PartialEq)]
struct HeapEntry {
    priority: f64,
    counter: u64,
    node: NodeId,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for a min-heap via std's max-heap BinaryHeap.
        other
            .priority
            .partial_cmp(&self.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.counter.cmp(&self.counter))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Straight-line heuristic: Euclidean distance divided by `max_speed_kph`,
/// in hours. Admissible because no route can beat free-flight at the cap.
fn heuristic_h(graph: &RoadGraph, from: NodeId, to: NodeId, max_speed_kph: f64) -> f64 {
    let (Some(a), Some(b)) = (graph.node(from), graph.node(to)) else { return 0.0 };
    let dist_m = a.pos.distance_m(b.pos);
    (dist_m / 1000.0) / max_speed_kph.max(f64::EPSILON)
}

/// A*-found path of nodes, including `start`.
#[derive(Clone, Debug, Default)]
pub struct RoutePath {
    pub nodes: Vec<NodeId>,
    pub total_time_h: f64,
}

impl RoutePath {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Point-to-point A* search. Returns the full node sequence including
/// `start`; an empty path on unreachable or unknown endpoints.
pub fn find_route(graph: &RoadGraph, start: NodeId, goal: NodeId, max_speed_kph: f64) -> RoutePath {
    if !graph.contains_node(start) || !graph.contains_node(goal) {
        return RoutePath::default();
    }
    if start == goal {
        return RoutePath { nodes: vec![start], total_time_h: 0.0 };
    }

    let mut g_score: FxHashMap<NodeId, f64> = FxHashMap::default();
    let mut came_from: FxHashMap<NodeId, NodeId> = FxHashMap::default();
    let mut counter: u64 = 0;
    let mut open = BinaryHeap::new();

    g_score.insert(start, 0.0);
    open.push(HeapEntry { priority: heuristic_h(graph, start, goal, max_speed_kph), counter, node: start });

    while let Some(HeapEntry { node, .. }) = open.pop() {
        if node == goal {
            return reconstruct_path(&came_from, start, goal, g_score[&goal]);
        }
        let g_here = g_score[&node];
        for &edge_id in graph.out_edges(node) {
            let Some(edge) = graph.edge(edge_id) else { continue };
            let tentative = g_here + edge.travel_time_h(max_speed_kph);
            let better = g_score.get(&edge.to).map(|&g| tentative < g).unwrap_or(true);
            if better {
                g_score.insert(edge.to, tentative);
                came_from.insert(edge.to, node);
                counter += 1;
                let f = tentative + heuristic_h(graph, edge.to, goal, max_speed_kph);
                open.push(HeapEntry { priority: f, counter, node: edge.to });
            }
        }
    }

    RoutePath::default()
}

fn reconstruct_path(
    came_from: &FxHashMap<NodeId, NodeId>,
    start: NodeId,
    goal: NodeId,
    total_time_h: f64,
) -> RoutePath {
    let mut nodes = vec![goal];
    let mut cur = goal;
    while cur != start {
        match came_from.get(&cur) {
            Some(&prev) => {
                nodes.push(prev);
                cur = prev;
            }
            None => break,
        }
    }
    nodes.reverse();
    RoutePath { nodes, total_time_h }
}

/// Travel-time estimator used by broker ranking and truck proposal
/// evaluation. Returns `+inf` when no route exists.
pub fn estimate_travel_time_h(graph: &RoadGraph, from: NodeId, to: NodeId, max_speed_kph: f64) -> f64 {
    if from == to {
        return 0.0;
    }
    let path = find_route(graph, from, to, max_speed_kph);
    if path.is_empty() {
        f64::INFINITY
    } else {
        path.total_time_h
    }
}

// ── find_closest_node ────────────────────────────────────────────────────────

/// Result of a closest-node-by-criteria search.
#[derive(Clone, Debug)]
pub struct ClosestNodeMatch {
    pub node: NodeId,
    pub item: MatchedItem,
    pub cost_h: f64,
}

struct CacheEntry {
    /// Cost-sorted (ascending) nodes found to satisfy the criteria at some
    /// point in the past. Re-validated against current exclusions on every
    /// query rather than trusted blindly.
    matches: Vec<(f64, NodeId)>,
    exhausted: bool,
}

/// Per-criteria Dijkstra cache, keyed by `(criteria.cache_key(), start)`.
///
/// Not `Sync` — intended for single-threaded use from the tick loop, matching
/// the engine's cooperative single-thread scheduling model.
#[derive(Default)]
pub struct RouteCache {
    entries: RefCell<HashMap<(String, NodeId), CacheEntry>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Dijkstra shortest-path tree from `start`, returning the first settled
/// node that matches `criteria`. Backed by [`RouteCache`] so repeated
/// searches from the same start with the same criteria type avoid
/// re-expansion; cached nodes are re-validated against current exclusions.
pub fn find_closest_node(
    graph: &RoadGraph,
    cache: &RouteCache,
    start: NodeId,
    criteria: &dyn NodeCriteria,
    max_speed_kph: f64,
) -> Option<ClosestNodeMatch> {
    if !graph.contains_node(start) {
        return None;
    }

    let key = (criteria.cache_key(), start);

    // Try the cache first: nodes are already cost-sorted, so the first one
    // whose current match still holds wins without touching the heap.
    {
        let entries = cache.entries.borrow();
        if let Some(entry) = entries.get(&key) {
            for &(cost, node) in &entry.matches {
                let (ok, item) = criteria.matches(graph, node);
                if ok {
                    return Some(ClosestNodeMatch { node, item, cost_h: cost });
                }
            }
            if entry.exhausted {
                return None;
            }
        }
    }

    // Cache miss (or all cached candidates currently excluded): run a full
    // Dijkstra sweep, recording every node that matches along the way.
    let mut dist: FxHashMap<NodeId, f64> = FxHashMap::default();
    let mut counter: u64 = 0;
    let mut heap = BinaryHeap::new();
    let mut found: Vec<(f64, NodeId)> = Vec::new();
    let mut answer: Option<ClosestNodeMatch> = None;

    dist.insert(start, 0.0);
    heap.push(HeapEntry { priority: 0.0, counter, node: start });

    while let Some(HeapEntry { priority: cost, node, .. }) = heap.pop() {
        if dist.get(&node).is_some_and(|&d| cost > d) {
            continue;
        }
        let (ok, item) = criteria.matches(graph, node);
        if ok {
            found.push((cost, node));
            if answer.is_none() {
                answer = Some(ClosestNodeMatch { node, item, cost_h: cost });
            }
        }
        for &edge_id in graph.out_edges(node) {
            let Some(edge) = graph.edge(edge_id) else { continue };
            let next_cost = cost + edge.travel_time_h(max_speed_kph);
            let better = dist.get(&edge.to).map(|&d| next_cost < d).unwrap_or(true);
            if better {
                dist.insert(edge.to, next_cost);
                counter += 1;
                heap.push(HeapEntry { priority: next_cost, counter, node: edge.to });
            }
        }
    }

    cache.entries.borrow_mut().insert(key, CacheEntry { matches: found, exhausted: true });
    answer
}

/// Convenience wrapper specialized to building-type searches.
pub fn find_route_to_building(
    graph: &RoadGraph,
    cache: &RouteCache,
    start: NodeId,
    kind: dt_core::BuildingKind,
    exclude: std::collections::HashSet<dt_core::BuildingId>,
    max_speed_kph: f64,
) -> Option<ClosestNodeMatch> {
    let criteria = crate::criteria::BuildingTypeCriteria::excluding(kind, exclude);
    find_closest_node(graph, cache, start, &criteria, max_speed_kph)
}

// ── find_closest_node_on_route ───────────────────────────────────────────────

/// Result of a waypoint-aware search: the chosen waypoint, what matched
/// there, and the path from `start` to the waypoint.
#[derive(Clone, Debug)]
pub struct WaypointMatch {
    pub waypoint: NodeId,
    pub item: MatchedItem,
    pub path_to_waypoint: RoutePath,
    pub total_time_h: f64,
}

/// Two-phase search minimizing total `start -> waypoint -> destination`
/// time. Phase A runs Dijkstra on the reverse graph from `destination` to
/// get `dist_to_dest[v]`. Phase B runs forward Dijkstra from `start`
/// tracking the best `g(v) + dist_to_dest[v]` over matching `v`, stopping
/// early once the open set's minimum exceeds the best total found so far.
pub fn find_closest_node_on_route(
    graph: &RoadGraph,
    start: NodeId,
    destination: NodeId,
    criteria: &dyn NodeCriteria,
    max_speed_kph: f64,
) -> Option<WaypointMatch> {
    if !graph.contains_node(start) || !graph.contains_node(destination) {
        return None;
    }

    // Phase A: reverse Dijkstra from destination.
    let dist_to_dest = reverse_dijkstra(graph, destination, max_speed_kph);

    // Phase B: forward Dijkstra from start, tracking best total over matches.
    let mut dist: FxHashMap<NodeId, f64> = FxHashMap::default();
    let mut came_from: FxHashMap<NodeId, NodeId> = FxHashMap::default();
    let mut counter: u64 = 0;
    let mut heap = BinaryHeap::new();

    dist.insert(start, 0.0);
    heap.push(HeapEntry { priority: 0.0, counter, node: start });

    let mut best: Option<(f64, NodeId, MatchedItem)> = None;

    while let Some(HeapEntry { priority: g, node, .. }) = heap.pop() {
        if let Some((best_total, _, _)) = best {
            if g >= best_total {
                break; // open-set minimum can no longer beat the best total found
            }
        }
        if dist.get(&node).is_some_and(|&d| g > d) {
            continue;
        }

        if let Some(&to_dest) = dist_to_dest.get(&node) {
            let (ok, item) = criteria.matches(graph, node);
            if ok {
                let total = g + to_dest;
                if best.as_ref().map(|(b, _, _)| total < *b).unwrap_or(true) {
                    best = Some((total, node, item));
                }
            }
        }

        for &edge_id in graph.out_edges(node) {
            let Some(edge) = graph.edge(edge_id) else { continue };
            let next = g + edge.travel_time_h(max_speed_kph);
            let better = dist.get(&edge.to).map(|&d| next < d).unwrap_or(true);
            if better {
                dist.insert(edge.to, next);
                came_from.insert(edge.to, node);
                counter += 1;
                heap.push(HeapEntry { priority: next, counter, node: edge.to });
            }
        }
    }

    let (total, waypoint, item) = best?;
    let path_to_waypoint = reconstruct_path(&came_from, start, waypoint, dist[&waypoint]);
    Some(WaypointMatch { waypoint, item, path_to_waypoint, total_time_h: total })
}

/// Dijkstra over incoming edges (i.e. the reverse graph), used by phase A of
/// the waypoint search.
fn reverse_dijkstra(graph: &RoadGraph, destination: NodeId, max_speed_kph: f64) -> FxHashMap<NodeId, f64> {
    let mut dist: FxHashMap<NodeId, f64> = FxHashMap::default();
    let mut counter: u64 = 0;
    let mut heap = BinaryHeap::new();

    dist.insert(destination, 0.0);
    heap.push(HeapEntry { priority: 0.0, counter, node: destination });

    while let Some(HeapEntry { priority: cost, node, .. }) = heap.pop() {
        if dist.get(&node).is_some_and(|&d| cost > d) {
            continue;
        }
        for &edge_id in graph.in_edges(node) {
            let Some(edge) = graph.edge(edge_id) else { continue };
            let pred = edge.from;
            let next_cost = cost + edge.travel_time_h(max_speed_kph);
            let better = dist.get(&pred).map(|&d| next_cost < d).unwrap_or(true);
            if better {
                dist.insert(pred, next_cost);
                counter += 1;
                heap.push(HeapEntry { priority: next_cost, counter, node: pred });
            }
        }
    }

    dist
}
