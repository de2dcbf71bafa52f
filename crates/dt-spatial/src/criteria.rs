//! Predicates for `find_closest_node` / `find_closest_node_on_route`.
//!
//! A [`NodeCriteria`] decides whether a settled node during a Dijkstra sweep
//! is an acceptable stop, and reports back what it matched (the `BuildingId`
//! for a building search, or the node itself otherwise) so callers don't
//! need a second lookup pass.

use std::collections::HashSet;

use dt_core::{BuildingId, BuildingKind, NodeId};

use crate::graph::RoadGraph;

/// What a [`NodeCriteria`] matched at an accepted node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchedItem {
    /// No specific sub-entity — the node itself satisfied the criteria.
    Node,
    /// A specific building at the accepted node.
    Building(BuildingId),
}

/// A predicate evaluated against settled nodes during a Dijkstra sweep.
///
/// Implementations must be deterministic and side-effect free: the router
/// caches `(cache_key(), start)` results and will re-evaluate `matches`
/// against cached candidates on every call, so any mutable exclusion state
/// the criteria captures (e.g. "don't offer this gas station again") must be
/// re-checked each time rather than assumed stable.
pub trait NodeCriteria {
    /// Test whether `node` satisfies the criteria against `graph`.
    ///
    /// Returns `(true, item)` on a match; `item` is `MatchedItem::Node` when
    /// there is no finer-grained entity to report.
    fn matches(&self, graph: &RoadGraph, node: NodeId) -> (bool, MatchedItem);

    /// Stable key used to index the per-criteria route cache. Two criteria
    /// instances that would accept exactly the same nodes (modulo mutable
    /// exclusions revalidated per-call) should return equal keys.
    fn cache_key(&self) -> String;
}

// ── BuildingTypeCriteria ────────────────────────────────────────────────────

/// Matches nodes hosting a building of `kind`, optionally excluding a set of
/// already-tried building ids (e.g. a gas station found full on a previous
/// attempt within the same search).
pub struct BuildingTypeCriteria {
    pub kind: BuildingKind,
    pub exclude: HashSet<BuildingId>,
}

impl BuildingTypeCriteria {
    pub fn new(kind: BuildingKind) -> Self {
        Self { kind, exclude: HashSet::new() }
    }

    pub fn excluding(kind: BuildingKind, exclude: HashSet<BuildingId>) -> Self {
        Self { kind, exclude }
    }
}

impl NodeCriteria for BuildingTypeCriteria {
    fn matches(&self, graph: &RoadGraph, node: NodeId) -> (bool, MatchedItem) {
        let Some(n) = graph.node(node) else { return (false, MatchedItem::Node) };
        for id in n.buildings_of(self.kind) {
            if !self.exclude.contains(id) {
                return (true, MatchedItem::Building(id.clone()));
            }
        }
        (false, MatchedItem::Node)
    }

    fn cache_key(&self) -> String {
        format!("building:{}", self.kind.as_str())
    }
}

// ── EdgeCountCriteria ────────────────────────────────────────────────────────

/// Matches nodes whose out-degree falls within `[min, max]` — used by the
/// map generator's sanity passes and by tests exercising the generic search.
pub struct EdgeCountCriteria {
    pub min: usize,
    pub max: usize,
}

impl NodeCriteria for EdgeCountCriteria {
    fn matches(&self, graph: &RoadGraph, node: NodeId) -> (bool, MatchedItem) {
        let degree = graph.out_edges(node).len();
        (degree >= self.min && degree <= self.max, MatchedItem::Node)
    }

    fn cache_key(&self) -> String {
        format!("edge_count:{}:{}", self.min, self.max)
    }
}

// ── CompositeCriteria ────────────────────────────────────────────────────────

/// Boolean combinator joining operator.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CompositeOp {
    And,
    Or,
}

/// AND/OR combination of other criteria. For `And`, the first matching
/// sub-criteria's item is reported; for `Or`, the first sub-criteria to
/// match wins.
pub struct CompositeCriteria {
    pub op: CompositeOp,
    pub members: Vec<Box<dyn NodeCriteria>>,
}

impl CompositeCriteria {
    pub fn and(members: Vec<Box<dyn NodeCriteria>>) -> Self {
        Self { op: CompositeOp::And, members }
    }

    pub fn or(members: Vec<Box<dyn NodeCriteria>>) -> Self {
        Self { op: CompositeOp::Or, members }
    }
}

impl NodeCriteria for CompositeCriteria {
    fn matches(&self, graph: &RoadGraph, node: NodeId) -> (bool, MatchedItem) {
        match self.op {
            CompositeOp::Or => {
                for m in &self.members {
                    let (ok, item) = m.matches(graph, node);
                    if ok {
                        return (true, item);
                    }
                }
                (false, MatchedItem::Node)
            }
            CompositeOp::And => {
                let mut first_item = MatchedItem::Node;
                for (i, m) in self.members.iter().enumerate() {
                    let (ok, item) = m.matches(graph, node);
                    if !ok {
                        return (false, MatchedItem::Node);
                    }
                    if i == 0 {
                        first_item = item;
                    }
                }
                (!self.members.is_empty(), first_item)
            }
        }
    }

    fn cache_key(&self) -> String {
        let op = match self.op {
            CompositeOp::And => "and",
            CompositeOp::Or => "or",
        };
        let inner: Vec<String> = self.members.iter().map(|m| m.cache_key()).collect();
        format!("{op}({})", inner.join(","))
    }
}
