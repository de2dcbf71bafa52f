//! Broker agent data model: balances, the package queue, and the single
//! in-flight negotiation. The decision ladder that drives these fields each
//! tick lives in `dt-behavior`.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use dt_core::{AgentId, PackageId};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStatus {
    Proposed,
    Accepted,
    Rejected,
}

/// The broker's single in-flight package-to-truck negotiation.
///
/// At most one of these exists at a time — the core correctness invariant
/// that serializes the matching market: a truck's `accept`/`reject`
/// response is always evaluated against the negotiation it was proposed
/// under, never a newer one that started in between.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Negotiation {
    pub package_id: PackageId,
    pub status: NegotiationStatus,
    pub candidate_trucks: Vec<AgentId>,
    pub current_truck_idx: usize,
    pub responses_received: usize,
}

impl Negotiation {
    pub fn new(package_id: PackageId, candidate_trucks: Vec<AgentId>) -> Self {
        Self { package_id, status: NegotiationStatus::Proposed, candidate_trucks, current_truck_idx: 0, responses_received: 0 }
    }

    pub fn current_candidate(&self) -> Option<&AgentId> {
        self.candidate_trucks.get(self.current_truck_idx)
    }

    pub fn candidates_exhausted(&self) -> bool {
        self.current_truck_idx >= self.candidate_trucks.len()
    }

    pub fn advance_candidate(&mut self) {
        self.current_truck_idx += 1;
    }
}

/// The singleton logistics coordinator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Broker {
    pub id: AgentId,
    pub balance_ducats: f64,
    pub package_queue: VecDeque<PackageId>,
    pub known_packages: HashSet<PackageId>,
    pub assigned_packages: HashMap<PackageId, AgentId>,
    pub active_negotiation: Option<Negotiation>,
}

impl Broker {
    pub const STARTING_BALANCE: f64 = 10_000.0;

    pub fn new(id: AgentId) -> Self {
        Self {
            id,
            balance_ducats: Self::STARTING_BALANCE,
            package_queue: VecDeque::new(),
            known_packages: HashSet::new(),
            assigned_packages: HashMap::new(),
            active_negotiation: None,
        }
    }

    pub fn observe(&mut self, package_id: PackageId) {
        if self.known_packages.insert(package_id.clone()) {
            self.package_queue.push_back(package_id);
        }
    }

    pub fn forget(&mut self, package_id: &PackageId) {
        self.known_packages.remove(package_id);
        self.package_queue.retain(|p| p != package_id);
        self.assigned_packages.remove(package_id);
    }
}
