//! Insertion-ordered registries for agents, buildings, and packages.
//!
//! The tick loop needs iteration order to be stable across ticks —
//! these wrap [`dt_core::OrderedMap`] rather than a bare `HashMap` so that
//! property holds without the caller having to think about it.

use dt_core::{AgentId, BuildingId, OrderedMap, PackageId};

use crate::agent::Agent;
use crate::building::Building;
use crate::package::Package;

/// All agents in a world, keyed by [`AgentId`], iterated in creation order.
#[derive(Clone, Debug, Default)]
pub struct AgentStore {
    agents: OrderedMap<AgentId, Agent>,
}

impl AgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, agent: Agent) {
        self.agents.insert(agent.id.clone(), agent);
    }

    pub fn get(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn get_mut(&mut self, id: &AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    pub fn remove(&mut self, id: &AgentId) -> Option<Agent> {
        self.agents.remove(id)
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.agents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &AgentId> + '_ {
        self.agents.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AgentId, &Agent)> + '_ {
        self.agents.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.agents.values()
    }
}

/// All buildings in a world, keyed by [`BuildingId`] (sites included, under
/// their `SiteId`-as-`BuildingId` alias).
#[derive(Clone, Debug, Default)]
pub struct BuildingStore {
    buildings: OrderedMap<BuildingId, Building>,
}

impl BuildingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, building: Building) {
        self.buildings.insert(building.id(), building);
    }

    pub fn get(&self, id: &BuildingId) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub fn get_mut(&mut self, id: &BuildingId) -> Option<&mut Building> {
        self.buildings.get_mut(id)
    }

    pub fn remove(&mut self, id: &BuildingId) -> Option<Building> {
        self.buildings.remove(id)
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &BuildingId> + '_ {
        self.buildings.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BuildingId, &Building)> + '_ {
        self.buildings.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Building> + '_ {
        self.buildings.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Building> + '_ {
        self.buildings.values_mut()
    }
}

/// All packages in a world, keyed by [`PackageId`], iterated in creation
/// order (delivered/expired packages are removed, not retained — see
/// `Package`'s lifecycle doc comment).
#[derive(Clone, Debug, Default)]
pub struct PackageStore {
    packages: OrderedMap<PackageId, Package>,
}

impl PackageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: Package) {
        self.packages.insert(package.id.clone(), package);
    }

    pub fn get(&self, id: &PackageId) -> Option<&Package> {
        self.packages.get(id)
    }

    pub fn get_mut(&mut self, id: &PackageId) -> Option<&mut Package> {
        self.packages.get_mut(id)
    }

    pub fn remove(&mut self, id: &PackageId) -> Option<Package> {
        self.packages.remove(id)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &PackageId> + '_ {
        self.packages.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackageId, &Package)> + '_ {
        self.packages.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Package> + '_ {
        self.packages.values()
    }
}
