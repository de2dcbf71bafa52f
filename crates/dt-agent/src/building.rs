//! The three building variants a graph node may host.
//!
//! Dirty-flag bookkeeping ("building updates for any building whose dirty
//! flag is set") lives on the world side as a per-tick touched-id
//! set rather than a field on each struct here — every mutation already
//! flows through world-owned methods, so the world is the natural place to
//! record which ids to emit without threading a `dirty: bool` through every
//! variant.

use serde::{Deserialize, Serialize};

use dt_core::{AgentId, BuildingId, BuildingKind};

use crate::error::{AgentError, AgentResult};
use crate::site::Site;

/// A facility offering bounded occupancy (parking or gas station).
pub trait Occupiable {
    fn id(&self) -> BuildingId;
    fn capacity(&self) -> u32;
    fn occupants(&self) -> &[AgentId];
    fn occupants_mut(&mut self) -> &mut Vec<AgentId>;

    fn has_space(&self) -> bool {
        (self.occupants().len() as u32) < self.capacity()
    }

    /// Attempt to add `agent`. Returns `false` (no mutation) if full or
    /// already occupying.
    fn enter(&mut self, agent: AgentId) -> bool {
        if !self.has_space() || self.occupants().contains(&agent) {
            return false;
        }
        self.occupants_mut().push(agent);
        true
    }

    /// Like [`Occupiable::enter`], but surfaces the full reason for failure.
    fn enter_checked(&mut self, agent: AgentId) -> AgentResult<()> {
        if self.occupants().contains(&agent) {
            return Ok(());
        }
        if !self.has_space() {
            return Err(AgentError::OccupancyFull(self.id()));
        }
        self.occupants_mut().push(agent);
        Ok(())
    }

    fn leave(&mut self, agent: &AgentId) {
        self.occupants_mut().retain(|a| a != agent);
    }

    fn leave_checked(&mut self, agent: &AgentId) -> AgentResult<()> {
        let building_id = self.id();
        let before = self.occupants().len();
        self.occupants_mut().retain(|a| a != agent);
        if self.occupants().len() == before {
            return Err(AgentError::NotOccupying(agent.clone(), building_id));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Parking {
    pub id: BuildingId,
    pub capacity: u32,
    pub occupants: Vec<AgentId>,
}

impl Parking {
    pub fn new(id: BuildingId, capacity: u32) -> Self {
        Self { id, capacity, occupants: Vec::new() }
    }
}

impl Occupiable for Parking {
    fn id(&self) -> BuildingId {
        self.id.clone()
    }
    fn capacity(&self) -> u32 {
        self.capacity
    }
    fn occupants(&self) -> &[AgentId] {
        &self.occupants
    }
    fn occupants_mut(&mut self) -> &mut Vec<AgentId> {
        &mut self.occupants
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GasStation {
    pub id: BuildingId,
    pub capacity: u32,
    pub occupants: Vec<AgentId>,
    /// Multiplier applied to the world's global fuel price.
    pub cost_factor: f64,
    pub revenue: f64,
}

impl GasStation {
    pub fn new(id: BuildingId, capacity: u32, cost_factor: f64) -> Self {
        Self { id, capacity, occupants: Vec::new(), cost_factor, revenue: 0.0 }
    }

    pub fn effective_price_per_liter(&self, global_fuel_price: f64) -> f64 {
        global_fuel_price * self.cost_factor
    }

    pub fn record_sale(&mut self, liters: f64, price_per_liter: f64) -> f64 {
        let total = liters * price_per_liter;
        self.revenue += total;
        total
    }
}

impl Occupiable for GasStation {
    fn id(&self) -> BuildingId {
        self.id.clone()
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }
    fn occupants(&self) -> &[AgentId] {
        &self.occupants
    }
    fn occupants_mut(&mut self) -> &mut Vec<AgentId> {
        &mut self.occupants
    }
}

/// Tagged union over the three building kinds a graph node may host.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Building {
    Parking(Parking),
    GasStation(GasStation),
    Site(Site),
}

impl Building {
    pub fn id(&self) -> BuildingId {
        match self {
            Building::Parking(p) => p.id.clone(),
            Building::GasStation(g) => g.id.clone(),
            Building::Site(s) => s.id.as_building_id(),
        }
    }

    pub fn kind(&self) -> BuildingKind {
        match self {
            Building::Parking(_) => BuildingKind::Parking,
            Building::GasStation(_) => BuildingKind::GasStation,
            Building::Site(_) => BuildingKind::Site,
        }
    }

    pub fn as_parking(&self) -> Option<&Parking> {
        match self {
            Building::Parking(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_parking_mut(&mut self) -> Option<&mut Parking> {
        match self {
            Building::Parking(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_gas_station(&self) -> Option<&GasStation> {
        match self {
            Building::GasStation(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_gas_station_mut(&mut self) -> Option<&mut GasStation> {
        match self {
            Building::GasStation(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_site(&self) -> Option<&Site> {
        match self {
            Building::Site(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_site_mut(&mut self) -> Option<&mut Site> {
        match self {
            Building::Site(s) => Some(s),
            _ => None,
        }
    }
}
