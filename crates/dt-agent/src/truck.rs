//! Truck agent data model.
//!
//! The priority-ordered decision ladder that drives a truck each tick lives
//! in `dt-behavior` (it needs routing and world access); this module only
//! owns truck state and the state-local invariants/helpers that don't need
//! either.

use serde::{Deserialize, Serialize};

use dt_core::{AgentId, BuildingId, EdgeId, NodeId, PackageId, SiteId};

use crate::error::{AgentError, AgentResult};

/// Where on the graph a truck currently sits. Mutually exclusive by
/// construction — there is no way to represent "both set" or "neither set"
/// outside of explicit transitional helper calls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Position {
    AtNode(NodeId),
    OnEdge { edge: EdgeId, progress_m: f64 },
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Pickup,
    Delivery,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryTask {
    pub site_id: SiteId,
    pub task_type: TaskType,
    pub package_ids: Vec<PackageId>,
    pub status: TaskStatus,
}

impl DeliveryTask {
    pub fn new(site_id: SiteId, task_type: TaskType, package_id: PackageId) -> Self {
        Self { site_id, task_type, package_ids: vec![package_id], status: TaskStatus::Pending }
    }
}

/// Tachograph driving-time accounting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tachograph {
    pub driving_time_s: f64,
    pub resting_time_s: f64,
    pub is_resting: bool,
    pub required_rest_s: f64,
    pub risk_factor: f64,
}

impl Default for Tachograph {
    fn default() -> Self {
        Self { driving_time_s: 0.0, resting_time_s: 0.0, is_resting: false, required_rest_s: 0.0, risk_factor: 0.0 }
    }
}

impl Tachograph {
    pub const HARD_CAP_S: f64 = 8.0 * 3600.0;

    /// Required rest in seconds for `driving_time_s` hours driven: 1:1 up to
    /// 6h, then linear to (8h driven -> 10h rest).
    pub fn required_rest_for(driving_time_s: f64) -> f64 {
        let hours = driving_time_s / 3600.0;
        let rest_hours = if hours <= 6.0 {
            hours
        } else {
            let t = ((hours - 6.0) / 2.0).clamp(0.0, 1.0);
            6.0 + t * (10.0 - 6.0)
        };
        rest_hours * 3600.0
    }

    pub fn add_driving(&mut self, dt_s: f64) {
        self.driving_time_s += dt_s;
    }

    pub fn begin_rest(&mut self) {
        self.required_rest_s = Self::required_rest_for(self.driving_time_s);
        self.resting_time_s = 0.0;
        self.is_resting = true;
    }

    pub fn end_rest(&mut self) {
        self.driving_time_s = 0.0;
        self.resting_time_s = 0.0;
        self.is_resting = false;
    }
}

/// Fuel tank and emissions accounting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FuelState {
    pub tank_capacity_l: f64,
    pub current_fuel_l: f64,
    pub co2_emitted_kg: f64,
    pub is_fueling: bool,
    pub fueling_liters_needed: f64,
}

impl FuelState {
    pub const CO2_PER_LITER_KG: f64 = 2.68;

    pub fn full(tank_capacity_l: f64) -> Self {
        Self { tank_capacity_l, current_fuel_l: tank_capacity_l, co2_emitted_kg: 0.0, is_fueling: false, fueling_liters_needed: 0.0 }
    }

    pub fn fraction(&self) -> f64 {
        if self.tank_capacity_l <= 0.0 {
            0.0
        } else {
            (self.current_fuel_l / self.tank_capacity_l).clamp(0.0, 1.0)
        }
    }

    /// Liters/100km consumption given cargo weight, per the 25 + 1.5*tonnes
    /// model.
    pub fn consumption_l_per_100km(cargo_weight_tonnes: f64) -> f64 {
        25.0 + 1.5 * cargo_weight_tonnes
    }

    pub fn consume(&mut self, distance_km: f64, cargo_weight_tonnes: f64) {
        let liters = Self::consumption_l_per_100km(cargo_weight_tonnes) / 100.0 * distance_km;
        self.current_fuel_l = (self.current_fuel_l - liters).max(0.0);
        self.co2_emitted_kg += liters * Self::CO2_PER_LITER_KG;
    }
}

/// What a truck is currently prioritizing, at most one "seeking" flag active.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TruckFlags {
    pub is_seeking_parking: bool,
    pub is_seeking_idle_parking: bool,
    pub is_seeking_gas_station: bool,
    pub is_loading: bool,
    pub is_unloading: bool,
}

impl TruckFlags {
    pub fn clear_seeking(&mut self) {
        self.is_seeking_parking = false;
        self.is_seeking_idle_parking = false;
        self.is_seeking_gas_station = false;
    }
}

/// A truck: the engine's only mobile agent kind besides the broker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Truck {
    pub id: AgentId,
    pub position: Position,

    pub route: Vec<NodeId>,
    pub destination: Option<NodeId>,
    pub route_start_node: Option<NodeId>,
    pub route_end_node: Option<NodeId>,
    pub original_destination: Option<NodeId>,

    pub max_speed_kph: f64,
    pub capacity: u32,
    pub loaded_packages: Vec<PackageId>,

    pub tachograph: Tachograph,
    pub fuel: FuelState,

    pub delivery_queue: Vec<DeliveryTask>,

    pub current_building_id: Option<BuildingId>,
    pub flags: TruckFlags,

    pub loading_progress_s: f64,
    pub loading_target_s: f64,

    pub balance_ducats: f64,
}

impl Truck {
    pub fn new(id: AgentId, at: NodeId, max_speed_kph: f64, capacity: u32, tank_capacity_l: f64) -> Self {
        Self {
            id,
            position: Position::AtNode(at),
            route: Vec::new(),
            destination: None,
            route_start_node: None,
            route_end_node: None,
            original_destination: None,
            max_speed_kph,
            capacity,
            loaded_packages: Vec::new(),
            tachograph: Tachograph::default(),
            fuel: FuelState::full(tank_capacity_l),
            delivery_queue: Vec::new(),
            current_building_id: None,
            flags: TruckFlags::default(),
            loading_progress_s: 0.0,
            loading_target_s: 0.0,
            balance_ducats: 0.0,
        }
    }

    pub fn current_node(&self) -> Option<NodeId> {
        match self.position {
            Position::AtNode(n) => Some(n),
            Position::OnEdge { .. } => None,
        }
    }

    pub fn loaded_size(&self, sizes: impl Fn(&PackageId) -> u32) -> u32 {
        self.loaded_packages.iter().map(sizes).sum()
    }

    pub fn free_capacity(&self, sizes: impl Fn(&PackageId) -> u32) -> u32 {
        self.capacity.saturating_sub(self.loaded_size(sizes))
    }

    /// Merge a new pickup/delivery task for `site`/`package` into an
    /// existing `Pending` task of the same type at the same site, or append
    /// a new one. Delivery tasks are kept after the pickup task for the same
    /// package (never consolidated ahead of it).
    pub fn enqueue_task(&mut self, site_id: SiteId, task_type: TaskType, package_id: PackageId) {
        if let Some(existing) = self
            .delivery_queue
            .iter_mut()
            .find(|t| t.site_id == site_id && t.task_type == task_type && t.status == TaskStatus::Pending)
        {
            existing.package_ids.push(package_id);
            return;
        }
        self.delivery_queue.push(DeliveryTask::new(site_id, task_type, package_id));
    }

    pub fn cargo_weight_tonnes(&self, sizes: impl Fn(&PackageId) -> u32) -> f64 {
        self.loaded_size(sizes) as f64 * 0.1
    }

    /// Load `package` (size `size`) onto the truck, rejecting it if it
    /// doesn't fit in the remaining capacity.
    pub fn load_package(&mut self, package_id: PackageId, size: u32, sizes: impl Fn(&PackageId) -> u32) -> AgentResult<()> {
        let free = self.free_capacity(sizes);
        if size > free {
            return Err(AgentError::CapacityExceeded { truck: self.id.clone(), package: package_id, needed: size, free });
        }
        self.loaded_packages.push(package_id);
        Ok(())
    }

    pub fn unload_package(&mut self, package_id: &PackageId) -> AgentResult<()> {
        let before = self.loaded_packages.len();
        self.loaded_packages.retain(|p| p != package_id);
        if self.loaded_packages.len() == before {
            return Err(AgentError::PackageNotLoaded(package_id.clone()));
        }
        Ok(())
    }
}
