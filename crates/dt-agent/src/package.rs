//! Package value/deadline record and its lifecycle states.

use serde::{Deserialize, Serialize};

use dt_core::{PackageId, SiteId, Tick};

/// Shipping priority. Scales a package's value on top of [`Urgency`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn value_multiplier(self) -> f64 {
        match self {
            Priority::Low | Priority::Medium => 1.0,
            Priority::High => 1.5,
            Priority::Urgent => 2.0,
        }
    }
}

/// Delivery-speed tier. Independent of [`Priority`]; both multipliers apply.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Standard,
    Express,
    SameDay,
}

impl Urgency {
    pub fn value_multiplier(self) -> f64 {
        match self {
            Urgency::Standard => 1.0,
            Urgency::Express => 1.3,
            Urgency::SameDay => 1.8,
        }
    }
}

/// A package's position in its spawn -> pickup -> delivery -> (expiry) lifecycle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    WaitingPickup,
    InTransit,
    Delivered,
    Expired,
}

/// A shipment between two sites.
///
/// Transitions monotonically: `WaitingPickup -> InTransit -> Delivered`, or
/// `WaitingPickup -> Expired`. Delivered and expired packages are dropped
/// from the world's active set; callers that need history rely on the
/// `package.*` events emitted at the transition, not on the record itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub origin_site: SiteId,
    pub destination_site: SiteId,
    /// Cargo size, in the same units as `Truck::capacity` (1..=30).
    pub size: u32,
    pub value_currency: f64,
    pub priority: Priority,
    pub urgency: Urgency,
    pub spawn_tick: Tick,
    pub pickup_deadline_tick: Tick,
    pub delivery_deadline_tick: Tick,
    pub status: PackageStatus,
}

impl Package {
    /// Apply the priority/urgency multipliers to a base value rolled by the
    /// originating site's generator.
    pub fn apply_value_multipliers(base_value: f64, priority: Priority, urgency: Urgency) -> f64 {
        base_value * priority.value_multiplier() * urgency.value_multiplier()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, PackageStatus::WaitingPickup | PackageStatus::InTransit)
    }

    pub fn mark_in_transit(&mut self) {
        self.status = PackageStatus::InTransit;
    }

    pub fn mark_delivered(&mut self) {
        self.status = PackageStatus::Delivered;
    }

    pub fn mark_expired(&mut self) {
        self.status = PackageStatus::Expired;
    }

    /// Payment for a delivery completed at `delivery_tick`, discounted
    /// linearly for lateness (0.1% of value per tick past the deadline,
    /// floored at 0).
    pub fn late_discounted_payment(&self, delivery_tick: Tick) -> f64 {
        let late_ticks = delivery_tick.since(self.delivery_deadline_tick) as f64;
        let discount = (0.001 * late_ticks.max(0.0)).min(1.0);
        self.value_currency * (1.0 - discount).max(0.0)
    }
}
