//! Site: a Poisson package-spawn source with weighted destination selection.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use dt_core::{AgentRng, PackageId, SiteId, Tick};

use crate::package::{Package, PackageStatus, Priority, Urgency};

/// Ranges and weighted-discrete distributions a site draws from when
/// generating a new package.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackageGenConfig {
    pub size_range: (u32, u32),
    pub base_value_range: (f64, f64),
    pub pickup_deadline_range_ticks: (u64, u64),
    pub delivery_deadline_range_ticks: (u64, u64),
    pub priority_weights: Vec<(Priority, f64)>,
    pub urgency_weights: Vec<(Urgency, f64)>,
}

impl Default for PackageGenConfig {
    fn default() -> Self {
        Self {
            size_range: (1, 30),
            base_value_range: (50.0, 500.0),
            pickup_deadline_range_ticks: (30, 240),
            delivery_deadline_range_ticks: (60, 480),
            priority_weights: vec![
                (Priority::Low, 0.4),
                (Priority::Medium, 0.35),
                (Priority::High, 0.2),
                (Priority::Urgent, 0.05),
            ],
            urgency_weights: vec![
                (Urgency::Standard, 0.6),
                (Urgency::Express, 0.3),
                (Urgency::SameDay, 0.1),
            ],
        }
    }
}

fn weighted_pick<T: Copy>(weights: &[(T, f64)], rng: &mut AgentRng) -> Option<T> {
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 || weights.is_empty() {
        return None;
    }
    let mut pick = rng.gen_range(0.0..total);
    for (item, w) in weights {
        if pick < *w {
            return Some(*item);
        }
        pick -= w;
    }
    weights.last().map(|(item, _)| *item)
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SiteStats {
    pub packages_generated: u64,
    pub packages_picked_up: u64,
    pub packages_delivered: u64,
    pub packages_expired: u64,
    pub total_value_delivered: f64,
    pub total_value_expired: f64,
}

/// Parameters rolled for one new package; the caller (world tick loop) turns
/// this into a [`Package`] once origin/destination nodes are resolved.
#[derive(Clone, Debug)]
pub struct PackageParams {
    pub size: u32,
    pub value_currency: f64,
    pub priority: Priority,
    pub urgency: Urgency,
    pub pickup_deadline_tick: Tick,
    pub delivery_deadline_tick: Tick,
}

/// The `Site` building variant: a named package source/sink with a Poisson
/// spawn process over a configurable activity rate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    /// Packages per hour; `0.0` means the site never spawns.
    pub activity_rate_per_hour: f64,
    pub destination_weights: HashMap<SiteId, f64>,
    pub gen_config: PackageGenConfig,
    pub active_packages: Vec<PackageId>,
    pub stats: SiteStats,
}

impl Site {
    pub fn new(id: SiteId, name: impl Into<String>, activity_rate_per_hour: f64) -> Self {
        Self {
            id,
            name: name.into(),
            activity_rate_per_hour,
            destination_weights: HashMap::new(),
            gen_config: PackageGenConfig::default(),
            active_packages: Vec::new(),
            stats: SiteStats::default(),
        }
    }

    /// Inhomogeneous Poisson thinning: spawn probability this tick is
    /// `1 - exp(-(lambda/3600) * dt_s)`.
    pub fn should_spawn_package(&self, dt_s: f64, rng: &mut AgentRng) -> bool {
        if self.activity_rate_per_hour <= 0.0 {
            return false;
        }
        let lambda_per_s = self.activity_rate_per_hour / 3600.0;
        let p = 1.0 - (-(lambda_per_s * dt_s)).exp();
        rng.gen_bool(p)
    }

    /// Weighted random pick from `destination_weights`, restricted to
    /// `available` (and excluding `self`). Falls back to uniform if no
    /// candidate carries a positive weight. `None` if `available` is empty.
    pub fn select_destination(&self, available: &[SiteId], rng: &mut AgentRng) -> Option<SiteId> {
        let candidates: Vec<&SiteId> = available.iter().filter(|s| **s != self.id).collect();
        if candidates.is_empty() {
            return None;
        }
        let weighted: Vec<(usize, f64)> = candidates
            .iter()
            .enumerate()
            .map(|(i, s)| (i, *self.destination_weights.get(*s).unwrap_or(&0.0)))
            .collect();
        let total: f64 = weighted.iter().map(|(_, w)| w).sum();
        let idx = if total <= 0.0 {
            rng.gen_range(0..candidates.len())
        } else {
            let mut pick = rng.gen_range(0.0..total);
            let mut chosen = candidates.len() - 1;
            for (i, w) in &weighted {
                if pick < *w {
                    chosen = *i;
                    break;
                }
                pick -= w;
            }
            chosen
        };
        Some(candidates[idx].clone())
    }

    /// Draw size/value/priority/urgency plus deadlines for a new package.
    /// `dt_s` lets the 30-60 minute delivery-after-pickup pad be expressed in
    /// ticks regardless of tick duration.
    pub fn generate_package_parameters(&self, spawn_tick: Tick, dt_s: f64, rng: &mut AgentRng) -> PackageParams {
        let cfg = &self.gen_config;
        let size = rng.gen_range(cfg.size_range.0..=cfg.size_range.1);
        let base_value = rng.gen_range(cfg.base_value_range.0..cfg.base_value_range.1);
        let priority = weighted_pick(&cfg.priority_weights, rng).unwrap_or(Priority::Medium);
        let urgency = weighted_pick(&cfg.urgency_weights, rng).unwrap_or(Urgency::Standard);
        let value_currency = Package::apply_value_multipliers(base_value, priority, urgency);

        let pickup_offset = rng.gen_range(cfg.pickup_deadline_range_ticks.0..=cfg.pickup_deadline_range_ticks.1);
        let delivery_offset = rng.gen_range(cfg.delivery_deadline_range_ticks.0..=cfg.delivery_deadline_range_ticks.1);

        let pickup_deadline_tick = spawn_tick.offset(pickup_offset);
        let mut delivery_deadline_tick = spawn_tick.offset(delivery_offset);

        let min_pad_ticks = ((30.0 * 60.0) / dt_s).ceil().max(1.0) as u64;
        let max_pad_ticks = ((60.0 * 60.0) / dt_s).ceil().max(min_pad_ticks) as u64;
        if delivery_deadline_tick <= pickup_deadline_tick {
            let pad = rng.gen_range(min_pad_ticks..=max_pad_ticks);
            delivery_deadline_tick = pickup_deadline_tick.offset(pad);
        }

        PackageParams { size, value_currency, priority, urgency, pickup_deadline_tick, delivery_deadline_tick }
    }
}
