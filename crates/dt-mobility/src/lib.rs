//! `dt-mobility` — the truck's continuous per-tick kinematic movement
//! engine: edge traversal, fuel consumption, CO₂ emission, and out-of-fuel
//! stranding.
//!
//! # Crate layout
//!
//! | Module     | Contents                                              |
//! |------------|--------------------------------------------------------|
//! | [`engine`] | `start_leg`, `advance_edge`, `EdgeOutcome`             |
//! | [`error`]  | `MobilityError`, `MobilityResult`                       |
//!
//! Unlike a teleport-at-arrival movement model, trucks here interpolate
//! continuously along an edge's `progress_m`, paying fuel every tick they
//! move rather than all at once on arrival — the per-tick granularity the
//! tachograph and fuel-seek probability models (`dt-behavior`) depend on.

pub mod engine;
pub mod error;

#[cfg(test)]
mod tests;

pub use engine::{advance_edge, current_speed_kph, start_leg, EdgeOutcome, BASE_TRUCK_WEIGHT_TONNES};
pub use error::{MobilityError, MobilityResult};
