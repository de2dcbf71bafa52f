//! Validated generation parameters, assembled the way a `SimBuilder` would
//! build a `Sim`: a fluent builder over grouped fields that defers all
//! validation to a single `.build()` call rather than per-setter checks.

use serde::{Deserialize, Serialize};

use crate::error::{GeneratorError, GeneratorResult};

/// Hierarchical procedural map generation parameters. A single `seed`
/// drives one scoped RNG for the whole run — no global RNG is touched.
///
/// Deserializes with every field defaulted to [`GenerationParams::default`]'s
/// values, so a `map.create` action only needs to supply the fields it wants
/// to override.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub map_width_km: f64,
    pub map_height_km: f64,

    pub num_major_centers: u32,
    pub minor_per_major: u32,
    pub center_separation_km: f64,
    pub urban_sprawl_km: f64,

    pub local_density: f64,
    pub rural_density: f64,

    pub intra_connectivity: f64,
    pub inter_connectivity: f64,
    pub arterial_ratio: f64,
    pub gridness: f64,
    pub ring_road_prob: f64,
    pub highway_curviness: f64,

    pub rural_settlement_prob: f64,
    pub urban_sites_per_km2: f64,
    pub rural_sites_per_km2: f64,
    pub urban_activity_rate_range: (f64, f64),
    pub rural_activity_rate_range: (f64, f64),

    pub urban_parkings_per_km2: f64,
    pub rural_parkings_per_km2: f64,
    pub urban_gas_stations_per_km2: f64,
    pub rural_gas_stations_per_km2: f64,
    pub gas_station_capacity_range: (u32, u32),
    pub gas_station_cost_factor_range: (f64, f64),

    pub seed: u64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::defaults(42)
    }
}

impl GenerationParams {
    fn defaults(seed: u64) -> Self {
        Self {
            map_width_km: 40.0,
            map_height_km: 40.0,
            num_major_centers: 3,
            minor_per_major: 2,
            center_separation_km: 12.0,
            urban_sprawl_km: 3.0,
            local_density: 8.0,
            rural_density: 0.5,
            intra_connectivity: 0.15,
            inter_connectivity: 0.35,
            arterial_ratio: 0.25,
            gridness: 0.5,
            ring_road_prob: 0.3,
            highway_curviness: 0.2,
            rural_settlement_prob: 0.4,
            urban_sites_per_km2: 0.6,
            rural_sites_per_km2: 0.05,
            urban_activity_rate_range: (2.0, 20.0),
            rural_activity_rate_range: (0.2, 3.0),
            urban_parkings_per_km2: 0.3,
            rural_parkings_per_km2: 0.02,
            urban_gas_stations_per_km2: 0.15,
            rural_gas_stations_per_km2: 0.02,
            gas_station_capacity_range: (2, 8),
            gas_station_cost_factor_range: (0.85, 1.35),
            seed,
        }
    }

    fn validate(&self) -> GeneratorResult<()> {
        positive("map_width_km", self.map_width_km)?;
        positive("map_height_km", self.map_height_km)?;
        at_least_one("num_major_centers", self.num_major_centers)?;
        positive("center_separation_km", self.center_separation_km)?;
        positive("urban_sprawl_km", self.urban_sprawl_km)?;
        positive("local_density", self.local_density)?;
        non_negative("rural_density", self.rural_density)?;
        unit_range("intra_connectivity", self.intra_connectivity)?;
        unit_range("inter_connectivity", self.inter_connectivity)?;
        unit_range("arterial_ratio", self.arterial_ratio)?;
        unit_range("gridness", self.gridness)?;
        unit_range("ring_road_prob", self.ring_road_prob)?;
        unit_range("highway_curviness", self.highway_curviness)?;
        unit_range("rural_settlement_prob", self.rural_settlement_prob)?;
        non_negative("urban_sites_per_km2", self.urban_sites_per_km2)?;
        non_negative("rural_sites_per_km2", self.rural_sites_per_km2)?;
        non_negative_range("urban_activity_rate_range", self.urban_activity_rate_range)?;
        non_negative_range("rural_activity_rate_range", self.rural_activity_rate_range)?;
        non_negative("urban_parkings_per_km2", self.urban_parkings_per_km2)?;
        non_negative("rural_parkings_per_km2", self.rural_parkings_per_km2)?;
        non_negative("urban_gas_stations_per_km2", self.urban_gas_stations_per_km2)?;
        non_negative("rural_gas_stations_per_km2", self.rural_gas_stations_per_km2)?;
        positive_int_range("gas_station_capacity_range", self.gas_station_capacity_range)?;
        positive_range("gas_station_cost_factor_range", self.gas_station_cost_factor_range)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> GeneratorResult<()> {
    if value <= 0.0 {
        return Err(GeneratorError::NotPositive { field, value });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f64) -> GeneratorResult<()> {
    if value < 0.0 {
        return Err(GeneratorError::Negative { field, value });
    }
    Ok(())
}

fn at_least_one(field: &'static str, value: u32) -> GeneratorResult<()> {
    if value < 1 {
        return Err(GeneratorError::TooSmall { field, value });
    }
    Ok(())
}

fn unit_range(field: &'static str, value: f64) -> GeneratorResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(GeneratorError::OutOfUnitRange { field, value });
    }
    Ok(())
}

fn non_negative_range(field: &'static str, (min, max): (f64, f64)) -> GeneratorResult<()> {
    if min < 0.0 || max < 0.0 {
        return Err(GeneratorError::NegativeRange { field, min, max });
    }
    if min > max {
        return Err(GeneratorError::InvalidRange { field, min, max });
    }
    Ok(())
}

fn positive_range(field: &'static str, (min, max): (f64, f64)) -> GeneratorResult<()> {
    if min <= 0.0 || max <= 0.0 {
        return Err(GeneratorError::NonPositiveRange { field, min, max });
    }
    if min > max {
        return Err(GeneratorError::InvalidRange { field, min, max });
    }
    Ok(())
}

fn positive_int_range(field: &'static str, (min, max): (u32, u32)) -> GeneratorResult<()> {
    if min < 1 || max < 1 {
        return Err(GeneratorError::NonPositiveRange { field, min: min as f64, max: max as f64 });
    }
    if min > max {
        return Err(GeneratorError::InvalidRange { field, min: min as f64, max: max as f64 });
    }
    Ok(())
}

/// Fluent builder; every setter is infallible, all validation happens once in
/// [`GenerationParamsBuilder::build`].
pub struct GenerationParamsBuilder {
    params: GenerationParams,
}

impl GenerationParamsBuilder {
    pub fn new(seed: u64) -> Self {
        Self { params: GenerationParams::defaults(seed) }
    }

    pub fn map_size(mut self, width_km: f64, height_km: f64) -> Self {
        self.params.map_width_km = width_km;
        self.params.map_height_km = height_km;
        self
    }

    pub fn centers(mut self, num_major: u32, minor_per_major: u32, separation_km: f64, sprawl_km: f64) -> Self {
        self.params.num_major_centers = num_major;
        self.params.minor_per_major = minor_per_major;
        self.params.center_separation_km = separation_km;
        self.params.urban_sprawl_km = sprawl_km;
        self
    }

    pub fn density(mut self, local: f64, rural: f64) -> Self {
        self.params.local_density = local;
        self.params.rural_density = rural;
        self
    }

    pub fn connectivity(
        mut self,
        intra: f64,
        inter: f64,
        arterial_ratio: f64,
        gridness: f64,
        ring_road_prob: f64,
        highway_curviness: f64,
    ) -> Self {
        self.params.intra_connectivity = intra;
        self.params.inter_connectivity = inter;
        self.params.arterial_ratio = arterial_ratio;
        self.params.gridness = gridness;
        self.params.ring_road_prob = ring_road_prob;
        self.params.highway_curviness = highway_curviness;
        self
    }

    pub fn sites(
        mut self,
        rural_settlement_prob: f64,
        urban_per_km2: f64,
        rural_per_km2: f64,
        urban_activity_range: (f64, f64),
        rural_activity_range: (f64, f64),
    ) -> Self {
        self.params.rural_settlement_prob = rural_settlement_prob;
        self.params.urban_sites_per_km2 = urban_per_km2;
        self.params.rural_sites_per_km2 = rural_per_km2;
        self.params.urban_activity_rate_range = urban_activity_range;
        self.params.rural_activity_rate_range = rural_activity_range;
        self
    }

    pub fn facilities(
        mut self,
        urban_parkings_per_km2: f64,
        rural_parkings_per_km2: f64,
        urban_gas_per_km2: f64,
        rural_gas_per_km2: f64,
        gas_capacity_range: (u32, u32),
        gas_cost_factor_range: (f64, f64),
    ) -> Self {
        self.params.urban_parkings_per_km2 = urban_parkings_per_km2;
        self.params.rural_parkings_per_km2 = rural_parkings_per_km2;
        self.params.urban_gas_stations_per_km2 = urban_gas_per_km2;
        self.params.rural_gas_stations_per_km2 = rural_gas_per_km2;
        self.params.gas_station_capacity_range = gas_capacity_range;
        self.params.gas_station_cost_factor_range = gas_cost_factor_range;
        self
    }

    pub fn build(self) -> GeneratorResult<GenerationParams> {
        self.params.validate()?;
        Ok(self.params)
    }
}
