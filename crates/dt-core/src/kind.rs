//! Small tag enums shared across crate boundaries.
//!
//! These live in `dt-core` rather than alongside their full payload types
//! (`dt-agent::Building`, `dt-agent::Agent`) so that `dt-spatial`'s graph can
//! maintain a type-keyed building index without depending on `dt-agent`.

use serde::{Deserialize, Serialize};

/// Discriminator for the three building variants a graph node may host.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Parking,
    GasStation,
    Site,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 3] = [BuildingKind::Parking, BuildingKind::GasStation, BuildingKind::Site];

    pub fn as_str(self) -> &'static str {
        match self {
            BuildingKind::Parking => "parking",
            BuildingKind::GasStation => "gas_station",
            BuildingKind::Site => "site",
        }
    }
}

impl std::fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminator for the two concrete agent kinds the broker and tick loop
/// dispatch over.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Truck,
    Broker,
}

impl AgentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Truck => "truck",
            AgentKind::Broker => "broker",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
