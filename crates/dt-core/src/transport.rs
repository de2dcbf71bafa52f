//! Edge-attribute enums shared by the road graph and routing layers.

use serde::{Deserialize, Serialize};

/// Functional class of a road edge, mirroring how the map generator tags
/// arterials vs. local streets. Purely descriptive — it does not affect
/// routing cost directly (speed/length do), but is retained on export/import
/// and surfaced to clients describing the map.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadClass {
    Local,
    #[default]
    Arterial,
    Highway,
    Ring,
}

impl RoadClass {
    pub fn as_str(self) -> &'static str {
        match self {
            RoadClass::Local => "local",
            RoadClass::Arterial => "arterial",
            RoadClass::Highway => "highway",
            RoadClass::Ring => "ring",
        }
    }
}

impl std::fmt::Display for RoadClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode of travel an edge supports. Trucks are the only agents that move in
/// this simulation, so `Road` is presently the only variant; the type stays
/// `non_exhaustive` so the wire schema does not need to change if a future
/// extension adds rail or waterway edges.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum RoadMode {
    #[default]
    Road,
}

impl RoadMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RoadMode::Road => "road",
        }
    }
}

impl std::fmt::Display for RoadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
