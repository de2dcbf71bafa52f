//! Planar coordinate type used by the road graph.
//!
//! Unlike a geographic digital twin built over real-world OSM data, this
//! simulator's map is synthetic: nodes carry a planar `(x, y)` position in
//! metres on a flat generated plane rather than a latitude/longitude pair.
//! Straight-line distance is therefore ordinary Euclidean distance, used
//! directly as the A* heuristic (see `dt-spatial::router`).

/// A planar point in metres.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in metres.
    #[inline]
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Cheap bounding-box check, useful before a more expensive exact test.
    #[inline]
    pub fn within_bbox(self, center: GeoPoint, half_extent_m: f64) -> bool {
        (self.x - center.x).abs() <= half_extent_m && (self.y - center.y).abs() <= half_extent_m
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}
