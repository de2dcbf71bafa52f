//! Errors raised by the kinematic movement engine.

use thiserror::Error;

use dt_core::EdgeId;

#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("truck is not positioned on an edge")]
    NotOnEdge,

    #[error("edge {0} referenced by a truck's position no longer exists in the graph")]
    EdgeNotFound(EdgeId),

    #[error("no edge connects the truck's current node to the next route waypoint")]
    NoEdgeToNextWaypoint,
}

pub type MobilityResult<T> = Result<T, MobilityError>;
