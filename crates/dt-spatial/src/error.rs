//! Spatial-subsystem error type.

use thiserror::Error;

use dt_core::{BuildingId, EdgeId, NodeId};

/// Errors produced by `dt-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("edge {0} not found in network")]
    EdgeNotFound(EdgeId),

    #[error("invalid edge: {0}")]
    InvalidEdge(String),

    #[error("building {0} is already attached to a node")]
    DuplicateBuilding(BuildingId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
