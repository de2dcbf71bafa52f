//! World-level error type, wrapping the per-subsystem errors raised while
//! servicing a tick or an administrative action.

use thiserror::Error;

use dt_agent::AgentError;
use dt_behavior::BehaviorError;
use dt_core::{AgentId, BuildingId, NodeId, PackageId};
use dt_spatial::SpatialError;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("building {0} not found")]
    BuildingNotFound(BuildingId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("package {0} not found")]
    PackageNotFound(PackageId),

    #[error("agent {0} already exists")]
    DuplicateAgent(AgentId),

    #[error(transparent)]
    Behavior(#[from] BehaviorError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error("malformed save document: {0}")]
    SaveFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type WorldResult<T> = Result<T, WorldError>;
