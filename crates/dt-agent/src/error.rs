//! Invariant violations raised by the domain model itself, as distinct from
//! the decision-ladder errors `dt-behavior` raises when a tick step can't
//! proceed.

use thiserror::Error;

use dt_core::{AgentId, BuildingId, PackageId};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("truck {truck} has no room for package {package} ({needed} needed, {free} free)")]
    CapacityExceeded { truck: AgentId, package: PackageId, needed: u32, free: u32 },

    #[error("package {0} is not currently loaded on this truck")]
    PackageNotLoaded(PackageId),

    #[error("building {0} is at capacity")]
    OccupancyFull(BuildingId),

    #[error("agent {0} is not occupying building {1}")]
    NotOccupying(AgentId, BuildingId),
}

pub type AgentResult<T> = Result<T, AgentError>;
