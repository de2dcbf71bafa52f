//! Errors raised by the decision ladders themselves, as distinct from the
//! invariant violations `dt-agent` raises on its own data and the kinematic
//! failures `dt-mobility` raises on its own.

use thiserror::Error;

use dt_agent::AgentError;
use dt_mobility::MobilityError;

#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("behavior configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Mobility(#[from] MobilityError),
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
