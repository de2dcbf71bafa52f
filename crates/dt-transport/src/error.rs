//! Transport-layer error type. Every variant here maps to an
//! `error` signal rather than a connection close or an HTTP failure — a bad
//! action never takes the socket down.

use thiserror::Error;

use dt_generator::GeneratorError;
use dt_world::error::WorldError;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("malformed action: {0}")]
    MalformedAction(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("invalid params for '{action}': {reason}")]
    InvalidParams { action: String, reason: String },

    #[error("action queue is full, action dropped")]
    QueueFull,

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Generation(#[from] GeneratorError),

    #[error("save/load failure: {0}")]
    SaveLoad(String),
}

impl TransportError {
    /// The stable `error.code` surfaced on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::MalformedAction(_) => "malformed_action",
            TransportError::UnknownAction(_) => "unknown_action",
            TransportError::InvalidParams { .. } => "invalid_params",
            TransportError::QueueFull => "queue_full",
            TransportError::World(_) => "world_error",
            TransportError::Generation(_) => "generation_error",
            TransportError::SaveLoad(_) => "save_load_error",
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
