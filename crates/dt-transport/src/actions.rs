//! Action-name parsing: maps the wire string (`"<domain>.<verb>"`) onto the
//! closed set of actions the controller's registry knows how to handle.
//! Unknown names are a [`TransportError::UnknownAction`], not a
//! panic — one more action a client can send without ever taking a
//! connection down.

use crate::error::TransportError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActionType {
    SimulationStart,
    SimulationStop,
    SimulationPause,
    SimulationResume,
    SimulationSaveState,
    SimulationImportState,
    TickRateUpdate,
    AgentCreate,
    AgentDelete,
    AgentUpdate,
    AgentDescribe,
    AgentList,
    MapCreate,
    MapExport,
    MapImport,
    StateRequest,
}

impl ActionType {
    pub fn parse(action: &str) -> Result<Self, TransportError> {
        Ok(match action {
            "simulation.start" => Self::SimulationStart,
            "simulation.stop" => Self::SimulationStop,
            "simulation.pause" => Self::SimulationPause,
            "simulation.resume" => Self::SimulationResume,
            "simulation.save_state" => Self::SimulationSaveState,
            "simulation.import_state" => Self::SimulationImportState,
            "tick_rate.update" => Self::TickRateUpdate,
            "agent.create" => Self::AgentCreate,
            "agent.delete" => Self::AgentDelete,
            "agent.update" => Self::AgentUpdate,
            "agent.describe" => Self::AgentDescribe,
            "agent.list" => Self::AgentList,
            "map.create" => Self::MapCreate,
            "map.export" => Self::MapExport,
            "map.import" => Self::MapImport,
            "state.request" => Self::StateRequest,
            other => return Err(TransportError::UnknownAction(other.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_every_documented_action() {
        let names = [
            "simulation.start", "simulation.stop", "simulation.pause", "simulation.resume",
            "simulation.save_state", "simulation.import_state", "tick_rate.update",
            "agent.create", "agent.delete", "agent.update", "agent.describe", "agent.list",
            "map.create", "map.export", "map.import", "state.request",
        ];
        for name in names {
            assert!(ActionType::parse(name).is_ok(), "expected {name} to parse");
        }
    }

    #[test]
    fn rejects_unknown_action() {
        let err = ActionType::parse("simulation.teleport").unwrap_err();
        assert!(matches!(err, TransportError::UnknownAction(_)));
    }
}
