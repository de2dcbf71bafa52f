//! `SimulationController` — owns the [`World`], the action registry, and the
//! tick-paced real-time loop. Runs on its own OS thread; the only
//! things it shares with the transport task are the two bounded queues.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, trace, warn};

use dt_agent::Truck;
use dt_core::{AgentId, NodeId, SimConfig};
use dt_generator::{generate, GenerationParams};
use dt_world::save::{export_map, import_map};
use dt_world::{SaveDocument, World};

use crate::actions::ActionType;
use crate::error::{TransportError, TransportResult};
use crate::protocol::{ActionMessage, SignalMessage};
use crate::queue::BoundedQueue;
use crate::signals::{agent_diff_signal, building_update_signal, event_signal};

pub type ActionQueue = BoundedQueue<ActionMessage>;
pub type SignalQueue = BoundedQueue<SignalMessage>;

/// Wall-clock pause between tick attempts after an engine panic —
/// long enough that a programming-bug panic loop doesn't spin the thread hot.
const PANIC_BACKOFF: Duration = Duration::from_secs(1);

pub struct SimulationController {
    world: World,
    config: SimConfig,
    actions: Arc<ActionQueue>,
    signals: Arc<SignalQueue>,
    running: bool,
    paused: bool,
}

impl SimulationController {
    pub fn new(config: SimConfig, world: World, actions: Arc<ActionQueue>, signals: Arc<SignalQueue>) -> Self {
        Self { world, config, actions, signals, running: false, paused: false }
    }

    fn emit(&self, signal: SignalMessage) {
        if self.signals.try_push(signal).is_err() {
            warn!("signal queue full, dropping outbound signal");
        }
    }

    fn emit_error(&self, err: &TransportError) {
        error!(code = err.code(), "{err}");
        self.emit(SignalMessage::error(err.code(), err.to_string()));
    }

    /// The blocking real-time loop: drain actions, dispatch handlers,
    /// step the world if running, pace to `config.tick_rate`. Returns only
    /// when `shutdown` is flipped — the CLI binary owns that lifetime.
    pub fn run(mut self, shutdown: Arc<AtomicBool>) {
        info!(tick_rate = self.config.tick_rate, "controller started");
        while !shutdown.load(Ordering::Relaxed) {
            self.drain_actions();

            if self.running && !self.paused {
                match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.world.step())) {
                    Ok(Ok(report)) => self.emit_tick(report),
                    Ok(Err(world_err)) => self.emit_error(&TransportError::World(world_err)),
                    Err(panic) => {
                        let msg = panic_message(&panic);
                        error!(panic = %msg, "engine panic during tick, aborting tick and backing off");
                        self.emit(SignalMessage::error("engine_panic", msg));
                        std::thread::sleep(PANIC_BACKOFF);
                    }
                }
            }

            let period = if self.running && !self.paused {
                Duration::from_secs_f64(1.0 / self.config.tick_rate.max(0.001))
            } else {
                Duration::from_millis(100)
            };
            trace!(?period, "sleeping until next tick");
            std::thread::sleep(period);
        }
        info!("controller stopped");
    }

    fn drain_actions(&mut self) {
        for msg in self.actions.drain() {
            self.dispatch(msg);
        }
    }

    fn emit_tick(&mut self, report: dt_world::TickReport) {
        let tick = report.tick_data.tick;
        self.emit(SignalMessage::new("tick.start", json!({ "tick": tick })));
        for diff in &report.agent_diffs {
            self.emit(agent_diff_signal(diff));
        }
        for update in &report.building_updates {
            self.emit(building_update_signal(update));
        }
        for event in &report.events {
            self.emit(event_signal(event));
        }
        self.emit(SignalMessage::new("tick.end", json!({ "tick": tick })));
    }

    fn dispatch(&mut self, msg: ActionMessage) {
        let action = msg.action.clone();
        let outcome = ActionType::parse(&action).and_then(|kind| self.handle(kind, &action, msg.params));
        if let Err(err) = outcome {
            self.emit_error(&err);
        }
    }

    fn handle(&mut self, kind: ActionType, action: &str, params: Value) -> TransportResult<()> {
        match kind {
            ActionType::SimulationStart => self.handle_start(),
            ActionType::SimulationStop => self.handle_stop(),
            ActionType::SimulationPause => self.handle_pause(),
            ActionType::SimulationResume => self.handle_resume(),
            ActionType::SimulationSaveState => self.handle_save_state(),
            ActionType::SimulationImportState => self.handle_import_state(action, params),
            ActionType::TickRateUpdate => self.handle_tick_rate_update(action, params),
            ActionType::AgentCreate => self.handle_agent_create(action, params),
            ActionType::AgentDelete => self.handle_agent_delete(action, params),
            ActionType::AgentUpdate => self.handle_agent_update(action, params),
            ActionType::AgentDescribe => self.handle_agent_describe(action, params),
            ActionType::AgentList => self.handle_agent_list(),
            ActionType::MapCreate => self.handle_map_create(action, params),
            ActionType::MapExport => self.handle_map_export(),
            ActionType::MapImport => self.handle_map_import(action, params),
            ActionType::StateRequest => self.handle_state_request(),
        }
    }

    fn handle_start(&mut self) -> TransportResult<()> {
        self.running = true;
        self.paused = false;
        debug!("simulation started");
        self.emit(SignalMessage::new("simulation.started", json!({})));
        self.emit_snapshot()?;
        Ok(())
    }

    fn handle_stop(&mut self) -> TransportResult<()> {
        self.running = false;
        self.paused = false;
        debug!("simulation stopped");
        self.emit(SignalMessage::new("simulation.stopped", json!({})));
        Ok(())
    }

    fn handle_pause(&mut self) -> TransportResult<()> {
        self.paused = true;
        self.emit(SignalMessage::new("simulation.paused", json!({})));
        Ok(())
    }

    fn handle_resume(&mut self) -> TransportResult<()> {
        self.paused = false;
        self.emit(SignalMessage::new("simulation.resumed", json!({})));
        Ok(())
    }

    fn handle_save_state(&mut self) -> TransportResult<()> {
        let doc = self.world.to_save_document();
        let data = serde_json::to_value(&doc).map_err(|e| TransportError::SaveLoad(e.to_string()))?;
        self.emit(SignalMessage::new("simulation.saved", data));
        Ok(())
    }

    fn handle_import_state(&mut self, action: &str, params: Value) -> TransportResult<()> {
        #[derive(Deserialize)]
        struct Params {
            save: SaveDocument,
        }
        let parsed: Params = parse_params(action, params)?;
        let was_running = self.running;
        self.running = false;
        self.world = World::restore(self.config.clone(), &parsed.save)?;
        self.running = was_running;
        self.emit(SignalMessage::new("simulation.imported", json!({})));
        Ok(())
    }

    fn handle_tick_rate_update(&mut self, action: &str, params: Value) -> TransportResult<()> {
        #[derive(Deserialize)]
        struct Params {
            tick_rate: f64,
        }
        let parsed: Params = parse_params(action, params)?;
        if !(parsed.tick_rate.is_finite() && parsed.tick_rate > 0.0) {
            return Err(TransportError::InvalidParams { action: action.to_string(), reason: "tick_rate must be a positive finite number".into() });
        }
        self.config.tick_rate = parsed.tick_rate;
        self.emit(SignalMessage::new("tick_rate.updated", json!({ "tick_rate": parsed.tick_rate })));
        Ok(())
    }

    fn handle_agent_create(&mut self, action: &str, params: Value) -> TransportResult<()> {
        #[derive(Deserialize)]
        struct Params {
            id: String,
            at: u32,
            #[serde(default = "default_max_speed_kph")]
            max_speed_kph: f64,
            #[serde(default = "default_capacity")]
            capacity: u32,
            #[serde(default = "default_tank_capacity_l")]
            tank_capacity_l: f64,
        }
        let parsed: Params = parse_params(action, params)?;
        let truck = Truck::new(AgentId::new(parsed.id), NodeId(parsed.at), parsed.max_speed_kph, parsed.capacity, parsed.tank_capacity_l);
        let id = truck.id.clone();
        self.world.add_truck(truck)?;
        self.emit(SignalMessage::new("agent.created", json!({ "agent_id": id })));
        Ok(())
    }

    fn handle_agent_delete(&mut self, action: &str, params: Value) -> TransportResult<()> {
        #[derive(Deserialize)]
        struct Params {
            id: String,
        }
        let parsed: Params = parse_params(action, params)?;
        let id = AgentId::new(parsed.id);
        match self.world.remove_agent(&id) {
            Some(_) => {
                self.emit(SignalMessage::new("agent.deleted", json!({ "agent_id": id })));
                Ok(())
            }
            None => Err(TransportError::World(dt_world::error::WorldError::AgentNotFound(id))),
        }
    }

    fn handle_agent_update(&mut self, action: &str, params: Value) -> TransportResult<()> {
        #[derive(Deserialize)]
        struct Params {
            id: String,
            #[serde(default)]
            tags: HashMap<String, Value>,
        }
        let parsed: Params = parse_params(action, params)?;
        let id = AgentId::new(parsed.id);
        let agent = self.world.agents.get_mut(&id).ok_or_else(|| TransportError::World(dt_world::error::WorldError::AgentNotFound(id.clone())))?;
        agent.tags.extend(parsed.tags);
        let tags = agent.tags.clone();
        self.emit(SignalMessage::new("agent.updated", json!({ "agent_id": id, "tags": tags })));
        Ok(())
    }

    fn handle_agent_describe(&mut self, action: &str, params: Value) -> TransportResult<()> {
        #[derive(Deserialize)]
        struct Params {
            id: String,
        }
        let parsed: Params = parse_params(action, params)?;
        let id = AgentId::new(parsed.id);
        let agent = self.world.agents.get(&id).ok_or_else(|| TransportError::World(dt_world::error::WorldError::AgentNotFound(id.clone())))?;
        let data = serde_json::to_value(agent).map_err(|e| TransportError::SaveLoad(e.to_string()))?;
        self.emit(SignalMessage::new("agent.described", data));
        Ok(())
    }

    fn handle_agent_list(&mut self) -> TransportResult<()> {
        let agents: Vec<Value> = self
            .world
            .agents
            .iter()
            .map(|(id, agent)| json!({ "agent_id": id, "kind": agent.kind() }))
            .collect();
        self.emit(SignalMessage::new("agent.listed", json!({ "agents": agents })));
        Ok(())
    }

    fn handle_map_create(&mut self, action: &str, params: Value) -> TransportResult<()> {
        let generation_params: GenerationParams = if params.is_null() {
            GenerationParams::default()
        } else {
            serde_json::from_value(params).map_err(|e| TransportError::InvalidParams { action: action.to_string(), reason: e.to_string() })?
        };
        let generated = generate(&generation_params);
        self.world.replace_map(generated.graph, generated.buildings);
        self.emit(SignalMessage::new("map.created", json!({})));
        Ok(())
    }

    fn handle_map_export(&mut self) -> TransportResult<()> {
        let doc = export_map(&self.world.graph, &self.world.buildings);
        let data = serde_json::to_value(&doc).map_err(|e| TransportError::SaveLoad(e.to_string()))?;
        self.emit(SignalMessage::new("map.exported", data));
        Ok(())
    }

    fn handle_map_import(&mut self, action: &str, params: Value) -> TransportResult<()> {
        #[derive(Deserialize)]
        struct Params {
            map: dt_world::save::MapDocument,
        }
        let parsed: Params = parse_params(action, params)?;
        let (graph, buildings) = import_map(&parsed.map)?;
        self.world.replace_map(graph, buildings);
        self.emit(SignalMessage::new("map.imported", json!({})));
        Ok(())
    }

    fn handle_state_request(&mut self) -> TransportResult<()> {
        self.emit_snapshot()
    }

    /// `state.snapshot_start`, one `state.full_map_data`, one
    /// `state.full_agent_data` *per agent*, `state.snapshot_end` — the
    /// shared full-snapshot sequence `simulation.start` and `state.request`
    /// both emit.
    fn emit_snapshot(&mut self) -> TransportResult<()> {
        self.emit(SignalMessage::new("state.snapshot_start", json!({})));

        let map = export_map(&self.world.graph, &self.world.buildings);
        let map_data = serde_json::to_value(&map).map_err(|e| TransportError::SaveLoad(e.to_string()))?;
        self.emit(SignalMessage::new("state.full_map_data", map_data));

        for agent in self.world.agents.values() {
            let agent_data = serde_json::to_value(agent).map_err(|e| TransportError::SaveLoad(e.to_string()))?;
            self.emit(SignalMessage::new("state.full_agent_data", agent_data));
        }

        self.emit(SignalMessage::new("state.snapshot_end", json!({})));
        Ok(())
    }
}

fn default_max_speed_kph() -> f64 {
    90.0
}

fn default_capacity() -> u32 {
    20
}

fn default_tank_capacity_l() -> f64 {
    400.0
}

fn parse_params<T: for<'de> Deserialize<'de>>(action: &str, params: Value) -> TransportResult<T> {
    serde_json::from_value(params).map_err(|e| TransportError::InvalidParams { action: action.to_string(), reason: e.to_string() })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_core::{GeoPoint, SimConfig};
    use dt_spatial::RoadGraph;

    fn fixture() -> (SimulationController, Arc<SignalQueue>) {
        let config = SimConfig::default();
        let mut graph = RoadGraph::new();
        graph.add_node(GeoPoint::new(0.0, 0.0));
        let world = World::new(config.clone(), graph);
        let actions = Arc::new(ActionQueue::new(16));
        let signals = Arc::new(SignalQueue::new(16));
        (SimulationController::new(config, world, actions, signals.clone()), signals)
    }

    fn action(name: &str, params: Value) -> ActionMessage {
        ActionMessage { action: name.to_string(), params }
    }

    #[test]
    fn start_action_flips_running_and_emits_simulation_started() {
        let (mut controller, signals) = fixture();
        controller.dispatch(action("simulation.start", Value::Null));
        assert!(controller.running);
        let emitted = signals.drain();
        assert!(emitted.iter().any(|s| s.signal == "simulation.started"));
    }

    #[test]
    fn unknown_action_emits_a_single_error_signal() {
        let (mut controller, signals) = fixture();
        controller.dispatch(action("simulation.teleport", Value::Null));
        let emitted = signals.drain();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].signal, "error");
        assert_eq!(emitted[0].data["code"], "unknown_action");
    }

    #[test]
    fn agent_create_then_describe_round_trips_through_the_world() {
        let (mut controller, signals) = fixture();
        controller.dispatch(action(
            "agent.create",
            json!({ "id": "truck-1", "at": 0, "max_speed_kph": 80.0, "capacity": 10, "tank_capacity_l": 300.0 }),
        ));
        assert!(controller.world.agents.contains(&AgentId::new("truck-1")));

        controller.dispatch(action("agent.describe", json!({ "id": "truck-1" })));
        let emitted = signals.drain();
        assert!(emitted.iter().any(|s| s.signal == "agent.described"));
    }

    #[test]
    fn agent_create_rejects_a_duplicate_id() {
        let (mut controller, signals) = fixture();
        let create = || action("agent.create", json!({ "id": "truck-1", "at": 0 }));
        controller.dispatch(create());
        controller.dispatch(create());
        let emitted = signals.drain();
        assert!(emitted.iter().any(|s| s.signal == "error"));
    }

    #[test]
    fn invalid_params_report_a_stable_error_code() {
        let (mut controller, signals) = fixture();
        controller.dispatch(action("tick_rate.update", json!({ "tick_rate": "not a number" })));
        let emitted = signals.drain();
        assert_eq!(emitted[0].data["code"], "invalid_params");
    }
}
