//! `World` — the per-tick orchestration loop.
//!
//! Owns every piece of simulation state (`RoadGraph`, the three entity
//! stores, the clock, the fuel market, per-agent RNGs) and exposes exactly
//! one way to advance it: [`World::step`]. Everything else is either setup
//! (`new`, `add_truck`, `add_building`, ...) run between ticks, or the
//! read-only accessors the transport layer serializes for clients.

use rustc_hash::FxHashMap;
use serde_json::Value;

use dt_agent::{Agent, AgentBody, AgentStore, Broker, Building, BuildingStore, Package, PackageStatus, PackageStore, Truck};
use dt_behavior::{broker as broker_behavior, truck as truck_behavior, BrokerContext, TruckContext};
use dt_core::{AgentId, AgentKind, AgentRng, BuildingId, NodeId, SimClock, SimConfig, SimEvent, SimRng, SiteId, TickData};
use dt_spatial::{RoadGraph, RouteCache};

use crate::diff::{truck_watch_snapshot, AgentDiff, BuildingUpdate};
use crate::error::WorldResult;

/// Seed offset separating the fuel market's RNG stream from per-agent ones;
/// an arbitrary constant, not a magic tuning value.
const MARKET_RNG_OFFSET: u64 = 0x4655_454c; // "FUEL" as bytes, reversed-endian ascii

fn synthetic_site_agent_id(site_id: &SiteId) -> AgentId {
    AgentId::new(format!("site:{}", site_id.as_str()))
}

/// Everything produced by one [`World::step`] call: the tick's timestamp,
/// its domain events, and the agents/buildings whose watched state changed.
#[derive(Clone, Debug)]
pub struct TickReport {
    pub tick_data: TickData,
    pub events: Vec<SimEvent>,
    pub agent_diffs: Vec<AgentDiff>,
    pub building_updates: Vec<BuildingUpdate>,
}

pub struct World {
    pub clock: SimClock,
    pub graph: RoadGraph,
    pub agents: AgentStore,
    pub buildings: BuildingStore,
    pub packages: PackageStore,
    pub broker_id: AgentId,
    pub global_fuel_price: f64,
    pub fuel_price_volatility: f64,

    pub(crate) seed: u64,
    pub(crate) last_fuel_price_day: u64,
    market_rng: SimRng,
    pub(crate) agent_rngs: FxHashMap<AgentId, AgentRng>,
    site_rngs: FxHashMap<SiteId, AgentRng>,
    route_cache: RouteCache,
    pending_events: Vec<SimEvent>,
    next_seq: u64,

    last_truck_watch: FxHashMap<AgentId, Value>,
    last_broker_state: FxHashMap<AgentId, Value>,
    last_building_state: FxHashMap<BuildingId, Value>,
}

impl World {
    /// A fresh world over `graph`, with a single broker agent already seated
    /// (every simulation has exactly one).
    pub fn new(config: SimConfig, graph: RoadGraph) -> Self {
        let broker_id = AgentId::new("broker");
        let mut agents = AgentStore::new();
        let mut agent_rngs = FxHashMap::default();
        agent_rngs.insert(broker_id.clone(), AgentRng::new(config.seed, &broker_id));
        agents.insert(Agent::new_broker(Broker::new(broker_id.clone())));

        let clock = config.make_clock();
        let last_fuel_price_day = clock.tick_data().day;
        let mut root_rng = SimRng::new(config.seed);
        let market_rng = root_rng.child(MARKET_RNG_OFFSET);

        Self {
            clock,
            graph,
            agents,
            buildings: BuildingStore::new(),
            packages: PackageStore::new(),
            broker_id,
            global_fuel_price: config.initial_fuel_price,
            fuel_price_volatility: config.fuel_price_volatility,
            seed: config.seed,
            last_fuel_price_day,
            market_rng,
            agent_rngs,
            site_rngs: FxHashMap::default(),
            route_cache: RouteCache::new(),
            pending_events: Vec::new(),
            next_seq: 0,
            last_truck_watch: FxHashMap::default(),
            last_broker_state: FxHashMap::default(),
            last_building_state: FxHashMap::default(),
        }
    }

    fn next_package_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    // ── Admin mutators (never called mid-tick) ──────────────────────────────

    pub fn add_truck(&mut self, truck: Truck) -> WorldResult<()> {
        let id = truck.id.clone();
        if self.agents.contains(&id) {
            return Err(crate::error::WorldError::DuplicateAgent(id));
        }
        self.agent_rngs.insert(id.clone(), AgentRng::new(self.seed, &id));
        self.agents.insert(Agent::new_truck(truck));
        Ok(())
    }

    pub fn remove_agent(&mut self, id: &AgentId) -> Option<Agent> {
        self.agent_rngs.remove(id);
        self.last_truck_watch.remove(id);
        self.last_broker_state.remove(id);
        self.agents.remove(id)
    }

    pub fn add_building(&mut self, node: NodeId, building: Building) -> WorldResult<()> {
        let id = building.id();
        let kind = building.kind();
        self.graph.attach_building(node, kind, id.clone())?;
        self.buildings.insert(building);
        self.pending_events.push(SimEvent::BuildingCreated { building_id: id, tick: self.clock.current_tick });
        Ok(())
    }

    pub fn remove_building(&mut self, id: &BuildingId) -> Option<Building> {
        self.graph.detach_building(id);
        self.last_building_state.remove(id);
        self.buildings.remove(id)
    }

    /// Swap in a freshly generated or imported graph/building set (the
    /// `map.create`/`map.import` actions). Only ever called between runs,
    /// same as the graph's own lifecycle invariant — agents are left as-is,
    /// so callers doing this mid-run are responsible for also clearing or
    /// relocating any agent whose position references the old graph.
    pub fn replace_map(&mut self, graph: RoadGraph, buildings: BuildingStore) {
        self.graph = graph;
        self.buildings = buildings;
        self.route_cache = RouteCache::new();
        self.last_building_state.clear();
    }

    // ── The tick loop ────────────────────────────────────────────────

    pub fn step(&mut self) -> WorldResult<TickReport> {
        self.clock.advance();
        self.update_fuel_price();
        self.perceive_phase();
        self.deliver_messages();
        self.spawn_and_expire_packages();
        self.decide_phase()?;

        let agent_diffs = self.collect_agent_diffs();
        let building_updates = self.collect_building_updates();
        let events = std::mem::take(&mut self.pending_events);

        Ok(TickReport { tick_data: self.clock.tick_data(), events, agent_diffs, building_updates })
    }

    /// Once-per-simulated-day bounded multiplicative random walk: `price *=
    /// 1 + U(-volatility, +volatility)`, floored well above zero.
    fn update_fuel_price(&mut self) {
        let day = self.clock.tick_data().day;
        if day == self.last_fuel_price_day {
            return;
        }
        self.last_fuel_price_day = day;
        let delta = self.market_rng.gen_range(-self.fuel_price_volatility..=self.fuel_price_volatility);
        self.global_fuel_price = (self.global_fuel_price * (1.0 + delta)).max(0.01);
    }

    /// Let every agent perceive the world before anything else this tick
    /// touches it. Only the broker has perceive behavior defined
    /// (scanning for newly-`WAITING_PICKUP` packages) — trucks act purely
    /// off their inbox and position, so this is a no-op for them.
    fn perceive_phase(&mut self) {
        let Some(mut broker_agent) = self.agents.remove(&self.broker_id) else { return };
        if let Some(broker) = broker_agent.body.as_broker_mut() {
            let ctx = BrokerContext {
                graph: &self.graph,
                trucks: &self.agents,
                buildings: &mut self.buildings,
                packages: &mut self.packages,
                tick: self.clock.current_tick,
                dt_s: self.clock.dt_s,
                events: &mut self.pending_events,
            };
            broker_behavior::perceive(broker, &ctx);
        }
        self.agents.insert(broker_agent);
    }

    /// Move every agent's outbox into its recipients' inboxes. Two passes —
    /// drain everything first, then route — so a message sent by agent A
    /// this tick can never land in agent B's inbox before B's own outbox has
    /// been drained (order-independent delivery regardless of iteration order).
    fn deliver_messages(&mut self) {
        let ids: Vec<AgentId> = self.agents.ids().cloned().collect();
        let mut outgoing = Vec::new();
        for id in &ids {
            if let Some(agent) = self.agents.get_mut(id) {
                outgoing.append(&mut agent.msgs.outbox);
            }
        }
        for msg in outgoing {
            if let Some(dst) = msg.dst.clone() {
                if let Some(agent) = self.agents.get_mut(&dst) {
                    agent.msgs.inbox.push(msg);
                }
                continue;
            }
            if let Some(topic) = msg.topic.clone() {
                let subscribers: Vec<AgentId> =
                    self.agents.iter().filter(|(_, a)| a.topics().contains(&topic)).map(|(id, _)| id.clone()).collect();
                for sub in subscribers {
                    if let Some(agent) = self.agents.get_mut(&sub) {
                        agent.msgs.inbox.push(msg.clone());
                    }
                }
            }
        }
    }

    fn spawn_and_expire_packages(&mut self) {
        let site_ids: Vec<SiteId> = self.buildings.values().filter_map(|b| b.as_site().map(|s| s.id.clone())).collect();
        for site_id in &site_ids {
            self.spawn_for_site(site_id, &site_ids);
        }
        for site_id in &site_ids {
            self.expire_for_site(site_id);
        }
    }

    fn spawn_for_site(&mut self, site_id: &SiteId, all_sites: &[SiteId]) {
        let building_id = site_id.as_building_id();
        self.site_rngs.entry(site_id.clone()).or_insert_with(|| AgentRng::new(self.seed, &synthetic_site_agent_id(site_id)));

        let should_spawn = {
            let rng = self.site_rngs.get_mut(site_id).expect("seeded above");
            match self.buildings.get(&building_id).and_then(Building::as_site) {
                Some(site) => site.should_spawn_package(self.clock.dt_s, rng),
                None => false,
            }
        };
        if !should_spawn {
            return;
        }

        let (destination_site, params) = {
            let rng = self.site_rngs.get_mut(site_id).expect("seeded above");
            let Some(site) = self.buildings.get(&building_id).and_then(Building::as_site) else { return };
            let Some(destination_site) = site.select_destination(all_sites, rng) else { return };
            let params = site.generate_package_parameters(self.clock.current_tick, self.clock.dt_s, rng);
            (destination_site, params)
        };

        // A site with no node attachment yet (or whose chosen destination
        // has none) can't route a package — skip spawning rather than create
        // an undeliverable one. The RNG draws above still happened, which is
        // fine: determinism only requires the *sequence* be reproducible.
        if self.graph.building_node(&building_id).is_none() {
            return;
        }
        if self.graph.building_node(&destination_site.as_building_id()).is_none() {
            return;
        }

        let seq = self.next_package_seq();
        let package_id = dt_core::PackageId::new(format!("pkg-{seq}"));
        let package = Package {
            id: package_id.clone(),
            origin_site: site_id.clone(),
            destination_site,
            size: params.size,
            value_currency: params.value_currency,
            priority: params.priority,
            urgency: params.urgency,
            spawn_tick: self.clock.current_tick,
            pickup_deadline_tick: params.pickup_deadline_tick,
            delivery_deadline_tick: params.delivery_deadline_tick,
            status: PackageStatus::WaitingPickup,
        };
        self.packages.insert(package);
        if let Some(site) = self.buildings.get_mut(&building_id).and_then(Building::as_site_mut) {
            site.active_packages.push(package_id.clone());
            site.stats.packages_generated += 1;
        }
        self.pending_events.push(SimEvent::PackageCreated { package_id, site_id: site_id.clone(), tick: self.clock.current_tick });
        self.pending_events.push(SimEvent::SiteStatsUpdate { site_id: site_id.clone(), tick: self.clock.current_tick });
    }

    fn expire_for_site(&mut self, site_id: &SiteId) {
        let building_id = site_id.as_building_id();
        let tick = self.clock.current_tick;
        let expired: Vec<dt_core::PackageId> = match self.buildings.get(&building_id).and_then(Building::as_site) {
            Some(site) => site
                .active_packages
                .iter()
                .filter(|pid| {
                    self.packages.get(pid).is_some_and(|p| p.status == PackageStatus::WaitingPickup && tick >= p.pickup_deadline_tick)
                })
                .cloned()
                .collect(),
            None => return,
        };
        if expired.is_empty() {
            return;
        }

        for package_id in expired {
            let Some(package) = self.packages.remove(&package_id) else { continue };
            if let Some(site) = self.buildings.get_mut(&building_id).and_then(Building::as_site_mut) {
                site.active_packages.retain(|p| *p != package_id);
                site.stats.packages_expired += 1;
                site.stats.total_value_expired += package.value_currency;
            }
            self.pending_events.push(SimEvent::PackageExpired {
                package_id: package_id.clone(),
                site_id: site_id.clone(),
                value: package.value_currency,
                tick,
            });
            self.pending_events.push(SimEvent::SiteStatsUpdate { site_id: site_id.clone(), tick });
            if let Some(broker_agent) = self.agents.get_mut(&self.broker_id) {
                if let Some(broker) = broker_agent.body.as_broker_mut() {
                    broker_behavior::apply_pickup_expiry(broker, &package_id, package.value_currency, tick, &mut self.pending_events);
                }
            }
        }
    }

    /// Run every agent's `decide` step, in stable store order. Each agent is
    /// removed from `self.agents` for the duration of its own call — giving
    /// the broker's context a read-only view of every *other* agent (the
    /// only cross-agent access either ladder needs) without a second
    /// `&mut`/`&` split on the same store. `OrderedMap`'s free-list recycling
    /// means a single remove-then-reinsert within one tick always restores
    /// the agent to its original slot, so iteration order across ticks never
    /// drifts.
    fn decide_phase(&mut self) -> WorldResult<()> {
        let ids: Vec<AgentId> = self.agents.ids().cloned().collect();
        for id in ids {
            self.decide_agent(&id)?;
        }
        Ok(())
    }

    fn decide_agent(&mut self, id: &AgentId) -> WorldResult<()> {
        let Some(mut agent) = self.agents.remove(id) else { return Ok(()) };
        let msgs = &mut agent.msgs;

        let result = match &mut agent.body {
            AgentBody::Truck(truck) => {
                let rng = self.agent_rngs.get_mut(id).expect("truck rng seeded in add_truck");
                let mut ctx = TruckContext {
                    graph: &self.graph,
                    cache: &self.route_cache,
                    buildings: &mut self.buildings,
                    packages: &mut self.packages,
                    broker_id: &self.broker_id,
                    global_fuel_price: self.global_fuel_price,
                    tick: self.clock.current_tick,
                    dt_s: self.clock.dt_s,
                    rng,
                    events: &mut self.pending_events,
                };
                truck_behavior::decide(truck, msgs, &mut ctx)
            }
            AgentBody::Broker(broker) => {
                let mut ctx = BrokerContext {
                    graph: &self.graph,
                    trucks: &self.agents,
                    buildings: &mut self.buildings,
                    packages: &mut self.packages,
                    tick: self.clock.current_tick,
                    dt_s: self.clock.dt_s,
                    events: &mut self.pending_events,
                };
                broker_behavior::decide(broker, msgs, &mut ctx)
            }
        };

        self.agents.insert(agent);
        Ok(result?)
    }

    // ── Diff collection ────────────────────────────────────

    fn collect_agent_diffs(&mut self) -> Vec<AgentDiff> {
        let ids: Vec<AgentId> = self.agents.ids().cloned().collect();
        let mut diffs = Vec::new();
        for id in ids {
            let Some(agent) = self.agents.get(&id) else { continue };
            match &agent.body {
                AgentBody::Truck(truck) => {
                    let watch = truck_watch_snapshot(truck, &self.graph);
                    if self.last_truck_watch.get(&id) != Some(&watch) {
                        let state = serde_json::to_value(truck).unwrap_or(Value::Null);
                        diffs.push(AgentDiff { agent_id: id.clone(), kind: AgentKind::Truck, state });
                        self.last_truck_watch.insert(id, watch);
                    }
                }
                AgentBody::Broker(broker) => {
                    let state = serde_json::to_value(broker).unwrap_or(Value::Null);
                    if self.last_broker_state.get(&id) != Some(&state) {
                        diffs.push(AgentDiff { agent_id: id.clone(), kind: AgentKind::Broker, state: state.clone() });
                        self.last_broker_state.insert(id, state);
                    }
                }
            }
        }
        diffs
    }

    fn collect_building_updates(&mut self) -> Vec<BuildingUpdate> {
        let ids: Vec<BuildingId> = self.buildings.ids().cloned().collect();
        let mut updates = Vec::new();
        for id in ids {
            let Some(building) = self.buildings.get(&id) else { continue };
            let state = serde_json::to_value(building).unwrap_or(Value::Null);
            if self.last_building_state.get(&id) != Some(&state) {
                updates.push(BuildingUpdate { building_id: id.clone(), state: state.clone() });
                self.last_building_state.insert(id, state);
            }
        }
        updates
    }
}
