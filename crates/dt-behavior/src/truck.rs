//! The truck's nine-step priority decision ladder.
//!
//! `decide` runs exactly one of the numbered steps' worth of work per tick —
//! whichever is highest-priority and applicable — except for the final
//! movement step, which always runs (advancing the edge or handling an
//! arrival) once the higher-priority state machines have had their say.

use std::collections::HashSet;

use dt_core::BuildingKind;
use dt_agent::{DeliveryTask, Occupiable, TaskStatus, TaskType, Truck};
use dt_mobility::{advance_edge, current_speed_kph as mobility_current_speed_kph, start_leg, EdgeOutcome, BASE_TRUCK_WEIGHT_TONNES};
use dt_spatial::{estimate_travel_time_h, find_closest_node_on_route, find_route, BuildingTypeCriteria};

use crate::context::TruckContext;
use crate::error::BehaviorResult;
use crate::msg::{self, DeliveryConfirmedBody, PackageRefBody, ProposalBody};

/// Liters pumped into a tank per simulated second of fueling.
pub const FUEL_PUMP_RATE_L_PER_S: f64 = 10.0;
/// Loading/unloading throughput, in tonnes of cargo handled per minute.
pub const LOADING_RATE_TONNES_PER_MIN: f64 = 0.5;
/// How far over the tachograph hard cap a new commitment may push a truck
/// before the proposal is rejected for lack of room to insert a rest.
const TACHOGRAPH_MARGIN_S: f64 = 3600.0;

fn hours_to_ticks(hours: f64, dt_s: f64) -> u64 {
    ((hours * 3600.0) / dt_s).ceil().max(0.0) as u64
}

fn task_weight_tonnes(task: &DeliveryTask, packages: &dt_agent::PackageStore) -> f64 {
    task.package_ids.iter().filter_map(|id| packages.get(id)).map(|p| p.size as f64 * 0.1).sum()
}

fn handling_duration_s(weight_tonnes: f64) -> f64 {
    (weight_tonnes / LOADING_RATE_TONNES_PER_MIN) * 60.0
}

/// Drive one tick's worth of the truck state machine.
pub fn decide(truck: &mut Truck, msgs: &mut dt_core::MsgQueue, ctx: &mut TruckContext) -> BehaviorResult<()> {
    if step_fueling(truck, ctx)? {
        return Ok(());
    }
    if step_resting(truck, ctx) {
        return Ok(());
    }
    if step_loading_unloading(truck, msgs, ctx)? {
        return Ok(());
    }

    process_inbox(truck, msgs, ctx)?;
    check_tachograph_fine(truck, ctx);
    maybe_seek_gas_station(truck, ctx);
    maybe_seek_rest(truck, ctx);

    advance_or_arrive(truck, ctx)?;
    Ok(())
}

// ── Step 1: fueling ──────────────────────────────────────────────────────────

fn step_fueling(truck: &mut Truck, ctx: &mut TruckContext) -> BehaviorResult<bool> {
    if !truck.fuel.is_fueling {
        return Ok(false);
    }
    truck.fuel.current_fuel_l = (truck.fuel.current_fuel_l + FUEL_PUMP_RATE_L_PER_S * ctx.dt_s).min(truck.fuel.tank_capacity_l);

    if truck.fuel.current_fuel_l + f64::EPSILON < truck.fuel.tank_capacity_l {
        return Ok(true);
    }

    let Some(building_id) = truck.current_building_id.clone() else { return Ok(true) };
    let liters = truck.fuel.fueling_liters_needed;
    if let Some(station) = ctx.buildings.get_mut(&building_id).and_then(|b| b.as_gas_station_mut()) {
        let price = station.effective_price_per_liter(ctx.global_fuel_price);
        let cost = station.record_sale(liters, price);
        truck.balance_ducats -= cost;
        station.leave(&truck.id);
        ctx.events.push(dt_core::SimEvent::FuelPurchased {
            truck_id: truck.id.clone(),
            gas_station_id: building_id,
            liters,
            cost,
            tick: ctx.tick,
        });
    }

    truck.current_building_id = None;
    truck.fuel.is_fueling = false;
    truck.fuel.fueling_liters_needed = 0.0;
    truck.flags.clear_seeking();

    if let Some(dest) = truck.original_destination.take() {
        plan_route(truck, ctx.graph, dest);
    }
    Ok(true)
}

// ── Step 2: resting ──────────────────────────────────────────────────────────

fn step_resting(truck: &mut Truck, ctx: &mut TruckContext) -> bool {
    if !truck.tachograph.is_resting {
        return false;
    }
    truck.tachograph.resting_time_s += ctx.dt_s;
    if truck.tachograph.resting_time_s < truck.tachograph.required_rest_s {
        return true;
    }

    truck.tachograph.end_rest();
    truck.flags.clear_seeking();
    let bump: f64 = ctx.rng.gen_range(1.005..=1.01);
    truck.tachograph.risk_factor = (truck.tachograph.risk_factor * bump).clamp(0.0, 1.0);
    ctx.events.push(dt_core::SimEvent::RestEnded { truck_id: truck.id.clone(), tick: ctx.tick });

    if let Some(building_id) = truck.current_building_id.take() {
        if let Some(parking) = ctx.buildings.get_mut(&building_id).and_then(|b| b.as_parking_mut()) {
            parking.leave(&truck.id);
        }
    }
    if let Some(dest) = truck.original_destination.take() {
        plan_route(truck, ctx.graph, dest);
    }
    true
}

// ── Step 3: loading / unloading ──────────────────────────────────────────────

fn step_loading_unloading(truck: &mut Truck, msgs: &mut dt_core::MsgQueue, ctx: &mut TruckContext) -> BehaviorResult<bool> {
    if !truck.flags.is_loading && !truck.flags.is_unloading {
        return Ok(false);
    }
    truck.loading_progress_s += ctx.dt_s;
    if truck.loading_progress_s < truck.loading_target_s {
        return Ok(true);
    }

    let is_loading = truck.flags.is_loading;
    truck.flags.is_loading = false;
    truck.flags.is_unloading = false;
    truck.loading_progress_s = 0.0;
    truck.loading_target_s = 0.0;

    let Some(task) = truck.delivery_queue.first().cloned() else { return Ok(true) };
    if is_loading {
        for package_id in &task.package_ids {
            let size = ctx.packages.get(package_id).map(|p| p.size).unwrap_or(0);
            let sizes = |id: &_| ctx.packages.get(id).map(|p| p.size).unwrap_or(0);
            truck.load_package(package_id.clone(), size, sizes)?;
            if let Some(package) = ctx.packages.get_mut(package_id) {
                package.mark_in_transit();
            }
            if let Some(site) = ctx.buildings.get_mut(&task.site_id.as_building_id()).and_then(|b| b.as_site_mut()) {
                site.active_packages.retain(|p| p != package_id);
                site.stats.packages_picked_up += 1;
            }
            ctx.events.push(dt_core::SimEvent::PackagePickedUp { package_id: package_id.clone(), truck_id: truck.id.clone(), tick: ctx.tick });
            ctx.events.push(dt_core::SimEvent::SiteStatsUpdate { site_id: task.site_id.clone(), tick: ctx.tick });
            let body = serde_json::to_value(PackageRefBody { package_id: package_id.clone() }).unwrap_or_default();
            msgs.send(dt_core::Msg::to(truck.id.clone(), ctx.broker_id.clone(), msg::MSG_PICKUP_CONFIRMED, body));
        }
        truck.delivery_queue.retain(|t| !(t.site_id == task.site_id && t.task_type == TaskType::Pickup && t.status == TaskStatus::InProgress));
        return Ok(true);
    }

    for package_id in &task.package_ids {
        truck.unload_package(package_id)?;
        let on_time = if let Some(package) = ctx.packages.get_mut(package_id) {
            let on_time = ctx.tick <= package.delivery_deadline_tick;
            package.mark_delivered();
            on_time
        } else {
            true
        };
        let payment = ctx.packages.get(package_id).map(|p| if on_time { p.value_currency } else { p.late_discounted_payment(ctx.tick) }).unwrap_or(0.0);
        if let Some(site) = ctx.buildings.get_mut(&task.site_id.as_building_id()).and_then(|b| b.as_site_mut()) {
            site.stats.total_value_delivered += payment;
            site.stats.packages_delivered += 1;
        }
        let body = serde_json::to_value(DeliveryConfirmedBody { package_id: package_id.clone(), on_time, delivery_tick: ctx.tick, payment }).unwrap_or_default();
        msgs.send(dt_core::Msg::to(truck.id.clone(), ctx.broker_id.clone(), msg::MSG_DELIVERY_CONFIRMED, body));
        ctx.events.push(dt_core::SimEvent::PackageDelivered { package_id: package_id.clone(), truck_id: truck.id.clone(), on_time, payment, tick: ctx.tick });
        ctx.events.push(dt_core::SimEvent::SiteStatsUpdate { site_id: task.site_id.clone(), tick: ctx.tick });
        ctx.packages.remove(package_id);
    }
    truck.delivery_queue.retain(|t| !(t.site_id == task.site_id && t.task_type == TaskType::Delivery && t.status == TaskStatus::InProgress));
    Ok(true)
}

// ── Step 4: broker inbox ─────────────────────────────────────────────────────

fn process_inbox(truck: &mut Truck, msgs: &mut dt_core::MsgQueue, ctx: &mut TruckContext) -> BehaviorResult<()> {
    let mut had_new_work = false;
    for incoming in msgs.drain_inbox() {
        match incoming.msg_type.as_str() {
            msg::MSG_PROPOSAL => {
                if let Some(proposal) = msg::parse_body::<ProposalBody>(&incoming.body) {
                    let accept = evaluate_proposal(truck, &proposal, ctx);
                    let reply_type = if accept { msg::MSG_ACCEPT } else { msg::MSG_REJECT };
                    let body = serde_json::to_value(PackageRefBody { package_id: proposal.package_id.clone() }).unwrap_or_default();
                    msgs.send(dt_core::Msg::to(truck.id.clone(), incoming.src.clone(), reply_type, body));
                }
            }
            msg::MSG_ASSIGNMENT_CONFIRMED => {
                if let Some(body) = msg::parse_body::<ProposalBody>(&incoming.body) {
                    truck.enqueue_task(body.origin_site.clone(), TaskType::Pickup, body.package_id.clone());
                    truck.enqueue_task(body.destination_site, TaskType::Delivery, body.package_id);
                    had_new_work = true;
                }
            }
            _ => {}
        }
    }

    if had_new_work && (truck.flags.is_seeking_idle_parking || truck.current_building_id.is_some()) {
        if let Some(building_id) = truck.current_building_id.take() {
            if let Some(parking) = ctx.buildings.get_mut(&building_id).and_then(|b| b.as_parking_mut()) {
                parking.leave(&truck.id);
            }
        }
        truck.flags.clear_seeking();
    }
    Ok(())
}

/// Proposal-acceptance test.
fn evaluate_proposal(truck: &Truck, proposal: &ProposalBody, ctx: &TruckContext) -> bool {
    let loaded_size: u32 = truck.loaded_packages.iter().filter_map(|id| ctx.packages.get(id)).map(|p| p.size).sum();
    if loaded_size + proposal.size > truck.capacity {
        return false;
    }

    let anchor = match truck.position {
        dt_agent::Position::AtNode(n) => n,
        dt_agent::Position::OnEdge { edge, .. } => match ctx.graph.edge(edge) {
            Some(e) => e.to,
            None => return false,
        },
    };

    let mut elapsed_h = 0.0_f64;
    let mut driving_h = 0.0_f64;
    let mut cursor = anchor;
    for task in truck.delivery_queue.iter().filter(|t| t.status != TaskStatus::Completed) {
        let Some(site_node) = ctx.graph.building_node(&task.site_id.as_building_id()) else { continue };
        let travel = estimate_travel_time_h(ctx.graph, cursor, site_node, truck.max_speed_kph);
        elapsed_h += travel;
        driving_h += travel;
        elapsed_h += handling_duration_s(task_weight_tonnes(task, ctx.packages)) / 3600.0;
        cursor = site_node;
    }

    let travel_to_origin = estimate_travel_time_h(ctx.graph, cursor, proposal.origin_node, truck.max_speed_kph);
    if travel_to_origin.is_infinite() {
        return false;
    }
    elapsed_h += travel_to_origin;
    driving_h += travel_to_origin;
    let pickup_tick_est = ctx.tick.offset(hours_to_ticks(elapsed_h, ctx.dt_s));
    if pickup_tick_est > proposal.pickup_deadline_tick {
        return false;
    }

    elapsed_h += handling_duration_s(proposal.size as f64 * 0.1) / 3600.0;
    let travel_to_dest = estimate_travel_time_h(ctx.graph, proposal.origin_node, proposal.destination_node, truck.max_speed_kph);
    if travel_to_dest.is_infinite() {
        return false;
    }
    elapsed_h += travel_to_dest;
    driving_h += travel_to_dest;
    let delivery_tick_est = ctx.tick.offset(hours_to_ticks(elapsed_h, ctx.dt_s));
    if delivery_tick_est > proposal.delivery_deadline_tick {
        return false;
    }

    let projected_driving_s = truck.tachograph.driving_time_s + driving_h * 3600.0;
    if projected_driving_s > dt_agent::Tachograph::HARD_CAP_S + TACHOGRAPH_MARGIN_S {
        return false;
    }

    true
}

// ── Step 5: tachograph fine ──────────────────────────────────────────────────

fn check_tachograph_fine(truck: &mut Truck, ctx: &mut TruckContext) {
    if truck.tachograph.driving_time_s <= dt_agent::Tachograph::HARD_CAP_S {
        return;
    }
    let over_hours = (truck.tachograph.driving_time_s - dt_agent::Tachograph::HARD_CAP_S) / 3600.0;
    let fine = if over_hours <= 1.0 {
        100.0
    } else if over_hours <= 2.0 {
        200.0
    } else {
        500.0
    };
    truck.balance_ducats -= fine;
    let penalty: f64 = ctx.rng.gen_range(0.99..=0.995);
    truck.tachograph.risk_factor = (truck.tachograph.risk_factor * penalty).clamp(0.0, 1.0);
    ctx.events.push(dt_core::SimEvent::TachographFine { truck_id: truck.id.clone(), amount: fine, over_hours, tick: ctx.tick });
}

// ── Step 6: gas-seek probability ─────────────────────────────────────────────

/// Find a building of `kind` to divert to: a waypoint-aware search against
/// the truck's current destination when it has one (minimizing total
/// detour cost), falling back to a plain closest-node search when idle.
fn find_diversion(truck: &Truck, anchor: dt_core::NodeId, kind: BuildingKind, ctx: &TruckContext) -> Option<(dt_core::NodeId, Vec<dt_core::NodeId>)> {
    let criteria = BuildingTypeCriteria::new(kind);
    if let Some(dest) = truck.destination {
        if dest != anchor {
            if let Some(found) = find_closest_node_on_route(ctx.graph, anchor, dest, &criteria, truck.max_speed_kph) {
                return Some((found.waypoint, found.path_to_waypoint.nodes));
            }
        }
    }
    let found = dt_spatial::find_route_to_building(ctx.graph, ctx.cache, anchor, kind, HashSet::new(), truck.max_speed_kph)?;
    Some((found.node, find_route(ctx.graph, anchor, found.node, truck.max_speed_kph).nodes))
}

fn maybe_seek_gas_station(truck: &mut Truck, ctx: &mut TruckContext) {
    if truck.flags.is_seeking_gas_station || truck.fuel.is_fueling {
        return;
    }
    let threshold = (0.30 - 0.15 * truck.tachograph.risk_factor).max(0.10);
    let fuel_frac = truck.fuel.fraction();
    if fuel_frac >= threshold {
        return;
    }
    let seek = fuel_frac < 0.10 || ctx.rng.gen_bool(((threshold - fuel_frac) / (threshold - 0.10)).clamp(0.0, 1.0));
    if !seek {
        return;
    }
    let Some(anchor) = truck.current_node() else { return };
    let Some((waypoint, path)) = find_diversion(truck, anchor, BuildingKind::GasStation, ctx) else { return };

    truck.flags.clear_seeking();
    truck.flags.is_seeking_gas_station = true;
    truck.original_destination = truck.destination.or(truck.original_destination);
    truck.route = path.into_iter().skip(1).collect();
    truck.destination = Some(waypoint);
    truck.route_start_node = Some(anchor);
    truck.route_end_node = Some(waypoint);
}

// ── Step 7: parking-seek probability ─────────────────────────────────────────

fn maybe_seek_rest(truck: &mut Truck, ctx: &mut TruckContext) {
    if truck.flags.is_seeking_parking || truck.tachograph.is_resting {
        return;
    }
    let hours_driven = truck.tachograph.driving_time_s / 3600.0;
    let start_threshold = 7.0 + truck.tachograph.risk_factor;
    if hours_driven < start_threshold {
        return;
    }
    let denom = (8.0 - start_threshold).max(f64::EPSILON);
    let probability = ((hours_driven - start_threshold) / denom).clamp(0.0, 1.0);
    if !ctx.rng.gen_bool(probability) {
        return;
    }
    let Some(anchor) = truck.current_node() else { return };
    let Some(found) = dt_spatial::find_route_to_building(ctx.graph, ctx.cache, anchor, BuildingKind::Parking, HashSet::new(), truck.max_speed_kph) else { return };

    truck.flags.clear_seeking();
    truck.flags.is_seeking_parking = true;
    truck.original_destination = truck.destination.or(truck.original_destination);
    truck.route = find_route(ctx.graph, anchor, found.node, truck.max_speed_kph).nodes.into_iter().skip(1).collect();
    truck.destination = Some(found.node);
    truck.route_start_node = Some(anchor);
    truck.route_end_node = Some(found.node);
}

// ── Steps 8-9: movement and arrival ──────────────────────────────────────────

fn advance_or_arrive(truck: &mut Truck, ctx: &mut TruckContext) -> BehaviorResult<()> {
    match truck.position {
        dt_agent::Position::AtNode(node) => handle_node(truck, node, ctx),
        dt_agent::Position::OnEdge { .. } => {
            let cargo_weight = BASE_TRUCK_WEIGHT_TONNES + truck.loaded_packages.iter().filter_map(|id| ctx.packages.get(id)).map(|p| p.size as f64 * 0.1).sum::<f64>();
            match advance_edge(truck, ctx.graph, ctx.dt_s, cargo_weight)? {
                EdgeOutcome::Stranded => {
                    ctx.events.push(dt_core::SimEvent::OutOfFuel { truck_id: truck.id.clone(), tick: ctx.tick });
                }
                EdgeOutcome::Moving => {}
                EdgeOutcome::Arrived { node, .. } => handle_node(truck, node, ctx)?,
            }
            Ok(())
        }
    }
}

/// A truck freshly at `node`, whether it started the tick there or just
/// arrived: try to enter whatever building it's here for, else pass through
/// onto the next edge immediately rather than idling a tick.
fn handle_node(truck: &mut Truck, node: dt_core::NodeId, ctx: &mut TruckContext) -> BehaviorResult<()> {
    if truck.flags.is_seeking_gas_station {
        if let Some(building_id) = ctx.graph.node(node).and_then(|n| n.buildings_of(BuildingKind::GasStation).first().cloned()) {
            if let Some(station) = ctx.buildings.get_mut(&building_id).and_then(|b| b.as_gas_station_mut()) {
                if station.enter(truck.id.clone()) {
                    truck.current_building_id = Some(building_id);
                    truck.flags.is_seeking_gas_station = false;
                    truck.fuel.is_fueling = true;
                    truck.fuel.fueling_liters_needed = truck.fuel.tank_capacity_l - truck.fuel.current_fuel_l;
                    return Ok(());
                }
                return Ok(()); // full: wait here rather than seek an alternative
            }
        }
    }

    if truck.flags.is_seeking_parking || truck.flags.is_seeking_idle_parking {
        if let Some(building_id) = ctx.graph.node(node).and_then(|n| n.buildings_of(BuildingKind::Parking).first().cloned()) {
            let entered = ctx.buildings.get_mut(&building_id).and_then(|b| b.as_parking_mut()).map(|p| p.enter(truck.id.clone())).unwrap_or(false);
            if entered {
                truck.current_building_id = Some(building_id);
                if truck.flags.is_seeking_parking {
                    truck.flags.is_seeking_parking = false;
                    truck.tachograph.begin_rest();
                    ctx.events.push(dt_core::SimEvent::RestStarted { truck_id: truck.id.clone(), required_rest_s: truck.tachograph.required_rest_s, tick: ctx.tick });
                } else {
                    truck.flags.is_seeking_idle_parking = false;
                }
                return Ok(());
            }
            // full: try the next-closest candidate, excluding this one.
            let mut exclude = HashSet::new();
            exclude.insert(building_id);
            if let Some(found) = dt_spatial::find_route_to_building(ctx.graph, ctx.cache, node, BuildingKind::Parking, exclude, truck.max_speed_kph) {
                truck.route = find_route(ctx.graph, node, found.node, truck.max_speed_kph).nodes.into_iter().skip(1).collect();
                truck.destination = Some(found.node);
                truck.route_end_node = Some(found.node);
                start_leg(truck, ctx.graph)?;
            }
            return Ok(());
        }
    }

    let not_seeking = !truck.flags.is_seeking_gas_station && !truck.flags.is_seeking_parking && !truck.flags.is_seeking_idle_parking;
    if let Some(task) = truck.delivery_queue.first().cloned() {
        let site_node = ctx.graph.building_node(&task.site_id.as_building_id());
        let at_task_site = site_node == Some(node) && task.status == TaskStatus::Pending;
        if at_task_site {
            let weight = task_weight_tonnes(&task, ctx.packages);
            truck.loading_progress_s = 0.0;
            truck.loading_target_s = handling_duration_s(weight);
            if let Some(t) = truck.delivery_queue.first_mut() {
                t.status = TaskStatus::InProgress;
            }
            match task.task_type {
                TaskType::Pickup => truck.flags.is_loading = true,
                TaskType::Delivery => truck.flags.is_unloading = true,
            }
            return Ok(());
        }

        // Not there yet and not already mid-diversion: head for the current
        // task's site. A truck with committed work never just idles at a
        // node waiting for a route that was never planned.
        if not_seeking && truck.route.is_empty() {
            if let Some(site_node) = site_node {
                if truck.destination != Some(site_node) {
                    plan_route(truck, ctx.graph, site_node);
                }
            }
        }
    }

    if !truck.route.is_empty() {
        start_leg(truck, ctx.graph)?;
        return Ok(());
    }

    if truck.delivery_queue.is_empty() && !truck.flags.is_seeking_idle_parking && truck.current_building_id.is_none() {
        if let Some(found) = dt_spatial::find_route_to_building(ctx.graph, ctx.cache, node, BuildingKind::Parking, HashSet::new(), truck.max_speed_kph) {
            truck.flags.is_seeking_idle_parking = true;
            truck.route = find_route(ctx.graph, node, found.node, truck.max_speed_kph).nodes.into_iter().skip(1).collect();
            truck.destination = Some(found.node);
            start_leg(truck, ctx.graph)?;
        }
    }
    Ok(())
}

fn plan_route(truck: &mut Truck, graph: &dt_spatial::RoadGraph, dest: dt_core::NodeId) {
    let Some(from) = truck.current_node() else { return };
    let path = find_route(graph, from, dest, truck.max_speed_kph);
    truck.route = path.nodes.into_iter().skip(1).collect();
    truck.destination = Some(dest);
    truck.route_start_node = Some(from);
    truck.route_end_node = Some(dest);
}

pub fn current_speed_kph(truck: &Truck, graph: &dt_spatial::RoadGraph) -> f64 {
    mobility_current_speed_kph(truck, graph)
}
