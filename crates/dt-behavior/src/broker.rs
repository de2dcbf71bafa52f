//! The broker's ordered decision steps and negotiation state machine.
//!
//! One package is negotiated at a time — `Broker::active_negotiation` is
//! `Option`, never a collection — which is what keeps a truck's `accept`
//! response always evaluated against the negotiation it was proposed under.

use dt_agent::{Broker, NegotiationStatus, PackageStatus, Position, Truck};
use dt_core::{AgentId, Msg, MsgQueue, NodeId, PackageId, SimEvent};
use dt_spatial::estimate_travel_time_h;

use crate::context::BrokerContext;
use crate::error::BehaviorResult;
use crate::msg::{self, DeliveryConfirmedBody, PackageRefBody, ProposalBody};

/// Drive one tick's worth of the broker state machine. Perceiving newly
/// spawned packages is a separate, earlier phase — see
/// [`perceive`] — run by the world before message delivery and site spawn,
/// not folded in here.
pub fn decide(broker: &mut Broker, msgs: &mut MsgQueue, ctx: &mut BrokerContext) -> BehaviorResult<()> {
    process_inbox(broker, msgs, ctx);

    match broker.active_negotiation.as_ref().map(|n| n.status) {
        Some(NegotiationStatus::Accepted) => finalize_negotiation(broker, msgs, ctx),
        Some(NegotiationStatus::Proposed) => {
            let exhausted = broker.active_negotiation.as_ref().is_some_and(|n| n.candidates_exhausted());
            if exhausted {
                requeue_exhausted(broker);
            } else {
                maybe_send_next_proposal(broker, msgs, ctx);
            }
        }
        // `reject` advances the candidate index rather than setting this
        // status directly (see `process_inbox`); a negotiation parked here
        // has nothing left to try.
        Some(NegotiationStatus::Rejected) => requeue_exhausted(broker),
        None => {
            if !broker.package_queue.is_empty() {
                start_new_negotiation(broker, msgs, ctx);
            }
        }
    }

    Ok(())
}

/// Scan for `WAITING_PICKUP` packages the broker hasn't seen yet: run once per tick, before messages are delivered and before sites
/// spawn/expire, so a package only ever becomes visible to the broker on the
/// tick *after* the one that spawned it.
pub fn perceive(broker: &mut Broker, ctx: &BrokerContext) {
    for package in ctx.packages.values() {
        if package.status == PackageStatus::WaitingPickup {
            broker.observe(package.id.clone());
        }
    }
}

fn process_inbox(broker: &mut Broker, msgs: &mut MsgQueue, ctx: &mut BrokerContext) {
    for incoming in msgs.drain_inbox() {
        match incoming.msg_type.as_str() {
            msg::MSG_ACCEPT => {
                if let Some(body) = msg::parse_body::<PackageRefBody>(&incoming.body) {
                    if let Some(neg) = &mut broker.active_negotiation {
                        if neg.package_id == body.package_id && neg.current_candidate() == Some(&incoming.src) {
                            neg.status = NegotiationStatus::Accepted;
                        }
                    }
                }
            }
            msg::MSG_REJECT => {
                if let Some(body) = msg::parse_body::<PackageRefBody>(&incoming.body) {
                    if let Some(neg) = &mut broker.active_negotiation {
                        if neg.package_id == body.package_id && neg.current_candidate() == Some(&incoming.src) {
                            neg.advance_candidate();
                        }
                    }
                }
            }
            msg::MSG_DELIVERY_CONFIRMED => {
                if let Some(body) = msg::parse_body::<DeliveryConfirmedBody>(&incoming.body) {
                    broker.balance_ducats += body.payment;
                    broker.assigned_packages.remove(&body.package_id);
                }
            }
            msg::MSG_PICKUP_CONFIRMED => {
                // Tracking only: the truck already emitted `PackagePickedUp`
                // and the broker keeps no separate pickup-side bookkeeping.
            }
            _ => {}
        }
    }
}

fn truck_anchor(truck: &Truck, ctx: &BrokerContext) -> Option<NodeId> {
    match truck.position {
        Position::AtNode(n) => Some(n),
        Position::OnEdge { edge, .. } => ctx.graph.edge(edge).map(|e| e.to),
    }
}

/// Rank eligible trucks by ascending travel time to `origin_node`. Excludes
/// only fueling/resting trucks and trucks whose position can't be resolved
/// to a node — a mid-load/unload truck remains a valid candidate.
fn rank_candidates(ctx: &BrokerContext, origin_node: NodeId) -> Vec<AgentId> {
    let mut ranked: Vec<(f64, AgentId)> = ctx
        .trucks
        .values()
        .filter_map(|agent| {
            let truck = agent.body.as_truck()?;
            if truck.fuel.is_fueling || truck.tachograph.is_resting {
                return None;
            }
            let anchor = truck_anchor(truck, ctx)?;
            let travel = estimate_travel_time_h(ctx.graph, anchor, origin_node, truck.max_speed_kph);
            if travel.is_infinite() {
                return None;
            }
            Some((travel, agent.id.clone()))
        })
        .collect();
    ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(_, id)| id).collect()
}

fn proposal_body(ctx: &BrokerContext, package_id: &PackageId) -> Option<ProposalBody> {
    let package = ctx.packages.get(package_id)?;
    let origin_node = ctx.graph.building_node(&package.origin_site.as_building_id())?;
    let destination_node = ctx.graph.building_node(&package.destination_site.as_building_id())?;
    Some(ProposalBody {
        package_id: package_id.clone(),
        origin_site: package.origin_site.clone(),
        destination_site: package.destination_site.clone(),
        origin_node,
        destination_node,
        size: package.size,
        pickup_deadline_tick: package.pickup_deadline_tick,
        delivery_deadline_tick: package.delivery_deadline_tick,
    })
}

/// Pop one package off the queue this tick; skip it (silently, without
/// touching `active_negotiation`) if it's stale, otherwise rank candidates
/// and either start a negotiation or requeue for a later tick.
fn start_new_negotiation(broker: &mut Broker, msgs: &mut MsgQueue, ctx: &mut BrokerContext) {
    let Some(package_id) = broker.package_queue.pop_front() else { return };

    let still_waiting = ctx.packages.get(&package_id).map(|p| p.status == PackageStatus::WaitingPickup).unwrap_or(false);
    if !still_waiting {
        broker.known_packages.remove(&package_id);
        return;
    }

    let Some(body) = proposal_body(ctx, &package_id) else {
        // Origin/destination not attached to the graph yet: try again later.
        broker.package_queue.push_back(package_id);
        return;
    };

    let candidates = rank_candidates(ctx, body.origin_node);
    if candidates.is_empty() {
        broker.package_queue.push_back(package_id);
        return;
    }

    let first = candidates[0].clone();
    let mut negotiation = dt_agent::Negotiation::new(package_id.clone(), candidates);
    negotiation.responses_received = 1;
    ctx.events.push(SimEvent::NegotiationStarted { package_id, tick: ctx.tick });
    msgs.send(Msg::to(broker.id.clone(), first, msg::MSG_PROPOSAL, serde_json::to_value(body).unwrap_or_default()));
    broker.active_negotiation = Some(negotiation);
}

/// Send a proposal to the current candidate if it hasn't been probed yet.
/// `responses_received` tracks how many candidates, in order, have been
/// sent a proposal; the current one is unprobed exactly when that count
/// hasn't caught up to `current_truck_idx`.
fn maybe_send_next_proposal(broker: &mut Broker, msgs: &mut MsgQueue, ctx: &mut BrokerContext) {
    let Some(neg) = &broker.active_negotiation else { return };
    if neg.responses_received > neg.current_truck_idx {
        return;
    }
    let package_id = neg.package_id.clone();
    let candidate = neg.current_candidate().cloned();
    let Some(candidate) = candidate else { return };
    let Some(body) = proposal_body(ctx, &package_id) else { return };

    msgs.send(Msg::to(broker.id.clone(), candidate, msg::MSG_PROPOSAL, serde_json::to_value(body).unwrap_or_default()));
    if let Some(neg) = &mut broker.active_negotiation {
        neg.responses_received = neg.current_truck_idx + 1;
    }
}

fn finalize_negotiation(broker: &mut Broker, msgs: &mut MsgQueue, ctx: &mut BrokerContext) {
    let Some(negotiation) = broker.active_negotiation.take() else { return };
    let Some(truck_id) = negotiation.current_candidate().cloned() else {
        broker.package_queue.push_back(negotiation.package_id);
        return;
    };
    let Some(body) = proposal_body(ctx, &negotiation.package_id) else {
        broker.known_packages.remove(&negotiation.package_id);
        return;
    };

    broker.assigned_packages.insert(negotiation.package_id.clone(), truck_id.clone());
    ctx.events.push(SimEvent::NegotiationFinalized {
        package_id: negotiation.package_id.clone(),
        truck_id: truck_id.clone(),
        tick: ctx.tick,
    });
    msgs.send(Msg::to(broker.id.clone(), truck_id, msg::MSG_ASSIGNMENT_CONFIRMED, serde_json::to_value(body).unwrap_or_default()));
}

fn requeue_exhausted(broker: &mut Broker) {
    if let Some(negotiation) = broker.active_negotiation.take() {
        broker.package_queue.push_back(negotiation.package_id);
    }
}

/// Applied by the world's tick loop when a package's pickup
/// deadline lapses: the site-level expiry and the broker's fine are the same
/// event, triggered from one place so the package's value is still on hand
/// to compute the fine (see DESIGN.md — running this from the broker's own
/// decide step would otherwise run after the site has already dropped the
/// record this tick).
pub fn apply_pickup_expiry(broker: &mut Broker, package_id: &PackageId, value: f64, tick: dt_core::Tick, events: &mut Vec<SimEvent>) {
    if !broker.known_packages.contains(package_id) {
        return;
    }
    let fine = 0.5 * value;
    broker.balance_ducats -= fine;
    events.push(SimEvent::PickupExpiryFine { package_id: package_id.clone(), amount: fine, tick });
    broker.forget(package_id);
}
