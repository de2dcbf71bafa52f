//! Unit tests for the agent/building/package data model.

use dt_core::{AgentId, BuildingId, PackageId, SiteId, Tick};

use crate::agent::{Agent, AgentBody};
use crate::broker::{Broker, Negotiation, NegotiationStatus};
use crate::building::{Building, GasStation, Occupiable, Parking};
use crate::package::{Package, PackageStatus, Priority, Urgency};
use crate::site::Site;
use crate::store::{AgentStore, BuildingStore, PackageStore};
use crate::truck::{Tachograph, TaskStatus, TaskType, Truck};

fn make_package(id: &str, size: u32) -> Package {
    Package {
        id: PackageId::new(id),
        origin_site: SiteId::new("site-a"),
        destination_site: SiteId::new("site-b"),
        size,
        value_currency: 100.0,
        priority: Priority::Medium,
        urgency: Urgency::Standard,
        spawn_tick: Tick::ZERO,
        pickup_deadline_tick: Tick(100),
        delivery_deadline_tick: Tick(200),
        status: PackageStatus::WaitingPickup,
    }
}

// ── Truck capacity / task bookkeeping ───────────────────────────────────────

#[test]
fn truck_rejects_load_exceeding_free_capacity() {
    let mut truck = Truck::new(AgentId::new("t1"), dt_core::NodeId(0), 80.0, 24, 400.0);
    let sizes = |_: &PackageId| 20u32;
    truck.load_package(PackageId::new("p1"), 20, sizes).unwrap();
    let err = truck.load_package(PackageId::new("p2"), 10, sizes).unwrap_err();
    assert!(matches!(err, crate::error::AgentError::CapacityExceeded { .. }));
}

#[test]
fn truck_unload_rejects_package_not_aboard() {
    let mut truck = Truck::new(AgentId::new("t1"), dt_core::NodeId(0), 80.0, 24, 400.0);
    let err = truck.unload_package(&PackageId::new("p1")).unwrap_err();
    assert!(matches!(err, crate::error::AgentError::PackageNotLoaded(_)));
}

#[test]
fn enqueue_task_consolidates_same_site_and_type() {
    let mut truck = Truck::new(AgentId::new("t1"), dt_core::NodeId(0), 80.0, 24, 400.0);
    truck.enqueue_task(SiteId::new("s1"), TaskType::Pickup, PackageId::new("p1"));
    truck.enqueue_task(SiteId::new("s1"), TaskType::Pickup, PackageId::new("p2"));
    assert_eq!(truck.delivery_queue.len(), 1);
    assert_eq!(truck.delivery_queue[0].package_ids.len(), 2);
}

#[test]
fn enqueue_task_does_not_consolidate_in_progress_task() {
    let mut truck = Truck::new(AgentId::new("t1"), dt_core::NodeId(0), 80.0, 24, 400.0);
    truck.enqueue_task(SiteId::new("s1"), TaskType::Pickup, PackageId::new("p1"));
    truck.delivery_queue[0].status = TaskStatus::InProgress;
    truck.enqueue_task(SiteId::new("s1"), TaskType::Pickup, PackageId::new("p2"));
    assert_eq!(truck.delivery_queue.len(), 2);
}

// ── Tachograph ───────────────────────────────────────────────────────────────

#[test]
fn required_rest_is_one_to_one_below_six_hours() {
    let rest = Tachograph::required_rest_for(3.0 * 3600.0);
    assert!((rest - 3.0 * 3600.0).abs() < 1e-6);
}

#[test]
fn required_rest_is_ten_hours_at_the_hard_cap() {
    let rest = Tachograph::required_rest_for(Tachograph::HARD_CAP_S);
    assert!((rest - 10.0 * 3600.0).abs() < 1e-6);
}

#[test]
fn required_rest_interpolates_linearly_between_six_and_eight_hours() {
    let rest = Tachograph::required_rest_for(7.0 * 3600.0);
    assert!((rest - 8.0 * 3600.0).abs() < 1e-6);
}

#[test]
fn begin_rest_then_end_rest_resets_driving_timer() {
    let mut t = Tachograph { driving_time_s: 7.0 * 3600.0, ..Tachograph::default() };
    t.begin_rest();
    assert!(t.is_resting);
    assert!((t.required_rest_s - 8.0 * 3600.0).abs() < 1e-6);
    t.end_rest();
    assert_eq!(t.driving_time_s, 0.0);
    assert!(!t.is_resting);
}

// ── Fuel ─────────────────────────────────────────────────────────────────────

#[test]
fn fuel_consumption_scales_with_cargo_weight() {
    let mut empty = crate::truck::FuelState::full(400.0);
    let mut loaded = crate::truck::FuelState::full(400.0);
    empty.consume(100.0, 0.0);
    loaded.consume(100.0, 10.0);
    assert!(loaded.current_fuel_l < empty.current_fuel_l);
}

#[test]
fn fuel_never_goes_negative() {
    let mut fuel = crate::truck::FuelState::full(10.0);
    fuel.consume(1000.0, 0.0);
    assert_eq!(fuel.current_fuel_l, 0.0);
}

#[test]
fn co2_emitted_accumulates_with_consumption() {
    let mut fuel = crate::truck::FuelState::full(400.0);
    fuel.consume(100.0, 0.0);
    let liters = crate::truck::FuelState::consumption_l_per_100km(0.0) / 100.0 * 100.0;
    assert!((fuel.co2_emitted_kg - liters * crate::truck::FuelState::CO2_PER_LITER_KG).abs() < 1e-6);
}

// ── Package value multipliers ────────────────────────────────────────────────

#[test]
fn value_multipliers_compound() {
    let value = Package::apply_value_multipliers(100.0, Priority::Urgent, Urgency::SameDay);
    assert!((value - 100.0 * 2.0 * 1.8).abs() < 1e-9);
}

#[test]
fn low_and_medium_priority_share_the_baseline_multiplier() {
    assert_eq!(Priority::Low.value_multiplier(), Priority::Medium.value_multiplier());
}

#[test]
fn late_delivery_discounts_linearly_and_floors_at_zero() {
    let pkg = make_package("p1", 5);
    let on_time = pkg.late_discounted_payment(pkg.delivery_deadline_tick);
    assert!((on_time - pkg.value_currency).abs() < 1e-9);

    let very_late = pkg.late_discounted_payment(pkg.delivery_deadline_tick.offset(2000));
    assert_eq!(very_late, 0.0);
}

// ── Site spawn / destination selection ──────────────────────────────────────

#[test]
fn zero_activity_site_never_spawns() {
    let site = Site::new(SiteId::new("s1"), "Depot", 0.0);
    let mut rng = dt_core::AgentRng::new(1, &AgentId::new("s1"));
    for _ in 0..1000 {
        assert!(!site.should_spawn_package(60.0, &mut rng));
    }
}

#[test]
fn select_destination_excludes_self() {
    let site = Site::new(SiteId::new("s1"), "Depot", 10.0);
    let mut rng = dt_core::AgentRng::new(1, &AgentId::new("s1"));
    let available = vec![SiteId::new("s1")];
    assert!(site.select_destination(&available, &mut rng).is_none());
}

#[test]
fn select_destination_picks_among_others() {
    let site = Site::new(SiteId::new("s1"), "Depot", 10.0);
    let mut rng = dt_core::AgentRng::new(1, &AgentId::new("s1"));
    let available = vec![SiteId::new("s1"), SiteId::new("s2")];
    let picked = site.select_destination(&available, &mut rng).unwrap();
    assert_eq!(picked, SiteId::new("s2"));
}

// ── Building occupancy ───────────────────────────────────────────────────────

#[test]
fn parking_enter_respects_capacity() {
    let mut p = Parking::new(BuildingId::new("park-1"), 1);
    assert!(p.enter(AgentId::new("t1")));
    assert!(!p.enter(AgentId::new("t2")));
    assert_eq!(p.occupants.len(), 1);
}

#[test]
fn gas_station_effective_price_applies_cost_factor() {
    let gs = GasStation::new(BuildingId::new("gas-1"), 2, 1.2);
    assert!((gs.effective_price_per_liter(1.5) - 1.8).abs() < 1e-9);
}

#[test]
fn leave_checked_errors_when_not_occupying() {
    let mut gs = GasStation::new(BuildingId::new("gas-1"), 2, 1.0);
    let err = gs.leave_checked(&AgentId::new("t1")).unwrap_err();
    assert!(matches!(err, crate::error::AgentError::NotOccupying(_, _)));
}

// ── Broker negotiation ───────────────────────────────────────────────────────

#[test]
fn negotiation_advances_through_candidates_until_exhausted() {
    let mut neg = Negotiation::new(
        PackageId::new("p1"),
        vec![AgentId::new("t1"), AgentId::new("t2")],
    );
    assert_eq!(neg.current_candidate(), Some(&AgentId::new("t1")));
    neg.advance_candidate();
    assert_eq!(neg.current_candidate(), Some(&AgentId::new("t2")));
    neg.advance_candidate();
    assert!(neg.candidates_exhausted());
    assert_eq!(neg.current_candidate(), None);
}

#[test]
fn broker_observe_is_idempotent() {
    let mut broker = Broker::new(AgentId::new("broker"));
    broker.observe(PackageId::new("p1"));
    broker.observe(PackageId::new("p1"));
    assert_eq!(broker.package_queue.len(), 1);
}

#[test]
fn broker_forget_clears_all_three_sets() {
    let mut broker = Broker::new(AgentId::new("broker"));
    broker.observe(PackageId::new("p1"));
    broker.assigned_packages.insert(PackageId::new("p1"), AgentId::new("t1"));
    broker.forget(&PackageId::new("p1"));
    assert!(!broker.known_packages.contains(&PackageId::new("p1")));
    assert!(broker.package_queue.is_empty());
    assert!(!broker.assigned_packages.contains_key(&PackageId::new("p1")));
}

#[test]
fn negotiation_status_defaults_to_proposed() {
    let neg = Negotiation::new(PackageId::new("p1"), vec![AgentId::new("t1")]);
    assert_eq!(neg.status, NegotiationStatus::Proposed);
}

// ── Stores preserve insertion order ──────────────────────────────────────────

#[test]
fn agent_store_iterates_in_insertion_order() {
    let mut store = AgentStore::new();
    store.insert(Agent::new_truck(Truck::new(AgentId::new("t2"), dt_core::NodeId(0), 80.0, 24, 400.0)));
    store.insert(Agent::new_broker(Broker::new(AgentId::new("broker"))));
    store.insert(Agent::new_truck(Truck::new(AgentId::new("t1"), dt_core::NodeId(0), 80.0, 24, 400.0)));
    let ids: Vec<String> = store.ids().map(|id| id.to_string()).collect();
    assert_eq!(ids, vec!["t2", "broker", "t1"]);
}

#[test]
fn agent_store_remove_keeps_remaining_order() {
    let mut store = AgentStore::new();
    store.insert(Agent::new_broker(Broker::new(AgentId::new("broker"))));
    store.insert(Agent::new_truck(Truck::new(AgentId::new("t1"), dt_core::NodeId(0), 80.0, 24, 400.0)));
    store.remove(&AgentId::new("broker"));
    let ids: Vec<String> = store.ids().map(|id| id.to_string()).collect();
    assert_eq!(ids, vec!["t1"]);
    assert!(store.get(&AgentId::new("t1")).unwrap().body.as_truck().is_some());
}

#[test]
fn building_store_round_trips_site_under_its_building_id() {
    let mut store = BuildingStore::new();
    let site = Site::new(SiteId::new("s1"), "Depot", 5.0);
    let building_id = site.id.as_building_id();
    store.insert(Building::Site(site));
    assert!(store.get(&building_id).unwrap().as_site().is_some());
}

#[test]
fn package_store_tracks_active_packages() {
    let mut store = PackageStore::new();
    store.insert(make_package("p1", 5));
    store.insert(make_package("p2", 5));
    assert_eq!(store.len(), 2);
    store.remove(&PackageId::new("p1"));
    assert_eq!(store.len(), 1);
    assert!(store.get(&PackageId::new("p2")).unwrap().is_active());
}

#[test]
fn agent_body_kind_matches_variant() {
    let agent = Agent::new_truck(Truck::new(AgentId::new("t1"), dt_core::NodeId(0), 80.0, 24, 400.0));
    assert_eq!(agent.kind(), dt_core::AgentKind::Truck);
    assert!(matches!(agent.body, AgentBody::Truck(_)));
}
