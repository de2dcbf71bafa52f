//! Unit tests for the truck and broker decision ladders.

use dt_agent::{AgentStore, Broker, Building, BuildingStore, NegotiationStatus, Package, PackageStatus, PackageStore, Position, Priority, Site, Truck, Urgency};
use dt_core::{AgentId, AgentRng, BuildingKind, GeoPoint, MsgQueue, PackageId, RoadClass, RoadMode, SiteId, Tick};
use dt_spatial::{RoadGraph, RouteCache};

use crate::msg::{self, PackageRefBody, ProposalBody};
use crate::{broker, truck, BrokerContext, TruckContext};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// A two-node graph joined by a single edge, with no buildings attached.
fn two_site_graph() -> (RoadGraph, dt_core::NodeId, dt_core::NodeId) {
    let mut g = RoadGraph::new();
    let a = g.add_node(GeoPoint::new(0.0, 0.0));
    let b = g.add_node(GeoPoint::new(10_000.0, 0.0));
    g.add_edge(a, b, 10_000.0, 80.0, RoadClass::Arterial, 1, RoadMode::Road).unwrap();
    g.add_edge(b, a, 10_000.0, 80.0, RoadClass::Arterial, 1, RoadMode::Road).unwrap();
    (g, a, b)
}

/// Same two-node graph, with "site-a" attached at the first node and
/// "site-b" at the second — what the broker needs to resolve a proposal's
/// origin/destination nodes.
fn two_site_graph_with_sites() -> (RoadGraph, dt_core::NodeId, dt_core::NodeId) {
    let (mut g, a, b) = two_site_graph();
    g.attach_building(a, BuildingKind::Site, SiteId::new("site-a").as_building_id()).unwrap();
    g.attach_building(b, BuildingKind::Site, SiteId::new("site-b").as_building_id()).unwrap();
    (g, a, b)
}

fn make_truck(id: &str, at: dt_core::NodeId) -> Truck {
    Truck::new(AgentId::new(id), at, 90.0, 20, 400.0)
}

fn make_package(id: &str, origin: &str, destination: &str, pickup_deadline: u64, delivery_deadline: u64) -> Package {
    Package {
        id: PackageId::new(id),
        origin_site: SiteId::new(origin),
        destination_site: SiteId::new(destination),
        size: 5,
        value_currency: 200.0,
        priority: Priority::Medium,
        urgency: Urgency::Standard,
        spawn_tick: Tick(0),
        pickup_deadline_tick: Tick(pickup_deadline),
        delivery_deadline_tick: Tick(delivery_deadline),
        status: PackageStatus::WaitingPickup,
    }
}

// ── truck::decide ────────────────────────────────────────────────────────────

mod truck_tests {
    use super::*;

    #[test]
    fn idle_truck_at_node_with_no_route_stays_put() {
        let (graph, a, _b) = two_site_graph();
        let cache = RouteCache::new();
        let mut buildings = BuildingStore::new();
        let mut packages = PackageStore::new();
        let mut events = Vec::new();
        let mut rng = AgentRng::new(1, &AgentId::new("truck-1"));
        let broker_id = AgentId::new("broker");

        let mut truck = make_truck("truck-1", a);
        let mut msgs = MsgQueue::new();

        let mut ctx = TruckContext {
            graph: &graph,
            cache: &cache,
            buildings: &mut buildings,
            packages: &mut packages,
            broker_id: &broker_id,
            global_fuel_price: 1.5,
            tick: Tick(0),
            dt_s: 60.0,
            rng: &mut rng,
            events: &mut events,
        };

        truck::decide(&mut truck, &mut msgs, &mut ctx).unwrap();
        assert_eq!(truck.position, Position::AtNode(a));
        assert!(truck.delivery_queue.is_empty());
    }

    #[test]
    fn accepts_proposal_with_room_and_sends_accept() {
        let (graph, a, b) = two_site_graph();
        let cache = RouteCache::new();
        let mut buildings = BuildingStore::new();
        let mut packages = PackageStore::new();
        let mut events = Vec::new();
        let mut rng = AgentRng::new(1, &AgentId::new("truck-1"));
        let broker_id = AgentId::new("broker");

        let mut truck = make_truck("truck-1", a);
        let mut msgs = MsgQueue::new();
        let proposal = ProposalBody {
            package_id: PackageId::new("pkg-1"),
            origin_site: SiteId::new("site-a"),
            destination_site: SiteId::new("site-b"),
            origin_node: a,
            destination_node: b,
            size: 5,
            pickup_deadline_tick: Tick(500),
            delivery_deadline_tick: Tick(1000),
        };
        msgs.inbox.push(dt_core::Msg::to(broker_id.clone(), truck.id.clone(), msg::MSG_PROPOSAL, serde_json::to_value(&proposal).unwrap()));

        let mut ctx = TruckContext {
            graph: &graph,
            cache: &cache,
            buildings: &mut buildings,
            packages: &mut packages,
            broker_id: &broker_id,
            global_fuel_price: 1.5,
            tick: Tick(0),
            dt_s: 60.0,
            rng: &mut rng,
            events: &mut events,
        };

        truck::decide(&mut truck, &mut msgs, &mut ctx).unwrap();

        let sent = msgs.outbox.iter().find(|m| m.msg_type == msg::MSG_ACCEPT);
        assert!(sent.is_some(), "expected truck to accept a proposal it has room and time for");
    }
}

// ── broker::decide ───────────────────────────────────────────────────────────

mod broker_tests {
    use super::*;

    fn make_agents(trucks: &[(&str, dt_core::NodeId)]) -> AgentStore {
        let mut store = AgentStore::new();
        for (id, node) in trucks {
            store.insert(dt_agent::Agent::new_truck(make_truck(id, *node)));
        }
        store
    }

    #[test]
    fn starts_negotiation_for_waiting_package_and_proposes_to_nearest_truck() {
        let (graph, a, b) = two_site_graph_with_sites();
        let mut buildings = BuildingStore::new();
        buildings.insert(Building::Site(Site::new(SiteId::new("site-a"), "Site A", 1.0)));
        buildings.insert(Building::Site(Site::new(SiteId::new("site-b"), "Site B", 1.0)));

        let mut packages = PackageStore::new();
        packages.insert(make_package("pkg-1", "site-a", "site-b", 500, 1000));

        let trucks = make_agents(&[("truck-near", a), ("truck-far", b)]);
        let mut events = Vec::new();
        let mut broker = Broker::new(AgentId::new("broker"));
        let mut msgs = MsgQueue::new();

        let mut ctx = BrokerContext { graph: &graph, trucks: &trucks, buildings: &mut buildings, packages: &mut packages, tick: Tick(0), dt_s: 60.0, events: &mut events };

        broker::perceive(&mut broker, &ctx);
        broker::decide(&mut broker, &mut msgs, &mut ctx).unwrap();

        assert!(broker.active_negotiation.is_some());
        let neg = broker.active_negotiation.as_ref().unwrap();
        assert_eq!(neg.package_id, PackageId::new("pkg-1"));
        assert_eq!(neg.status, NegotiationStatus::Proposed);
        assert_eq!(neg.current_candidate(), Some(&AgentId::new("truck-near")));

        let proposal = msgs.outbox.iter().find(|m| m.msg_type == msg::MSG_PROPOSAL);
        assert!(proposal.is_some());
        assert_eq!(proposal.unwrap().dst, Some(AgentId::new("truck-near")));
    }

    #[test]
    fn reject_advances_to_next_candidate() {
        let (graph, a, b) = two_site_graph_with_sites();
        let mut buildings = BuildingStore::new();
        buildings.insert(Building::Site(Site::new(SiteId::new("site-a"), "Site A", 1.0)));
        buildings.insert(Building::Site(Site::new(SiteId::new("site-b"), "Site B", 1.0)));

        let mut broker = Broker::new(AgentId::new("broker"));
        broker.active_negotiation = Some(dt_agent::Negotiation::new(
            PackageId::new("pkg-1"),
            vec![AgentId::new("truck-near"), AgentId::new("truck-far")],
        ));
        broker.active_negotiation.as_mut().unwrap().responses_received = 1;

        let mut packages = PackageStore::new();
        packages.insert(make_package("pkg-1", "site-a", "site-b", 500, 1000));
        let trucks = make_agents(&[("truck-near", a), ("truck-far", b)]);
        let mut events = Vec::new();
        let mut msgs = MsgQueue::new();
        msgs.inbox.push(dt_core::Msg::to(
            AgentId::new("truck-near"),
            broker.id.clone(),
            msg::MSG_REJECT,
            serde_json::to_value(PackageRefBody { package_id: PackageId::new("pkg-1") }).unwrap(),
        ));

        let mut ctx = BrokerContext { graph: &graph, trucks: &trucks, buildings: &mut buildings, packages: &mut packages, tick: Tick(1), dt_s: 60.0, events: &mut events };
        broker::decide(&mut broker, &mut msgs, &mut ctx).unwrap();

        let neg = broker.active_negotiation.as_ref().unwrap();
        assert_eq!(neg.current_truck_idx, 1);
        assert_eq!(neg.current_candidate(), Some(&AgentId::new("truck-far")));
    }

    #[test]
    fn accept_finalizes_and_sends_assignment_confirmed() {
        let (graph, a, b) = two_site_graph_with_sites();
        let mut buildings = BuildingStore::new();
        buildings.insert(Building::Site(Site::new(SiteId::new("site-a"), "Site A", 1.0)));
        buildings.insert(Building::Site(Site::new(SiteId::new("site-b"), "Site B", 1.0)));

        let mut broker = Broker::new(AgentId::new("broker"));
        broker.active_negotiation = Some(dt_agent::Negotiation::new(PackageId::new("pkg-1"), vec![AgentId::new("truck-near")]));

        let mut packages = PackageStore::new();
        packages.insert(make_package("pkg-1", "site-a", "site-b", 500, 1000));
        let trucks = make_agents(&[("truck-near", a), ("truck-far", b)]);
        let mut events = Vec::new();
        let mut msgs = MsgQueue::new();
        msgs.inbox.push(dt_core::Msg::to(
            AgentId::new("truck-near"),
            broker.id.clone(),
            msg::MSG_ACCEPT,
            serde_json::to_value(PackageRefBody { package_id: PackageId::new("pkg-1") }).unwrap(),
        ));

        let mut ctx = BrokerContext { graph: &graph, trucks: &trucks, buildings: &mut buildings, packages: &mut packages, tick: Tick(1), dt_s: 60.0, events: &mut events };
        broker::decide(&mut broker, &mut msgs, &mut ctx).unwrap();

        assert!(broker.active_negotiation.is_none());
        assert_eq!(broker.assigned_packages.get(&PackageId::new("pkg-1")), Some(&AgentId::new("truck-near")));
        let confirmed = msgs.outbox.iter().find(|m| m.msg_type == msg::MSG_ASSIGNMENT_CONFIRMED);
        assert!(confirmed.is_some());
        assert_eq!(confirmed.unwrap().dst, Some(AgentId::new("truck-near")));
    }

    #[test]
    fn exhausted_candidates_requeue_the_package() {
        let (graph, a, _b) = two_site_graph_with_sites();
        let mut buildings = BuildingStore::new();
        buildings.insert(Building::Site(Site::new(SiteId::new("site-a"), "Site A", 1.0)));
        buildings.insert(Building::Site(Site::new(SiteId::new("site-b"), "Site B", 1.0)));

        let mut broker = Broker::new(AgentId::new("broker"));
        let mut neg = dt_agent::Negotiation::new(PackageId::new("pkg-1"), vec![AgentId::new("truck-near")]);
        neg.advance_candidate();
        broker.active_negotiation = Some(neg);
        broker.known_packages.insert(PackageId::new("pkg-1"));

        let mut packages = PackageStore::new();
        packages.insert(make_package("pkg-1", "site-a", "site-b", 500, 1000));
        let trucks = make_agents(&[("truck-near", a)]);
        let mut events = Vec::new();
        let mut msgs = MsgQueue::new();

        let mut ctx = BrokerContext { graph: &graph, trucks: &trucks, buildings: &mut buildings, packages: &mut packages, tick: Tick(2), dt_s: 60.0, events: &mut events };
        broker::decide(&mut broker, &mut msgs, &mut ctx).unwrap();

        assert!(broker.active_negotiation.is_none());
        assert!(broker.package_queue.contains(&PackageId::new("pkg-1")));
    }

    #[test]
    fn delivery_confirmed_credits_balance_and_clears_assignment() {
        let (graph, _a, _b) = two_site_graph();
        let mut buildings = BuildingStore::new();
        let mut packages = PackageStore::new();
        let trucks = AgentStore::new();
        let mut events = Vec::new();
        let mut broker = Broker::new(AgentId::new("broker"));
        broker.assigned_packages.insert(PackageId::new("pkg-1"), AgentId::new("truck-near"));
        let starting_balance = broker.balance_ducats;

        let mut msgs = MsgQueue::new();
        msgs.inbox.push(dt_core::Msg::to(
            AgentId::new("truck-near"),
            broker.id.clone(),
            msg::MSG_DELIVERY_CONFIRMED,
            serde_json::to_value(crate::msg::DeliveryConfirmedBody {
                package_id: PackageId::new("pkg-1"),
                on_time: true,
                delivery_tick: Tick(100),
                payment: 180.0,
            })
            .unwrap(),
        ));

        let mut ctx = BrokerContext { graph: &graph, trucks: &trucks, buildings: &mut buildings, packages: &mut packages, tick: Tick(100), dt_s: 60.0, events: &mut events };
        broker::decide(&mut broker, &mut msgs, &mut ctx).unwrap();

        assert_eq!(broker.balance_ducats, starting_balance + 180.0);
        assert!(!broker.assigned_packages.contains_key(&PackageId::new("pkg-1")));
    }

    #[test]
    fn pickup_expiry_fines_the_broker_and_forgets_the_package() {
        let mut broker = Broker::new(AgentId::new("broker"));
        broker.known_packages.insert(PackageId::new("pkg-1"));
        broker.package_queue.push_back(PackageId::new("pkg-1"));
        let starting_balance = broker.balance_ducats;
        let mut events = Vec::new();

        broker::apply_pickup_expiry(&mut broker, &PackageId::new("pkg-1"), 200.0, Tick(10), &mut events);

        assert_eq!(broker.balance_ducats, starting_balance - 100.0);
        assert!(!broker.known_packages.contains(&PackageId::new("pkg-1")));
        assert!(!broker.package_queue.contains(&PackageId::new("pkg-1")));
        assert_eq!(events.len(), 1);
    }

}
