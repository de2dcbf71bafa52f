//! Unit tests for dt-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, EdgeId, NodeId};

    #[test]
    fn index_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(NodeId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(NodeId(0) < NodeId(1));
        assert!(EdgeId(100) > EdgeId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::INVALID.0, u32::MAX);
    }

    #[test]
    fn opaque_ids_share_text_between_site_and_building() {
        let site = crate::SiteId::new("site-a");
        let building = site.as_building_id();
        assert_eq!(building.as_str(), "site-a");
        assert_eq!(building.as_site_id(), site);
    }

    #[test]
    fn display() {
        assert_eq!(AgentId::new("truck-7").to_string(), "truck-7");
    }
}

#[cfg(test)]
mod geo {
    use crate::GeoPoint;

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(500.0, 500.0);
        assert!(p.distance_m(p) < 0.01);
    }

    #[test]
    fn pythagorean_distance() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(3000.0, 4000.0);
        assert!((a.distance_m(b) - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn bbox_check() {
        let center = GeoPoint::new(500.0, 500.0);
        let nearby = GeoPoint::new(520.0, 480.0);
        let far = GeoPoint::new(5000.0, 500.0);
        assert!(nearby.within_bbox(center, 50.0));
        assert!(!far.within_bbox(center, 50.0));
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimConfig, Tick, TickData};

    #[test]
    fn tick_arithmetic() {
        let t = Tick(10);
        assert_eq!(t + 5, Tick(15));
        assert_eq!(t.offset(3), Tick(13));
        assert_eq!(Tick(15) - Tick(10), 5u64);
        assert_eq!(t.since(Tick(3)), 7);
    }

    #[test]
    fn clock_advances_now_s() {
        let mut clock = SimClock::new(60.0);
        assert_eq!(clock.now_s(), 0.0);
        clock.advance();
        assert_eq!(clock.now_s(), 60.0);
        clock.advance();
        assert_eq!(clock.now_s(), 120.0);
    }

    #[test]
    fn tick_zero_is_noon_day_one() {
        let td = TickData::from_tick(Tick(0), 60.0);
        assert_eq!(td.day, 1);
        assert!((td.time - 12.0).abs() < 1e-9);
    }

    #[test]
    fn tick_data_wraps_past_midnight() {
        // dt_s = 3600 (one simulated hour); 13 ticks past noon rolls to day 2, 1 AM.
        let td = TickData::from_tick(Tick(13), 3600.0);
        assert_eq!(td.day, 2);
        assert!((td.time - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sim_config_defaults_are_sane() {
        let cfg = SimConfig::default();
        assert!(cfg.dt_s > 0.0);
        assert!(cfg.tick_rate > 0.0);
        assert!(cfg.fuel_price_volatility > 0.0);
        assert!(cfg.initial_fuel_price > 0.0);
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentId, AgentRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = AgentRng::new(12345, &AgentId::new("truck-0"));
        let mut r2 = AgentRng::new(12345, &AgentId::new("truck-0"));
        for _ in 0..100 {
            let a: f32 = r1.random();
            let b: f32 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_agents_differ() {
        let mut r0 = AgentRng::new(1, &AgentId::new("truck-0"));
        let mut r1 = AgentRng::new(1, &AgentId::new("truck-1"));
        let a: u64 = r0.random();
        let b: u64 = r1.random();
        assert_ne!(a, b, "seeds for distinct agents should diverge");
    }

    #[test]
    fn gen_range_in_bounds() {
        let mut rng = AgentRng::new(0, &AgentId::new("truck-0"));
        for _ in 0..1000 {
            let v = rng.gen_range(0.0f32..1.0);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = AgentRng::new(0, &AgentId::new("truck-0"));
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
    }
}

#[cfg(test)]
mod transport {
    use crate::{RoadClass, RoadMode};

    #[test]
    fn display() {
        assert_eq!(RoadClass::Highway.to_string(), "highway");
        assert_eq!(RoadMode::Road.to_string(), "road");
    }

    #[test]
    fn default_class_is_arterial() {
        assert_eq!(RoadClass::default(), RoadClass::Arterial);
    }
}

#[cfg(test)]
mod msg {
    use crate::{AgentId, Msg, MsgQueue};
    use serde_json::json;

    #[test]
    fn point_to_point_roundtrip() {
        let mut q = MsgQueue::new();
        q.send(Msg::to(AgentId::new("broker"), AgentId::new("truck-1"), "proposal", json!({"package": "p1"})));
        assert_eq!(q.outbox.len(), 1);
        assert!(q.inbox.is_empty());
    }

    #[test]
    fn drain_inbox_empties_it() {
        let mut q = MsgQueue::new();
        q.inbox.push(Msg::broadcast(AgentId::new("site-a"), "dispatch", "package.created", json!({})));
        let drained = q.drain_inbox();
        assert_eq!(drained.len(), 1);
        assert!(q.inbox.is_empty());
    }
}
