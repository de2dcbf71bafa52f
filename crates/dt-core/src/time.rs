//! Simulation time model.
//!
//! Time is a monotonically increasing `Tick` counter of fixed duration
//! `dt_s` simulated seconds. Tick 0 is pinned to 12:00 on day 1 — the
//! world does not model calendar dates, only an elapsed day/hour pair
//! useful for logging and for the fuel market's once-per-day price walk.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    #[inline]
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── TickData ──────────────────────────────────────────────────────────────────

/// The `{tick, time, day}` triple emitted at the external boundary.
///
/// Tick 0 is 12:00 on day 1: `now_s = tick * dt_s`, `day = 1 + (43200 +
/// now_s) / 86400`, `time = ((43200 + now_s) mod 86400) / 3600` hours,
/// always in `[0, 24)`.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TickData {
    pub tick: Tick,
    /// Hour of day, in `[0, 24)`.
    pub time: f64,
    /// Day number, starting at 1.
    pub day: u64,
}

impl TickData {
    pub fn from_tick(tick: Tick, dt_s: f64) -> Self {
        const NOON_OFFSET_S: f64 = 43_200.0;
        const DAY_S: f64 = 86_400.0;

        let now_s = tick.0 as f64 * dt_s;
        let shifted = NOON_OFFSET_S + now_s;
        let day = 1 + (shifted / DAY_S).floor() as u64;
        let time = shifted.rem_euclid(DAY_S) / 3_600.0;
        TickData { tick, time, day }
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and simulated wall-clock state.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SimClock {
    /// Simulated seconds represented by one tick.
    pub dt_s: f64,
    /// The current tick — advanced by [`SimClock::advance`] each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(dt_s: f64) -> Self {
        Self { dt_s, current_tick: Tick::ZERO }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = self.current_tick.next();
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn now_s(&self) -> f64 {
        self.current_tick.0 as f64 * self.dt_s
    }

    pub fn tick_data(&self) -> TickData {
        TickData::from_tick(self.current_tick, self.dt_s)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let td = self.tick_data();
        write!(f, "{} (day {} {:05.2}h)", self.current_tick, td.day, td.time)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration, typically loaded from a config file
/// plus CLI overrides (`dt-cli`) and passed to [`crate::SimClock`] and the
/// world's RNG at startup.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SimConfig {
    /// Simulated seconds per tick. Default: 60.0 (one simulated minute).
    pub dt_s: f64,
    /// Ticks per second of wall-clock time while running (controller pacing).
    pub tick_rate: f64,
    /// Master RNG seed. The same seed always produces identical results.
    pub seed: u64,
    /// Fuel-price volatility for the daily random walk (default 0.10).
    pub fuel_price_volatility: f64,
    /// Starting global fuel price, currency per litre.
    pub initial_fuel_price: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt_s: 60.0,
            tick_rate: 20.0,
            seed: 42,
            fuel_price_volatility: 0.10,
            initial_fuel_price: 1.50,
        }
    }
}

impl SimConfig {
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.dt_s)
    }
}
