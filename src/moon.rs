//! Lunar phase cycle.
//!
//! The animated moon is a single clock wrapped at the cycle length; every
//! displayed quantity (bucket, illumination, terminator offset) is derived
//! from "day within cycle" alone.

use crate::clock::{SimulationClock, SpeedLimits, TickMode, Ticker};
use crate::controller::{Controller, Simulator};
use crate::error::{Result, SimError};
use crate::model::{phase_info, MoonFrame, ShadowGeometry};
use chrono::{DateTime, Utc};
use std::time::Duration;

pub const DEFAULT_CYCLE_LENGTH: f64 = 29.5;
pub const PHASE_COUNT: u8 = 8;

/// Mean synodic month used by the calendar lookup.
pub const SYNODIC_MONTH_DAYS: f64 = 29.53;
/// 2000-01-06T18:14:00Z, the reference new moon.
pub const REFERENCE_NEW_MOON_UNIX: i64 = 947_182_440;

const MS_PER_DAY: f64 = 86_400_000.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoonPhaseResolver {
    cycle_length: f64,
}

impl MoonPhaseResolver {
    pub fn new(cycle_length: f64) -> Result<Self> {
        if !cycle_length.is_finite() || cycle_length <= 0.0 {
            return Err(SimError::InvalidCycleLength(cycle_length));
        }
        Ok(Self { cycle_length })
    }

    pub fn cycle_length(&self) -> f64 {
        self.cycle_length
    }

    fn fraction(&self, t: f64) -> f64 {
        t.rem_euclid(self.cycle_length) / self.cycle_length
    }

    /// Percent through the cycle, `[0, 100)`.
    pub fn normalized_phase(&self, t: f64) -> f64 {
        self.fraction(t) * 100.0
    }

    pub fn phase_index(&self, t: f64) -> u8 {
        bucket(self.fraction(t))
    }

    pub fn illumination_percent(&self, t: f64) -> f64 {
        let n = self.normalized_phase(t);
        let lit = if n <= 50.0 { n * 2.0 } else { (100.0 - n) * 2.0 };
        lit.clamp(0.0, 100.0)
    }

    pub fn shadow(&self, t: f64) -> ShadowGeometry {
        shadow_at(self.normalized_phase(t))
    }

    /// Earliest cycle day that resolves to bucket `index`.
    pub fn phase_start(&self, index: u8) -> f64 {
        let index = index % PHASE_COUNT;
        let mut t = f64::from(index) * self.cycle_length / f64::from(PHASE_COUNT);
        // i*L/8 can round just below the boundary; walk up one ulp at a time
        for _ in 0..MAX_BOUNDARY_NUDGES {
            if self.phase_index(t) == index {
                break;
            }
            t = next_up(t);
        }
        t
    }

    pub fn resolve(&self, t: f64) -> MoonFrame {
        let index = self.phase_index(t);
        MoonFrame {
            cycle_day: t.rem_euclid(self.cycle_length),
            cycle_length: self.cycle_length,
            illumination_percent: self.illumination_percent(t),
            phase_index: index,
            phase_name: phase_info(index).name,
            shadow: self.shadow(t),
        }
    }
}

const MAX_BOUNDARY_NUDGES: usize = 64;

/// Smallest float above a non-negative finite `t`.
fn next_up(t: f64) -> f64 {
    if t == 0.0 {
        return f64::from_bits(1);
    }
    f64::from_bits(t.to_bits() + 1)
}

fn bucket(fraction: f64) -> u8 {
    ((fraction * f64::from(PHASE_COUNT)).floor() as i64).rem_euclid(i64::from(PHASE_COUNT)) as u8
}

/// Terminator offset for a normalized phase in `[0, 100)`.
fn shadow_at(normalized: f64) -> ShadowGeometry {
    if normalized <= 50.0 {
        ShadowGeometry {
            offset: (1.0 - normalized / 50.0).clamp(0.0, 1.0),
            waxing: true,
        }
    } else {
        ShadowGeometry {
            offset: ((normalized - 50.0) / 50.0).clamp(0.0, 1.0),
            waxing: false,
        }
    }
}

pub fn next_phase(index: u8) -> u8 {
    (index % PHASE_COUNT + 1) % PHASE_COUNT
}

pub fn previous_phase(index: u8) -> u8 {
    (index % PHASE_COUNT + PHASE_COUNT - 1) % PHASE_COUNT
}

/// Days since the reference new moon, folded into one synodic month.
pub fn real_world_cycle_day(now: DateTime<Utc>) -> f64 {
    let ms = now.timestamp_millis() - REFERENCE_NEW_MOON_UNIX * 1000;
    (ms as f64 / MS_PER_DAY).rem_euclid(SYNODIC_MONTH_DAYS)
}

/// Phase bucket for a calendar instant. Pure: the instant is the only input.
pub fn real_world_phase_index(now: DateTime<Utc>) -> u8 {
    bucket(real_world_cycle_day(now) / SYNODIC_MONTH_DAYS)
}

/// Animated moon; all state lives in the (wrapping) clock.
#[derive(Clone, Debug)]
pub struct MoonSim {
    resolver: MoonPhaseResolver,
}

impl MoonSim {
    pub fn new(cycle_length: f64) -> Result<Self> {
        Ok(Self {
            resolver: MoonPhaseResolver::new(cycle_length)?,
        })
    }
}

impl Simulator for MoonSim {
    type Frame = MoonFrame;

    fn tick_mode(&self) -> TickMode {
        TickMode::MOON
    }

    fn clock(&self) -> SimulationClock {
        SimulationClock::new(SpeedLimits::MOON, 1.0).wrapping(Some(self.resolver.cycle_length()))
    }

    fn advance(&mut self, _clock: &SimulationClock, _sim_dt: f64) {}

    fn frame(&self, clock: &SimulationClock) -> MoonFrame {
        self.resolver.resolve(clock.elapsed())
    }
}

impl Controller<MoonSim> {
    /// Jump straight to the start of a phase bucket.
    pub fn jump_to_phase(&mut self, index: u8) {
        if let Some(start) = self.sim().map(|s| s.resolver.phase_start(index)) {
            self.seek(start);
        }
    }

    /// Move to the start of the neighbouring bucket.
    pub fn step_phase(&mut self, forward: bool) {
        if let Some(f) = self.frame() {
            let target = if forward {
                next_phase(f.phase_index)
            } else {
                previous_phase(f.phase_index)
            };
            self.jump_to_phase(target);
        }
    }
}

/// Walks through all eight phases once, one per second, ending on New Moon.
#[derive(Clone, Debug)]
pub struct CycleTour {
    ticker: Ticker,
    step: u8,
}

impl CycleTour {
    pub const INTERVAL: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self {
            ticker: Ticker::new(TickMode::Fixed {
                interval: Self::INTERVAL,
                step: 1.0,
            }),
            step: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_armed()
    }

    /// No-op while a tour is already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.step = 0;
        self.ticker.arm();
        true
    }

    pub fn stop(&mut self) {
        self.ticker.cancel();
    }

    /// Writes the toured phase into `phase`. Returns true if it changed.
    pub fn pump(&mut self, wall_dt: Duration, phase: &mut u8) -> bool {
        let mut step = self.step;
        let mut done = false;
        let fired = self.ticker.poll(wall_dt, |_| {
            if done {
                return;
            }
            step = next_phase(step);
            if step == 0 {
                done = true;
            }
        });
        self.step = step;
        if done {
            self.ticker.cancel();
        }
        if fired > 0 {
            *phase = step;
            return true;
        }
        false
    }
}

impl Default for CycleTour {
    fn default() -> Self {
        Self::new()
    }
}

/// The "today" page: a phase picked from the calendar once, then browsed by hand.
#[derive(Clone, Debug)]
pub struct PhaseBrowser {
    pub phase: u8,
    pub date: DateTime<Utc>,
    pub cycle_day: f64,
    pub tour: CycleTour,
}

impl PhaseBrowser {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            phase: real_world_phase_index(now),
            date: now,
            cycle_day: real_world_cycle_day(now),
            tour: CycleTour::new(),
        }
    }

    pub fn next(&mut self) {
        self.phase = next_phase(self.phase);
    }

    pub fn previous(&mut self) {
        self.phase = previous_phase(self.phase);
    }

    pub fn pump(&mut self, wall_dt: Duration) {
        self.tour.pump(wall_dt, &mut self.phase);
    }
}
