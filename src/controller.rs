//! Play/pause lifecycle shared by every visualization.
//!
//! ```text
//!   Stopped --mount--> Running  (Paused when autoplay is off)
//!   Running <--pause/resume--> Paused
//!   any --unmount--> Stopped    (ticker cancelled, state dropped)
//! ```

use crate::clock::{SimulationClock, TickMode, Ticker};
use std::time::Duration;
use tracing::debug;

/// A pure motion model driven by a [`SimulationClock`].
pub trait Simulator {
    type Frame;

    fn tick_mode(&self) -> TickMode;

    /// Fresh clock for a new mount, carrying this simulator's limits and wrap.
    fn clock(&self) -> SimulationClock;

    /// Apply `sim_dt` simulated time units. `clock` already includes them.
    fn advance(&mut self, clock: &SimulationClock, sim_dt: f64);

    fn frame(&self, clock: &SimulationClock) -> Self::Frame;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

#[derive(Clone, Copy, Debug)]
pub struct MountOptions {
    pub autoplay: bool,
    pub speed: f64,
    /// Simulated time the fresh clock starts from.
    pub start_at: f64,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            autoplay: true,
            speed: 1.0,
            start_at: 0.0,
        }
    }
}

struct Instance<S> {
    sim: S,
    clock: SimulationClock,
}

pub struct Controller<S: Simulator> {
    label: &'static str,
    instance: Option<Instance<S>>,
    ticker: Option<Ticker>,
    is_visible: Box<dyn Fn() -> bool>,
}

impl<S: Simulator> Controller<S> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            instance: None,
            ticker: None,
            is_visible: Box::new(|| true),
        }
    }

    /// Polled before every pump; while it reports false nothing advances.
    pub fn with_visibility(mut self, is_visible: impl Fn() -> bool + 'static) -> Self {
        self.is_visible = Box::new(is_visible);
        self
    }

    pub fn state(&self) -> RunState {
        match &self.instance {
            None => RunState::Stopped,
            Some(i) if i.clock.is_paused() => RunState::Paused,
            Some(_) => RunState::Running,
        }
    }

    pub fn mount(&mut self, sim: S, opts: MountOptions) {
        if self.instance.is_some() {
            self.unmount();
        }
        let mut clock = sim.clock();
        clock.set_speed(opts.speed);
        clock.seek(opts.start_at);
        if !opts.autoplay {
            clock.pause();
        }
        let mut ticker = Ticker::new(sim.tick_mode());
        ticker.arm();
        debug!(view = self.label, autoplay = opts.autoplay, speed = clock.speed_factor(), "mount");
        self.ticker = Some(ticker);
        self.instance = Some(Instance { sim, clock });
    }

    /// Cancel the ticker first, then drop all simulation state.
    pub fn unmount(&mut self) {
        if let Some(t) = self.ticker.as_mut() {
            t.cancel();
        }
        if self.instance.take().is_some() {
            debug!(view = self.label, "unmount");
        }
    }

    pub fn pause(&mut self) {
        if let Some(i) = self.instance.as_mut() {
            i.clock.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some(i) = self.instance.as_mut() {
            i.clock.resume();
        }
        if let Some(t) = self.ticker.as_mut() {
            t.hold();
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state() {
            RunState::Running => self.pause(),
            RunState::Paused => self.resume(),
            RunState::Stopped => {}
        }
    }

    /// Clamped into the simulator's limits; applies from the next tick.
    pub fn set_speed(&mut self, v: f64) {
        if let Some(i) = self.instance.as_mut() {
            i.clock.set_speed(v);
        }
    }

    pub fn speed(&self) -> Option<f64> {
        self.instance.as_ref().map(|i| i.clock.speed_factor())
    }

    pub fn seek(&mut self, t: f64) {
        if let Some(i) = self.instance.as_mut() {
            i.clock.seek(t);
        }
    }

    pub fn sim(&self) -> Option<&S> {
        self.instance.as_ref().map(|i| &i.sim)
    }

    pub fn ticker_armed(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| t.is_armed())
    }

    pub fn frame(&self) -> Option<S::Frame> {
        self.instance.as_ref().map(|i| i.sim.frame(&i.clock))
    }

    /// Feed wall time from the frame loop. Returns the number of ticks applied.
    pub fn pump(&mut self, wall_dt: Duration) -> usize {
        let (Some(inst), Some(ticker)) = (self.instance.as_mut(), self.ticker.as_mut()) else {
            return 0;
        };
        if inst.clock.is_paused() || !(self.is_visible)() {
            ticker.hold();
            return 0;
        }
        let Instance { sim, clock } = inst;
        ticker.poll(wall_dt, |dt| {
            let sim_dt = clock.advance(dt);
            sim.advance(clock, sim_dt);
        })
    }
}
