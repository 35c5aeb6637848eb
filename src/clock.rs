//! Simulated time.
//!
//! [`SimulationClock`] owns the elapsed simulated time and the speed/pause
//! controls. [`Ticker`] turns wall-clock time from the frame loop into discrete
//! ticks, either on a fixed timer or once per rendered frame.

use std::time::Duration;

/// Upper bound on fixed-interval ticks fired by a single poll.
pub const MAX_CATCH_UP: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedLimits {
    pub min: f64,
    pub max: f64,
}

impl SpeedLimits {
    pub const MOON: SpeedLimits = SpeedLimits { min: 0.5, max: 3.0 };
    pub const ORBIT: SpeedLimits = SpeedLimits { min: 0.5, max: 5.0 };

    /// Out-of-range input is clamped, never rejected. NaN lands on `min`.
    pub fn clamp(&self, v: f64) -> f64 {
        if v.is_nan() {
            return self.min;
        }
        v.clamp(self.min, self.max)
    }
}

#[derive(Clone, Debug)]
pub struct SimulationClock {
    elapsed: f64,
    speed_factor: f64,
    paused: bool,
    limits: SpeedLimits,
    wrap: Option<f64>,
}

impl SimulationClock {
    pub fn new(limits: SpeedLimits, speed: f64) -> Self {
        Self {
            elapsed: 0.0,
            speed_factor: limits.clamp(speed),
            paused: false,
            limits,
            wrap: None,
        }
    }

    /// Keep `elapsed` inside `[0, period)`; used for "day within cycle" clocks.
    pub fn wrapping(mut self, period: Option<f64>) -> Self {
        self.wrap = period.filter(|p| p.is_finite() && *p > 0.0);
        self.elapsed = self.wrapped(self.elapsed);
        self
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }
    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn set_speed(&mut self, v: f64) {
        self.speed_factor = self.limits.clamp(v);
    }

    /// Explicit external reset. The only way `elapsed` moves backwards.
    pub fn seek(&mut self, t: f64) {
        let t = if t.is_finite() { t.max(0.0) } else { 0.0 };
        self.elapsed = self.wrapped(t);
    }

    /// Advance by one tick worth of wall time. Returns the simulated delta
    /// actually applied (zero while paused).
    pub fn advance(&mut self, dt_wall: f64) -> f64 {
        if self.paused || !dt_wall.is_finite() || dt_wall <= 0.0 {
            return 0.0;
        }
        let sim_dt = dt_wall * self.speed_factor;
        self.elapsed = self.wrapped(self.elapsed + sim_dt);
        sim_dt
    }

    fn wrapped(&self, t: f64) -> f64 {
        match self.wrap {
            Some(p) => t.rem_euclid(p),
            None => t,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickMode {
    /// Timer-driven: every `interval` of wall time advances by the constant `step`.
    Fixed { interval: Duration, step: f64 },
    /// Frame-driven: each frame advances by the measured delta in seconds, capped.
    Frame { max_dt: f64 },
}

impl TickMode {
    /// 150 ms timer, half a day per tick.
    pub const MOON: TickMode = TickMode::Fixed {
        interval: Duration::from_millis(150),
        step: 0.5,
    };
    pub const ORBIT: TickMode = TickMode::Frame { max_dt: 0.05 };
}

#[derive(Clone, Debug)]
pub struct Ticker {
    mode: TickMode,
    accum: Duration,
    armed: bool,
}

impl Ticker {
    /// Starts disarmed; nothing fires until [`Ticker::arm`].
    pub fn new(mode: TickMode) -> Self {
        Self {
            mode,
            accum: Duration::ZERO,
            armed: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn arm(&mut self) {
        self.armed = true;
        self.accum = Duration::ZERO;
    }

    /// Disarm and drop any pending partial interval.
    pub fn cancel(&mut self) {
        self.armed = false;
        self.accum = Duration::ZERO;
    }

    /// Forget time that passed while the owner was suspended.
    pub fn hold(&mut self) {
        self.accum = Duration::ZERO;
    }

    /// Feed wall time; `on_tick` receives the per-tick dt. Returns ticks fired.
    pub fn poll(&mut self, wall_dt: Duration, mut on_tick: impl FnMut(f64)) -> usize {
        if !self.armed {
            return 0;
        }
        match self.mode {
            TickMode::Fixed { interval, step } => {
                if interval.is_zero() {
                    return 0;
                }
                self.accum = self.accum.saturating_add(wall_dt);
                let mut fired = 0;
                while self.accum >= interval {
                    self.accum -= interval;
                    on_tick(step);
                    fired += 1;
                    if fired >= MAX_CATCH_UP {
                        self.accum = Duration::ZERO;
                        break;
                    }
                }
                fired
            }
            TickMode::Frame { max_dt } => {
                let dt = wall_dt.as_secs_f64().min(max_dt);
                if dt <= 0.0 {
                    return 0;
                }
                on_tick(dt);
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_scales_by_speed() {
        let mut c = SimulationClock::new(SpeedLimits::ORBIT, 2.0);
        let d = c.advance(0.25);
        assert_eq!(d, 0.5);
        assert_eq!(c.elapsed(), 0.5);
    }

    #[test]
    fn paused_clock_does_not_move() {
        let mut c = SimulationClock::new(SpeedLimits::ORBIT, 1.0);
        c.advance(1.0);
        c.pause();
        for _ in 0..10 {
            assert_eq!(c.advance(0.1), 0.0);
        }
        assert_eq!(c.elapsed(), 1.0);
        c.resume();
        c.advance(1.0);
        assert_eq!(c.elapsed(), 2.0);
    }

    #[test]
    fn speed_is_clamped_not_rejected() {
        let mut c = SimulationClock::new(SpeedLimits::MOON, 1.0);
        c.set_speed(0.0);
        assert_eq!(c.speed_factor(), 0.5);
        c.set_speed(-3.0);
        assert_eq!(c.speed_factor(), 0.5);
        c.set_speed(f64::NAN);
        assert_eq!(c.speed_factor(), 0.5);
        c.set_speed(10.0);
        assert_eq!(c.speed_factor(), 3.0);

        // negative speed still moves time forward
        c.set_speed(-1.0);
        let before = c.elapsed();
        c.advance(1.0);
        assert!(c.elapsed() > before);
    }

    #[test]
    fn wrapping_clock_stays_in_cycle() {
        let mut c = SimulationClock::new(SpeedLimits::MOON, 1.0).wrapping(Some(29.5));
        c.seek(29.0);
        c.advance(1.0);
        assert!((c.elapsed() - 0.5).abs() < 1e-9);
        c.seek(59.5);
        assert!((c.elapsed() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn non_positive_wrap_is_ignored() {
        let mut c = SimulationClock::new(SpeedLimits::MOON, 1.0).wrapping(Some(0.0));
        c.seek(100.0);
        assert_eq!(c.elapsed(), 100.0);
    }

    #[test]
    fn fixed_ticker_ignores_wall_drift() {
        let mut t = Ticker::new(TickMode::MOON);
        t.arm();
        let mut steps = Vec::new();
        assert_eq!(t.poll(Duration::from_millis(100), |dt| steps.push(dt)), 0);
        assert_eq!(t.poll(Duration::from_millis(100), |dt| steps.push(dt)), 1);
        assert_eq!(t.poll(Duration::from_millis(310), |dt| steps.push(dt)), 2);
        assert_eq!(steps, vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn fixed_ticker_caps_catch_up() {
        let mut t = Ticker::new(TickMode::MOON);
        t.arm();
        let n = t.poll(Duration::from_secs(60), |_| {});
        assert_eq!(n, MAX_CATCH_UP);
        // backlog is dropped, not replayed
        assert_eq!(t.poll(Duration::from_millis(10), |_| {}), 0);
    }

    #[test]
    fn frame_ticker_caps_dt() {
        let mut t = Ticker::new(TickMode::ORBIT);
        t.arm();
        let mut got = 0.0;
        t.poll(Duration::from_secs(2), |dt| got = dt);
        assert_eq!(got, 0.05);
        t.poll(Duration::from_millis(16), |dt| got = dt);
        assert!((got - 0.016).abs() < 1e-9);
    }

    #[test]
    fn cancelled_ticker_never_fires() {
        let mut t = Ticker::new(TickMode::MOON);
        t.arm();
        t.poll(Duration::from_millis(149), |_| {});
        t.cancel();
        let mut fired = 0;
        for _ in 0..20 {
            fired += t.poll(Duration::from_millis(150), |_| {});
        }
        assert_eq!(fired, 0);
        assert!(!t.is_armed());
    }
}
