//! Orbit position resolvers.
//!
//! Each body gets its own [`OrbitModel`]; the tick driver only ever calls
//! `advance` and reads positions back, so adding a motion model never touches
//! the controller.

use crate::clock::{SimulationClock, SpeedLimits, TickMode};
use crate::controller::Simulator;
use crate::error::{Result, SimError};
use crate::model::{Body, BodyFrame, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_ELLIPSE_RATIO: f64 = 0.6;

pub trait OrbitModel: fmt::Debug {
    /// Move any internal accumulator forward by `dt` simulated time units.
    fn advance(&mut self, dt: f64);
    /// Angle in radians at clock time `elapsed`; not normalized.
    fn angle(&self, elapsed: f64) -> f64;
    /// Position in simulation units, x right and y down.
    fn position(&self, elapsed: f64) -> Vec2;
    /// Half-axes of the path ring. Display only.
    fn ring(&self) -> (f64, f64);
}

/// Uniform motion on a circle. Stateless: the angle is a function of the
/// clock's elapsed time, so seeking the clock moves the body.
#[derive(Clone, Debug)]
pub struct CircularUniform {
    radius: f64,
    angular_speed: f64,
    initial_angle: f64,
}

impl CircularUniform {
    pub fn new(body: &Body) -> Self {
        Self {
            radius: body.orbital_radius,
            angular_speed: body.angular_speed,
            initial_angle: body.initial_angle,
        }
    }
}

impl OrbitModel for CircularUniform {
    fn advance(&mut self, _dt: f64) {}
    fn angle(&self, elapsed: f64) -> f64 {
        self.angular_speed * elapsed + self.initial_angle
    }
    fn position(&self, elapsed: f64) -> Vec2 {
        let (s, c) = self.angle(elapsed).sin_cos();
        Vec2::new(self.radius * c, self.radius * s)
    }
    fn ring(&self) -> (f64, f64) {
        (self.radius, self.radius)
    }
}

/// Centered ellipse (not Keplerian, no focus offset). The angle is an
/// accumulator stepped by `angular_speed * dt`; trig is evaluated fresh each
/// time so only the angle itself carries rounding.
#[derive(Clone, Debug)]
pub struct EllipticalApprox {
    radius_x: f64,
    radius_y: f64,
    angular_speed: f64,
    angle: f64,
}

impl EllipticalApprox {
    pub fn new(body: &Body, ratio: f64) -> Self {
        Self {
            radius_x: body.orbital_radius,
            radius_y: body.orbital_radius * ratio,
            angular_speed: body.angular_speed,
            angle: body.initial_angle,
        }
    }
}

impl OrbitModel for EllipticalApprox {
    fn advance(&mut self, dt: f64) {
        self.angle += self.angular_speed * dt;
    }
    fn angle(&self, _elapsed: f64) -> f64 {
        self.angle
    }
    fn position(&self, _elapsed: f64) -> Vec2 {
        let (s, c) = self.angle.sin_cos();
        Vec2::new(self.radius_x * c, self.radius_y * s)
    }
    fn ring(&self) -> (f64, f64) {
        (self.radius_x, self.radius_y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrbitKind {
    Circular,
    Elliptical,
}

impl OrbitKind {
    pub fn label(self) -> &'static str {
        match self {
            OrbitKind::Circular => "circular",
            OrbitKind::Elliptical => "elliptical",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            OrbitKind::Circular => OrbitKind::Elliptical,
            OrbitKind::Elliptical => OrbitKind::Circular,
        }
    }

    fn build(self, body: &Body, ratio: f64) -> Box<dyn OrbitModel> {
        match self {
            OrbitKind::Circular => Box::new(CircularUniform::new(body)),
            OrbitKind::Elliptical => Box::new(EllipticalApprox::new(body, ratio)),
        }
    }
}

/// Bodies plus one motion model each. Owned by exactly one controller.
#[derive(Debug)]
pub struct OrbitSim {
    kind: OrbitKind,
    bodies: Vec<Body>,
    models: Vec<Box<dyn OrbitModel>>,
}

impl OrbitSim {
    pub fn new(kind: OrbitKind, bodies: Vec<Body>, ellipse_ratio: f64) -> Result<Self> {
        if bodies.is_empty() {
            return Err(SimError::NoBodies);
        }
        if !ellipse_ratio.is_finite() || ellipse_ratio <= 0.0 {
            return Err(SimError::InvalidEllipseRatio(ellipse_ratio));
        }
        for b in &bodies {
            b.validate()?;
        }
        let models = bodies.iter().map(|b| kind.build(b, ellipse_ratio)).collect();
        Ok(Self { kind, bodies, models })
    }

    pub fn kind(&self) -> OrbitKind {
        self.kind
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn rings(&self) -> Vec<(f64, f64)> {
        self.models.iter().map(|m| m.ring()).collect()
    }

    /// Largest half-axis over all rings; the renderer fits this to the view.
    pub fn extent(&self) -> f64 {
        self.rings()
            .into_iter()
            .map(|(rx, ry)| rx.max(ry))
            .fold(0.0, f64::max)
    }

    pub fn step(&mut self, dt: f64) {
        for m in &mut self.models {
            m.advance(dt);
        }
    }

    /// Body positions at clock time `elapsed`.
    pub fn frame_at(&self, elapsed: f64) -> Vec<BodyFrame> {
        self.bodies
            .iter()
            .zip(&self.models)
            .map(|(b, m)| BodyFrame {
                name: b.name.clone(),
                angle: m.angle(elapsed),
                position: m.position(elapsed),
            })
            .collect()
    }
}

impl Simulator for OrbitSim {
    type Frame = Vec<BodyFrame>;

    fn tick_mode(&self) -> TickMode {
        TickMode::ORBIT
    }

    fn clock(&self) -> SimulationClock {
        SimulationClock::new(SpeedLimits::ORBIT, 1.0)
    }

    fn advance(&mut self, _clock: &SimulationClock, sim_dt: f64) {
        self.step(sim_dt);
    }

    fn frame(&self, clock: &SimulationClock) -> Vec<BodyFrame> {
        self.frame_at(clock.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Controller, MountOptions};
    use crate::model::{default_elliptical_bodies, Rgb};
    use std::f64::consts::PI;

    fn unit_body() -> Body {
        Body::new("Unit", 1.0, 2.0 * PI, Rgb::new(255, 255, 255), 1.0)
    }

    #[test]
    fn quarter_revolution_lands_on_positive_y() {
        let sim = OrbitSim::new(OrbitKind::Circular, vec![unit_body()], 1.0).unwrap();
        let p = sim.frame_at(0.25)[0].position;
        assert!(p.x.abs() < 1e-12, "x = {}", p.x);
        assert!((p.y - 1.0).abs() < 1e-12, "y = {}", p.y);
    }

    #[test]
    fn circular_follows_the_clock_through_seek() {
        let sim = OrbitSim::new(OrbitKind::Circular, vec![unit_body()], 1.0).unwrap();
        let mut c = Controller::new("orbit");
        c.mount(sim, MountOptions::default());
        c.seek(0.25);
        let p = c.frame().unwrap()[0].position;
        assert!(p.x.abs() < 1e-12 && (p.y - 1.0).abs() < 1e-12, "{p:?}");
        c.seek(0.0);
        assert_eq!(c.frame().unwrap()[0].angle, 0.0);
    }

    #[test]
    fn angles_strictly_increase() {
        let mut sim =
            OrbitSim::new(OrbitKind::Elliptical, default_elliptical_bodies(), DEFAULT_ELLIPSE_RATIO)
                .unwrap();
        let mut t = 0.0;
        let mut last: Vec<f64> = sim.frame_at(t).iter().map(|f| f.angle).collect();
        for _ in 0..50 {
            sim.step(1.0 / 60.0);
            t += 1.0 / 60.0;
            let now: Vec<f64> = sim.frame_at(t).iter().map(|f| f.angle).collect();
            for (a, b) in last.iter().zip(&now) {
                assert!(b > a);
            }
            last = now;
        }
    }

    #[test]
    fn ellipse_uses_separate_radii() {
        let body = unit_body().with_initial_angle(PI / 2.0);
        let sim = OrbitSim::new(OrbitKind::Elliptical, vec![body], 0.5).unwrap();
        let p = sim.frame_at(0.0)[0].position;
        assert!((p.y - 0.5).abs() < 1e-12);
        assert_eq!(sim.rings(), vec![(1.0, 0.5)]);
        assert_eq!(sim.extent(), 1.0);
    }

    #[test]
    fn elliptical_step_is_frame_rate_independent() {
        let body = default_elliptical_bodies().remove(0);
        let mut fast = OrbitSim::new(OrbitKind::Elliptical, vec![body.clone()], 0.6).unwrap();
        let mut slow = OrbitSim::new(OrbitKind::Elliptical, vec![body], 0.6).unwrap();
        for _ in 0..120 {
            fast.step(1.0 / 120.0);
        }
        for _ in 0..30 {
            slow.step(1.0 / 30.0);
        }
        assert!((fast.frame_at(1.0)[0].angle - slow.frame_at(1.0)[0].angle).abs() < 1e-9);
    }

    #[test]
    fn construction_rejects_bad_config() {
        assert_eq!(
            OrbitSim::new(OrbitKind::Circular, vec![], 1.0).unwrap_err(),
            SimError::NoBodies
        );
        assert!(matches!(
            OrbitSim::new(OrbitKind::Elliptical, vec![unit_body()], 0.0),
            Err(SimError::InvalidEllipseRatio(_))
        ));
        let mut flat = unit_body();
        flat.orbital_radius = -1.0;
        assert!(matches!(
            OrbitSim::new(OrbitKind::Circular, vec![flat], 1.0),
            Err(SimError::InvalidRadius { .. })
        ));
    }

    #[test]
    fn kind_toggles() {
        assert_eq!(OrbitKind::Circular.toggled(), OrbitKind::Elliptical);
        assert_eq!(OrbitKind::Elliptical.toggled(), OrbitKind::Circular);
    }
}
