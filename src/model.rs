use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// -------------------- Shared math --------------------
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

// -------------------- Bodies --------------------

/// A simulated celestial object. Immutable once handed to a simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub name: String,
    /// Arbitrary simulation units; the display scale never touches this.
    pub orbital_radius: f64,
    /// Radians per simulated time unit.
    pub angular_speed: f64,
    #[serde(default)]
    pub initial_angle: f64,
    pub color: Rgb,
    pub size: f32,
}

impl Body {
    pub fn new(name: &str, orbital_radius: f64, angular_speed: f64, color: Rgb, size: f32) -> Self {
        Self {
            name: name.to_string(),
            orbital_radius,
            angular_speed,
            initial_angle: 0.0,
            color,
            size,
        }
    }

    pub fn with_initial_angle(mut self, angle: f64) -> Self {
        self.initial_angle = angle;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.orbital_radius.is_finite() || self.orbital_radius <= 0.0 {
            return Err(SimError::InvalidRadius {
                name: self.name.clone(),
                radius: self.orbital_radius,
            });
        }
        for (field, value) in [
            ("angular_speed", self.angular_speed),
            ("initial_angle", self.initial_angle),
        ] {
            if !value.is_finite() {
                return Err(SimError::NonFinite {
                    name: self.name.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Revolutions every `20 / speed` seconds, the pacing of the circular view.
fn circular_rate(speed: f64) -> f64 {
    2.0 * PI * speed / 20.0
}

/// Inner planets on uniform circles, seconds as the time unit.
pub fn default_circular_bodies() -> Vec<Body> {
    vec![
        Body::new("Mercury", 0.4, circular_rate(4.15), Rgb::new(169, 169, 169), 12.0),
        Body::new("Venus", 0.7, circular_rate(1.62), Rgb::new(245, 222, 179), 10.0),
        Body::new("Earth", 1.0, circular_rate(1.0), Rgb::new(65, 105, 225), 8.0),
        Body::new("Mars", 1.5, circular_rate(0.53), Rgb::new(205, 92, 92), 8.0),
    ]
}

/// Per-frame increments of the elliptical view, expressed per second at this rate.
pub const REFERENCE_FPS: f64 = 60.0;

/// All eight planets on centered ellipses. Speeds are per-frame steps at
/// [`REFERENCE_FPS`] converted to radians per second.
pub fn default_elliptical_bodies() -> Vec<Body> {
    let b = |name: &str, distance: f64, size: f32, color: Rgb, per_frame: f64, angle: f64| {
        Body::new(name, distance * 3.0, per_frame * REFERENCE_FPS, color, size).with_initial_angle(angle)
    };
    vec![
        b("Mercury", 0.12, 4.0, Rgb::new(169, 169, 169), 0.04, 0.0),
        b("Venus", 0.16, 6.0, Rgb::new(245, 222, 179), 0.015, PI / 3.0),
        b("Earth", 0.22, 6.5, Rgb::new(65, 105, 225), 0.01, PI / 2.0),
        b("Mars", 0.28, 5.0, Rgb::new(205, 92, 92), 0.008, PI),
        b("Jupiter", 0.36, 12.0, Rgb::new(222, 184, 135), 0.002, PI * 1.5),
        b("Saturn", 0.45, 10.0, Rgb::new(240, 230, 140), 0.0009, PI * 0.8),
        b("Uranus", 0.52, 8.0, Rgb::new(135, 206, 235), 0.0004, PI * 1.2),
        b("Neptune", 0.58, 8.0, Rgb::new(30, 144, 255), 0.0001, PI * 0.5),
    ]
}

// -------------------- Frames --------------------

/// One body's renderable state for a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyFrame {
    pub name: String,
    pub angle: f64,
    /// Simulation units, x right and y down.
    pub position: Vec2,
}

/// Where the terminator band sits across the disc.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowGeometry {
    /// Left edge of the half-disc-wide shadow as a fraction of the disc width, 0..=1.
    pub offset: f64,
    /// First half of the cycle; the offset runs right-to-left while waxing
    /// and left-to-right while waning.
    pub waxing: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MoonFrame {
    pub cycle_day: f64,
    pub cycle_length: f64,
    pub illumination_percent: f64,
    pub phase_index: u8,
    pub phase_name: &'static str,
    pub shadow: ShadowGeometry,
}

impl MoonFrame {
    /// "Day N of L" label; the day is floored, never rounded.
    pub fn day_label(&self) -> String {
        format!("Day {} of {}", self.cycle_day.floor() as i64, self.cycle_length)
    }
}

// -------------------- Phase table --------------------

#[derive(Clone, Copy, Debug)]
pub struct PhaseInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Cyclic order is fixed: index 0 is new, 4 is full.
pub const PHASES: [PhaseInfo; 8] = [
    PhaseInfo {
        name: "New Moon",
        description: "The Moon sits between the Earth and Sun with its dark side facing us. It is not visible in the night sky.",
    },
    PhaseInfo {
        name: "Waxing Crescent",
        description: "A thin crescent becomes visible. The right side is lit in the Northern Hemisphere.",
    },
    PhaseInfo {
        name: "First Quarter",
        description: "Half the disc is lit on the right. It rises at noon and sets at midnight.",
    },
    PhaseInfo {
        name: "Waxing Gibbous",
        description: "Most of the disc is lit with a sliver of the left side dark. It sets before dawn.",
    },
    PhaseInfo {
        name: "Full Moon",
        description: "The whole face is lit. It rises at sunset and sets at sunrise.",
    },
    PhaseInfo {
        name: "Waning Gibbous",
        description: "Most of the disc is lit with a sliver of the right side dark. It rises after sunset.",
    },
    PhaseInfo {
        name: "Last Quarter",
        description: "Half the disc is lit on the left. It rises at midnight and sets at noon.",
    },
    PhaseInfo {
        name: "Waning Crescent",
        description: "A thin crescent remains on the left before the cycle starts over.",
    },
];

pub fn phase_info(index: u8) -> &'static PhaseInfo {
    &PHASES[(index & 7) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sets_validate() {
        for b in default_circular_bodies().iter().chain(default_elliptical_bodies().iter()) {
            b.validate().unwrap();
        }
    }

    #[test]
    fn zero_radius_is_rejected() {
        let b = Body::new("Nowhere", 0.0, 1.0, Rgb::new(0, 0, 0), 1.0);
        assert!(matches!(b.validate(), Err(SimError::InvalidRadius { .. })));
    }

    #[test]
    fn nan_speed_is_rejected() {
        let b = Body::new("Drift", 1.0, f64::NAN, Rgb::new(0, 0, 0), 1.0);
        assert!(matches!(
            b.validate(),
            Err(SimError::NonFinite { field: "angular_speed", .. })
        ));
    }

    #[test]
    fn phase_order_is_fixed() {
        let names: Vec<_> = PHASES.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            [
                "New Moon",
                "Waxing Crescent",
                "First Quarter",
                "Waxing Gibbous",
                "Full Moon",
                "Waning Gibbous",
                "Last Quarter",
                "Waning Crescent"
            ]
        );
        assert_eq!(phase_info(12).name, "Full Moon");
    }

    #[test]
    fn day_label_floors() {
        let f = MoonFrame {
            cycle_day: 7.9,
            cycle_length: 29.5,
            illumination_percent: 0.0,
            phase_index: 0,
            phase_name: "New Moon",
            shadow: ShadowGeometry { offset: 1.0, waxing: true },
        };
        assert_eq!(f.day_label(), "Day 7 of 29.5");
    }
}
