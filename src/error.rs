//! Construction-time validation errors for the simulators.
//!
//! Steady-state ticking never fails; everything that could produce a NaN or an
//! infinity mid-frame is rejected here, once, when a simulator is built.

use thiserror::Error;

/// Result type alias for simulator construction
pub type Result<T> = std::result::Result<T, SimError>;

/// Configuration a simulator refuses to be built from
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Moon cycle length must be a finite positive number of days
    #[error("invalid cycle length {0}: must be finite and > 0")]
    InvalidCycleLength(f64),

    /// Orbital radius is zero, negative or not finite
    #[error("body '{name}': orbital radius {radius} must be finite and > 0")]
    InvalidRadius { name: String, radius: f64 },

    /// Angular speed or initial angle is NaN or infinite
    #[error("body '{name}': {field} must be finite, got {value}")]
    NonFinite {
        name: String,
        field: &'static str,
        value: f64,
    },

    /// Ellipse minor/major ratio is zero, negative or not finite
    #[error("ellipse ratio {0} must be finite and > 0")]
    InvalidEllipseRatio(f64),

    /// Empty body list
    #[error("orbit simulation needs at least one body")]
    NoBodies,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        assert!(SimError::InvalidCycleLength(-1.0).to_string().contains("-1"));
        let e = SimError::InvalidRadius {
            name: "Mars".into(),
            radius: 0.0,
        };
        assert!(e.to_string().starts_with("body 'Mars'"));
        let e = SimError::NonFinite {
            name: "Venus".into(),
            field: "angular_speed",
            value: f64::NAN,
        };
        assert!(e.to_string().contains("angular_speed must be finite, got NaN"));
        assert!(SimError::InvalidEllipseRatio(0.0).to_string().contains("ratio 0"));
        assert_eq!(
            SimError::NoBodies.to_string(),
            "orbit simulation needs at least one body"
        );
    }
}
