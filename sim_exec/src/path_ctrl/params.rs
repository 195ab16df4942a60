//! Path control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_8};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for path control
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Params {

    /// Steering policy used while moving
    pub steer_policy: SteerPolicy,

    /// Heading controller proportional gain
    pub head_k_p: f64,

    /// Heading controller integral gain
    pub head_k_i: f64,

    /// Heading controller derivative gain
    pub head_k_d: f64,

    /// Limit on the magnitude of the turn rate demand.
    ///
    /// Units: radians per unit time
    pub max_turn_rate_rads: f64,

    /// The run is complete once the distance to the end point is below this.
    pub arrival_tolerance: f64,

    /// Above this heading error the robot stops and turns on the spot rather
    /// than driving.
    pub head_adjust_threshold_rad: f64,

    /// `TurnThenDrive` only: heading error under which the robot is
    /// considered aligned and starts to drive.
    pub align_threshold_rad: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SteerPolicy {
    Proportional,
    TurnThenDrive
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SteerPolicy {
    fn default() -> Self {
        SteerPolicy::Proportional
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            steer_policy: SteerPolicy::default(),
            head_k_p: 0.5,
            head_k_i: 0.0,
            head_k_d: 0.0,
            max_turn_rate_rads: FRAC_PI_8,
            arrival_tolerance: 0.5,
            head_adjust_threshold_rad: FRAC_PI_2,
            align_threshold_rad: 0.01
        }
    }
}

impl Params {
    /// Check every value is usable, returning a description of the first one
    /// that isn't.
    pub fn check(&self) -> Result<(), String> {
        let positive = [
            ("max_turn_rate_rads", self.max_turn_rate_rads),
            ("arrival_tolerance", self.arrival_tolerance),
            ("head_adjust_threshold_rad", self.head_adjust_threshold_rad),
            ("align_threshold_rad", self.align_threshold_rad),
        ];

        for (name, value) in positive.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(format!("{} must be finite and positive, got {}", name, value))
            }
        }

        let gains = [
            ("head_k_p", self.head_k_p),
            ("head_k_i", self.head_k_i),
            ("head_k_d", self.head_k_d),
        ];

        for (name, value) in gains.iter() {
            if !value.is_finite() {
                return Err(format!("{} must be finite, got {}", name, value))
            }
        }

        Ok(())
    }
}
