//! # Differential drive kinematics
//!
//! Converts between wheel speeds and body motion for a robot with two drive
//! wheels mounted either side of its centre.
//!
//! Speeds are in field units per unit time, the tick length `dt` is in the
//! same time unit. The robot's wheels sit on its perimeter so the wheel
//! separation is twice the body radius.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::Serialize;

use super::Pose;
use crate::geom::GEOM_EPSILON;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wheel speed demands for the left and right drive wheels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct WheelDems {
    pub left: f64,
    pub right: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelDems {
    /// Demands that bring the robot to a stop.
    pub fn stop() -> Self {
        Self::default()
    }

    /// Forward speed of the body centre.
    pub fn forward_speed(&self) -> f64 {
        0.5 * (self.left + self.right)
    }

    /// Turn rate of the body (CCW positive) for the given wheel separation.
    ///
    /// A separation of zero can't produce a turn, so the rate is zero.
    pub fn turn_rate(&self, wheel_separation: f64) -> f64 {
        if wheel_separation.abs() < GEOM_EPSILON {
            0.0
        }
        else {
            (self.right - self.left) / wheel_separation
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the wheel speeds that realise a body speed and turn rate.
///
/// This is the inverse of [`WheelDems::forward_speed`] and
/// [`WheelDems::turn_rate`].
pub fn skid_steer(speed: f64, turn_rate: f64, wheel_separation: f64) -> WheelDems {
    let half_diff = 0.5 * turn_rate * wheel_separation;

    WheelDems {
        left: speed - half_diff,
        right: speed + half_diff
    }
}

/// Integrate the pose forward by one tick.
///
/// The body moves along the heading held at the start of the tick by the mean
/// wheel speed, then the heading advances by the turn rate. Equal wheel
/// speeds therefore never change the heading.
pub fn integrate(
    pose: &Pose,
    left_speed: f64,
    right_speed: f64,
    wheel_separation: f64,
    dt: f64
) -> Pose {
    let dems = WheelDems { left: left_speed, right: right_speed };

    let speed = dems.forward_speed();
    let turn_rate = dems.turn_rate(wheel_separation);

    let position = pose.position + pose.forward2() * speed * dt;

    let mut new_pose = Pose::new(position, pose.get_heading());
    if turn_rate != 0.0 {
        new_pose.set_heading(pose.get_heading() + turn_rate * dt);
    }

    trace!(
        "Integrated pose: speed {:.4}, turn rate {:.4} -> ({:.3}, {:.3}) @ {:.4} rad",
        speed, turn_rate, new_pose.position[0], new_pose.position[1], new_pose.get_heading()
    );

    new_pose
}
