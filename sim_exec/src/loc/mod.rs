//! # Localisation module
//!
//! Provides the pose of the robot and the kinematic model used to advance it.
//! The simulator is the source of truth for the pose, there is no estimation
//! involved.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod kinematics;
pub use kinematics::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Point2, Vector2};
use serde::Serialize;

use crate::geom;
use util::maths::wrap_2pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and heading) of the robot.
///
/// Position is in the field frame. Heading is measured in the engine frame
/// (see [`crate::geom`]) and is always kept in the range [0, 2pi).
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Pose {
    /// The position in the field frame
    pub position: Point2<f64>,

    /// Heading in radians, CCW positive, [0, 2pi)
    heading_rad: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Point2::origin(),
            heading_rad: 0.0
        }
    }
}

impl Pose {
    pub fn new(position: Point2<f64>, heading_rad: f64) -> Self {
        Self {
            position,
            heading_rad: wrap_2pi(heading_rad)
        }
    }

    /// Return the heading of the robot in radians, in the range [0, 2pi).
    pub fn get_heading(&self) -> f64 {
        self.heading_rad
    }

    /// Set the heading, normalising it into [0, 2pi).
    pub fn set_heading(&mut self, heading_rad: f64) {
        self.heading_rad = wrap_2pi(heading_rad);
    }

    /// Heading in the display convention (degrees, inverted sign).
    pub fn heading_display_deg(&self) -> f64 {
        geom::heading_to_display_deg(self.heading_rad)
    }

    /// Unit vector in the field frame pointing along the robot's heading.
    pub fn forward2(&self) -> Vector2<f64> {
        geom::field_direction(self.heading_rad)
    }
}
