//! # Path control module
//!
//! Path control drives the robot from the start point towards the end point
//! and decides when the run is complete.
//!
//! The path is the straight line from the robot's current position to the end
//! point, re-evaluated every tick. The heading error is the signed angle from
//! the robot's heading to the direction of that line. A controller turns the
//! heading error into a turn rate, which is combined with the forward speed to
//! produce wheel speed demands. Two steering policies are available:
//!
//! - `Proportional`: turn and drive at the same time. The forward step is
//!   shortened so that it never overshoots the end point and every step
//!   brings the robot closer to it.
//! - `TurnThenDrive`: turn on the spot until aligned with the path, then drive
//!   straight.
//!
//! The run is complete once the robot is within the arrival tolerance of the
//! end point.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use controllers::*;
pub use params::{Params, SteerPolicy};
pub use state::*;
