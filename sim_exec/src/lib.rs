//! # Simulator library.
//!
//! The kinematic robot simulation engine. The executable drives it from
//! scenario scripts, other front ends (such as a graphical field view) use the
//! same [`sim::Simulation`] interface.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Simulation commands - the scriptable form of the user's actions
pub mod cmd;

/// Geometry utilities - angles, frames and intersection tests
pub mod geom;

/// Localisation module - the robot pose and the kinematic model that advances it
pub mod loc;

/// Obstacle field - the static line segments the sensors measure
pub mod obstacle;

/// Simulation parameters
pub mod params;

/// Path control module - drives the robot from the start point to the end point
pub mod path_ctrl;

/// Trajectory and point cloud logs
pub mod record;

/// The robot - wheels, body geometry and the current run
pub mod robot;

/// Range sensor array
pub mod sensor;

/// The simulation session, ties everything together tick by tick
pub mod sim;
