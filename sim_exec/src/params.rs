//! # Simulation parameters
//!
//! The immutable configuration a simulation is created from, normally loaded
//! from `sim.toml` in the parameters directory. Every field has a default so
//! partial files are accepted.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::{geom::Segment, path_ctrl, robot::MAX_SENSOR_COUNT};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SimParams {

    /// Width and height of the field
    pub field_size: [f64; 2],

    /// Initial position of the robot, the centre of the field if not given
    pub initial_position: Option<[f64; 2]>,

    /// Initial heading of the robot in the display convention (degrees,
    /// inverted sign)
    pub initial_heading_deg: f64,

    /// Initial body radius of the robot
    pub robot_radius: f64,

    /// Initial number of range sensors
    pub sensor_count: usize,

    /// Range limit of the sensors, unlimited if not given
    pub sensor_max_range: Option<f64>,

    /// If true the edges of the field are added as obstacles
    pub enclose_field: bool,

    /// Line segment obstacles in field coordinates
    pub obstacles: Vec<Segment>,

    /// Path control parameters
    pub path_ctrl: path_ctrl::Params
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("Field size must be finite and positive, got {0:?}")]
    InvalidFieldSize([f64; 2]),

    #[error("Initial position ({0}, {1}) is outside the field")]
    InitialPositionOutsideField(f64, f64),

    #[error("Initial heading must be finite, got {0}")]
    InvalidHeading(f64),

    #[error("Robot radius must be finite and positive, got {0}")]
    InvalidRadius(f64),

    #[error("Sensor count must be between 0 and {}, got {0}", MAX_SENSOR_COUNT)]
    InvalidSensorCount(usize),

    #[error("Sensor max range must be finite and positive, got {0}")]
    InvalidSensorRange(f64),

    #[error("Obstacle {0} has non-finite coordinates")]
    InvalidObstacle(usize),

    #[error("Invalid path control parameters: {0}")]
    InvalidPathCtrlParams(String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            field_size: [800.0, 600.0],
            initial_position: None,
            initial_heading_deg: 0.0,
            robot_radius: 10.0,
            sensor_count: 8,
            sensor_max_range: None,
            enclose_field: false,
            obstacles: Vec::new(),
            path_ctrl: path_ctrl::Params::default()
        }
    }
}

impl SimParams {
    pub fn field_size(&self) -> Vector2<f64> {
        Vector2::new(self.field_size[0], self.field_size[1])
    }

    /// Starting position of the robot.
    pub fn initial_position(&self) -> Point2<f64> {
        match self.initial_position {
            Some([x, y]) => Point2::new(x, y),
            None => Point2::new(0.5 * self.field_size[0], 0.5 * self.field_size[1])
        }
    }

    /// True if the point lies inside the field, edges included.
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        point[0].is_finite()
            && point[1].is_finite()
            && point[0] >= 0.0
            && point[1] >= 0.0
            && point[0] <= self.field_size[0]
            && point[1] <= self.field_size[1]
    }

    /// Check the parameters describe a valid simulation.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let [w, h] = self.field_size;
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(ParamsError::InvalidFieldSize(self.field_size))
        }

        let p = self.initial_position();
        if !self.contains(&p) {
            return Err(ParamsError::InitialPositionOutsideField(p[0], p[1]))
        }

        if !self.initial_heading_deg.is_finite() {
            return Err(ParamsError::InvalidHeading(self.initial_heading_deg))
        }

        if !(self.robot_radius.is_finite() && self.robot_radius > 0.0) {
            return Err(ParamsError::InvalidRadius(self.robot_radius))
        }

        if self.sensor_count > MAX_SENSOR_COUNT {
            return Err(ParamsError::InvalidSensorCount(self.sensor_count))
        }

        if let Some(r) = self.sensor_max_range {
            if !(r.is_finite() && r > 0.0) {
                return Err(ParamsError::InvalidSensorRange(r))
            }
        }

        for (i, o) in self.obstacles.iter().enumerate() {
            let finite = o.start.coords.iter().chain(o.end.coords.iter()).all(|c| c.is_finite());
            if !finite {
                return Err(ParamsError::InvalidObstacle(i))
            }
        }

        self.path_ctrl
            .check()
            .map_err(ParamsError::InvalidPathCtrlParams)
    }
}
