//! # Sensor array
//!
//! A ring of range sensors mounted radially on the robot body. Each sensor
//! keeps a fixed chassis-relative mounting angle, its world direction is
//! derived from the current heading on every scan.
//!
//! Rays are cast from the perimeter of the body rather than its centre, so the
//! reported distances are clearances from the robot's edge.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{Point2, Vector2};
use serde::Serialize;
use std::f64::consts::TAU;

// Internal
use crate::{
    geom::{self, Intersection},
    loc::Pose,
    obstacle::ObstacleField
};
use util::maths::wrap_2pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single range sensor.
#[derive(Debug, Clone, Serialize)]
pub struct Sensor {
    id: u8,

    /// Mounting angle in the chassis frame. Not wrapped, combining with the
    /// heading is what brings it into [0, 2pi).
    chassis_angle_rad: f64,

    /// Ray origin on the body perimeter, field frame
    origin: Point2<f64>,

    /// World frame angle of the ray (engine convention)
    world_angle_rad: f64,

    /// Result of the last scan
    reading: SensorReading
}

/// The set of sensors owned by one robot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SensorArray {
    sensors: Vec<Sensor>,

    /// Hits further away than this are ignored, `None` is unlimited.
    max_range: Option<f64>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The outcome of a single sensor measurement.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub enum SensorReading {
    NoHit,
    Hit {
        /// Field frame hit point
        point: Point2<f64>,

        /// Distance from the ray origin on the perimeter
        distance: f64
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SensorReading {
    fn default() -> Self {
        SensorReading::NoHit
    }
}

impl From<Option<Intersection>> for SensorReading {
    fn from(i: Option<Intersection>) -> Self {
        match i {
            Some(i) => SensorReading::Hit {
                point: i.point,
                distance: i.distance
            },
            None => SensorReading::NoHit
        }
    }
}

impl SensorReading {
    pub fn is_hit(&self) -> bool {
        matches!(self, SensorReading::Hit { .. })
    }

    pub fn point(&self) -> Option<Point2<f64>> {
        match self {
            SensorReading::Hit { point, .. } => Some(*point),
            SensorReading::NoHit => None
        }
    }

    pub fn distance(&self) -> Option<f64> {
        match self {
            SensorReading::Hit { distance, .. } => Some(*distance),
            SensorReading::NoHit => None
        }
    }
}

impl Sensor {
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Mounting angle in the chassis frame.
    pub fn chassis_angle(&self) -> f64 {
        self.chassis_angle_rad
    }

    /// Angle of the ray in the engine frame as of the last transform.
    pub fn world_angle(&self) -> f64 {
        self.world_angle_rad
    }

    /// Direction of the ray in the field frame.
    pub fn direction(&self) -> Vector2<f64> {
        geom::field_direction(self.world_angle_rad)
    }

    pub fn origin(&self) -> Point2<f64> {
        self.origin
    }

    pub fn reading(&self) -> SensorReading {
        self.reading
    }

    /// Update the origin and direction of the ray for the given pose.
    fn transform(&mut self, pose: &Pose, radius: f64) {
        self.world_angle_rad = wrap_2pi(self.chassis_angle_rad + pose.get_heading());
        self.origin = pose.position + self.direction() * radius;
    }
}

impl SensorArray {
    /// Create a new array of `count` sensors for a robot with the given
    /// heading.
    pub fn new(count: u8, heading_rad: f64, max_range: Option<f64>) -> Self {
        let mut array = Self {
            sensors: Vec::new(),
            max_range
        };
        array.configure(count, heading_rad);
        array
    }

    /// Discard all sensors and build `count` new ones.
    ///
    /// Sensor `i` is mounted at `i * 2pi/count - heading_rad`, so at the
    /// moment of configuration sensor 0 points along the world X axis.
    pub fn configure(&mut self, count: u8, heading_rad: f64) {
        let step = TAU / f64::from(count.max(1));

        let mut sensors = Vec::with_capacity(count as usize);
        for id in 0..count {
            sensors.push(Sensor {
                id,
                chassis_angle_rad: f64::from(id) * step - heading_rad,
                origin: Point2::origin(),
                world_angle_rad: 0.0,
                reading: SensorReading::NoHit
            });
        }

        self.sensors = sensors;
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.iter()
    }

    pub fn as_slice(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn max_range(&self) -> Option<f64> {
        self.max_range
    }

    /// Recompute every sensor's ray for the given pose without measuring.
    pub fn transform(&mut self, pose: &Pose, radius: f64) {
        for s in self.sensors.iter_mut() {
            s.transform(pose, radius);
        }
    }

    /// Measure the distance to the nearest obstacle for every sensor.
    ///
    /// Returns the hit points, in sensor order, so they can be appended to a
    /// point cloud.
    pub fn scan(
        &mut self,
        pose: &Pose,
        radius: f64,
        obstacles: &ObstacleField
    ) -> Vec<Point2<f64>> {
        let mut hits = Vec::with_capacity(self.sensors.len());

        for s in self.sensors.iter_mut() {
            s.transform(pose, radius);

            s.reading = obstacles
                .cast_ray(&s.origin, &s.direction(), self.max_range)
                .into();

            if let Some(p) = s.reading.point() {
                hits.push(p);
            }
        }

        trace!("Scan complete: {}/{} sensors hit", hits.len(), self.sensors.len());

        hits
    }
}
