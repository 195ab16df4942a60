//! # Robot
//!
//! The simulated differential drive robot. The robot owns its wheels, sensor
//! array and the logs of the current run, and keeps the pose dependent body
//! geometry up to date whenever the pose changes.
//!
//! ## Control phase
//!
//! The wheels are driven from one of two sources:
//!
//! - [`ControlPhase::Manual`]: before a run starts both wheels follow the
//!   manual speed in lock-step.
//! - [`ControlPhase::Autonomous`]: once a run starts only the path controller
//!   sets the wheel speeds. Changing the manual speed is still recorded but no
//!   longer reaches the wheels.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod wheel;
pub use wheel::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use nalgebra::{Point2, Vector2};
use serde::Serialize;
use std::f64::consts::FRAC_PI_2;

// Internal
use crate::{
    geom::{self, Segment},
    loc::{self, Pose, WheelDems},
    obstacle::ObstacleField,
    record::{PointCloud, Trajectory},
    sensor::{Sensor, SensorArray}
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Largest number of sensors a robot can carry.
pub const MAX_SENSOR_COUNT: usize = u8::MAX as usize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct Robot {
    pose: Pose,

    /// Body radius, half the wheel separation
    radius: f64,

    phase: ControlPhase,

    /// Manual aggregate speed
    speed: f64,

    wheels: WheelPair,
    sensors: SensorArray,
    body: BodyShape,

    start_point: Option<Point2<f64>>,
    end_point: Option<Point2<f64>>,

    trajectory: Trajectory,
    point_cloud: PointCloud
}

/// The pose dependent outline of the robot, in the field frame.
#[derive(Debug, Clone, Serialize)]
pub struct BodyShape {
    pub center: Point2<f64>,
    pub radius: f64,

    /// Line joining the two wheel contact points
    pub axle: Segment,

    /// Line from the centre to the front of the body
    pub heading_marker: Segment
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which source drives the wheels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum ControlPhase {
    Manual,
    Autonomous
}

/// Configuration errors raised by the robot's setters. The previous value is
/// always retained.
#[derive(Debug, thiserror::Error)]
pub enum RobotError {
    #[error("Robot radius must be finite and greater than zero, got {0}")]
    InvalidRadius(f64),

    #[error("Sensor count must be between 0 and {}, got {0}", MAX_SENSOR_COUNT)]
    InvalidSensorCount(usize),

    #[error("Speed must be finite, got {0}")]
    InvalidSpeed(f64),

    #[error("Heading must be finite, got {0}")]
    InvalidHeading(f64)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for BodyShape {
    fn default() -> Self {
        Self {
            center: Point2::origin(),
            radius: 0.0,
            axle: Segment::new(Point2::origin(), Point2::origin()),
            heading_marker: Segment::new(Point2::origin(), Point2::origin())
        }
    }
}

impl Robot {
    /// Create a new robot.
    ///
    /// The sensors are mounted relative to the given heading. The start point
    /// is not set until the robot is first placed.
    pub fn new(
        pose: Pose,
        radius: f64,
        sensor_count: usize,
        sensor_max_range: Option<f64>
    ) -> Result<Self, RobotError> {
        check_radius(radius)?;
        let count = check_sensor_count(sensor_count)?;

        let mut robot = Self {
            pose,
            radius,
            phase: ControlPhase::Manual,
            speed: 0.0,
            wheels: WheelPair::default(),
            sensors: SensorArray::new(count, pose.get_heading(), sensor_max_range),
            body: BodyShape::default(),
            start_point: None,
            end_point: None,
            trajectory: Trajectory::new(),
            point_cloud: PointCloud::new()
        };

        robot.transform_shapes();

        Ok(robot)
    }

    // ---- POSE ----

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn position(&self) -> Point2<f64> {
        self.pose.position
    }

    /// Heading in radians, engine convention, [0, 2pi).
    pub fn heading(&self) -> f64 {
        self.pose.get_heading()
    }

    /// Heading in the display convention (degrees, inverted sign).
    pub fn heading_deg(&self) -> f64 {
        self.pose.heading_display_deg()
    }

    /// Place the robot at a new position.
    ///
    /// This is the manual repositioning path: it bypasses the kinematics,
    /// makes the new position the start point of a fresh run, and clears the
    /// logs of the previous run. The wheels return to manual control.
    pub fn place(&mut self, position: Point2<f64>) {
        self.pose.position = position;
        self.start_point = Some(position);

        self.trajectory.clear();
        self.point_cloud.clear();

        self.set_phase(ControlPhase::Manual);
        self.transform_shapes();

        debug!("Robot placed at ({:.3}, {:.3})", position[0], position[1]);
    }

    /// Set the heading in radians (engine convention).
    pub fn set_heading(&mut self, heading_rad: f64) -> Result<(), RobotError> {
        if !heading_rad.is_finite() {
            return Err(RobotError::InvalidHeading(heading_rad))
        }

        self.pose.set_heading(heading_rad);
        self.transform_shapes();
        Ok(())
    }

    /// Set the heading in the display convention (degrees, inverted sign).
    pub fn set_heading_deg(&mut self, display_deg: f64) -> Result<(), RobotError> {
        if !display_deg.is_finite() {
            return Err(RobotError::InvalidHeading(display_deg))
        }

        self.set_heading(geom::display_deg_to_heading(display_deg))
    }

    // ---- BODY ----

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f64) -> Result<(), RobotError> {
        if let Err(e) = check_radius(radius) {
            warn!("Rejected robot radius: {}", e);
            return Err(e)
        }

        self.radius = radius;
        self.transform_shapes();
        Ok(())
    }

    /// Distance between the two wheels.
    pub fn wheel_separation(&self) -> f64 {
        2.0 * self.radius
    }

    pub fn body(&self) -> &BodyShape {
        &self.body
    }

    /// Recompute every pose dependent piece of geometry: body outline, wheel
    /// positions, heading marker and sensor rays.
    pub fn transform_shapes(&mut self) {
        let center = self.pose.position;
        let forward = self.pose.forward2();
        let left: Vector2<f64> = geom::field_direction(self.pose.get_heading() + FRAC_PI_2);

        let left_pos = center + left * self.radius;
        let right_pos = center - left * self.radius;

        self.wheels.left.set_position(left_pos);
        self.wheels.right.set_position(right_pos);

        self.body = BodyShape {
            center,
            radius: self.radius,
            axle: Segment::new(left_pos, right_pos),
            heading_marker: Segment::new(center, center + forward * self.radius)
        };

        self.sensors.transform(&self.pose, self.radius);
    }

    // ---- SENSORS ----

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Rebuild the sensor array with `count` sensors mounted relative to the
    /// current heading.
    pub fn set_sensor_count(&mut self, count: usize) -> Result<(), RobotError> {
        let count = match check_sensor_count(count) {
            Ok(c) => c,
            Err(e) => {
                warn!("Rejected sensor count: {}", e);
                return Err(e)
            }
        };

        self.sensors.configure(count, self.pose.get_heading());
        self.sensors.transform(&self.pose, self.radius);

        debug!("Sensor array configured with {} sensors", count);
        Ok(())
    }

    pub fn sensors(&self) -> &[Sensor] {
        self.sensors.as_slice()
    }

    /// Measure against the obstacles, appending every hit to the point cloud.
    ///
    /// Returns the number of hits.
    pub fn scan(&mut self, obstacles: &ObstacleField) -> usize {
        let hits = self.sensors.scan(&self.pose, self.radius, obstacles);
        let num_hits = hits.len();
        self.point_cloud.extend(hits);
        num_hits
    }

    // ---- WHEELS ----

    pub fn phase(&self) -> ControlPhase {
        self.phase
    }

    /// Switch the wheel control source.
    ///
    /// Returning to manual control snaps both wheels back to the manual speed.
    pub fn set_phase(&mut self, phase: ControlPhase) {
        if phase == ControlPhase::Manual {
            self.wheels.set_both(self.speed);
        }

        if phase != self.phase {
            debug!("Control phase {:?} -> {:?}", self.phase, phase);
        }

        self.phase = phase;
    }

    /// The manual aggregate speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the manual aggregate speed. Only reaches the wheels under manual
    /// control.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), RobotError> {
        if !speed.is_finite() {
            return Err(RobotError::InvalidSpeed(speed))
        }

        self.speed = speed;

        if self.phase == ControlPhase::Manual {
            self.wheels.set_both(speed);
        }

        Ok(())
    }

    pub fn wheels(&self) -> &WheelPair {
        &self.wheels
    }

    /// Apply wheel demands from the path controller.
    pub(crate) fn drive(&mut self, dems: WheelDems) {
        self.wheels.apply(dems);
    }

    /// End an autonomous run: stop the wheels and hand control back to the
    /// user.
    ///
    /// Unlike `set_phase(Manual)` the wheels are not snapped to the manual
    /// speed, they stay stopped until the speed is next set.
    pub(crate) fn end_run(&mut self) {
        self.wheels.stop();

        if self.phase != ControlPhase::Manual {
            debug!("Control phase {:?} -> {:?}", self.phase, ControlPhase::Manual);
        }

        self.phase = ControlPhase::Manual;
    }

    /// Integrate the pose forward using the current wheel speeds.
    pub(crate) fn advance(&mut self, dt: f64) {
        let speeds = self.wheels.speeds();

        self.pose = loc::integrate(
            &self.pose,
            speeds.left,
            speeds.right,
            self.wheel_separation(),
            dt
        );

        self.transform_shapes();
    }

    // ---- PATH ----

    pub fn start_point(&self) -> Option<Point2<f64>> {
        self.start_point
    }

    pub fn end_point(&self) -> Option<Point2<f64>> {
        self.end_point
    }

    pub fn set_end_point(&mut self, end: Point2<f64>) {
        self.end_point = Some(end);
        debug!("End point set to ({:.3}, {:.3})", end[0], end[1]);
    }

    /// True once both the start and end points have been set.
    pub fn path_defined(&self) -> bool {
        self.start_point.is_some() && self.end_point.is_some()
    }

    /// Vector from the robot to the end point in the engine frame (Y up).
    pub fn path_vector(&self) -> Option<Vector2<f64>> {
        self.end_point
            .map(|e| geom::field_to_engine(e - self.pose.position))
    }

    /// Straight line distance from the robot to the end point.
    pub fn distance_to_end(&self) -> Option<f64> {
        self.end_point.map(|e| (e - self.pose.position).norm())
    }

    // ---- LOGS ----

    /// Append the current position to the trajectory.
    pub fn record_position(&mut self) {
        self.trajectory.record(self.pose.position);
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn point_cloud(&self) -> &PointCloud {
        &self.point_cloud
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_radius(radius: f64) -> Result<(), RobotError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    }
    else {
        Err(RobotError::InvalidRadius(radius))
    }
}

fn check_sensor_count(count: usize) -> Result<u8, RobotError> {
    if count > MAX_SENSOR_COUNT {
        Err(RobotError::InvalidSensorCount(count))
    }
    else {
        Ok(count as u8)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn robot() -> Robot {
        Robot::new(Pose::new(Point2::new(100.0, 100.0), 0.0), 10.0, 4, None).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let pose = Pose::default();
        assert!(matches!(
            Robot::new(pose, -1.0, 4, None),
            Err(RobotError::InvalidRadius(_))
        ));
        assert!(matches!(
            Robot::new(pose, 1.0, 256, None),
            Err(RobotError::InvalidSensorCount(256))
        ));
    }

    #[test]
    fn test_setters_retain_previous() {
        let mut r = robot();

        assert!(r.set_radius(0.0).is_err());
        assert!(r.set_radius(f64::NAN).is_err());
        assert_eq!(r.radius(), 10.0);

        assert!(r.set_sensor_count(300).is_err());
        assert_eq!(r.sensor_count(), 4);

        r.set_sensor_count(255).unwrap();
        assert_eq!(r.sensor_count(), 255);

        r.set_radius(15.0).unwrap();
        assert_eq!(r.wheel_separation(), 30.0);
        assert_eq!(r.body().radius, 15.0);
    }

    #[test]
    fn test_manual_speed_mirrors_wheels() {
        let mut r = robot();

        r.set_speed(4.0).unwrap();
        assert_eq!(r.wheels().speeds(), WheelDems { left: 4.0, right: 4.0 });
        assert_eq!(r.wheels().left.label(), "4");

        r.set_phase(ControlPhase::Autonomous);
        r.drive(WheelDems { left: 1.0, right: 2.0 });
        r.set_speed(7.0).unwrap();
        assert_eq!(r.wheels().speeds(), WheelDems { left: 1.0, right: 2.0 });
        assert_eq!(r.speed(), 7.0);

        // Back to manual snaps to the manual speed
        r.set_phase(ControlPhase::Manual);
        assert_eq!(r.wheels().speeds(), WheelDems { left: 7.0, right: 7.0 });
    }

    #[test]
    fn test_body_follows_pose() {
        let mut r = robot();

        r.place(Point2::new(40.0, 60.0));
        assert_eq!(r.body().center, Point2::new(40.0, 60.0));
        assert_relative_eq!(r.body().axle.start[1], 50.0);
        assert_relative_eq!(r.body().axle.end[1], 70.0);
        assert_relative_eq!(r.body().heading_marker.end[0], 50.0);

        r.set_heading_deg(-90.0).unwrap();
        assert_relative_eq!(r.heading(), FRAC_PI_2);
        assert_relative_eq!(r.heading_deg(), -90.0);
        assert_eq!(r.body().center, Point2::new(40.0, 60.0));
        assert_relative_eq!(r.body().heading_marker.end[1], 50.0);
        assert_relative_eq!(r.body().axle.midpoint()[0], 40.0, epsilon = 1e-12);
        assert_relative_eq!(r.wheels().left.position()[0], 30.0, epsilon = 1e-12);
    }

    #[test]
    fn test_place_resets_run() {
        let mut r = robot();
        let field = ObstacleField::new(vec![Segment::from_coords(150.0, 80.0, 150.0, 120.0)]);

        r.record_position();
        assert_eq!(r.scan(&field), 1);
        assert_eq!(r.trajectory().len(), 1);
        assert_eq!(r.point_cloud().len(), 1);
        assert!(!r.path_defined());

        r.place(Point2::new(50.0, 50.0));
        assert!(r.trajectory().is_empty());
        assert!(r.point_cloud().is_empty());
        assert_eq!(r.start_point(), Some(Point2::new(50.0, 50.0)));

        r.set_end_point(Point2::new(80.0, 10.0));
        assert!(r.path_defined());
        assert_eq!(r.path_vector(), Some(Vector2::new(30.0, 40.0)));
        assert_relative_eq!(r.distance_to_end().unwrap(), 50.0);
    }

    #[test]
    fn test_advance() {
        let mut r = robot();
        r.set_phase(ControlPhase::Autonomous);
        r.drive(WheelDems { left: 5.0, right: 5.0 });

        for _ in 0..4 {
            r.advance(1.0);
        }

        assert_relative_eq!(r.position()[0], 120.0);
        assert_eq!(r.heading(), 0.0);
        assert_relative_eq!(r.sensors()[0].origin()[0], 130.0);
    }

    #[test]
    fn test_end_run_returns_to_manual() {
        let mut r = robot();
        r.set_speed(5.0).unwrap();
        r.set_phase(ControlPhase::Autonomous);
        r.drive(WheelDems { left: 4.0, right: 6.0 });

        r.end_run();

        // Stopped, not snapped back to the manual speed
        assert_eq!(r.phase(), ControlPhase::Manual);
        assert_eq!(r.wheels().speeds(), WheelDems { left: 0.0, right: 0.0 });
        assert_eq!(r.speed(), 5.0);

        r.set_speed(3.0).unwrap();
        assert_eq!(r.wheels().speeds(), WheelDems { left: 3.0, right: 3.0 });
    }
}
