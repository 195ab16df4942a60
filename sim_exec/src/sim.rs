//! # Simulation session
//!
//! The [`Simulation`] owns the robot, the obstacle field and the path
//! controller, and advances them together one tick at a time. It is the only
//! interface a presentation layer (or the scenario script driver) needs: all
//! user actions go through its setters and all state can be read back through
//! its accessors.
//!
//! Each tick:
//!
//! 1. Apply the manual speed, and the manual rotation if no run is in
//!    progress.
//! 2. If moving, run path control and integrate the pose. On arrival the
//!    wheels stop and control returns to the user.
//! 3. Scan the obstacles and append the hits to the point cloud.
//! 4. Append the new position to the trajectory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use nalgebra::Point2;
use serde::Serialize;

// Internal
use crate::{
    loc::Pose,
    obstacle::ObstacleField,
    params::{ParamsError, SimParams},
    path_ctrl::{self, PathCtrl, PathCtrlError, PathCtrlMode},
    record::{PointCloud, RunRecord, Trajectory},
    robot::{ControlPhase, Robot, RobotError},
    sensor::Sensor,
    geom
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct Simulation {
    params: SimParams,

    obstacles: ObstacleField,
    robot: Robot,
    path_ctrl: PathCtrl,

    /// Number of ticks processed
    tick_count: u64,

    /// Sum of all time steps
    sim_time_s: f64,

    report: Option<TickReport>,
    arch_report: Archiver,

    /// A previously saved run shown alongside the live one
    overlay: Option<RunRecord>
}

/// Status of the simulation at the end of a tick.
///
/// The report is flat so it can be archived as a CSV row.
#[derive(Debug, Copy, Clone, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub sim_time_s: f64,
    pub mode: PathCtrlMode,
    pub phase: ControlPhase,
    pub x: f64,
    pub y: f64,

    /// Heading in the display convention (degrees, inverted sign)
    pub heading_deg: f64,

    pub left_speed: f64,
    pub right_speed: f64,

    /// Distance to the end point after the tick, if one is set
    pub distance_to_end: Option<f64>,

    /// Heading error to the path, zero unless moving
    pub head_error_rad: f64,

    /// Number of sensors that hit an obstacle
    pub num_hits: usize,

    /// True on the tick the robot arrived
    pub arrived: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Invalid simulation parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error(transparent)]
    RobotError(#[from] RobotError),

    #[error(transparent)]
    PathCtrlError(#[from] PathCtrlError),

    #[error("Point ({0}, {1}) is outside the field")]
    PointOutsideField(f64, f64),

    #[error("Cannot {0} while a run is in progress")]
    RunInProgress(&'static str),

    #[error("Time step must be finite and positive, got {0}")]
    InvalidTimeStep(f64),

    #[error("Could not archive simulation data: {0}")]
    ArchiveError(#[from] ArchiveError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Simulation {
    /// Create a new simulation from the parameters.
    ///
    /// The robot starts at the initial position but no start point is set, so
    /// a path only becomes defined once the robot is placed and an end point
    /// is chosen.
    pub fn new(params: SimParams) -> Result<Self, SimError> {
        params.validate()?;

        let obstacles = if params.enclose_field {
            ObstacleField::enclosed(params.obstacles.clone(), params.field_size())
        }
        else {
            ObstacleField::new(params.obstacles.clone())
        };

        let pose = Pose::new(
            params.initial_position(),
            geom::display_deg_to_heading(params.initial_heading_deg)
        );

        let robot = Robot::new(
            pose,
            params.robot_radius,
            params.sensor_count,
            params.sensor_max_range
        )?;

        let path_ctrl = PathCtrl::new(params.path_ctrl.clone());

        info!(
            "Simulation created: field {}x{}, {} obstacles, {} sensors",
            params.field_size[0],
            params.field_size[1],
            obstacles.len(),
            robot.sensor_count()
        );

        Ok(Self {
            params,
            obstacles,
            robot,
            path_ctrl,
            tick_count: 0,
            sim_time_s: 0.0,
            report: None,
            arch_report: Archiver::default(),
            overlay: None
        })
    }

    /// Start archiving a row per tick into the session's archive directory.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), SimError> {
        self.arch_report = Archiver::from_path(session, "sim/tick_report.csv")?;
        Ok(())
    }

    /// Advance the simulation by one tick of length `dt`.
    ///
    /// `manual_speed` is the speed set by the user, it reaches the wheels only
    /// under manual control (before a run starts and after it arrives). `manual_rotation_deg` is the heading set by
    /// the user in the display convention, it is ignored while a run is in
    /// progress.
    pub fn tick(
        &mut self,
        dt: f64,
        manual_speed: Option<f64>,
        manual_rotation_deg: Option<f64>
    ) -> Result<TickReport, SimError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidTimeStep(dt))
        }

        // ---- MANUAL INPUTS ----

        // Both inputs are checked before either is applied
        if let Some(speed) = manual_speed.filter(|s| !s.is_finite()) {
            return Err(RobotError::InvalidSpeed(speed).into())
        }
        if let Some(rotation) = manual_rotation_deg.filter(|r| !r.is_finite()) {
            return Err(RobotError::InvalidHeading(rotation).into())
        }

        if let Some(speed) = manual_speed {
            self.robot.set_speed(speed)?;
        }

        if let Some(rotation) = manual_rotation_deg {
            if !self.path_ctrl.is_running() {
                self.robot.set_heading_deg(rotation)?;
            }
        }

        // ---- PATH CONTROL ----

        let mut ctrl_report = path_ctrl::StatusReport::default();

        if self.path_ctrl.mode() == PathCtrlMode::Moving {
            ctrl_report = self.proc_moving(dt);
        }

        // ---- SENSING AND RECORDING ----

        let num_hits = self.robot.scan(&self.obstacles);
        self.robot.record_position();

        self.tick_count += 1;
        self.sim_time_s += dt;

        let position = self.robot.position();
        let wheels = self.robot.wheels().speeds();

        let report = TickReport {
            tick: self.tick_count,
            sim_time_s: self.sim_time_s,
            mode: self.path_ctrl.mode(),
            phase: self.robot.phase(),
            x: position[0],
            y: position[1],
            heading_deg: self.robot.heading_deg(),
            left_speed: wheels.left,
            right_speed: wheels.right,
            distance_to_end: self.robot.distance_to_end(),
            head_error_rad: ctrl_report.head_error_rad,
            num_hits,
            arrived: ctrl_report.arrived
        };

        trace!("Tick report: {:?}", report);

        self.report = Some(report);

        Ok(report)
    }

    /// Run path control for one tick and move the robot.
    fn proc_moving(&mut self, dt: f64) -> path_ctrl::StatusReport {
        let end_point = match self.robot.end_point() {
            Some(e) => e,
            None => {
                // Can only start with an end point and it can't be changed
                // while running
                warn!("Moving without an end point, stopping");
                self.path_ctrl.reset();
                self.robot.end_run();
                return path_ctrl::StatusReport::default()
            }
        };

        let input = path_ctrl::InputData {
            pose: *self.robot.pose(),
            end_point,
            speed: self.robot.speed(),
            wheel_separation: self.robot.wheel_separation(),
            dt
        };

        let (dems, mut report) = self.path_ctrl.proc(&input);

        if let Some(dems) = dems {
            self.robot.drive(dems);
        }

        if self.path_ctrl.mode() == PathCtrlMode::Moving {
            self.robot.advance(dt);

            if let Some(d) = self.robot.distance_to_end() {
                if self.path_ctrl.check_arrival(d) {
                    report.arrived = true;
                }
            }
        }

        if report.arrived {
            self.robot.end_run();
        }

        report
    }
}

impl Simulation {

    /// Place the robot at a new position, starting a fresh run from there.
    ///
    /// Rejected while a run is in progress or if the point is outside the
    /// field.
    pub fn place_robot(&mut self, position: Point2<f64>) -> Result<(), SimError> {
        self.check_in_field(&position)?;
        self.check_not_running("reposition the robot")?;

        self.robot.place(position);
        self.path_ctrl.reset();

        Ok(())
    }

    /// Set the end point of the path.
    pub fn set_end_point(&mut self, end: Point2<f64>) -> Result<(), SimError> {
        self.check_in_field(&end)?;
        self.check_not_running("move the end point")?;

        self.robot.set_end_point(end);

        Ok(())
    }

    /// Set the manual speed. Also used as the forward speed while moving.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), SimError> {
        self.robot.set_speed(speed)?;
        Ok(())
    }

    /// Set the heading in the display convention (degrees, inverted sign).
    pub fn set_rotation_deg(&mut self, display_deg: f64) -> Result<(), SimError> {
        self.check_not_running("rotate the robot")?;
        self.robot.set_heading_deg(display_deg)?;
        Ok(())
    }

    pub fn set_radius(&mut self, radius: f64) -> Result<(), SimError> {
        self.robot.set_radius(radius)?;
        Ok(())
    }

    pub fn set_sensor_count(&mut self, count: usize) -> Result<(), SimError> {
        self.robot.set_sensor_count(count)?;
        Ok(())
    }

    /// Start a run towards the end point.
    ///
    /// Fails without changing anything unless both the start and end points
    /// are set.
    pub fn start(&mut self) -> Result<(), SimError> {
        self.path_ctrl.start(self.robot.path_defined())?;
        self.robot.set_phase(ControlPhase::Autonomous);
        Ok(())
    }

    /// Pause the run. The wheel speeds are kept but not applied.
    pub fn pause(&mut self) {
        self.path_ctrl.pause();
    }

    pub fn resume(&mut self) {
        self.path_ctrl.resume();
    }

    /// True if a run is moving but can never reach the end point, because the
    /// forward speed is zero and only turning on the spot is possible.
    pub fn is_stalled(&self) -> bool {
        self.path_ctrl.mode() == PathCtrlMode::Moving && self.robot.speed() == 0.0
    }

    fn check_in_field(&self, point: &Point2<f64>) -> Result<(), SimError> {
        if self.params.contains(point) {
            Ok(())
        }
        else {
            warn!("Rejected point ({}, {}) outside the field", point[0], point[1]);
            Err(SimError::PointOutsideField(point[0], point[1]))
        }
    }

    fn check_not_running(&self, action: &'static str) -> Result<(), SimError> {
        if self.path_ctrl.is_running() {
            warn!("Cannot {} while a run is in progress", action);
            Err(SimError::RunInProgress(action))
        }
        else {
            Ok(())
        }
    }
}

impl Simulation {

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn pose(&self) -> &Pose {
        self.robot.pose()
    }

    pub fn sensors(&self) -> &[Sensor] {
        self.robot.sensors()
    }

    pub fn trajectory(&self) -> &Trajectory {
        self.robot.trajectory()
    }

    pub fn point_cloud(&self) -> &PointCloud {
        self.robot.point_cloud()
    }

    pub fn mode(&self) -> PathCtrlMode {
        self.path_ctrl.mode()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time_s
    }

    /// The report from the most recent tick.
    pub fn last_report(&self) -> Option<&TickReport> {
        self.report.as_ref()
    }

    /// Snapshot the live trajectory and point cloud.
    pub fn run_record(&self) -> RunRecord {
        RunRecord::from_logs(self.robot.trajectory(), self.robot.point_cloud())
    }

    /// Show a previously saved run alongside the live one, replacing any
    /// other loaded run.
    pub fn load_overlay(&mut self, record: RunRecord) {
        debug!(
            "Loaded overlay run with {} trajectory points and {} cloud points",
            record.trajectory.len(),
            record.point_cloud.len()
        );
        self.overlay = Some(record);
    }

    pub fn overlay(&self) -> Option<&RunRecord> {
        self.overlay.as_ref()
    }

    pub fn clear_overlay(&mut self) {
        self.overlay = None;
    }
}

impl Archived for Simulation {
    fn write(&mut self) -> Result<(), ArchiveError> {
        match self.report {
            Some(r) => self.arch_report.serialise(r),
            None => Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geom::Segment;
    use approx::assert_relative_eq;

    fn sim() -> Simulation {
        Simulation::new(SimParams {
            obstacles: vec![Segment::from_coords(150.0, 80.0, 150.0, 120.0)],
            sensor_count: 4,
            ..SimParams::default()
        }).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid() {
        let params = SimParams {
            robot_radius: -5.0,
            ..SimParams::default()
        };
        assert!(matches!(Simulation::new(params), Err(SimError::InvalidParams(_))));
    }

    #[test]
    fn test_idle_tick() {
        let mut sim = sim();
        sim.place_robot(Point2::new(100.0, 100.0)).unwrap();

        let report = sim.tick(1.0, Some(3.0), Some(-90.0)).unwrap();

        // Manual inputs applied, but no motion before a run starts
        assert_eq!(report.mode, PathCtrlMode::Idle);
        assert_eq!(report.left_speed, 3.0);
        assert_eq!(report.right_speed, 3.0);
        assert_relative_eq!(report.heading_deg, -90.0);
        assert_eq!(sim.pose().position, Point2::new(100.0, 100.0));

        assert_eq!(sim.trajectory().len(), 1);
        assert_eq!(report.distance_to_end, None);
        assert_eq!(report.tick, 1);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut sim = sim();

        assert!(matches!(sim.tick(0.0, None, None), Err(SimError::InvalidTimeStep(_))));
        assert!(matches!(sim.tick(f64::NAN, None, None), Err(SimError::InvalidTimeStep(_))));
        assert!(matches!(
            sim.place_robot(Point2::new(-10.0, 5.0)),
            Err(SimError::PointOutsideField(_, _))
        ));
        assert!(matches!(
            sim.set_end_point(Point2::new(10.0, 601.0)),
            Err(SimError::PointOutsideField(_, _))
        ));
        assert!(matches!(sim.set_radius(0.0), Err(SimError::RobotError(_))));
        assert_eq!(sim.robot().radius(), 10.0);
        assert!(matches!(sim.set_sensor_count(1000), Err(SimError::RobotError(_))));
        assert_eq!(sim.sensors().len(), 4);
    }

    #[test]
    fn test_invalid_manual_inputs_change_nothing() {
        let mut sim = sim();
        sim.place_robot(Point2::new(100.0, 100.0)).unwrap();

        assert!(matches!(
            sim.tick(1.0, Some(7.0), Some(f64::NAN)),
            Err(SimError::RobotError(RobotError::InvalidHeading(_)))
        ));
        assert!(matches!(
            sim.tick(1.0, Some(f64::INFINITY), Some(45.0)),
            Err(SimError::RobotError(RobotError::InvalidSpeed(_)))
        ));

        assert_eq!(sim.robot().speed(), 0.0);
        assert_eq!(sim.robot().wheels().speeds().left, 0.0);
        assert_eq!(sim.robot().wheels().speeds().right, 0.0);
        assert_eq!(sim.robot().heading_deg(), 0.0);
        assert_eq!(sim.tick_count(), 0);
        assert!(sim.trajectory().is_empty());
    }

    #[test]
    fn test_manual_control_after_arrival() {
        let mut sim = sim();
        sim.place_robot(Point2::new(100.0, 100.0)).unwrap();
        sim.set_end_point(Point2::new(120.0, 100.0)).unwrap();
        sim.set_speed(5.0).unwrap();
        sim.start().unwrap();

        let mut arrival = None;
        for _ in 0..10 {
            let report = sim.tick(1.0, None, None).unwrap();
            if report.arrived {
                arrival = Some(report);
                break
            }
        }

        // Stopped on the arrival tick, but the user has control again
        let arrival = arrival.unwrap();
        assert_eq!(arrival.mode, PathCtrlMode::Arrived);
        assert_eq!(arrival.phase, ControlPhase::Manual);
        assert_eq!(arrival.left_speed, 0.0);
        assert_eq!(arrival.right_speed, 0.0);

        // The manual speed reaches the wheels again, without moving the robot
        let report = sim.tick(1.0, Some(3.0), None).unwrap();
        assert_eq!(report.mode, PathCtrlMode::Arrived);
        assert_eq!(report.left_speed, 3.0);
        assert_eq!(report.right_speed, 3.0);
        assert_eq!(report.x, arrival.x);
        assert_eq!(report.y, arrival.y);

        // A new run takes the wheels over again
        sim.set_end_point(Point2::new(160.0, 100.0)).unwrap();
        sim.start().unwrap();
        assert_eq!(sim.robot().phase(), ControlPhase::Autonomous);
    }

    #[test]
    fn test_zero_speed_run_is_stalled() {
        let mut sim = sim();
        sim.place_robot(Point2::new(100.0, 100.0)).unwrap();
        sim.set_end_point(Point2::new(200.0, 100.0)).unwrap();
        assert!(!sim.is_stalled());

        sim.start().unwrap();
        for _ in 0..100 {
            sim.tick(1.0, Some(0.0), None).unwrap();
        }

        // Never gets any closer
        assert_eq!(sim.mode(), PathCtrlMode::Moving);
        assert_eq!(sim.pose().position, Point2::new(100.0, 100.0));
        assert!(sim.is_stalled());

        sim.set_speed(5.0).unwrap();
        assert!(!sim.is_stalled());

        sim.set_speed(0.0).unwrap();
        sim.pause();
        assert!(!sim.is_stalled());
    }

    #[test]
    fn test_start_requires_path() {
        let mut sim = sim();

        // The robot has never been placed, so there's no start point
        sim.set_end_point(Point2::new(200.0, 100.0)).unwrap();
        assert!(matches!(sim.start(), Err(SimError::PathCtrlError(_))));
        assert_eq!(sim.mode(), PathCtrlMode::Idle);
        assert_eq!(sim.robot().phase(), ControlPhase::Manual);

        sim.place_robot(Point2::new(100.0, 100.0)).unwrap();
        sim.start().unwrap();
        assert_eq!(sim.mode(), PathCtrlMode::Moving);
        assert_eq!(sim.robot().phase(), ControlPhase::Autonomous);
    }

    #[test]
    fn test_no_changes_while_running() {
        let mut sim = sim();
        sim.place_robot(Point2::new(100.0, 100.0)).unwrap();
        sim.set_end_point(Point2::new(200.0, 100.0)).unwrap();
        sim.set_speed(5.0).unwrap();
        sim.start().unwrap();
        sim.tick(1.0, None, None).unwrap();

        assert!(matches!(
            sim.place_robot(Point2::new(10.0, 10.0)),
            Err(SimError::RunInProgress(_))
        ));
        assert!(matches!(
            sim.set_end_point(Point2::new(10.0, 10.0)),
            Err(SimError::RunInProgress(_))
        ));
        assert!(sim.set_rotation_deg(45.0).is_err());

        // Manual rotation through the tick is ignored
        let report = sim.tick(1.0, None, Some(45.0)).unwrap();
        assert_eq!(report.heading_deg, 0.0);
        assert_relative_eq!(report.x, 110.0);
    }

    #[test]
    fn test_pause_resume() {
        let mut sim = sim();
        sim.place_robot(Point2::new(100.0, 100.0)).unwrap();
        sim.set_end_point(Point2::new(200.0, 100.0)).unwrap();
        sim.set_speed(5.0).unwrap();
        sim.start().unwrap();
        sim.tick(1.0, None, None).unwrap();

        sim.pause();
        let report = sim.tick(1.0, None, None).unwrap();
        assert_eq!(report.mode, PathCtrlMode::Paused);
        assert_relative_eq!(report.x, 105.0);

        // Wheels keep their speed while paused
        assert_eq!(report.left_speed, 5.0);

        sim.resume();
        let report = sim.tick(1.0, None, None).unwrap();
        assert_relative_eq!(report.x, 110.0);
    }

    #[test]
    fn test_overlay() {
        let mut sim = sim();
        sim.place_robot(Point2::new(100.0, 100.0)).unwrap();
        sim.tick(1.0, None, None).unwrap();

        let record = sim.run_record();
        assert_eq!(record.trajectory, vec![(100.0, 100.0)]);
        assert_eq!(record.point_cloud.len(), 1);

        sim.load_overlay(record.clone());
        sim.place_robot(Point2::new(50.0, 50.0)).unwrap();

        // Overlay survives a new run and is never merged into it
        assert_eq!(sim.overlay(), Some(&record));
        assert!(sim.trajectory().is_empty());

        sim.clear_overlay();
        assert!(sim.overlay().is_none());
    }
}
