//! Path control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use nalgebra::Point2;
use serde::Serialize;

// Internal
use super::*;
use crate::{
    geom,
    loc::{self, Pose, WheelDems}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct PathCtrl {
    params: Params,

    /// Executing mode
    mode: PathCtrlMode,

    report: StatusReport,
    output: Option<WheelDems>,

    /// Controller used to calculate the wheel demands
    steering: Steering
}

/// Input data to path control for one tick.
#[derive(Debug, Copy, Clone)]
pub struct InputData {
    pub pose: Pose,

    /// The end point of the path, field frame
    pub end_point: Point2<f64>,

    /// Configured forward speed
    pub speed: f64,

    pub wheel_separation: f64,

    pub dt: f64
}

/// The status report containing monitoring quantities for one tick.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Distance to the end point at the start of the tick
    pub distance_to_end: f64,

    /// The heading error to the path
    pub head_error_rad: f64,

    /// True if the robot stopped to turn on the spot
    pub turning_on_spot: bool,

    /// Set on the tick the end point was reached
    pub arrived: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur when sequencing path control.
#[derive(Debug, thiserror::Error)]
pub enum PathCtrlError {
    /// A run can only start once both the start and the end point are set.
    #[error("Cannot start: both the start and end point must be set")]
    PathNotDefined,

    /// A run is already in progress.
    #[error("Cannot start: a run is already in progress ({0:?})")]
    AlreadyRunning(PathCtrlMode)
}

/// The possible modes of execution of PathCtrl. Each mode is handled by a
/// `mode_xyz` function.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum PathCtrlMode {
    Idle,
    Moving,
    Paused,
    Arrived
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PathCtrl {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl PathCtrl {
    pub fn new(params: Params) -> Self {
        let steering = Steering::new(&params);

        Self {
            params,
            mode: PathCtrlMode::Idle,
            report: StatusReport::default(),
            output: None,
            steering
        }
    }

    pub fn mode(&self) -> PathCtrlMode {
        self.mode
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The report from the last call to `proc`.
    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// True while a run is in progress, paused or not.
    pub fn is_running(&self) -> bool {
        matches!(self.mode, PathCtrlMode::Moving | PathCtrlMode::Paused)
    }

    /// Process path control.
    ///
    /// Returns the wheel demands to apply this tick, if the robot should move.
    pub fn proc(&mut self, input: &InputData) -> (Option<WheelDems>, StatusReport) {
        self.output = None;
        self.report = StatusReport::default();

        match self.mode {
            PathCtrlMode::Idle
            | PathCtrlMode::Paused
            | PathCtrlMode::Arrived => (),
            PathCtrlMode::Moving => self.mode_moving(input)
        }

        (self.output, self.report)
    }

    /// Check whether the robot has arrived after moving.
    ///
    /// Returns true if this call completed the run.
    pub fn check_arrival(&mut self, distance_to_end: f64) -> bool {
        if self.mode == PathCtrlMode::Moving
            && distance_to_end < self.params.arrival_tolerance
        {
            self.arrive(distance_to_end);
            true
        }
        else {
            false
        }
    }
}

impl PathCtrl {

    /// Begin a new run.
    ///
    /// Allowed from `Idle` or after a previous run has arrived. The attempt is
    /// rejected without any change of state if the path isn't defined.
    pub fn start(&mut self, path_defined: bool) -> Result<(), PathCtrlError> {
        if self.is_running() {
            warn!("Start rejected, run already in progress");
            return Err(PathCtrlError::AlreadyRunning(self.mode))
        }

        if !path_defined {
            warn!("Start rejected, path not defined");
            return Err(PathCtrlError::PathNotDefined)
        }

        self.steering.reset();
        self.mode = PathCtrlMode::Moving;

        info!("Path control started ({:?})", self.steering.policy());

        Ok(())
    }

    /// Pause a run. Has no effect unless moving.
    pub fn pause(&mut self) {
        match self.mode {
            PathCtrlMode::Moving => {
                self.mode = PathCtrlMode::Paused;
                info!("Path control paused");
            },
            m => debug!("Pause ignored in {:?}", m)
        }
    }

    /// Resume a paused run. Has no effect unless paused.
    pub fn resume(&mut self) {
        match self.mode {
            PathCtrlMode::Paused => {
                self.mode = PathCtrlMode::Moving;
                info!("Path control resumed");
            },
            m => debug!("Resume ignored in {:?}", m)
        }
    }

    /// Return to idle, abandoning any run in progress.
    pub fn reset(&mut self) {
        if self.mode != PathCtrlMode::Idle {
            debug!("Path control reset from {:?}", self.mode);
        }

        self.mode = PathCtrlMode::Idle;
        self.steering.reset();
        self.report = StatusReport::default();
        self.output = None;
    }
}

impl PathCtrl {

    fn mode_moving(&mut self, input: &InputData) {
        let offset = input.end_point - input.pose.position;
        let distance = offset.norm();

        self.report.distance_to_end = distance;

        if distance < self.params.arrival_tolerance {
            self.arrive(distance);
            return
        }

        let path = geom::field_to_engine(offset);
        let head_error_rad = heading_error(input.pose.get_heading(), &path);

        let cmd = self.steering.steer(
            &self.params,
            head_error_rad,
            distance,
            input.speed,
            input.dt
        );

        self.report.head_error_rad = head_error_rad;
        self.report.turning_on_spot = cmd.turning_on_spot;

        self.output = Some(loc::skid_steer(
            cmd.speed,
            cmd.turn_rate,
            input.wheel_separation
        ));

        trace!(
            "Moving: distance {:.4}, heading error {:.4} rad, dems {:?}",
            distance, head_error_rad, self.output
        );
    }

    fn arrive(&mut self, distance: f64) {
        self.mode = PathCtrlMode::Arrived;
        self.output = Some(WheelDems::stop());
        self.report.arrived = true;

        info!("Arrived at end point (distance {:.4})", distance);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn input(x: f64, y: f64, heading: f64) -> InputData {
        InputData {
            pose: Pose::new(Point2::new(x, y), heading),
            end_point: Point2::new(200.0, 100.0),
            speed: 5.0,
            wheel_separation: 20.0,
            dt: 1.0
        }
    }

    #[test]
    fn test_sequencing() {
        let mut ctrl = PathCtrl::default();

        assert!(matches!(ctrl.start(false), Err(PathCtrlError::PathNotDefined)));
        assert_eq!(ctrl.mode(), PathCtrlMode::Idle);

        // Pause and resume are no-ops when idle
        ctrl.pause();
        ctrl.resume();
        assert_eq!(ctrl.mode(), PathCtrlMode::Idle);

        ctrl.start(true).unwrap();
        assert_eq!(ctrl.mode(), PathCtrlMode::Moving);
        assert!(matches!(ctrl.start(true), Err(PathCtrlError::AlreadyRunning(_))));

        ctrl.pause();
        assert_eq!(ctrl.mode(), PathCtrlMode::Paused);
        assert!(ctrl.is_running());

        // No output while paused
        let (dems, _) = ctrl.proc(&input(100.0, 100.0, 0.0));
        assert!(dems.is_none());

        ctrl.resume();
        assert_eq!(ctrl.mode(), PathCtrlMode::Moving);
    }

    #[test]
    fn test_moving_output() {
        let mut ctrl = PathCtrl::default();
        ctrl.start(true).unwrap();

        let (dems, report) = ctrl.proc(&input(100.0, 100.0, 0.0));
        assert_eq!(dems, Some(WheelDems { left: 5.0, right: 5.0 }));
        assert_relative_eq!(report.distance_to_end, 100.0);
        assert_eq!(report.head_error_rad, 0.0);

        // End point is behind and below the robot on screen, so the robot
        // must turn clockwise on the spot (right wheel slower)
        let (dems, report) = ctrl.proc(&input(210.0, 50.0, 0.0));
        let dems = dems.unwrap();
        assert!(report.head_error_rad < 0.0);
        assert!(report.turning_on_spot);
        assert!(dems.right < dems.left);
        assert_relative_eq!(dems.forward_speed(), 0.0);
    }

    #[test]
    fn test_arrival() {
        let mut ctrl = PathCtrl::default();
        ctrl.start(true).unwrap();

        let (dems, report) = ctrl.proc(&input(199.8, 100.0, 0.0));
        assert_eq!(dems, Some(WheelDems::stop()));
        assert!(report.arrived);
        assert_eq!(ctrl.mode(), PathCtrlMode::Arrived);

        // A new run can start after arriving
        ctrl.start(true).unwrap();
        assert!(!ctrl.check_arrival(10.0));
        assert!(ctrl.check_arrival(0.1));
        assert_eq!(ctrl.mode(), PathCtrlMode::Arrived);

        ctrl.reset();
        assert_eq!(ctrl.mode(), PathCtrlMode::Idle);
    }
}
