//! # Path controllers module
//!
//! The heading controller and steering policies used by PathCtrl, including
//! the heading error calculation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::{Params, SteerPolicy};
use util::maths::{get_ang_dist_2pi, map_pi_to_2pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64
}

/// Turns heading errors into body motion demands.
#[derive(Debug, Serialize, Clone)]
pub struct Steering {
    policy: SteerPolicy,

    head_ctrl: PidController
}

/// Body motion demanded for one tick.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct SteerCmd {
    /// Forward speed of the body centre, distance per unit time
    pub speed: f64,

    /// Turn rate, CCW positive, radians per unit time
    pub turn_rate: f64,

    /// True if the robot is stopped to turn on the spot
    pub turning_on_spot: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p, k_i, k_d,
            integral: 0f64,
            prev_error: None
        }
    }

    /// Get the value of the controller for the given error over a step of
    /// `dt`.
    ///
    /// The simulation clock is discrete so the step is passed in rather than
    /// measured. On the first call after creation or a reset there is no
    /// previous error, so the derivative term is zero.
    pub fn get(&mut self, error: f64, dt: f64) -> f64 {
        let deriv = match self.prev_error {
            Some(e) if dt > 0.0 => (error - e) / dt,
            _ => 0f64
        };

        self.integral += error * dt;

        let out =
            self.k_p * error
            + self.k_i * self.integral
            + self.k_d * deriv;

        self.prev_error = Some(error);

        out
    }

    /// Clear the integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
    }
}

impl Steering {

    /// Create a new instance of the steering from the parameters
    pub fn new(params: &Params) -> Self {
        Self {
            policy: params.steer_policy,
            head_ctrl: PidController::new(
                params.head_k_p, params.head_k_i, params.head_k_d
            )
        }
    }

    pub fn policy(&self) -> SteerPolicy {
        self.policy
    }

    pub fn reset(&mut self) {
        self.head_ctrl.reset();
    }

    /// Calculate the motion for one tick.
    ///
    /// `speed` is the configured forward speed (its sign is ignored),
    /// `distance` is the distance left to the end point.
    pub fn steer(
        &mut self,
        params: &Params,
        head_error_rad: f64,
        distance: f64,
        speed: f64,
        dt: f64
    ) -> SteerCmd {
        let max_turn = params.max_turn_rate_rads;

        let (turn_rate, drive) = match self.policy {
            SteerPolicy::Proportional => (
                self.head_ctrl.get(head_error_rad, dt).max(-max_turn).min(max_turn),
                head_error_rad.abs() < params.head_adjust_threshold_rad
            ),
            SteerPolicy::TurnThenDrive => (
                (head_error_rad / dt).max(-max_turn).min(max_turn),
                head_error_rad.abs() < params.align_threshold_rad
            )
        };

        let speed = if drive {
            forward_step(head_error_rad, distance, speed, dt) / dt
        }
        else {
            0f64
        };

        let cmd = SteerCmd {
            speed,
            turn_rate,
            turning_on_spot: !drive
        };

        trace!("Steer: {:?}", cmd);

        cmd
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Signed angle from the heading to the path, positive when the path lies
/// counter-clockwise of the heading.
///
/// `path` must be in the engine frame.
pub fn heading_error(heading_rad: f64, path: &Vector2<f64>) -> f64 {
    let path_heading = map_pi_to_2pi(path[1].atan2(path[0]));

    get_ang_dist_2pi(heading_rad, path_heading)
}

/// Length of the forward step to take this tick.
///
/// The step is the configured `|speed| * dt`, capped at the projection of the
/// remaining distance onto the heading. The cap stops the robot overshooting
/// and guarantees that the distance to the end point shrinks every step while
/// the heading error is under 90 degrees.
pub fn forward_step(head_error_rad: f64, distance: f64, speed: f64, dt: f64) -> f64 {
    let projected = distance * head_error_rad.cos();

    (speed.abs() * dt).min(projected).max(0f64)
}
