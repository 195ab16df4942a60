//! # Simulation commands
//!
//! The user actions a presentation layer performs, in a serialisable form so
//! they can be scripted. A script entry looks like:
//!
//! ```text
//! 0.0: {"type": "place_robot", "x": 100.0, "y": 100.0};
//! 0.0: {"type": "set_speed", "speed": 5.0};
//! 1.0: {"type": "start"};
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::sim::{SimError, Simulation};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The manual speed and rotation inputs, as a UI would hold them between
/// frames. Passed to [`Simulation::tick`] every tick.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ManualControls {
    pub speed: Option<f64>,
    pub rotation_deg: Option<f64>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimCmd {
    /// Drag the robot to a new position, starting a fresh run
    PlaceRobot { x: f64, y: f64 },

    /// Place the end point marker
    SetEnd { x: f64, y: f64 },

    /// Set the manual speed
    SetSpeed { speed: f64 },

    /// Set the manual rotation (degrees, display convention)
    SetRotation { deg: f64 },

    SetRadius { radius: f64 },

    SetSensorCount { count: usize },

    Start,
    Pause,
    Resume
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ManualControls {
    /// The controls to pass to the next tick.
    pub fn get(&self) -> (Option<f64>, Option<f64>) {
        (self.speed, self.rotation_deg)
    }
}

impl SimCmd {
    /// Execute the command against the simulation.
    ///
    /// Speed and rotation are stored in the manual controls and reach the
    /// simulation on the next tick, everything else is applied immediately.
    pub fn exec(
        &self,
        sim: &mut Simulation,
        controls: &mut ManualControls
    ) -> Result<(), SimError> {
        info!("Executing {:?}", self);

        match *self {
            SimCmd::PlaceRobot { x, y } => sim.place_robot(Point2::new(x, y)),
            SimCmd::SetEnd { x, y } => sim.set_end_point(Point2::new(x, y)),
            SimCmd::SetSpeed { speed } => {
                sim.set_speed(speed)?;
                controls.speed = Some(speed);
                Ok(())
            },
            SimCmd::SetRotation { deg } => {
                sim.set_rotation_deg(deg)?;
                controls.rotation_deg = Some(deg);
                Ok(())
            },
            SimCmd::SetRadius { radius } => sim.set_radius(radius),
            SimCmd::SetSensorCount { count } => sim.set_sensor_count(count),
            SimCmd::Start => sim.start(),
            SimCmd::Pause => {
                sim.pause();
                Ok(())
            },
            SimCmd::Resume => {
                sim.resume();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{params::SimParams, path_ctrl::PathCtrlMode};

    #[test]
    fn test_json() {
        let cmd: SimCmd = serde_json::from_str(
            r#"{"type": "place_robot", "x": 1.0, "y": 2.0}"#
        ).unwrap();
        assert_eq!(cmd, SimCmd::PlaceRobot { x: 1.0, y: 2.0 });

        let cmd: SimCmd = serde_json::from_str(r#"{"type": "start"}"#).unwrap();
        assert_eq!(cmd, SimCmd::Start);

        let cmd: SimCmd = serde_json::from_str(
            r#"{"type": "set_sensor_count", "count": 16}"#
        ).unwrap();
        assert_eq!(cmd, SimCmd::SetSensorCount { count: 16 });

        assert!(serde_json::from_str::<SimCmd>(r#"{"type": "fly"}"#).is_err());
    }

    #[test]
    fn test_exec() {
        let mut sim = Simulation::new(SimParams::default()).unwrap();
        let mut controls = ManualControls::default();

        let cmds = vec![
            SimCmd::PlaceRobot { x: 100.0, y: 100.0 },
            SimCmd::SetEnd { x: 200.0, y: 100.0 },
            SimCmd::SetSpeed { speed: 5.0 },
            SimCmd::SetRotation { deg: 0.0 },
            SimCmd::SetSensorCount { count: 12 },
            SimCmd::Start,
        ];

        for c in cmds.iter() {
            c.exec(&mut sim, &mut controls).unwrap();
        }

        assert_eq!(sim.mode(), PathCtrlMode::Moving);
        assert_eq!(sim.sensors().len(), 12);
        assert_eq!(controls.get(), (Some(5.0), Some(0.0)));

        // Rotating during a run is rejected and not stored
        assert!(SimCmd::SetRotation { deg: 30.0 }.exec(&mut sim, &mut controls).is_err());
        assert_eq!(controls.rotation_deg, Some(0.0));

        SimCmd::Pause.exec(&mut sim, &mut controls).unwrap();
        assert_eq!(sim.mode(), PathCtrlMode::Paused);
    }
}
