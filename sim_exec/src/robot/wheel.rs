//! Drive wheels

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point2;
use serde::Serialize;

use crate::loc::WheelDems;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single drive wheel.
///
/// The label always mirrors the speed, it is what a presentation layer shows
/// next to the wheel.
#[derive(Debug, Clone, Serialize)]
pub struct Wheel {
    side: WheelSide,

    /// Signed speed in field units per unit time
    speed: f64,

    /// Human readable speed
    label: String,

    /// Position of the wheel's contact point in the field frame
    position: Point2<f64>
}

/// The pair of drive wheels owned by a robot.
#[derive(Debug, Clone, Serialize)]
pub struct WheelPair {
    pub left: Wheel,
    pub right: Wheel
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum WheelSide {
    Left,
    Right
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Wheel {
    pub fn new(side: WheelSide) -> Self {
        let mut w = Self {
            side,
            speed: 0.0,
            label: String::new(),
            position: Point2::origin()
        };
        w.set_speed(0.0);
        w
    }

    pub fn side(&self) -> WheelSide {
        self.side
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the speed of the wheel, updating the label.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
        self.label = format!("{}", speed);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn position(&self) -> Point2<f64> {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Point2<f64>) {
        self.position = position;
    }
}

impl Default for WheelPair {
    fn default() -> Self {
        Self {
            left: Wheel::new(WheelSide::Left),
            right: Wheel::new(WheelSide::Right)
        }
    }
}

impl WheelPair {
    /// Set both wheels to the same speed.
    pub fn set_both(&mut self, speed: f64) {
        self.left.set_speed(speed);
        self.right.set_speed(speed);
    }

    /// Apply a pair of wheel demands.
    pub fn apply(&mut self, dems: WheelDems) {
        self.left.set_speed(dems.left);
        self.right.set_speed(dems.right);
    }

    /// Stop both wheels.
    pub fn stop(&mut self) {
        self.set_both(0.0);
    }

    /// Current speeds as demands.
    pub fn speeds(&self) -> WheelDems {
        WheelDems {
            left: self.left.speed(),
            right: self.right.speed()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_label_tracks_speed() {
        let mut wheel = Wheel::new(WheelSide::Left);
        assert_eq!(wheel.label(), "0");

        wheel.set_speed(5.0);
        assert_eq!(wheel.label(), "5");

        wheel.set_speed(-2.5);
        assert_eq!(wheel.label(), "-2.5");
    }

    #[test]
    fn test_pair() {
        let mut pair = WheelPair::default();
        assert_eq!(pair.left.side(), WheelSide::Left);
        assert_eq!(pair.right.side(), WheelSide::Right);

        pair.apply(WheelDems { left: 1.0, right: 2.0 });
        assert_eq!(pair.speeds(), WheelDems { left: 1.0, right: 2.0 });
        assert_eq!(pair.right.label(), "2");

        pair.stop();
        assert_eq!(pair.speeds(), WheelDems::stop());
    }
}
