//! # Run recording
//!
//! Append-only logs of the positions visited by the robot (the trajectory)
//! and of the sensor hit points (the point cloud), plus the plain data form
//! used to save and reload a run.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ordered, append-only log of field frame points.
///
/// Only the owning robot can append to or clear a log, everyone else gets a
/// read-only view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointLog {
    points: Vec<Point2<f64>>
}

/// Positions visited by the robot, one per tick.
pub type Trajectory = PointLog;

/// Sensor hit points in the order they were measured.
pub type PointCloud = PointLog;

/// A saved run, as plain coordinate pairs.
///
/// Records loaded from disk are only ever displayed alongside the live run,
/// they are never merged into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub trajectory: Vec<(f64, f64)>,
    pub point_cloud: Vec<(f64, f64)>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PointLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point. No de-duplication is performed.
    pub(crate) fn record(&mut self, point: Point2<f64>) {
        self.points.push(point);
    }

    pub(crate) fn extend<I: IntoIterator<Item = Point2<f64>>>(&mut self, points: I) {
        self.points.extend(points);
    }

    pub(crate) fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point2<f64>> {
        self.points.iter()
    }

    pub fn last(&self) -> Option<&Point2<f64>> {
        self.points.last()
    }

    pub fn as_slice(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// Copy the log out as coordinate pairs.
    pub fn to_pairs(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p[0], p[1])).collect()
    }
}

impl RunRecord {
    /// Snapshot a pair of live logs.
    pub fn from_logs(trajectory: &Trajectory, point_cloud: &PointCloud) -> Self {
        Self {
            trajectory: trajectory.to_pairs(),
            point_cloud: point_cloud.to_pairs()
        }
    }

    pub fn trajectory_points(&self) -> impl Iterator<Item = Point2<f64>> + '_ {
        self.trajectory.iter().map(|&(x, y)| Point2::new(x, y))
    }

    pub fn point_cloud_points(&self) -> impl Iterator<Item = Point2<f64>> + '_ {
        self.point_cloud.iter().map(|&(x, y)| Point2::new(x, y))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_append_only() {
        let mut log = PointLog::new();
        log.record(Point2::new(1.0, 2.0));
        log.record(Point2::new(1.0, 2.0));
        log.extend(vec![Point2::new(3.0, 4.0)]);

        assert_eq!(log.len(), 3);
        assert_eq!(log.last(), Some(&Point2::new(3.0, 4.0)));
        assert_eq!(log.to_pairs(), vec![(1.0, 2.0), (1.0, 2.0), (3.0, 4.0)]);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_run_record_json() {
        let mut traj = Trajectory::new();
        traj.record(Point2::new(100.0, 100.0));
        let mut cloud = PointCloud::new();
        cloud.record(Point2::new(150.0, 100.0));

        let record = RunRecord::from_logs(&traj, &cloud);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"trajectory":[[100.0,100.0]],"point_cloud":[[150.0,100.0]]}"#);

        let loaded: RunRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, record);
        assert_eq!(
            loaded.trajectory_points().collect::<Vec<_>>(),
            vec![Point2::new(100.0, 100.0)]
        );
        assert_eq!(loaded.point_cloud_points().next(), Some(Point2::new(150.0, 100.0)));
    }
}
