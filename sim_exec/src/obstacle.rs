//! # Obstacle field
//!
//! The static set of line segment obstacles that the robot's sensors measure
//! against. The field is built once when the simulation is created and never
//! changes afterwards.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::{Point2, Vector2};

// Internal
use crate::geom::{self, Intersection, Segment};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An immutable collection of obstacle segments.
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    obstacles: Vec<Segment>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ObstacleField {
    /// Create a new field from the given obstacles.
    ///
    /// Degenerate (zero length) segments can never be hit by a ray so they are
    /// dropped.
    pub fn new(obstacles: Vec<Segment>) -> Self {
        let num_given = obstacles.len();

        let obstacles: Vec<Segment> = obstacles
            .into_iter()
            .filter(|o| !o.is_degenerate())
            .collect();

        if obstacles.len() != num_given {
            debug!(
                "Dropped {} degenerate obstacle(s)",
                num_given - obstacles.len()
            );
        }

        Self { obstacles }
    }

    /// Create a field with the given obstacles plus the four edges of a field
    /// with the given size, so that every sensor ray ends on something.
    pub fn enclosed(obstacles: Vec<Segment>, field_size: Vector2<f64>) -> Self {
        let (w, h) = (field_size[0], field_size[1]);

        let mut all = obstacles;
        all.extend_from_slice(&[
            Segment::from_coords(0.0, 0.0, w, 0.0),
            Segment::from_coords(w, 0.0, w, h),
            Segment::from_coords(w, h, 0.0, h),
            Segment::from_coords(0.0, h, 0.0, 0.0),
        ]);

        Self::new(all)
    }

    /// Number of obstacles in the field.
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Iterate over all obstacles.
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.obstacles.iter()
    }

    /// Get the obstacles as a slice.
    pub fn as_slice(&self) -> &[Segment] {
        &self.obstacles
    }

    /// Cast a ray into the field, returning the nearest hit within `max_range`.
    pub fn cast_ray(
        &self,
        origin: &Point2<f64>,
        dir: &Vector2<f64>,
        max_range: Option<f64>
    ) -> Option<Intersection> {
        geom::nearest_ray_intersection(origin, dir, &self.obstacles, max_range)
    }
}
