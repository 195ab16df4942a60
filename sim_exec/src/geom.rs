//! # Geometry utilities
//!
//! Angle conversions, vector helpers and ray/segment intersection used by the
//! rest of the simulator.
//!
//! ## Frames
//!
//! Two conventions coexist:
//!
//! - The **field** frame is the one positions are stored and rendered in. Its
//!   X axis points right and its Y axis points *down*.
//! - The **engine** frame is the one headings are measured in. Its Y axis
//!   points *up*, so a positive heading is a counter-clockwise rotation when
//!   looking at the rendered field.
//!
//! Converting a vector between the two is a flip of the Y component by
//! [`PATH_Y_SIGN`]. Everything that turns a heading into a field direction
//! (kinematics, sensor rays) or a field offset into a heading (path control)
//! goes through [`engine_to_field`] / [`field_to_engine`].
//!
//! NOTE: the flip exists because the render surface grows Y downwards. Unifying
//! both frames would remove it but changes every stored coordinate.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Point2, Rotation2, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Sign applied to the Y component when moving a vector between the field
/// frame (Y down) and the engine frame (Y up).
pub const PATH_Y_SIGN: f64 = -1.0;

/// Tolerance used for degenerate geometry (zero length, parallel lines).
pub const GEOM_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A line segment in field coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start point of the segment
    pub start: Point2<f64>,

    /// End point of the segment
    pub end: Point2<f64>,
}

/// The result of a successful intersection test.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    /// The intersection point in field coordinates
    pub point: Point2<f64>,

    /// Distance from the origin of the ray (or start of the first segment) to
    /// the intersection point.
    pub distance: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Segment {
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }

    /// Build a segment from raw coordinates.
    pub fn from_coords(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    /// Vector from the start to the end of the segment.
    pub fn delta(&self) -> Vector2<f64> {
        self.end - self.start
    }

    /// Length of the segment.
    pub fn length(&self) -> f64 {
        self.delta().norm()
    }

    /// Mid point of the segment.
    pub fn midpoint(&self) -> Point2<f64> {
        nalgebra::center(&self.start, &self.end)
    }

    /// Returns true if the segment has (near) zero length.
    pub fn is_degenerate(&self) -> bool {
        self.length() < GEOM_EPSILON
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert degrees to radians.
pub fn deg_to_rad(deg: f64) -> f64 {
    deg.to_radians()
}

/// Convert radians to degrees.
pub fn rad_to_deg(rad: f64) -> f64 {
    rad.to_degrees()
}

/// Convert an engine heading (radians, CCW positive) into the display
/// convention used by collaborators (degrees, sign inverted).
pub fn heading_to_display_deg(heading_rad: f64) -> f64 {
    rad_to_deg(-heading_rad)
}

/// Convert a display heading (degrees, sign inverted) into an engine heading
/// normalised into [0, 2pi).
pub fn display_deg_to_heading(display_deg: f64) -> f64 {
    util::maths::wrap_2pi(deg_to_rad(-display_deg))
}

/// Convert an engine-frame vector into the field frame.
pub fn engine_to_field(v: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(v[0], PATH_Y_SIGN * v[1])
}

/// Convert a field-frame vector into the engine frame.
pub fn field_to_engine(v: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(v[0], PATH_Y_SIGN * v[1])
}

/// Unit vector pointing along an engine-frame angle, expressed in the engine
/// frame.
pub fn direction(angle_rad: f64) -> Vector2<f64> {
    Vector2::new(angle_rad.cos(), angle_rad.sin())
}

/// Unit vector pointing along an engine-frame angle, expressed in the field
/// frame.
pub fn field_direction(angle_rad: f64) -> Vector2<f64> {
    engine_to_field(direction(angle_rad))
}

/// Rotate a vector counter-clockwise (in its own frame) by the given angle.
pub fn rotate(v: Vector2<f64>, angle_rad: f64) -> Vector2<f64> {
    Rotation2::new(angle_rad) * v
}

/// Normalise a vector, or `None` if it has (near) zero length.
pub fn normalize(v: Vector2<f64>) -> Option<Vector2<f64>> {
    v.try_normalize(GEOM_EPSILON)
}

/// 2D cross product (z component of the 3D cross product).
pub fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

/// Intersect a ray with a segment.
///
/// The direction need not be normalised. Returns `None` if the ray has zero
/// length, if the ray and segment are parallel (collinear overlaps are
/// treated as parallel), or if the hit lies behind the origin. A ray grazing
/// an endpoint of the segment is a hit.
pub fn ray_segment_intersection(
    origin: &Point2<f64>,
    dir: &Vector2<f64>,
    segment: &Segment
) -> Option<Intersection> {
    let dir = normalize(*dir)?;
    let seg_delta = segment.delta();

    let denom = cross(&dir, &seg_delta);
    if denom.abs() < GEOM_EPSILON {
        return None
    }

    let to_start = segment.start - origin;

    // Distance along the ray, and fraction along the segment
    let t = cross(&to_start, &seg_delta) / denom;
    let u = cross(&to_start, &dir) / denom;

    if t < 0.0 || u < -GEOM_EPSILON || u > 1.0 + GEOM_EPSILON {
        return None
    }

    Some(Intersection {
        point: origin + dir * t,
        distance: t
    })
}

/// Intersect two segments.
///
/// The distance in the result is measured from `a.start`. Parallel and
/// collinear segments never intersect, and neither does a zero length `a`.
/// Touching endpoints are a hit.
pub fn segment_segment_intersection(a: &Segment, b: &Segment) -> Option<Intersection> {
    let length = a.length();
    if length < GEOM_EPSILON {
        return None
    }

    let hit = ray_segment_intersection(&a.start, &a.delta(), b)?;

    if hit.distance > length + GEOM_EPSILON {
        None
    }
    else {
        Some(hit)
    }
}

/// Find the nearest intersection of a ray with any of the given segments.
///
/// Hits further than `max_range` (if given) are ignored.
pub fn nearest_ray_intersection<'a, I>(
    origin: &Point2<f64>,
    dir: &Vector2<f64>,
    segments: I,
    max_range: Option<f64>
) -> Option<Intersection>
where
    I: IntoIterator<Item = &'a Segment>
{
    segments
        .into_iter()
        .filter_map(|s| ray_segment_intersection(origin, dir, s))
        .filter(|i| max_range.map_or(true, |r| i.distance <= r))
        .fold(None, |nearest: Option<Intersection>, i| match nearest {
            Some(n) if n.distance <= i.distance => Some(n),
            _ => Some(i)
        })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
