//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Get the signed angular distance between two angles in the range of [0, 2pi].
///
/// This function will return the shortest signed distance from a to b accounting for wrapping
/// between 0 and 2pi, positive when b lies counter-clockwise of a.
pub fn get_ang_dist_2pi<T>(a: T, b: T) -> T
where
    T: Float
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();
    
    let c = rem_euclid(a - b, tau_t);
    let d = rem_euclid(b - a, tau_t);

    if c < d {
        -c
    }
    else {
        d
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `self` is much smaller than `rhs.abs()` in
/// magnitude and `self < 0.0`. Use `wrap_2pi` where the strict upper bound
/// matters.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle into the half-open range [0, 2pi).
pub fn wrap_2pi<T>(value: T) -> T
where
    T: Float
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    let r = rem_euclid(value, tau_t);

    if r >= tau_t {
        T::zero()
    }
    else {
        r
    }
}

/// Map a value in the range [-pi, pi] to [0, 2pi]
pub fn map_pi_to_2pi<T>(value: T) -> T 
where
    T: Float
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    if value < T::zero() {
        tau_t + value
    }
    else {
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TAU: f64 = std::f64::consts::TAU;
    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_get_ang_dist_2pi() {
        assert_eq!(get_ang_dist_2pi(1f64, 2f64), 1f64);
        assert_eq!(get_ang_dist_2pi(2f64, 1f64), -1f64);
        assert_eq!(get_ang_dist_2pi(0f64, TAU), 0f64);
        assert_eq!(get_ang_dist_2pi(TAU, 0f64), 0f64);
        assert_eq!(get_ang_dist_2pi(1f64, TAU), -1f64);
        assert_eq!(get_ang_dist_2pi(0f64, TAU - 1f64), -1f64);
        assert_eq!(get_ang_dist_2pi(TAU - 1f64, 1f64), 2f64);
    }

    #[test]
    fn test_wrap_2pi() {
        assert_eq!(wrap_2pi(0f64), 0f64);
        assert_eq!(wrap_2pi(TAU), 0f64);
        assert!((wrap_2pi(-PI / 2.0) - 3.0 * PI / 2.0).abs() < 1e-12);
        assert!((wrap_2pi(5.0 * PI) - PI).abs() < 1e-12);

        // Tiny negative angles must not round up onto 2pi
        let w = wrap_2pi(-1e-20f64);
        assert!(w >= 0.0 && w < TAU);
    }

    #[test]
    fn test_map_pi_to_2pi() {
        assert_eq!(map_pi_to_2pi(-PI / 2.0), 3.0 * PI / 2.0);
        assert_eq!(map_pi_to_2pi(1f64), 1f64);
    }
}
