use nalgebra::Vector2;

use crate::errors::SeedError;

/// Angle in degrees at vertex `b` between rays b->a and b->c, rounded to 0.1.
///
/// Points are (x, y). Returns a value in [0, 180].
pub fn angle_at_vertex(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Result<f64, SeedError> {
    let ba = Vector2::new(a.0 - b.0, a.1 - b.1);
    let bc = Vector2::new(c.0 - b.0, c.1 - b.1);

    let norms = ba.norm() * bc.norm();
    if norms == 0.0 || !norms.is_finite() {
        return Err(SeedError::DegenerateGeometry);
    }

    let cosine = (ba.dot(&bc) / norms).clamp(-1.0, 1.0);
    let degrees = cosine.acos().to_degrees();

    Ok(round_to_tenth(degrees))
}

/// Emergence angle from a seed pixel and two region centroids, all given as (row, col)
pub fn emergence_angle(
    seed: (u32, u32),
    left_centroid: (f64, f64),
    right_centroid: (f64, f64),
) -> Result<f64, SeedError> {
    angle_at_vertex(
        (left_centroid.1, left_centroid.0),
        (seed.1 as f64, seed.0 as f64),
        (right_centroid.1, right_centroid.0),
    )
}

#[inline]
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn opposite_rays_are_straight() {
        let angle = angle_at_vertex((-1.0, 0.0), (0.0, 0.0), (1.0, 0.0)).unwrap();
        assert_approx_eq!(angle, 180.0);
    }

    #[test]
    fn perpendicular_rays() {
        let angle = angle_at_vertex((0.0, -1.0), (0.0, 0.0), (1.0, 0.0)).unwrap();
        assert_approx_eq!(angle, 90.0);
    }

    #[test]
    fn swapping_candidates_keeps_magnitude() {
        let a = (-3.0, 7.0);
        let c = (5.0, 2.0);
        let b = (0.5, -1.0);
        assert_approx_eq!(
            angle_at_vertex(a, b, c).unwrap(),
            angle_at_vertex(c, b, a).unwrap()
        );
    }

    #[test]
    fn rounds_to_one_decimal() {
        // atan(1/2) = 26.565...
        let angle = angle_at_vertex((2.0, 1.0), (0.0, 0.0), (1.0, 0.0)).unwrap();
        assert_approx_eq!(angle, 26.6);
    }

    #[test]
    fn parallel_rays_give_zero() {
        let angle = angle_at_vertex((2.0, 2.0), (0.0, 0.0), (5.0, 5.0)).unwrap();
        assert_approx_eq!(angle, 0.0);
    }

    #[test]
    fn coincident_candidate_is_degenerate() {
        assert_eq!(
            angle_at_vertex((0.0, 0.0), (0.0, 0.0), (1.0, 0.0)).unwrap_err(),
            SeedError::DegenerateGeometry
        );
    }

    #[test]
    fn emergence_angle_swaps_row_col() {
        // seed at row 10, col 10; roots straight down-left and down-right
        let angle = emergence_angle((10, 10), (20.0, 0.0), (20.0, 20.0)).unwrap();
        assert_approx_eq!(angle, 90.0);
    }
}
