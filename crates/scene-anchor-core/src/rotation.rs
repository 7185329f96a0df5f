//! Shortest-arc rotations between two directions.

use nalgebra::{Unit, UnitQuaternion, Vector3};

/// Squared sine of the largest angle still treated as "no rotation" (~1e-12 rad).
const PARALLEL_SIN2_TOL: f64 = 1e-24;

/// Rotation taking the direction of `from` onto the direction of `to`.
///
/// - Same direction yields exactly the identity.
/// - Opposite directions yield a half turn about [`perpendicular_axis`]`(from)`,
///   so the result is reproducible for a given `from`.
/// - A zero-length or non-finite input yields the identity; callers are expected to reject
///   degenerate baselines before asking for a rotation.
pub fn shortest_arc(from: &Vector3<f64>, to: &Vector3<f64>) -> UnitQuaternion<f64> {
    let (Some(from), Some(to)) = (unit_direction(from), unit_direction(to)) else {
        return UnitQuaternion::identity();
    };

    let cross = from.cross(&to);
    let dot = from.dot(&to);
    let cross_sq = cross.norm_squared();

    if cross_sq <= PARALLEL_SIN2_TOL {
        if dot > 0.0 {
            return UnitQuaternion::identity();
        }
        let axis = perpendicular_axis(&from);
        return UnitQuaternion::from_axis_angle(&axis, std::f64::consts::PI);
    }

    let axis = Unit::new_normalize(cross);
    let angle = cross_sq.sqrt().atan2(dot);
    UnitQuaternion::from_axis_angle(&axis, angle)
}

/// Unit vector along `v`, or `None` for a zero or non-finite `v`.
///
/// Divides by the largest component first so huge or tiny inputs neither
/// overflow nor underflow the norm.
fn unit_direction(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let amax = v.amax();
    if amax == 0.0 || !amax.is_finite() {
        return None;
    }
    let scaled = v / amax;
    Some(scaled / scaled.norm())
}

/// Unit axis orthogonal to `v`, picked from `v`'s smallest-magnitude component.
///
/// The basis axis matching that component is crossed with `v`; ties go to the
/// lowest index (x, then y, then z). `v` must be non-zero.
pub fn perpendicular_axis(v: &Vector3<f64>) -> Unit<Vector3<f64>> {
    let mut k = 0;
    for i in 1..3 {
        if v[i].abs() < v[k].abs() {
            k = i;
        }
    }
    let mut basis = Vector3::zeros();
    basis[k] = 1.0;
    Unit::new_normalize(v.cross(&basis))
}
