use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Uniform scale + rotation about a pivot, followed by a move onto an anchor.
///
/// `apply(p) = anchor + rotation * (scale * (p - pivot))`
///
/// Scaling happens in the pivot-local frame before the rotation; swapping the
/// two changes results whenever `scale != 1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    pub scale: f64,
    pub rotation: UnitQuaternion<f64>,
    /// Origin of the source frame the scale and rotation act around.
    pub pivot: Point3<f64>,
    /// Where `pivot` lands after the transform.
    pub anchor: Point3<f64>,
}

impl Similarity {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            rotation: UnitQuaternion::identity(),
            pivot: Point3::origin(),
            anchor: Point3::origin(),
        }
    }

    #[inline]
    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        let local = (p - self.pivot) * self.scale;
        self.anchor + self.rotation * local
    }

    /// Translation of the equivalent `x -> scale * rotation * x + t` form.
    #[inline]
    pub fn translation(&self) -> Vector3<f64> {
        self.anchor.coords - self.rotation * (self.pivot.coords * self.scale)
    }

    /// True if both transforms map points alike, to within `eps` in scale,
    /// rotation angle and translation.
    ///
    /// Pivot and anchor are compared through their combined effect, so the
    /// same map written around different pivots compares equal.
    pub fn approx_eq(&self, other: &Similarity, eps: f64) -> bool {
        (self.scale - other.scale).abs() <= eps
            && self.rotation.angle_to(&other.rotation) <= eps
            && (self.translation() - other.translation()).norm() <= eps
    }

    /// True if the transform leaves every point in place, to within `eps`.
    pub fn is_identity(&self, eps: f64) -> bool {
        self.approx_eq(&Self::identity(), eps)
    }
}

impl Default for Similarity {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Unit;

    #[test]
    fn identity_leaves_points_alone() {
        let p = Point3::new(0.5, -2.0, 7.0);
        assert_eq!(Similarity::identity().apply(&p), p);
        assert!(Similarity::identity().is_identity(0.0));
    }

    #[test]
    fn scales_before_rotating() {
        let t = Similarity {
            scale: 2.0,
            rotation: UnitQuaternion::from_axis_angle(
                &Unit::new_normalize(Vector3::z()),
                std::f64::consts::FRAC_PI_2,
            ),
            pivot: Point3::new(1.0, 0.0, 0.0),
            anchor: Point3::new(0.0, 0.0, 5.0),
        };
        // (2,0,0) - pivot = (1,0,0) -> scaled (2,0,0) -> rotated (0,2,0) -> + anchor.
        assert_relative_eq!(
            t.apply(&Point3::new(2.0, 0.0, 0.0)),
            Point3::new(0.0, 2.0, 5.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(t.apply(&t.pivot), t.anchor, epsilon = 1e-12);
        assert!(!t.is_identity(1e-9));
    }

    #[test]
    fn same_map_around_different_pivots_compares_equal() {
        let a = Similarity {
            scale: 1.0,
            rotation: UnitQuaternion::identity(),
            pivot: Point3::origin(),
            anchor: Point3::new(-1.0, 0.0, 0.0),
        };
        let b = Similarity {
            pivot: Point3::new(3.0, 0.0, 0.0),
            anchor: Point3::new(2.0, 0.0, 0.0),
            ..a
        };
        assert!(a.approx_eq(&b, 1e-12));
        assert!(!a.is_identity(1e-9));
        let moved = Similarity {
            anchor: Point3::new(2.5, 0.0, 0.0),
            ..b
        };
        assert!(!a.approx_eq(&moved, 1e-9));
    }
}
