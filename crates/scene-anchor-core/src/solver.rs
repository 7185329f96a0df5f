//! Two-landmark transform solver.
//!
//! Given the authored landmark pair of a [`SceneDefinition`] and a newly
//! observed pair, computes the scale + rotation that carries the authored
//! baseline onto the observed one and re-expresses every item under it.
//! Items are always recomputed from their authored positions, so repeated
//! solves never compound.

use nalgebra::{Point3, UnitQuaternion};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::rotation::shortest_arc;
use crate::scene::{ColorToken, SceneDefinition};
use crate::similarity::Similarity;

/// How the baseline length ratio turns into a scale factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScaleLaw {
    /// `|v2|² / |v1|²`. Matches scenes calibrated by earlier deployments.
    #[default]
    SquaredLengthRatio,
    /// `|v2| / |v1|`, a true similarity transform.
    LengthRatio,
}

impl ScaleLaw {
    /// Scale factor for squared baseline lengths `old_sq` and `new_sq`.
    #[inline]
    pub fn scale(self, old_sq: f64, new_sq: f64) -> f64 {
        match self {
            ScaleLaw::SquaredLengthRatio => new_sq / old_sq,
            ScaleLaw::LengthRatio => (new_sq / old_sq).sqrt(),
        }
    }
}

/// Frame the authored item positions are expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemFrame {
    /// Offsets from landmark 1: `world = R(s * p) + new_landmark1`.
    #[default]
    Landmark1Local,
    /// Same frame as the landmarks: `world = R(s * (p - landmark1)) + new_landmark1`.
    Scene,
}

impl ItemFrame {
    /// Point of `def` that the scale and rotation act around.
    #[inline]
    pub fn pivot(self, def: &SceneDefinition) -> Point3<f64> {
        match self {
            ItemFrame::Landmark1Local => Point3::origin(),
            ItemFrame::Scene => def.landmark1(),
        }
    }
}

/// Solver configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    pub scale_law: ScaleLaw,
    pub item_frame: ItemFrame,
    /// Observed baselines shorter than this are rejected as degenerate.
    ///
    /// `0.0` only rejects exactly coinciding points.
    pub min_observed_baseline: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            scale_law: ScaleLaw::SquaredLengthRatio,
            item_frame: ItemFrame::Landmark1Local,
            min_observed_baseline: 0.0,
        }
    }
}

/// Errors returned by the solver.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveError {
    #[error("reference landmarks coincide")]
    DegenerateReference,
    #[error("observed landmarks are too close (baseline {baseline})")]
    DegenerateObservation { baseline: f64 },
    #[error("observed landmark has a non-finite coordinate")]
    NonFiniteObservation,
    #[error("need two landmarks, got {got}")]
    InsufficientLandmarks { got: usize },
    #[error("baselines too large to solve (scale {scale})")]
    NonFiniteResult { scale: f64 },
}

/// One item placed under the solved transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemappedItem {
    pub name: String,
    pub color: ColorToken,
    pub position: Point3<f64>,
}

/// Solver output: the transform, the resolved landmarks and all remapped items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reconstruction {
    pub transform: Similarity,
    pub scale: f64,
    pub rotation: UnitQuaternion<f64>,
    pub landmark1: Point3<f64>,
    pub landmark2: Point3<f64>,
    pub items: Vec<RemappedItem>,
}

/// Solve with [`SolverParams::default`].
pub fn solve(
    def: &SceneDefinition,
    new_landmark1: Point3<f64>,
    new_landmark2: Point3<f64>,
) -> Result<Reconstruction, SolveError> {
    solve_with(def, new_landmark1, new_landmark2, &SolverParams::default())
}

/// Solve the transform carrying `def`'s landmarks onto the observed pair.
///
/// Either every item is remapped or an error is returned; there is no
/// partial output.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(def, params), fields(scene = def.id(), items = def.items().len()))
)]
pub fn solve_with(
    def: &SceneDefinition,
    new_landmark1: Point3<f64>,
    new_landmark2: Point3<f64>,
    params: &SolverParams,
) -> Result<Reconstruction, SolveError> {
    if !is_finite(&new_landmark1) || !is_finite(&new_landmark2) {
        return Err(SolveError::NonFiniteObservation);
    }

    let v1 = def.baseline();
    let v2 = new_landmark2 - new_landmark1;

    let old_sq = v1.norm_squared();
    if old_sq == 0.0 {
        return Err(SolveError::DegenerateReference);
    }
    let new_sq = v2.norm_squared();
    let min = params.min_observed_baseline.max(0.0);
    if new_sq == 0.0 || new_sq < min * min {
        return Err(SolveError::DegenerateObservation {
            baseline: new_sq.sqrt(),
        });
    }

    let scale = params.scale_law.scale(old_sq, new_sq);
    if !scale.is_finite() || !new_sq.is_finite() {
        return Err(SolveError::NonFiniteResult { scale });
    }
    let rotation = shortest_arc(&v1, &v2);
    let transform = Similarity {
        scale,
        rotation,
        pivot: params.item_frame.pivot(def),
        anchor: new_landmark1,
    };

    let mut items = Vec::with_capacity(def.items().len());
    for item in def.items() {
        let position = transform.apply(&item.original_position);
        if !is_finite(&position) {
            return Err(SolveError::NonFiniteResult { scale });
        }
        items.push(RemappedItem {
            name: item.name.clone(),
            color: item.color.clone(),
            position,
        });
    }

    log::debug!(
        "solved scene '{}': scale={:.6} angle={:.6} rad, {} items{}",
        def.id(),
        scale,
        rotation.angle(),
        items.len(),
        if transform.is_identity(1e-12) { " (identity)" } else { "" }
    );

    Ok(Reconstruction {
        transform,
        scale,
        rotation,
        landmark1: new_landmark1,
        landmark2: new_landmark2,
        items,
    })
}

/// Transform that shows `def` as authored under `params.item_frame`.
///
/// Equivalent to solving against the authored landmarks themselves, so
/// previews, resets and an identity calibration all agree.
pub fn authored_transform(def: &SceneDefinition, params: &SolverParams) -> Similarity {
    Similarity {
        anchor: def.landmark1(),
        pivot: params.item_frame.pivot(def),
        ..Similarity::identity()
    }
}

/// Slice-based entry point: uses the first two points as landmark 1 and 2.
pub fn reconstruct(
    def: &SceneDefinition,
    points: &[Point3<f64>],
    params: &SolverParams,
) -> Result<Reconstruction, SolveError> {
    match points {
        [l1, l2, ..] => solve_with(def, *l1, *l2, params),
        _ => Err(SolveError::InsufficientLandmarks { got: points.len() }),
    }
}

fn is_finite(p: &Point3<f64>) -> bool {
    p.iter().all(|c| c.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Item, SceneSpec};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn scene(l1: Point3<f64>, l2: Point3<f64>, items: Vec<Item>) -> SceneDefinition {
        SceneDefinition::new(SceneSpec {
            id: "t".to_owned(),
            name: "t".to_owned(),
            landmark1: l1,
            landmark2: l2,
            items,
        })
        .expect("scene")
    }

    #[test]
    fn doubled_baseline_quadruples_scale() {
        let def = SceneDefinition::sample();
        let rec = solve(&def, Point3::new(-2.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0))
            .expect("solve");
        assert_eq!(rec.scale, 4.0);
        assert_eq!(rec.rotation, UnitQuaternion::identity());
        let item2 = rec.items.iter().find(|i| i.name == "Item2").expect("Item2");
        assert_eq!(item2.position, Point3::new(6.0, 0.0, 6.0));
    }

    #[test]
    fn length_ratio_law_doubles_scale() {
        let def = SceneDefinition::sample();
        let params = SolverParams {
            scale_law: ScaleLaw::LengthRatio,
            ..SolverParams::default()
        };
        let rec = solve_with(
            &def,
            Point3::new(-2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            &params,
        )
        .expect("solve");
        assert_relative_eq!(rec.scale, 2.0, epsilon = 1e-15);
    }

    #[test]
    fn scale_is_squared_length_ratio() {
        let def = scene(
            Point3::new(0.5, 1.0, -2.0),
            Point3::new(1.5, 3.0, -1.0),
            Vec::new(),
        );
        let l1 = Point3::new(10.0, 0.0, 0.0);
        let l2 = Point3::new(10.0, 7.0, 3.0);
        let rec = solve(&def, l1, l2).expect("solve");
        let ratio = (l2 - l1).norm() / def.baseline().norm();
        assert_relative_eq!(rec.scale, ratio * ratio, max_relative = 1e-12);
    }

    #[test]
    fn rotation_maps_old_baseline_direction_onto_new() {
        let def = scene(Point3::origin(), Point3::new(1.0, 1.0, 0.0), Vec::new());
        let l1 = Point3::new(3.0, -1.0, 2.0);
        let l2 = Point3::new(2.0, 4.0, 7.0);
        let rec = solve(&def, l1, l2).expect("solve");
        let mapped = rec.rotation * def.baseline();
        assert_relative_eq!(mapped.normalize(), (l2 - l1).normalize(), epsilon = 1e-12);
    }

    #[test]
    fn scene_frame_landmarks_land_on_observation_with_length_ratio() {
        let l1 = Point3::new(-1.0, 0.0, 0.0);
        let l2 = Point3::new(1.0, 0.0, 0.0);
        let def = scene(
            l1,
            l2,
            vec![
                Item::new("a", "#000000", l1),
                Item::new("b", "#000000", l2),
            ],
        );
        let params = SolverParams {
            scale_law: ScaleLaw::LengthRatio,
            item_frame: ItemFrame::Scene,
            ..SolverParams::default()
        };
        let n1 = Point3::new(4.0, 1.0, 0.0);
        let n2 = Point3::new(4.0, 4.0, 4.0);
        let rec = solve_with(&def, n1, n2, &params).expect("solve");
        assert_relative_eq!(rec.items[0].position, n1, epsilon = 1e-12);
        assert_relative_eq!(rec.items[1].position, n2, epsilon = 1e-12);
    }

    #[test]
    fn coinciding_observation_is_rejected() {
        let def = SceneDefinition::sample();
        let p = Point3::new(1.0, 1.0, 1.0);
        assert_eq!(
            solve(&def, p, p).unwrap_err(),
            SolveError::DegenerateObservation { baseline: 0.0 }
        );
    }

    #[test]
    fn short_observation_respects_minimum_baseline() {
        let def = SceneDefinition::sample();
        let params = SolverParams {
            min_observed_baseline: 0.05,
            ..SolverParams::default()
        };
        let err = solve_with(
            &def,
            Point3::origin(),
            Point3::new(0.01, 0.0, 0.0),
            &params,
        )
        .unwrap_err();
        assert!(matches!(err, SolveError::DegenerateObservation { .. }));
    }

    #[test]
    fn non_finite_observation_is_rejected() {
        let def = SceneDefinition::sample();
        let err = solve(&def, Point3::origin(), Point3::new(f64::NAN, 0.0, 0.0)).unwrap_err();
        assert_eq!(err, SolveError::NonFiniteObservation);
    }

    #[test]
    fn anti_parallel_observation_is_deterministic() {
        let def = SceneDefinition::sample();
        let l1 = Point3::new(3.0, 0.0, 0.0);
        let l2 = Point3::new(-1.0, 0.0, 0.0);
        let a = solve(&def, l1, l2).expect("solve");
        let b = solve(&def, l1, l2).expect("solve");
        assert_eq!(a, b);
        let mapped = a.rotation * def.baseline();
        assert_relative_eq!(mapped.normalize(), -Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn repeated_solves_do_not_compound() {
        let def = SceneDefinition::sample();
        let l1 = Point3::new(-2.0, 0.0, 0.0);
        let l2 = Point3::new(2.0, 0.0, 0.0);
        let first = solve(&def, l1, l2).expect("solve");
        let second = solve(&def, l1, l2).expect("solve");
        assert_eq!(first.items, second.items);
    }

    #[test]
    fn overflowing_baseline_is_an_error_not_nan() {
        let def = SceneDefinition::sample();
        let err = solve(&def, Point3::origin(), Point3::new(1e200, 1e200, 0.0)).unwrap_err();
        assert!(matches!(err, SolveError::NonFiniteResult { .. }), "{err:?}");
    }

    #[test]
    fn huge_but_representable_baseline_still_rotates() {
        let def = SceneDefinition::sample();
        let params = SolverParams {
            scale_law: ScaleLaw::LengthRatio,
            ..SolverParams::default()
        };
        let rec = solve_with(&def, Point3::origin(), Point3::new(1e150, 1e150, 0.0), &params)
            .expect("solve");
        let mapped = rec.rotation * def.baseline();
        assert_relative_eq!(
            mapped.normalize(),
            Vector3::new(1.0, 1.0, 0.0).normalize(),
            epsilon = 1e-12
        );
        assert!(rec.items.iter().all(|i| i.position.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn authored_transform_matches_identity_solve() {
        for item_frame in [ItemFrame::Landmark1Local, ItemFrame::Scene] {
            let params = SolverParams {
                item_frame,
                ..SolverParams::default()
            };
            let def = SceneDefinition::sample();
            let rec = solve_with(&def, def.landmark1(), def.landmark2(), &params).expect("solve");
            let shown = authored_transform(&def, &params);
            for (remapped, item) in rec.items.iter().zip(def.items()) {
                assert_eq!(remapped.position, shown.apply(&item.original_position));
            }
        }
    }

    #[test]
    fn reconstruct_needs_two_points() {
        let def = SceneDefinition::sample();
        let err = reconstruct(&def, &[Point3::origin()], &SolverParams::default()).unwrap_err();
        assert_eq!(err, SolveError::InsufficientLandmarks { got: 1 });

        let rec = reconstruct(
            &def,
            &[def.landmark1(), def.landmark2(), Point3::new(9.0, 9.0, 9.0)],
            &SolverParams::default(),
        )
        .expect("solve");
        assert_eq!(rec.landmark2, def.landmark2());
    }
}
