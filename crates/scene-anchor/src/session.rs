//! Two-step landmark capture state machine.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use scene_anchor_core::{solve_with, Reconstruction, SceneDefinition, SolveError, SolverParams};

/// Where a calibration session stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    #[default]
    AwaitingFirstLandmark,
    AwaitingSecondLandmark,
    Complete,
}

impl CaptureState {
    /// Operator prompt for this state.
    pub fn prompt(self) -> &'static str {
        match self {
            CaptureState::AwaitingFirstLandmark => "Place First Reference Point",
            CaptureState::AwaitingSecondLandmark => "Place Second Reference Point",
            CaptureState::Complete => "Reconstruction Done",
        }
    }

    /// Whether a captured point is consumed in this state.
    #[inline]
    pub fn accepts_capture(self) -> bool {
        !matches!(self, CaptureState::Complete)
    }
}

/// Which of the two landmarks a point belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkSlot {
    First,
    Second,
}

impl LandmarkSlot {
    pub fn label(self) -> &'static str {
        match self {
            LandmarkSlot::First => "Reference Point 1",
            LandmarkSlot::Second => "Reference Point 2",
        }
    }
}

/// Result of feeding one point to a [`CalibrationSession`].
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureOutcome {
    /// Landmark 1 stored; waiting for landmark 2.
    FirstPlaced(Point3<f64>),
    /// Landmark 2 stored and the scene solved.
    Completed(Reconstruction),
    /// Point refused; the session state is unchanged.
    Rejected(SolveError),
    /// Session already complete; the point was dropped.
    Ignored,
}

/// One calibration cycle: capture landmark 1, capture landmark 2, solve.
///
/// Once complete, further captures are ignored until [`reset`](Self::reset).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CalibrationSession {
    state: CaptureState,
    observed_landmark1: Option<Point3<f64>>,
    observed_landmark2: Option<Point3<f64>>,
}

impl CalibrationSession {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> CaptureState {
        self.state
    }

    #[inline]
    pub fn observed_landmark1(&self) -> Option<Point3<f64>> {
        self.observed_landmark1
    }

    #[inline]
    pub fn observed_landmark2(&self) -> Option<Point3<f64>> {
        self.observed_landmark2
    }

    /// Feed one captured point.
    ///
    /// The second point solves `scene` synchronously. A degenerate second
    /// point (coinciding with the first) is rejected and the session keeps
    /// waiting for landmark 2.
    pub fn capture_point(
        &mut self,
        scene: &SceneDefinition,
        params: &SolverParams,
        point: Point3<f64>,
    ) -> CaptureOutcome {
        match self.state {
            CaptureState::AwaitingFirstLandmark => {
                if !point.iter().all(|c| c.is_finite()) {
                    return CaptureOutcome::Rejected(SolveError::NonFiniteObservation);
                }
                self.observed_landmark1 = Some(point);
                self.state = CaptureState::AwaitingSecondLandmark;
                CaptureOutcome::FirstPlaced(point)
            }
            CaptureState::AwaitingSecondLandmark => {
                let Some(first) = self.observed_landmark1 else {
                    debug_assert!(false, "awaiting landmark 2 without landmark 1");
                    return CaptureOutcome::Rejected(SolveError::InsufficientLandmarks { got: 1 });
                };
                match solve_with(scene, first, point, params) {
                    Ok(rec) => {
                        self.observed_landmark2 = Some(point);
                        self.state = CaptureState::Complete;
                        CaptureOutcome::Completed(rec)
                    }
                    Err(err) => CaptureOutcome::Rejected(err),
                }
            }
            CaptureState::Complete => CaptureOutcome::Ignored,
        }
    }

    /// Drop both observed landmarks and start over. Valid in any state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
