//! Orchestrator tying the capture session to the solver and to display
//! collaborators.
//!
//! A [`SceneReconstructor`] owns the scene, the solver settings and the
//! single active [`CalibrationSession`]. Each input (`capture_point`,
//! `reset`) is processed to completion and answered with the list of
//! [`SessionEvent`]s a renderer/UI needs to apply, in order.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use scene_anchor_core::{
    authored_transform, solve_with, ColorToken, Reconstruction, SceneDefinition, SolveError,
    SolverParams,
};

use crate::session::{CalibrationSession, CaptureOutcome, CaptureState, LandmarkSlot};

/// Current state plus the prompt to show for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub state: CaptureState,
    pub prompt: String,
}

impl From<CaptureState> for StatusUpdate {
    fn from(state: CaptureState) -> Self {
        Self {
            state,
            prompt: state.prompt().to_owned(),
        }
    }
}

/// Display data for one landmark marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkDisplay {
    pub slot: LandmarkSlot,
    pub position: Point3<f64>,
    pub label: String,
    pub visible: bool,
}

impl LandmarkDisplay {
    fn shown(slot: LandmarkSlot, position: Point3<f64>) -> Self {
        Self {
            slot,
            position,
            label: slot.label().to_owned(),
            visible: true,
        }
    }

    fn hidden(slot: LandmarkSlot, position: Point3<f64>) -> Self {
        Self {
            visible: false,
            ..Self::shown(slot, position)
        }
    }
}

/// Display data for one scene item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDisplay {
    pub name: String,
    pub color: ColorToken,
    pub position: Point3<f64>,
    pub visible: bool,
}

/// Everything a renderer needs after a successful calibration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconstructedScene {
    pub reconstruction: Reconstruction,
    pub landmarks: [LandmarkDisplay; 2],
    pub items: Vec<ItemDisplay>,
}

/// Display reset: landmarks hidden, items back at their authored positions, hidden.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClearedScene {
    pub landmarks: [LandmarkDisplay; 2],
    pub items: Vec<ItemDisplay>,
}

/// Notification emitted to collaborators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Status(StatusUpdate),
    LandmarkPlaced(LandmarkDisplay),
    ObservationRejected { error: SolveError },
    Reconstructed(ReconstructedScene),
    Cleared(ClearedScene),
}

/// Single owner of the calibration state for one scene.
#[derive(Clone, Debug)]
pub struct SceneReconstructor {
    scene: SceneDefinition,
    params: SolverParams,
    session: CalibrationSession,
    last: Option<Reconstruction>,
}

impl SceneReconstructor {
    pub fn new(scene: SceneDefinition, params: SolverParams) -> Self {
        Self {
            scene,
            params,
            session: CalibrationSession::new(),
            last: None,
        }
    }

    #[inline]
    pub fn scene(&self) -> &SceneDefinition {
        &self.scene
    }

    #[inline]
    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    #[inline]
    pub fn session(&self) -> &CalibrationSession {
        &self.session
    }

    #[inline]
    pub fn state(&self) -> CaptureState {
        self.session.state()
    }

    /// Result of the last completed calibration, cleared on reset.
    #[inline]
    pub fn last_reconstruction(&self) -> Option<&Reconstruction> {
        self.last.as_ref()
    }

    pub fn status(&self) -> StatusUpdate {
        self.state().into()
    }

    /// Authored layout with everything hidden, as shown before any capture.
    ///
    /// Item positions are the authored ones under the configured item frame,
    /// i.e. where [`preview_authored`](Self::preview_authored) places them.
    pub fn initial_display(&self) -> ClearedScene {
        let authored = authored_transform(&self.scene, &self.params);
        ClearedScene {
            landmarks: [
                LandmarkDisplay::hidden(LandmarkSlot::First, self.scene.landmark1()),
                LandmarkDisplay::hidden(LandmarkSlot::Second, self.scene.landmark2()),
            ],
            items: self
                .scene
                .items()
                .iter()
                .map(|item| ItemDisplay {
                    name: item.name.clone(),
                    color: item.color.clone(),
                    position: authored.apply(&item.original_position),
                    visible: false,
                })
                .collect(),
        }
    }

    /// Solve against the authored landmarks themselves.
    ///
    /// Shows the scene as authored under the current solver settings; does
    /// not touch the session.
    pub fn preview_authored(&self) -> Result<Reconstruction, SolveError> {
        solve_with(
            &self.scene,
            self.scene.landmark1(),
            self.scene.landmark2(),
            &self.params,
        )
    }

    /// Handle one captured point.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self), fields(scene = self.scene.id())))]
    pub fn capture_point(&mut self, point: Point3<f64>) -> Vec<SessionEvent> {
        if !self.state().accepts_capture() {
            log::debug!("capture ignored in state {:?}", self.state());
            return Vec::new();
        }
        match self
            .session
            .capture_point(&self.scene, &self.params, point)
        {
            CaptureOutcome::FirstPlaced(p) => {
                log::info!("landmark 1 placed at {:?}", p.coords.as_slice());
                vec![
                    SessionEvent::LandmarkPlaced(LandmarkDisplay::shown(LandmarkSlot::First, p)),
                    SessionEvent::Status(self.status()),
                ]
            }
            CaptureOutcome::Completed(rec) => {
                log::info!(
                    "scene '{}' reconstructed: scale={:.6}, {} items",
                    self.scene.id(),
                    rec.scale,
                    rec.items.len()
                );
                if rec
                    .transform
                    .approx_eq(&authored_transform(&self.scene, &self.params), 1e-9)
                {
                    log::info!("observed landmarks match the authored ones");
                }
                let shown = reconstructed_scene(rec.clone());
                self.last = Some(rec);
                vec![
                    SessionEvent::LandmarkPlaced(shown.landmarks[1].clone()),
                    SessionEvent::Reconstructed(shown),
                    SessionEvent::Status(self.status()),
                ]
            }
            CaptureOutcome::Rejected(error) => {
                log::warn!("capture rejected: {error}");
                vec![
                    SessionEvent::ObservationRejected { error },
                    SessionEvent::Status(self.status()),
                ]
            }
            CaptureOutcome::Ignored => Vec::new(),
        }
    }

    /// Abandon the current session and restore the authored, hidden layout.
    pub fn reset(&mut self) -> Vec<SessionEvent> {
        self.session.reset();
        self.last = None;
        log::info!("calibration of scene '{}' reset", self.scene.id());
        vec![
            SessionEvent::Cleared(self.initial_display()),
            SessionEvent::Status(self.status()),
        ]
    }
}

fn reconstructed_scene(reconstruction: Reconstruction) -> ReconstructedScene {
    let landmarks = [
        LandmarkDisplay::shown(LandmarkSlot::First, reconstruction.landmark1),
        LandmarkDisplay::shown(LandmarkSlot::Second, reconstruction.landmark2),
    ];
    let items = reconstruction
        .items
        .iter()
        .map(|item| ItemDisplay {
            name: item.name.clone(),
            color: item.color.clone(),
            position: item.position,
            visible: true,
        })
        .collect();
    ReconstructedScene {
        reconstruction,
        landmarks,
        items,
    }
}
