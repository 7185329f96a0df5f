//! Re-anchor an authored scene onto two landmarks observed at runtime.
//!
//! The operator places two reference points; the [`SceneReconstructor`]
//! sequences the capture, solves the scale + rotation that carries the
//! authored landmark pair onto the observed one, and emits the display
//! updates (landmark markers, remapped items, prompts) as
//! [`SessionEvent`]s.
//!
//! ## Quickstart
//!
//! ```
//! use scene_anchor::{CaptureState, SceneDefinition, SceneReconstructor, SolverParams};
//! use scene_anchor::core::Point3;
//!
//! let mut r = SceneReconstructor::new(SceneDefinition::sample(), SolverParams::default());
//! r.capture_point(Point3::new(-2.0, 0.0, 0.0));
//! r.capture_point(Point3::new(2.0, 0.0, 0.0));
//! assert_eq!(r.state(), CaptureState::Complete);
//! ```
//!
//! ## API map
//! - `scene_anchor::core`: geometry, scene definition and the solver.
//! - `scene_anchor::CalibrationSession`: the bare capture state machine.
//! - `scene_anchor::SceneReconstructor`: session + solver + display events.
//! - `scene_anchor::io`: JSON configs, replay and reports.

pub use scene_anchor_core as core;

pub mod io;
mod reconstructor;
mod session;

pub use reconstructor::{
    ClearedScene, ItemDisplay, LandmarkDisplay, ReconstructedScene, SceneReconstructor,
    SessionEvent, StatusUpdate,
};
pub use session::{CalibrationSession, CaptureOutcome, CaptureState, LandmarkSlot};

pub use scene_anchor_core::{
    solve, solve_with, ItemFrame, Reconstruction, RemappedItem, ScaleLaw, SceneDefinition,
    SceneError, SolveError, SolverParams,
};
