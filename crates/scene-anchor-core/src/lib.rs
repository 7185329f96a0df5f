//! Core geometry for re-anchoring an authored scene onto two observed landmarks.
//!
//! This crate is purely geometric: it knows nothing about input devices,
//! rendering or how a capture session is sequenced. See the `scene-anchor`
//! crate for the capture state machine.
//!
//! ```
//! use nalgebra::Point3;
//! use scene_anchor_core::{solve, SceneDefinition};
//!
//! let scene = SceneDefinition::sample();
//! let rec = solve(&scene, Point3::new(-2.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)).unwrap();
//! assert_eq!(rec.scale, 4.0);
//! ```

mod logger;
mod rotation;
mod scene;
mod similarity;
mod solver;

pub use rotation::{perpendicular_axis, shortest_arc};
pub use scene::{ColorToken, Item, SceneDefinition, SceneError, SceneSpec};
pub use similarity::Similarity;
pub use solver::{
    authored_transform, reconstruct, solve, solve_with, ItemFrame, Reconstruction, RemappedItem,
    ScaleLaw, SolveError, SolverParams,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_env, LOG_ENV};

pub use nalgebra::{Point3, UnitQuaternion, Vector3};
