//! JSON configuration and report helpers.

use std::{
    fs,
    path::{Path, PathBuf},
};

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use scene_anchor_core::{Reconstruction, SceneDefinition, SceneError, SceneSpec, SolverParams};

use crate::reconstructor::{SceneReconstructor, SessionEvent};
use crate::session::CaptureState;

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// A scene plus a recorded sequence of captured points to replay against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub scene: SceneSpec,
    #[serde(default)]
    pub solver: SolverParams,
    #[serde(default)]
    pub captures: Vec<Point3<f64>>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl CalibrationConfig {
    /// Sample scene with captures that double its baseline.
    pub fn sample() -> Self {
        Self {
            scene: SceneDefinition::sample().spec().clone(),
            solver: SolverParams::default(),
            captures: vec![Point3::new(-2.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)],
            output_path: None,
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("scene_anchor_report.json"))
    }

    /// Build a validated scene definition from the config.
    pub fn build_scene(&self) -> Result<SceneDefinition, ConfigError> {
        Ok(SceneDefinition::new(self.scene.clone())?)
    }

    /// Build a reconstructor for the configured scene and solver settings.
    pub fn build_reconstructor(&self) -> Result<SceneReconstructor, ConfigError> {
        Ok(SceneReconstructor::new(
            self.build_scene()?,
            self.solver.clone(),
        ))
    }
}

/// Outcome of replaying a config's captures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub config_path: String,
    pub scene_id: String,
    pub scene_name: String,
    pub captures: Vec<Point3<f64>>,
    #[serde(default)]
    pub events: Vec<SessionEvent>,
    pub final_state: CaptureState,
    #[serde(default)]
    pub reconstruction: Option<Reconstruction>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CalibrationReport {
    /// Build a base report from the input config.
    pub fn new(cfg: &CalibrationConfig, config_path: &Path) -> Self {
        Self {
            config_path: config_path.to_string_lossy().into_owned(),
            scene_id: cfg.scene.id.clone(),
            scene_name: cfg.scene.name.clone(),
            captures: cfg.captures.clone(),
            events: Vec::new(),
            final_state: CaptureState::AwaitingFirstLandmark,
            reconstruction: None,
            error: None,
        }
    }

    /// Append events in emission order.
    pub fn record(&mut self, events: impl IntoIterator<Item = SessionEvent>) {
        self.events.extend(events);
    }

    /// Copy the final session state and result from the reconstructor.
    pub fn finish(&mut self, reconstructor: &SceneReconstructor) {
        self.final_state = reconstructor.state();
        self.reconstruction = reconstructor.last_reconstruction().cloned();
    }

    /// Record a failure that prevented the replay.
    pub fn set_error(&mut self, err: impl std::fmt::Display) {
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Feed every capture of `cfg` to a fresh reconstructor and report the outcome.
///
/// A scene that fails validation yields a report with `error` set and no events.
pub fn replay(cfg: &CalibrationConfig, config_path: &Path) -> CalibrationReport {
    let mut report = CalibrationReport::new(cfg, config_path);
    let mut reconstructor = match cfg.build_reconstructor() {
        Ok(r) => r,
        Err(err) => {
            log::error!("invalid scene '{}': {err}", cfg.scene.id);
            report.set_error(err);
            return report;
        }
    };

    report.record([SessionEvent::Status(reconstructor.status())]);
    for &point in &cfg.captures {
        let events = reconstructor.capture_point(point);
        report.record(events);
    }
    report.finish(&reconstructor);
    report
}
