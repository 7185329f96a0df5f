//! Authored scene: two reference landmarks and the items placed around them.

use std::fmt;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Opaque color value carried through to renderers (e.g. `"#FD0000"`).
///
/// Never parsed here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorToken(String);

impl ColorToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ColorToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One named, colored item at its authored position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub color: ColorToken,
    #[serde(alias = "position", alias = "originalPosition")]
    pub original_position: Point3<f64>,
}

impl Item {
    pub fn new(name: impl Into<String>, color: impl Into<ColorToken>, position: Point3<f64>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            original_position: position,
        }
    }
}

/// Raw, unvalidated scene record as stored in configuration files.
///
/// Legacy exports name the landmarks `referencePoint1`/`referencePoint2`;
/// both spellings are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneSpec {
    pub id: String,
    pub name: String,
    #[serde(alias = "referencePoint1")]
    pub landmark1: Point3<f64>,
    #[serde(alias = "referencePoint2")]
    pub landmark2: Point3<f64>,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// Scene validation errors.
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    #[error("scene id must not be empty")]
    EmptyId,
    #[error("reference landmarks coincide")]
    DegenerateReference,
    #[error("non-finite coordinate in {what}")]
    NonFiniteCoordinate { what: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Validated, immutable scene definition.
///
/// Deserializing goes through [`SceneDefinition::new`], so a loaded value
/// always has two distinct, finite landmarks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SceneSpec", into = "SceneSpec")]
pub struct SceneDefinition {
    spec: SceneSpec,
}

impl SceneDefinition {
    /// Validate and create a scene definition from a spec.
    pub fn new(spec: SceneSpec) -> Result<Self, SceneError> {
        if spec.id.trim().is_empty() {
            return Err(SceneError::EmptyId);
        }
        check_finite(&spec.landmark1, || "landmark1".to_owned())?;
        check_finite(&spec.landmark2, || "landmark2".to_owned())?;
        if (spec.landmark2 - spec.landmark1).norm_squared() == 0.0 {
            return Err(SceneError::DegenerateReference);
        }
        for (idx, item) in spec.items.iter().enumerate() {
            check_finite(&item.original_position, || {
                format!("item #{idx} ({})", item.name)
            })?;
        }
        Ok(Self { spec })
    }

    /// Parse and validate a scene from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self, SceneError> {
        let spec: SceneSpec = serde_json::from_str(raw)?;
        Self::new(spec)
    }

    /// Built-in demo scene: a 2-unit baseline along x with three items in front of it.
    pub fn sample() -> Self {
        Self {
            spec: SceneSpec {
                id: "1".to_owned(),
                name: "Scene1".to_owned(),
                landmark1: Point3::new(-1.0, 0.0, 0.0),
                landmark2: Point3::new(1.0, 0.0, 0.0),
                items: vec![
                    Item::new("Item1", "#FD0000", Point3::new(0.0, 0.0, 3.0)),
                    Item::new("Item2", "#07FF00", Point3::new(2.0, 0.0, 1.5)),
                    Item::new("Item3", "#001FFF", Point3::new(-2.0, 0.0, 1.5)),
                ],
            },
        }
    }

    #[inline]
    pub fn spec(&self) -> &SceneSpec {
        &self.spec
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.spec.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    #[inline]
    pub fn landmark1(&self) -> Point3<f64> {
        self.spec.landmark1
    }

    #[inline]
    pub fn landmark2(&self) -> Point3<f64> {
        self.spec.landmark2
    }

    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.spec.items
    }

    /// Authored baseline vector `landmark2 - landmark1`.
    #[inline]
    pub fn baseline(&self) -> Vector3<f64> {
        self.spec.landmark2 - self.spec.landmark1
    }
}

impl TryFrom<SceneSpec> for SceneDefinition {
    type Error = SceneError;

    fn try_from(spec: SceneSpec) -> Result<Self, Self::Error> {
        Self::new(spec)
    }
}

impl From<SceneDefinition> for SceneSpec {
    fn from(def: SceneDefinition) -> Self {
        def.spec
    }
}

fn check_finite(p: &Point3<f64>, what: impl FnOnce() -> String) -> Result<(), SceneError> {
    if p.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(SceneError::NonFiniteCoordinate { what: what() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_landmarks(a: Point3<f64>, b: Point3<f64>) -> SceneSpec {
        SceneSpec {
            id: "s".to_owned(),
            name: "test".to_owned(),
            landmark1: a,
            landmark2: b,
            items: vec![Item::new("box", "#FFFFFF", Point3::new(0.0, 1.0, 0.0))],
        }
    }

    #[test]
    fn sample_scene_is_valid() {
        let sample = SceneDefinition::sample();
        let rebuilt = SceneDefinition::new(sample.spec().clone()).expect("valid sample");
        assert_eq!(rebuilt, sample);
        assert_eq!(sample.items().len(), 3);
        assert_eq!(sample.baseline(), Vector3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn coinciding_landmarks_are_rejected() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let err = SceneDefinition::new(spec_with_landmarks(p, p)).unwrap_err();
        assert!(matches!(err, SceneError::DegenerateReference));
    }

    #[test]
    fn non_finite_item_is_rejected() {
        let mut spec = spec_with_landmarks(Point3::origin(), Point3::new(1.0, 0.0, 0.0));
        spec.items[0].original_position.z = f64::NAN;
        let err = SceneDefinition::new(spec).unwrap_err();
        match err {
            SceneError::NonFiniteCoordinate { what } => assert!(what.contains("box"), "{what}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_id_is_rejected() {
        let mut spec = spec_with_landmarks(Point3::origin(), Point3::new(1.0, 0.0, 0.0));
        spec.id = "  ".to_owned();
        assert!(matches!(
            SceneDefinition::new(spec).unwrap_err(),
            SceneError::EmptyId
        ));
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let raw = r##"{
            "id": "1",
            "name": "Scene1",
            "referencePoint1": [-1.0, 0.0, 0.0],
            "referencePoint2": [1.0, 0.0, 0.0],
            "items": [
                { "name": "Item1", "color": "#FD0000", "position": [0.0, 0.0, 3.0] }
            ]
        }"##;
        let def = SceneDefinition::from_json_str(raw).expect("legacy scene");
        assert_eq!(def.landmark1(), Point3::new(-1.0, 0.0, 0.0));
        assert_eq!(def.items()[0].color.as_str(), "#FD0000");
        assert_eq!(def.items()[0].original_position, Point3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn deserializing_validates() {
        let raw = r#"{"id":"x","name":"bad","landmark1":[0,0,0],"landmark2":[0,0,0]}"#;
        assert!(serde_json::from_str::<SceneDefinition>(raw).is_err());
        assert!(matches!(
            SceneDefinition::from_json_str(raw).unwrap_err(),
            SceneError::DegenerateReference
        ));
    }

    #[test]
    fn json_round_trip_keeps_scene() {
        let sample = SceneDefinition::sample();
        let json = serde_json::to_string(&sample).expect("serialize");
        let back: SceneDefinition = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, sample);
    }
}
