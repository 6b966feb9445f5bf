//! Joint hierarchy of the manipulator.
//!
//! The arm has three revolute joints. Every sub-mesh is assigned a [`Level`]
//! naming the most distal joint whose rotation it follows. The assignment is a
//! table keyed by import index, tied to the node ordering of one specific
//! asset, so it lives in [`RigConfig`] rather than being inferred from the
//! scene.

use std::fmt;

use nalgebra::{Point3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::bounds::BoundsMap;
use crate::joints::JointLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Joint {
    Base,
    Shoulder,
    Wrist,
}

impl Joint {
    /// Proximal to distal
    pub const ALL: [Joint; 3] = [Joint::Base, Joint::Shoulder, Joint::Wrist];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn level(self) -> Level {
        match self {
            Joint::Base => Level::Base,
            Joint::Shoulder => Level::Shoulder,
            Joint::Wrist => Level::Wrist,
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Joint::Base => "base",
            Joint::Shoulder => "shoulder",
            Joint::Wrist => "wrist",
        })
    }
}

/// Hierarchy depth of a sub-mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Base = 0,
    Shoulder = 1,
    Wrist = 2,
}

impl Level {
    pub fn depth(self) -> usize {
        self as usize
    }

    /// Joints whose rotations apply at this level, base first
    pub fn joints(self) -> &'static [Joint] {
        match self {
            Level::Base => &[Joint::Base],
            Level::Shoulder => &[Joint::Base, Joint::Shoulder],
            Level::Wrist => &Joint::ALL,
        }
    }
}

/// Rotation axis and angle range of one joint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JointSpec {
    pub axis: Vector3<f32>,
    pub limits: JointLimits,
}

/// Declarative description of how an asset is rigged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RigConfig {
    /// Sub-mesh whose box center is the shoulder pivot
    pub shoulder_reference: String,
    /// Sub-mesh whose box center is the wrist pivot
    pub wrist_reference: String,
    /// Level of each sub-mesh, by import index
    pub levels: Vec<Level>,
    pub base: JointSpec,
    pub shoulder: JointSpec,
    pub wrist: JointSpec,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            shoulder_reference: "Cube.002".to_owned(),
            wrist_reference: "Cube.003".to_owned(),
            levels: vec![
                Level::Base,
                Level::Shoulder,
                Level::Base,
                Level::Wrist,
                Level::Base,
                Level::Shoulder,
            ],
            base: JointSpec {
                axis: Vector3::y(),
                limits: JointLimits::BASE,
            },
            shoulder: JointSpec {
                axis: Vector3::x(),
                limits: JointLimits::SHOULDER,
            },
            wrist: JointSpec {
                axis: Vector3::x(),
                limits: JointLimits::WRIST,
            },
        }
    }
}

impl RigConfig {
    pub fn spec(&self, joint: Joint) -> &JointSpec {
        match joint {
            Joint::Base => &self.base,
            Joint::Shoulder => &self.shoulder,
            Joint::Wrist => &self.wrist,
        }
    }

    /// Name of the sub-mesh that locates `joint`; the base turns about the origin
    pub fn reference(&self, joint: Joint) -> Option<&str> {
        match joint {
            Joint::Base => None,
            Joint::Shoulder => Some(&self.shoulder_reference),
            Joint::Wrist => Some(&self.wrist_reference),
        }
    }

    pub fn validate(&self) -> Result<(), RigError> {
        for joint in Joint::ALL {
            let spec = self.spec(joint);
            if !spec.limits.is_valid() {
                return Err(RigError::InvalidLimits {
                    joint,
                    min: spec.limits.min,
                    max: spec.limits.max,
                });
            }
            if spec.axis.norm() <= f32::EPSILON || !spec.axis.iter().all(|c| c.is_finite()) {
                return Err(RigError::ZeroAxis(joint));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RigError {
    #[error("rig expects {expected} sub-meshes but the asset has {found}")]
    MeshCountMismatch { expected: usize, found: usize },
    #[error("{0} joint has an unusable rotation axis")]
    ZeroAxis(Joint),
    #[error("{joint} joint limits [{min}, {max}] are not a valid range")]
    InvalidLimits { joint: Joint, min: f32, max: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotSource {
    /// Fixed by definition (the base turns about the world origin)
    Fixed,
    /// Center of the configured reference sub-mesh
    Resolved,
    /// Reference sub-mesh missing or empty; the origin stands in
    Defaulted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub point: Point3<f32>,
    pub source: PivotSource,
}

impl Pivot {
    pub fn is_defaulted(&self) -> bool {
        self.source == PivotSource::Defaulted
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigJoint {
    pub axis: Unit<Vector3<f32>>,
    pub pivot: Pivot,
    pub limits: JointLimits,
}

/// A rig resolved against one loaded asset. Read-only after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Rig {
    levels: Vec<Level>,
    joints: [RigJoint; 3],
}

impl Rig {
    pub fn resolve(
        config: &RigConfig,
        bounds: &BoundsMap,
        mesh_count: usize,
    ) -> Result<Self, RigError> {
        config.validate()?;
        if config.levels.len() != mesh_count {
            return Err(RigError::MeshCountMismatch {
                expected: config.levels.len(),
                found: mesh_count,
            });
        }

        let joints = Joint::ALL.map(|joint| {
            let spec = config.spec(joint);
            RigJoint {
                axis: Unit::new_normalize(spec.axis),
                pivot: resolve_pivot(joint, config.reference(joint), bounds),
                limits: spec.limits,
            }
        });

        Ok(Self {
            levels: config.levels.clone(),
            joints,
        })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, mesh_index: usize) -> Option<Level> {
        self.levels.get(mesh_index).copied()
    }

    pub fn joint(&self, joint: Joint) -> &RigJoint {
        &self.joints[joint.index()]
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Joints whose pivot fell back to the origin
    pub fn defaulted_pivots(&self) -> impl Iterator<Item = Joint> + '_ {
        Joint::ALL
            .into_iter()
            .filter(|&joint| self.joint(joint).pivot.is_defaulted())
    }
}

fn resolve_pivot(joint: Joint, reference: Option<&str>, bounds: &BoundsMap) -> Pivot {
    let Some(name) = reference else {
        return Pivot {
            point: Point3::origin(),
            source: PivotSource::Fixed,
        };
    };
    match bounds.center_of(name) {
        Ok(point) => {
            debug!(%joint, reference = name, ?point, "pivot resolved");
            Pivot {
                point,
                source: PivotSource::Resolved,
            }
        }
        Err(error) => {
            warn!(%joint, reference = name, %error, "pivot defaulted to the origin");
            Pivot {
                point: Point3::origin(),
                source: PivotSource::Defaulted,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Model, SubMesh};
    use approx::assert_abs_diff_eq;

    fn boxes(names: &[&str]) -> Vec<SubMesh> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let offset = i as f32;
                SubMesh::cuboid(
                    *name,
                    Point3::new(offset, 0.0, 0.0),
                    Point3::new(offset + 1.0, 1.0, 1.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_level_prefixes() {
        assert_eq!(Level::Base.joints(), &[Joint::Base]);
        assert_eq!(Level::Shoulder.joints(), &[Joint::Base, Joint::Shoulder]);
        assert_eq!(Level::Wrist.joints(), &Joint::ALL);
    }

    #[test]
    fn test_resolve_default_rig_on_demo() {
        let model = Model::demo_manipulator();
        let bounds = BoundsMap::from_meshes(&model.meshes);
        let rig = Rig::resolve(&RigConfig::default(), &bounds, model.len()).unwrap();

        assert_eq!(rig.len(), 6);
        assert_eq!(rig.level(3), Some(Level::Wrist));
        assert_eq!(rig.level(6), None);
        assert_eq!(rig.joint(Joint::Base).pivot.source, PivotSource::Fixed);
        assert_eq!(rig.joint(Joint::Base).pivot.point, Point3::origin());
        let shoulder = rig.joint(Joint::Shoulder).pivot;
        assert_eq!(shoulder.source, PivotSource::Resolved);
        assert_abs_diff_eq!(shoulder.point, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
        assert_eq!(rig.defaulted_pivots().count(), 0);
    }

    #[test]
    fn test_missing_reference_defaults_to_origin() {
        let meshes = boxes(&["a", "b"]);
        let bounds = BoundsMap::from_meshes(&meshes);
        let config = RigConfig {
            shoulder_reference: "b".to_owned(),
            wrist_reference: "nowhere".to_owned(),
            levels: vec![Level::Base, Level::Wrist],
            ..RigConfig::default()
        };
        let rig = Rig::resolve(&config, &bounds, meshes.len()).unwrap();

        assert_eq!(rig.joint(Joint::Shoulder).pivot.point, Point3::new(1.5, 0.5, 0.5));
        let wrist = rig.joint(Joint::Wrist).pivot;
        assert!(wrist.is_defaulted());
        assert_eq!(wrist.point, Point3::origin());
        assert_eq!(rig.defaulted_pivots().collect::<Vec<_>>(), vec![Joint::Wrist]);
    }

    #[test]
    fn test_mesh_count_mismatch_fails() {
        let meshes = boxes(&["a", "b", "c"]);
        let bounds = BoundsMap::from_meshes(&meshes);
        let err = Rig::resolve(&RigConfig::default(), &bounds, meshes.len()).unwrap_err();
        assert_eq!(
            err,
            RigError::MeshCountMismatch {
                expected: 6,
                found: 3
            }
        );
    }

    #[test]
    fn test_axis_is_normalized() {
        let mut config = RigConfig {
            levels: vec![Level::Base],
            ..RigConfig::default()
        };
        config.shoulder.axis = Vector3::new(0.0, 0.0, 4.0);
        let bounds = BoundsMap::from_meshes(&boxes(&["Cube.002"]));
        let rig = Rig::resolve(&config, &bounds, 1).unwrap();
        assert_eq!(rig.joint(Joint::Shoulder).axis.into_inner(), Vector3::z());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RigConfig::default();
        config.wrist.axis = Vector3::zeros();
        assert_eq!(config.validate(), Err(RigError::ZeroAxis(Joint::Wrist)));
        assert_eq!(
            RigError::ZeroAxis(Joint::Wrist).to_string(),
            "wrist joint has an unusable rotation axis"
        );

        let mut config = RigConfig::default();
        config.base.limits = JointLimits::new(10.0, -10.0);
        assert!(matches!(
            config.validate(),
            Err(RigError::InvalidLimits {
                joint: Joint::Base,
                ..
            })
        ));
    }

    #[test]
    fn test_config_json_round_trip_shape() {
        let json = r#"{
            "shoulder_reference": "Arm",
            "wrist_reference": "Hand",
            "levels": ["base", "shoulder", "wrist"]
        }"#;
        let config: RigConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.shoulder_reference, "Arm");
        assert_eq!(config.levels, vec![Level::Base, Level::Shoulder, Level::Wrist]);
        // Unspecified joints keep their defaults
        assert_eq!(config.base.limits, JointLimits::BASE);

        let bad = r#"{ "levels": [], "elbow_reference": "x" }"#;
        assert!(serde_json::from_str::<RigConfig>(bad).is_err());
    }
}
