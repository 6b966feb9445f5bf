/// Per-segment world matrices from joint angles
use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

use crate::rig::{Joint, Level, Rig};

/// Current angle of each joint, in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub base: f32,
    pub shoulder: f32,
    pub wrist: f32,
}

impl JointAngles {
    pub fn new(base: f32, shoulder: f32, wrist: f32) -> Self {
        Self {
            base,
            shoulder,
            wrist,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, joint: Joint) -> f32 {
        match joint {
            Joint::Base => self.base,
            Joint::Shoulder => self.shoulder,
            Joint::Wrist => self.wrist,
        }
    }

    pub fn get_mut(&mut self, joint: Joint) -> &mut f32 {
        match joint {
            Joint::Base => &mut self.base,
            Joint::Shoulder => &mut self.shoulder,
            Joint::Wrist => &mut self.wrist,
        }
    }
}

/// Rotate by `angle` radians about `axis` through `pivot`.
///
/// Moves the pivot to the origin, rotates, and moves it back, so `pivot`
/// itself is a fixed point.
pub fn rotation_about_pivot(
    angle: f32,
    axis: &Unit<Vector3<f32>>,
    pivot: &Point3<f32>,
) -> Matrix4<f32> {
    let to_origin = Matrix4::new_translation(&-pivot.coords);
    let rotation = Rotation3::from_axis_angle(axis, angle).to_homogeneous();
    let back = Matrix4::new_translation(&pivot.coords);
    back * rotation * to_origin
}

/// The operator contributed by a single joint
pub fn joint_transform(rig: &Rig, joint: Joint, angles: &JointAngles) -> Matrix4<f32> {
    let spec = rig.joint(joint);
    rotation_about_pivot(
        angles.get(joint).to_radians(),
        &spec.axis,
        &spec.pivot.point,
    )
}

/// World matrix of a sub-mesh at `level`.
///
/// Proximal joints multiply on the left, so distal geometry inherits every
/// joint above it.
pub fn segment_transform(rig: &Rig, level: Level, angles: &JointAngles) -> Matrix4<f32> {
    level
        .joints()
        .iter()
        .fold(Matrix4::identity(), |world, &joint| {
            world * joint_transform(rig, joint, angles)
        })
}

/// World matrix for every sub-mesh, by import index
pub fn compose(rig: &Rig, angles: &JointAngles) -> Vec<Matrix4<f32>> {
    let joints = Joint::ALL.map(|joint| joint_transform(rig, joint, angles));
    // Prefix products: chain[d] covers base..=joint d
    let chain = [
        joints[0],
        joints[0] * joints[1],
        joints[0] * joints[1] * joints[2],
    ];
    rig.levels()
        .iter()
        .map(|level| chain[level.depth()])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundsMap;
    use crate::geometry::SubMesh;
    use crate::rig::RigConfig;
    use approx::assert_abs_diff_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::f32::consts::FRAC_PI_2;

    /// Three sub-meshes, one per level; shoulder pivot (2, 1, 0), wrist pivot (0, 3, 0)
    fn test_rig() -> Rig {
        let meshes = vec![
            SubMesh::cuboid("base", Point3::new(-1.0, -0.5, -1.0), Point3::new(1.0, 0.0, 1.0)),
            SubMesh::cuboid("shoulder", Point3::new(1.0, 0.0, -1.0), Point3::new(3.0, 2.0, 1.0)),
            SubMesh::cuboid("wrist", Point3::new(-0.5, 2.5, -0.5), Point3::new(0.5, 3.5, 0.5)),
        ];
        let config = RigConfig {
            shoulder_reference: "shoulder".to_owned(),
            wrist_reference: "wrist".to_owned(),
            levels: vec![Level::Base, Level::Shoulder, Level::Wrist],
            ..RigConfig::default()
        };
        Rig::resolve(&config, &BoundsMap::from_meshes(&meshes), meshes.len()).unwrap()
    }

    #[test]
    fn test_pivot_is_fixed_point() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..500 {
            let axis = Unit::new_normalize(Vector3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(0.1..1.0),
            ));
            let pivot = Point3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            );
            let angle = rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
            let op = rotation_about_pivot(angle, &axis, &pivot);
            assert_abs_diff_eq!(op.transform_point(&pivot), pivot, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_zero_angles_give_identity() {
        let rig = test_rig();
        for world in compose(&rig, &JointAngles::zero()) {
            assert_abs_diff_eq!(world, Matrix4::identity());
        }
    }

    #[test]
    fn test_base_rotation_applies_to_every_level() {
        let rig = test_rig();
        let angles = JointAngles::new(90.0, 0.0, 0.0);
        let expected = Rotation3::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2).to_homogeneous();
        let worlds = compose(&rig, &angles);
        assert_abs_diff_eq!(worlds[0], expected, epsilon = 1e-6);
        assert_abs_diff_eq!(worlds[1], expected, epsilon = 1e-6);
        assert_abs_diff_eq!(worlds[2], expected, epsilon = 1e-6);
    }

    #[test]
    fn test_shoulder_rotates_about_its_pivot() {
        let rig = test_rig();
        assert_eq!(rig.joint(Joint::Shoulder).pivot.point, Point3::new(2.0, 1.0, 0.0));

        let angles = JointAngles::new(0.0, 30.0, 0.0);
        let world = segment_transform(&rig, Level::Shoulder, &angles);
        let (sin, cos) = 30f32.to_radians().sin_cos();

        // (2, 1, 1) is one unit along +Z from the pivot
        let moved = world.transform_point(&Point3::new(2.0, 1.0, 1.0));
        assert_abs_diff_eq!(moved, Point3::new(2.0, 1.0 - sin, cos), epsilon = 1e-6);

        // The origin sits at (-2, -1, 0) relative to the pivot
        let moved = world.transform_point(&Point3::origin());
        assert_abs_diff_eq!(moved, Point3::new(0.0, 1.0 - cos, -sin), epsilon = 1e-6);

        // Base-level geometry ignores the shoulder
        let base = segment_transform(&rig, Level::Base, &angles);
        assert_abs_diff_eq!(base, Matrix4::identity());
    }

    #[test]
    fn test_wrist_inherits_shoulder_motion() {
        let rig = test_rig();
        let angles = JointAngles::new(0.0, 45.0, 0.0);
        let shoulder = segment_transform(&rig, Level::Shoulder, &angles);
        let wrist = segment_transform(&rig, Level::Wrist, &angles);
        assert_abs_diff_eq!(shoulder, wrist, epsilon = 1e-6);

        // With the wrist also bent, its own pivot follows the shoulder
        let angles = JointAngles::new(0.0, 45.0, 20.0);
        let wrist = segment_transform(&rig, Level::Wrist, &angles);
        let shoulder = segment_transform(&rig, Level::Shoulder, &angles);
        let wrist_pivot = rig.joint(Joint::Wrist).pivot.point;
        assert_abs_diff_eq!(
            wrist.transform_point(&wrist_pivot),
            shoulder.transform_point(&wrist_pivot),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_compose_matches_segment_transform() {
        let rig = test_rig();
        let angles = JointAngles::new(-40.0, 12.5, 70.0);
        let worlds = compose(&rig, &angles);
        for (index, world) in worlds.iter().enumerate() {
            let level = rig.level(index).unwrap();
            assert_abs_diff_eq!(*world, segment_transform(&rig, level, &angles), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_compose_is_deterministic() {
        let base = test_rig();
        let mut rng = ChaCha8Rng::seed_from_u64(0xA11);
        for _ in 0..200 {
            let levels: Vec<Level> = (0..rng.gen_range(1..12))
                .map(|_| match rng.gen_range(0..3) {
                    0 => Level::Base,
                    1 => Level::Shoulder,
                    _ => Level::Wrist,
                })
                .collect();
            let rig = rig_with_levels(&base, levels);
            let angles = JointAngles::new(
                rng.gen_range(-150.0..=150.0),
                rng.gen_range(-25.0..=60.0),
                rng.gen_range(-30.0..=75.0),
            );
            let first = compose(&rig, &angles);
            let second = compose(&rig, &angles);
            assert_eq!(first.len(), rig.len());
            for (a, b) in first.iter().zip(&second) {
                for (x, y) in a.iter().zip(b.iter()) {
                    assert_eq!(x.to_bits(), y.to_bits());
                }
            }
        }
    }

    fn rig_with_levels(template: &Rig, levels: Vec<Level>) -> Rig {
        let meshes: Vec<SubMesh> = levels
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let name = match i {
                    0 => "shoulder".to_owned(),
                    1 => "wrist".to_owned(),
                    _ => format!("piece.{i}"),
                };
                SubMesh::cuboid(
                    name,
                    Point3::new(0.0, i as f32, 0.0),
                    Point3::new(1.0, i as f32 + 1.0, 1.0),
                )
            })
            .collect();
        let config = RigConfig {
            shoulder_reference: "shoulder".to_owned(),
            wrist_reference: "wrist".to_owned(),
            levels,
            ..RigConfig::default()
        };
        let rig = Rig::resolve(&config, &BoundsMap::from_meshes(&meshes), meshes.len()).unwrap();
        assert_eq!(rig.joint(Joint::Base), template.joint(Joint::Base));
        rig
    }
}
