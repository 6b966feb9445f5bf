//! Application state shared by the frontends.
//!
//! The frame loop is the single owner of a [`ViewerState`]: it feeds one
//! [`InputFrame`] per tick into [`ViewerState::apply_input`] and reads the
//! matrices for drawing from [`ViewerState::frame`].

use std::collections::HashSet;

use nalgebra::{Matrix4, Point3};
use thiserror::Error;
use tracing::info;

use crate::bounds::BoundsMap;
use crate::camera::{FlyCamera, Movement};
use crate::config::{AssetSource, ConfigError, ViewerConfig};
use crate::geometry::Model;
use crate::import::{load_model, ImportError};
use crate::joints::{JointController, JointDrive, JointInput};
use crate::pose::{compose, JointAngles};
use crate::rig::{Rig, RigError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Rig(#[from] RigError),
}

/// Something a held key asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CameraForward,
    CameraBackward,
    CameraLeft,
    CameraRight,
    BaseIncrease,
    BaseDecrease,
    ShoulderIncrease,
    ShoulderDecrease,
    WristIncrease,
    WristDecrease,
}

impl Action {
    /// Default binding for a character key: WASD flies, 1-6 drive the joints
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c.to_ascii_lowercase() {
            'w' => Action::CameraForward,
            's' => Action::CameraBackward,
            'a' => Action::CameraLeft,
            'd' => Action::CameraRight,
            '1' => Action::BaseIncrease,
            '2' => Action::BaseDecrease,
            '3' => Action::ShoulderIncrease,
            '4' => Action::ShoulderDecrease,
            '5' => Action::WristIncrease,
            '6' => Action::WristDecrease,
            _ => return None,
        })
    }

    fn movement(self) -> Option<Movement> {
        match self {
            Action::CameraForward => Some(Movement::Forward),
            Action::CameraBackward => Some(Movement::Backward),
            Action::CameraLeft => Some(Movement::Left),
            Action::CameraRight => Some(Movement::Right),
            _ => None,
        }
    }
}

/// Input gathered over one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputFrame {
    pub held: HashSet<Action>,
    /// Look offsets; positive y looks up
    pub look: (f32, f32),
    pub scroll: f32,
}

impl InputFrame {
    pub fn press(&mut self, action: Action) {
        self.held.insert(action);
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn add_look(&mut self, dx: f32, dy: f32) {
        self.look.0 += dx;
        self.look.1 += dy;
    }

    pub fn joint_input(&self) -> JointInput {
        let drive = |increase, decrease| JointDrive {
            increase: self.is_held(increase),
            decrease: self.is_held(decrease),
        };
        JointInput {
            base: drive(Action::BaseIncrease, Action::BaseDecrease),
            shoulder: drive(Action::ShoulderIncrease, Action::ShoulderDecrease),
            wrist: drive(Action::WristIncrease, Action::WristDecrease),
        }
    }

    /// Drop the per-tick pointer motion, keeping held keys
    pub fn clear_motion(&mut self) {
        self.look = (0.0, 0.0);
        self.scroll = 0.0;
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMatrices {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub eye: Point3<f32>,
    /// One world matrix per sub-mesh, by import index
    pub world: Vec<Matrix4<f32>>,
}

#[derive(Debug, Clone)]
pub struct ViewerState {
    pub model: Model,
    pub rig: Rig,
    pub joints: JointController,
    pub camera: FlyCamera,
}

impl ViewerState {
    pub fn new(model: Model, rig: Rig, joint_step: f32) -> Self {
        let joints = JointController::from_rig(&rig, joint_step);
        Self {
            model,
            rig,
            joints,
            camera: FlyCamera::default(),
        }
    }

    /// Import the asset and resolve its rig. Any failure here is fatal.
    pub fn load(config: &ViewerConfig) -> Result<Self, LoadError> {
        let model = match &config.asset {
            AssetSource::File(path) => load_model(path)?,
            AssetSource::Demo => Model::demo_manipulator(),
        };
        let bounds = BoundsMap::from_meshes(&model.meshes);
        let rig = Rig::resolve(&config.rig, &bounds, model.len())?;
        let defaulted: Vec<_> = rig.defaulted_pivots().collect();
        info!(
            meshes = model.len(),
            named_boxes = bounds.len(),
            ?defaulted,
            "rig resolved"
        );
        Ok(Self::new(model, rig, config.joint_step))
    }

    pub fn angles(&self) -> &JointAngles {
        self.joints.angles()
    }

    /// Advance camera and joints by one tick lasting `dt` seconds
    pub fn apply_input(&mut self, input: &InputFrame, dt: f32) {
        for action in &input.held {
            if let Some(movement) = action.movement() {
                self.camera.translate(movement, dt);
            }
        }
        if input.look != (0.0, 0.0) {
            self.camera.look(input.look.0, input.look.1);
        }
        if input.scroll != 0.0 {
            self.camera.zoom(input.scroll);
        }
        self.joints.tick(&input.joint_input());
    }

    pub fn world_matrices(&self) -> Vec<Matrix4<f32>> {
        compose(&self.rig, self.joints.angles())
    }

    pub fn frame(&self, aspect: f32) -> FrameMatrices {
        FrameMatrices {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(aspect),
            eye: self.camera.position,
            world: self.world_matrices(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::path::PathBuf;

    fn demo() -> ViewerState {
        ViewerState::load(&ViewerConfig::demo().with_joint_step(1.0).unwrap()).unwrap()
    }

    #[test]
    fn test_char_bindings() {
        assert_eq!(Action::from_char('W'), Some(Action::CameraForward));
        assert_eq!(Action::from_char('6'), Some(Action::WristDecrease));
        assert_eq!(Action::from_char('x'), None);
    }

    #[test]
    fn test_demo_starts_at_rest() {
        let state = demo();
        let frame = state.frame(16.0 / 9.0);
        assert_eq!(frame.world.len(), state.model.len());
        for world in &frame.world {
            assert_abs_diff_eq!(*world, Matrix4::identity());
        }
        assert_eq!(frame.eye, Point3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_held_keys_drive_joints() {
        let mut state = demo();
        let mut input = InputFrame::default();
        input.press(Action::BaseIncrease);
        input.press(Action::ShoulderDecrease);
        for _ in 0..10 {
            state.apply_input(&input, 0.016);
        }
        assert_eq!(*state.angles(), JointAngles::new(10.0, -10.0, 0.0));

        input.release(Action::BaseIncrease);
        state.apply_input(&input, 0.016);
        assert_eq!(state.angles().base, 10.0);
        assert_eq!(state.angles().shoulder, -11.0);
    }

    #[test]
    fn test_input_moves_camera() {
        let mut state = demo();
        let mut input = InputFrame::default();
        input.press(Action::CameraForward);
        input.add_look(100.0, 0.0);
        input.scroll = 5.0;
        state.apply_input(&input, 1.0);
        assert!(state.camera.position.z < 5.0);
        assert_abs_diff_eq!(state.camera.yaw, -80.0, epsilon = 1e-4);
        assert_eq!(state.camera.fov, 40.0);

        input.clear_motion();
        assert_eq!(input.look, (0.0, 0.0));
        assert!(input.is_held(Action::CameraForward));
    }

    #[test]
    fn test_missing_asset_is_fatal() {
        let config = ViewerConfig::new(AssetSource::File(PathBuf::from("/nonexistent/arm.obj")));
        let err = ViewerState::load(&config).unwrap_err();
        assert!(matches!(err, LoadError::Import(ImportError::Io { .. })));
    }
}
