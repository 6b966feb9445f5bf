//! Manipview Core Library - geometry, rigging and pose logic
//!
//! This library provides the stateless core of the manipulator viewer:
//! mesh import, bounding boxes, the joint hierarchy, per-segment transform
//! composition, joint limits, and the fly camera.

pub mod app;
pub mod bounds;
pub mod camera;
pub mod config;
pub mod geometry;
pub mod import;
pub mod joints;
pub mod pose;
pub mod rig;

// Re-export commonly used types
pub use app::{Action, FrameMatrices, InputFrame, LoadError, ViewerState};
pub use bounds::{Aabb, BoundsError, BoundsMap};
pub use camera::{FlyCamera, MouseLook, Movement};
#[cfg(feature = "cli")]
pub use config::ViewerArgs;
pub use config::{AssetSource, ConfigError, ViewerConfig};
pub use geometry::{Model, SubMesh, Vertex};
pub use import::{load_model, ImportError};
pub use joints::{JointController, JointLimits};
pub use pose::{compose, rotation_about_pivot, JointAngles};
pub use rig::{Joint, Level, Pivot, PivotSource, Rig, RigConfig, RigError};
