/// Free-fly camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

/// Camera translation directions, relative to where the camera looks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Yaw/pitch camera that flies through the scene.
///
/// Angles are in degrees. `yaw = -90` looks down -Z.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
    pub position: Point3<f32>,
    pub up: Vector3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second
    pub speed: f32,
    /// Degrees per unit of look input
    pub sensitivity: f32,
}

impl FlyCamera {
    pub const MIN_FOV: f32 = 1.0;
    pub const MAX_FOV: f32 = 90.0;
    pub const PITCH_LIMIT: f32 = 89.0;

    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position,
            up: Vector3::y(),
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
            speed: 2.5,
            sensitivity: 0.1,
        }
    }

    /// Unit view direction
    pub fn front(&self) -> Vector3<f32> {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.front().cross(&self.up).normalize()
    }

    /// Move for `dt` seconds
    pub fn translate(&mut self, movement: Movement, dt: f32) {
        let distance = self.speed * dt;
        let offset = match movement {
            Movement::Forward => self.front(),
            Movement::Backward => -self.front(),
            Movement::Left => -self.right(),
            Movement::Right => self.right(),
        };
        self.position += offset * distance;
    }

    /// Turn by look offsets; positive `dy` looks up
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity)
            .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// Narrow the field of view by a scroll offset
    pub fn zoom(&mut self, scroll: f32) {
        self.fov = (self.fov - scroll).clamp(Self::MIN_FOV, Self::MAX_FOV);
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let target = self.position + self.front();
        Matrix4::look_at_rh(&self.position, &target, &self.up)
    }

    /// Create the perspective projection matrix (OpenGL clip depth).
    /// A degenerate aspect (zero-sized viewport) falls back to square.
    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Matrix4::new_perspective(aspect, self.fov.to_radians(), self.near, self.far)
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 5.0))
    }
}

/// Turns absolute pointer positions into look offsets.
///
/// The first sample only records the position, so the camera does not jump
/// when the pointer is first seen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouseLook {
    last: Option<(f32, f32)>,
}

impl MouseLook {
    /// Offsets for a pointer now at (`x`, `y`), screen y growing downward
    pub fn delta(&mut self, x: f32, y: f32) -> (f32, f32) {
        let offset = match self.last {
            Some((last_x, last_y)) => (x - last_x, last_y - y),
            None => (0.0, 0.0),
        };
        self.last = Some((x, y));
        offset
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
