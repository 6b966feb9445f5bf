/// Joint angle state driven by held keys, clamped to static limits
use serde::{Deserialize, Serialize};

use crate::pose::JointAngles;
use crate::rig::{Joint, Rig};

/// Static angle range of a joint, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    pub min: f32,
    pub max: f32,
}

impl JointLimits {
    pub const BASE: Self = Self::new(-150.0, 150.0);
    pub const SHOULDER: Self = Self::new(-25.0, 60.0);
    pub const WRIST: Self = Self::new(-30.0, 75.0);

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Saturating clamp: out-of-range values pin to the nearest bound
    pub fn clamp(&self, degrees: f32) -> f32 {
        degrees.max(self.min).min(self.max)
    }

    pub fn contains(&self, degrees: f32) -> bool {
        (self.min..=self.max).contains(&degrees)
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Held state of a joint's two drive keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JointDrive {
    pub increase: bool,
    pub decrease: bool,
}

impl JointDrive {
    /// Signed angle change for one tick; opposing keys cancel
    pub fn delta(self, step: f32) -> f32 {
        let mut delta = 0.0;
        if self.increase {
            delta += step;
        }
        if self.decrease {
            delta -= step;
        }
        delta
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JointInput {
    pub base: JointDrive,
    pub shoulder: JointDrive,
    pub wrist: JointDrive,
}

impl JointInput {
    pub fn drive(&self, joint: Joint) -> JointDrive {
        match joint {
            Joint::Base => self.base,
            Joint::Shoulder => self.shoulder,
            Joint::Wrist => self.wrist,
        }
    }
}

/// Owns the current angles of all three joints.
///
/// Angles start at zero and are only ever changed by [`JointController::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct JointController {
    angles: JointAngles,
    limits: [JointLimits; 3],
    step: f32,
}

impl JointController {
    /// `limits` are indexed base, shoulder, wrist; `step` is degrees per tick.
    pub fn new(limits: [JointLimits; 3], step: f32) -> Self {
        Self {
            angles: JointAngles::zero(),
            limits,
            step,
        }
    }

    pub fn from_rig(rig: &Rig, step: f32) -> Self {
        Self::new(Joint::ALL.map(|joint| rig.joint(joint).limits), step)
    }

    pub fn angles(&self) -> &JointAngles {
        &self.angles
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn limits(&self, joint: Joint) -> JointLimits {
        self.limits[joint.index()]
    }

    /// Apply one input tick to every joint
    pub fn tick(&mut self, input: &JointInput) {
        for joint in Joint::ALL {
            let limits = self.limits[joint.index()];
            let angle = self.angles.get_mut(joint);
            *angle = limits.clamp(*angle + input.drive(joint).delta(self.step));
        }
    }
}

impl Default for JointController {
    fn default() -> Self {
        Self::new(
            [JointLimits::BASE, JointLimits::SHOULDER, JointLimits::WRIST],
            0.5,
        )
    }
}
