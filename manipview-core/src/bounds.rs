//! Axis-aligned bounding boxes, merged per sub-mesh name.
//!
//! Pivot points are derived from the centers of these boxes, so a box that
//! never saw a vertex must not yield a center.

use std::collections::BTreeMap;

use nalgebra::Point3;
use thiserror::Error;

use crate::geometry::SubMesh;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundsError {
    #[error("bounding box of `{0}` is empty")]
    Empty(String),
    #[error("no sub-mesh named `{0}`")]
    UnknownMesh(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
    initialized: bool,
}

impl Aabb {
    /// An empty box; `min`/`max` are sentinels until the first `expand`.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Point3::new(f32::MIN, f32::MIN, f32::MIN),
            initialized: false,
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Self {
        points.into_iter().fold(Self::empty(), |mut aabb, p| {
            aabb.expand(p);
            aabb
        })
    }

    pub fn expand(&mut self, point: &Point3<f32>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
        self.initialized = true;
    }

    /// Grow to enclose `other`. Merging an empty box is a no-op.
    pub fn merge(&mut self, other: &Aabb) {
        if !other.initialized {
            return;
        }
        if !self.initialized {
            *self = *other;
            return;
        }
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    pub fn merged(mut self, other: &Aabb) -> Self {
        self.merge(other);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn center(&self) -> Option<Point3<f32>> {
        self.initialized.then(|| nalgebra::center(&self.min, &self.max))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// Sub-mesh name to merged box
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundsMap {
    boxes: BTreeMap<String, Aabb>,
}

impl BoundsMap {
    pub fn from_meshes(meshes: &[SubMesh]) -> Self {
        let mut map = Self::default();
        for mesh in meshes {
            let local = Aabb::from_points(mesh.vertices.iter().map(|v| &v.position));
            map.insert(&mesh.name, &local);
        }
        map
    }

    /// Merge `aabb` into the entry for `name`, creating it if absent
    pub fn insert(&mut self, name: &str, aabb: &Aabb) {
        self.boxes
            .entry(name.to_owned())
            .or_insert_with(Aabb::empty)
            .merge(aabb);
    }

    pub fn get(&self, name: &str) -> Option<&Aabb> {
        self.boxes.get(name)
    }

    pub fn center_of(&self, name: &str) -> Result<Point3<f32>, BoundsError> {
        let aabb = self
            .get(name)
            .ok_or_else(|| BoundsError::UnknownMesh(name.to_owned()))?;
        aabb.center()
            .ok_or_else(|| BoundsError::Empty(name.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Aabb)> {
        self.boxes.iter().map(|(name, aabb)| (name.as_str(), aabb))
    }
}
