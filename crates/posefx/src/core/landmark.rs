//! Classifier-space landmarks and their mapping into scene space.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Landmark indices used by the effects.
pub mod index {
    pub const NOSE: usize = 0;
    pub const LEFT_EAR: usize = 7;
    pub const RIGHT_EAR: usize = 8;
    /// Hand model: middle-finger knuckle.
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const LEFT_INDEX: usize = 19;
    pub const RIGHT_INDEX: usize = 20;
    pub const LEFT_FOOT_INDEX: usize = 31;
    pub const RIGHT_FOOT_INDEX: usize = 32;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoseError {
    #[error("landmark buffer length {0} is not a multiple of 4")]
    Misaligned(usize),
}

/// A normalized classifier-space point. `x, y` are in [0, 1] for on-frame points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub visibility: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One frame of landmarks from the classifier (33 for a body, 21 for a hand).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PoseSnapshot {
    landmarks: Vec<Landmark>,
}

impl PoseSnapshot {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Decode a flat `[x, y, z, visibility]*` buffer.
    pub fn from_flat(data: &[f32]) -> Result<Self, PoseError> {
        if data.len() % 4 != 0 {
            return Err(PoseError::Misaligned(data.len()));
        }
        let landmarks = data
            .chunks_exact(4)
            .map(|c| Landmark::new(c[0], c[1], c[2], c[3]))
            .collect();
        Ok(Self { landmarks })
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    /// The landmark at `index`, if present, finite and visible enough.
    /// Zero confidence is always missing, whatever `min_visibility` says.
    pub fn require(&self, index: usize, min_visibility: f32) -> Option<&Landmark> {
        self.landmarks
            .get(index)
            .filter(|lm| lm.is_finite() && lm.visibility > 0.0 && lm.visibility >= min_visibility)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

/// Render surface dimensions in scene units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSize {
    pub width: f32,
    pub height: f32,
}

impl RenderSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    pub fn half_height(&self) -> f32 {
        self.height / 2.0
    }

    /// Map a classifier-space landmark into the centered, y-up scene.
    pub fn to_scene(&self, lm: &Landmark) -> Vec3 {
        Vec3::new(
            lm.x * self.width - self.half_width(),
            -(lm.y * self.height - self.half_height()),
            lm.z,
        )
    }
}

impl Default for RenderSize {
    fn default() -> Self {
        Self::new(1300.0, 600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_surface_edges() {
        let size = RenderSize::default();
        let top_left = size.to_scene(&Landmark::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(top_left, Vec3::new(-650.0, 300.0, 0.0));
        let bottom_right = size.to_scene(&Landmark::new(1.0, 1.0, -0.3, 1.0));
        assert_eq!(bottom_right, Vec3::new(650.0, -300.0, -0.3));
    }

    #[test]
    fn from_flat_decodes_quads() {
        let pose = PoseSnapshot::from_flat(&[0.1, 0.2, 0.3, 0.9, 0.5, 0.5, 0.0, 1.0]).unwrap();
        assert_eq!(pose.len(), 2);
        assert_eq!(pose.get(1), Some(&Landmark::new(0.5, 0.5, 0.0, 1.0)));
    }

    #[test]
    fn from_flat_rejects_partial_landmark() {
        assert_eq!(
            PoseSnapshot::from_flat(&[0.1, 0.2, 0.3]),
            Err(PoseError::Misaligned(3))
        );
    }

    #[test]
    fn require_filters_non_finite_and_invisible() {
        let pose = PoseSnapshot::new(vec![
            Landmark::new(f32::NAN, 0.5, 0.0, 1.0),
            Landmark::new(0.5, 0.5, 0.0, 0.1),
            Landmark::new(0.5, 0.5, 0.0, 0.9),
        ]);
        assert!(pose.require(0, 0.0).is_none());
        assert!(pose.require(1, 0.5).is_none());
        assert!(pose.require(1, 0.0).is_some());
        assert!(pose.require(2, 0.5).is_some());
        assert!(pose.require(40, 0.0).is_none());
    }

    #[test]
    fn zero_confidence_is_missing() {
        let pose = PoseSnapshot::from_flat(&[0.5, 0.5, 0.0, 0.0, 0.5, 0.5, 0.0, -1.0]).unwrap();
        assert!(pose.require(0, 0.0).is_none());
        assert!(pose.require(1, 0.0).is_none());
    }
}
