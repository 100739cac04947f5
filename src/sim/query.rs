//! Ground ray construction

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::transforms::TransformAccess;

/// A ray cast from an object toward the ground
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayQuery {
    /// Object world position at frame start
    pub origin: Vec3,
    /// Unit direction (opposite the up axis)
    pub direction: Vec3,
    /// Longest distance the ray is traced
    pub max_distance: f32,
}

impl RayQuery {
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction,
            max_distance,
        }
    }

    /// Point along the ray at distance `t`
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for RayQuery {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Y, f32::MAX)
    }
}

/// Overwrite `queries` with one downward ray per object
pub fn build_queries(
    transforms: &dyn TransformAccess,
    queries: &mut [RayQuery],
    direction: Vec3,
    max_distance: f32,
) {
    for (i, query) in queries.iter_mut().enumerate() {
        *query = RayQuery::new(transforms.world_position(i), direction, max_distance);
    }
}
