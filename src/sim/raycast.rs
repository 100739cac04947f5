//! Batched ray intersection
//!
//! The pipeline only needs "how far down is the nearest surface" per query.
//! [`IntersectionExecutor`] is the batch seam; [`ParallelExecutor`] adapts any
//! single-ray [`RaycastScene`] into it by fanning queries out over the worker
//! pool in fixed-size batches.

use glam::Vec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::query::RayQuery;
use crate::error::IntersectError;

/// Outcome of one ground ray
///
/// A miss keeps the zero distance of an empty hit record. Both the bounce and
/// the near checks read `distance` directly, so an object that has sunk below
/// the ground (its ray finds nothing) is treated as touching it and kicked
/// back up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    /// Distance to the nearest surface, 0 on a miss
    pub distance: f32,
    /// Whether a surface was found
    pub hit: bool,
}

impl HitResult {
    /// No surface within range
    pub const MISS: Self = Self {
        distance: 0.0,
        hit: false,
    };

    pub fn hit(distance: f32) -> Self {
        Self {
            distance,
            hit: true,
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.hit
    }
}

impl Default for HitResult {
    fn default() -> Self {
        Self::MISS
    }
}

/// Resolves a batch of independent queries
///
/// Implementations must fill `results[i]` for `queries[i]` and may process
/// queries in any order or in parallel. `min_batch` is the smallest number of
/// queries worth handing to one worker.
pub trait IntersectionExecutor: Send + Sync {
    fn batch_intersect(
        &self,
        queries: &[RayQuery],
        results: &mut [HitResult],
        min_batch: usize,
    ) -> Result<(), IntersectError>;
}

/// Single-ray scene query
pub trait RaycastScene: Send + Sync {
    /// Distance along the ray to the nearest surface within `max_distance`
    fn raycast(&self, query: &RayQuery) -> Option<f32>;
}

/// Runs a [`RaycastScene`] over the current rayon pool
#[derive(Debug, Clone)]
pub struct ParallelExecutor<S> {
    scene: S,
}

impl<S: RaycastScene> ParallelExecutor<S> {
    pub fn new(scene: S) -> Self {
        Self { scene }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }
}

impl<S: RaycastScene> IntersectionExecutor for ParallelExecutor<S> {
    fn batch_intersect(
        &self,
        queries: &[RayQuery],
        results: &mut [HitResult],
        min_batch: usize,
    ) -> Result<(), IntersectError> {
        if queries.len() != results.len() {
            return Err(IntersectError::ResultCount {
                expected: queries.len(),
                actual: results.len(),
            });
        }

        let batch = min_batch.max(1);
        results
            .par_chunks_mut(batch)
            .zip(queries.par_chunks(batch))
            .for_each(|(out, chunk)| {
                for (result, query) in out.iter_mut().zip(chunk) {
                    *result = self
                        .scene
                        .raycast(query)
                        .map_or(HitResult::MISS, HitResult::hit);
                }
            });
        Ok(())
    }
}

/// Infinite plane through `point` with the given `normal`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPlane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl GroundPlane {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: crate::normalize_axis(normal),
        }
    }

    /// Horizontal plane at `y = height`
    pub fn horizontal(height: f32) -> Self {
        Self::new(Vec3::new(0.0, height, 0.0), Vec3::Y)
    }
}

impl RaycastScene for GroundPlane {
    fn raycast(&self, query: &RayQuery) -> Option<f32> {
        let denom = query.direction.dot(self.normal);
        // Parallel rays and rays cast away from the surface never hit
        if denom >= -1e-6 {
            return None;
        }
        let t = (self.point - query.origin).dot(self.normal) / denom;
        (t >= 0.0 && t <= query.max_distance).then_some(t)
    }
}

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }
}

/// Ray-AABB test using the slab method
///
/// Returns the distance to the first surface crossed, or the exit distance
/// when the ray starts inside the box.
pub fn ray_aabb_intersect(origin: Vec3, direction: Vec3, aabb: &Aabb) -> Option<f32> {
    let inv = |d: f32| if d.abs() > 1e-10 { 1.0 / d } else { f32::MAX * d.signum() };
    let inv_dir = Vec3::new(inv(direction.x), inv(direction.y), inv(direction.z));

    let t1 = (aabb.min - origin) * inv_dir;
    let t2 = (aabb.max - origin) * inv_dir;

    let t_min = t1.min(t2).max_element();
    let t_max = t1.max(t2).min_element();

    if t_max >= t_min && t_max >= 0.0 {
        Some(if t_min >= 0.0 { t_min } else { t_max })
    } else {
        None
    }
}

/// Static set of boxes (floors, platforms)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoxScene {
    pub boxes: Vec<Aabb>,
}

impl BoxScene {
    pub fn new(boxes: Vec<Aabb>) -> Self {
        Self { boxes }
    }
}

impl RaycastScene for BoxScene {
    fn raycast(&self, query: &RayQuery) -> Option<f32> {
        self.boxes
            .iter()
            .filter_map(|aabb| ray_aabb_intersect(query.origin, query.direction, aabb))
            .filter(|&t| t <= query.max_distance)
            .min_by(|a, b| a.total_cmp(b))
    }
}
