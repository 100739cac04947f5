//! Velocity integration and position apply
//!
//! Velocity is one signed scalar per object along the up axis. Both passes are
//! per-object independent and run in `batch` sized chunks on the worker pool.

use glam::Vec3;
use rayon::prelude::*;

use super::raycast::HitResult;
use super::transforms::TransformAccess;

/// Motion constants for one integration pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceParams {
    pub bounce_threshold: f32,
    pub bounce_impulse: f32,
    pub gravity_step: f32,
}

impl From<&crate::Settings> for BounceParams {
    fn from(settings: &crate::Settings) -> Self {
        Self {
            bounce_threshold: settings.bounce_threshold,
            bounce_impulse: settings.bounce_impulse,
            gravity_step: settings.gravity_step,
        }
    }
}

/// Next velocity for one object
///
/// A falling object within the bounce threshold is reset to the impulse; the
/// gravity step is then subtracted unconditionally.
#[inline]
pub fn integrate_velocity(velocity: f32, hit_distance: f32, params: &BounceParams) -> f32 {
    let velocity = if velocity < 0.0 && hit_distance < params.bounce_threshold {
        params.bounce_impulse
    } else {
        velocity
    };
    velocity - params.gravity_step
}

/// Update every velocity from this frame's hits
pub fn integrate_all(velocities: &mut [f32], results: &[HitResult], params: &BounceParams, batch: usize) {
    velocities
        .par_chunks_mut(batch.max(1))
        .zip(results.par_chunks(batch.max(1)))
        .for_each(|(vels, hits)| {
            for (v, hit) in vels.iter_mut().zip(hits) {
                *v = integrate_velocity(*v, hit.distance, params);
            }
        });
}

/// Move every object along `up` by its (already updated) velocity
pub fn apply_all(transforms: &dyn TransformAccess, velocities: &[f32], up: Vec3, batch: usize) {
    let batch = batch.max(1);
    velocities
        .par_chunks(batch)
        .enumerate()
        .for_each(|(chunk, vels)| {
            let base = chunk * batch;
            for (offset, &v) in vels.iter().enumerate() {
                transforms.translate_local(base + offset, up * v);
            }
        });
}
