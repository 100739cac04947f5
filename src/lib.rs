//! Bounce Cubes - falling cubes that raycast the ground and bounce
//!
//! Core modules:
//! - `sim`: Per-frame pipeline (queries, intersections, integration, apply, proximity)
//! - `settings`: Tunable thresholds, impulse and worker layout
//! - `error`: Error taxonomy for lifecycle, configuration and intersection faults

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, IntersectError, SimError};
pub use settings::Settings;
pub use sim::{BounceSimulation, GroundProximity, ProximitySignal};

use glam::Vec3;

/// Default simulation constants
pub mod consts {
    /// Distance below which a falling cube is kicked back up
    pub const BOUNCE_THRESHOLD: f32 = 0.5;
    /// Distance below which the UI reports "near" (larger than the bounce threshold)
    pub const NEAR_THRESHOLD: f32 = 1.0;
    /// Upward velocity applied on bounce (units per tick)
    pub const BOUNCE_IMPULSE: f32 = 2.0;
    /// Velocity removed every tick
    pub const GRAVITY_STEP: f32 = 0.098;
    /// Velocity every cube starts with (falling)
    pub const INITIAL_VELOCITY: f32 = -1.0;
    /// Objects per parallel work item
    pub const BATCH_SIZE: usize = 20;
    /// Ray length used when none is configured
    pub const MAX_RAY_DISTANCE: f32 = f32::MAX;
}

/// Normalize an axis, falling back to +Y for degenerate input
#[inline]
pub fn normalize_axis(axis: Vec3) -> Vec3 {
    axis.try_normalize().unwrap_or(Vec3::Y)
}
