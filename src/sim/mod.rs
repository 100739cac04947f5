//! Bounce pipeline
//!
//! Stages, in frame order:
//! - `query`: one downward ray per object from its world position
//! - `raycast`: batched intersection (black-box scene behind a trait)
//! - `integrate`: velocity update, then position apply along the up axis
//! - `proximity`: "any object near the ground" flag for the display
//!
//! `tick` sequences them and owns the buffers between activate/deactivate.

pub mod integrate;
pub mod proximity;
pub mod query;
pub mod raycast;
pub mod state;
pub mod tick;
pub mod transforms;

pub use integrate::{BounceParams, apply_all, integrate_all, integrate_velocity};
pub use proximity::{GroundProximity, ProximitySignal, aggregate};
pub use query::{RayQuery, build_queries};
pub use raycast::{
    Aabb, BoxScene, GroundPlane, HitResult, IntersectionExecutor, ParallelExecutor, RaycastScene,
    ray_aabb_intersect,
};
pub use state::{FrameBuffers, FramePhase};
pub use tick::BounceSimulation;
pub use transforms::{TransformAccess, TransformArray};
