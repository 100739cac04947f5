//! Per-activation simulation buffers and frame phases

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::query::RayQuery;
use super::raycast::HitResult;
use crate::error::SimError;

/// Where the orchestrator is within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FramePhase {
    /// No frame work outstanding
    #[default]
    Idle,
    /// Building ray queries from current positions
    Query,
    /// Waiting on the intersection pass
    Intersect,
    /// Velocity integration running alongside the proximity scan
    IntegrateAggregate,
    /// Position apply in flight (resolved at the next frame's gate)
    Apply,
}

/// The N-sized buffers owned by an active simulation
#[derive(Debug)]
pub struct FrameBuffers {
    /// One signed velocity per object, persists across frames
    pub velocities: Vec<f32>,
    /// Rebuilt in place every frame
    pub queries: Vec<RayQuery>,
    /// Rebuilt in place every frame; shared with the apply job while it runs
    pub results: Arc<Vec<HitResult>>,
}

impl FrameBuffers {
    pub fn new(count: usize, initial_velocity: f32) -> Self {
        Self {
            velocities: vec![initial_velocity; count],
            queries: vec![RayQuery::default(); count],
            results: Arc::new(vec![HitResult::MISS; count]),
        }
    }

    /// Verify every buffer still holds exactly `count` entries
    pub fn check(&self, count: usize) -> Result<(), SimError> {
        let lengths = [
            ("velocity", self.velocities.len()),
            ("query", self.queries.len()),
            ("result", self.results.len()),
        ];
        for (buffer, actual) in lengths {
            if actual != count {
                return Err(SimError::LengthMismatch {
                    buffer,
                    expected: count,
                    actual,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffers_match_count() {
        let buffers = FrameBuffers::new(7, -1.0);
        assert!(buffers.check(7).is_ok());
        assert!(buffers.velocities.iter().all(|&v| v == -1.0));
        assert!(buffers.results.iter().all(|r| !r.is_hit()));
    }

    #[test]
    fn test_check_reports_first_bad_buffer() {
        let mut buffers = FrameBuffers::new(3, -1.0);
        buffers.velocities.clear();
        match buffers.check(3) {
            Err(SimError::LengthMismatch {
                buffer,
                expected,
                actual,
            }) => {
                assert_eq!(buffer, "velocity");
                assert_eq!(expected, 3);
                assert_eq!(actual, 0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
