//! Ground proximity signal
//!
//! One flag for the whole set: "near" as soon as any ray lands closer than
//! the near threshold. The display reads it as an opacity, where near hides
//! the widget (alpha 0) and far shows it (alpha 1).

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use super::raycast::HitResult;

/// Whether any tracked object is close to the ground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GroundProximity {
    Near,
    #[default]
    Far,
}

impl GroundProximity {
    /// Widget opacity for this state
    pub fn alpha(self) -> f32 {
        match self {
            GroundProximity::Near => 0.0,
            GroundProximity::Far => 1.0,
        }
    }

    pub fn is_near(self) -> bool {
        self == GroundProximity::Near
    }

    fn to_bits(self) -> u8 {
        match self {
            GroundProximity::Near => 0,
            GroundProximity::Far => 1,
        }
    }

    fn from_bits(bits: u8) -> Self {
        if bits == 0 {
            GroundProximity::Near
        } else {
            GroundProximity::Far
        }
    }
}

/// Scan hits, stopping at the first one under `near_threshold`
pub fn aggregate(results: &[HitResult], near_threshold: f32) -> GroundProximity {
    if results.iter().any(|hit| hit.distance < near_threshold) {
        GroundProximity::Near
    } else {
        GroundProximity::Far
    }
}

/// Shared cell the display polls once per frame
#[derive(Debug, Clone)]
pub struct ProximitySignal {
    state: Arc<AtomicU8>,
}

impl ProximitySignal {
    pub fn new(initial: GroundProximity) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(initial.to_bits())),
        }
    }

    pub fn get(&self) -> GroundProximity {
        GroundProximity::from_bits(self.state.load(Ordering::Acquire))
    }

    pub fn alpha(&self) -> f32 {
        self.get().alpha()
    }

    /// Publish a new state, returning the previous one
    pub fn set(&self, proximity: GroundProximity) -> GroundProximity {
        GroundProximity::from_bits(self.state.swap(proximity.to_bits(), Ordering::AcqRel))
    }
}

impl Default for ProximitySignal {
    fn default() -> Self {
        Self::new(GroundProximity::Far)
    }
}
