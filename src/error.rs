//! Error types
//!
//! The pipeline itself is total over well-formed buffers. What can go wrong is
//! lifecycle misuse, bad configuration, or an intersection backend failing.

use thiserror::Error;

/// Faults raised by the frame orchestrator
#[derive(Error, Debug)]
pub enum SimError {
    /// `tick()` (or a snapshot) called before `activate()` or after `deactivate()`
    #[error("simulation is not active")]
    Inactive,

    /// `activate()` called twice without `deactivate()` in between
    #[error("simulation is already active")]
    AlreadyActive,

    /// A per-object buffer no longer matches the tracked object count
    #[error("{buffer} buffer holds {actual} entries, expected {expected}")]
    LengthMismatch {
        /// Buffer name
        buffer: &'static str,
        /// Object count fixed at activation
        expected: usize,
        /// Observed length
        actual: usize,
    },

    /// The intersection pass failed; the frame produced no results
    #[error("intersection pass failed: {0}")]
    Intersect(#[from] IntersectError),

    /// Worker pool could not be created
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The deferred apply job went away without handing back its buffers
    #[error("apply job for frame {frame} exited before completing")]
    WorkerLost {
        /// Frame the job belonged to
        frame: u64,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Faults raised by an intersection backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntersectError {
    /// Backend cannot serve queries right now
    #[error("intersection backend unavailable: {0}")]
    Unavailable(String),

    /// Query and result buffers disagree in length
    #[error("{actual} result slots for {expected} queries")]
    ResultCount {
        /// Number of queries
        expected: usize,
        /// Number of result slots
        actual: usize,
    },
}

/// Faults raised while loading or validating settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the pipeline cannot run with
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
