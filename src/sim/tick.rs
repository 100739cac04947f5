//! Frame orchestration
//!
//! One `tick()` runs: gate on last frame's apply, build queries, intersect,
//! then integrate+apply on the pool while the calling thread scans for ground
//! proximity and publishes the signal. Apply is left in flight and collected
//! at the next gate (or before returning when `deferred_apply` is off).

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use rayon::{ThreadPool, ThreadPoolBuilder};

use super::integrate::{BounceParams, apply_all, integrate_all};
use super::proximity::{GroundProximity, ProximitySignal, aggregate};
use super::query::build_queries;
use super::raycast::{IntersectionExecutor, ParallelExecutor, RaycastScene};
use super::state::{FrameBuffers, FramePhase};
use super::transforms::TransformAccess;
use crate::error::SimError;
use crate::settings::Settings;

/// Apply job handed to the pool; returns the velocity buffer when done
struct PendingApply {
    frame: u64,
    rx: Receiver<Vec<f32>>,
}

impl PendingApply {
    fn wait(self) -> Result<Vec<f32>, SimError> {
        self.rx
            .recv()
            .map_err(|_| SimError::WorkerLost { frame: self.frame })
    }
}

/// Everything that only exists between `activate()` and `deactivate()`
struct ActiveState {
    transforms: Arc<dyn TransformAccess>,
    pool: ThreadPool,
    buffers: FrameBuffers,
    count: usize,
    pending: Option<PendingApply>,
}

impl ActiveState {
    /// Block until the previous frame's apply has finished
    fn complete(&mut self) -> Result<(), SimError> {
        if let Some(pending) = self.pending.take() {
            self.buffers.velocities = pending.wait()?;
        }
        Ok(())
    }

    fn check(&self) -> Result<(), SimError> {
        let actual = self.transforms.len();
        if actual != self.count {
            return Err(SimError::LengthMismatch {
                buffer: "transform",
                expected: self.count,
                actual,
            });
        }
        self.buffers.check(self.count)
    }
}

fn advance(phase: &mut FramePhase, next: FramePhase) {
    log::trace!("{:?} -> {:?}", phase, next);
    *phase = next;
}

/// Falling, bouncing objects raycast against the ground every frame
pub struct BounceSimulation {
    settings: Settings,
    executor: Arc<dyn IntersectionExecutor>,
    signal: ProximitySignal,
    active: Option<ActiveState>,
    phase: FramePhase,
    frame: u64,
}

impl BounceSimulation {
    pub fn new(settings: Settings, executor: Arc<dyn IntersectionExecutor>) -> Result<Self, SimError> {
        settings.validate()?;
        Ok(Self {
            settings,
            executor,
            signal: ProximitySignal::default(),
            active: None,
            phase: FramePhase::Idle,
            frame: 0,
        })
    }

    /// Simulation over a single-ray scene, intersected on the worker pool
    pub fn with_scene<S: RaycastScene + 'static>(settings: Settings, scene: S) -> Result<Self, SimError> {
        Self::new(settings, Arc::new(ParallelExecutor::new(scene)))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle the display reads the proximity state from
    pub fn signal(&self) -> ProximitySignal {
        self.signal.clone()
    }

    pub fn proximity(&self) -> GroundProximity {
        self.signal.get()
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Frames completed since activation
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn object_count(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.count)
    }

    /// Allocate buffers for `transforms` and start every object falling
    pub fn activate(&mut self, transforms: Arc<dyn TransformAccess>) -> Result<(), SimError> {
        if self.active.is_some() {
            return Err(SimError::AlreadyActive);
        }

        let count = transforms.len();
        let mut builder = ThreadPoolBuilder::new()
            .thread_name(|i| format!("bounce-worker-{}", i))
            // A panicking apply job drops its sender; the gate reports WorkerLost
            .panic_handler(|_| log::error!("Worker job panicked"));
        if let Some(threads) = self.settings.worker_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;

        let active = ActiveState {
            transforms,
            pool,
            buffers: FrameBuffers::new(count, self.settings.initial_velocity),
            count,
            pending: None,
        };
        active.check()?;

        log::info!(
            "Activated {} objects on {} workers (batch {})",
            count,
            active.pool.current_num_threads(),
            self.settings.batch_size
        );

        self.active = Some(active);
        self.signal.set(GroundProximity::Far);
        self.phase = FramePhase::Idle;
        self.frame = 0;
        Ok(())
    }

    /// Wait for in-flight work, then release every buffer
    pub fn deactivate(&mut self) -> Result<(), SimError> {
        let mut active = self.active.take().ok_or(SimError::Inactive)?;
        let result = active.complete();
        self.phase = FramePhase::Idle;
        log::info!("Deactivated after {} frames", self.frame);
        result
    }

    /// Wait for the in-flight apply job
    ///
    /// A job that died took the velocity buffer with it, so the simulation is
    /// deactivated; later calls report `Inactive`.
    fn gate(&mut self) -> Result<(), SimError> {
        let active = self.active.as_mut().ok_or(SimError::Inactive)?;
        if let Err(err) = active.complete() {
            log::error!("{}; deactivating", err);
            self.active = None;
            self.phase = FramePhase::Idle;
            return Err(err);
        }
        Ok(())
    }

    /// Run one frame of the pipeline
    pub fn tick(&mut self) -> Result<(), SimError> {
        // Gate: last frame's apply owns the velocity buffer until it finishes
        self.gate()?;
        let active = self.active.as_mut().ok_or(SimError::Inactive)?;
        advance(&mut self.phase, FramePhase::Idle);
        active.check()?;

        if active.count == 0 {
            self.signal.set(GroundProximity::Far);
            self.frame += 1;
            return Ok(());
        }

        let settings = self.settings;
        let batch = settings.batch_size;

        advance(&mut self.phase, FramePhase::Query);
        build_queries(
            active.transforms.as_ref(),
            &mut active.buffers.queries,
            settings.ray_direction(),
            settings.max_ray_distance,
        );

        advance(&mut self.phase, FramePhase::Intersect);
        let queries = &active.buffers.queries;
        let results = Arc::make_mut(&mut active.buffers.results);
        let executor = self.executor.as_ref();
        if let Err(err) = active
            .pool
            .install(|| executor.batch_intersect(queries, results, batch))
        {
            log::error!("Frame {}: intersection failed: {}", self.frame, err);
            advance(&mut self.phase, FramePhase::Idle);
            return Err(err.into());
        }

        advance(&mut self.phase, FramePhase::IntegrateAggregate);
        let (tx, rx) = mpsc::channel();
        let mut velocities = std::mem::take(&mut active.buffers.velocities);
        let hits = Arc::clone(&active.buffers.results);
        let transforms = Arc::clone(&active.transforms);
        let params = BounceParams::from(&settings);
        let up = settings.up();
        active.pool.spawn(move || {
            integrate_all(&mut velocities, &hits, &params, batch);
            apply_all(transforms.as_ref(), &velocities, up, batch);
            // Release the hit buffer so the next frame can reuse it in place
            drop(hits);
            let _ = tx.send(velocities);
        });
        active.pending = Some(PendingApply {
            frame: self.frame,
            rx,
        });

        let proximity = aggregate(&active.buffers.results, settings.near_threshold);
        let previous = self.signal.set(proximity);
        if previous != proximity {
            log::debug!("Frame {}: ground proximity {:?} -> {:?}", self.frame, previous, proximity);
        }

        advance(&mut self.phase, FramePhase::Apply);
        self.frame += 1;

        if !settings.deferred_apply {
            self.gate()?;
            advance(&mut self.phase, FramePhase::Idle);
        }
        Ok(())
    }

    /// Current velocities, after any in-flight apply has landed
    pub fn velocities(&mut self) -> Result<Vec<f32>, SimError> {
        self.gate()?;
        if self.phase == FramePhase::Apply {
            advance(&mut self.phase, FramePhase::Idle);
        }
        let active = self.active.as_ref().ok_or(SimError::Inactive)?;
        Ok(active.buffers.velocities.clone())
    }

    /// Block until no frame work is outstanding
    pub fn flush(&mut self) -> Result<(), SimError> {
        self.velocities().map(|_| ())
    }
}

impl Drop for BounceSimulation {
    fn drop(&mut self) {
        if self.active.is_some() {
            if let Err(err) = self.deactivate() {
                log::warn!("Deactivate on drop failed: {}", err);
            }
        }
    }
}
