//! Position access for tracked objects
//!
//! The pipeline never owns positions. It reads world positions when building
//! queries and writes local positions when applying velocity, through
//! [`TransformAccess`]. Apply runs on worker threads, so writes go through
//! `&self`.

use std::sync::{Mutex, PoisonError};

use glam::Vec3;

/// Indexed read/write access to object transforms
pub trait TransformAccess: Send + Sync {
    /// Number of tracked objects
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// World-space position (ray origin)
    fn world_position(&self, index: usize) -> Vec3;

    /// Position relative to the object's parent
    fn local_position(&self, index: usize) -> Vec3 {
        self.world_position(index)
    }

    fn set_local_position(&self, index: usize, position: Vec3);

    /// Offset the local position
    fn translate_local(&self, index: usize, delta: Vec3) {
        let position = self.local_position(index);
        self.set_local_position(index, position + delta);
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    parent: Vec3,
    local: Vec3,
}

/// Thread-safe transform store, one lock per object
#[derive(Debug, Default)]
pub struct TransformArray {
    slots: Vec<Mutex<Slot>>,
}

impl TransformArray {
    /// Objects placed directly in world space
    pub fn new(positions: impl IntoIterator<Item = Vec3>) -> Self {
        Self::with_parents(positions.into_iter().map(|p| (Vec3::ZERO, p)))
    }

    /// Objects under translated parents, given as `(parent_origin, local_position)`
    pub fn with_parents(entries: impl IntoIterator<Item = (Vec3, Vec3)>) -> Self {
        Self {
            slots: entries
                .into_iter()
                .map(|(parent, local)| Mutex::new(Slot { parent, local }))
                .collect(),
        }
    }

    /// World positions of every object, in index order
    pub fn world_positions(&self) -> Vec<Vec3> {
        (0..self.slots.len()).map(|i| self.world_position(i)).collect()
    }

    fn slot(&self, index: usize) -> Slot {
        *self.slots[index].lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TransformAccess for TransformArray {
    fn len(&self) -> usize {
        self.slots.len()
    }

    fn world_position(&self, index: usize) -> Vec3 {
        let slot = self.slot(index);
        slot.parent + slot.local
    }

    fn local_position(&self, index: usize) -> Vec3 {
        self.slot(index).local
    }

    fn set_local_position(&self, index: usize, position: Vec3) {
        self.slots[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .local = position;
    }

    fn translate_local(&self, index: usize, delta: Vec3) {
        self.slots[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .local += delta;
    }
}
