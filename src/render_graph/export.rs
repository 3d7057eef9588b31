//! Deferred exports to shared scene state
//!
//! Passes queue `(slot, value)` pairs while they execute. The scheduler takes
//! the whole queue after the last pass and applies it to [`ExternalState`],
//! which the next frame's passes read. Nothing queued is visible in the frame
//! that queued it.

use crate::backend::types::TextureHandle;
use std::collections::HashMap;

/// Well-known external slots
pub mod slots {
    pub const SCENE_BACKGROUND: &str = "scene.background";
    pub const SCENE_ENVIRONMENT: &str = "scene.environment";
}

/// Value carried by an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportValue {
    Texture(TextureHandle),
    /// Remove the slot's value
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub id: String,
    pub value: ExportValue,
}

/// Exports queued during the current frame
#[derive(Debug, Default)]
pub struct ExportQueue {
    entries: Vec<ExportEntry>,
}

impl ExportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write to the same slot wins
    pub fn queue(&mut self, id: &str, value: ExportValue) {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => entry.value = value,
            None => self.entries.push(ExportEntry {
                id: id.to_string(),
                value,
            }),
        }
    }

    pub fn pending(&self, id: &str) -> Option<ExportValue> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold another queue in, entry by entry, so its writes win
    pub fn merge(&mut self, other: ExportQueue) {
        for entry in other.entries {
            self.queue(&entry.id, entry.value);
        }
    }

    /// Snapshot and clear
    pub fn take(&mut self) -> Vec<ExportEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Externally shared state, changed only at frame boundaries
#[derive(Debug, Default, Clone)]
pub struct ExternalState {
    slots: HashMap<String, TextureHandle>,
    generation: u64,
}

impl ExternalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self, id: &str) -> Option<TextureHandle> {
        self.slots.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Seed a slot outside of a frame
    pub fn set(&mut self, id: &str, value: ExportValue) {
        match value {
            ExportValue::Texture(texture) => {
                self.slots.insert(id.to_string(), texture);
            }
            ExportValue::Cleared => {
                self.slots.remove(id);
            }
        }
    }

    /// Apply a flushed batch; returns the number of entries applied
    pub fn apply(&mut self, batch: Vec<ExportEntry>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        let count = batch.len();
        for entry in batch {
            log::trace!("Export {} = {:?}", entry.id, entry.value);
            self.set(&entry.id, entry.value);
        }
        self.generation += 1;
        count
    }

    /// Number of non-empty batches applied so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
