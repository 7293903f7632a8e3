#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-memory keyed instance pool backing the spawn port.
//!
//! Handles are preallocated per content key and recycled through free queues;
//! a key whose queue runs dry grows lazily. The pool stands in for the
//! engine-side object pool behind the same acquire/release contract.

use std::collections::{HashMap, VecDeque};

use lane_runner_core::{
    ContentKey, InstanceHandle, Orientation, SegmentId, SpawnPort, WorldPosition,
};
use tracing::warn;

/// Pool of reusable content instances keyed by content identifier.
#[derive(Debug, Default)]
pub struct InstancePool {
    free: HashMap<ContentKey, VecDeque<InstanceHandle>>,
    live: HashMap<InstanceHandle, ContentKey>,
    next_handle: u64,
}

impl InstancePool {
    /// Creates an empty pool with no registered keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a content key and preallocates the requested instances.
    ///
    /// Registering an existing key adds further preallocated instances.
    pub fn register(&mut self, key: ContentKey, preload: u32) {
        let mut handles = VecDeque::with_capacity(preload as usize);
        for _ in 0..preload {
            let handle = InstanceHandle::new(self.next_handle);
            self.next_handle += 1;
            handles.push_back(handle);
        }
        self.free.entry(key).or_default().extend(handles);
    }

    /// Reports whether the provided key was registered.
    #[must_use]
    pub fn is_registered(&self, key: &ContentKey) -> bool {
        self.free.contains_key(key)
    }

    /// Number of idle instances currently pooled for the provided key.
    #[must_use]
    pub fn available(&self, key: &ContentKey) -> usize {
        self.free.get(key).map(VecDeque::len).unwrap_or(0)
    }

    /// Number of instances currently held by segments.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    fn allocate(&mut self) -> InstanceHandle {
        let handle = InstanceHandle::new(self.next_handle);
        self.next_handle += 1;
        handle
    }
}

impl SpawnPort for InstancePool {
    fn acquire(
        &mut self,
        key: &ContentKey,
        _position: WorldPosition,
        _orientation: Orientation,
        _segment: SegmentId,
    ) -> Option<InstanceHandle> {
        if !self.free.contains_key(key) {
            warn!(key = key.as_str(), "acquire for unregistered content key");
            return None;
        }

        let recycled = self
            .free
            .get_mut(key)
            .and_then(|handles| handles.pop_front());
        let handle = match recycled {
            Some(handle) => handle,
            None => self.allocate(),
        };
        let _ = self.live.insert(handle, key.clone());
        Some(handle)
    }

    fn release(&mut self, handle: InstanceHandle) {
        let Some(key) = self.live.remove(&handle) else {
            return;
        };
        self.free.entry(key).or_default().push_back(handle);
    }
}
