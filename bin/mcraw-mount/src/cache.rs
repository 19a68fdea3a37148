// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! Bounded cache of serialized DNG frames.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Default number of packed frames kept in memory per capture.
pub const DEFAULT_CACHE_FRAMES: usize = 5;

/// FIFO-evicting map from frame filename to packed DNG bytes.
///
/// The map, the insertion queue and the uniform-size slot form one
/// invariant block: every key is queued exactly once, the map never
/// exceeds its capacity, and `uniform_size` is latched by the first
/// insert and never changes afterwards. Callers must only insert after
/// a missed lookup.
pub struct FrameCache {
  map: HashMap<String, Arc<Vec<u8>>>,
  order: VecDeque<String>,
  capacity: usize,
  uniform_size: Option<u64>,
}

impl FrameCache {
  pub fn new(capacity: usize) -> Self {
    assert!(capacity > 0, "cache capacity must be nonzero");
    Self {
      map: HashMap::with_capacity(capacity),
      order: VecDeque::with_capacity(capacity),
      capacity,
      uniform_size: None,
    }
  }

  pub fn lookup(&self, name: &str) -> Option<Arc<Vec<u8>>> {
    self.map.get(name).cloned()
  }

  pub fn insert(&mut self, name: &str, blob: Vec<u8>) -> Arc<Vec<u8>> {
    if self.map.len() >= self.capacity {
      if let Some(oldest) = self.order.pop_front() {
        self.map.remove(&oldest);
      }
    }
    let blob = Arc::new(blob);
    self.map.insert(name.to_string(), Arc::clone(&blob));
    self.order.push_back(name.to_string());
    if self.uniform_size.is_none() {
      self.uniform_size = Some(blob.len() as u64);
    }
    blob
  }

  /// Byte length observed on the first insert, the reported file size
  /// for every frame of the capture.
  pub fn uniform_size(&self) -> Option<u64> {
    self.uniform_size
  }

  pub fn contains(&self, name: &str) -> bool {
    self.map.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.map.len()
  }
}
