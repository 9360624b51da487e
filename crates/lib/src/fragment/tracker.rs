use std::collections::HashSet;

use tracing::{debug, trace, warn};

use crate::element::ElementMap;
use crate::manager::HeadTagManager;
use crate::serializer::{ElementSerializer, SerializedMap};

/// Pre-render state of one tracked fragment.
#[derive(Debug, Clone)]
pub struct TrackingFrame {
  pub fragment_id: String,
  /// Stack depth at the time the frame was pushed.
  pub level: usize,
  elements_before: HashSet<String>,
  /// Keys already persisted by a nested fragment, excluded from this frame's delta.
  claimed: HashSet<String>,
  /// Keys returned by the last stop of this frame.
  delta_keys: Vec<String>,
}

impl TrackingFrame {
  fn new(fragment_id: &str, level: usize, elements_before: HashSet<String>) -> Self {
    Self {
      fragment_id: fragment_id.to_string(),
      level,
      elements_before,
      claimed: HashSet::new(),
      delta_keys: Vec::new(),
    }
  }
}

/// Stack-based instrumentation computing the elements each fragment adds.
///
/// Frames are matched by fragment identifier, searching from the top of the
/// stack, so an inner fragment's stop never disturbs an enclosing frame. The
/// tracker belongs to a single page render and is not shared between threads.
#[derive(Debug)]
pub struct ElementTracker {
  stack: Vec<TrackingFrame>,
  serializer: ElementSerializer,
}

impl ElementTracker {
  pub fn new(serializer: ElementSerializer) -> Self {
    Self {
      stack: Vec::new(),
      serializer,
    }
  }

  fn position(&self, fragment_id: &str) -> Option<usize> {
    self.stack.iter().rposition(|frame| frame.fragment_id == fragment_id)
  }

  /// Snapshot the manager's keys and push a frame. Empty identifiers are ignored.
  pub fn start_tracking(&mut self, fragment_id: &str, manager: &mut HeadTagManager) {
    if fragment_id.is_empty() {
      return;
    }

    let before: HashSet<String> = manager.element_keys().into_iter().collect();
    let level = self.stack.len();
    trace!(fragment = %fragment_id, level, known = before.len(), "tracking started");
    self.stack.push(TrackingFrame::new(fragment_id, level, before));
  }

  /// Serialize the elements added since the matching frame started.
  ///
  /// Keys claimed by nested fragments are excluded. The returned keys are in
  /// turn claimed for every enclosing frame; [`release_claims`](Self::release_claims)
  /// undoes that when the delta is not persisted. Returns an empty map when no
  /// frame matches or nothing was added.
  pub fn stop_tracking_and_get_new_elements(&mut self, fragment_id: &str, manager: &mut HeadTagManager) -> SerializedMap {
    let Some(index) = self.position(fragment_id) else {
      debug!(fragment = %fragment_id, "no tracking frame to stop");
      return SerializedMap::new();
    };

    let current = manager.all_elements();
    let frame = &self.stack[index];
    let mut delta = ElementMap::new();
    for (key, element) in current.iter() {
      if !frame.elements_before.contains(key) && !frame.claimed.contains(key) {
        delta.insert(key, element.clone());
      }
    }

    let keys: Vec<String> = delta.keys().map(str::to_string).collect();
    self.stack[index].delta_keys = keys.clone();
    if keys.is_empty() {
      debug!(fragment = %fragment_id, "no new head elements");
      return SerializedMap::new();
    }

    for frame in &mut self.stack[..index] {
      frame.claimed.extend(keys.iter().cloned());
    }

    debug!(fragment = %fragment_id, count = keys.len(), "new head elements tracked");
    self.serializer.serialize(&delta)
  }

  /// Hand the last delta of `fragment_id` back to its enclosing frames.
  pub fn release_claims(&mut self, fragment_id: &str) {
    let Some(index) = self.position(fragment_id) else {
      return;
    };

    let keys = std::mem::take(&mut self.stack[index].delta_keys);
    if keys.is_empty() {
      return;
    }
    for frame in &mut self.stack[..index] {
      for key in &keys {
        frame.claimed.remove(key);
      }
    }
    trace!(fragment = %fragment_id, count = keys.len(), "claims released");
  }

  /// Exclude `keys` from the deltas of every frame enclosing `fragment_id`.
  pub fn claim_for_enclosing(&mut self, fragment_id: &str, keys: &[String]) {
    let Some(index) = self.position(fragment_id) else {
      return;
    };
    for frame in &mut self.stack[..index] {
      frame.claimed.extend(keys.iter().cloned());
    }
  }

  /// Serialize every element added since the matching frame started,
  /// including those claimed by nested fragments, in manager order.
  ///
  /// This is what a cached fragment must replay on a hit: its own elements and
  /// those of the nested fragments it skips, interleaved as first inserted.
  pub fn captured_elements(&self, fragment_id: &str, manager: &mut HeadTagManager) -> SerializedMap {
    let Some(index) = self.position(fragment_id) else {
      return SerializedMap::new();
    };

    let frame = &self.stack[index];
    let mut captured = ElementMap::new();
    for (key, element) in manager.all_elements().iter() {
      if !frame.elements_before.contains(key) {
        captured.insert(key, element.clone());
      }
    }

    if captured.is_empty() {
      return SerializedMap::new();
    }
    self.serializer.serialize(&captured)
  }

  /// Remove the innermost frame of `fragment_id`, if any.
  pub fn clear_tracking(&mut self, fragment_id: &str) {
    if let Some(index) = self.position(fragment_id) {
      self.stack.remove(index);
      trace!(fragment = %fragment_id, depth = self.stack.len(), "tracking cleared");
    }
  }

  /// Identifier of the innermost tracked fragment.
  pub fn current_tracking_block(&self) -> Option<&str> {
    self.stack.last().map(|frame| frame.fragment_id.as_str())
  }

  pub fn is_tracking(&self, fragment_id: &str) -> bool {
    self.position(fragment_id).is_some()
  }

  /// Number of active frames.
  pub fn tracking_level(&self) -> usize {
    self.stack.len()
  }

  pub fn frames(&self) -> &[TrackingFrame] {
    &self.stack
  }

  /// Drop every frame. Frames still open at this point were never matched by
  /// an after-hook.
  pub fn reset(&mut self) {
    if !self.stack.is_empty() {
      let open: Vec<&str> = self.stack.iter().map(|f| f.fragment_id.as_str()).collect();
      warn!(count = open.len(), fragments = ?open, "dropping unmatched tracking frames");
    }
    self.stack.clear();
  }
}
