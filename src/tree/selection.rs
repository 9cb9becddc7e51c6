//! Selection coordination.
//!
//! The root tree owns one `SelectionState`: the single active blob across
//! the whole hierarchy plus a queue of typed events for the outward
//! consumer. Nodes never call each other back; everything crosses this one
//! surface.

use crate::tree::blob::BlobDescriptor;
use std::collections::VecDeque;

/// Events the tree emits toward its consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// A leaf became the active selection. Emitted exactly once per
    /// user-driven selection change; re-selecting the active blob is silent.
    BlobSelected(BlobDescriptor),
}

/// Tracks the at-most-one active blob and queues outward events
#[derive(Debug, Default)]
pub struct SelectionState {
    active_path: Option<String>,
    events: VecDeque<TreeEvent>,
}

impl SelectionState {
    pub fn new(active_path: Option<String>) -> Self {
        Self {
            active_path,
            events: VecDeque::new(),
        }
    }

    pub fn active_path(&self) -> Option<&str> {
        self.active_path.as_deref()
    }

    /// Make `descriptor` the active blob. Returns false (and queues
    /// nothing) when it already is.
    pub fn select(&mut self, descriptor: BlobDescriptor) -> bool {
        if self.active_path.as_deref() == Some(descriptor.filepath.as_str()) {
            return false;
        }
        self.active_path = Some(descriptor.filepath.clone());
        self.events.push_back(TreeEvent::BlobSelected(descriptor));
        true
    }

    /// Forget the active blob (deleted, or its subtree removed).
    pub fn clear(&mut self) {
        self.active_path = None;
    }

    /// Next event still worth delivering.
    ///
    /// An event for a blob that is no longer the active selection was
    /// superseded before the consumer drained it and is dropped here.
    pub fn poll(&mut self) -> Option<TreeEvent> {
        while let Some(event) = self.events.pop_front() {
            let TreeEvent::BlobSelected(descriptor) = &event;
            if self.active_path.as_deref() == Some(descriptor.filepath.as_str()) {
                return Some(event);
            }
            tracing::debug!(filepath = %descriptor.filepath, "dropping superseded selection event");
        }
        None
    }

    /// Drain every event still worth delivering.
    pub fn take_events(&mut self) -> Vec<TreeEvent> {
        let mut out = Vec::new();
        while let Some(event) = self.poll() {
            out.push(event);
        }
        out
    }
}
