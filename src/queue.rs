//! Slot queues over the event pool.
//!
//! The event pool is a fixed, index-addressable slab, so every queue in the
//! framework, from the free list to the delayed-response lists, is a queue
//! of slot indices. Moving a descriptor between
//! queues is an index move: O(1), allocation-free once the ring is reserved,
//! and a descriptor can trivially be checked for membership.

use alloc::collections::VecDeque;

/// Index of a descriptor slot in the event pool.
pub type SlotIndex = usize;

/// FIFO of event-pool slot indices.
///
/// Backed by a pre-reserved ring; steady-state push/pop never allocates as
/// long as the queue holds at most the reserved capacity (which the pool
/// guarantees, since only pool indices circulate).
#[derive(Debug, Default)]
pub struct SlotQueue {
    ring: VecDeque<SlotIndex>,
}

impl SlotQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            ring: VecDeque::new(),
        }
    }

    /// Creates an empty queue with room for `capacity` indices.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ring: VecDeque::with_capacity(capacity),
        }
    }

    /// Pushes an index at the head (front) of the queue.
    pub fn push_head(&mut self, idx: SlotIndex) {
        self.ring.push_front(idx);
    }

    /// Pushes an index at the tail of the queue.
    pub fn push_tail(&mut self, idx: SlotIndex) {
        self.ring.push_back(idx);
    }

    /// Pops the index at the head of the queue.
    pub fn pop_head(&mut self) -> Option<SlotIndex> {
        self.ring.pop_front()
    }

    /// Removes `idx` from wherever it sits in the queue.
    ///
    /// Returns `true` if the index was present.
    pub fn remove(&mut self, idx: SlotIndex) -> bool {
        if let Some(pos) = self.ring.iter().position(|&i| i == idx) {
            let _ = self.ring.remove(pos);
            true
        } else {
            false
        }
    }

    /// Whether `idx` is currently queued.
    pub fn contains(&self, idx: SlotIndex) -> bool {
        self.ring.iter().any(|&i| i == idx)
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Number of queued indices.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Iterates the queued indices in FIFO order.
    pub fn iter(&self) -> impl Iterator<Item = SlotIndex> + '_ {
        self.ring.iter().copied()
    }
}
