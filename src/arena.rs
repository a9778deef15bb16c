//! Init-time allocation budget.
//!
//! Core tables (the event pool, module and element contexts, queue storage)
//! are carved out of a fixed byte budget during startup and never freed. The
//! arena is the single gate those allocations pass through: it enforces the
//! budget, refuses anything after it is sealed, and makes exhaustion loud.
//! After startup no further arena traffic is expected; any that occurs is a
//! bug in the caller.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::mem;

use crate::error::{FwkError, FwkResult};

/// Bump-accounting allocator for init-time tables.
///
/// There is no deallocation. Exhaustion is reported as [`FwkError::NoMemory`]
/// and logged at error severity; the lifecycle driver treats it as fatal.
pub struct Arena {
    capacity: usize,
    used: usize,
    sealed: bool,
}

impl Arena {
    /// Creates an arena with a budget of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: 0,
            sealed: false,
        }
    }

    /// Total budget in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes consumed so far.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.capacity - self.used
    }

    fn charge(&mut self, bytes: usize) -> FwkResult {
        if self.sealed {
            error!("arena allocation of {bytes} bytes after seal");
            return Err(FwkError::State);
        }
        if bytes > self.remaining() {
            error!(
                "arena exhausted: {bytes} bytes requested, {} remaining of {}",
                self.remaining(),
                self.capacity
            );
            return Err(FwkError::NoMemory);
        }
        self.used += bytes;
        Ok(())
    }

    /// Allocates a zero-state slice of `count` items of `T`.
    pub fn alloc_slice<T: Default>(&mut self, count: usize) -> FwkResult<Box<[T]>> {
        self.charge(count * mem::size_of::<T>())?;
        let mut v = Vec::with_capacity(count);
        v.resize_with(count, T::default);
        Ok(v.into_boxed_slice())
    }

    /// Charges the budget for `count` items of `T` held in an external
    /// fixed-capacity container (queue rings, context vectors).
    pub fn reserve<T>(&mut self, count: usize) -> FwkResult {
        self.charge(count * mem::size_of::<T>())
    }

    /// Seals the arena. All later allocations fail with
    /// [`FwkError::State`].
    pub fn seal(&mut self) {
        self.sealed = true;
        debug!(
            "arena sealed: {} of {} bytes used",
            self.used, self.capacity
        );
    }
}
