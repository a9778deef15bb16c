//! The bounded event pool and its interrupt boundary.
//!
//! All event descriptors live in one slab allocated at startup. The slab and
//! the two structures interrupt handlers touch (the free list and the
//! interrupt-posted queue) form the pool's shared half, guarded by a single
//! lock that is only ever taken inside an arch critical section and only for
//! short copy-in/copy-out spans. The runnable queue and the delayed-response
//! lists are owned exclusively by the main context and never appear here.
//!
//! At any instant every descriptor is in exactly one place: the free list,
//! the runnable queue, the interrupt-posted queue, or one delayed-response
//! list; the sum of their sizes is the pool capacity.

use alloc::boxed::Box;
use alloc::sync::Arc;

use spin::Mutex;

use crate::arch::{Arch, CriticalSection};
use crate::error::{FwkError, FwkResult};
use crate::event::{Event, EventParams};
use crate::module::{EntityCounts, TableMeta};
use crate::queue::{SlotIndex, SlotQueue};

/// Enqueue-time validity gates shared by the runtime and [`EventSender`].
///
/// Notifications put directly must be responses; responses must originate
/// from the module that owns the event type; requests must target it.
pub(crate) fn check_enqueue<C: EntityCounts + ?Sized>(counts: &C, event: &Event) -> FwkResult {
    if event.is_notification {
        if !counts.is_valid_notification_id(event.id) {
            return Err(FwkError::Param);
        }
        if !event.is_response || event.response_requested {
            return Err(FwkError::Param);
        }
        if event.target_id.module_idx() != event.id.module_idx() {
            return Err(FwkError::Param);
        }
    } else {
        if !counts.is_valid_event_id(event.id) {
            return Err(FwkError::Param);
        }
        if event.is_response {
            if event.source_id.module_idx() != event.id.module_idx()
                || event.response_requested
            {
                return Err(FwkError::Param);
            }
        } else if event.target_id.module_idx() != event.id.module_idx() {
            return Err(FwkError::Param);
        }
    }
    if !counts.is_valid_entity_id(event.target_id) {
        return Err(FwkError::Param);
    }
    Ok(())
}

struct PoolInner {
    slots: Box<[Event]>,
    free: SlotQueue,
    isr: SlotQueue,
    next_cookie: u32,
}

/// Fixed-capacity descriptor pool shared between the main context and
/// interrupt handlers.
///
/// Descriptors are never returned to the allocator; they recycle through the
/// free list. Slot contents are only read or written while the shared lock
/// is held, but a slot popped from the free list is privately owned by the
/// popping context until it is pushed onto a queue again, so no lock is held
/// across a handler invocation.
pub struct EventPool {
    arch: Arc<dyn Arch>,
    shared: Mutex<PoolInner>,
    capacity: usize,
}

impl EventPool {
    /// Builds the pool over an arena-allocated slab.
    pub(crate) fn new(arch: Arc<dyn Arch>, slots: Box<[Event]>) -> Self {
        let capacity = slots.len();
        let mut free = SlotQueue::with_capacity(capacity);
        for idx in 0..capacity {
            free.push_tail(idx);
        }
        Self {
            arch,
            shared: Mutex::new(PoolInner {
                slots,
                free,
                isr: SlotQueue::with_capacity(capacity),
                next_cookie: 1,
            }),
            capacity,
        }
    }

    /// Number of descriptors in the pool.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of free descriptors.
    pub fn free_count(&self) -> usize {
        let _cs = CriticalSection::enter(&*self.arch);
        let inner = self.shared.lock();
        inner.free.len()
    }

    /// Number of descriptors awaiting promotion from the interrupt-posted
    /// queue.
    pub fn isr_count(&self) -> usize {
        let _cs = CriticalSection::enter(&*self.arch);
        let inner = self.shared.lock();
        inner.isr.len()
    }

    /// Pops a free descriptor, copies `event` into it and optionally stamps
    /// a fresh cookie.
    ///
    /// Returns the slot index and the cookie the slot now carries.
    ///
    /// # Errors
    ///
    /// [`FwkError::NoMemory`] when the pool is exhausted (logged at error
    /// severity); the caller decides whether that is fatal.
    pub(crate) fn allocate(
        &self,
        event: &Event,
        assign_cookie: bool,
    ) -> FwkResult<(SlotIndex, u32)> {
        let _cs = CriticalSection::enter(&*self.arch);
        let mut inner = self.shared.lock();
        let Some(idx) = inner.free.pop_head() else {
            drop(inner);
            error!("event pool exhausted ({} descriptors)", self.capacity);
            return Err(FwkError::NoMemory);
        };
        let cookie = if assign_cookie {
            let cookie = inner.next_cookie;
            inner.next_cookie = inner.next_cookie.wrapping_add(1);
            cookie
        } else {
            event.cookie
        };
        inner.slots[idx] = event.clone();
        inner.slots[idx].cookie = cookie;
        Ok((idx, cookie))
    }

    /// Returns a descriptor to the free list.
    pub(crate) fn release(&self, idx: SlotIndex) {
        let _cs = CriticalSection::enter(&*self.arch);
        self.shared.lock().free.push_tail(idx);
    }

    /// Appends a descriptor to the interrupt-posted queue.
    pub(crate) fn push_isr(&self, idx: SlotIndex) {
        let _cs = CriticalSection::enter(&*self.arch);
        self.shared.lock().isr.push_tail(idx);
    }

    /// Pops one descriptor from the interrupt-posted queue.
    pub(crate) fn pop_isr(&self) -> Option<SlotIndex> {
        let _cs = CriticalSection::enter(&*self.arch);
        let mut inner = self.shared.lock();
        inner.isr.pop_head()
    }

    /// Copies a descriptor out of its slot.
    pub(crate) fn read(&self, idx: SlotIndex) -> Event {
        let _cs = CriticalSection::enter(&*self.arch);
        let inner = self.shared.lock();
        inner.slots[idx].clone()
    }

    /// The cookie currently stored in a slot.
    pub(crate) fn cookie_of(&self, idx: SlotIndex) -> u32 {
        let _cs = CriticalSection::enter(&*self.arch);
        let inner = self.shared.lock();
        inner.slots[idx].cookie
    }

    /// Overwrites the parameter bytes of a stored descriptor.
    pub(crate) fn set_params(&self, idx: SlotIndex, params: &EventParams) {
        let _cs = CriticalSection::enter(&*self.arch);
        self.shared.lock().slots[idx].params = params.clone();
    }
}

/// Detached, interrupt-safe event posting handle.
///
/// A sender owns a reference to the pool and a snapshot of the module
/// table's counts, so interrupt handlers (and foreign threads in hosted
/// tests) can post fully-validated events without touching the runtime.
/// Posted events land on the interrupt-posted queue and become visible to
/// the dispatcher at its next drain point.
///
/// Delayed-response completion and notification delivery stay main-context
/// operations and are rejected here with [`FwkError::Param`].
#[derive(Clone)]
pub struct EventSender {
    pool: Arc<EventPool>,
    meta: Arc<TableMeta>,
}

impl EventSender {
    pub(crate) fn new(pool: Arc<EventPool>, meta: Arc<TableMeta>) -> Self {
        Self { pool, meta }
    }

    /// Posts an event onto the interrupt-posted queue.
    ///
    /// The assigned cookie is written back through `event`.
    pub fn put_event(&self, event: &mut Event) -> FwkResult {
        if event.is_notification || event.is_delayed_response {
            return Err(FwkError::Param);
        }
        if !self.meta.is_valid_entity_id(event.source_id) {
            return Err(FwkError::Param);
        }
        check_enqueue(&*self.meta, event)?;

        let (idx, cookie) = self.pool.allocate(event, !event.is_response)?;
        event.cookie = cookie;
        self.pool.push_isr(idx);
        trace!(
            "sent {}: {} @ {} -> {} (interrupt)",
            cookie, event.id, event.source_id, event.target_id
        );
        Ok(())
    }

    /// Posts a light event onto the interrupt-posted queue.
    pub fn put_event_light(&self, event: &crate::event::LightEvent) -> FwkResult {
        let mut promoted = event.promote();
        self.put_event(&mut promoted)
    }
}
