//! The runtime: lifecycle driver, event dispatcher and main loop.
//!
//! A [`Runtime`] is the single owning value behind the whole framework. It
//! is built in the registration phase, brought up by [`start`](Runtime::start)
//! through the module lifecycle, and then driven either by
//! [`run`](Runtime::run) (the firmware main loop) or by explicit
//! [`process_event_queue`](Runtime::process_event_queue) calls in hosted
//! tests.
//!
//! Dispatch is cooperative and single-threaded: exactly one handler runs at
//! a time, interrupt handlers only ever touch the pool's shared half, and
//! interrupt-posted events become visible at explicit drain points between
//! dispatches. A module instance is checked out of its slot while one of
//! its hooks runs, so hooks can hold `&mut Runtime` without ever aliasing
//! themselves, and reentering the dispatcher from a hook is structurally
//! impossible.

use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::arch::Arch;
use crate::arena::Arena;
use crate::error::{FwkError, FwkResult};
use crate::event::{Event, LightEvent};
use crate::id::EntityId;
use crate::lifecycle::{BIND_ROUND_COUNT, ModuleState, RuntimePhase};
use crate::module::{
    ApiHandle, EntityCounts, Module, ModuleConfig, ModuleCtx, ModuleDesc, ModuleTable, TableMeta,
};
use crate::notify::NotificationBroker;
use crate::pool::{EventPool, EventSender, check_enqueue};
use crate::queue::{SlotIndex, SlotQueue};

/// Build-time sizing of the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of descriptors in the event pool.
    pub event_capacity: usize,
    /// Byte budget for init-time table allocations.
    pub arena_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_capacity: 32,
            arena_capacity: 16 * 1024,
        }
    }
}

impl RuntimeConfig {
    /// The default sizing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the event pool capacity.
    pub fn with_event_capacity(mut self, count: usize) -> Self {
        self.event_capacity = count;
        self
    }

    /// Sets the arena byte budget.
    pub fn with_arena_capacity(mut self, bytes: usize) -> Self {
        self.arena_capacity = bytes;
        self
    }
}

/// Dispatch counters.
#[derive(Debug, Default, Clone)]
pub struct CoreStats {
    /// Events and notifications dispatched to handlers.
    pub processed: u64,
    /// Immediate responses enqueued on behalf of targets.
    pub responses: u64,
    /// Responses parked on delayed-response lists.
    pub delayed_stored: u64,
    /// Delayed responses completed or released.
    pub delayed_completed: u64,
    /// Events promoted from the interrupt-posted queue.
    pub isr_drained: u64,
    /// Handler invocations that returned an error.
    pub handler_errors: u64,
    /// Notification events fanned out.
    pub notifications_sent: u64,
}

/// The module-and-event runtime.
///
/// See the [module docs](self) for the execution model. Construction order:
/// [`new`](Runtime::new), [`add_module`](Runtime::add_module) per module in
/// declaration order, [`start`](Runtime::start), then [`run`](Runtime::run).
pub struct Runtime {
    arch: Arc<dyn Arch>,
    arena: Arena,
    phase: RuntimePhase,
    table: ModuleTable,
    broker: NotificationBroker,
    pool: Option<Arc<EventPool>>,
    meta: Option<Arc<TableMeta>>,
    /// Events ready for dispatch; owned by the main context only.
    runnable: SlotQueue,
    /// The event whose handler is currently running.
    current_event: Option<Event>,
    /// The entity whose `bind` hook is currently running.
    binding_id: Option<EntityId>,
    stats: CoreStats,
    event_capacity: usize,
}

fn check_hook(status: FwkResult, hook: &str, id: EntityId) -> FwkResult {
    match status {
        Ok(()) => Ok(()),
        Err(FwkError::Pending) => {
            error!("{hook} hook returned pending for {id}");
            Err(FwkError::State)
        }
        Err(err) => {
            error!("{hook} hook failed for {id}: {err}");
            Err(err)
        }
    }
}

impl Runtime {
    /// Creates an empty runtime in the registration phase.
    pub fn new(arch: Arc<dyn Arch>, config: RuntimeConfig) -> Self {
        Self {
            arch,
            arena: Arena::new(config.arena_capacity),
            phase: RuntimePhase::Registration,
            table: ModuleTable::new(),
            broker: NotificationBroker::new(),
            pool: None,
            meta: None,
            runnable: SlotQueue::new(),
            current_event: None,
            binding_id: None,
            stats: CoreStats::default(),
            event_capacity: config.event_capacity,
        }
    }

    /// Declares a module. Declaration order defines the module index and
    /// every lifecycle walk order.
    ///
    /// # Errors
    ///
    /// [`FwkError::State`] once [`start`](Runtime::start) has been called.
    pub fn add_module(
        &mut self,
        desc: ModuleDesc,
        config: ModuleConfig,
        instance: Box<dyn Module>,
    ) -> FwkResult<EntityId> {
        if self.phase != RuntimePhase::Registration {
            return Err(FwkError::State);
        }
        let idx = self.table.push(ModuleCtx::new(desc, config, instance));
        Ok(EntityId::module(idx))
    }

    /// Brings every declared module up through the lifecycle: table
    /// allocation, module init, element init, post init,
    /// [`BIND_ROUND_COUNT`] bind rounds, start.
    ///
    /// Any hook failure aborts startup with an error log; there is no
    /// partial rollback. A hook returning [`FwkError::Pending`] is a
    /// failure here.
    pub fn start(&mut self) -> FwkResult {
        if self.phase != RuntimePhase::Registration {
            return Err(FwkError::State);
        }
        let count = self.table.len();

        // Table allocation: event pool, queue storage, element contexts.
        let slots = self.arena.alloc_slice::<Event>(self.event_capacity)?;
        self.arena.reserve::<SlotIndex>(self.event_capacity * 3)?;
        self.pool = Some(Arc::new(EventPool::new(Arc::clone(&self.arch), slots)));
        self.runnable = SlotQueue::with_capacity(self.event_capacity);
        self.arena.reserve::<ModuleCtx>(count)?;
        for m in 0..count {
            let module_id = EntityId::module(m);
            let ctx = self.table.ctx_mut(m).ok_or(FwkError::Panic)?;
            ctx.build_elements(module_id)?;
            let element_count = ctx.elements.len();
            self.arena.reserve::<crate::module::ElementCtx>(element_count)?;
        }
        self.meta = Some(Arc::new(self.table.meta()));

        self.phase = RuntimePhase::ModuleInit;
        for m in 0..count {
            let module_id = EntityId::module(m);
            let (element_count, data) = {
                let ctx = self.table.ctx(m).ok_or(FwkError::Panic)?;
                (ctx.elements.len(), ctx.data.clone())
            };
            let status = self.with_instance(m, |inst, fwk| {
                inst.init(fwk, module_id, element_count, data.as_deref())
            })?;
            check_hook(status, "init", module_id)?;
        }

        self.phase = RuntimePhase::ElementInit;
        for m in 0..count {
            for e in 0..self.element_count_of(m) {
                let element_id = EntityId::element(m, e);
                let (sub_count, data) = {
                    let element = self
                        .table
                        .ctx(m)
                        .and_then(|c| c.elements.get(e))
                        .ok_or(FwkError::Panic)?;
                    (element.sub_element_count, element.data.clone())
                };
                let status = self.with_instance(m, |inst, fwk| {
                    inst.element_init(fwk, element_id, sub_count, data.as_deref())
                })?;
                check_hook(status, "element init", element_id)?;
            }
        }

        self.phase = RuntimePhase::PostInit;
        for m in 0..count {
            let module_id = EntityId::module(m);
            let status = self.with_instance(m, |inst, fwk| inst.post_init(fwk, module_id))?;
            check_hook(status, "post init", module_id)?;
            let ctx = self.table.ctx_mut(m).ok_or(FwkError::Panic)?;
            ctx.state = ctx.state.advance(ModuleState::Initialized)?;
        }

        self.phase = RuntimePhase::Bind;
        let bind_result = self.run_bind_rounds(count);
        self.binding_id = None;
        bind_result?;

        self.phase = RuntimePhase::Start;
        for m in 0..count {
            let module_id = EntityId::module(m);
            let status = self.with_instance(m, |inst, fwk| inst.start(fwk, module_id))?;
            check_hook(status, "start", module_id)?;
            for e in 0..self.element_count_of(m) {
                let element_id = EntityId::element(m, e);
                let status = self.with_instance(m, |inst, fwk| inst.start(fwk, element_id))?;
                check_hook(status, "start", element_id)?;
            }
            let ctx = self.table.ctx_mut(m).ok_or(FwkError::Panic)?;
            ctx.state = ctx.state.advance(ModuleState::Started)?;
        }

        self.arena.seal();
        self.phase = RuntimePhase::Running;
        debug!(
            "runtime started: {count} modules, {} event descriptors",
            self.event_capacity
        );
        Ok(())
    }

    fn run_bind_rounds(&mut self, count: usize) -> FwkResult {
        for round in 0..BIND_ROUND_COUNT {
            for m in 0..count {
                let module_id = EntityId::module(m);
                self.binding_id = Some(module_id);
                let status =
                    self.with_instance(m, |inst, fwk| inst.bind(fwk, module_id, round))?;
                check_hook(status, "bind", module_id)?;
                for e in 0..self.element_count_of(m) {
                    let element_id = EntityId::element(m, e);
                    self.binding_id = Some(element_id);
                    let status =
                        self.with_instance(m, |inst, fwk| inst.bind(fwk, element_id, round))?;
                    check_hook(status, "bind", element_id)?;
                }
            }
        }
        for m in 0..count {
            let ctx = self.table.ctx_mut(m).ok_or(FwkError::Panic)?;
            ctx.state = ctx.state.advance(ModuleState::Bound)?;
        }
        Ok(())
    }

    /// Stops started modules in reverse declaration order.
    ///
    /// Teardown is best-effort: a failing `stop` hook is logged and the
    /// walk continues; the first error is returned at the end.
    pub fn stop(&mut self) -> FwkResult {
        if self.phase != RuntimePhase::Running {
            return Err(FwkError::State);
        }
        let mut first_err = None;
        for m in (0..self.table.len()).rev() {
            let module_id = EntityId::module(m);
            if self.table.ctx(m).map(|c| c.state) != Some(ModuleState::Started) {
                continue;
            }
            let status = self.with_instance(m, |inst, fwk| inst.stop(fwk, module_id))?;
            match status {
                Ok(()) => {
                    let ctx = self.table.ctx_mut(m).ok_or(FwkError::Panic)?;
                    ctx.state = ctx.state.advance(ModuleState::Stopped)?;
                }
                Err(err) => {
                    error!("stop hook failed for {module_id}: {err}");
                    first_err.get_or_insert(err);
                }
            }
        }
        self.phase = RuntimePhase::Stopped;
        first_err.map_or(Ok(()), Err)
    }

    /// Checks the instance out of its slot, runs `f`, and puts it back.
    ///
    /// [`FwkError::State`] means the slot is empty: the module is already
    /// running one of its own hooks, or the index is bad.
    fn with_instance<R>(
        &mut self,
        module_idx: usize,
        f: impl FnOnce(&mut dyn Module, &mut Runtime) -> R,
    ) -> FwkResult<R> {
        let Some(mut instance) = self.table.take_instance(module_idx) else {
            return Err(FwkError::State);
        };
        let result = f(instance.as_mut(), self);
        self.table.put_instance(module_idx, instance);
        Ok(result)
    }

    fn element_count_of(&self, module_idx: usize) -> usize {
        self.element_count(module_idx).unwrap_or(0)
    }

    /// Resolves an API from another module during the bind phase.
    ///
    /// The requester is the entity whose `bind` hook is running; outside
    /// the bind phase this fails with [`FwkError::AccessDenied`] and
    /// changes nothing.
    pub fn bind(&mut self, target_id: EntityId, api_id: EntityId) -> FwkResult<ApiHandle> {
        let Some(source_id) = self.binding_id else {
            return Err(FwkError::AccessDenied);
        };
        if self.phase != RuntimePhase::Bind {
            return Err(FwkError::AccessDenied);
        }
        if !self.table.is_valid_entity_id(target_id)
            || !self.table.is_valid_api_id(api_id)
            || api_id.module_idx() != target_id.module_idx()
        {
            return Err(FwkError::Param);
        }
        let m = target_id.module_idx();
        // An empty slot here means the target is the requester itself.
        let Some(mut instance) = self.table.take_instance(m) else {
            return Err(FwkError::Param);
        };
        let result = instance.process_bind_request(source_id, target_id, api_id);
        self.table.put_instance(m, instance);
        if result.is_ok() {
            if let Some(ctx) = self.table.ctx_mut(m) {
                ctx.bind_requests += 1;
            }
            trace!("bound {source_id} -> {target_id} via {api_id}");
        }
        result
    }

    /// Enqueues an event.
    ///
    /// Outside interrupt context, an event sent while a handler is running
    /// inherits its source from the event being handled; otherwise the
    /// caller's source must name a valid entity. The assigned cookie is
    /// written back through `event`. Completion of a delayed response
    /// (`is_delayed_response` set) re-uses the stored descriptor, replacing
    /// only its params.
    ///
    /// # Errors
    ///
    /// [`FwkError::Init`] before startup, [`FwkError::Param`] for invalid
    /// identifiers or flag combinations, [`FwkError::NoMemory`] when the
    /// pool is exhausted.
    pub fn put_event(&mut self, event: &mut Event) -> FwkResult {
        if self.pool.is_none() {
            return Err(FwkError::Init);
        }
        let in_isr = self.arch.is_interrupt_context();
        if !in_isr && self.current_event.is_some() {
            if let Some(current) = &self.current_event {
                event.source_id = current.target_id;
            }
        } else if !self.table.is_valid_entity_id(event.source_id) {
            error!("put_event: invalid source {}", event.source_id);
            return Err(FwkError::Param);
        }
        if let Err(err) = check_enqueue(&self.table, event) {
            error!(
                "put_event rejected ({err}): {} @ {} -> {}",
                event.id, event.source_id, event.target_id
            );
            return Err(err);
        }
        self.enqueue(event, in_isr)
    }

    /// Enqueues a light event: no params, no cookie back-channel.
    pub fn put_event_light(&mut self, event: &mut LightEvent) -> FwkResult {
        if self.pool.is_none() {
            return Err(FwkError::Init);
        }
        let in_isr = self.arch.is_interrupt_context();
        if !in_isr && self.current_event.is_some() {
            if let Some(current) = &self.current_event {
                event.source_id = current.target_id;
            }
        } else if !self.table.is_valid_entity_id(event.source_id) {
            error!("put_event_light: invalid source {}", event.source_id);
            return Err(FwkError::Param);
        }
        let mut promoted = event.promote();
        if let Err(err) = check_enqueue(&self.table, &promoted) {
            error!(
                "put_event_light rejected ({err}): {} @ {} -> {}",
                promoted.id, promoted.source_id, promoted.target_id
            );
            return Err(err);
        }
        self.enqueue(&mut promoted, in_isr)
    }

    /// The unvalidated enqueue path shared by the public entry points, the
    /// dispatcher's response handling and notification fan-out.
    fn enqueue(&mut self, event: &mut Event, in_isr: bool) -> FwkResult {
        let pool = self.pool.clone().ok_or(FwkError::Init)?;
        let idx = if event.is_delayed_response {
            let idx = self.find_delayed_response(event.source_id, event.cookie)?;
            self.table.delayed_list_mut(event.source_id)?.remove(idx);
            pool.set_params(idx, &event.params);
            self.stats.delayed_completed += 1;
            idx
        } else {
            let (idx, cookie) = pool.allocate(event, !event.is_response)?;
            event.cookie = cookie;
            idx
        };
        if in_isr {
            pool.push_isr(idx);
        } else {
            self.runnable.push_tail(idx);
        }
        let stored = pool.read(idx);
        trace!(
            "sent {}: {} @ {} -> {}",
            stored.cookie, stored.id, stored.source_id, stored.target_id
        );
        Ok(())
    }

    fn find_delayed_response(&self, entity: EntityId, cookie: u32) -> FwkResult<SlotIndex> {
        let pool = self.pool.as_ref().ok_or(FwkError::Init)?;
        let list = self.table.delayed_list(entity)?;
        for idx in list.iter() {
            if pool.cookie_of(idx) == cookie {
                return Ok(idx);
            }
        }
        error!("no delayed response on {entity} for cookie {cookie}");
        Err(FwkError::Param)
    }

    /// Removes a stored delayed response without enqueuing it.
    ///
    /// Asynchronous driver wrappers use this to re-author the response
    /// before submitting it themselves.
    pub fn release_delayed_response(&mut self, id: EntityId, cookie: u32) -> FwkResult<Event> {
        let idx = self.find_delayed_response(id, cookie)?;
        self.table.delayed_list_mut(id)?.remove(idx);
        let pool = self.pool.as_ref().ok_or(FwkError::Init)?;
        let event = pool.read(idx);
        pool.release(idx);
        self.stats.delayed_completed += 1;
        Ok(event)
    }

    /// Subscribes `subscriber_id` to a notification from `source_id`
    /// ([`EntityId::none`] for any source).
    pub fn subscribe(
        &mut self,
        notification_id: EntityId,
        source_id: EntityId,
        subscriber_id: EntityId,
    ) -> FwkResult {
        if !self.table.is_valid_notification_id(notification_id)
            || !(source_id.is_none() || self.table.is_valid_entity_id(source_id))
            || !self.table.is_valid_entity_id(subscriber_id)
        {
            return Err(FwkError::Param);
        }
        self.broker.subscribe(notification_id, source_id, subscriber_id)
    }

    /// Removes a subscription; the exact triple must exist.
    pub fn unsubscribe(
        &mut self,
        notification_id: EntityId,
        source_id: EntityId,
        subscriber_id: EntityId,
    ) -> FwkResult {
        if !self.table.is_valid_notification_id(notification_id) {
            return Err(FwkError::Param);
        }
        self.broker
            .unsubscribe(notification_id, source_id, subscriber_id)
    }

    /// Sends `notification_id` from `source_id` to every matching
    /// subscriber, returning the number of events enqueued.
    ///
    /// With `response_requested`, each subscriber is expected to post one
    /// response event; the returned count is what the notifier's own
    /// outstanding-response counter starts from. Fan-out stops at the first
    /// enqueue failure; events already enqueued stay queued.
    pub fn notify(
        &mut self,
        notification_id: EntityId,
        source_id: EntityId,
        params: &[u8],
        response_requested: bool,
    ) -> FwkResult<usize> {
        if self.pool.is_none() {
            return Err(FwkError::Init);
        }
        if !self.table.is_valid_notification_id(notification_id)
            || !self.table.is_valid_entity_id(source_id)
            || notification_id.module_idx() != source_id.module_idx()
        {
            return Err(FwkError::Param);
        }
        let mut template = Event::new(notification_id, source_id, EntityId::none());
        template.is_notification = true;
        template.response_requested = response_requested;
        template.set_params(params)?;

        let in_isr = self.arch.is_interrupt_context();
        let mut count = 0usize;
        for (pos, subscriber_id) in self.broker.matches(notification_id, source_id) {
            let mut event = template.clone();
            event.target_id = subscriber_id;
            self.enqueue(&mut event, in_isr)?;
            if response_requested {
                self.broker.mark_pending(notification_id, pos, event.cookie);
            }
            count += 1;
        }
        self.stats.notifications_sent += count as u64;
        Ok(count)
    }

    /// Number of subscribers a notification from `source_id` would reach.
    pub fn notify_count(&self, notification_id: EntityId, source_id: EntityId) -> usize {
        self.broker.subscriber_count(notification_id, source_id)
    }

    /// Number of acknowledged notification events still awaiting their
    /// subscriber's response.
    pub fn pending_notification_responses(
        &self,
        notification_id: EntityId,
        source_id: EntityId,
    ) -> usize {
        self.broker
            .pending_response_count(notification_id, source_id)
    }

    /// Dispatches the head of the runnable queue. Returns `false` when the
    /// queue is empty.
    fn process_next_event(&mut self) -> bool {
        let Some(pool) = self.pool.clone() else {
            return false;
        };
        let Some(idx) = self.runnable.pop_head() else {
            return false;
        };
        let event = pool.read(idx);
        trace!(
            "processing {}: {} @ {} -> {}",
            event.cookie, event.id, event.source_id, event.target_id
        );
        self.stats.processed += 1;

        if event.is_notification && event.is_response {
            self.broker
                .acknowledge(event.id, event.source_id, event.cookie);
        }

        let mut response = Event::default();
        if event.response_requested {
            response = event.clone();
            response.source_id = event.target_id;
            response.target_id = event.source_id;
            response.is_delayed_response = false;
        }

        self.current_event = Some(event.clone());
        let is_notification = event.is_notification;
        let invoked = self.with_instance(event.target_id.module_idx(), |inst, fwk| {
            if is_notification {
                inst.process_notification(fwk, &event, &mut response)
            } else {
                inst.process_event(fwk, &event, &mut response)
            }
        });
        let status = match invoked {
            Ok(status) => status,
            Err(_) => {
                error!(
                    "no dispatchable module for {} (event {})",
                    event.target_id, event.id
                );
                self.current_event = None;
                pool.release(idx);
                return true;
            }
        };

        match status {
            Ok(()) | Err(FwkError::Pending) => {}
            Err(err) => {
                self.stats.handler_errors += 1;
                error!(
                    "process {} ({} @ {} -> {}) failed: {err}",
                    if is_notification { "notification" } else { "event" },
                    event.id,
                    event.source_id,
                    event.target_id
                );
            }
        }

        if event.response_requested {
            response.is_response = true;
            response.response_requested = false;
            if !response.is_delayed_response {
                self.stats.responses += 1;
                if let Err(err) = self.enqueue(&mut response, false) {
                    error!("response enqueue failed: {err}");
                }
            } else {
                self.store_delayed_response(&pool, &response);
            }
        }

        self.current_event = None;
        pool.release(idx);
        true
    }

    /// Parks a response the target will complete asynchronously, keyed by
    /// the request cookie it already carries.
    fn store_delayed_response(&mut self, pool: &EventPool, response: &Event) {
        match pool.allocate(response, false) {
            Ok((idx, _)) => match self.table.delayed_list_mut(response.source_id) {
                Ok(list) => {
                    list.push_tail(idx);
                    self.stats.delayed_stored += 1;
                    trace!(
                        "delayed response stored on {} (cookie {})",
                        response.source_id, response.cookie
                    );
                }
                Err(err) => {
                    pool.release(idx);
                    error!(
                        "delayed response list missing for {}: {err}",
                        response.source_id
                    );
                }
            },
            Err(err) => error!("delayed response store failed: {err}"),
        }
    }

    /// Promotes one interrupt-posted event to the runnable queue.
    ///
    /// One event per call keeps the interrupts-disabled window bounded.
    fn process_isr(&mut self) -> bool {
        let Some(pool) = self.pool.clone() else {
            return false;
        };
        let Some(idx) = pool.pop_isr() else {
            return false;
        };
        let event = pool.read(idx);
        trace!(
            "pulled interrupt event ({} @ {} -> {})",
            event.id, event.source_id, event.target_id
        );
        self.runnable.push_tail(idx);
        self.stats.isr_drained += 1;
        true
    }

    /// Dispatches until both the runnable queue and the interrupt-posted
    /// queue are empty.
    pub fn process_event_queue(&mut self) {
        loop {
            while self.process_next_event() {}
            if !self.process_isr() {
                break;
            }
        }
    }

    /// The firmware main loop: dispatch until idle, flush the log, suspend
    /// the CPU until the next interrupt.
    pub fn run(&mut self) -> ! {
        loop {
            self.process_event_queue();
            log::logger().flush();
            self.arch.suspend();
        }
    }

    /// The event whose handler is currently running, if any.
    pub fn current_event(&self) -> Option<&Event> {
        self.current_event.as_ref()
    }

    /// Current runtime phase.
    pub fn phase(&self) -> RuntimePhase {
        self.phase
    }

    /// Dispatch counters.
    pub fn stats(&self) -> &CoreStats {
        &self.stats
    }

    /// The platform arch surface.
    pub fn arch(&self) -> &Arc<dyn Arch> {
        &self.arch
    }

    /// A detached, interrupt-safe posting handle.
    ///
    /// # Errors
    ///
    /// [`FwkError::Init`] before [`start`](Runtime::start).
    pub fn sender(&self) -> FwkResult<EventSender> {
        match (&self.pool, &self.meta) {
            (Some(pool), Some(meta)) => {
                Ok(EventSender::new(Arc::clone(pool), Arc::clone(meta)))
            }
            _ => Err(FwkError::Init),
        }
    }

    /// Event pool capacity.
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    /// Number of free descriptors.
    pub fn free_count(&self) -> usize {
        self.pool.as_ref().map_or(0, |p| p.free_count())
    }

    /// Number of descriptors on the interrupt-posted queue.
    pub fn isr_count(&self) -> usize {
        self.pool.as_ref().map_or(0, |p| p.isr_count())
    }

    /// Number of descriptors on the runnable queue.
    pub fn runnable_count(&self) -> usize {
        self.runnable.len()
    }

    /// Number of delayed responses parked on the entity named by `id`.
    pub fn delayed_count(&self, id: EntityId) -> FwkResult<usize> {
        Ok(self.table.delayed_list(id)?.len())
    }

    /// Name of the module or element named by `id`.
    pub fn entity_name(&self, id: EntityId) -> FwkResult<&'static str> {
        let ctx = self.table.ctx(id.module_idx()).ok_or(FwkError::Param)?;
        match id.kind() {
            crate::id::IdKind::Module => Ok(ctx.desc.name),
            crate::id::IdKind::Element | crate::id::IdKind::SubElement => ctx
                .elements
                .get(id.element_idx())
                .map(|e| e.name)
                .ok_or(FwkError::Param),
            _ => Err(FwkError::Param),
        }
    }

    /// Number of bind requests the module named by `id` has served.
    pub fn bind_request_count(&self, id: EntityId) -> FwkResult<u32> {
        self.table
            .ctx(id.module_idx())
            .map(|c| c.bind_requests)
            .ok_or(FwkError::Param)
    }
}

impl EntityCounts for Runtime {
    fn module_count(&self) -> usize {
        self.table.module_count()
    }

    fn element_count(&self, module_idx: usize) -> Option<usize> {
        self.table.element_count(module_idx)
    }

    fn sub_element_count(&self, module_idx: usize, element_idx: usize) -> Option<usize> {
        self.table.sub_element_count(module_idx, element_idx)
    }

    fn event_count(&self, module_idx: usize) -> Option<usize> {
        self.table.event_count(module_idx)
    }

    fn notification_count(&self, module_idx: usize) -> Option<usize> {
        self.table.notification_count(module_idx)
    }

    fn api_count(&self, module_idx: usize) -> Option<usize> {
        self.table.api_count(module_idx)
    }
}
