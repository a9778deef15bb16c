//! Architecture surface: the contract the runtime requires from the
//! platform's interrupt and CPU layer.
//!
//! The runtime itself is platform-agnostic; everything it needs from the
//! hardware (global interrupt masking, per-IRQ control, ISR binding, the
//! interrupt-context query and CPU suspension) goes through the [`Arch`]
//! trait. A port provides a real implementation over its interrupt
//! controller; hosted tests and simulation use [`SoftArch`].
//!
//! The arch layer reports state errors (for example querying the current
//! interrupt outside an ISR) but never panics; the runtime decides whether
//! a state error is fatal.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use spin::Mutex;

use crate::error::{FwkError, FwkResult};

/// An interrupt handler bound to an IRQ line.
pub type IsrHandler = Box<dyn Fn() + Send + Sync>;

/// Opaque prior-state token returned by [`Arch::global_disable`] and
/// consumed by [`Arch::global_enable`].
#[derive(Debug, Clone, Copy)]
#[must_use = "dropping the token leaves interrupts disabled"]
pub struct InterruptState {
    enabled: bool,
}

impl InterruptState {
    /// Whether interrupts were enabled when the token was taken.
    pub fn was_enabled(self) -> bool {
        self.enabled
    }

    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

/// Platform interrupt and CPU contract.
pub trait Arch: Send + Sync {
    /// Disables interrupts globally, returning the prior state.
    fn global_disable(&self) -> InterruptState;

    /// Restores the global interrupt state captured by
    /// [`global_disable`](Self::global_disable).
    fn global_enable(&self, prior: InterruptState);

    /// Whether the caller is executing in interrupt context.
    fn is_interrupt_context(&self) -> bool;

    /// The IRQ number currently being serviced.
    ///
    /// # Errors
    ///
    /// [`FwkError::State`] when called outside an ISR.
    fn current_interrupt(&self) -> FwkResult<u32>;

    /// Enables an IRQ line.
    fn enable_irq(&self, irq: u32) -> FwkResult;

    /// Disables an IRQ line.
    fn disable_irq(&self, irq: u32) -> FwkResult;

    /// Marks an IRQ line pending.
    fn pend_irq(&self, irq: u32) -> FwkResult;

    /// Clears a pending IRQ line.
    fn clear_pending_irq(&self, irq: u32) -> FwkResult;

    /// Sets the priority of an IRQ line.
    fn set_irq_priority(&self, irq: u32, priority: u8) -> FwkResult;

    /// Binds `handler` to an IRQ line.
    fn set_isr(&self, irq: u32, handler: IsrHandler) -> FwkResult;

    /// Halts the CPU until the next interrupt.
    fn suspend(&self);
}

/// Scoped critical section: interrupts are disabled on entry and the prior
/// state is restored on every exit path.
pub struct CriticalSection<'a> {
    arch: &'a dyn Arch,
    prior: Option<InterruptState>,
}

impl<'a> CriticalSection<'a> {
    /// Enters a critical section on `arch`.
    pub fn enter(arch: &'a dyn Arch) -> Self {
        let prior = arch.global_disable();
        Self {
            arch,
            prior: Some(prior),
        }
    }
}

impl Drop for CriticalSection<'_> {
    fn drop(&mut self) {
        if let Some(prior) = self.prior.take() {
            self.arch.global_enable(prior);
        }
    }
}

#[derive(Default)]
struct IrqLine {
    enabled: bool,
    pending: bool,
    priority: u8,
    handler: Option<Arc<dyn Fn() + Send + Sync>>,
}

/// Software implementation of the arch surface for hosted tests and
/// simulation.
///
/// IRQ lines are plain records; pending an enabled line with a bound
/// handler dispatches it immediately in simulated interrupt context, unless
/// interrupts are globally disabled or another handler is already running,
/// in which case the line stays pending and is drained when interrupts are
/// re-enabled, when the line is enabled, or on [`suspend`](Arch::suspend)
/// (the wake-from-interrupt of real hardware).
#[derive(Default)]
pub struct SoftArch {
    masked: AtomicBool,
    in_isr: AtomicBool,
    current_irq: AtomicU32,
    suspend_count: AtomicU64,
    lines: Mutex<BTreeMap<u32, IrqLine>>,
}

impl SoftArch {
    /// Creates a software arch with interrupts enabled and no lines bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the CPU was suspended.
    pub fn suspend_count(&self) -> u64 {
        self.suspend_count.load(Ordering::Relaxed)
    }

    /// Whether an IRQ line is pending.
    pub fn is_pending(&self, irq: u32) -> bool {
        self.lines
            .lock()
            .get(&irq)
            .map(|l| l.pending)
            .unwrap_or(false)
    }

    /// Runs `f` in simulated interrupt context for `irq`.
    ///
    /// Used by tests that need to exercise interrupt-context behavior
    /// without binding a handler.
    pub fn in_interrupt<R>(&self, irq: u32, f: impl FnOnce() -> R) -> R {
        self.in_isr.store(true, Ordering::Release);
        self.current_irq.store(irq, Ordering::Release);
        let result = f();
        self.in_isr.store(false, Ordering::Release);
        result
    }

    /// Dispatches pending, enabled lines until none remain dispatchable.
    fn drain_pending(&self) {
        loop {
            if self.masked.load(Ordering::Acquire) || self.in_isr.load(Ordering::Acquire) {
                return;
            }
            let ready = {
                let mut lines = self.lines.lock();
                lines.iter_mut().find_map(|(&irq, line)| match &line.handler {
                    Some(handler) if line.enabled && line.pending => {
                        let handler = Arc::clone(handler);
                        line.pending = false;
                        Some((irq, handler))
                    }
                    _ => None,
                })
            };
            let Some((irq, handler)) = ready else {
                return;
            };
            self.in_isr.store(true, Ordering::Release);
            self.current_irq.store(irq, Ordering::Release);
            handler();
            self.in_isr.store(false, Ordering::Release);
        }
    }

    fn with_line<R>(&self, irq: u32, f: impl FnOnce(&mut IrqLine) -> R) -> R {
        let mut lines = self.lines.lock();
        f(lines.entry(irq).or_default())
    }
}

impl Arch for SoftArch {
    fn global_disable(&self) -> InterruptState {
        let was_masked = self.masked.swap(true, Ordering::AcqRel);
        InterruptState::new(!was_masked)
    }

    fn global_enable(&self, prior: InterruptState) {
        if prior.was_enabled() {
            self.masked.store(false, Ordering::Release);
            self.drain_pending();
        }
    }

    fn is_interrupt_context(&self) -> bool {
        self.in_isr.load(Ordering::Acquire)
    }

    fn current_interrupt(&self) -> FwkResult<u32> {
        if self.is_interrupt_context() {
            Ok(self.current_irq.load(Ordering::Acquire))
        } else {
            Err(FwkError::State)
        }
    }

    fn enable_irq(&self, irq: u32) -> FwkResult {
        self.with_line(irq, |line| line.enabled = true);
        self.drain_pending();
        Ok(())
    }

    fn disable_irq(&self, irq: u32) -> FwkResult {
        self.with_line(irq, |line| line.enabled = false);
        Ok(())
    }

    fn pend_irq(&self, irq: u32) -> FwkResult {
        self.with_line(irq, |line| line.pending = true);
        self.drain_pending();
        Ok(())
    }

    fn clear_pending_irq(&self, irq: u32) -> FwkResult {
        self.with_line(irq, |line| line.pending = false);
        Ok(())
    }

    fn set_irq_priority(&self, irq: u32, priority: u8) -> FwkResult {
        self.with_line(irq, |line| line.priority = priority);
        Ok(())
    }

    fn set_isr(&self, irq: u32, handler: IsrHandler) -> FwkResult {
        self.with_line(irq, |line| line.handler = Some(Arc::from(handler)));
        Ok(())
    }

    fn suspend(&self) {
        self.suspend_count.fetch_add(1, Ordering::Relaxed);
        self.drain_pending();
    }
}
