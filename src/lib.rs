#![no_std]

//! # Module-and-event runtime framework
//!
//! This crate is the core runtime of a system-control firmware platform:
//! a cooperatively-scheduled, single-threaded engine that brings a closed
//! set of statically-declared modules through a phased lifecycle and then
//! multiplexes their work over a bounded event pool. It is designed for
//! `no_std` microcontroller-class targets and uses the `alloc` crate for
//! init-time table allocation only.
//!
//! ## Architecture
//!
//! The runtime is organized in layers, leaves first:
//!
//! ### Core infrastructure
//! - [`EntityId`]: typed identifier naming modules, elements, sub-elements,
//!   APIs, events and notifications, with the kind encoded in the value
//! - [`Arena`]: init-time allocation budget with bump accounting; no free,
//!   exhaustion is fatal
//! - [`SlotQueue`]: index queues over the event pool backing every list in
//!   the framework
//!
//! ### Event engine
//! - [`Event`] / [`LightEvent`]: the unit of queued work, with inline
//!   params and the request/response cookie
//! - [`EventPool`]: bounded descriptor slab; its free list and
//!   interrupt-posted queue are the only structures shared with interrupt
//!   handlers
//! - [`EventSender`]: detached, interrupt-safe posting handle
//!
//! ### Module model
//! - [`Module`]: the hook trait every module implements
//! - [`ModuleDesc`] / [`ModuleConfig`] / [`ElementDesc`]: static
//!   declaration of a module, its elements and their configuration
//! - [`Runtime`]: the owning value: lifecycle driver, dispatcher,
//!   notification fan-out and the main loop
//!
//! ### Platform
//! - [`Arch`]: the contract the runtime requires from the interrupt and
//!   CPU layer; [`SoftArch`] implements it in software for hosted tests
//!
//! ## Execution model
//!
//! One logical thread runs the main loop; interrupt handlers may preempt it
//! only to post events through an [`EventSender`]. The dispatcher drains
//! the runnable queue, then promotes interrupt-posted events one at a time,
//! and suspends the CPU once everything is idle and the log is flushed.
//! Within one context, delivery is strictly FIFO.
//!
//! ## Example
//!
//! ```rust,ignore
//! use modfwk::{
//!     EntityId, Event, Module, ModuleConfig, ModuleDesc, ModuleKind,
//!     Runtime, RuntimeConfig, SoftArch,
//! };
//!
//! let arch = alloc::sync::Arc::new(SoftArch::new());
//! let mut rt = Runtime::new(arch, RuntimeConfig::new().with_event_capacity(8));
//!
//! rt.add_module(
//!     ModuleDesc::new("clock", ModuleKind::Hal).with_event_count(1),
//!     ModuleConfig::new(),
//!     Box::new(ClockModule::new()),
//! )?;
//!
//! rt.start()?;
//! rt.run();
//! ```

extern crate alloc;
#[macro_use]
extern crate log;

mod arch;
mod arena;
mod error;
mod event;
mod id;
mod lifecycle;
mod module;
mod notify;
mod pool;
mod queue;
mod runtime;

pub use arch::{Arch, CriticalSection, InterruptState, IsrHandler, SoftArch};
pub use arena::Arena;
pub use error::{FwkError, FwkResult};
pub use event::{EVENT_PARAMS_SIZE, Event, EventParams, LightEvent};
pub use id::{EntityId, IdKind};
pub use lifecycle::{BIND_ROUND_COUNT, ModuleState, RuntimePhase};
pub use module::{
    ApiHandle, ConfigValue, ElementDesc, ElementGenerator, ElementSource, EntityCounts, Module,
    ModuleConfig, ModuleDesc, ModuleKind, TableMeta,
};
pub use notify::Subscription;
pub use pool::{EventPool, EventSender};
pub use queue::{SlotIndex, SlotQueue};
pub use runtime::{CoreStats, Runtime, RuntimeConfig};
