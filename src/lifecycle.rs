//! Lifecycle state machines for modules and the runtime.
//!
//! Startup walks every declared module through a fixed sequence of phases;
//! each module tracks its own position so out-of-order hook effects (an API
//! bind from a `start` hook, an event posted before the pool exists) can be
//! rejected deterministically.
//!
//! # Module states
//!
//! ```text
//! ┌───────────────┐ init ┌─────────────┐ bind  ┌───────┐ start ┌─────────┐
//! │ Uninitialized │ ───> │ Initialized │ ────> │ Bound │ ────> │ Started │
//! └───────────────┘      └─────────────┘       └───────┘       └─────────┘
//!                                                                   │ stop
//!                                                              ┌─────────┐
//!                                                              │ Stopped │
//!                                                              └─────────┘
//! ```

use crate::error::{FwkError, FwkResult};

/// Number of bind rounds run during startup.
///
/// Two rounds let a module hand out an API in round one that it could only
/// construct after a round-zero bind of its own.
pub const BIND_ROUND_COUNT: u32 = 2;

/// Position of a module in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModuleState {
    /// Declared but not yet initialized.
    Uninitialized,
    /// `init` (and element/post init) completed.
    Initialized,
    /// All bind rounds completed.
    Bound,
    /// `start` completed; the module processes events.
    Started,
    /// `stop` completed.
    Stopped,
}

impl ModuleState {
    /// Checks an advance to `next` and returns the new state.
    ///
    /// States only ever move forward, one step at a time.
    pub fn advance(self, next: ModuleState) -> FwkResult<ModuleState> {
        let legal = matches!(
            (self, next),
            (ModuleState::Uninitialized, ModuleState::Initialized)
                | (ModuleState::Initialized, ModuleState::Bound)
                | (ModuleState::Bound, ModuleState::Started)
                | (ModuleState::Started, ModuleState::Stopped)
        );
        if legal { Ok(next) } else { Err(FwkError::State) }
    }
}

/// Phase of the runtime as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuntimePhase {
    /// Modules are being declared; nothing is allocated yet.
    Registration,
    /// Context tables and the event pool have been allocated; module `init`
    /// hooks run.
    ModuleInit,
    /// Element `init` hooks run.
    ElementInit,
    /// `post_init` hooks run.
    PostInit,
    /// Bind rounds run; this is the only phase in which
    /// [`Runtime::bind`](crate::Runtime::bind) is permitted.
    Bind,
    /// `start` hooks run.
    Start,
    /// Startup finished; the dispatcher owns execution.
    Running,
    /// `stop` hooks have run.
    Stopped,
}

impl RuntimePhase {
    /// Whether the runtime is still starting up.
    pub fn is_startup(self) -> bool {
        self < RuntimePhase::Running
    }

    /// Whether the event pool exists in this phase.
    pub fn has_pool(self) -> bool {
        self > RuntimePhase::Registration
    }
}
