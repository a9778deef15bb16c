//! Status codes shared by every framework operation and module hook.

use core::fmt;

/// Result alias used throughout the framework.
pub type FwkResult<T = ()> = Result<T, FwkError>;

/// Status codes returned by framework operations and module hooks.
///
/// `Ok(())` stands for plain success; everything else travels through this
/// enum. `Pending` is special: it is not a failure but a statement that the
/// real answer will be delivered later through an event (typically paired
/// with a delayed response).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FwkError {
    /// The operation was accepted but completion is deferred; the result
    /// arrives later via the event queue.
    Pending,
    /// One or more parameters were invalid.
    Param,
    /// The entity is in a state that does not permit the operation.
    State,
    /// Out of memory (event pool or arena exhausted).
    NoMemory,
    /// The operation is not permitted in the current lifecycle phase.
    AccessDenied,
    /// The entity does not support the requested operation.
    Support,
    /// The entity is busy; retry later.
    Busy,
    /// A device reported a hardware-level error.
    Device,
    /// Initialization failed.
    Init,
    /// The operation timed out.
    Timeout,
    /// A value fell outside the permitted range.
    Range,
    /// Unrecoverable internal error.
    Panic,
}

impl FwkError {
    /// Short lowercase name, used in log messages.
    pub fn as_str(self) -> &'static str {
        match self {
            FwkError::Pending => "pending",
            FwkError::Param => "invalid parameter",
            FwkError::State => "invalid state",
            FwkError::NoMemory => "out of memory",
            FwkError::AccessDenied => "access denied",
            FwkError::Support => "not supported",
            FwkError::Busy => "busy",
            FwkError::Device => "device error",
            FwkError::Init => "initialization error",
            FwkError::Timeout => "timeout",
            FwkError::Range => "out of range",
            FwkError::Panic => "panic",
        }
    }
}

impl fmt::Display for FwkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
