//! Event descriptors, the unit of queued work.

use arrayvec::ArrayVec;
use core::fmt;

use crate::error::{FwkError, FwkResult};
use crate::id::EntityId;

/// Capacity of the inline parameter payload, in bytes.
pub const EVENT_PARAMS_SIZE: usize = 16;

/// Inline event parameter bytes.
pub type EventParams = ArrayVec<u8, EVENT_PARAMS_SIZE>;

/// A unit of queued work directed at a module, element or sub-element.
///
/// Descriptors circulate through the bounded event pool; callers fill in a
/// value and hand it to the runtime, which copies it into a pool slot. The
/// `cookie` is assigned at enqueue time for requests and ties a response,
/// immediate or delayed, back to the request that caused it.
#[derive(Clone, Default)]
pub struct Event {
    /// Event (or notification) type identifier; selects the target hook.
    pub id: EntityId,
    /// The sending entity.
    pub source_id: EntityId,
    /// The receiving entity.
    pub target_id: EntityId,
    /// Monotonic identifier assigned at enqueue time; pairs responses with
    /// requests. Zero until assigned.
    pub cookie: u32,
    /// Set when this descriptor carries a notification rather than an event.
    pub is_notification: bool,
    /// Set on descriptors travelling back to the original sender.
    pub is_response: bool,
    /// The sender wants a response event.
    pub response_requested: bool,
    /// On a response scratch: the target will complete the response
    /// asynchronously. On an enqueued event: this completes a previously
    /// stored delayed response.
    pub is_delayed_response: bool,
    /// Inline parameter bytes.
    pub params: EventParams,
}

impl Event {
    /// Creates an event of type `id` from `source_id` to `target_id`.
    pub fn new(id: EntityId, source_id: EntityId, target_id: EntityId) -> Self {
        Self {
            id,
            source_id,
            target_id,
            ..Self::default()
        }
    }

    /// Requests a response event from the target.
    pub fn with_response_requested(mut self) -> Self {
        self.response_requested = true;
        self
    }

    /// Sets the parameter bytes, replacing any present.
    ///
    /// # Errors
    ///
    /// [`FwkError::Range`] if `bytes` exceeds [`EVENT_PARAMS_SIZE`].
    pub fn set_params(&mut self, bytes: &[u8]) -> FwkResult {
        if bytes.len() > EVENT_PARAMS_SIZE {
            return Err(FwkError::Range);
        }
        self.params.clear();
        self.params
            .try_extend_from_slice(bytes)
            .map_err(|_| FwkError::Range)?;
        Ok(())
    }

    /// Builder form of [`set_params`](Self::set_params); panics on overflow
    /// and is therefore intended for statically-sized payloads.
    pub fn with_params(mut self, bytes: &[u8]) -> Self {
        self.params.clear();
        self.params.extend(bytes.iter().copied());
        self
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("source_id", &self.source_id)
            .field("target_id", &self.target_id)
            .field("cookie", &self.cookie)
            .field("is_notification", &self.is_notification)
            .field("is_response", &self.is_response)
            .field("response_requested", &self.response_requested)
            .field("is_delayed_response", &self.is_delayed_response)
            .field("params", &self.params.as_slice())
            .finish()
    }
}

/// Reduced event carrying no parameters.
///
/// Light events are promoted to full descriptors on enqueue: the promoted
/// descriptor has empty params and cleared flags, and is assigned a cookie
/// like any request; the caller just has no channel to receive it. A
/// requested response travels back as a full event and may therefore carry
/// parameters even though the request could not.
#[derive(Debug, Clone, Copy)]
pub struct LightEvent {
    /// Event type identifier.
    pub id: EntityId,
    /// The sending entity.
    pub source_id: EntityId,
    /// The receiving entity.
    pub target_id: EntityId,
    /// The sender wants a response event.
    pub response_requested: bool,
}

impl LightEvent {
    /// Creates a light event of type `id` from `source_id` to `target_id`.
    pub fn new(id: EntityId, source_id: EntityId, target_id: EntityId) -> Self {
        Self {
            id,
            source_id,
            target_id,
            response_requested: false,
        }
    }

    /// Promotes this light event to a full descriptor.
    pub(crate) fn promote(&self) -> Event {
        Event {
            id: self.id,
            source_id: self.source_id,
            target_id: self.target_id,
            response_requested: self.response_requested,
            ..Event::default()
        }
    }
}
