//! Typed entity identifiers.
//!
//! Every addressable thing in the framework, from a module down to one of
//! its sub-elements, and its APIs, event types and notification types, is
//! named by a
//! single compact [`EntityId`]. The kind is encoded in the value, so one
//! identifier type serves event targeting, API binding and notification
//! subscription alike; boundary code re-validates kind and range against the
//! loaded module table instead of trusting the caller.
//!
//! Layout (32 bits):
//!
//! ```text
//! [ kind:4 | module:8 | primary:12 | secondary:8 ]
//! ```
//!
//! `primary` carries the element, API, event or notification index depending
//! on the kind; `secondary` is only used by sub-element identifiers.

use core::fmt;

const KIND_SHIFT: u32 = 28;
const MODULE_SHIFT: u32 = 20;
const PRIMARY_SHIFT: u32 = 8;

const MODULE_MASK: u32 = 0xff;
const PRIMARY_MASK: u32 = 0xfff;
const SECONDARY_MASK: u32 = 0xff;

/// The kind of entity an [`EntityId`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum IdKind {
    /// The reserved "no entity" identifier.
    None = 0,
    /// A module.
    Module = 1,
    /// An element of a module.
    Element = 2,
    /// A sub-element of an element.
    SubElement = 3,
    /// An API exposed by a module.
    Api = 4,
    /// An event type owned by a module.
    Event = 5,
    /// A notification type owned by a module.
    Notification = 6,
}

/// Compact typed identifier for modules, elements, sub-elements, APIs,
/// events and notifications.
///
/// Comparison by value is meaningful only between identifiers of the same
/// kind. Validity is relative to the loaded module table and is checked at
/// boundary crossings, not at construction.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u32);

impl EntityId {
    /// The distinguished "none" identifier.
    pub const fn none() -> Self {
        Self(0)
    }

    /// Identifier for module `module_idx`.
    pub const fn module(module_idx: usize) -> Self {
        Self::build(IdKind::Module, module_idx, 0, 0)
    }

    /// Identifier for element `element_idx` of module `module_idx`.
    pub const fn element(module_idx: usize, element_idx: usize) -> Self {
        Self::build(IdKind::Element, module_idx, element_idx, 0)
    }

    /// Identifier for a sub-element beneath an element.
    pub const fn sub_element(
        module_idx: usize,
        element_idx: usize,
        sub_element_idx: usize,
    ) -> Self {
        Self::build(IdKind::SubElement, module_idx, element_idx, sub_element_idx)
    }

    /// Identifier for API `api_idx` of module `module_idx`.
    pub const fn api(module_idx: usize, api_idx: usize) -> Self {
        Self::build(IdKind::Api, module_idx, api_idx, 0)
    }

    /// Identifier for event type `event_idx` of module `module_idx`.
    pub const fn event(module_idx: usize, event_idx: usize) -> Self {
        Self::build(IdKind::Event, module_idx, event_idx, 0)
    }

    /// Identifier for notification type `notification_idx` of module
    /// `module_idx`.
    pub const fn notification(module_idx: usize, notification_idx: usize) -> Self {
        Self::build(IdKind::Notification, module_idx, notification_idx, 0)
    }

    const fn build(kind: IdKind, module: usize, primary: usize, secondary: usize) -> Self {
        debug_assert!(module <= MODULE_MASK as usize);
        debug_assert!(primary <= PRIMARY_MASK as usize);
        debug_assert!(secondary <= SECONDARY_MASK as usize);
        Self(
            ((kind as u32) << KIND_SHIFT)
                | ((module as u32 & MODULE_MASK) << MODULE_SHIFT)
                | ((primary as u32 & PRIMARY_MASK) << PRIMARY_SHIFT)
                | (secondary as u32 & SECONDARY_MASK),
        )
    }

    /// The kind encoded in this identifier.
    pub const fn kind(self) -> IdKind {
        match self.0 >> KIND_SHIFT {
            1 => IdKind::Module,
            2 => IdKind::Element,
            3 => IdKind::SubElement,
            4 => IdKind::Api,
            5 => IdKind::Event,
            6 => IdKind::Notification,
            _ => IdKind::None,
        }
    }

    /// Whether this is the "none" identifier.
    pub const fn is_none(self) -> bool {
        matches!(self.kind(), IdKind::None)
    }

    /// Whether this identifier names a module, element or sub-element:
    /// the kinds that can send and receive events.
    pub const fn is_entity(self) -> bool {
        matches!(
            self.kind(),
            IdKind::Module | IdKind::Element | IdKind::SubElement
        )
    }

    /// Whether this identifier is of kind `kind`.
    pub const fn is_kind(self, kind: IdKind) -> bool {
        self.0 >> KIND_SHIFT == kind as u32
    }

    /// The module index. Meaningful for every kind except `None`.
    pub const fn module_idx(self) -> usize {
        ((self.0 >> MODULE_SHIFT) & MODULE_MASK) as usize
    }

    /// The element index of an element or sub-element identifier.
    pub const fn element_idx(self) -> usize {
        debug_assert!(matches!(self.kind(), IdKind::Element | IdKind::SubElement));
        ((self.0 >> PRIMARY_SHIFT) & PRIMARY_MASK) as usize
    }

    /// The sub-element index of a sub-element identifier.
    pub const fn sub_element_idx(self) -> usize {
        debug_assert!(matches!(self.kind(), IdKind::SubElement));
        (self.0 & SECONDARY_MASK) as usize
    }

    /// The API index of an API identifier.
    pub const fn api_idx(self) -> usize {
        debug_assert!(matches!(self.kind(), IdKind::Api));
        ((self.0 >> PRIMARY_SHIFT) & PRIMARY_MASK) as usize
    }

    /// The event index of an event identifier.
    pub const fn event_idx(self) -> usize {
        debug_assert!(matches!(self.kind(), IdKind::Event));
        ((self.0 >> PRIMARY_SHIFT) & PRIMARY_MASK) as usize
    }

    /// The notification index of a notification identifier.
    pub const fn notification_idx(self) -> usize {
        debug_assert!(matches!(self.kind(), IdKind::Notification));
        ((self.0 >> PRIMARY_SHIFT) & PRIMARY_MASK) as usize
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.module_idx();
        let p = ((self.0 >> PRIMARY_SHIFT) & PRIMARY_MASK) as usize;
        let s = (self.0 & SECONDARY_MASK) as usize;
        match self.kind() {
            IdKind::None => write!(f, "[NONE]"),
            IdKind::Module => write!(f, "[M {m}]"),
            IdKind::Element => write!(f, "[E {m}:{p}]"),
            IdKind::SubElement => write!(f, "[S {m}:{p}:{s}]"),
            IdKind::Api => write!(f, "[A {m}:{p}]"),
            IdKind::Event => write!(f, "[EV {m}:{p}]"),
            IdKind::Notification => write!(f, "[N {m}:{p}]"),
        }
    }
}

// Debug mirrors Display so packed identifiers stay readable in derived
// Debug output of larger structures.
impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_id_kinds() {
        assert_eq!(EntityId::none().kind(), IdKind::None);
        assert_eq!(EntityId::module(3).kind(), IdKind::Module);
        assert_eq!(EntityId::element(3, 1).kind(), IdKind::Element);
        assert_eq!(EntityId::sub_element(3, 1, 2).kind(), IdKind::SubElement);
        assert_eq!(EntityId::api(3, 0).kind(), IdKind::Api);
        assert_eq!(EntityId::event(3, 0).kind(), IdKind::Event);
        assert_eq!(EntityId::notification(3, 0).kind(), IdKind::Notification);
    }

    #[test]
    fn test_id_indices() {
        let id = EntityId::sub_element(7, 42, 5);
        assert_eq!(id.module_idx(), 7);
        assert_eq!(id.element_idx(), 42);
        assert_eq!(id.sub_element_idx(), 5);

        assert_eq!(EntityId::api(2, 3).api_idx(), 3);
        assert_eq!(EntityId::event(2, 1).event_idx(), 1);
        assert_eq!(EntityId::notification(2, 0).notification_idx(), 0);
    }

    #[test]
    fn test_id_equality_within_kind() {
        assert_eq!(EntityId::element(1, 0), EntityId::element(1, 0));
        assert_ne!(EntityId::element(1, 0), EntityId::element(1, 1));
        // Same indices, different kind: not equal.
        assert_ne!(EntityId::event(1, 0), EntityId::notification(1, 0));
    }

    #[test]
    fn test_id_entity_test() {
        assert!(EntityId::module(0).is_entity());
        assert!(EntityId::element(0, 0).is_entity());
        assert!(EntityId::sub_element(0, 0, 0).is_entity());
        assert!(!EntityId::api(0, 0).is_entity());
        assert!(!EntityId::none().is_entity());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(EntityId::none().to_string(), "[NONE]");
        assert_eq!(EntityId::module(4).to_string(), "[M 4]");
        assert_eq!(EntityId::element(4, 2).to_string(), "[E 4:2]");
        assert_eq!(EntityId::sub_element(4, 2, 1).to_string(), "[S 4:2:1]");
        assert_eq!(EntityId::event(1, 0).to_string(), "[EV 1:0]");
    }

    #[test]
    fn test_id_default_is_none() {
        assert!(EntityId::default().is_none());
    }
}
