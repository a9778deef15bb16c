//! Module model: descriptors, configuration, the [`Module`] trait and the
//! module table.
//!
//! The set of modules is closed at startup: each is declared with a
//! descriptor (name, kind, API/event/notification counts), a configuration
//! (opaque data plus an element table or a table generator) and an instance
//! implementing [`Module`]. Declaration order defines module indices and
//! every lifecycle walk order.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;

use crate::error::{FwkError, FwkResult};
use crate::event::Event;
use crate::id::{EntityId, IdKind};
use crate::lifecycle::ModuleState;
use crate::queue::SlotQueue;
use crate::runtime::Runtime;

/// Opaque configuration payload handed to `init` hooks.
pub type ConfigValue = Arc<dyn Any + Send + Sync>;

/// An API surface resolved by [`Runtime::bind`](crate::Runtime::bind).
///
/// The target module hands out a concrete value behind `Any`; the requester
/// downcasts it to the concrete API type both sides agree on. Resolved
/// handles are treated as immutable for the life of the firmware.
pub type ApiHandle = Arc<dyn Any + Send + Sync>;

/// Callback producing a module's element table at startup.
pub type ElementGenerator = Box<dyn FnOnce(EntityId) -> FwkResult<Vec<ElementDesc>> + Send>;

/// Broad classification of a module, used for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Drives a hardware block.
    Driver,
    /// Provides a service to other modules or external agents.
    Service,
    /// Hardware abstraction consumed by drivers.
    Hal,
    /// Implements an external protocol surface.
    Protocol,
}

/// Compile-time-constant description of a module.
#[derive(Debug, Clone)]
pub struct ModuleDesc {
    /// Module name, used in logs.
    pub name: &'static str,
    /// Broad classification.
    pub kind: ModuleKind,
    /// Number of APIs the module can hand out at bind time.
    pub api_count: usize,
    /// Number of event types the module defines.
    pub event_count: usize,
    /// Number of notification types the module defines.
    pub notification_count: usize,
}

impl ModuleDesc {
    /// Creates a descriptor with no APIs, events or notifications.
    pub fn new(name: &'static str, kind: ModuleKind) -> Self {
        Self {
            name,
            kind,
            api_count: 0,
            event_count: 0,
            notification_count: 0,
        }
    }

    /// Sets the number of APIs.
    pub fn with_api_count(mut self, count: usize) -> Self {
        self.api_count = count;
        self
    }

    /// Sets the number of event types.
    pub fn with_event_count(mut self, count: usize) -> Self {
        self.event_count = count;
        self
    }

    /// Sets the number of notification types.
    pub fn with_notification_count(mut self, count: usize) -> Self {
        self.notification_count = count;
        self
    }
}

/// Description of one element of a module.
#[derive(Default)]
pub struct ElementDesc {
    /// Element name, used in logs.
    pub name: &'static str,
    /// Number of sub-elements beneath this element.
    pub sub_element_count: usize,
    /// Opaque per-element configuration.
    pub data: Option<ConfigValue>,
}

impl ElementDesc {
    /// Creates an element description with no sub-elements and no data.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            sub_element_count: 0,
            data: None,
        }
    }

    /// Sets the sub-element count.
    pub fn with_sub_elements(mut self, count: usize) -> Self {
        self.sub_element_count = count;
        self
    }

    /// Attaches configuration data.
    pub fn with_data(mut self, data: ConfigValue) -> Self {
        self.data = Some(data);
        self
    }
}

/// Where a module's element table comes from.
#[derive(Default)]
pub enum ElementSource {
    /// The module has no elements.
    #[default]
    None,
    /// A static table.
    Static(Vec<ElementDesc>),
    /// A callback invoked once during table allocation.
    Generator(ElementGenerator),
}

/// Per-module configuration: opaque data plus the element table source.
#[derive(Default)]
pub struct ModuleConfig {
    /// Opaque module-level configuration.
    pub data: Option<ConfigValue>,
    /// Element table source.
    pub elements: ElementSource,
}

impl ModuleConfig {
    /// Configuration with no data and no elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches module-level configuration data.
    pub fn with_data(mut self, data: ConfigValue) -> Self {
        self.data = Some(data);
        self
    }

    /// Uses a static element table.
    pub fn with_elements(mut self, elements: Vec<ElementDesc>) -> Self {
        self.elements = ElementSource::Static(elements);
        self
    }

    /// Uses an element table generator.
    pub fn with_element_generator(mut self, generator: ElementGenerator) -> Self {
        self.elements = ElementSource::Generator(generator);
        self
    }
}

/// The hooks a module implements.
///
/// Only `init` is mandatory. The remaining lifecycle hooks default to
/// no-ops, mirroring an absent hook; the processing hooks default to
/// [`FwkError::Support`], which the dispatcher logs and consumes; a module
/// that declares events or notifications is expected to override the
/// corresponding hook.
///
/// Hooks receive the runtime exclusively and may enqueue events, manage
/// subscriptions and send notifications through it; `bind` hooks may
/// additionally request APIs. Hooks must not block and cannot re-enter the
/// dispatcher.
pub trait Module: Send {
    /// Module-level initialization.
    fn init(
        &mut self,
        fwk: &mut Runtime,
        module_id: EntityId,
        element_count: usize,
        data: Option<&(dyn Any + Send + Sync)>,
    ) -> FwkResult;

    /// Per-element initialization.
    fn element_init(
        &mut self,
        _fwk: &mut Runtime,
        _element_id: EntityId,
        _sub_element_count: usize,
        _data: Option<&(dyn Any + Send + Sync)>,
    ) -> FwkResult {
        Ok(())
    }

    /// Runs after the module and all of its elements are initialized.
    fn post_init(&mut self, _fwk: &mut Runtime, _module_id: EntityId) -> FwkResult {
        Ok(())
    }

    /// Bind round; `id` is the module or one of its elements. Request APIs
    /// from other modules here via [`Runtime::bind`].
    fn bind(&mut self, _fwk: &mut Runtime, _id: EntityId, _round: u32) -> FwkResult {
        Ok(())
    }

    /// Start of normal operation; `id` is the module or one of its elements.
    fn start(&mut self, _fwk: &mut Runtime, _id: EntityId) -> FwkResult {
        Ok(())
    }

    /// Orderly teardown, reverse declaration order.
    fn stop(&mut self, _fwk: &mut Runtime, _id: EntityId) -> FwkResult {
        Ok(())
    }

    /// Handles an event addressed to this module.
    ///
    /// `response` arrives pre-oriented back at the event source; fill in
    /// params, or set `is_delayed_response` and complete it later through
    /// [`Runtime::put_event`]. Return [`FwkError::Pending`] when the real
    /// answer is deferred.
    fn process_event(
        &mut self,
        _fwk: &mut Runtime,
        _event: &Event,
        _response: &mut Event,
    ) -> FwkResult {
        Err(FwkError::Support)
    }

    /// Handles a notification (or a notification response) addressed to
    /// this module.
    fn process_notification(
        &mut self,
        _fwk: &mut Runtime,
        _event: &Event,
        _response: &mut Event,
    ) -> FwkResult {
        Err(FwkError::Support)
    }

    /// Resolves an API requested by `source_id` during the bind phase.
    fn process_bind_request(
        &mut self,
        _source_id: EntityId,
        _target_id: EntityId,
        _api_id: EntityId,
    ) -> FwkResult<ApiHandle> {
        Err(FwkError::Support)
    }
}

/// Per-element mutable state owned by the runtime.
pub(crate) struct ElementCtx {
    pub name: &'static str,
    pub data: Option<ConfigValue>,
    pub sub_element_count: usize,
    /// Delayed responses parked on this element.
    pub delayed: SlotQueue,
}

impl ElementCtx {
    fn from_desc(desc: &ElementDesc) -> Self {
        Self {
            name: desc.name,
            data: desc.data.clone(),
            sub_element_count: desc.sub_element_count,
            delayed: SlotQueue::new(),
        }
    }
}

/// Per-module mutable state owned by the runtime.
pub(crate) struct ModuleCtx {
    pub desc: ModuleDesc,
    pub data: Option<ConfigValue>,
    /// Consumed when the element table is built.
    pub element_source: ElementSource,
    pub elements: Vec<ElementCtx>,
    pub state: ModuleState,
    /// Number of bind requests served by this module.
    pub bind_requests: u32,
    /// Delayed responses parked on the module itself.
    pub delayed: SlotQueue,
    /// The instance is checked out while one of its hooks runs.
    pub instance: Option<Box<dyn Module>>,
}

impl ModuleCtx {
    pub fn new(desc: ModuleDesc, config: ModuleConfig, instance: Box<dyn Module>) -> Self {
        Self {
            desc,
            data: config.data,
            element_source: config.elements,
            elements: Vec::new(),
            state: ModuleState::Uninitialized,
            bind_requests: 0,
            delayed: SlotQueue::new(),
            instance: Some(instance),
        }
    }

    /// Builds the element contexts from the configured source.
    pub fn build_elements(&mut self, module_id: EntityId) -> FwkResult {
        let source = core::mem::take(&mut self.element_source);
        let descs = match source {
            ElementSource::None => Vec::new(),
            ElementSource::Static(descs) => descs,
            ElementSource::Generator(generator) => generator(module_id)?,
        };
        self.elements = descs.iter().map(ElementCtx::from_desc).collect();
        Ok(())
    }
}

/// Count and validity queries over the loaded module set.
///
/// Implemented both by the live [`ModuleTable`] and by the [`TableMeta`]
/// snapshot carried by interrupt-side senders, so every boundary crossing
/// validates identifiers against the same rules.
pub trait EntityCounts {
    /// Number of declared modules.
    fn module_count(&self) -> usize;
    /// Number of elements of module `module_idx`.
    fn element_count(&self, module_idx: usize) -> Option<usize>;
    /// Number of sub-elements of one element.
    fn sub_element_count(&self, module_idx: usize, element_idx: usize) -> Option<usize>;
    /// Number of event types of module `module_idx`.
    fn event_count(&self, module_idx: usize) -> Option<usize>;
    /// Number of notification types of module `module_idx`.
    fn notification_count(&self, module_idx: usize) -> Option<usize>;
    /// Number of APIs of module `module_idx`.
    fn api_count(&self, module_idx: usize) -> Option<usize>;

    /// Whether `id` names an existing module, element or sub-element.
    fn is_valid_entity_id(&self, id: EntityId) -> bool {
        match id.kind() {
            IdKind::Module => id.module_idx() < self.module_count(),
            IdKind::Element => self
                .element_count(id.module_idx())
                .is_some_and(|n| id.element_idx() < n),
            IdKind::SubElement => self
                .sub_element_count(id.module_idx(), id.element_idx())
                .is_some_and(|n| id.sub_element_idx() < n),
            _ => false,
        }
    }

    /// Whether `id` names an event type declared by its module.
    fn is_valid_event_id(&self, id: EntityId) -> bool {
        id.is_kind(IdKind::Event)
            && self
                .event_count(id.module_idx())
                .is_some_and(|n| id.event_idx() < n)
    }

    /// Whether `id` names a notification type declared by its module.
    fn is_valid_notification_id(&self, id: EntityId) -> bool {
        id.is_kind(IdKind::Notification)
            && self
                .notification_count(id.module_idx())
                .is_some_and(|n| id.notification_idx() < n)
    }

    /// Whether `id` names an API declared by its module.
    fn is_valid_api_id(&self, id: EntityId) -> bool {
        id.is_kind(IdKind::Api)
            && self
                .api_count(id.module_idx())
                .is_some_and(|n| id.api_idx() < n)
    }
}

/// The declared module set and its mutable contexts.
#[derive(Default)]
pub(crate) struct ModuleTable {
    ctxs: Vec<ModuleCtx>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ctxs.len()
    }

    pub fn push(&mut self, ctx: ModuleCtx) -> usize {
        self.ctxs.push(ctx);
        self.ctxs.len() - 1
    }

    pub fn ctx(&self, module_idx: usize) -> Option<&ModuleCtx> {
        self.ctxs.get(module_idx)
    }

    pub fn ctx_mut(&mut self, module_idx: usize) -> Option<&mut ModuleCtx> {
        self.ctxs.get_mut(module_idx)
    }

    /// Checks the instance out of its slot for a hook invocation.
    pub fn take_instance(&mut self, module_idx: usize) -> Option<Box<dyn Module>> {
        self.ctxs.get_mut(module_idx)?.instance.take()
    }

    /// Returns a checked-out instance to its slot.
    pub fn put_instance(&mut self, module_idx: usize, instance: Box<dyn Module>) {
        if let Some(ctx) = self.ctxs.get_mut(module_idx) {
            ctx.instance = Some(instance);
        }
    }

    /// The delayed-response list of the entity named by `id`.
    ///
    /// Sub-element identifiers resolve to their containing element's list.
    pub fn delayed_list(&self, id: EntityId) -> FwkResult<&SlotQueue> {
        let ctx = self.ctxs.get(id.module_idx()).ok_or(FwkError::Param)?;
        match id.kind() {
            IdKind::Module => Ok(&ctx.delayed),
            IdKind::Element | IdKind::SubElement => ctx
                .elements
                .get(id.element_idx())
                .map(|e| &e.delayed)
                .ok_or(FwkError::Param),
            _ => Err(FwkError::Param),
        }
    }

    /// Mutable form of [`delayed_list`](Self::delayed_list).
    pub fn delayed_list_mut(&mut self, id: EntityId) -> FwkResult<&mut SlotQueue> {
        let ctx = self
            .ctxs
            .get_mut(id.module_idx())
            .ok_or(FwkError::Param)?;
        match id.kind() {
            IdKind::Module => Ok(&mut ctx.delayed),
            IdKind::Element | IdKind::SubElement => ctx
                .elements
                .get_mut(id.element_idx())
                .map(|e| &mut e.delayed)
                .ok_or(FwkError::Param),
            _ => Err(FwkError::Param),
        }
    }

    /// Snapshot of the counts, for validation away from the table.
    pub fn meta(&self) -> TableMeta {
        TableMeta {
            modules: self
                .ctxs
                .iter()
                .map(|ctx| ModuleMeta {
                    api_count: ctx.desc.api_count,
                    event_count: ctx.desc.event_count,
                    notification_count: ctx.desc.notification_count,
                    element_sub_counts: ctx
                        .elements
                        .iter()
                        .map(|e| e.sub_element_count)
                        .collect(),
                })
                .collect(),
        }
    }
}

impl EntityCounts for ModuleTable {
    fn module_count(&self) -> usize {
        self.ctxs.len()
    }

    fn element_count(&self, module_idx: usize) -> Option<usize> {
        self.ctxs.get(module_idx).map(|c| c.elements.len())
    }

    fn sub_element_count(&self, module_idx: usize, element_idx: usize) -> Option<usize> {
        self.ctxs
            .get(module_idx)?
            .elements
            .get(element_idx)
            .map(|e| e.sub_element_count)
    }

    fn event_count(&self, module_idx: usize) -> Option<usize> {
        self.ctxs.get(module_idx).map(|c| c.desc.event_count)
    }

    fn notification_count(&self, module_idx: usize) -> Option<usize> {
        self.ctxs.get(module_idx).map(|c| c.desc.notification_count)
    }

    fn api_count(&self, module_idx: usize) -> Option<usize> {
        self.ctxs.get(module_idx).map(|c| c.desc.api_count)
    }
}

/// Immutable snapshot of the module table's counts.
///
/// Carried by [`EventSender`](crate::EventSender) so interrupt-side enqueues
/// validate identifiers without touching the table itself.
#[derive(Debug, Clone)]
pub struct TableMeta {
    modules: Vec<ModuleMeta>,
}

#[derive(Debug, Clone)]
struct ModuleMeta {
    api_count: usize,
    event_count: usize,
    notification_count: usize,
    element_sub_counts: Vec<usize>,
}

impl EntityCounts for TableMeta {
    fn module_count(&self) -> usize {
        self.modules.len()
    }

    fn element_count(&self, module_idx: usize) -> Option<usize> {
        self.modules
            .get(module_idx)
            .map(|m| m.element_sub_counts.len())
    }

    fn sub_element_count(&self, module_idx: usize, element_idx: usize) -> Option<usize> {
        self.modules
            .get(module_idx)?
            .element_sub_counts
            .get(element_idx)
            .copied()
    }

    fn event_count(&self, module_idx: usize) -> Option<usize> {
        self.modules.get(module_idx).map(|m| m.event_count)
    }

    fn notification_count(&self, module_idx: usize) -> Option<usize> {
        self.modules.get(module_idx).map(|m| m.notification_count)
    }

    fn api_count(&self, module_idx: usize) -> Option<usize> {
        self.modules.get(module_idx).map(|m| m.api_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullModule;

    impl Module for NullModule {
        fn init(
            &mut self,
            _fwk: &mut Runtime,
            _module_id: EntityId,
            _element_count: usize,
            _data: Option<&(dyn Any + Send + Sync)>,
        ) -> FwkResult {
            Ok(())
        }
    }

    fn table_with_one_module() -> ModuleTable {
        let mut table = ModuleTable::new();
        let desc = ModuleDesc::new("fake", ModuleKind::Driver)
            .with_api_count(2)
            .with_event_count(3)
            .with_notification_count(1);
        let config = ModuleConfig::new().with_elements(alloc::vec![
            ElementDesc::new("e0").with_sub_elements(2),
            ElementDesc::new("e1"),
        ]);
        let mut ctx = ModuleCtx::new(desc, config, Box::new(NullModule));
        ctx.build_elements(EntityId::module(0)).unwrap();
        table.push(ctx);
        table
    }

    #[test]
    fn test_desc_builder() {
        let desc = ModuleDesc::new("clock", ModuleKind::Hal)
            .with_api_count(1)
            .with_event_count(4);
        assert_eq!(desc.name, "clock");
        assert_eq!(desc.kind, ModuleKind::Hal);
        assert_eq!(desc.api_count, 1);
        assert_eq!(desc.event_count, 4);
        assert_eq!(desc.notification_count, 0);
    }

    #[test]
    fn test_element_table_from_generator() {
        let desc = ModuleDesc::new("psu", ModuleKind::Driver);
        let config = ModuleConfig::new().with_element_generator(Box::new(|module_id| {
            assert_eq!(module_id, EntityId::module(0));
            Ok(alloc::vec![ElementDesc::new("rail0"), ElementDesc::new("rail1")])
        }));
        let mut ctx = ModuleCtx::new(desc, config, Box::new(NullModule));
        ctx.build_elements(EntityId::module(0)).unwrap();
        assert_eq!(ctx.elements.len(), 2);
        assert_eq!(ctx.elements[0].name, "rail0");
    }

    #[test]
    fn test_entity_validation() {
        let table = table_with_one_module();

        assert!(table.is_valid_entity_id(EntityId::module(0)));
        assert!(!table.is_valid_entity_id(EntityId::module(1)));
        assert!(table.is_valid_entity_id(EntityId::element(0, 1)));
        assert!(!table.is_valid_entity_id(EntityId::element(0, 2)));
        assert!(table.is_valid_entity_id(EntityId::sub_element(0, 0, 1)));
        assert!(!table.is_valid_entity_id(EntityId::sub_element(0, 1, 0)));
        assert!(!table.is_valid_entity_id(EntityId::none()));
        assert!(!table.is_valid_entity_id(EntityId::api(0, 0)));
    }

    #[test]
    fn test_typed_id_validation() {
        let table = table_with_one_module();

        assert!(table.is_valid_event_id(EntityId::event(0, 2)));
        assert!(!table.is_valid_event_id(EntityId::event(0, 3)));
        assert!(!table.is_valid_event_id(EntityId::notification(0, 0)));

        assert!(table.is_valid_notification_id(EntityId::notification(0, 0)));
        assert!(!table.is_valid_notification_id(EntityId::notification(0, 1)));

        assert!(table.is_valid_api_id(EntityId::api(0, 1)));
        assert!(!table.is_valid_api_id(EntityId::api(0, 2)));
    }

    #[test]
    fn test_meta_matches_table() {
        let table = table_with_one_module();
        let meta = table.meta();

        assert_eq!(meta.module_count(), 1);
        assert_eq!(meta.element_count(0), Some(2));
        assert_eq!(meta.sub_element_count(0, 0), Some(2));
        assert!(meta.is_valid_event_id(EntityId::event(0, 0)));
        assert!(!meta.is_valid_event_id(EntityId::event(1, 0)));
        assert!(meta.is_valid_entity_id(EntityId::sub_element(0, 0, 1)));
    }

    #[test]
    fn test_instance_checkout() {
        let mut table = table_with_one_module();
        let instance = table.take_instance(0).unwrap();
        assert!(table.take_instance(0).is_none());
        table.put_instance(0, instance);
        assert!(table.take_instance(0).is_some());
    }

    #[test]
    fn test_delayed_list_resolution() {
        let mut table = table_with_one_module();
        table.delayed_list_mut(EntityId::module(0)).unwrap().push_tail(4);
        table
            .delayed_list_mut(EntityId::element(0, 1))
            .unwrap()
            .push_tail(5);
        // Sub-elements share their element's list.
        assert!(
            table
                .delayed_list_mut(EntityId::sub_element(0, 0, 0))
                .unwrap()
                .is_empty()
        );
        assert_eq!(table.delayed_list_mut(EntityId::module(0)).unwrap().len(), 1);
        assert!(table.delayed_list_mut(EntityId::event(0, 0)).is_err());
    }
}
